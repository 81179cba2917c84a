// Copyright 2022 Strata Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Opaque image cell: encoded bytes plus dimensions. The engine stores and
/// moves these; it never decodes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlexImage {
    pub data: Vec<u8>,
    pub width: u64,
    pub height: u64,
    pub channels: u64,
}

impl FlexImage {
    pub fn new(data: Vec<u8>, width: u64, height: u64, channels: u64) -> Self {
        Self {
            data,
            width,
            height,
            channels,
        }
    }
}

impl PartialOrd for FlexImage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FlexImage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.data
            .cmp(&other.data)
            .then(self.width.cmp(&other.width))
            .then(self.height.cmp(&other.height))
            .then(self.channels.cmp(&other.channels))
    }
}

impl std::fmt::Display for FlexImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Image({}x{}x{}, {} bytes)",
            self.width,
            self.height,
            self.channels,
            self.data.len()
        )
    }
}
