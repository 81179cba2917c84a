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

use std::hash::Hash;
use std::hash::Hasher;

use common_datavalues::DataValue;
use twox_hash::XxHash64;

/// A key tuple with its framed bytes precomputed: hashing and equality run
/// on the bytes, so they stay consistent with each other and stable across
/// workers; the values are kept for emission.
pub struct GroupKey {
    values: Vec<DataValue>,
    bytes: Vec<u8>,
}

impl GroupKey {
    pub fn new(values: Vec<DataValue>) -> GroupKey {
        let mut bytes = Vec::new();
        for value in &values {
            bytes.extend_from_slice(&value.to_frame_bytes());
        }
        GroupKey { values, bytes }
    }

    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<DataValue> {
        self.values
    }

    /// Stable partition routing: the same key lands in the same partition
    /// on every worker.
    pub fn partition(&self, num_partitions: usize) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&self.bytes);
        (hasher.finish() % num_partitions as u64) as usize
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}
