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

use std::path::Path;

use common_exception::ErrorCode;
use common_exception::Result;

pub const FRAME_INDEX_EXT: &str = "frame_idx";
pub const FRAME_INDEX_VERSION: u32 = 1;

/// The head of a frame: the ordered column-name table. Each referenced file
/// is a column index (`.sidx`), named relative to this file's directory.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FrameIndex {
    pub version: u32,
    pub columns: Vec<FrameColumnMeta>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FrameColumnMeta {
    pub name: String,
    pub file: String,
}

impl FrameIndex {
    pub fn new(columns: Vec<FrameColumnMeta>) -> Self {
        Self {
            version: FRAME_INDEX_VERSION,
            columns,
        }
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn read_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| ErrorCode::NotFound(format!("Cannot open index {:?}: {}", path, e)))?;
        let index: FrameIndex = serde_json::from_slice(&data)?;
        if index.version != FRAME_INDEX_VERSION {
            return Err(ErrorCode::BadArchive(format!(
                "Unsupported frame index version {} in {:?}",
                index.version, path
            )));
        }
        Ok(index)
    }
}
