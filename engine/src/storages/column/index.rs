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

use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

pub const COLUMN_INDEX_EXT: &str = "sidx";
pub const COLUMN_INDEX_VERSION: u32 = 1;

/// The self-describing head of a column: declared tag plus the ordered
/// segment table. Segment files are named relative to the index location;
/// there is no trailer.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ColumnIndex {
    pub version: u32,
    pub tag: TypeId,
    pub segments: Vec<SegmentMeta>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SegmentMeta {
    pub file: String,
    pub length: u64,
}

impl ColumnIndex {
    pub fn new(tag: TypeId, segments: Vec<SegmentMeta>) -> Self {
        Self {
            version: COLUMN_INDEX_VERSION,
            tag,
            segments,
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
        let index: ColumnIndex = serde_json::from_slice(&data)?;
        if index.version != COLUMN_INDEX_VERSION {
            return Err(ErrorCode::BadArchive(format!(
                "Unsupported column index version {} in {:?}",
                index.version, path
            )));
        }
        Ok(index)
    }
}
