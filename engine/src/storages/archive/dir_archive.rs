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

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use common_exception::ErrorCode;
use common_exception::Result;
use tracing::debug;

use super::ini::read_metadata_ini;
use super::ini::write_metadata_ini;
use crate::storages::column::Column;
use crate::storages::column::ColumnIndex;
use crate::storages::column::SegmentMeta;
use crate::storages::column::COLUMN_INDEX_EXT;
use crate::storages::frame::Frame;
use crate::storages::frame::FrameColumnMeta;
use crate::storages::frame::FrameIndex;
use crate::storages::frame::FRAME_INDEX_EXT;

pub const ARCHIVE_INI_FILE: &str = "dir_archive.ini";
const CONTENTS_KEY: &str = "contents";
const ROOT_KEY: &str = "root";

/// What a directory archive holds; reading binds a typed loader only after
/// this tag checks out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveContents {
    SArray,
    SFrame,
    Graph,
    Model,
}

impl ArchiveContents {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveContents::SArray => "sarray",
            ArchiveContents::SFrame => "sframe",
            ArchiveContents::Graph => "graph",
            ArchiveContents::Model => "model",
        }
    }

    pub fn parse(s: &str) -> Result<ArchiveContents> {
        Ok(match s {
            "sarray" => ArchiveContents::SArray,
            "sframe" => ArchiveContents::SFrame,
            "graph" => ArchiveContents::Graph,
            "model" => ArchiveContents::Model,
            other => {
                return Err(ErrorCode::BadArchive(format!(
                    "Unknown archive contents \"{}\"",
                    other
                )));
            }
        })
    }
}

/// Writes one logical object into a directory. Content files land under
/// monotonically increasing prefixes as they are saved; nothing is readable
/// until `close()` commits the metadata file atomically.
pub struct DirArchiveWriter {
    dir: PathBuf,
    metadata: BTreeMap<String, String>,
    next_prefix: u64,
}

impl DirArchiveWriter {
    pub fn create(dir: impl Into<PathBuf>) -> Result<DirArchiveWriter> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(DirArchiveWriter {
            dir,
            metadata: BTreeMap::new(),
            next_prefix: 0,
        })
    }

    /// The next content-file prefix; each call advances it.
    pub fn next_write_prefix(&mut self) -> String {
        let prefix = self.next_prefix.to_string();
        self.next_prefix += 1;
        prefix
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Copies a column's files under a fresh prefix. Returns the archived
    /// index file name.
    pub fn save_column(&mut self, column: &Column) -> Result<String> {
        let index_name = self.copy_column_files(column)?;
        self.metadata
            .insert(CONTENTS_KEY.to_string(), ArchiveContents::SArray.as_str().to_string());
        self.metadata.insert(ROOT_KEY.to_string(), index_name.clone());
        Ok(index_name)
    }

    /// Copies every column plus the frame index under fresh prefixes.
    pub fn save_frame(&mut self, frame: &Frame) -> Result<String> {
        let mut metas = Vec::with_capacity(frame.num_columns());
        for (name, column) in frame.columns() {
            let file = self.copy_column_files(column)?;
            metas.push(FrameColumnMeta {
                name: name.clone(),
                file,
            });
        }
        let prefix = self.next_write_prefix();
        let index_name = format!("{}.{}", prefix, FRAME_INDEX_EXT);
        FrameIndex::new(metas).write_to_file(&self.dir.join(&index_name))?;
        self.metadata
            .insert(CONTENTS_KEY.to_string(), ArchiveContents::SFrame.as_str().to_string());
        self.metadata.insert(ROOT_KEY.to_string(), index_name.clone());
        Ok(index_name)
    }

    fn copy_column_files(&mut self, column: &Column) -> Result<String> {
        let prefix = self.next_write_prefix();
        let inner_segments = column.num_segments();
        let mut metas = Vec::with_capacity(inner_segments);
        for segment in 0..inner_segments {
            let seg_name = format!("{}_{:04}.seg", prefix, segment);
            let source = &column.inner().segment_paths[segment];
            std::fs::copy(source, self.dir.join(&seg_name))?;
            metas.push(SegmentMeta {
                file: seg_name,
                length: column.segment_length(segment)? as u64,
            });
        }
        let index_name = format!("{}.{}", prefix, COLUMN_INDEX_EXT);
        ColumnIndex::new(column.tag(), metas).write_to_file(&self.dir.join(&index_name))?;
        Ok(index_name)
    }

    /// Commits: the metadata file appears atomically, with the `contents`
    /// key required to be present by now.
    pub fn close(self) -> Result<()> {
        if !self.metadata.contains_key(CONTENTS_KEY) {
            return Err(ErrorCode::BadArchive(
                "An archive cannot be closed without a contents tag".to_string(),
            ));
        }
        let final_path = self.dir.join(ARCHIVE_INI_FILE);
        let tmp_path = self.dir.join(format!("{}.tmp", ARCHIVE_INI_FILE));
        write_metadata_ini(&tmp_path, &self.metadata)?;
        std::fs::rename(&tmp_path, &final_path)?;
        debug!("archive committed at {:?}", final_path);
        Ok(())
    }
}

/// Read side: validates the metadata before any typed loader binds.
#[derive(Debug)]
pub struct DirArchiveReader {
    dir: PathBuf,
    metadata: BTreeMap<String, String>,
}

impl DirArchiveReader {
    pub fn open(dir: impl Into<PathBuf>) -> Result<DirArchiveReader> {
        let dir = dir.into();
        let ini_path = dir.join(ARCHIVE_INI_FILE);
        if !ini_path.exists() {
            return Err(ErrorCode::NotFound(format!(
                "No {} under {:?}",
                ARCHIVE_INI_FILE, dir
            )));
        }
        let metadata = read_metadata_ini(&ini_path)?;
        if !metadata.contains_key(CONTENTS_KEY) {
            return Err(ErrorCode::BadArchive(format!(
                "{} has no contents tag",
                ARCHIVE_INI_FILE
            )));
        }
        Ok(DirArchiveReader { dir, metadata })
    }

    pub fn contents(&self) -> Result<ArchiveContents> {
        ArchiveContents::parse(&self.metadata[CONTENTS_KEY])
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    fn root(&self) -> Result<&str> {
        self.metadata(ROOT_KEY).ok_or_else(|| {
            ErrorCode::BadArchive("Archive metadata has no root entry".to_string())
        })
    }

    pub fn load_column(&self) -> Result<Column> {
        if self.contents()? != ArchiveContents::SArray {
            return Err(ErrorCode::BadArchive(format!(
                "Expected an sarray archive, found {}",
                self.contents()?.as_str()
            )));
        }
        Column::load(&self.dir.join(self.root()?))
    }

    pub fn load_frame(&self) -> Result<Frame> {
        if self.contents()? != ArchiveContents::SFrame {
            return Err(ErrorCode::BadArchive(format!(
                "Expected an sframe archive, found {}",
                self.contents()?.as_str()
            )));
        }
        Frame::load(&self.dir.join(self.root()?))
    }
}
