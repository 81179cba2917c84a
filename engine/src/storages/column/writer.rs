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

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::PathBuf;

use common_base::temp;
use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use super::column::Column;
use super::index::ColumnIndex;
use super::index::SegmentMeta;
use super::segment::is_fixed_width;
use super::segment::write_record;
use super::segment::write_segment_header;

/// Opens a column for writing with a fixed segment count. The segment
/// writers are taken exactly once (one per segment, each independently
/// movable to a worker); `close` commits the index and freezes the column.
pub struct ColumnWriter {
    tag: TypeId,
    index_path: PathBuf,
    segment_paths: Vec<PathBuf>,
    writers_taken: bool,
}

impl ColumnWriter {
    pub fn create(tag: TypeId, num_segments: usize) -> Result<ColumnWriter> {
        if num_segments == 0 {
            return Err(ErrorCode::InvalidArgument(
                "A column needs at least one segment".to_string(),
            ));
        }
        let index_path = temp::new_temp_path("sidx")?;
        let stem = index_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("column")
            .to_string();
        let dir = index_path.parent().unwrap().to_path_buf();
        let segment_paths = (0..num_segments)
            .map(|i| dir.join(format!("{}_{:04}.seg", stem, i)))
            .collect();
        Ok(ColumnWriter {
            tag,
            index_path,
            segment_paths,
            writers_taken: false,
        })
    }

    pub fn tag(&self) -> TypeId {
        self.tag
    }

    pub fn num_segments(&self) -> usize {
        self.segment_paths.len()
    }

    /// One write cursor per segment. Creates the segment files.
    pub fn segment_writers(&mut self) -> Result<Vec<ColumnSegmentWriter>> {
        if self.writers_taken {
            return Err(ErrorCode::InvalidState(
                "Segment writers were already taken".to_string(),
            ));
        }
        self.writers_taken = true;
        self.segment_paths
            .iter()
            .map(|path| ColumnSegmentWriter::create(self.tag, path.clone()))
            .collect()
    }

    /// Commits: flushes every segment, writes the index, and returns the
    /// read-only column. The writers handed back must be this writer's own,
    /// in order.
    pub fn close(self, writers: Vec<ColumnSegmentWriter>) -> Result<Column> {
        if !self.writers_taken {
            return Err(ErrorCode::InvalidState(
                "Cannot close a column whose writers were never taken".to_string(),
            ));
        }
        if writers.len() != self.segment_paths.len() {
            return Err(ErrorCode::InvalidState(format!(
                "Expected {} segment writers back, got {}",
                self.segment_paths.len(),
                writers.len()
            )));
        }
        let mut segments = Vec::with_capacity(writers.len());
        for (path, writer) in self.segment_paths.iter().zip(writers) {
            if writer.path != *path {
                return Err(ErrorCode::InvalidState(
                    "Segment writer returned to the wrong column".to_string(),
                ));
            }
            let length = writer.finish()?;
            segments.push(SegmentMeta {
                file: path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string(),
                length,
            });
        }
        let index = ColumnIndex::new(self.tag, segments.clone());
        index.write_to_file(&self.index_path)?;
        temp::commit_finished(&self.index_path);

        let segment_lengths = segments.iter().map(|s| s.length).collect();
        Ok(Column::from_parts(
            self.tag,
            self.index_path.clone(),
            self.segment_paths.clone(),
            segment_lengths,
        ))
    }
}

/// The write cursor for one segment. Values are softly converted to the
/// declared tag on the way in.
#[derive(Debug)]
pub struct ColumnSegmentWriter {
    tag: TypeId,
    fixed: bool,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    count: u64,
}

impl ColumnSegmentWriter {
    fn create(tag: TypeId, path: PathBuf) -> Result<ColumnSegmentWriter> {
        let file = File::create(&path)
            .map_err(|e| ErrorCode::Io(format!("Cannot create segment {:?}: {}", path, e)))?;
        temp::register_unfinished(&path);
        let mut writer = BufWriter::new(file);
        write_segment_header(&mut writer, tag)?;
        Ok(ColumnSegmentWriter {
            tag,
            fixed: is_fixed_width(tag),
            path,
            writer: Some(writer),
            count: 0,
        })
    }

    pub fn push(&mut self, value: &DataValue) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            ErrorCode::InvalidState("Write into a closed column segment".to_string())
        })?;
        let converted;
        let value = if value.data_type_id() == self.tag || value.is_undefined() {
            value
        } else {
            converted = value.convert_to(self.tag)?;
            &converted
        };
        write_record(writer, value, self.fixed)?;
        self.count += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.count
    }

    fn finish(mut self) -> Result<u64> {
        let mut writer = self.writer.take().ok_or_else(|| {
            ErrorCode::InvalidState("Segment was already finished".to_string())
        })?;
        writer.flush()?;
        temp::commit_finished(&self.path);
        Ok(self.count)
    }
}

impl Drop for ColumnSegmentWriter {
    fn drop(&mut self) {
        // A writer dropped without close leaves no visible garbage.
        if self.writer.take().is_some() {
            temp::discard_unfinished(&self.path);
        }
    }
}
