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

use common_base::temp;
use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use super::frame::Frame;
use super::index::FrameColumnMeta;
use super::index::FrameIndex;
use crate::storages::column::ColumnSegmentWriter;
use crate::storages::column::ColumnWriter;

/// Row-at-a-time writer over a fixed schema: one row cursor per segment,
/// each advancing every column's segment in lockstep.
pub struct FrameWriter {
    names: Vec<String>,
    column_writers: Vec<ColumnWriter>,
    num_segments: usize,
    writers_taken: bool,
}

impl FrameWriter {
    pub fn create(names: &[String], tags: &[TypeId], num_segments: usize) -> Result<FrameWriter> {
        if names.len() != tags.len() {
            return Err(ErrorCode::SchemaMismatch(format!(
                "{} column names against {} tags",
                names.len(),
                tags.len()
            )));
        }
        if names.is_empty() {
            return Err(ErrorCode::SchemaMismatch(
                "A frame needs at least one column".to_string(),
            ));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ErrorCode::DuplicateName(format!(
                    "Column \"{}\" appears twice",
                    name
                )));
            }
        }
        let column_writers = tags
            .iter()
            .map(|tag| ColumnWriter::create(*tag, num_segments))
            .collect::<Result<Vec<_>>>()?;
        Ok(FrameWriter {
            names: names.to_vec(),
            column_writers,
            num_segments,
            writers_taken: false,
        })
    }

    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// One row cursor per segment, taken exactly once.
    pub fn segment_writers(&mut self) -> Result<Vec<FrameSegmentWriter>> {
        if self.writers_taken {
            return Err(ErrorCode::InvalidState(
                "Segment writers were already taken".to_string(),
            ));
        }
        self.writers_taken = true;
        // column-major writers, regrouped row-major per segment
        let mut per_column: Vec<Vec<ColumnSegmentWriter>> = self
            .column_writers
            .iter_mut()
            .map(|w| w.segment_writers())
            .collect::<Result<Vec<_>>>()?;
        let arity = self.names.len();
        let mut out = Vec::with_capacity(self.num_segments);
        for _ in 0..self.num_segments {
            let mut columns = Vec::with_capacity(arity);
            for writers in per_column.iter_mut() {
                columns.push(writers.remove(0));
            }
            out.push(FrameSegmentWriter { arity, columns });
        }
        Ok(out)
    }

    /// Commits all columns and the frame index.
    pub fn close(self, writers: Vec<FrameSegmentWriter>) -> Result<Frame> {
        if writers.len() != self.num_segments {
            return Err(ErrorCode::InvalidState(format!(
                "Expected {} segment writers back, got {}",
                self.num_segments,
                writers.len()
            )));
        }
        // regroup back to column-major
        let arity = self.names.len();
        let mut per_column: Vec<Vec<ColumnSegmentWriter>> =
            (0..arity).map(|_| Vec::with_capacity(writers.len())).collect();
        for segment in writers {
            if segment.columns.len() != arity {
                return Err(ErrorCode::InvalidState(
                    "Segment writer returned to the wrong frame".to_string(),
                ));
            }
            for (c, writer) in segment.columns.into_iter().enumerate() {
                per_column[c].push(writer);
            }
        }
        let mut columns = Vec::with_capacity(arity);
        for (name, (writer, segment_writers)) in self
            .names
            .iter()
            .zip(self.column_writers.into_iter().zip(per_column))
        {
            columns.push((name.clone(), writer.close(segment_writers)?));
        }

        let index_path = temp::new_temp_path("frame_idx")?;
        let dir = index_path.parent().unwrap();
        let metas = columns
            .iter()
            .map(|(name, column)| {
                Ok(FrameColumnMeta {
                    name: name.clone(),
                    file: column
                        .index_path()
                        .strip_prefix(dir)
                        .map_err(|_| {
                            ErrorCode::Io("Column index left the temp directory".to_string())
                        })?
                        .to_string_lossy()
                        .to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        FrameIndex::new(metas).write_to_file(&index_path)?;
        temp::commit_finished(&index_path);
        Ok(Frame::new(columns)?.with_index_path(index_path))
    }
}

/// One row cursor: a row of values fans out to this segment of every
/// column.
pub struct FrameSegmentWriter {
    arity: usize,
    columns: Vec<ColumnSegmentWriter>,
}

impl FrameSegmentWriter {
    pub fn write_row(&mut self, row: &[DataValue]) -> Result<()> {
        if row.len() != self.arity {
            return Err(ErrorCode::SchemaMismatch(format!(
                "Row of arity {} written into a frame of arity {}",
                row.len(),
                self.arity
            )));
        }
        for (writer, value) in self.columns.iter_mut().zip(row.iter()) {
            writer.push(value)?;
        }
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.columns.first().map(|w| w.rows_written()).unwrap_or(0)
    }
}
