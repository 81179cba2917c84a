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
use std::path::PathBuf;

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use super::index::FrameIndex;
use crate::storages::column::Column;
use crate::storages::column::RangeScanner;

/// An ordered, named set of equally long columns. Schema edits mutate this
/// view only; the columns themselves are shared and immutable.
pub struct Frame {
    columns: Vec<(String, Column)>,
    index_path: Option<PathBuf>,
    /// Bumped by every schema edit; outstanding cooperative iterators check
    /// it and refuse to continue after a mutation.
    version: u64,
    iter: Option<FrameIterState>,
}

struct FrameIterState {
    version: u64,
    scanners: Vec<RangeScanner>,
    remaining: usize,
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        Frame {
            columns: self.columns.clone(),
            index_path: self.index_path.clone(),
            version: 0,
            iter: None,
        }
    }
}

impl Frame {
    pub fn empty() -> Frame {
        Frame {
            columns: vec![],
            index_path: None,
            version: 0,
            iter: None,
        }
    }

    pub fn new(columns: Vec<(String, Column)>) -> Result<Frame> {
        let mut frame = Frame::empty();
        for (name, column) in columns {
            frame.add_column(column, &name)?;
        }
        Ok(frame)
    }

    pub(crate) fn with_index_path(mut self, index_path: PathBuf) -> Frame {
        self.index_path = Some(index_path);
        self
    }

    /// Binds a frame stored on disk by its `.frame_idx` file.
    pub fn load(index_path: &Path) -> Result<Frame> {
        let index = FrameIndex::read_from_file(index_path)?;
        let dir = index_path.parent().unwrap_or_else(|| Path::new("."));
        let mut columns = Vec::with_capacity(index.columns.len());
        for meta in &index.columns {
            columns.push((meta.name.clone(), Column::load(&dir.join(&meta.file))?));
        }
        Ok(Frame::new(columns)?.with_index_path(index_path.to_path_buf()))
    }

    pub fn len(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Segments of the first column; every column of a written frame shares
    /// the layout.
    pub fn num_segments(&self) -> usize {
        self.columns
            .first()
            .map(|(_, c)| c.num_segments())
            .unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn tags(&self) -> Vec<TypeId> {
        self.columns.iter().map(|(_, c)| c.tag()).collect()
    }

    pub fn column(&self, index: usize) -> Result<&Column> {
        self.columns.get(index).map(|(_, c)| c).ok_or_else(|| {
            ErrorCode::OutOfRange(format!(
                "Column {} of a frame with {} columns",
                index,
                self.num_columns()
            ))
        })
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| ErrorCode::NotFound(format!("Column \"{}\" does not exist", name)))
    }

    pub fn column_by_name(&self, name: &str) -> Result<&Column> {
        let index = self.column_index(name)?;
        Ok(&self.columns[index].1)
    }

    pub fn columns(&self) -> &[(String, Column)] {
        &self.columns
    }

    pub fn index_path(&self) -> Option<&Path> {
        self.index_path.as_deref()
    }

    /// Projection sharing the underlying column.
    pub fn select_column(&self, name: &str) -> Result<Frame> {
        self.select_columns(&[name])
    }

    /// Projection sharing the underlying columns; the request must not name
    /// a column twice.
    pub fn select_columns(&self, names: &[&str]) -> Result<Frame> {
        let mut selected = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ErrorCode::DuplicateName(format!(
                    "Column \"{}\" is selected twice",
                    name
                )));
            }
            selected.push(((*name).to_string(), self.column_by_name(name)?.clone()));
        }
        Ok(Frame {
            columns: selected,
            index_path: None,
            version: 0,
            iter: None,
        })
    }

    /// Adds a column. The first column of an empty frame fixes the length;
    /// an empty name is auto-generated as `X<k>` with `k` one past the
    /// current column count.
    pub fn add_column(&mut self, column: Column, name: &str) -> Result<()> {
        let name = if name.is_empty() {
            format!("X{}", self.num_columns() + 1)
        } else {
            name.to_string()
        };
        if self.columns.iter().any(|(n, _)| *n == name) {
            return Err(ErrorCode::DuplicateName(format!(
                "Column \"{}\" already exists",
                name
            )));
        }
        if !self.columns.is_empty() && column.len() != self.len() {
            return Err(ErrorCode::LengthMismatch(format!(
                "Cannot add a column of length {} to a frame of length {}",
                column.len(),
                self.len()
            )));
        }
        self.columns.push((name, column));
        self.bump();
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let index = self.column_index(name)?;
        let (_, column) = self.columns.remove(index);
        self.bump();
        Ok(column)
    }

    pub fn swap_columns(&mut self, left: usize, right: usize) -> Result<()> {
        if left >= self.num_columns() || right >= self.num_columns() {
            return Err(ErrorCode::OutOfRange(format!(
                "Swap of columns {} and {} in a frame with {} columns",
                left,
                right,
                self.num_columns()
            )));
        }
        self.columns.swap(left, right);
        self.bump();
        Ok(())
    }

    pub fn set_column_name(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self.column_index(old)?;
        if old != new && self.columns.iter().any(|(n, _)| n == new) {
            return Err(ErrorCode::DuplicateName(format!(
                "Column \"{}\" already exists",
                new
            )));
        }
        self.columns[index].0 = new.to_string();
        self.bump();
        Ok(())
    }

    fn bump(&mut self) {
        self.version += 1;
        self.iter = None;
    }

    /// Starts (or restarts) the cooperative linear scan used by foreign
    /// callers.
    pub fn begin_iterator(&mut self) -> Result<()> {
        let mut scanners = Vec::with_capacity(self.num_columns());
        for (_, column) in &self.columns {
            scanners.push(column.reader().range_scanner(0, column.len())?);
        }
        self.iter = Some(FrameIterState {
            version: self.version,
            scanners,
            remaining: self.len(),
        });
        Ok(())
    }

    /// Returns up to `k` rows, fewer than `k` only at the end of the frame.
    /// Any schema mutation since `begin_iterator` invalidates the scan.
    pub fn next_batch(&mut self, k: usize) -> Result<Vec<Vec<DataValue>>> {
        let version = self.version;
        let state = self.iter.as_mut().ok_or_else(|| {
            ErrorCode::InvalidState("next_batch without begin_iterator".to_string())
        })?;
        if state.version != version {
            return Err(ErrorCode::InvalidState(
                "The frame changed while it was being iterated".to_string(),
            ));
        }
        let n = k.min(state.remaining);
        let mut column_batches = Vec::with_capacity(state.scanners.len());
        for scanner in &mut state.scanners {
            let mut batch = Vec::with_capacity(n);
            scanner.read_into(n, &mut batch)?;
            column_batches.push(batch);
        }
        state.remaining -= n;
        let mut rows = Vec::with_capacity(n);
        for r in 0..n {
            rows.push(
                column_batches
                    .iter_mut()
                    .map(|b| std::mem::take(&mut b[r]))
                    .collect(),
            );
        }
        Ok(rows)
    }

    /// Whole-row scan convenience used by small consumers and tests.
    pub fn to_rows(&self) -> Result<Vec<Vec<DataValue>>> {
        let mut frame = self.clone();
        let len = frame.len();
        frame.begin_iterator()?;
        frame.next_batch(len)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.len())
            .field("columns", &self.column_names())
            .finish()
    }
}
