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
use std::sync::Arc;

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use super::index::ColumnIndex;
use super::reader::ColumnReader;

/// An immutable, typed, segmented on-disk sequence of values. Cheap to
/// clone and share; all mutation happened before `close()` in the writer.
#[derive(Clone)]
pub struct Column {
    inner: Arc<ColumnInner>,
}

pub(crate) struct ColumnInner {
    pub tag: TypeId,
    pub index_path: PathBuf,
    /// Absolute segment paths, in order.
    pub segment_paths: Vec<PathBuf>,
    pub segment_lengths: Vec<u64>,
    /// Prefix sums of segment lengths; computed once, one entry per segment
    /// plus the total, so locating a row is a binary search away.
    pub offsets: Vec<u64>,
}

impl Column {
    pub(crate) fn from_parts(
        tag: TypeId,
        index_path: PathBuf,
        segment_paths: Vec<PathBuf>,
        segment_lengths: Vec<u64>,
    ) -> Column {
        let mut offsets = Vec::with_capacity(segment_lengths.len() + 1);
        let mut acc = 0u64;
        offsets.push(0);
        for len in &segment_lengths {
            acc += len;
            offsets.push(acc);
        }
        Column {
            inner: Arc::new(ColumnInner {
                tag,
                index_path,
                segment_paths,
                segment_lengths,
                offsets,
            }),
        }
    }

    /// Binds a column stored on disk by its `.sidx` index file.
    pub fn load(index_path: &Path) -> Result<Column> {
        let index = ColumnIndex::read_from_file(index_path)?;
        let dir = index_path.parent().unwrap_or_else(|| Path::new("."));
        let segment_paths = index.segments.iter().map(|s| dir.join(&s.file)).collect();
        let segment_lengths = index.segments.iter().map(|s| s.length).collect();
        Ok(Column::from_parts(
            index.tag,
            index_path.to_path_buf(),
            segment_paths,
            segment_lengths,
        ))
    }

    pub fn tag(&self) -> TypeId {
        self.inner.tag
    }

    pub fn len(&self) -> usize {
        *self.inner.offsets.last().unwrap() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_segments(&self) -> usize {
        self.inner.segment_lengths.len()
    }

    pub fn segment_length(&self, segment: usize) -> Result<usize> {
        self.inner
            .segment_lengths
            .get(segment)
            .map(|v| *v as usize)
            .ok_or_else(|| {
                ErrorCode::OutOfRange(format!(
                    "Segment {} of a column with {} segments",
                    segment,
                    self.num_segments()
                ))
            })
    }

    pub fn index_path(&self) -> &Path {
        &self.inner.index_path
    }

    /// The index file plus every segment file, for archive relocation.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.inner.index_path.clone()];
        files.extend(self.inner.segment_paths.iter().cloned());
        files
    }

    pub fn reader(&self) -> ColumnReader {
        ColumnReader::new(self.clone())
    }

    /// Convenience full scan used by small consumers and tests.
    pub fn to_values(&self) -> Result<Vec<DataValue>> {
        let mut out = Vec::with_capacity(self.len());
        self.reader().read_range(0, self.len(), &mut out)?;
        Ok(out)
    }

    pub(crate) fn inner(&self) -> &ColumnInner {
        &self.inner
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("tag", &self.inner.tag)
            .field("len", &self.len())
            .field("segments", &self.num_segments())
            .finish()
    }
}
