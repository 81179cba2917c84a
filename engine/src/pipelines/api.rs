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

use std::sync::Arc;

use common_base::runtime::parallel_map;
use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;
use parking_lot::Mutex;
use parking_lot::RwLock;

use super::materialize::materialize_to_column;
use super::materialize::materialize_to_frame;
use super::operators::AppendColumnOp;
use super::operators::AppendFrameOp;
use super::operators::BinaryFn;
use super::operators::BinaryOpKind;
use super::operators::ConstantOp;
use super::operators::FlatMapFn;
use super::operators::FlatMapOp;
use super::operators::LambdaFilterOp;
use super::operators::LazyOperator;
use super::operators::LogicalFilterOp;
use super::operators::PredicateFn;
use super::operators::ProjectOp;
use super::operators::RandomOp;
use super::operators::RangeOp;
use super::operators::RowOperatorRef;
use super::operators::ScalarBinOp;
use super::operators::ScalarSide;
use super::operators::SourceColumnOp;
use super::operators::SourceFrameOp;
use super::operators::TransformFn;
use super::operators::TransformOp;
use super::operators::ValueOperatorRef;
use super::operators::VectorOp;
use super::operators::ZipColumnsOp;
use super::parallel::ParallelRows;
use crate::config::config;
use crate::storages::column::Column;
use crate::storages::column::ColumnSegmentWriter;
use crate::storages::column::ColumnWriter;
use crate::storages::frame::Frame;

/// A shareable handle on a lazy value stream. Materialization swaps the
/// held tree for its on-disk result, so every holder of this handle (and
/// every operator built over it) reuses the backing column afterwards.
#[derive(Clone)]
pub struct LazyColumn {
    tag: TypeId,
    op: Arc<RwLock<ValueOperatorRef>>,
}

impl std::fmt::Debug for LazyColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyColumn").field("tag", &self.tag).finish()
    }
}

impl LazyColumn {
    pub fn from_op(op: ValueOperatorRef) -> LazyColumn {
        let tag = op.tags()[0];
        LazyColumn {
            tag,
            op: Arc::new(RwLock::new(op)),
        }
    }

    pub fn from_column(column: Column) -> LazyColumn {
        Self::from_op(Arc::new(SourceColumnOp::new(column)))
    }

    /// Synthetic integer stream `start..end`.
    pub fn range(start: i64, end: i64, reverse: bool) -> LazyColumn {
        Self::from_op(Arc::new(RangeOp::new(start, end, reverse)))
    }

    pub fn constant(value: DataValue, len: usize) -> LazyColumn {
        Self::from_op(Arc::new(ConstantOp::new(value, len)))
    }

    /// Deterministic Bernoulli 0/1 mask.
    pub fn random(prob: f64, seed: u64, len: usize) -> LazyColumn {
        Self::from_op(Arc::new(RandomOp::new(prob, seed, len)))
    }

    /// The current root of the tree. Operators hold the handle, not the
    /// root, so a later materialization is visible to them.
    pub fn op(&self) -> ValueOperatorRef {
        self.op.read().clone()
    }

    pub fn tag(&self) -> TypeId {
        self.tag
    }

    pub fn has_size(&self) -> bool {
        self.op().has_size()
    }

    /// The length if it is known; `SizeUnknown` otherwise, without forcing
    /// anything.
    pub fn try_len(&self) -> Result<usize> {
        self.op().try_len()
    }

    /// The length. Asking a volatile stream for its size materializes it.
    pub fn len(&self) -> Result<usize> {
        if !self.has_size() {
            self.materialize()?;
        }
        self.op().try_len()
    }

    /// Idempotent: the first call drains the tree to disk and caches the
    /// column in place of the tree; later calls return the same column.
    pub fn materialize(&self) -> Result<Column> {
        self.materialize_with_segments(None)
    }

    pub fn materialize_with_segments(&self, num_segments: Option<usize>) -> Result<Column> {
        let op = self.op();
        let column = materialize_to_column(&op, num_segments)?;
        *self.op.write() = Arc::new(SourceColumnOp::new(column.clone()));
        Ok(column)
    }

    /// `dop` independent cursors over this stream.
    pub fn parallel_iter(
        &self,
        dop: usize,
        sizes: Option<&[usize]>,
    ) -> Result<ParallelRows<DataValue>> {
        Ok(ParallelRows::new(self.op().cursors(dop, sizes)?))
    }

    pub fn transform(&self, f: TransformFn, out_tag: TypeId) -> LazyColumn {
        Self::from_op(Arc::new(TransformOp::new(self.clone(), f, out_tag)))
    }

    /// Element-wise binary operator against another equally long stream.
    pub fn binary_op(&self, other: &LazyColumn, f: BinaryFn, out_tag: TypeId) -> Result<LazyColumn> {
        Ok(Self::from_op(Arc::new(VectorOp::try_create(
            self.clone(),
            other.clone(),
            f,
            out_tag,
        )?)))
    }

    /// Element-wise operator against a constant.
    pub fn scalar_binop(
        &self,
        value: DataValue,
        op: BinaryOpKind,
        side: ScalarSide,
    ) -> LazyColumn {
        Self::from_op(Arc::new(ScalarBinOp::new(self.clone(), value, op, side)))
    }

    /// Keeps rows whose mask cell is truthy; the mask must be equally long.
    pub fn logical_filter(&self, mask: &LazyColumn) -> Result<LazyColumn> {
        Ok(Self::from_op(Arc::new(LogicalFilterOp::try_create(
            self.clone(),
            mask.clone(),
        )?)))
    }

    pub fn lambda_filter(&self, predicate: PredicateFn) -> LazyColumn {
        Self::from_op(Arc::new(LambdaFilterOp::new(self.clone(), predicate)))
    }

    /// Deterministic Bernoulli sample of this stream.
    pub fn sample(&self, fraction: f64, seed: u64) -> Result<LazyColumn> {
        let mask = LazyColumn::random(fraction, seed, self.len()?);
        self.logical_filter(&mask)
    }

    /// Lazy concatenation. Volatile inputs are materialized first so the
    /// result always knows its size.
    pub fn append(&self, other: &LazyColumn) -> Result<LazyColumn> {
        if self.tag != other.tag {
            return Err(ErrorCode::SchemaMismatch(format!(
                "Cannot append {} to {}",
                other.tag, self.tag
            )));
        }
        if !self.has_size() {
            self.materialize()?;
        }
        if !other.has_size() {
            other.materialize()?;
        }
        Ok(Self::from_op(Arc::new(AppendColumnOp::new(
            self.clone(),
            other.clone(),
            self.tag,
        ))))
    }

    /// Materializes the rows at `start, start+step, .. < end`.
    pub fn copy_range(&self, start: usize, step: usize, end: usize) -> Result<Column> {
        copy_range_column(&self.materialize()?, start, step, end)
    }

    pub fn head(&self, n: usize) -> Result<Column> {
        self.copy_range(0, 1, n)
    }

    pub fn tail(&self, n: usize) -> Result<Column> {
        let len = self.len()?;
        self.copy_range(len.saturating_sub(n), 1, len)
    }

    /// Full scan convenience.
    pub fn to_values(&self) -> Result<Vec<DataValue>> {
        self.materialize()?.to_values()
    }

    /// Materializes and commits into a directory archive.
    pub fn save(&self, dir: &std::path::Path) -> Result<()> {
        let column = self.materialize()?;
        let mut archive = crate::storages::archive::DirArchiveWriter::create(dir)?;
        archive.save_column(&column)?;
        archive.close()
    }
}

/// A shareable handle on a lazy row stream with a fixed schema.
#[derive(Clone)]
pub struct LazyFrame {
    names: Vec<String>,
    op: Arc<RwLock<RowOperatorRef>>,
}

impl std::fmt::Debug for LazyFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyFrame").field("names", &self.names).finish()
    }
}

impl LazyFrame {
    pub fn from_op(names: Vec<String>, op: RowOperatorRef) -> Result<LazyFrame> {
        if names.len() != op.tags().len() {
            return Err(ErrorCode::SchemaMismatch(format!(
                "{} column names for a stream of arity {}",
                names.len(),
                op.tags().len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ErrorCode::DuplicateName(format!(
                    "Column \"{}\" appears twice",
                    name
                )));
            }
        }
        Ok(LazyFrame {
            names,
            op: Arc::new(RwLock::new(op)),
        })
    }

    pub fn from_frame(frame: Frame) -> LazyFrame {
        let names = frame
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        LazyFrame {
            names,
            op: Arc::new(RwLock::new(
                Arc::new(SourceFrameOp::new(frame)) as RowOperatorRef
            )),
        }
    }

    /// Zips named value streams of equal length into a row stream.
    pub fn zip(columns: Vec<(String, LazyColumn)>) -> Result<LazyFrame> {
        let names = columns.iter().map(|(n, _)| n.clone()).collect();
        let op = ZipColumnsOp::try_create(columns.into_iter().map(|(_, c)| c).collect())?;
        Self::from_op(names, Arc::new(op))
    }

    pub fn op(&self) -> RowOperatorRef {
        self.op.read().clone()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn tags(&self) -> Vec<TypeId> {
        self.op().tags()
    }

    pub fn has_size(&self) -> bool {
        self.op().has_size()
    }

    pub fn try_len(&self) -> Result<usize> {
        self.op().try_len()
    }

    pub fn len(&self) -> Result<usize> {
        if !self.has_size() {
            self.materialize()?;
        }
        self.op().try_len()
    }

    pub fn materialize(&self) -> Result<Frame> {
        self.materialize_with_segments(None)
    }

    pub fn materialize_with_segments(&self, num_segments: Option<usize>) -> Result<Frame> {
        let op = self.op();
        let frame = materialize_to_frame(&op, &self.names, num_segments)?;
        *self.op.write() = Arc::new(SourceFrameOp::new(frame.clone()));
        Ok(frame)
    }

    pub fn parallel_iter(
        &self,
        dop: usize,
        sizes: Option<&[usize]>,
    ) -> Result<ParallelRows<Vec<DataValue>>> {
        Ok(ParallelRows::new(self.op().cursors(dop, sizes)?))
    }

    /// Projection by name; the request must not repeat a column.
    pub fn select_columns(&self, names: &[&str]) -> Result<LazyFrame> {
        let mut indices = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ErrorCode::DuplicateName(format!(
                    "Column \"{}\" is selected twice",
                    name
                )));
            }
            let index = self
                .names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| {
                    ErrorCode::NotFound(format!("Column \"{}\" does not exist", name))
                })?;
            indices.push(index);
        }
        Self::from_op(
            names.iter().map(|s| s.to_string()).collect(),
            Arc::new(ProjectOp::new(self.clone(), indices)),
        )
    }

    pub fn flat_map(
        &self,
        f: FlatMapFn,
        out_names: Vec<String>,
        out_tags: Vec<TypeId>,
    ) -> Result<LazyFrame> {
        if out_names.len() != out_tags.len() {
            return Err(ErrorCode::SchemaMismatch(format!(
                "{} output names against {} tags",
                out_names.len(),
                out_tags.len()
            )));
        }
        Self::from_op(
            out_names,
            Arc::new(FlatMapOp::new(self.clone(), f, out_tags)),
        )
    }

    /// Lazy concatenation; schemas must agree in names (in order) and tags.
    pub fn append(&self, other: &LazyFrame) -> Result<LazyFrame> {
        if self.names != other.names || self.tags() != other.tags() {
            return Err(ErrorCode::SchemaMismatch(
                "Appended frames must share names and tags".to_string(),
            ));
        }
        if !self.has_size() {
            self.materialize()?;
        }
        if !other.has_size() {
            other.materialize()?;
        }
        Self::from_op(
            self.names.clone(),
            Arc::new(AppendFrameOp::new(self.clone(), other.clone(), self.tags())),
        )
    }

    pub fn copy_range(&self, start: usize, step: usize, end: usize) -> Result<Frame> {
        self.materialize()?.copy_range(start, step, end)
    }

    pub fn head(&self, n: usize) -> Result<Frame> {
        self.copy_range(0, 1, n)
    }

    pub fn tail(&self, n: usize) -> Result<Frame> {
        let len = self.len()?;
        self.copy_range(len.saturating_sub(n), 1, len)
    }

    /// Materializes and commits into a directory archive.
    pub fn save(&self, dir: &std::path::Path) -> Result<()> {
        let frame = self.materialize()?;
        let mut archive = crate::storages::archive::DirArchiveWriter::create(dir)?;
        archive.save_frame(&frame)?;
        archive.close()
    }
}

impl Frame {
    /// Lazy concatenation, exposed on the materialized frame for symmetry.
    pub fn append(&self, other: &Frame) -> Result<LazyFrame> {
        LazyFrame::from_frame(self.clone()).append(&LazyFrame::from_frame(other.clone()))
    }

    /// Materializes the rows at `start, start+step, .. < end` into a new
    /// frame.
    pub fn copy_range(&self, start: usize, step: usize, end: usize) -> Result<Frame> {
        if step == 0 {
            return Err(ErrorCode::InvalidArgument(
                "copy_range with step = 0".to_string(),
            ));
        }
        let mut columns = Vec::with_capacity(self.num_columns());
        for (name, column) in self.columns() {
            columns.push((name.clone(), copy_range_column(column, start, step, end)?));
        }
        Frame::new(columns)
    }

    pub fn head(&self, n: usize) -> Result<Frame> {
        self.copy_range(0, 1, n)
    }

    pub fn tail(&self, n: usize) -> Result<Frame> {
        self.copy_range(self.len().saturating_sub(n), 1, self.len())
    }
}

/// Strided materializing copy over a closed column.
pub fn copy_range_column(column: &Column, start: usize, step: usize, end: usize) -> Result<Column> {
    if step == 0 {
        return Err(ErrorCode::InvalidArgument(
            "copy_range with step = 0".to_string(),
        ));
    }
    let end = end.min(column.len());
    let count = if start >= end {
        0
    } else {
        (end - start).div_ceil(step)
    };

    let num_segments = config().default_segments().max(1);
    let per = count.div_ceil(num_segments).max(1);
    let mut writer = ColumnWriter::create(column.tag(), num_segments)?;
    let segment_writers = writer.segment_writers()?;

    let column = column.clone();
    let slots: Arc<Vec<Mutex<Option<ColumnSegmentWriter>>>> = Arc::new(
        segment_writers
            .into_iter()
            .map(|w| Mutex::new(Some(w)))
            .collect(),
    );
    let finished = parallel_map(num_segments, move |i| {
        let mut segment_writer = slots[i]
            .lock()
            .take()
            .ok_or_else(|| ErrorCode::Internal("copy_range slot taken twice".to_string()))?;
        let first = (i * per).min(count);
        let last = ((i + 1) * per).min(count);
        if first < last {
            let from = start + first * step;
            let mut scanner = column.reader().range_scanner(from, end)?;
            let mut cell = Vec::with_capacity(1);
            for _ in first..last {
                cell.clear();
                scanner.read_into(1, &mut cell)?;
                segment_writer.push(&cell[0])?;
                if step > 1 {
                    scanner.skip(step - 1)?;
                }
            }
        }
        Ok(segment_writer)
    })?;
    writer.close(finished)
}
