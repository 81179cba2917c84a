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

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use crate::storages::column::Column;
use crate::storages::frame::Frame;

/// A multi-column stream element.
pub type Row = Vec<DataValue>;

pub type TransformFn = Arc<dyn Fn(&DataValue) -> Result<DataValue> + Send + Sync>;
pub type BinaryFn = Arc<dyn Fn(&DataValue, &DataValue) -> Result<DataValue> + Send + Sync>;
pub type PredicateFn = Arc<dyn Fn(&DataValue) -> Result<bool> + Send + Sync>;
pub type FlatMapFn = Arc<dyn Fn(&Row) -> Result<Vec<Row>> + Send + Sync>;

pub type ValueOperatorRef = Arc<dyn LazyOperator<DataValue>>;
pub type RowOperatorRef = Arc<dyn LazyOperator<Row>>;

/// The concrete on-disk object behind an already-materialized node.
#[derive(Clone)]
pub enum Backing {
    Column(Column),
    Frame(Frame),
}

/// One of the `dop` independent readers over an operator. Rows within a
/// cursor are in order; the concatenation of cursors 0..dop-1 is the
/// logical order of the node. Cursors never advance each other.
pub trait Cursor<T>: Send {
    /// Appends up to `k` items, returning how many; zero only at this
    /// cursor's end.
    fn read(&mut self, k: usize, out: &mut Vec<T>) -> Result<usize>;

    /// Same contract as `read`, discarding the items.
    fn skip(&mut self, k: usize) -> Result<usize> {
        let mut scratch = Vec::with_capacity(k.min(65536));
        self.read(k, &mut scratch)
    }
}

/// A lazy description of a value or row stream. Nodes compose by holding
/// handles to their children; they are immutable once built, so the tree is
/// a DAG by construction.
pub trait LazyOperator<T>: Send + Sync {
    /// Output tags: one entry for a value stream, the row arity for a row
    /// stream.
    fn tags(&self) -> Vec<TypeId>;

    /// Whether the row count is known without materializing.
    fn has_size(&self) -> bool;

    /// A node whose size can never be known up front (filters, flat maps).
    /// Stays true after materialization even though `has_size` flips.
    fn is_volatile(&self) -> bool {
        false
    }

    /// The row count; `SizeUnknown` when `has_size` is false.
    fn try_len(&self) -> Result<usize>;

    /// Opens `dop` independent cursors. Non-volatile nodes honor explicit
    /// per-cursor lengths exactly; volatile nodes honor `dop` only and
    /// ignore `sizes`.
    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<T>>>>;

    /// The on-disk object, when this node is a materialized leaf.
    fn backing(&self) -> Option<Backing> {
        None
    }
}

/// Resolves the per-cursor lengths of a sized node: the caller's explicit
/// split (validated against the total) or the default ceil split, under
/// which only the tail cursors can be empty.
pub(crate) fn resolve_cursor_sizes(
    len: usize,
    dop: usize,
    sizes: Option<&[usize]>,
) -> Result<Vec<usize>> {
    if dop == 0 {
        return Err(ErrorCode::InvalidArgument(
            "Degree of parallelism must be at least 1".to_string(),
        ));
    }
    match sizes {
        Some(sizes) => {
            if sizes.len() != dop {
                return Err(ErrorCode::InvalidArgument(format!(
                    "{} cursor sizes for dop {}",
                    sizes.len(),
                    dop
                )));
            }
            let total: usize = sizes.iter().sum();
            if total != len {
                return Err(ErrorCode::InvalidArgument(format!(
                    "Cursor sizes sum to {}, node length is {}",
                    total, len
                )));
            }
            Ok(sizes.to_vec())
        }
        None => {
            let per = len.div_ceil(dop.max(1)).max(1);
            let mut out = Vec::with_capacity(dop);
            let mut remaining = len;
            for _ in 0..dop {
                let take = per.min(remaining);
                out.push(take);
                remaining -= take;
            }
            Ok(out)
        }
    }
}

/// Start offsets from per-cursor lengths.
pub(crate) fn cursor_starts(sizes: &[usize]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(sizes.len());
    let mut acc = 0;
    for s in sizes {
        starts.push(acc);
        acc += s;
    }
    starts
}
