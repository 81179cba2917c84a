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

use std::collections::VecDeque;

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::Result;

use super::operator::resolve_cursor_sizes;
use super::operator::Cursor;
use super::operator::LazyOperator;
use super::operator::Row;
use super::operator::RowOperatorRef;
use super::operator::ValueOperatorRef;
use crate::pipelines::LazyColumn;
use crate::pipelines::LazyFrame;

/// Greedy partition of the merged row range over the two children. Returns,
/// per cursor, the lengths it takes from the left and from the right; with
/// contiguous cursor ranges at most one cursor takes from both, and it
/// drains its left piece before its right piece.
pub fn plan_append_ranges(sizes: &[usize], left_len: usize) -> Vec<(usize, usize)> {
    let mut plan = Vec::with_capacity(sizes.len());
    let mut pos = 0usize;
    for size in sizes {
        let end = pos + size;
        let from_left = end.min(left_len).saturating_sub(pos);
        plan.push((from_left, size - from_left));
        pos = end;
    }
    plan
}

fn chained_cursors<T: Send + 'static>(
    left: &dyn LazyOperator<T>,
    right: &dyn LazyOperator<T>,
    dop: usize,
    sizes: Option<&[usize]>,
) -> Result<Vec<Box<dyn Cursor<T>>>> {
    let left_len = left.try_len()?;
    let total = left_len + right.try_len()?;
    let sizes = resolve_cursor_sizes(total, dop, sizes)?;
    let plan = plan_append_ranges(&sizes, left_len);

    let left_cuts: Vec<usize> = plan.iter().map(|(l, _)| *l).filter(|l| *l > 0).collect();
    let right_cuts: Vec<usize> = plan.iter().map(|(_, r)| *r).filter(|r| *r > 0).collect();
    let mut left_cursors: VecDeque<_> = if left_cuts.is_empty() {
        VecDeque::new()
    } else {
        left.cursors(left_cuts.len(), Some(&left_cuts))?.into()
    };
    let mut right_cursors: VecDeque<_> = if right_cuts.is_empty() {
        VecDeque::new()
    } else {
        right.cursors(right_cuts.len(), Some(&right_cuts))?.into()
    };

    let mut out: Vec<Box<dyn Cursor<T>>> = Vec::with_capacity(dop);
    for (from_left, from_right) in plan {
        let mut parts: VecDeque<Box<dyn Cursor<T>>> = VecDeque::new();
        if from_left > 0 {
            if let Some(cursor) = left_cursors.pop_front() {
                parts.push_back(cursor);
            }
        }
        if from_right > 0 {
            if let Some(cursor) = right_cursors.pop_front() {
                parts.push_back(cursor);
            }
        }
        out.push(Box::new(ChainCursor { parts }));
    }
    Ok(out)
}

/// A cursor made of sub-cursors drained in order; the straddling cursor of
/// an append is the two-part case.
struct ChainCursor<T> {
    parts: VecDeque<Box<dyn Cursor<T>>>,
}

impl<T: 'static> Cursor<T> for ChainCursor<T>
where T: Send
{
    fn read(&mut self, k: usize, out: &mut Vec<T>) -> Result<usize> {
        let mut total = 0;
        while total < k {
            let part = match self.parts.front_mut() {
                Some(part) => part,
                None => break,
            };
            let n = part.read(k - total, out)?;
            total += n;
            if n == 0 {
                self.parts.pop_front();
            }
        }
        Ok(total)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        let mut total = 0;
        while total < k {
            let part = match self.parts.front_mut() {
                Some(part) => part,
                None => break,
            };
            let n = part.skip(k - total)?;
            total += n;
            if n == 0 {
                self.parts.pop_front();
            }
        }
        Ok(total)
    }
}

/// Lazy concatenation of two value streams. Children must be sized; the
/// handles materialize volatile inputs before this node is built.
pub struct AppendColumnOp {
    left: LazyColumn,
    right: LazyColumn,
    tag: TypeId,
}

impl AppendColumnOp {
    pub fn new(left: LazyColumn, right: LazyColumn, tag: TypeId) -> Self {
        Self { left, right, tag }
    }
}

impl LazyOperator<DataValue> for AppendColumnOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![self.tag]
    }

    fn has_size(&self) -> bool {
        self.left.op().has_size() && self.right.op().has_size()
    }

    fn try_len(&self) -> Result<usize> {
        Ok(self.left.op().try_len()? + self.right.op().try_len()?)
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        let left: ValueOperatorRef = self.left.op();
        let right: ValueOperatorRef = self.right.op();
        chained_cursors(left.as_ref(), right.as_ref(), dop, sizes)
    }
}

/// Lazy concatenation of two row streams with identical schemas.
pub struct AppendFrameOp {
    left: LazyFrame,
    right: LazyFrame,
    tags: Vec<TypeId>,
}

impl AppendFrameOp {
    pub fn new(left: LazyFrame, right: LazyFrame, tags: Vec<TypeId>) -> Self {
        Self { left, right, tags }
    }
}

impl LazyOperator<Row> for AppendFrameOp {
    fn tags(&self) -> Vec<TypeId> {
        self.tags.clone()
    }

    fn has_size(&self) -> bool {
        self.left.op().has_size() && self.right.op().has_size()
    }

    fn try_len(&self) -> Result<usize> {
        Ok(self.left.op().try_len()? + self.right.op().try_len()?)
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<Row>>>> {
        let left: RowOperatorRef = self.left.op();
        let right: RowOperatorRef = self.right.op();
        chained_cursors(left.as_ref(), right.as_ref(), dop, sizes)
    }
}
