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

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use super::operator::Cursor;
use super::operator::LazyOperator;
use super::operator::PredicateFn;
use crate::config::config;
use crate::pipelines::LazyColumn;

/// Keeps the value rows whose mask cell is truthy. Volatile: the kept count
/// is unknown until the stream drains. Both children run with the same
/// segmentation; each cursor pairs one value cursor with its mirrored mask
/// cursor.
pub struct LogicalFilterOp {
    values: LazyColumn,
    mask: LazyColumn,
}

impl LogicalFilterOp {
    /// The mask must be as long as the values; sizing either side may
    /// materialize it.
    pub fn try_create(values: LazyColumn, mask: LazyColumn) -> Result<Self> {
        let (v, m) = (values.len()?, mask.len()?);
        if v != m {
            return Err(ErrorCode::LengthMismatch(format!(
                "A mask of length {} cannot filter {} values",
                m, v
            )));
        }
        Ok(Self { values, mask })
    }
}

impl LazyOperator<DataValue> for LogicalFilterOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![self.values.tag()]
    }

    fn has_size(&self) -> bool {
        false
    }

    fn is_volatile(&self) -> bool {
        true
    }

    fn try_len(&self) -> Result<usize> {
        Err(ErrorCode::SizeUnknown(
            "A filtered stream has no size before materialization".to_string(),
        ))
    }

    fn cursors(&self, dop: usize, _sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        let values = self.values.op().cursors(dop, None)?;
        let mask = self.mask.op().cursors(dop, None)?;
        Ok(values
            .into_iter()
            .zip(mask)
            .map(|(v, m)| {
                Box::new(LogicalFilterCursor {
                    values: v,
                    mask: m,
                    carry: Vec::new(),
                }) as Box<dyn Cursor<DataValue>>
            })
            .collect())
    }
}

struct LogicalFilterCursor {
    values: Box<dyn Cursor<DataValue>>,
    mask: Box<dyn Cursor<DataValue>>,
    /// Kept rows pulled but not yet handed out.
    carry: Vec<DataValue>,
}

impl Cursor<DataValue> for LogicalFilterCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        let batch = config().read_batch_size;
        while self.carry.len() < k {
            let mut vbatch = Vec::with_capacity(batch);
            let n = self.values.read(batch, &mut vbatch)?;
            let mut mbatch = Vec::with_capacity(n);
            let m = self.mask.read(n, &mut mbatch)?;
            if m != n {
                return Err(ErrorCode::LengthMismatch(format!(
                    "Filter mask diverged from its values mid-stream ({} vs {} rows)",
                    n, m
                )));
            }
            if n == 0 {
                break;
            }
            for (value, keep) in vbatch.into_iter().zip(mbatch.iter()) {
                if keep.is_true() {
                    self.carry.push(value);
                }
            }
        }
        let n = k.min(self.carry.len());
        out.extend(self.carry.drain(..n));
        Ok(n)
    }
}

/// Like the logical filter, with the mask coming from a predicate on the
/// value itself.
pub struct LambdaFilterOp {
    child: LazyColumn,
    predicate: PredicateFn,
}

impl LambdaFilterOp {
    pub fn new(child: LazyColumn, predicate: PredicateFn) -> Self {
        Self { child, predicate }
    }
}

impl LazyOperator<DataValue> for LambdaFilterOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![self.child.tag()]
    }

    fn has_size(&self) -> bool {
        false
    }

    fn is_volatile(&self) -> bool {
        true
    }

    fn try_len(&self) -> Result<usize> {
        Err(ErrorCode::SizeUnknown(
            "A filtered stream has no size before materialization".to_string(),
        ))
    }

    fn cursors(&self, dop: usize, _sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        Ok(self
            .child
            .op()
            .cursors(dop, None)?
            .into_iter()
            .map(|inner| {
                Box::new(LambdaFilterCursor {
                    inner,
                    predicate: self.predicate.clone(),
                    carry: Vec::new(),
                }) as Box<dyn Cursor<DataValue>>
            })
            .collect())
    }
}

struct LambdaFilterCursor {
    inner: Box<dyn Cursor<DataValue>>,
    predicate: PredicateFn,
    carry: Vec<DataValue>,
}

impl Cursor<DataValue> for LambdaFilterCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        let batch = config().read_batch_size;
        while self.carry.len() < k {
            let mut vbatch = Vec::with_capacity(batch);
            let n = self.inner.read(batch, &mut vbatch)?;
            if n == 0 {
                break;
            }
            for value in vbatch {
                if (self.predicate)(&value)? {
                    self.carry.push(value);
                }
            }
        }
        let n = k.min(self.carry.len());
        out.extend(self.carry.drain(..n));
        Ok(n)
    }
}
