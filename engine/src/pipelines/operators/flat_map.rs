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

use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use super::operator::Cursor;
use super::operator::FlatMapFn;
use super::operator::LazyOperator;
use super::operator::Row;
use crate::config::config;
use crate::pipelines::LazyFrame;

/// One input row emits zero or more output rows of a fixed schema; the
/// output size is unknowable up front.
pub struct FlatMapOp {
    child: LazyFrame,
    f: FlatMapFn,
    out_tags: Vec<TypeId>,
}

impl FlatMapOp {
    pub fn new(child: LazyFrame, f: FlatMapFn, out_tags: Vec<TypeId>) -> Self {
        Self { child, f, out_tags }
    }
}

impl LazyOperator<Row> for FlatMapOp {
    fn tags(&self) -> Vec<TypeId> {
        self.out_tags.clone()
    }

    fn has_size(&self) -> bool {
        false
    }

    fn is_volatile(&self) -> bool {
        true
    }

    fn try_len(&self) -> Result<usize> {
        Err(ErrorCode::SizeUnknown(
            "A flat-mapped stream has no size before materialization".to_string(),
        ))
    }

    fn cursors(&self, dop: usize, _sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<Row>>>> {
        let arity = self.out_tags.len();
        Ok(self
            .child
            .op()
            .cursors(dop, None)?
            .into_iter()
            .map(|inner| {
                Box::new(FlatMapCursor {
                    inner,
                    f: self.f.clone(),
                    arity,
                    carry: Vec::new(),
                }) as Box<dyn Cursor<Row>>
            })
            .collect())
    }
}

struct FlatMapCursor {
    inner: Box<dyn Cursor<Row>>,
    f: FlatMapFn,
    arity: usize,
    carry: Vec<Row>,
}

impl Cursor<Row> for FlatMapCursor {
    fn read(&mut self, k: usize, out: &mut Vec<Row>) -> Result<usize> {
        let batch = config().read_batch_size;
        while self.carry.len() < k {
            let mut rows = Vec::with_capacity(batch);
            let n = self.inner.read(batch, &mut rows)?;
            if n == 0 {
                break;
            }
            for row in &rows {
                for emitted in (self.f)(row)? {
                    if emitted.len() != self.arity {
                        return Err(ErrorCode::SchemaMismatch(format!(
                            "Flat map emitted a row of arity {}, schema has {}",
                            emitted.len(),
                            self.arity
                        )));
                    }
                    self.carry.push(emitted);
                }
            }
        }
        let n = k.min(self.carry.len());
        out.extend(self.carry.drain(..n));
        Ok(n)
    }
}
