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
use common_exception::Result;

use super::operator::Cursor;
use super::operator::LazyOperator;
use super::operator::TransformFn;
use crate::pipelines::LazyColumn;

/// Row-wise function over a value stream; length and parallelism are
/// inherited from the child unchanged.
pub struct TransformOp {
    child: LazyColumn,
    f: TransformFn,
    out_tag: TypeId,
}

impl TransformOp {
    pub fn new(child: LazyColumn, f: TransformFn, out_tag: TypeId) -> Self {
        Self { child, f, out_tag }
    }
}

impl LazyOperator<DataValue> for TransformOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![self.out_tag]
    }

    fn has_size(&self) -> bool {
        self.child.op().has_size()
    }

    fn try_len(&self) -> Result<usize> {
        self.child.op().try_len()
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        Ok(self
            .child
            .op()
            .cursors(dop, sizes)?
            .into_iter()
            .map(|inner| {
                Box::new(TransformCursor {
                    inner,
                    f: self.f.clone(),
                }) as Box<dyn Cursor<DataValue>>
            })
            .collect())
    }
}

struct TransformCursor {
    inner: Box<dyn Cursor<DataValue>>,
    f: TransformFn,
}

impl Cursor<DataValue> for TransformCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        let mut batch = Vec::with_capacity(k.min(65536));
        let n = self.inner.read(k, &mut batch)?;
        for v in &batch {
            out.push((self.f)(v)?);
        }
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        self.inner.skip(k)
    }
}
