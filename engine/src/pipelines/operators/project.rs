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
use common_exception::Result;

use super::operator::Cursor;
use super::operator::LazyOperator;
use super::operator::Row;
use crate::pipelines::LazyFrame;

/// Column projection over a row stream, by position.
pub struct ProjectOp {
    child: LazyFrame,
    indices: Vec<usize>,
}

impl ProjectOp {
    pub fn new(child: LazyFrame, indices: Vec<usize>) -> Self {
        Self { child, indices }
    }
}

impl LazyOperator<Row> for ProjectOp {
    fn tags(&self) -> Vec<TypeId> {
        let tags = self.child.tags();
        self.indices.iter().map(|i| tags[*i]).collect()
    }

    fn has_size(&self) -> bool {
        self.child.op().has_size()
    }

    fn try_len(&self) -> Result<usize> {
        self.child.op().try_len()
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<Row>>>> {
        Ok(self
            .child
            .op()
            .cursors(dop, sizes)?
            .into_iter()
            .map(|inner| {
                Box::new(ProjectCursor {
                    inner,
                    indices: self.indices.clone(),
                }) as Box<dyn Cursor<Row>>
            })
            .collect())
    }
}

struct ProjectCursor {
    inner: Box<dyn Cursor<Row>>,
    indices: Vec<usize>,
}

impl Cursor<Row> for ProjectCursor {
    fn read(&mut self, k: usize, out: &mut Vec<Row>) -> Result<usize> {
        let mut batch = Vec::with_capacity(k.min(65536));
        let n = self.inner.read(k, &mut batch)?;
        for mut row in batch {
            out.push(
                self.indices
                    .iter()
                    .map(|i| std::mem::take(&mut row[*i]))
                    .collect(),
            );
        }
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        self.inner.skip(k)
    }
}
