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
use super::operator::Row;
use crate::pipelines::LazyColumn;

/// Turns k equally long value streams into one row stream.
pub struct ZipColumnsOp {
    columns: Vec<LazyColumn>,
}

impl ZipColumnsOp {
    pub fn try_create(columns: Vec<LazyColumn>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ErrorCode::InvalidArgument(
                "Zip needs at least one column".to_string(),
            ));
        }
        let len = columns[0].len()?;
        for column in &columns[1..] {
            if column.len()? != len {
                return Err(ErrorCode::LengthMismatch(
                    "Zipped columns must be equally long".to_string(),
                ));
            }
        }
        Ok(Self { columns })
    }
}

impl LazyOperator<Row> for ZipColumnsOp {
    fn tags(&self) -> Vec<TypeId> {
        self.columns.iter().map(|c| c.tag()).collect()
    }

    fn has_size(&self) -> bool {
        self.columns.iter().all(|c| c.op().has_size())
    }

    fn try_len(&self) -> Result<usize> {
        self.columns[0].op().try_len()
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<Row>>>> {
        let mut per_column = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            per_column.push(column.op().cursors(dop, sizes)?);
        }
        let mut out: Vec<Box<dyn Cursor<Row>>> = Vec::with_capacity(dop);
        for _ in 0..dop {
            let parts: Vec<_> = per_column.iter_mut().map(|v| v.remove(0)).collect();
            out.push(Box::new(ZipCursor { parts }));
        }
        Ok(out)
    }
}

struct ZipCursor {
    parts: Vec<Box<dyn Cursor<DataValue>>>,
}

impl Cursor<Row> for ZipCursor {
    fn read(&mut self, k: usize, out: &mut Vec<Row>) -> Result<usize> {
        let mut batches = Vec::with_capacity(self.parts.len());
        let mut n = usize::MAX;
        for part in &mut self.parts {
            let mut batch = Vec::with_capacity(k.min(65536));
            part.read(k, &mut batch)?;
            n = n.min(batch.len());
            batches.push(batch);
        }
        for r in 0..n {
            out.push(
                batches
                    .iter_mut()
                    .map(|b| std::mem::take(&mut b[r]))
                    .collect(),
            );
        }
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        let mut n = usize::MAX;
        for part in &mut self.parts {
            n = n.min(part.skip(k)?);
        }
        Ok(n)
    }
}
