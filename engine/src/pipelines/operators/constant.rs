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

use common_base::cancel;
use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::Result;

use super::operator::resolve_cursor_sizes;
use super::operator::Cursor;
use super::operator::LazyOperator;

/// Synthetic column repeating one value.
pub struct ConstantOp {
    value: DataValue,
    len: usize,
}

impl ConstantOp {
    pub fn new(value: DataValue, len: usize) -> Self {
        Self { value, len }
    }
}

impl LazyOperator<DataValue> for ConstantOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![self.value.data_type_id()]
    }

    fn has_size(&self) -> bool {
        true
    }

    fn try_len(&self) -> Result<usize> {
        Ok(self.len)
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        let sizes = resolve_cursor_sizes(self.len, dop, sizes)?;
        Ok(sizes
            .into_iter()
            .map(|len| {
                Box::new(ConstantCursor {
                    value: self.value.clone(),
                    remaining: len,
                }) as Box<dyn Cursor<DataValue>>
            })
            .collect())
    }
}

struct ConstantCursor {
    value: DataValue,
    remaining: usize,
}

impl Cursor<DataValue> for ConstantCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        cancel::check_cancelled()?;
        let n = k.min(self.remaining);
        for _ in 0..n {
            out.push(self.value.clone());
        }
        self.remaining -= n;
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        cancel::check_cancelled()?;
        let n = k.min(self.remaining);
        self.remaining -= n;
        Ok(n)
    }
}
