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

use super::operator::cursor_starts;
use super::operator::resolve_cursor_sizes;
use super::operator::Cursor;
use super::operator::LazyOperator;

/// Synthetic integer column `start..end`, optionally reversed.
pub struct RangeOp {
    start: i64,
    end: i64,
    reverse: bool,
}

impl RangeOp {
    pub fn new(start: i64, end: i64, reverse: bool) -> Self {
        Self {
            start,
            end: end.max(start),
            reverse,
        }
    }
}

impl LazyOperator<DataValue> for RangeOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![TypeId::Int64]
    }

    fn has_size(&self) -> bool {
        true
    }

    fn try_len(&self) -> Result<usize> {
        Ok((self.end - self.start) as usize)
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        let sizes = resolve_cursor_sizes(self.try_len()?, dop, sizes)?;
        let starts = cursor_starts(&sizes);
        Ok(sizes
            .iter()
            .zip(starts)
            .map(|(len, start)| {
                Box::new(RangeCursor {
                    start: self.start,
                    end: self.end,
                    reverse: self.reverse,
                    next: start,
                    remaining: *len,
                }) as Box<dyn Cursor<DataValue>>
            })
            .collect())
    }
}

struct RangeCursor {
    start: i64,
    end: i64,
    reverse: bool,
    /// Next global index into the range.
    next: usize,
    remaining: usize,
}

impl Cursor<DataValue> for RangeCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        cancel::check_cancelled()?;
        let n = k.min(self.remaining);
        for i in self.next..self.next + n {
            let v = if self.reverse {
                self.end - 1 - i as i64
            } else {
                self.start + i as i64
            };
            out.push(DataValue::Int64(v));
        }
        self.next += n;
        self.remaining -= n;
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        cancel::check_cancelled()?;
        let n = k.min(self.remaining);
        self.next += n;
        self.remaining -= n;
        Ok(n)
    }
}
