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
use super::operator::Backing;
use super::operator::Cursor;
use super::operator::LazyOperator;
use super::operator::Row;
use crate::storages::column::Column;
use crate::storages::column::RangeScanner;
use crate::storages::frame::Frame;

/// Leaf over an on-disk column. Each cursor is a range scan over the
/// flattened segments.
pub struct SourceColumnOp {
    column: Column,
}

impl SourceColumnOp {
    pub fn new(column: Column) -> Self {
        Self { column }
    }
}

impl LazyOperator<DataValue> for SourceColumnOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![self.column.tag()]
    }

    fn has_size(&self) -> bool {
        true
    }

    fn try_len(&self) -> Result<usize> {
        Ok(self.column.len())
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        let sizes = resolve_cursor_sizes(self.column.len(), dop, sizes)?;
        let starts = cursor_starts(&sizes);
        let reader = self.column.reader();
        sizes
            .iter()
            .zip(starts)
            .map(|(len, start)| {
                let scanner = reader.range_scanner(start, start + len)?;
                Ok(Box::new(ColumnRangeCursor { scanner }) as Box<dyn Cursor<DataValue>>)
            })
            .collect()
    }

    fn backing(&self) -> Option<Backing> {
        Some(Backing::Column(self.column.clone()))
    }
}

struct ColumnRangeCursor {
    scanner: RangeScanner,
}

impl Cursor<DataValue> for ColumnRangeCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        cancel::check_cancelled()?;
        self.scanner.read_into(k, out)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        cancel::check_cancelled()?;
        self.scanner.skip(k)
    }
}

/// Leaf over an on-disk frame: one range scan per column, zipped into rows.
pub struct SourceFrameOp {
    frame: Frame,
}

impl SourceFrameOp {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }
}

impl LazyOperator<Row> for SourceFrameOp {
    fn tags(&self) -> Vec<TypeId> {
        self.frame.tags()
    }

    fn has_size(&self) -> bool {
        true
    }

    fn try_len(&self) -> Result<usize> {
        Ok(self.frame.len())
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<Row>>>> {
        let sizes = resolve_cursor_sizes(self.frame.len(), dop, sizes)?;
        let starts = cursor_starts(&sizes);
        sizes
            .iter()
            .zip(starts)
            .map(|(len, start)| {
                let scanners = self
                    .frame
                    .columns()
                    .iter()
                    .map(|(_, c)| c.reader().range_scanner(start, start + len))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(FrameRangeCursor { scanners }) as Box<dyn Cursor<Row>>)
            })
            .collect()
    }

    fn backing(&self) -> Option<Backing> {
        Some(Backing::Frame(self.frame.clone()))
    }
}

struct FrameRangeCursor {
    scanners: Vec<RangeScanner>,
}

impl Cursor<Row> for FrameRangeCursor {
    fn read(&mut self, k: usize, out: &mut Vec<Row>) -> Result<usize> {
        cancel::check_cancelled()?;
        let mut column_batches = Vec::with_capacity(self.scanners.len());
        let mut n = usize::MAX;
        for scanner in &mut self.scanners {
            let mut batch = Vec::new();
            scanner.read_into(k, &mut batch)?;
            n = n.min(batch.len());
            column_batches.push(batch);
        }
        if self.scanners.is_empty() {
            return Ok(0);
        }
        for r in 0..n {
            out.push(
                column_batches
                    .iter_mut()
                    .map(|b| std::mem::take(&mut b[r]))
                    .collect(),
            );
        }
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        cancel::check_cancelled()?;
        let mut n = usize::MAX;
        for scanner in &mut self.scanners {
            n = n.min(scanner.skip(k)?);
        }
        if self.scanners.is_empty() { Ok(0) } else { Ok(n) }
    }
}
