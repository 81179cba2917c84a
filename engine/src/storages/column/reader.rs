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
use common_exception::ErrorCode;
use common_exception::Result;

use super::column::Column;
use super::segment::SegmentScanner;

/// A read handle over a closed column. Many readers may coexist; each is
/// independent. Row location costs one binary search over the prefix-summed
/// segment table.
pub struct ColumnReader {
    column: Column,
}

impl ColumnReader {
    pub(crate) fn new(column: Column) -> ColumnReader {
        ColumnReader { column }
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    /// Fills `out` with rows `[start, end)`.
    pub fn read_range(&self, start: usize, end: usize, out: &mut Vec<DataValue>) -> Result<()> {
        if start > end || end > self.column.len() {
            return Err(ErrorCode::OutOfRange(format!(
                "Range [{}, {}) of a column of length {}",
                start,
                end,
                self.column.len()
            )));
        }
        let mut scanner = self.range_scanner(start, end)?;
        scanner.read_into(end - start, out)?;
        Ok(())
    }

    /// An iterator-style scanner over one segment.
    pub fn segment_iter(&self, segment: usize) -> Result<SegmentScanner> {
        let inner = self.column.inner();
        let length = self.column.segment_length(segment)? as u64;
        SegmentScanner::open(&inner.segment_paths[segment], inner.tag, length)
    }

    /// A sequential scanner over the global row range `[start, end)`,
    /// crossing segment boundaries as needed.
    pub fn range_scanner(&self, start: usize, end: usize) -> Result<RangeScanner> {
        if start > end || end > self.column.len() {
            return Err(ErrorCode::OutOfRange(format!(
                "Range [{}, {}) of a column of length {}",
                start,
                end,
                self.column.len()
            )));
        }
        Ok(RangeScanner {
            column: self.column.clone(),
            next_pos: start as u64,
            end: end as u64,
            scanner: None,
        })
    }
}

/// Sequential cursor over a global row range of a column. This is the leaf
/// the parallel iterator builds its per-cursor state from.
pub struct RangeScanner {
    column: Column,
    next_pos: u64,
    end: u64,
    scanner: Option<SegmentScanner>,
}

impl RangeScanner {
    pub fn remaining(&self) -> usize {
        (self.end - self.next_pos) as usize
    }

    fn ensure_scanner(&mut self) -> Result<&mut SegmentScanner> {
        if self
            .scanner
            .as_ref()
            .map(|s| s.remaining() == 0)
            .unwrap_or(true)
        {
            let inner = self.column.inner();
            let segment = inner.offsets.partition_point(|&off| off <= self.next_pos) - 1;
            let local = self.next_pos - inner.offsets[segment];
            let mut scanner = SegmentScanner::open(
                &inner.segment_paths[segment],
                inner.tag,
                inner.segment_lengths[segment],
            )?;
            scanner.skip(local as usize)?;
            self.scanner = Some(scanner);
        }
        Ok(self.scanner.as_mut().unwrap())
    }

    /// Appends up to `k` rows to `out`, stopping at the range end. Returns
    /// the number appended; zero only at the end of the range.
    pub fn read_into(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        let mut wanted = k.min(self.remaining());
        let mut total = 0;
        while wanted > 0 {
            let scanner = self.ensure_scanner()?;
            let n = scanner.read_into(wanted, out)?;
            self.next_pos += n as u64;
            total += n;
            wanted -= n;
        }
        Ok(total)
    }

    /// Same contract as `read_into`, discarding the rows.
    pub fn skip(&mut self, k: usize) -> Result<usize> {
        let mut wanted = k.min(self.remaining());
        let mut total = 0;
        while wanted > 0 {
            let scanner = self.ensure_scanner()?;
            let n = scanner.skip(wanted)?;
            self.next_pos += n as u64;
            total += n;
            wanted -= n;
        }
        Ok(total)
    }
}
