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

use common_exception::ErrorCode;
use common_exception::Result;
use parking_lot::Mutex;

use super::operators::Cursor;

/// The parallel face of an operator: `dop` independent cursors, sharable
/// across worker tasks. Reading cursor `i` never advances cursor `j`, and
/// the concatenation of cursors `0..dop` in order is the node's logical row
/// order.
pub struct ParallelRows<T> {
    cursors: Vec<Mutex<Box<dyn Cursor<T>>>>,
}

impl<T> std::fmt::Debug for ParallelRows<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelRows")
            .field("dop", &self.cursors.len())
            .finish()
    }
}

impl<T> ParallelRows<T> {
    pub(crate) fn new(cursors: Vec<Box<dyn Cursor<T>>>) -> Self {
        Self {
            cursors: cursors.into_iter().map(Mutex::new).collect(),
        }
    }

    pub fn dop(&self) -> usize {
        self.cursors.len()
    }

    fn cursor(&self, index: usize) -> Result<&Mutex<Box<dyn Cursor<T>>>> {
        self.cursors.get(index).ok_or_else(|| {
            ErrorCode::OutOfRange(format!(
                "Cursor {} of a parallel iterator with dop {}",
                index,
                self.dop()
            ))
        })
    }

    /// Appends up to `k` rows of cursor `index` to `out`; returns zero only
    /// at that cursor's end.
    pub fn read(&self, index: usize, k: usize, out: &mut Vec<T>) -> Result<usize> {
        self.cursor(index)?.lock().read(k, out)
    }

    /// `read`'s contract, discarding the rows.
    pub fn skip(&self, index: usize, k: usize) -> Result<usize> {
        self.cursor(index)?.lock().skip(k)
    }
}
