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

use std::hash::Hasher;

use common_base::cancel;
use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::Result;
use twox_hash::XxHash64;

use super::operator::cursor_starts;
use super::operator::resolve_cursor_sizes;
use super::operator::Cursor;
use super::operator::LazyOperator;

/// Deterministic Bernoulli 0/1 mask: the draw at row `i` depends only on
/// `(seed, i)`, so any cursor split reproduces the same stream. Used for
/// sampling.
pub struct RandomOp {
    prob: f64,
    seed: u64,
    len: usize,
}

impl RandomOp {
    pub fn new(prob: f64, seed: u64, len: usize) -> Self {
        Self {
            prob: prob.clamp(0.0, 1.0),
            seed,
            len,
        }
    }
}

pub(crate) fn bernoulli_draw(seed: u64, index: u64, prob: f64) -> bool {
    let mut hasher = XxHash64::with_seed(seed);
    hasher.write_u64(index);
    let unit = (hasher.finish() >> 11) as f64 / (1u64 << 53) as f64;
    unit < prob
}

impl LazyOperator<DataValue> for RandomOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![TypeId::Int64]
    }

    fn has_size(&self) -> bool {
        true
    }

    fn try_len(&self) -> Result<usize> {
        Ok(self.len)
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        let sizes = resolve_cursor_sizes(self.len, dop, sizes)?;
        let starts = cursor_starts(&sizes);
        Ok(sizes
            .iter()
            .zip(starts)
            .map(|(len, start)| {
                Box::new(RandomCursor {
                    prob: self.prob,
                    seed: self.seed,
                    next: start as u64,
                    remaining: *len,
                }) as Box<dyn Cursor<DataValue>>
            })
            .collect())
    }
}

struct RandomCursor {
    prob: f64,
    seed: u64,
    next: u64,
    remaining: usize,
}

impl Cursor<DataValue> for RandomCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        cancel::check_cancelled()?;
        let n = k.min(self.remaining);
        for i in 0..n as u64 {
            let hit = bernoulli_draw(self.seed, self.next + i, self.prob);
            out.push(DataValue::Int64(i64::from(hit)));
        }
        self.next += n as u64;
        self.remaining -= n;
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        cancel::check_cancelled()?;
        let n = k.min(self.remaining);
        self.next += n as u64;
        self.remaining -= n;
        Ok(n)
    }
}
