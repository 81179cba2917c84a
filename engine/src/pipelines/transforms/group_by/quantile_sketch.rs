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

use common_exception::Result;
use common_io::prelude::*;

/// A mergeable streaming quantile sketch: raw values buffer until
/// `substream_finalize`, which folds them into a weighted, rank-compressed
/// summary. Summaries merge associatively; queries interpolate on rank.
/// Error is bounded by the compression target size.
#[derive(Clone, Debug, Default)]
pub struct QuantileSketch {
    buffer: Vec<f64>,
    /// (value, weight) pairs sorted by value.
    summary: Vec<(f64, u64)>,
    count: u64,
}

/// Entries kept per compressed summary.
const SKETCH_TARGET_SIZE: usize = 2048;

impl QuantileSketch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.buffer.push(value);
        self.count += 1;
        if self.buffer.len() >= SKETCH_TARGET_SIZE * 4 {
            self.substream_finalize();
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Folds the raw buffer into the summary. Must run before `merge` or
    /// `query`; harmless to run twice.
    pub fn substream_finalize(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.sort_unstable_by(f64::total_cmp);
        let merged = merge_weighted(
            &self.summary,
            &buffer.iter().map(|v| (*v, 1u64)).collect::<Vec<_>>(),
        );
        self.summary = compress(merged);
    }

    /// Merges another finalized sketch into this one.
    pub fn merge(&mut self, other: &QuantileSketch) {
        let mut other = other.clone();
        other.substream_finalize();
        self.substream_finalize();
        self.summary = compress(merge_weighted(&self.summary, &other.summary));
        self.count += other.count;
    }

    /// The value at quantile `q` in [0, 1], by weighted-rank interpolation.
    /// `None` on an empty sketch.
    pub fn query(&mut self, q: f64) -> Option<f64> {
        self.substream_finalize();
        if self.summary.is_empty() {
            return None;
        }
        let total: u64 = self.summary.iter().map(|(_, w)| *w).sum();
        let target = (q.clamp(0.0, 1.0) * (total.saturating_sub(1)) as f64).round() as u64;
        let mut rank = 0u64;
        for (value, weight) in &self.summary {
            rank += weight;
            if rank > target {
                return Some(*value);
            }
        }
        self.summary.last().map(|(v, _)| *v)
    }

    pub fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut snapshot = self.clone();
        snapshot.substream_finalize();
        out.write_uvarint(snapshot.count)?;
        out.write_uvarint(snapshot.summary.len() as u64)?;
        for (value, weight) in &snapshot.summary {
            out.write_f64_value(*value)?;
            out.write_uvarint(*weight)?;
        }
        Ok(())
    }

    pub fn load(data: &mut &[u8]) -> Result<Self> {
        let count = data.read_uvarint()?;
        let len = data.read_uvarint()? as usize;
        let mut summary = Vec::with_capacity(len);
        for _ in 0..len {
            let value = data.read_f64_value()?;
            let weight = data.read_uvarint()?;
            summary.push((value, weight));
        }
        Ok(Self {
            buffer: Vec::new(),
            summary,
            count,
        })
    }
}

fn merge_weighted(a: &[(f64, u64)], b: &[(f64, u64)]) -> Vec<(f64, u64)> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].0 <= b[j].0 {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Rank-preserving downsample to the target size: weights of dropped
/// entries fold into the kept entry that follows them.
fn compress(entries: Vec<(f64, u64)>) -> Vec<(f64, u64)> {
    if entries.len() <= SKETCH_TARGET_SIZE {
        return entries;
    }
    let stride = entries.len().div_ceil(SKETCH_TARGET_SIZE);
    let mut out = Vec::with_capacity(SKETCH_TARGET_SIZE + 1);
    let mut pending = 0u64;
    for (index, (value, weight)) in entries.iter().enumerate() {
        pending += weight;
        if (index + 1) % stride == 0 || index + 1 == entries.len() {
            out.push((*value, pending));
            pending = 0;
        }
    }
    out
}
