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

use std::sync::Arc;

use common_base::cancel;
use common_base::runtime::parallel_map;
use common_base::runtime::pool_size;
use common_datavalues::DataValue;
use common_exception::ErrorCode;
use common_exception::Result;
use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

use super::comparator::compare_rows;
use super::comparator::SortKey;
use crate::config::config;
use crate::pipelines::LazyFrame;
use crate::storages::frame::Frame;
use crate::storages::frame::FrameSegmentWriter;
use crate::storages::frame::FrameWriter;

/// Rows sampled from the input prefix to estimate the key distribution.
const SORT_SAMPLE_SIZE: usize = 20_000;

/// External sort: range-partition on sampled splitters, sort each
/// partition in memory, concatenate the partitions lazily in order.
pub fn sort_frame(frame: &Frame, keys: &[SortKey]) -> Result<LazyFrame> {
    if keys.is_empty() {
        return Err(ErrorCode::InvalidArgument(
            "Sort needs at least one key".to_string(),
        ));
    }
    let mut key_indices = Vec::with_capacity(keys.len());
    let mut ascending = Vec::with_capacity(keys.len());
    for key in keys {
        key_indices.push(frame.column_index(&key.column)?);
        ascending.push(key.ascending);
    }

    let total = frame.len();
    if total == 0 {
        return Ok(LazyFrame::from_frame(frame.clone()));
    }

    let dop = pool_size();
    let num_partitions = dop.max(1);
    let splitters = sample_splitters(frame, &key_indices, &ascending, num_partitions)?;
    debug!(
        "sort: {} rows over {} range partitions",
        total, num_partitions
    );

    let partitions = shuffle_to_partitions(
        frame,
        &key_indices,
        &ascending,
        &splitters,
        num_partitions,
        dop,
    )?;

    // Sort pass: one partition resident per worker at a time; its memory is
    // dropped before the next partition is claimed.
    let names: Vec<String> = frame.column_names().iter().map(|s| s.to_string()).collect();
    let tags = frame.tags();
    let key_indices = Arc::new(key_indices);
    let ascending = Arc::new(ascending);
    let partitions = Arc::new(partitions);
    let sorted = {
        let names = names.clone();
        let key_indices = key_indices.clone();
        let ascending = ascending.clone();
        parallel_map(num_partitions, move |p| {
            sort_one_partition(&partitions[p], &names, &tags, &key_indices, &ascending)
        })?
    };

    let mut result: Option<LazyFrame> = None;
    for frame in sorted {
        let next = LazyFrame::from_frame(frame);
        result = Some(match result {
            None => next,
            Some(acc) => acc.append(&next)?,
        });
    }
    result.ok_or_else(|| ErrorCode::Internal("sort produced no partitions".to_string()))
}

/// Key tuples of the first rows, sorted, thinned to `B - 1` splitters.
fn sample_splitters(
    frame: &Frame,
    key_indices: &[usize],
    ascending: &[bool],
    num_partitions: usize,
) -> Result<Vec<Vec<DataValue>>> {
    let sample_len = frame.len().min(SORT_SAMPLE_SIZE);
    let mut key_columns = Vec::with_capacity(key_indices.len());
    for index in key_indices {
        let column = frame.column(*index)?;
        let mut values = Vec::with_capacity(sample_len);
        column.reader().read_range(0, sample_len, &mut values)?;
        key_columns.push(values);
    }
    let mut samples: Vec<Vec<DataValue>> = (0..sample_len)
        .map(|r| key_columns.iter_mut().map(|c| std::mem::take(&mut c[r])).collect())
        .collect();
    samples.sort_by(|a, b| compare_rows(a, b, ascending));

    let mut splitters = Vec::with_capacity(num_partitions.saturating_sub(1));
    for i in 1..num_partitions {
        if samples.is_empty() {
            break;
        }
        let position = (i * samples.len() / num_partitions).min(samples.len() - 1);
        splitters.push(samples[position].clone());
    }
    Ok(splitters)
}

fn shuffle_to_partitions(
    frame: &Frame,
    key_indices: &[usize],
    ascending: &[bool],
    splitters: &[Vec<DataValue>],
    num_partitions: usize,
    dop: usize,
) -> Result<Vec<Frame>> {
    let names: Vec<String> = frame.column_names().iter().map(|s| s.to_string()).collect();
    let tags = frame.tags();

    let mut partition_writers = Vec::with_capacity(num_partitions);
    let mut writer_matrix: Vec<Vec<Mutex<Option<FrameSegmentWriter>>>> = Vec::new();
    for _ in 0..num_partitions {
        let mut writer = FrameWriter::create(&names, &tags, dop)?;
        writer_matrix.push(
            writer
                .segment_writers()?
                .into_iter()
                .map(|w| Mutex::new(Some(w)))
                .collect(),
        );
        partition_writers.push(writer);
    }
    let writer_matrix = Arc::new(writer_matrix);

    let rows = Arc::new(LazyFrame::from_frame(frame.clone()).parallel_iter(dop, None)?);
    let key_indices = key_indices.to_vec();
    let ascending = ascending.to_vec();
    let splitters = splitters.to_vec();
    let batch = config().read_batch_size;
    let per_worker = {
        let writer_matrix = writer_matrix.clone();
        parallel_map(dop, move |w| {
            let mut owned: Vec<FrameSegmentWriter> = writer_matrix
                .iter()
                .map(|segments| {
                    segments[w].lock().take().ok_or_else(|| {
                        ErrorCode::Internal("sort shuffle slot taken twice".to_string())
                    })
                })
                .collect::<Result<_>>()?;
            let mut buf = Vec::with_capacity(batch);
            loop {
                buf.clear();
                let n = rows.read(w, batch, &mut buf)?;
                if n == 0 {
                    break;
                }
                for row in &buf {
                    let key: Vec<DataValue> =
                        key_indices.iter().map(|i| row[*i].clone()).collect();
                    let partition = splitters
                        .partition_point(|s| compare_rows(s, &key, &ascending).is_le());
                    owned[partition].write_row(row)?;
                }
            }
            Ok(owned)
        })?
    };

    let mut by_partition: Vec<Vec<FrameSegmentWriter>> =
        (0..num_partitions).map(|_| Vec::with_capacity(dop)).collect();
    for worker_writers in per_worker {
        for (p, writer) in worker_writers.into_iter().enumerate() {
            by_partition[p].push(writer);
        }
    }
    partition_writers
        .into_iter()
        .zip(by_partition)
        .map(|(writer, segments)| writer.close(segments))
        .collect()
}

fn sort_one_partition(
    partition: &Frame,
    names: &[String],
    tags: &[common_datavalues::TypeId],
    key_indices: &[usize],
    ascending: &[bool],
) -> Result<Frame> {
    cancel::check_cancelled()?;
    let mut rows = partition.to_rows()?;

    let rough_bytes = rows.len() * names.len() * 24;
    if rough_bytes > config().sort_buffer_size {
        warn!(
            "sort partition of {} rows exceeds the configured buffer, sorting in memory anyway",
            rows.len()
        );
    }

    rows.sort_by(|a, b| {
        for (i, asc) in key_indices.iter().zip(ascending.iter()) {
            let ord = a[*i].total_cmp(&b[*i]);
            let ord = if *asc { ord } else { ord.reverse() };
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });

    let mut writer = FrameWriter::create(names, tags, 1)?;
    let mut segments = writer.segment_writers()?;
    for row in &rows {
        segments[0].write_row(row)?;
    }
    writer.close(segments)
}
