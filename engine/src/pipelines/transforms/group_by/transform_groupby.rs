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

use std::collections::HashMap;
use std::sync::Arc;

use common_base::runtime::parallel_map;
use common_base::runtime::pool_size;
use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;
use parking_lot::Mutex;
use tracing::debug;

use super::aggregator::Aggregator;
use super::aggregator::AggregatorState;
use super::group_key::GroupKey;
use crate::config::config;
use crate::pipelines::LazyFrame;
use crate::storages::frame::Frame;
use crate::storages::frame::FrameSegmentWriter;
use crate::storages::frame::FrameWriter;

/// One requested output: `output_name = aggregator(input_columns...)`.
#[derive(Clone)]
pub struct AggregationSpec {
    pub output_name: String,
    pub input_columns: Vec<String>,
    pub aggregator: Arc<dyn Aggregator>,
}

struct GroupbyPlan {
    /// Routed row layout: key columns first, then the distinct aggregator
    /// inputs not already among the keys.
    routed_names: Vec<String>,
    routed_tags: Vec<TypeId>,
    num_keys: usize,
    /// Per aggregation, the positions of its inputs in a routed row.
    input_positions: Vec<Vec<usize>>,
    output_names: Vec<String>,
    output_tags: Vec<TypeId>,
}

fn plan_groupby(frame: &Frame, keys: &[&str], aggs: &[AggregationSpec]) -> Result<GroupbyPlan> {
    let mut routed_names: Vec<String> = Vec::new();
    for (i, key) in keys.iter().enumerate() {
        if keys[..i].contains(key) {
            return Err(ErrorCode::DuplicateName(format!(
                "Key column \"{}\" appears twice",
                key
            )));
        }
        frame.column_by_name(key)?;
        routed_names.push((*key).to_string());
    }
    let num_keys = routed_names.len();

    let mut input_positions = Vec::with_capacity(aggs.len());
    let mut output_names: Vec<String> = keys.iter().map(|k| (*k).to_string()).collect();
    let mut output_tags: Vec<TypeId> = keys
        .iter()
        .map(|k| frame.column_by_name(k).map(|c| c.tag()))
        .collect::<Result<_>>()?;

    for agg in aggs {
        if output_names.contains(&agg.output_name) {
            return Err(ErrorCode::DuplicateName(format!(
                "Output column \"{}\" appears twice",
                agg.output_name
            )));
        }
        let mut positions = Vec::with_capacity(agg.input_columns.len());
        let mut input_tags = Vec::with_capacity(agg.input_columns.len());
        for input in &agg.input_columns {
            let column = frame.column_by_name(input)?;
            input_tags.push(column.tag());
            let position = match routed_names.iter().position(|n| n == input) {
                Some(position) => position,
                None => {
                    routed_names.push(input.clone());
                    routed_names.len() - 1
                }
            };
            positions.push(position);
        }
        agg.aggregator.check_inputs(&input_tags)?;
        output_names.push(agg.output_name.clone());
        output_tags.push(agg.aggregator.output_tag(&input_tags)?);
        input_positions.push(positions);
    }

    let routed_tags = routed_names
        .iter()
        .map(|n| frame.column_by_name(n).map(|c| c.tag()))
        .collect::<Result<_>>()?;
    Ok(GroupbyPlan {
        routed_names,
        routed_tags,
        num_keys,
        input_positions,
        output_names,
        output_tags,
    })
}

fn num_partitions() -> usize {
    let ncpu = pool_size();
    let factor = (usize::BITS - ncpu.leading_zeros()) as usize;
    16.max(ncpu * factor.max(1))
}

/// Hash-partitioned groupby-aggregate: one output row per distinct key
/// tuple, key columns first and outputs in declared order.
pub fn groupby_aggregate(
    frame: &Frame,
    keys: &[&str],
    aggs: &[AggregationSpec],
) -> Result<Frame> {
    let plan = plan_groupby(frame, keys, aggs)?;
    let num_partitions = num_partitions();
    let dop = pool_size();
    debug!(
        "groupby: {} partitions, dop {}, routed arity {}",
        num_partitions,
        dop,
        plan.routed_names.len()
    );

    // Shuffle pass: worker w owns segment w of every partition frame, so
    // no two workers share a write cursor.
    let routed_refs: Vec<&str> = plan.routed_names.iter().map(|s| s.as_str()).collect();
    let routed = LazyFrame::from_frame(frame.clone()).select_columns(&routed_refs)?;
    let rows = Arc::new(routed.parallel_iter(dop, None)?);

    let mut partition_writers = Vec::with_capacity(num_partitions);
    let mut writer_matrix: Vec<Vec<Mutex<Option<FrameSegmentWriter>>>> = Vec::new();
    for _ in 0..num_partitions {
        let mut writer = FrameWriter::create(&plan.routed_names, &plan.routed_tags, dop)?;
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

    let num_keys = plan.num_keys;
    let batch = config().read_batch_size;
    let per_worker = {
        let rows = rows.clone();
        let writer_matrix = writer_matrix.clone();
        parallel_map(dop, move |w| {
            let mut owned: Vec<FrameSegmentWriter> = writer_matrix
                .iter()
                .map(|segments| {
                    segments[w].lock().take().ok_or_else(|| {
                        ErrorCode::Internal("groupby shuffle slot taken twice".to_string())
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
                    let key = GroupKey::new(row[..num_keys].to_vec());
                    let partition = key.partition(num_partitions);
                    owned[partition].write_row(row)?;
                }
            }
            Ok(owned)
        })?
    };

    // Hand the segment writers back in [partition][worker] order.
    let mut by_partition: Vec<Vec<FrameSegmentWriter>> =
        (0..num_partitions).map(|_| Vec::with_capacity(dop)).collect();
    for worker_writers in per_worker {
        for (p, writer) in worker_writers.into_iter().enumerate() {
            by_partition[p].push(writer);
        }
    }
    let mut partitions = Vec::with_capacity(num_partitions);
    for (writer, segments) in partition_writers.into_iter().zip(by_partition) {
        partitions.push(writer.close(segments)?);
    }

    // Aggregate pass: each partition builds one map per shuffle segment,
    // finalizes the substream partials, and combines them in segment order.
    let mut output_writer =
        FrameWriter::create(&plan.output_names, &plan.output_tags, num_partitions)?;
    let output_segments: Arc<Vec<Mutex<Option<FrameSegmentWriter>>>> = Arc::new(
        output_writer
            .segment_writers()?
            .into_iter()
            .map(|w| Mutex::new(Some(w)))
            .collect(),
    );

    let aggs: Arc<Vec<AggregationSpec>> = Arc::new(aggs.to_vec());
    let plan = Arc::new(plan);
    let partitions = Arc::new(partitions);
    let finished = {
        let output_segments = output_segments.clone();
        parallel_map(num_partitions, move |p| {
            let mut writer = output_segments[p].lock().take().ok_or_else(|| {
                ErrorCode::Internal("groupby output slot taken twice".to_string())
            })?;
            let groups = aggregate_partition(&partitions[p], &plan, &aggs)?;
            for (key, mut states) in groups {
                let mut row = key.into_values();
                for state in states.iter_mut() {
                    row.push(state.emit());
                }
                writer.write_row(&row)?;
            }
            Ok(writer)
        })?
    };
    output_writer.close(finished)
}

type GroupMap = HashMap<GroupKey, Vec<Box<dyn AggregatorState>>>;

fn aggregate_partition(
    partition: &Frame,
    plan: &GroupbyPlan,
    aggs: &[AggregationSpec],
) -> Result<GroupMap> {
    let input_tags: Vec<Vec<TypeId>> = plan
        .input_positions
        .iter()
        .map(|positions| positions.iter().map(|i| plan.routed_tags[*i]).collect())
        .collect();

    // One map per shuffle segment, so substream boundaries are honest:
    // partial_finalize runs when its segment drains, combine after.
    let mut merged: Option<GroupMap> = None;
    let batch = config().read_batch_size;
    for segment in 0..partition.num_segments() {
        let mut map = GroupMap::new();
        let mut scanners = partition
            .columns()
            .iter()
            .map(|(_, c)| {
                let start = (0..segment)
                    .map(|s| c.segment_length(s))
                    .sum::<Result<usize>>()?;
                let len = c.segment_length(segment)?;
                c.reader().range_scanner(start, start + len)
            })
            .collect::<Result<Vec<_>>>()?;
        loop {
            common_base::cancel::check_cancelled()?;
            let mut columns: Vec<Vec<DataValue>> = Vec::with_capacity(scanners.len());
            let mut n = usize::MAX;
            for scanner in &mut scanners {
                let mut col = Vec::with_capacity(batch);
                scanner.read_into(batch, &mut col)?;
                n = n.min(col.len());
                columns.push(col);
            }
            if n == 0 {
                break;
            }
            for r in 0..n {
                let key = GroupKey::new(
                    (0..plan.num_keys).map(|c| columns[c][r].clone()).collect(),
                );
                let states = map.entry(key).or_insert_with(|| {
                    aggs.iter()
                        .zip(input_tags.iter())
                        .map(|(agg, tags)| agg.aggregator.new_state(tags))
                        .collect()
                });
                for (state, positions) in states.iter_mut().zip(plan.input_positions.iter()) {
                    let inputs: Vec<DataValue> =
                        positions.iter().map(|i| columns[*i][r].clone()).collect();
                    state.add_row(&inputs)?;
                }
            }
        }
        for states in map.values_mut() {
            for state in states.iter_mut() {
                state.partial_finalize();
            }
        }
        merged = Some(match merged {
            None => map,
            Some(mut base) => {
                for (key, states) in map {
                    match base.get_mut(&key) {
                        Some(existing) => {
                            for (mine, theirs) in existing.iter_mut().zip(states.iter()) {
                                mine.combine(theirs.as_ref())?;
                            }
                        }
                        None => {
                            base.insert(key, states);
                        }
                    }
                }
                base
            }
        });
    }
    Ok(merged.unwrap_or_default())
}
