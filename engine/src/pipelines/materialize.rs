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

use common_base::runtime::parallel_map;
use common_datavalues::DataValue;
use common_exception::ErrorCode;
use common_exception::Result;
use parking_lot::Mutex;
use tracing::debug;

use super::operators::Backing;
use super::operators::Cursor;
use super::operators::Row;
use super::operators::RowOperatorRef;
use super::operators::ValueOperatorRef;
use crate::config::config;
use crate::storages::column::Column;
use crate::storages::column::ColumnSegmentWriter;
use crate::storages::column::ColumnWriter;
use crate::storages::frame::Frame;
use crate::storages::frame::FrameSegmentWriter;
use crate::storages::frame::FrameWriter;

/// Drains an operator into an on-disk column: cursor `i` fills segment `i`.
/// `num_segments` defaults to the worker-pool width; passing it fixes the
/// output layout, which also fixes the bytes for a given tree.
pub fn materialize_to_column(op: &ValueOperatorRef, num_segments: Option<usize>) -> Result<Column> {
    if let Some(Backing::Column(column)) = op.backing() {
        return Ok(column);
    }
    let num_segments = num_segments.unwrap_or_else(|| config().default_segments()).max(1);
    let tag = op.tags()[0];
    debug!("materializing a value stream into {} segments", num_segments);

    let mut writer = ColumnWriter::create(tag, num_segments)?;
    let segment_writers = writer.segment_writers()?;
    let cursors = op.cursors(num_segments, None)?;

    let slots: Arc<Vec<Mutex<Option<(Box<dyn Cursor<DataValue>>, ColumnSegmentWriter)>>>> =
        Arc::new(
            cursors
                .into_iter()
                .zip(segment_writers)
                .map(|pair| Mutex::new(Some(pair)))
                .collect(),
        );
    let batch = config().read_batch_size;
    let finished = parallel_map(num_segments, move |i| {
        let (mut cursor, mut segment_writer) = slots[i]
            .lock()
            .take()
            .ok_or_else(|| ErrorCode::Internal("materialize slot taken twice".to_string()))?;
        let mut buf = Vec::with_capacity(batch);
        loop {
            buf.clear();
            let n = cursor.read(batch, &mut buf)?;
            if n == 0 {
                break;
            }
            for value in &buf {
                segment_writer.push(value)?;
            }
        }
        Ok(segment_writer)
    })?;
    writer.close(finished)
}

/// Row-stream analog of [`materialize_to_column`].
pub fn materialize_to_frame(
    op: &RowOperatorRef,
    names: &[String],
    num_segments: Option<usize>,
) -> Result<Frame> {
    if let Some(Backing::Frame(frame)) = op.backing() {
        return Ok(frame);
    }
    let num_segments = num_segments.unwrap_or_else(|| config().default_segments()).max(1);
    debug!("materializing a row stream into {} segments", num_segments);

    let mut writer = FrameWriter::create(names, &op.tags(), num_segments)?;
    let segment_writers = writer.segment_writers()?;
    let cursors = op.cursors(num_segments, None)?;

    let slots: Arc<Vec<Mutex<Option<(Box<dyn Cursor<Row>>, FrameSegmentWriter)>>>> = Arc::new(
        cursors
            .into_iter()
            .zip(segment_writers)
            .map(|pair| Mutex::new(Some(pair)))
            .collect(),
    );
    let batch = config().read_batch_size;
    let finished = parallel_map(num_segments, move |i| {
        let (mut cursor, mut segment_writer) = slots[i]
            .lock()
            .take()
            .ok_or_else(|| ErrorCode::Internal("materialize slot taken twice".to_string()))?;
        let mut buf = Vec::with_capacity(batch);
        loop {
            buf.clear();
            let n = cursor.read(batch, &mut buf)?;
            if n == 0 {
                break;
            }
            for row in &buf {
                segment_writer.write_row(row)?;
            }
        }
        Ok(segment_writer)
    })?;
    writer.close(finished)
}
