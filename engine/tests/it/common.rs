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
use common_datavalues::TypeId;
use strata_engine::storages::column::Column;
use strata_engine::storages::column::ColumnWriter;
use strata_engine::storages::frame::Frame;

/// Builds a closed column with the values spread evenly over `nseg`
/// segments.
pub fn make_column(tag: TypeId, values: &[DataValue], nseg: usize) -> Column {
    let mut writer = ColumnWriter::create(tag, nseg).unwrap();
    let mut segments = writer.segment_writers().unwrap();
    let per = values.len().div_ceil(nseg).max(1);
    for (i, value) in values.iter().enumerate() {
        segments[(i / per).min(nseg - 1)].push(value).unwrap();
    }
    writer.close(segments).unwrap()
}

pub fn int_column(values: &[i64], nseg: usize) -> Column {
    let values: Vec<DataValue> = values.iter().map(|v| DataValue::Int64(*v)).collect();
    make_column(TypeId::Int64, &values, nseg)
}

pub fn string_column(values: &[&str], nseg: usize) -> Column {
    let values: Vec<DataValue> = values
        .iter()
        .map(|v| DataValue::String(v.to_string()))
        .collect();
    make_column(TypeId::String, &values, nseg)
}

pub fn make_frame(columns: Vec<(&str, Column)>) -> Frame {
    Frame::new(
        columns
            .into_iter()
            .map(|(n, c)| (n.to_string(), c))
            .collect(),
    )
    .unwrap()
}

pub fn ints(values: &[i64]) -> Vec<DataValue> {
    values.iter().map(|v| DataValue::Int64(*v)).collect()
}
