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
use common_datavalues::FlexDateTime;
use common_datavalues::TypeId;
use common_exception::Result;
use strata_engine::storages::column::Column;
use strata_engine::storages::column::ColumnWriter;

use crate::common::int_column;
use crate::common::make_column;

#[test]
fn test_column_segment_lengths_sum_to_len() -> Result<()> {
    let column = int_column(&(0..103).collect::<Vec<i64>>(), 4);
    assert_eq!(column.len(), 103);
    let total: usize = (0..column.num_segments())
        .map(|i| column.segment_length(i).unwrap())
        .sum();
    assert_eq!(total, column.len());
    Ok(())
}

#[test]
fn test_column_read_range_across_segments() -> Result<()> {
    let column = int_column(&(0..100).collect::<Vec<i64>>(), 7);
    let mut out = Vec::new();
    column.reader().read_range(13, 59, &mut out)?;
    let expected: Vec<DataValue> = (13..59).map(DataValue::Int64).collect();
    assert_eq!(out, expected);
    Ok(())
}

#[test]
fn test_column_read_range_out_of_bounds() {
    let column = int_column(&[1, 2, 3], 1);
    let mut out = Vec::new();
    assert!(column.reader().read_range(0, 4, &mut out).is_err());
}

#[test]
fn test_column_variable_width_roundtrip() -> Result<()> {
    let values = vec![
        DataValue::String("alpha".to_string()),
        DataValue::Undefined,
        DataValue::String("".to_string()),
        DataValue::String("beta".to_string()),
    ];
    let column = make_column(TypeId::String, &values, 2);
    assert_eq!(column.to_values()?, values);
    Ok(())
}

#[test]
fn test_column_mixed_container_roundtrip() -> Result<()> {
    let values = vec![
        DataValue::List(vec![DataValue::Int64(1), DataValue::String("a".to_string())]),
        DataValue::Undefined,
        DataValue::List(vec![]),
    ];
    let column = make_column(TypeId::List, &values, 1);
    assert_eq!(column.to_values()?, values);

    let dates = vec![
        DataValue::DateTime(FlexDateTime::new(1_600_000_000, 120)),
        DataValue::DateTime(FlexDateTime::from_epoch(0)),
    ];
    let column = make_column(TypeId::DateTime, &dates, 1);
    assert_eq!(column.to_values()?, dates);
    Ok(())
}

#[test]
fn test_column_undefined_in_fixed_width_segments() -> Result<()> {
    let values = vec![
        DataValue::Int64(5),
        DataValue::Undefined,
        DataValue::Int64(-7),
    ];
    let column = make_column(TypeId::Int64, &values, 2);
    assert_eq!(column.to_values()?, values);
    Ok(())
}

#[test]
fn test_column_writer_converts_to_declared_tag() -> Result<()> {
    let values = vec![DataValue::Int64(1), DataValue::Int64(2)];
    let column = make_column(TypeId::Float64, &values, 1);
    assert_eq!(
        column.to_values()?,
        vec![DataValue::Float64(1.0), DataValue::Float64(2.0)]
    );
    Ok(())
}

#[test]
fn test_column_writer_rejects_unconvertible_value() {
    let mut writer = ColumnWriter::create(TypeId::Int64, 1).unwrap();
    let mut segments = writer.segment_writers().unwrap();
    let err = segments[0]
        .push(&DataValue::Dict(vec![]))
        .unwrap_err();
    assert_eq!(err.name(), "TypeMismatch");
}

#[test]
fn test_column_writers_taken_once() {
    let mut writer = ColumnWriter::create(TypeId::Int64, 2).unwrap();
    let _segments = writer.segment_writers().unwrap();
    let err = writer.segment_writers().unwrap_err();
    assert_eq!(err.name(), "InvalidState");
}

#[test]
fn test_column_load_from_index_file() -> Result<()> {
    let column = int_column(&[9, 8, 7, 6], 2);
    let loaded = Column::load(column.index_path())?;
    assert_eq!(loaded.tag(), TypeId::Int64);
    assert_eq!(loaded.to_values()?, column.to_values()?);
    Ok(())
}

#[test]
fn test_column_concurrent_readers() -> Result<()> {
    let column = int_column(&(0..1000).collect::<Vec<i64>>(), 3);
    let mut a = Vec::new();
    let mut b = Vec::new();
    let reader1 = column.reader();
    let reader2 = column.reader();
    reader1.read_range(0, 500, &mut a)?;
    reader2.read_range(500, 1000, &mut b)?;
    a.extend(b);
    assert_eq!(a, (0..1000).map(DataValue::Int64).collect::<Vec<_>>());
    Ok(())
}
