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

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::Result;
use strata_engine::pipelines::operators::BinaryOpKind;
use strata_engine::pipelines::operators::ScalarSide;
use strata_engine::pipelines::LazyColumn;
use strata_engine::pipelines::LazyFrame;

use crate::common::int_column;
use crate::common::ints;
use crate::common::make_frame;

#[test]
fn test_range_operator() -> Result<()> {
    let column = LazyColumn::range(5, 10, false);
    assert_eq!(column.to_values()?, ints(&[5, 6, 7, 8, 9]));
    let reversed = LazyColumn::range(5, 10, true);
    assert_eq!(reversed.to_values()?, ints(&[9, 8, 7, 6, 5]));
    Ok(())
}

#[test]
fn test_constant_operator() -> Result<()> {
    let column = LazyColumn::constant(DataValue::String("x".to_string()), 3);
    assert_eq!(column.tag(), TypeId::String);
    assert_eq!(column.len()?, 3);
    Ok(())
}

#[test]
fn test_random_operator_deterministic() -> Result<()> {
    let a = LazyColumn::random(0.5, 42, 1000).to_values()?;
    let b = LazyColumn::random(0.5, 42, 1000).to_values()?;
    assert_eq!(a, b);
    let hits = a.iter().filter(|v| v.is_true()).count();
    assert!(hits > 300 && hits < 700);
    Ok(())
}

#[test]
fn test_transform_preserves_position() -> Result<()> {
    let source = LazyColumn::from_column(int_column(&(0..50).collect::<Vec<i64>>(), 4));
    let doubled = source.transform(
        Arc::new(|v: &DataValue| v.mul(&DataValue::Int64(2))),
        TypeId::Int64,
    );
    let values = doubled.to_values()?;
    for (i, v) in values.iter().enumerate() {
        assert_eq!(*v, DataValue::Int64(2 * i as i64));
    }
    Ok(())
}

#[test]
fn test_vector_operator_rejects_length_mismatch() {
    let a = LazyColumn::range(0, 5, false);
    let b = LazyColumn::range(0, 6, false);
    let err = a
        .binary_op(
            &b,
            Arc::new(|l: &DataValue, r: &DataValue| l.add(r)),
            TypeId::Int64,
        )
        .unwrap_err();
    assert_eq!(err.name(), "LengthMismatch");
}

#[test]
fn test_scalar_binop_comparison_mask() -> Result<()> {
    let source = LazyColumn::from_column(int_column(&[1, 5, 3, 8, 2], 2));
    let mask = source.scalar_binop(DataValue::Int64(3), BinaryOpKind::Gte, ScalarSide::Right);
    assert_eq!(mask.to_values()?, ints(&[0, 1, 1, 1, 0]));
    Ok(())
}

#[test]
fn test_scalar_binop_undefined_propagates() -> Result<()> {
    let source = LazyColumn::from_column(crate::common::make_column(
        TypeId::Int64,
        &[DataValue::Int64(1), DataValue::Undefined],
        1,
    ));
    let shifted = source.scalar_binop(DataValue::Int64(10), BinaryOpKind::Add, ScalarSide::Right);
    assert_eq!(
        shifted.to_values()?,
        vec![DataValue::Int64(11), DataValue::Undefined]
    );
    let compared = source.scalar_binop(DataValue::Int64(0), BinaryOpKind::Lt, ScalarSide::Left);
    assert_eq!(
        compared.to_values()?,
        vec![DataValue::Int64(1), DataValue::Undefined]
    );
    Ok(())
}

#[test]
fn test_logical_filter_keeps_masked_rows() -> Result<()> {
    let values = LazyColumn::from_column(int_column(&[1, 2, 3, 4, 5, 6], 2));
    let mask = LazyColumn::from_column(int_column(&[1, 0, 1, 0, 1, 0], 3));
    let filtered = values.logical_filter(&mask)?;
    assert!(filtered.try_len().is_err());
    assert_eq!(filtered.to_values()?, ints(&[1, 3, 5]));
    Ok(())
}

#[test]
fn test_filter_size_unknown_then_len_materializes() -> Result<()> {
    let values = LazyColumn::range(0, 100, false);
    let filtered = values.lambda_filter(Arc::new(|v: &DataValue| Ok(v.as_i64()? % 3 == 0)));
    let err = filtered.try_len().unwrap_err();
    assert_eq!(err.name(), "SizeUnknown");
    assert_eq!(filtered.len()?, 34);
    Ok(())
}

#[test]
fn test_copy_range_strided() -> Result<()> {
    let source = LazyColumn::from_column(int_column(&(0..10).collect::<Vec<i64>>(), 3));
    let copied = source.copy_range(1, 2, 5)?;
    assert_eq!(copied.to_values()?, ints(&[1, 3]));
    Ok(())
}

#[test]
fn test_copy_range_zero_step_rejected() {
    let source = LazyColumn::range(0, 10, false);
    let err = source.copy_range(0, 0, 10).unwrap_err();
    assert_eq!(err.name(), "InvalidArgument");
}

#[test]
fn test_append_is_length_preserving() -> Result<()> {
    let a = LazyColumn::range(0, 20, false);
    let b = LazyColumn::range(0, 10, false);
    let c = a.append(&b)?;
    assert_eq!(c.len()?, 30);
    let mut expected = ints(&(0..20).collect::<Vec<i64>>());
    expected.extend(ints(&(0..10).collect::<Vec<i64>>()));
    assert_eq!(c.head(30)?.to_values()?, expected);
    Ok(())
}

#[test]
fn test_append_materialization_idempotent() -> Result<()> {
    let a = LazyColumn::range(0, 20, false);
    let b = LazyColumn::range(0, 10, false);
    let c = a.append(&b)?;

    let first = c.materialize_with_segments(Some(4))?;
    let second = c.materialize_with_segments(Some(4))?;
    // the second call reuses the cached backing column
    assert_eq!(first.index_path(), second.index_path());

    // a fresh identical tree produces byte-identical segment files
    let again = LazyColumn::range(0, 20, false)
        .append(&LazyColumn::range(0, 10, false))?
        .materialize_with_segments(Some(4))?;
    assert_eq!(first.num_segments(), again.num_segments());
    for segment in 0..first.num_segments() {
        assert_eq!(first.segment_length(segment)?, again.segment_length(segment)?);
    }
    let bytes = |column: &strata_engine::storages::column::Column| -> Vec<Vec<u8>> {
        column
            .files()
            .into_iter()
            .skip(1)
            .map(|p| std::fs::read(p).unwrap())
            .collect()
    };
    assert_eq!(bytes(&first), bytes(&again));
    Ok(())
}

#[test]
fn test_append_tag_mismatch_rejected() {
    let a = LazyColumn::range(0, 5, false);
    let b = LazyColumn::constant(DataValue::String("x".to_string()), 5);
    let err = a.append(&b).unwrap_err();
    assert_eq!(err.name(), "SchemaMismatch");
}

#[test]
fn test_lazy_frame_zip_and_project() -> Result<()> {
    let frame = LazyFrame::zip(vec![
        ("a".to_string(), LazyColumn::range(0, 5, false)),
        ("b".to_string(), LazyColumn::range(10, 15, false)),
        ("c".to_string(), LazyColumn::range(20, 25, false)),
    ])?;
    let projected = frame.select_columns(&["c", "a"])?;
    let materialized = projected.materialize()?;
    assert_eq!(materialized.column_names(), vec!["c", "a"]);
    assert_eq!(
        materialized.to_rows()?[0],
        vec![DataValue::Int64(20), DataValue::Int64(0)]
    );
    Ok(())
}

#[test]
fn test_flat_map_expands_rows() -> Result<()> {
    let frame = LazyFrame::zip(vec![(
        "n".to_string(),
        LazyColumn::range(0, 4, false),
    )])?;
    let expanded = frame.flat_map(
        Arc::new(|row: &Vec<DataValue>| {
            let n = row[0].as_i64()?;
            Ok((0..n).map(|i| vec![DataValue::Int64(i)]).collect())
        }),
        vec!["i".to_string()],
        vec![TypeId::Int64],
    )?;
    assert!(expanded.try_len().is_err());
    // 0 + 1 + 2 + 3 emitted rows
    assert_eq!(expanded.len()?, 6);
    Ok(())
}

#[test]
fn test_frame_head_tail() -> Result<()> {
    let frame = make_frame(vec![("a", int_column(&(0..10).collect::<Vec<i64>>(), 3))]);
    let head = frame.head(3)?;
    assert_eq!(head.to_rows()?.len(), 3);
    let tail = frame.tail(4)?;
    let rows = tail.to_rows()?;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], vec![DataValue::Int64(6)]);
    Ok(())
}

#[test]
fn test_sample_is_deterministic() -> Result<()> {
    let source = LazyColumn::range(0, 1000, false);
    let a = source.sample(0.25, 7)?.to_values()?;
    let b = LazyColumn::range(0, 1000, false).sample(0.25, 7)?.to_values()?;
    assert_eq!(a, b);
    assert!(!a.is_empty() && a.len() < 1000);
    Ok(())
}
