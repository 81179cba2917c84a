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

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::Result;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use strata_engine::pipelines::transforms::group_by::groupby_aggregate;
use strata_engine::pipelines::transforms::group_by::AggregationSpec;
use strata_engine::pipelines::transforms::group_by::Aggregator;
use strata_engine::pipelines::transforms::group_by::AggregatorState;
use strata_engine::pipelines::transforms::group_by::ArgMax;
use strata_engine::pipelines::transforms::group_by::Avg;
use strata_engine::pipelines::transforms::group_by::Count;
use strata_engine::pipelines::transforms::group_by::Max;
use strata_engine::pipelines::transforms::group_by::Min;
use strata_engine::pipelines::transforms::group_by::Quantile;
use strata_engine::pipelines::transforms::group_by::SelectOne;
use strata_engine::pipelines::transforms::group_by::Sum;
use strata_engine::pipelines::transforms::group_by::Var;
use strata_engine::pipelines::transforms::group_by::VectorSum;
use strata_engine::pipelines::transforms::group_by::ZipDict;
use strata_engine::pipelines::transforms::group_by::ZipList;
use strata_engine::storages::frame::Frame;

use crate::common::int_column;
use crate::common::make_column;
use crate::common::make_frame;
use crate::common::string_column;

fn agg(name: &str, inputs: &[&str], aggregator: Arc<dyn strata_engine::pipelines::transforms::group_by::Aggregator>) -> AggregationSpec {
    AggregationSpec {
        output_name: name.to_string(),
        input_columns: inputs.iter().map(|s| s.to_string()).collect(),
        aggregator,
    }
}

/// Rows keyed by 100 distinct strings, with scalar and vector payloads.
fn sample_frame(rows: usize, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut key = Vec::with_capacity(rows);
    let mut int1 = Vec::with_capacity(rows);
    let mut int2 = Vec::with_capacity(rows);
    let mut float1 = Vec::with_capacity(rows);
    let mut vec1 = Vec::with_capacity(rows);
    for _ in 0..rows {
        key.push(DataValue::String(format!("k{:03}", rng.gen_range(0..100))));
        int1.push(DataValue::Int64(rng.gen_range(-100..100)));
        int2.push(DataValue::Int64(rng.gen_range(0..10)));
        float1.push(DataValue::Float64(rng.gen_range(-1.0..1.0)));
        vec1.push(DataValue::Vector(vec![
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
        ]));
    }
    make_frame(vec![
        ("key", make_column(TypeId::String, &key, 4)),
        ("int1", make_column(TypeId::Int64, &int1, 4)),
        ("int2", make_column(TypeId::Int64, &int2, 4)),
        ("float1", make_column(TypeId::Float64, &float1, 4)),
        ("vec1", make_column(TypeId::Vector, &vec1, 4)),
    ])
}

#[test]
fn test_groupby_sum_vs_vector_sum() -> Result<()> {
    let rows = 20_000;
    let frame = sample_frame(rows, 5);
    let out = groupby_aggregate(&frame, &["key"], &[
        agg("int_sum", &["int1"], Arc::new(Sum)),
        agg("float_sum", &["float1"], Arc::new(Sum)),
        agg("int2_sum", &["int2"], Arc::new(Sum)),
        agg("int2_sum_again", &["int2"], Arc::new(Sum)),
        agg("vec_sum", &["vec1"], Arc::new(VectorSum)),
    ])?;
    assert_eq!(out.len(), 100);
    assert_eq!(
        out.column_names(),
        vec!["key", "int_sum", "float_sum", "int2_sum", "int2_sum_again", "vec_sum"]
    );

    // reference aggregation, single-threaded
    let mut expected: HashMap<String, (i64, f64, i64, Vec<f64>)> = HashMap::new();
    for row in frame.to_rows()? {
        let key = row[0].as_string()?.to_string();
        let entry = expected.entry(key).or_insert((0, 0.0, 0, vec![0.0; 3]));
        entry.0 += row[1].as_i64()?;
        entry.1 += row[3].as_f64()?;
        entry.2 += row[2].as_i64()?;
        for (acc, v) in entry.3.iter_mut().zip(row[4].as_vector()?) {
            *acc += v;
        }
    }
    assert_eq!(expected.len(), 100);

    for row in out.to_rows()? {
        let key = row[0].as_string()?;
        let (int_sum, float_sum, int2_sum, vec_sum) = &expected[key];
        assert_eq!(row[1], DataValue::Int64(*int_sum));
        assert!((row[2].as_f64()? - float_sum).abs() < 1e-6);
        assert_eq!(row[3], DataValue::Int64(*int2_sum));
        assert_eq!(row[4], DataValue::Int64(*int2_sum));
        let got = row[5].as_vector()?;
        for (g, e) in got.iter().zip(vec_sum.iter()) {
            assert!((g - e).abs() < 1e-6);
        }
    }
    Ok(())
}

#[test]
fn test_groupby_count_sums_to_input_rows() -> Result<()> {
    let frame = sample_frame(5000, 11);
    let out = groupby_aggregate(&frame, &["key"], &[agg("n", &[], Arc::new(Count))])?;
    let total: i64 = out
        .to_rows()?
        .iter()
        .map(|r| r[1].as_i64().unwrap())
        .sum();
    assert_eq!(total, 5000);
    Ok(())
}

#[test]
fn test_groupby_min_max_avg_var() -> Result<()> {
    let frame = make_frame(vec![
        ("k", string_column(&["a", "a", "a", "b", "b"], 2)),
        ("v", int_column(&[1, 5, 3, 10, 20], 2)),
    ]);
    let out = groupby_aggregate(&frame, &["k"], &[
        agg("lo", &["v"], Arc::new(Min)),
        agg("hi", &["v"], Arc::new(Max)),
        agg("mean", &["v"], Arc::new(Avg)),
        agg("var", &["v"], Arc::new(Var)),
    ])?;
    let mut rows = out.to_rows()?;
    rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
    assert_eq!(rows[0][1], DataValue::Int64(1));
    assert_eq!(rows[0][2], DataValue::Int64(5));
    assert!((rows[0][3].as_f64()? - 3.0).abs() < 1e-9);
    // population variance of {1, 5, 3}
    assert!((rows[0][4].as_f64()? - 8.0 / 3.0).abs() < 1e-9);
    assert_eq!(rows[1][1], DataValue::Int64(10));
    assert_eq!(rows[1][2], DataValue::Int64(20));
    assert!((rows[1][3].as_f64()? - 15.0).abs() < 1e-9);
    assert!((rows[1][4].as_f64()? - 25.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_groupby_undefined_handling() -> Result<()> {
    let frame = make_frame(vec![
        ("k", string_column(&["a", "a", "b"], 1)),
        (
            "v",
            make_column(
                TypeId::Int64,
                &[DataValue::Int64(7), DataValue::Undefined, DataValue::Undefined],
                1,
            ),
        ),
    ]);
    let out = groupby_aggregate(&frame, &["k"], &[
        agg("lo", &["v"], Arc::new(Min)),
        agg("n", &[], Arc::new(Count)),
    ])?;
    let mut rows = out.to_rows()?;
    rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
    // Undefined is skipped by min but counted by count
    assert_eq!(rows[0][1], DataValue::Int64(7));
    assert_eq!(rows[0][2], DataValue::Int64(2));
    // a group with only Undefined emits Undefined
    assert_eq!(rows[1][1], DataValue::Undefined);
    assert_eq!(rows[1][2], DataValue::Int64(1));
    Ok(())
}

#[test]
fn test_groupby_argmax_first_seen_tiebreak() -> Result<()> {
    let frame = make_frame(vec![
        ("k", string_column(&["g", "g", "g"], 1)),
        ("score", int_column(&[5, 9, 9], 1)),
        ("witness", string_column(&["first", "second", "third"], 1)),
    ]);
    let out = groupby_aggregate(&frame, &["k"], &[agg(
        "best",
        &["score", "witness"],
        Arc::new(ArgMax),
    )])?;
    let rows = out.to_rows()?;
    assert_eq!(rows[0][1], DataValue::String("second".to_string()));
    Ok(())
}

#[test]
fn test_groupby_zip_list_and_dict() -> Result<()> {
    let frame = make_frame(vec![
        ("k", string_column(&["a", "a", "b"], 1)),
        ("name", string_column(&["x", "y", "z"], 1)),
        ("score", int_column(&[1, 2, 3], 1)),
    ]);
    let out = groupby_aggregate(&frame, &["k"], &[
        agg("names", &["name"], Arc::new(ZipList)),
        agg("pairs", &["name", "score"], Arc::new(ZipDict)),
    ])?;
    assert_eq!(out.tags()[1], TypeId::List);
    assert_eq!(out.tags()[2], TypeId::Dict);
    let mut rows = out.to_rows()?;
    rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
    match &rows[0][1] {
        DataValue::List(items) => {
            assert_eq!(items.len(), 2);
        }
        other => panic!("expected a list, got {:?}", other),
    }
    match &rows[0][2] {
        DataValue::Dict(entries) => {
            assert_eq!(entries.len(), 2);
        }
        other => panic!("expected a dict, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_groupby_zip_list_of_floats_is_vector() -> Result<()> {
    let frame = make_frame(vec![
        ("k", string_column(&["a", "a"], 1)),
        (
            "v",
            make_column(
                TypeId::Float64,
                &[DataValue::Float64(1.5), DataValue::Float64(2.5)],
                1,
            ),
        ),
    ]);
    let out = groupby_aggregate(&frame, &["k"], &[agg("vs", &["v"], Arc::new(ZipList))])?;
    assert_eq!(out.tags()[1], TypeId::Vector);
    Ok(())
}

#[test]
fn test_groupby_select_one_returns_a_group_member() -> Result<()> {
    let frame = make_frame(vec![
        ("k", string_column(&["a", "a", "b"], 1)),
        ("v", int_column(&[1, 2, 30], 1)),
    ]);
    let out = groupby_aggregate(&frame, &["k"], &[agg("one", &["v"], Arc::new(SelectOne))])?;
    let mut rows = out.to_rows()?;
    rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
    let a_value = rows[0][1].as_i64()?;
    assert!(a_value == 1 || a_value == 2);
    assert_eq!(rows[1][1], DataValue::Int64(30));
    Ok(())
}

#[test]
fn test_groupby_quantile_median() -> Result<()> {
    let values: Vec<DataValue> = (1..=1001).map(|v| DataValue::Int64(v)).collect();
    let keys: Vec<DataValue> = (0..1001)
        .map(|_| DataValue::String("g".to_string()))
        .collect();
    let frame = make_frame(vec![
        ("k", make_column(TypeId::String, &keys, 3)),
        ("v", make_column(TypeId::Int64, &values, 3)),
    ]);
    let out = groupby_aggregate(&frame, &["k"], &[agg(
        "q",
        &["v"],
        Arc::new(Quantile::new(vec![0.0, 0.5, 1.0])),
    )])?;
    let rows = out.to_rows()?;
    let q = rows[0][1].as_vector()?;
    assert_eq!(q.len(), 3);
    assert_eq!(q[0], 1.0);
    assert!((q[1] - 501.0).abs() <= 5.0);
    assert_eq!(q[2], 1001.0);
    Ok(())
}

#[test]
fn test_aggregator_partial_state_moves_between_workers() -> Result<()> {
    let sum = Sum;
    let mut partial = sum.new_state(&[TypeId::Int64]);
    partial.add_row(&[DataValue::Int64(5)])?;
    partial.add_row(&[DataValue::Int64(7)])?;
    partial.partial_finalize();

    let mut bytes = Vec::new();
    partial.save(&mut bytes)?;
    let mut shipped = sum.new_state(&[TypeId::Int64]);
    shipped.load(&mut bytes.as_slice())?;

    let mut receiver = sum.new_state(&[TypeId::Int64]);
    receiver.add_row(&[DataValue::Int64(1)])?;
    receiver.combine(shipped.as_ref())?;
    assert_eq!(receiver.emit(), DataValue::Int64(13));

    // partials are value-semantics
    let mut cloned = receiver.clone();
    assert_eq!(cloned.emit(), DataValue::Int64(13));
    Ok(())
}

#[test]
fn test_groupby_type_mismatch_rejected() {
    let frame = make_frame(vec![
        ("k", string_column(&["a"], 1)),
        ("s", string_column(&["x"], 1)),
    ]);
    let err = groupby_aggregate(&frame, &["k"], &[agg("bad", &["s"], Arc::new(Sum))])
        .unwrap_err();
    assert_eq!(err.name(), "TypeMismatch");
}

#[test]
fn test_groupby_duplicate_output_rejected() {
    let frame = make_frame(vec![
        ("k", string_column(&["a"], 1)),
        ("v", int_column(&[1], 1)),
    ]);
    let err = groupby_aggregate(&frame, &["k"], &[
        agg("x", &["v"], Arc::new(Sum)),
        agg("x", &["v"], Arc::new(Min)),
    ])
    .unwrap_err();
    assert_eq!(err.name(), "DuplicateName");
}

#[test]
fn test_groupby_vector_sum_length_mismatch_is_undefined() -> Result<()> {
    let frame = make_frame(vec![
        ("k", string_column(&["a", "a"], 1)),
        (
            "v",
            make_column(
                TypeId::Vector,
                &[
                    DataValue::Vector(vec![1.0, 2.0]),
                    DataValue::Vector(vec![1.0, 2.0, 3.0]),
                ],
                1,
            ),
        ),
    ]);
    let out = groupby_aggregate(&frame, &["k"], &[agg("s", &["v"], Arc::new(VectorSum))])?;
    assert_eq!(out.to_rows()?[0][1], DataValue::Undefined);
    Ok(())
}
