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

use std::cmp::Ordering;

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::Result;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use strata_engine::pipelines::transforms::sort::sort_frame;
use strata_engine::pipelines::transforms::sort::SortKey;

use crate::common::int_column;
use crate::common::make_column;
use crate::common::make_frame;

fn random_test_frame(rows: usize, seed: u64) -> strata_engine::storages::frame::Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut a = Vec::with_capacity(rows);
    let mut b = Vec::with_capacity(rows);
    let mut c = Vec::with_capacity(rows);
    for _ in 0..rows {
        a.push(if rng.gen_ratio(1, 100) {
            DataValue::Undefined
        } else {
            DataValue::Int64(rng.gen_range(0..50))
        });
        b.push(if rng.gen_ratio(1, 100) {
            DataValue::Undefined
        } else {
            DataValue::Float64(rng.gen_range(0.0..100.0))
        });
        c.push(if rng.gen_ratio(1, 100) {
            DataValue::Undefined
        } else {
            DataValue::String(format!("s{}", rng.gen_range(0..1000)))
        });
    }
    make_frame(vec![
        ("a", make_column(TypeId::Int64, &a, 4)),
        ("b", make_column(TypeId::Float64, &b, 4)),
        ("c", make_column(TypeId::String, &c, 4)),
    ])
}

#[test]
fn test_sort_two_keys_mixed_directions() -> Result<()> {
    let frame = random_test_frame(5000, 17);
    let sorted = sort_frame(&frame, &[SortKey::asc("a"), SortKey::desc("b")])?;
    let rows = sorted.materialize()?.to_rows()?;
    assert_eq!(rows.len(), 5000);

    for pair in rows.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        // Undefined ranks lowest, so ascending puts it first...
        let a_ord = prev[0].total_cmp(&next[0]);
        assert_ne!(a_ord, Ordering::Greater, "a out of order");
        if a_ord == Ordering::Equal {
            // ...and descending puts it last
            let b_ord = prev[1].total_cmp(&next[1]);
            assert_ne!(b_ord, Ordering::Less, "b out of order within an a-group");
        }
    }
    Ok(())
}

#[test]
fn test_sort_single_key_ascending_nulls_first() -> Result<()> {
    let frame = make_frame(vec![(
        "v",
        make_column(
            TypeId::Int64,
            &[
                DataValue::Int64(3),
                DataValue::Undefined,
                DataValue::Int64(1),
                DataValue::Int64(2),
            ],
            2,
        ),
    )]);
    let sorted = sort_frame(&frame, &[SortKey::asc("v")])?;
    let values: Vec<DataValue> = sorted
        .materialize()?
        .to_rows()?
        .into_iter()
        .map(|mut r| r.remove(0))
        .collect();
    assert_eq!(
        values,
        vec![
            DataValue::Undefined,
            DataValue::Int64(1),
            DataValue::Int64(2),
            DataValue::Int64(3),
        ]
    );
    Ok(())
}

#[test]
fn test_sort_single_key_descending_nulls_last() -> Result<()> {
    let frame = make_frame(vec![(
        "v",
        make_column(
            TypeId::Int64,
            &[
                DataValue::Int64(3),
                DataValue::Undefined,
                DataValue::Int64(1),
            ],
            1,
        ),
    )]);
    let sorted = sort_frame(&frame, &[SortKey::desc("v")])?;
    let values: Vec<DataValue> = sorted
        .materialize()?
        .to_rows()?
        .into_iter()
        .map(|mut r| r.remove(0))
        .collect();
    assert_eq!(
        values,
        vec![
            DataValue::Int64(3),
            DataValue::Int64(1),
            DataValue::Undefined,
        ]
    );
    Ok(())
}

#[test]
fn test_sort_preserves_row_integrity() -> Result<()> {
    let frame = make_frame(vec![
        ("k", int_column(&[3, 1, 2], 1)),
        ("v", int_column(&[30, 10, 20], 1)),
    ]);
    let sorted = sort_frame(&frame, &[SortKey::asc("k")])?;
    let rows = sorted.materialize()?.to_rows()?;
    assert_eq!(rows, vec![
        vec![DataValue::Int64(1), DataValue::Int64(10)],
        vec![DataValue::Int64(2), DataValue::Int64(20)],
        vec![DataValue::Int64(3), DataValue::Int64(30)],
    ]);
    Ok(())
}

#[test]
fn test_sort_empty_frame() -> Result<()> {
    let frame = make_frame(vec![("v", int_column(&[], 1))]);
    let sorted = sort_frame(&frame, &[SortKey::asc("v")])?;
    assert_eq!(sorted.len()?, 0);
    Ok(())
}

#[test]
fn test_sort_unknown_key_rejected() {
    let frame = make_frame(vec![("v", int_column(&[1], 1))]);
    let err = sort_frame(&frame, &[SortKey::asc("nope")]).unwrap_err();
    assert_eq!(err.name(), "NotFound");
}
