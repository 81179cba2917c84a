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

use common_datavalues::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_numeric_equality_crosses_tags() {
    assert_eq!(DataValue::Int64(1), DataValue::Float64(1.0));
    assert_ne!(DataValue::Int64(1), DataValue::Float64(1.5));
    assert_eq!(DataValue::Undefined, DataValue::Undefined);
    assert_ne!(DataValue::Undefined, DataValue::Int64(0));
}

#[test]
fn test_datetime_compares_by_seconds_only() {
    let utc = DataValue::DateTime(FlexDateTime::new(1000, 0));
    let shifted = DataValue::DateTime(FlexDateTime::new(1000, 300));
    assert_eq!(utc, shifted);
    let later = DataValue::DateTime(FlexDateTime::new(1001, 0));
    assert_eq!(utc.total_cmp(&later), Ordering::Less);
}

#[test]
fn test_total_order_ranks_undefined_lowest() {
    let values = vec![
        DataValue::String("a".to_string()),
        DataValue::Undefined,
        DataValue::Int64(5),
        DataValue::Float64(2.5),
    ];
    let mut sorted = values;
    sorted.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(sorted[0], DataValue::Undefined);
    assert_eq!(sorted[1], DataValue::Float64(2.5));
    assert_eq!(sorted[2], DataValue::Int64(5));
    assert_eq!(sorted[3], DataValue::String("a".to_string()));
}

#[test]
fn test_relational_with_undefined_is_none() {
    let result = DataValue::Undefined.rel_cmp(&DataValue::Int64(1)).unwrap();
    assert!(result.is_none());
    let result = DataValue::Int64(1).rel_cmp(&DataValue::Int64(2)).unwrap();
    assert_eq!(result, Some(Ordering::Less));
    assert!(DataValue::Int64(1)
        .rel_cmp(&DataValue::String("x".to_string()))
        .is_err());
}

#[test]
fn test_arithmetic_with_undefined_is_undefined() {
    let sum = DataValue::Undefined.add(&DataValue::Int64(1)).unwrap();
    assert!(sum.is_undefined());
    let product = DataValue::Float64(2.0).mul(&DataValue::Undefined).unwrap();
    assert!(product.is_undefined());
}

#[test]
fn test_arithmetic_promotions() {
    let int_sum = DataValue::Int64(2).add(&DataValue::Int64(3)).unwrap();
    assert_eq!(int_sum, DataValue::Int64(5));
    let mixed = DataValue::Int64(2).add(&DataValue::Float64(0.5)).unwrap();
    assert_eq!(mixed, DataValue::Float64(2.5));
    let div = DataValue::Int64(1).div(&DataValue::Int64(2)).unwrap();
    assert_eq!(div, DataValue::Float64(0.5));
    let concat = DataValue::String("ab".to_string())
        .add(&DataValue::String("cd".to_string()))
        .unwrap();
    assert_eq!(concat, DataValue::String("abcd".to_string()));
}

#[test]
fn test_vector_arithmetic() {
    let a = DataValue::Vector(vec![1.0, 2.0]);
    let b = DataValue::Vector(vec![10.0, 20.0]);
    assert_eq!(a.add(&b).unwrap(), DataValue::Vector(vec![11.0, 22.0]));
    let broadcast = a.mul(&DataValue::Int64(3)).unwrap();
    assert_eq!(broadcast, DataValue::Vector(vec![3.0, 6.0]));
    let skew = DataValue::Vector(vec![1.0]).add(&b).unwrap_err();
    assert_eq!(skew.name(), "LengthMismatch");
}

#[test]
fn test_convertibility_lattice() {
    assert!(DataValue::is_convertible(TypeId::Int64, TypeId::Float64));
    assert!(DataValue::is_convertible(TypeId::Float64, TypeId::DateTime));
    assert!(DataValue::is_convertible(TypeId::Dict, TypeId::String));
    assert!(DataValue::is_convertible(TypeId::Undefined, TypeId::Vector));
    assert!(!DataValue::is_convertible(TypeId::String, TypeId::Int64));
    assert!(!DataValue::is_convertible(TypeId::Dict, TypeId::List));
}

#[test]
fn test_convert_between_vector_and_list() {
    let vector = DataValue::Vector(vec![1.0, 2.0]);
    let as_list = vector.convert_to(TypeId::List).unwrap();
    assert_eq!(
        as_list,
        DataValue::List(vec![DataValue::Float64(1.0), DataValue::Float64(2.0)])
    );
    let back = as_list.convert_to(TypeId::Vector).unwrap();
    assert_eq!(back, vector);

    let mixed = DataValue::List(vec![DataValue::String("x".to_string())]);
    assert!(mixed.convert_to(TypeId::Vector).is_err());
}

#[test]
fn test_convert_undefined_stays_undefined() {
    let converted = DataValue::Undefined.convert_to(TypeId::String).unwrap();
    assert!(converted.is_undefined());
}

#[test]
fn test_truthiness_for_masks() {
    assert!(!DataValue::Int64(0).is_true());
    assert!(DataValue::Int64(-1).is_true());
    assert!(!DataValue::Float64(0.0).is_true());
    assert!(!DataValue::String(String::new()).is_true());
    assert!(DataValue::String("0".to_string()).is_true());
    assert!(!DataValue::Vector(vec![]).is_true());
    assert!(!DataValue::Undefined.is_true());
    assert!(DataValue::DateTime(FlexDateTime::from_epoch(0)).is_true());
}
