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

use common_datavalues::prelude::*;

#[test]
fn test_parse_numeric_cells() {
    assert_eq!(
        parse_cell("42", TypeId::Int64).unwrap(),
        DataValue::Int64(42)
    );
    assert_eq!(
        parse_cell(" -1.25 ", TypeId::Float64).unwrap(),
        DataValue::Float64(-1.25)
    );
    assert!(parse_cell("x", TypeId::Int64).is_err());
}

#[test]
fn test_parse_empty_cell_is_undefined() {
    assert!(parse_cell("", TypeId::Int64).unwrap().is_undefined());
    assert_eq!(
        parse_cell("", TypeId::String).unwrap(),
        DataValue::String(String::new())
    );
}

#[test]
fn test_parse_vector_cell() {
    assert_eq!(
        parse_cell("[1 1 1]", TypeId::Vector).unwrap(),
        DataValue::Vector(vec![1.0, 1.0, 1.0])
    );
    assert_eq!(
        parse_cell("[1,2.5,3]", TypeId::Vector).unwrap(),
        DataValue::Vector(vec![1.0, 2.5, 3.0])
    );
    assert!(parse_cell("[1 a]", TypeId::Vector).is_err());
}

#[test]
fn test_parse_list_cell() {
    assert_eq!(
        parse_cell("[a,a]", TypeId::List).unwrap(),
        DataValue::List(vec![
            DataValue::String("a".to_string()),
            DataValue::String("a".to_string()),
        ])
    );
    assert_eq!(
        parse_cell("[1,x]", TypeId::List).unwrap(),
        DataValue::List(vec![
            DataValue::Int64(1),
            DataValue::String("x".to_string()),
        ])
    );
}

#[test]
fn test_parse_dict_cell() {
    assert_eq!(
        parse_cell("{1:1,\"a\":\"a\"}", TypeId::Dict).unwrap(),
        DataValue::Dict(vec![
            (DataValue::Int64(1), DataValue::Int64(1)),
            (
                DataValue::String("a".to_string()),
                DataValue::String("a".to_string())
            ),
        ])
    );
    assert!(parse_cell("{oops}", TypeId::Dict).is_err());
}

#[test]
fn test_parse_datetime_cell() {
    let epoch = parse_cell("1600000000", TypeId::DateTime).unwrap();
    assert_eq!(
        epoch,
        DataValue::DateTime(FlexDateTime::from_epoch(1_600_000_000))
    );
    let iso = parse_cell("2020-09-13T12:26:40+00:00", TypeId::DateTime).unwrap();
    assert_eq!(iso, epoch);
}
