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

fn roundtrip(value: &DataValue) -> DataValue {
    let mut buf = Vec::new();
    value.write_to(&mut buf).unwrap();
    DataValue::read_from(&mut buf.as_slice()).unwrap()
}

#[test]
fn test_scalar_roundtrips() {
    for value in [
        DataValue::Undefined,
        DataValue::Int64(0),
        DataValue::Int64(i64::MIN),
        DataValue::Int64(i64::MAX),
        DataValue::Float64(-0.0),
        DataValue::Float64(1.5e300),
        DataValue::String(String::new()),
        DataValue::String("snowman ☃".to_string()),
        DataValue::DateTime(FlexDateTime::new(-1, -480)),
    ] {
        assert_eq!(roundtrip(&value), value);
    }
}

#[test]
fn test_container_roundtrips() {
    let value = DataValue::Dict(vec![
        (
            DataValue::String("k".to_string()),
            DataValue::List(vec![
                DataValue::Int64(1),
                DataValue::Vector(vec![1.0, 2.0]),
                DataValue::Undefined,
            ]),
        ),
        (DataValue::Int64(9), DataValue::Float64(0.25)),
    ]);
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_image_roundtrip() {
    let value = DataValue::Image(FlexImage::new(vec![0, 1, 2, 255], 2, 2, 1));
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_framed_records_concatenate() {
    let values = vec![
        DataValue::Int64(7),
        DataValue::String("x".to_string()),
        DataValue::Undefined,
    ];
    let mut buf = Vec::new();
    for value in &values {
        value.write_to(&mut buf).unwrap();
    }
    let mut slice = buf.as_slice();
    for value in &values {
        assert_eq!(&DataValue::read_from(&mut slice).unwrap(), value);
    }
    assert!(slice.is_empty());
}

#[test]
fn test_corrupt_tag_byte_rejected() {
    let err = DataValue::read_from(&mut [99u8].as_slice()).unwrap_err();
    assert_eq!(err.name(), "Parse");
}
