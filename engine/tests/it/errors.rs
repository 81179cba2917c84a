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

use common_exception::ErrorCode;
use common_exception::WireError;

#[test]
fn test_error_wire_roundtrip() {
    let err = ErrorCode::SchemaMismatch("row arity 3, schema arity 2".to_string());
    let wire = err.to_wire();
    assert_eq!(wire.code, err.code());
    assert_eq!(wire.name, "SchemaMismatch");
    assert!(wire.body.is_none());

    let json = serde_json::to_string(&wire).unwrap();
    let decoded: WireError = serde_json::from_str(&json).unwrap();
    let back = ErrorCode::from(decoded);
    assert_eq!(back.code(), err.code());
    assert_eq!(back.name(), "SchemaMismatch");
    assert!(back.message().contains("row arity 3"));
}

#[test]
fn test_cancelled_is_never_silent() {
    let err = ErrorCode::Cancelled("operation cancelled".to_string());
    assert_eq!(err.to_wire().name, "Cancelled");
}
