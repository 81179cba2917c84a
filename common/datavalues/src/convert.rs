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
use common_exception::Result;

use crate::DataValue;
use crate::FlexDateTime;
use crate::TypeId;

impl DataValue {
    /// Whether a value of tag `from` may be softly assigned into a slot
    /// declared as `to`: identity, Int↔Float↔DateTime, anything→String,
    /// Vector↔List (List→Vector only when all elements are numeric), and
    /// Undefined into any slot.
    pub fn is_convertible(from: TypeId, to: TypeId) -> bool {
        if from == to || from == TypeId::Undefined || to == TypeId::String {
            return true;
        }
        matches!(
            (from, to),
            (TypeId::Int64, TypeId::Float64)
                | (TypeId::Float64, TypeId::Int64)
                | (TypeId::Int64, TypeId::DateTime)
                | (TypeId::Float64, TypeId::DateTime)
                | (TypeId::DateTime, TypeId::Int64)
                | (TypeId::DateTime, TypeId::Float64)
                | (TypeId::Vector, TypeId::List)
                | (TypeId::List, TypeId::Vector)
        )
    }

    /// Soft assignment: convert `self` to the declared tag, or fail with
    /// `TypeMismatch`. Undefined stays Undefined under every tag.
    pub fn convert_to(&self, to: TypeId) -> Result<DataValue> {
        if self.is_undefined() {
            return Ok(DataValue::Undefined);
        }
        let from = self.data_type_id();
        if from == to {
            return Ok(self.clone());
        }
        match (self, to) {
            (_, TypeId::String) => Ok(DataValue::String(self.to_string())),
            (DataValue::Int64(v), TypeId::Float64) => Ok(DataValue::Float64(*v as f64)),
            (DataValue::Float64(v), TypeId::Int64) => Ok(DataValue::Int64(*v as i64)),
            (DataValue::Int64(v), TypeId::DateTime) => {
                Ok(DataValue::DateTime(FlexDateTime::from_epoch(*v)))
            }
            (DataValue::Float64(v), TypeId::DateTime) => {
                Ok(DataValue::DateTime(FlexDateTime::from_epoch(*v as i64)))
            }
            (DataValue::DateTime(v), TypeId::Int64) => Ok(DataValue::Int64(v.epoch_sec)),
            (DataValue::DateTime(v), TypeId::Float64) => {
                Ok(DataValue::Float64(v.epoch_sec as f64))
            }
            (DataValue::Vector(v), TypeId::List) => Ok(DataValue::List(
                v.iter().map(|x| DataValue::Float64(*x)).collect(),
            )),
            (DataValue::List(v), TypeId::Vector) => {
                let floats = v
                    .iter()
                    .map(|x| x.as_f64())
                    .collect::<Result<Vec<f64>>>()
                    .map_err(|_| {
                        ErrorCode::TypeMismatch(
                            "List with non-numeric elements cannot become a Vector".to_string(),
                        )
                    })?;
                Ok(DataValue::Vector(floats))
            }
            _ => Err(ErrorCode::TypeMismatch(format!(
                "Cannot convert {} to {}",
                from, to
            ))),
        }
    }
}
