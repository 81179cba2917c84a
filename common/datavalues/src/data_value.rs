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
use itertools::Itertools;

use crate::FlexDateTime;
use crate::FlexImage;
use crate::TypeId;

/// The tagged dynamic cell. Every column slot holds one of these; a typed
/// column holds values of its declared tag or `Undefined`.
#[derive(Clone, Debug)]
pub enum DataValue {
    Undefined,
    Int64(i64),
    Float64(f64),
    String(String),
    Vector(Vec<f64>),
    List(Vec<DataValue>),
    Dict(Vec<(DataValue, DataValue)>),
    DateTime(FlexDateTime),
    Image(FlexImage),
}

impl DataValue {
    pub fn data_type_id(&self) -> TypeId {
        match self {
            DataValue::Undefined => TypeId::Undefined,
            DataValue::Int64(_) => TypeId::Int64,
            DataValue::Float64(_) => TypeId::Float64,
            DataValue::String(_) => TypeId::String,
            DataValue::Vector(_) => TypeId::Vector,
            DataValue::List(_) => TypeId::List,
            DataValue::Dict(_) => TypeId::Dict,
            DataValue::DateTime(_) => TypeId::DateTime,
            DataValue::Image(_) => TypeId::Image,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, DataValue::Undefined)
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            DataValue::Int64(v) => Ok(*v),
            DataValue::Float64(v) => Ok(*v as i64),
            DataValue::DateTime(v) => Ok(v.epoch_sec),
            other => Err(ErrorCode::TypeMismatch(format!(
                "Cannot read {} as Int64",
                other.data_type_id()
            ))),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            DataValue::Int64(v) => Ok(*v as f64),
            DataValue::Float64(v) => Ok(*v),
            DataValue::DateTime(v) => Ok(v.epoch_sec as f64),
            other => Err(ErrorCode::TypeMismatch(format!(
                "Cannot read {} as Float64",
                other.data_type_id()
            ))),
        }
    }

    pub fn as_string(&self) -> Result<&str> {
        match self {
            DataValue::String(v) => Ok(v),
            other => Err(ErrorCode::TypeMismatch(format!(
                "Cannot read {} as String",
                other.data_type_id()
            ))),
        }
    }

    pub fn as_vector(&self) -> Result<&[f64]> {
        match self {
            DataValue::Vector(v) => Ok(v),
            other => Err(ErrorCode::TypeMismatch(format!(
                "Cannot read {} as Vector",
                other.data_type_id()
            ))),
        }
    }

    /// Boolean interpretation used by the logical filter mask: zero numbers,
    /// empty containers and `Undefined` are false, everything else true.
    pub fn is_true(&self) -> bool {
        match self {
            DataValue::Undefined => false,
            DataValue::Int64(v) => *v != 0,
            DataValue::Float64(v) => *v != 0.0,
            DataValue::String(v) => !v.is_empty(),
            DataValue::Vector(v) => !v.is_empty(),
            DataValue::List(v) => !v.is_empty(),
            DataValue::Dict(v) => !v.is_empty(),
            DataValue::DateTime(_) => true,
            DataValue::Image(_) => true,
        }
    }
}

impl Default for DataValue {
    fn default() -> Self {
        DataValue::Undefined
    }
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Undefined => write!(f, ""),
            DataValue::Int64(v) => write!(f, "{}", v),
            DataValue::Float64(v) => write!(f, "{}", v),
            DataValue::String(v) => write!(f, "{}", v),
            DataValue::Vector(v) => {
                write!(f, "[{}]", v.iter().map(|x| x.to_string()).join(" "))
            }
            DataValue::List(v) => {
                write!(f, "[{}]", v.iter().map(|x| x.to_string()).join(","))
            }
            DataValue::Dict(v) => {
                write!(
                    f,
                    "{{{}}}",
                    v.iter().map(|(k, val)| format!("{}:{}", k, val)).join(",")
                )
            }
            DataValue::DateTime(v) => write!(f, "{}", v),
            DataValue::Image(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Int64(v)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Float64(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::String(v.to_string())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::String(v)
    }
}

impl From<Vec<f64>> for DataValue {
    fn from(v: Vec<f64>) -> Self {
        DataValue::Vector(v)
    }
}
