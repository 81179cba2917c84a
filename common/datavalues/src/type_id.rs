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

/// The closed tag set of [`crate::DataValue`]. The discriminants are the
/// on-disk tag bytes and must never be renumbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum TypeId {
    Undefined = 0,
    Int64 = 1,
    Float64 = 2,
    String = 3,
    Vector = 4,
    List = 5,
    Dict = 6,
    DateTime = 7,
    Image = 8,
}

impl TypeId {
    pub fn name(&self) -> &'static str {
        match self {
            TypeId::Undefined => "Undefined",
            TypeId::Int64 => "Int64",
            TypeId::Float64 => "Float64",
            TypeId::String => "String",
            TypeId::Vector => "Vector",
            TypeId::List => "List",
            TypeId::Dict => "Dict",
            TypeId::DateTime => "DateTime",
            TypeId::Image => "Image",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeId::Int64 | TypeId::Float64)
    }

    /// Cross-tag ordering rank. Int64 and Float64 share a rank so mixed
    /// numeric columns compare numerically; Undefined ranks below everything
    /// (ascending sorts put nulls first).
    pub(crate) fn order_rank(&self) -> u8 {
        match self {
            TypeId::Undefined => 0,
            TypeId::Int64 | TypeId::Float64 => 1,
            TypeId::String => 2,
            TypeId::Vector => 3,
            TypeId::List => 4,
            TypeId::Dict => 5,
            TypeId::DateTime => 6,
            TypeId::Image => 7,
        }
    }

    pub fn to_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(b: u8) -> Result<TypeId> {
        Ok(match b {
            0 => TypeId::Undefined,
            1 => TypeId::Int64,
            2 => TypeId::Float64,
            3 => TypeId::String,
            4 => TypeId::Vector,
            5 => TypeId::List,
            6 => TypeId::Dict,
            7 => TypeId::DateTime,
            8 => TypeId::Image,
            _ => {
                return Err(ErrorCode::Parse(format!("Unknown type tag byte {}", b)));
            }
        })
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
