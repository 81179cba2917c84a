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

use common_exception::ErrorCode;
use common_exception::Result;
use ordered_float::OrderedFloat;

use crate::DataValue;

impl DataValue {
    /// Total order over all cells: by (tag rank, intra-tag natural order).
    /// Int64 and Float64 compare numerically against each other, DateTime by
    /// its seconds field, Undefined below every other tag. This is the sort
    /// comparator and the Dict key order.
    pub fn total_cmp(&self, other: &DataValue) -> Ordering {
        let (lr, rr) = (
            self.data_type_id().order_rank(),
            other.data_type_id().order_rank(),
        );
        if lr != rr {
            return lr.cmp(&rr);
        }
        match (self, other) {
            (DataValue::Undefined, DataValue::Undefined) => Ordering::Equal,
            (DataValue::Int64(l), DataValue::Int64(r)) => l.cmp(r),
            (DataValue::Int64(l), DataValue::Float64(r)) => {
                OrderedFloat(*l as f64).cmp(&OrderedFloat(*r))
            }
            (DataValue::Float64(l), DataValue::Int64(r)) => {
                OrderedFloat(*l).cmp(&OrderedFloat(*r as f64))
            }
            (DataValue::Float64(l), DataValue::Float64(r)) => {
                OrderedFloat(*l).cmp(&OrderedFloat(*r))
            }
            (DataValue::String(l), DataValue::String(r)) => l.cmp(r),
            (DataValue::Vector(l), DataValue::Vector(r)) => {
                for (a, b) in l.iter().zip(r.iter()) {
                    let ord = OrderedFloat(*a).cmp(&OrderedFloat(*b));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                l.len().cmp(&r.len())
            }
            (DataValue::List(l), DataValue::List(r)) => {
                for (a, b) in l.iter().zip(r.iter()) {
                    let ord = a.total_cmp(b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                l.len().cmp(&r.len())
            }
            (DataValue::Dict(l), DataValue::Dict(r)) => {
                for ((lk, lv), (rk, rv)) in l.iter().zip(r.iter()) {
                    let ord = lk.total_cmp(rk).then_with(|| lv.total_cmp(rv));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                l.len().cmp(&r.len())
            }
            (DataValue::DateTime(l), DataValue::DateTime(r)) => l.cmp(r),
            (DataValue::Image(l), DataValue::Image(r)) => l.cmp(r),
            _ => unreachable!("tags of equal rank must match"),
        }
    }

    /// Relational comparison for `<`, `<=`, `>`, `>=`: `None` when either
    /// side is Undefined (the result is Undefined), error when the tags are
    /// not mutually ordered.
    pub fn rel_cmp(&self, other: &DataValue) -> Result<Option<Ordering>> {
        if self.is_undefined() || other.is_undefined() {
            return Ok(None);
        }
        let (lt, rt) = (self.data_type_id(), other.data_type_id());
        if lt.order_rank() != rt.order_rank() {
            return Err(ErrorCode::TypeMismatch(format!(
                "Cannot order {} against {}",
                lt, rt
            )));
        }
        Ok(Some(self.total_cmp(other)))
    }

    fn numeric_pair(&self, other: &DataValue) -> Option<(f64, f64, bool)> {
        match (self, other) {
            (DataValue::Int64(l), DataValue::Int64(r)) => Some((*l as f64, *r as f64, true)),
            (DataValue::Int64(l), DataValue::Float64(r)) => Some((*l as f64, *r, false)),
            (DataValue::Float64(l), DataValue::Int64(r)) => Some((*l, *r as f64, false)),
            (DataValue::Float64(l), DataValue::Float64(r)) => Some((*l, *r, false)),
            _ => None,
        }
    }

    pub fn add(&self, other: &DataValue) -> Result<DataValue> {
        if self.is_undefined() || other.is_undefined() {
            return Ok(DataValue::Undefined);
        }
        if let (DataValue::Int64(l), DataValue::Int64(r)) = (self, other) {
            return Ok(DataValue::Int64(l.wrapping_add(*r)));
        }
        if let Some((l, r, _)) = self.numeric_pair(other) {
            return Ok(DataValue::Float64(l + r));
        }
        match (self, other) {
            (DataValue::String(l), DataValue::String(r)) => {
                Ok(DataValue::String(format!("{}{}", l, r)))
            }
            (DataValue::Vector(l), DataValue::Vector(r)) => {
                Ok(DataValue::Vector(zip_vectors(l, r, |a, b| a + b)?))
            }
            (DataValue::Vector(l), r) if r.data_type_id().is_numeric() => {
                let r = r.as_f64()?;
                Ok(DataValue::Vector(l.iter().map(|a| a + r).collect()))
            }
            (l, DataValue::Vector(r)) if l.data_type_id().is_numeric() => {
                let l = l.as_f64()?;
                Ok(DataValue::Vector(r.iter().map(|b| l + b).collect()))
            }
            _ => Err(binop_mismatch("+", self, other)),
        }
    }

    pub fn sub(&self, other: &DataValue) -> Result<DataValue> {
        if self.is_undefined() || other.is_undefined() {
            return Ok(DataValue::Undefined);
        }
        if let (DataValue::Int64(l), DataValue::Int64(r)) = (self, other) {
            return Ok(DataValue::Int64(l.wrapping_sub(*r)));
        }
        if let Some((l, r, _)) = self.numeric_pair(other) {
            return Ok(DataValue::Float64(l - r));
        }
        match (self, other) {
            (DataValue::Vector(l), DataValue::Vector(r)) => {
                Ok(DataValue::Vector(zip_vectors(l, r, |a, b| a - b)?))
            }
            (DataValue::Vector(l), r) if r.data_type_id().is_numeric() => {
                let r = r.as_f64()?;
                Ok(DataValue::Vector(l.iter().map(|a| a - r).collect()))
            }
            _ => Err(binop_mismatch("-", self, other)),
        }
    }

    pub fn mul(&self, other: &DataValue) -> Result<DataValue> {
        if self.is_undefined() || other.is_undefined() {
            return Ok(DataValue::Undefined);
        }
        if let (DataValue::Int64(l), DataValue::Int64(r)) = (self, other) {
            return Ok(DataValue::Int64(l.wrapping_mul(*r)));
        }
        if let Some((l, r, _)) = self.numeric_pair(other) {
            return Ok(DataValue::Float64(l * r));
        }
        match (self, other) {
            (DataValue::Vector(l), DataValue::Vector(r)) => {
                Ok(DataValue::Vector(zip_vectors(l, r, |a, b| a * b)?))
            }
            (DataValue::Vector(l), r) if r.data_type_id().is_numeric() => {
                let r = r.as_f64()?;
                Ok(DataValue::Vector(l.iter().map(|a| a * r).collect()))
            }
            (l, DataValue::Vector(r)) if l.data_type_id().is_numeric() => {
                let l = l.as_f64()?;
                Ok(DataValue::Vector(r.iter().map(|b| l * b).collect()))
            }
            _ => Err(binop_mismatch("*", self, other)),
        }
    }

    /// Division always yields Float64; division by zero follows IEEE.
    pub fn div(&self, other: &DataValue) -> Result<DataValue> {
        if self.is_undefined() || other.is_undefined() {
            return Ok(DataValue::Undefined);
        }
        if let Some((l, r, _)) = self.numeric_pair(other) {
            return Ok(DataValue::Float64(l / r));
        }
        match (self, other) {
            (DataValue::Vector(l), DataValue::Vector(r)) => {
                Ok(DataValue::Vector(zip_vectors(l, r, |a, b| a / b)?))
            }
            (DataValue::Vector(l), r) if r.data_type_id().is_numeric() => {
                let r = r.as_f64()?;
                Ok(DataValue::Vector(l.iter().map(|a| a / r).collect()))
            }
            _ => Err(binop_mismatch("/", self, other)),
        }
    }
}

fn zip_vectors(l: &[f64], r: &[f64], f: impl Fn(f64, f64) -> f64) -> Result<Vec<f64>> {
    if l.len() != r.len() {
        return Err(ErrorCode::LengthMismatch(format!(
            "Vector operands of lengths {} and {}",
            l.len(),
            r.len()
        )));
    }
    Ok(l.iter().zip(r.iter()).map(|(a, b)| f(*a, *b)).collect())
}

fn binop_mismatch(op: &str, l: &DataValue, r: &DataValue) -> ErrorCode {
    ErrorCode::TypeMismatch(format!(
        "Unsupported operand tags for {}: {} and {}",
        op,
        l.data_type_id(),
        r.data_type_id()
    ))
}

/// Equality is the total order's Equal class: numeric across Int64/Float64,
/// seconds-only for DateTime, tag-only for Undefined.
impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl Eq for DataValue {}
