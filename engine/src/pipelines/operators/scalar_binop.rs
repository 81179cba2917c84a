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

use super::operator::Cursor;
use super::operator::LazyOperator;
use crate::pipelines::LazyColumn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Which side the constant sits on: `Right` computes `row ⊕ scalar`,
/// `Left` computes `scalar ⊕ row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarSide {
    Left,
    Right,
}

impl BinaryOpKind {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOpKind::Eq
                | BinaryOpKind::Ne
                | BinaryOpKind::Lt
                | BinaryOpKind::Lte
                | BinaryOpKind::Gt
                | BinaryOpKind::Gte
        )
    }

    /// Output tag given the two operand tags. Comparisons yield an Int64
    /// 0/1 mask; arithmetic promotes Int64 pairs to Int64, everything else
    /// numeric to Float64, and keeps container/string tags.
    pub fn output_tag(&self, left: TypeId, right: TypeId) -> TypeId {
        if self.is_comparison() {
            return TypeId::Int64;
        }
        match (left, right) {
            (TypeId::Int64, TypeId::Int64) => {
                if *self == BinaryOpKind::Div {
                    TypeId::Float64
                } else {
                    TypeId::Int64
                }
            }
            (TypeId::Vector, _) | (_, TypeId::Vector) => TypeId::Vector,
            (TypeId::String, TypeId::String) => TypeId::String,
            _ => TypeId::Float64,
        }
    }

    pub fn eval(&self, left: &DataValue, right: &DataValue) -> Result<DataValue> {
        match self {
            BinaryOpKind::Add => left.add(right),
            BinaryOpKind::Sub => left.sub(right),
            BinaryOpKind::Mul => left.mul(right),
            BinaryOpKind::Div => left.div(right),
            BinaryOpKind::Eq => Ok(DataValue::Int64(i64::from(left == right))),
            BinaryOpKind::Ne => Ok(DataValue::Int64(i64::from(left != right))),
            BinaryOpKind::Lt => relational(left, right, |o| o == Ordering::Less),
            BinaryOpKind::Lte => relational(left, right, |o| o != Ordering::Greater),
            BinaryOpKind::Gt => relational(left, right, |o| o == Ordering::Greater),
            BinaryOpKind::Gte => relational(left, right, |o| o != Ordering::Less),
        }
    }
}

/// Relational comparison with an Undefined operand is Undefined.
fn relational(
    left: &DataValue,
    right: &DataValue,
    f: impl Fn(Ordering) -> bool,
) -> Result<DataValue> {
    Ok(match left.rel_cmp(right)? {
        Some(ord) => DataValue::Int64(i64::from(f(ord))),
        None => DataValue::Undefined,
    })
}

/// `Vector` specialized to a constant operand.
pub struct ScalarBinOp {
    child: LazyColumn,
    value: DataValue,
    op: BinaryOpKind,
    side: ScalarSide,
    out_tag: TypeId,
}

impl ScalarBinOp {
    pub fn new(child: LazyColumn, value: DataValue, op: BinaryOpKind, side: ScalarSide) -> Self {
        let out_tag = match side {
            ScalarSide::Right => op.output_tag(child.tag(), value.data_type_id()),
            ScalarSide::Left => op.output_tag(value.data_type_id(), child.tag()),
        };
        Self {
            child,
            value,
            op,
            side,
            out_tag,
        }
    }
}

impl LazyOperator<DataValue> for ScalarBinOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![self.out_tag]
    }

    fn has_size(&self) -> bool {
        self.child.op().has_size()
    }

    fn try_len(&self) -> Result<usize> {
        self.child.op().try_len()
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        Ok(self
            .child
            .op()
            .cursors(dop, sizes)?
            .into_iter()
            .map(|inner| {
                Box::new(ScalarBinOpCursor {
                    inner,
                    value: self.value.clone(),
                    op: self.op,
                    side: self.side,
                }) as Box<dyn Cursor<DataValue>>
            })
            .collect())
    }
}

struct ScalarBinOpCursor {
    inner: Box<dyn Cursor<DataValue>>,
    value: DataValue,
    op: BinaryOpKind,
    side: ScalarSide,
}

impl Cursor<DataValue> for ScalarBinOpCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        let mut batch = Vec::with_capacity(k.min(65536));
        let n = self.inner.read(k, &mut batch)?;
        for v in &batch {
            let result = match self.side {
                ScalarSide::Right => self.op.eval(v, &self.value)?,
                ScalarSide::Left => self.op.eval(&self.value, v)?,
            };
            out.push(result);
        }
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        self.inner.skip(k)
    }
}
