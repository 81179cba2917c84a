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

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use super::operator::BinaryFn;
use super::operator::Cursor;
use super::operator::LazyOperator;
use crate::pipelines::LazyColumn;

/// Element-wise binary function over two equally long value streams. Both
/// children are iterated with the same segmentation so every cursor sees
/// matched pairs.
pub struct VectorOp {
    left: LazyColumn,
    right: LazyColumn,
    f: BinaryFn,
    out_tag: TypeId,
}

impl VectorOp {
    pub fn try_create(
        left: LazyColumn,
        right: LazyColumn,
        f: BinaryFn,
        out_tag: TypeId,
    ) -> Result<Self> {
        if left.op().has_size() && right.op().has_size() {
            let (l, r) = (left.op().try_len()?, right.op().try_len()?);
            if l != r {
                return Err(ErrorCode::LengthMismatch(format!(
                    "Element-wise operands of lengths {} and {}",
                    l, r
                )));
            }
        }
        Ok(Self {
            left,
            right,
            f,
            out_tag,
        })
    }
}

impl LazyOperator<DataValue> for VectorOp {
    fn tags(&self) -> Vec<TypeId> {
        vec![self.out_tag]
    }

    fn has_size(&self) -> bool {
        self.left.op().has_size() && self.right.op().has_size()
    }

    fn try_len(&self) -> Result<usize> {
        let len = self.left.op().try_len()?;
        self.right.op().try_len()?;
        Ok(len)
    }

    fn cursors(&self, dop: usize, sizes: Option<&[usize]>) -> Result<Vec<Box<dyn Cursor<DataValue>>>> {
        let left = self.left.op().cursors(dop, sizes)?;
        let right = self.right.op().cursors(dop, sizes)?;
        Ok(left
            .into_iter()
            .zip(right)
            .map(|(l, r)| {
                Box::new(VectorCursor {
                    left: l,
                    right: r,
                    f: self.f.clone(),
                }) as Box<dyn Cursor<DataValue>>
            })
            .collect())
    }
}

struct VectorCursor {
    left: Box<dyn Cursor<DataValue>>,
    right: Box<dyn Cursor<DataValue>>,
    f: BinaryFn,
}

impl Cursor<DataValue> for VectorCursor {
    fn read(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        let mut lbatch = Vec::with_capacity(k.min(65536));
        let n = self.left.read(k, &mut lbatch)?;
        let mut rbatch = Vec::with_capacity(n);
        let m = self.right.read(n, &mut rbatch)?;
        if m != n {
            return Err(ErrorCode::LengthMismatch(format!(
                "Element-wise operands diverged mid-stream ({} vs {} rows)",
                n, m
            )));
        }
        for (l, r) in lbatch.iter().zip(rbatch.iter()) {
            out.push((self.f)(l, r)?);
        }
        Ok(n)
    }

    fn skip(&mut self, k: usize) -> Result<usize> {
        let n = self.left.skip(k)?;
        let m = self.right.skip(n)?;
        if m != n {
            return Err(ErrorCode::LengthMismatch(format!(
                "Element-wise operands diverged mid-stream ({} vs {} rows)",
                n, m
            )));
        }
        Ok(n)
    }
}
