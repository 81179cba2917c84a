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

mod append;
mod constant;
mod filter;
mod flat_map;
mod operator;
mod project;
mod random;
mod range;
mod scalar_binop;
mod source;
mod transform;
mod vector;
mod zip;

pub use append::plan_append_ranges;
pub use append::AppendColumnOp;
pub use append::AppendFrameOp;
pub use constant::ConstantOp;
pub use filter::LambdaFilterOp;
pub use filter::LogicalFilterOp;
pub use flat_map::FlatMapOp;
pub use operator::Backing;
pub use operator::BinaryFn;
pub use operator::Cursor;
pub use operator::FlatMapFn;
pub use operator::LazyOperator;
pub use operator::PredicateFn;
pub use operator::Row;
pub use operator::RowOperatorRef;
pub use operator::TransformFn;
pub use operator::ValueOperatorRef;
pub use project::ProjectOp;
pub use random::RandomOp;
pub use range::RangeOp;
pub use scalar_binop::BinaryOpKind;
pub use scalar_binop::ScalarBinOp;
pub use scalar_binop::ScalarSide;
pub use source::SourceColumnOp;
pub use source::SourceFrameOp;
pub use transform::TransformOp;
pub use vector::VectorOp;
pub use zip::ZipColumnsOp;
