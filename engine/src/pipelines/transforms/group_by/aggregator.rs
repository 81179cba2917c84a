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

use std::any::Any;

use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;
use dyn_clone::DynClone;

/// An aggregation function: validates its input tags and mints partial
/// states.
pub trait Aggregator: Send + Sync {
    fn name(&self) -> &'static str;

    /// How many input columns a row carries into `add_row`. `count` is
    /// 0-ary; `argmin`/`argmax`/`zip_dict` take a pair.
    fn num_inputs(&self) -> usize {
        1
    }

    /// Whether a single input of this tag is aggregable.
    fn supports(&self, tag: TypeId) -> bool;

    /// The output tag for the given input tags; fails with `TypeMismatch`
    /// on unsupported inputs.
    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId>;

    /// A fresh partial state for the given inputs.
    fn new_state(&self, input_tags: &[TypeId]) -> Box<dyn AggregatorState>;

    fn check_inputs(&self, input_tags: &[TypeId]) -> Result<()> {
        if input_tags.len() != self.num_inputs() {
            return Err(ErrorCode::SchemaMismatch(format!(
                "{} takes {} input columns, got {}",
                self.name(),
                self.num_inputs(),
                input_tags.len()
            )));
        }
        for tag in input_tags {
            if !self.supports(*tag) {
                return Err(ErrorCode::TypeMismatch(format!(
                    "{} does not accept {} input",
                    self.name(),
                    tag
                )));
            }
        }
        Ok(())
    }
}

/// A cloneable, serializable partial aggregation state. Lifecycle: `add_row`
/// per routed row, one `partial_finalize` when a substream ends, `combine`
/// across substreams (associative and commutative unless documented
/// otherwise), then `emit`.
pub trait AggregatorState: Send + DynClone {
    fn add_row(&mut self, values: &[common_datavalues::DataValue]) -> Result<()>;

    /// Folds another partial of the same aggregator into this one.
    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()>;

    /// Called once when a substream finishes feeding this partial, before
    /// any combine. A no-op for everything but the quantile sketch.
    fn partial_finalize(&mut self) {}

    fn emit(&mut self) -> common_datavalues::DataValue;

    fn as_any(&self) -> &dyn Any;

    /// Framed encoding so a partial can move between workers.
    fn save(&self, out: &mut Vec<u8>) -> Result<()>;
    fn load(&mut self, data: &mut &[u8]) -> Result<()>;
}

dyn_clone::clone_trait_object!(AggregatorState);

/// Downcast helper shared by every `combine` implementation.
pub(crate) fn downcast<'a, T: 'static>(
    name: &'static str,
    other: &'a dyn AggregatorState,
) -> Result<&'a T> {
    other.as_any().downcast_ref::<T>().ok_or_else(|| {
        ErrorCode::Internal(format!("{} combined with a foreign partial state", name))
    })
}
