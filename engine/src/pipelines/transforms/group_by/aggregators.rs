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
use std::cmp::Ordering;

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;
use common_io::prelude::*;

use super::aggregator::downcast;
use super::aggregator::Aggregator;
use super::aggregator::AggregatorState;
use super::quantile_sketch::QuantileSketch;

fn numeric_only(name: &'static str, tag: TypeId) -> Result<()> {
    if !tag.is_numeric() {
        return Err(ErrorCode::TypeMismatch(format!(
            "{} does not accept {} input",
            name, tag
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------- sum

pub struct Sum;

impl Aggregator for Sum {
    fn name(&self) -> &'static str {
        "Sum"
    }

    fn supports(&self, tag: TypeId) -> bool {
        tag.is_numeric()
    }

    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        numeric_only(self.name(), input_tags[0])?;
        Ok(input_tags[0])
    }

    fn new_state(&self, input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        let zero = match input_tags[0] {
            TypeId::Float64 => DataValue::Float64(0.0),
            _ => DataValue::Int64(0),
        };
        Box::new(SumState { acc: zero })
    }
}

#[derive(Clone)]
struct SumState {
    acc: DataValue,
}

impl AggregatorState for SumState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if !values[0].is_undefined() {
            self.acc = self.acc.add(&values[0])?;
        }
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        let other = downcast::<SumState>("Sum", other)?;
        self.acc = self.acc.add(&other.acc)?;
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        self.acc.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        self.acc.write_to(out)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.acc = DataValue::read_from(data)?;
        Ok(())
    }
}

// ---------------------------------------------------------- vector_sum

pub struct VectorSum;

impl Aggregator for VectorSum {
    fn name(&self) -> &'static str {
        "Vector Sum"
    }

    fn supports(&self, tag: TypeId) -> bool {
        tag == TypeId::Vector
    }

    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        if input_tags[0] != TypeId::Vector {
            return Err(ErrorCode::TypeMismatch(format!(
                "{} does not accept {} input",
                self.name(),
                input_tags[0]
            )));
        }
        Ok(TypeId::Vector)
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(VectorSumState {
            acc: Vec::new(),
            init: false,
            failure: false,
        })
    }
}

/// Summing vectors of two different lengths poisons the group: it emits
/// Undefined.
#[derive(Clone)]
struct VectorSumState {
    acc: Vec<f64>,
    init: bool,
    failure: bool,
}

impl AggregatorState for VectorSumState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if self.failure || values[0].is_undefined() {
            return Ok(());
        }
        let v = values[0].as_vector()?;
        if !self.init {
            self.acc = v.to_vec();
            self.init = true;
        } else if v.len() != self.acc.len() {
            self.failure = true;
        } else {
            for (a, b) in self.acc.iter_mut().zip(v.iter()) {
                *a += b;
            }
        }
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        let other = downcast::<VectorSumState>("Vector Sum", other)?;
        if other.failure || self.failure {
            self.failure = self.failure || other.failure;
            return Ok(());
        }
        if !self.init {
            *self = other.clone();
        } else if other.init {
            if self.acc.len() != other.acc.len() {
                self.failure = true;
            } else {
                for (a, b) in self.acc.iter_mut().zip(other.acc.iter()) {
                    *a += b;
                }
            }
        }
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        if self.failure {
            DataValue::Undefined
        } else {
            DataValue::Vector(self.acc.clone())
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        DataValue::Vector(self.acc.clone()).write_to(out)?;
        out.write_bool_value(self.init)?;
        out.write_bool_value(self.failure)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.acc = match DataValue::read_from(data)? {
            DataValue::Vector(v) => v,
            _ => {
                return Err(ErrorCode::Parse(
                    "Corrupt Vector Sum partial state".to_string(),
                ));
            }
        };
        self.init = data.read_bool_value()?;
        self.failure = data.read_bool_value()?;
        Ok(())
    }
}

// ------------------------------------------------------------ min / max

macro_rules! impl_extremum_aggregator {
    ($agg:ident, $state:ident, $name:expr, $keep:expr) => {
        pub struct $agg;

        impl Aggregator for $agg {
            fn name(&self) -> &'static str {
                $name
            }

            fn supports(&self, tag: TypeId) -> bool {
                tag.is_numeric()
            }

            fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
                numeric_only(self.name(), input_tags[0])?;
                Ok(input_tags[0])
            }

            fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
                Box::new($state { best: None })
            }
        }

        /// Undefined inputs are skipped; an empty group emits Undefined.
        #[derive(Clone)]
        struct $state {
            best: Option<DataValue>,
        }

        impl AggregatorState for $state {
            fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
                if values[0].is_undefined() {
                    return Ok(());
                }
                let keep: fn(Ordering) -> bool = $keep;
                match &self.best {
                    None => self.best = Some(values[0].clone()),
                    Some(best) => {
                        if keep(values[0].total_cmp(best)) {
                            self.best = Some(values[0].clone());
                        }
                    }
                }
                Ok(())
            }

            fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
                let other = downcast::<$state>($name, other)?;
                if let Some(v) = &other.best {
                    self.add_row(std::slice::from_ref(v))?;
                }
                Ok(())
            }

            fn emit(&mut self) -> DataValue {
                self.best.clone().unwrap_or(DataValue::Undefined)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn save(&self, out: &mut Vec<u8>) -> Result<()> {
                self.best
                    .clone()
                    .unwrap_or(DataValue::Undefined)
                    .write_to(out)
            }

            fn load(&mut self, data: &mut &[u8]) -> Result<()> {
                self.best = match DataValue::read_from(data)? {
                    DataValue::Undefined => None,
                    v => Some(v),
                };
                Ok(())
            }
        }
    };
}

impl_extremum_aggregator!(Min, MinState, "Min", |ord| ord == Ordering::Less);
impl_extremum_aggregator!(Max, MaxState, "Max", |ord| ord == Ordering::Greater);

// -------------------------------------------------------- argmin / argmax

macro_rules! impl_arg_extremum_aggregator {
    ($agg:ident, $state:ident, $name:expr, $keep:expr) => {
        pub struct $agg;

        impl Aggregator for $agg {
            fn name(&self) -> &'static str {
                $name
            }

            fn num_inputs(&self) -> usize {
                2
            }

            fn supports(&self, _tag: TypeId) -> bool {
                true
            }

            /// Inputs are (score, witness); the witness of the best score is
            /// emitted.
            fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
                Ok(input_tags[1])
            }

            fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
                Box::new($state { best: None })
            }
        }

        /// Ties keep the first-seen witness.
        #[derive(Clone)]
        struct $state {
            best: Option<(DataValue, DataValue)>,
        }

        impl AggregatorState for $state {
            fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
                if values[0].is_undefined() {
                    return Ok(());
                }
                let keep: fn(Ordering) -> bool = $keep;
                match &self.best {
                    None => self.best = Some((values[0].clone(), values[1].clone())),
                    Some((score, _)) => {
                        if keep(values[0].total_cmp(score)) {
                            self.best = Some((values[0].clone(), values[1].clone()));
                        }
                    }
                }
                Ok(())
            }

            fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
                let other = downcast::<$state>($name, other)?;
                if let Some((score, witness)) = &other.best {
                    self.add_row(&[score.clone(), witness.clone()])?;
                }
                Ok(())
            }

            fn emit(&mut self) -> DataValue {
                self.best
                    .clone()
                    .map(|(_, witness)| witness)
                    .unwrap_or(DataValue::Undefined)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn save(&self, out: &mut Vec<u8>) -> Result<()> {
                match &self.best {
                    Some((score, witness)) => {
                        out.write_bool_value(true)?;
                        score.write_to(out)?;
                        witness.write_to(out)
                    }
                    None => out.write_bool_value(false),
                }
            }

            fn load(&mut self, data: &mut &[u8]) -> Result<()> {
                self.best = if data.read_bool_value()? {
                    let score = DataValue::read_from(data)?;
                    let witness = DataValue::read_from(data)?;
                    Some((score, witness))
                } else {
                    None
                };
                Ok(())
            }
        }
    };
}

impl_arg_extremum_aggregator!(ArgMin, ArgMinState, "ArgMin", |ord| ord == Ordering::Less);
impl_arg_extremum_aggregator!(ArgMax, ArgMaxState, "ArgMax", |ord| {
    ord == Ordering::Greater
});

// -------------------------------------------------------------- count

pub struct Count;

impl Aggregator for Count {
    fn name(&self) -> &'static str {
        "Count"
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn supports(&self, _tag: TypeId) -> bool {
        true
    }

    fn output_tag(&self, _input_tags: &[TypeId]) -> Result<TypeId> {
        Ok(TypeId::Int64)
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(CountState { value: 0 })
    }
}

/// Undefined rows count too.
#[derive(Clone)]
struct CountState {
    value: u64,
}

impl AggregatorState for CountState {
    fn add_row(&mut self, _values: &[DataValue]) -> Result<()> {
        self.value += 1;
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        self.value += downcast::<CountState>("Count", other)?.value;
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        DataValue::Int64(self.value as i64)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_uvarint(self.value)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.value = data.read_uvarint()?;
        Ok(())
    }
}

// ---------------------------------------------------------------- avg

pub struct Avg;

impl Aggregator for Avg {
    fn name(&self) -> &'static str {
        "Avg"
    }

    fn supports(&self, tag: TypeId) -> bool {
        tag.is_numeric()
    }

    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        numeric_only(self.name(), input_tags[0])?;
        Ok(TypeId::Float64)
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(AvgState {
            value: 0.0,
            count: 0,
        })
    }
}

/// Mean by the running recurrence, so long streams do not overflow;
/// combine is the weighted mean of the partials.
#[derive(Clone)]
struct AvgState {
    value: f64,
    count: u64,
}

impl AggregatorState for AvgState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if values[0].is_undefined() {
            return Ok(());
        }
        self.count += 1;
        self.value += (values[0].as_f64()? - self.value) / self.count as f64;
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        let other = downcast::<AvgState>("Avg", other)?;
        if self.count + other.count > 0 {
            self.value = (self.value * self.count as f64 + other.value * other.count as f64)
                / (self.count + other.count) as f64;
            self.count += other.count;
        }
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        DataValue::Float64(self.value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_f64_value(self.value)?;
        out.write_uvarint(self.count)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.value = data.read_f64_value()?;
        self.count = data.read_uvarint()?;
        Ok(())
    }
}

// ---------------------------------------------------------- vector_avg

pub struct VectorAvg;

impl Aggregator for VectorAvg {
    fn name(&self) -> &'static str {
        "Vector Avg"
    }

    fn supports(&self, tag: TypeId) -> bool {
        tag == TypeId::Vector
    }

    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        if input_tags[0] != TypeId::Vector {
            return Err(ErrorCode::TypeMismatch(format!(
                "{} does not accept {} input",
                self.name(),
                input_tags[0]
            )));
        }
        Ok(TypeId::Vector)
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(VectorAvgState {
            acc: Vec::new(),
            count: 0,
            init: false,
            failure: false,
        })
    }
}

#[derive(Clone)]
struct VectorAvgState {
    acc: Vec<f64>,
    count: u64,
    init: bool,
    failure: bool,
}

impl AggregatorState for VectorAvgState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if self.failure || values[0].is_undefined() {
            return Ok(());
        }
        let v = values[0].as_vector()?;
        if !self.init {
            self.acc = v.to_vec();
            self.count = 1;
            self.init = true;
        } else if v.len() != self.acc.len() {
            self.failure = true;
        } else {
            self.count += 1;
            let count = self.count as f64;
            for (a, b) in self.acc.iter_mut().zip(v.iter()) {
                *a += (b - *a) / count;
            }
        }
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        let other = downcast::<VectorAvgState>("Vector Avg", other)?;
        if other.failure || self.failure {
            self.failure = self.failure || other.failure;
            return Ok(());
        }
        if !self.init {
            *self = other.clone();
        } else if other.init {
            if self.acc.len() != other.acc.len() {
                self.failure = true;
            } else {
                let total = (self.count + other.count) as f64;
                for (a, b) in self.acc.iter_mut().zip(other.acc.iter()) {
                    *a = (*a * self.count as f64 + b * other.count as f64) / total;
                }
                self.count += other.count;
            }
        }
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        if self.failure {
            DataValue::Undefined
        } else {
            DataValue::Vector(self.acc.clone())
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        DataValue::Vector(self.acc.clone()).write_to(out)?;
        out.write_uvarint(self.count)?;
        out.write_bool_value(self.init)?;
        out.write_bool_value(self.failure)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.acc = match DataValue::read_from(data)? {
            DataValue::Vector(v) => v,
            _ => {
                return Err(ErrorCode::Parse(
                    "Corrupt Vector Avg partial state".to_string(),
                ));
            }
        };
        self.count = data.read_uvarint()?;
        self.init = data.read_bool_value()?;
        self.failure = data.read_bool_value()?;
        Ok(())
    }
}

// ----------------------------------------------------------- var / stdv

pub struct Var;

impl Aggregator for Var {
    fn name(&self) -> &'static str {
        "Var"
    }

    fn supports(&self, tag: TypeId) -> bool {
        tag.is_numeric()
    }

    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        numeric_only(self.name(), input_tags[0])?;
        Ok(TypeId::Float64)
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(VarState::default())
    }
}

/// Welford's recurrence; partials merge with the parallel-variance
/// formula. Population variance (ddof = 0); zero or one element emits 0.
#[derive(Clone, Default)]
struct VarState {
    count: u64,
    mean: f64,
    m2: f64,
}

impl VarState {
    fn merge(&mut self, other: &VarState) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let total = (self.count + other.count) as f64;
        let delta = other.mean - self.mean;
        self.mean = (self.mean * self.count as f64 + other.mean * other.count as f64) / total;
        self.m2 += other.m2 + delta * delta * (other.count as f64) * (self.count as f64) / total;
        self.count += other.count;
    }

    fn variance(&self) -> f64 {
        if self.count <= 1 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }
}

impl AggregatorState for VarState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if values[0].is_undefined() {
            return Ok(());
        }
        let v = values[0].as_f64()?;
        self.count += 1;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        self.merge(downcast::<VarState>("Var", other)?);
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        DataValue::Float64(self.variance())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_uvarint(self.count)?;
        out.write_f64_value(self.mean)?;
        out.write_f64_value(self.m2)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.count = data.read_uvarint()?;
        self.mean = data.read_f64_value()?;
        self.m2 = data.read_f64_value()?;
        Ok(())
    }
}

pub struct Stdv;

impl Aggregator for Stdv {
    fn name(&self) -> &'static str {
        "Stdv"
    }

    fn supports(&self, tag: TypeId) -> bool {
        tag.is_numeric()
    }

    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        numeric_only(self.name(), input_tags[0])?;
        Ok(TypeId::Float64)
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(StdvState {
            inner: VarState::default(),
        })
    }
}

#[derive(Clone)]
struct StdvState {
    inner: VarState,
}

impl AggregatorState for StdvState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        self.inner.add_row(values)
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        self.inner.merge(&downcast::<StdvState>("Stdv", other)?.inner);
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        DataValue::Float64(self.inner.variance().sqrt())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        self.inner.save(out)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.inner.load(data)
    }
}

// ------------------------------------------------------------ quantile

pub struct Quantile {
    quantiles: Vec<f64>,
}

impl Quantile {
    pub fn new(quantiles: Vec<f64>) -> Self {
        Self { quantiles }
    }
}

impl Aggregator for Quantile {
    fn name(&self) -> &'static str {
        "Quantiles"
    }

    fn supports(&self, tag: TypeId) -> bool {
        tag.is_numeric()
    }

    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        numeric_only(self.name(), input_tags[0])?;
        Ok(TypeId::Vector)
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(QuantileState {
            sketch: QuantileSketch::new(),
            quantiles: self.quantiles.clone(),
        })
    }
}

#[derive(Clone)]
struct QuantileState {
    sketch: QuantileSketch,
    quantiles: Vec<f64>,
}

impl AggregatorState for QuantileState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if !values[0].is_undefined() {
            self.sketch.add(values[0].as_f64()?);
        }
        Ok(())
    }

    fn partial_finalize(&mut self) {
        self.sketch.substream_finalize();
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        self.sketch
            .merge(&downcast::<QuantileState>("Quantiles", other)?.sketch);
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        if self.sketch.count() == 0 {
            return DataValue::Undefined;
        }
        let values = self
            .quantiles
            .clone()
            .into_iter()
            .filter_map(|q| self.sketch.query(q))
            .collect();
        DataValue::Vector(values)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        DataValue::Vector(self.quantiles.clone()).write_to(out)?;
        self.sketch.save(out)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.quantiles = match DataValue::read_from(data)? {
            DataValue::Vector(v) => v,
            _ => {
                return Err(ErrorCode::Parse(
                    "Corrupt Quantiles partial state".to_string(),
                ));
            }
        };
        self.sketch = QuantileSketch::load(data)?;
        Ok(())
    }
}

// ------------------------------------------------------------ zip_dict

pub struct ZipDict;

impl Aggregator for ZipDict {
    fn name(&self) -> &'static str {
        "Dict"
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn supports(&self, _tag: TypeId) -> bool {
        true
    }

    fn output_tag(&self, _input_tags: &[TypeId]) -> Result<TypeId> {
        Ok(TypeId::Dict)
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(ZipDictState {
            entries: Vec::new(),
            missing: false,
        })
    }
}

/// Zips a (key, value) column pair into one dict per group. An Undefined
/// key marks the group as having a missing entry; merge is key union with
/// the first-seen value winning.
#[derive(Clone)]
struct ZipDictState {
    /// Sorted by key order, unique keys.
    entries: Vec<(DataValue, DataValue)>,
    missing: bool,
}

impl ZipDictState {
    fn insert(&mut self, key: DataValue, value: DataValue) {
        match self
            .entries
            .binary_search_by(|(k, _)| k.total_cmp(&key))
        {
            Ok(_) => {}
            Err(pos) => self.entries.insert(pos, (key, value)),
        }
    }
}

impl AggregatorState for ZipDictState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if values[0].is_undefined() {
            self.missing = true;
        } else {
            self.insert(values[0].clone(), values[1].clone());
        }
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        let other = downcast::<ZipDictState>("Dict", other)?;
        self.missing |= other.missing;
        for (k, v) in &other.entries {
            self.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        DataValue::Dict(self.entries.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        DataValue::Dict(self.entries.clone()).write_to(out)?;
        out.write_bool_value(self.missing)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.entries = match DataValue::read_from(data)? {
            DataValue::Dict(v) => v,
            _ => {
                return Err(ErrorCode::Parse("Corrupt Dict partial state".to_string()));
            }
        };
        self.missing = data.read_bool_value()?;
        Ok(())
    }
}

// ------------------------------------------------------------ zip_list

pub struct ZipList;

impl Aggregator for ZipList {
    fn name(&self) -> &'static str {
        "List"
    }

    fn supports(&self, _tag: TypeId) -> bool {
        true
    }

    /// Float input zips into a Vector, everything else into a List.
    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        Ok(if input_tags[0] == TypeId::Float64 {
            TypeId::Vector
        } else {
            TypeId::List
        })
    }

    fn new_state(&self, input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(ZipListState {
            values: Vec::new(),
            missing: false,
            is_float: input_tags[0] == TypeId::Float64,
        })
    }
}

#[derive(Clone)]
struct ZipListState {
    values: Vec<DataValue>,
    missing: bool,
    is_float: bool,
}

impl AggregatorState for ZipListState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if values[0].is_undefined() {
            self.missing = true;
        } else {
            self.values.push(values[0].clone());
        }
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        let other = downcast::<ZipListState>("List", other)?;
        self.missing |= other.missing;
        self.values.extend(other.values.iter().cloned());
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        if self.is_float {
            let floats = self
                .values
                .iter()
                .filter_map(|v| v.as_f64().ok())
                .collect();
            DataValue::Vector(floats)
        } else {
            DataValue::List(self.values.clone())
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        DataValue::List(self.values.clone()).write_to(out)?;
        out.write_bool_value(self.missing)?;
        out.write_bool_value(self.is_float)
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.values = match DataValue::read_from(data)? {
            DataValue::List(v) => v,
            _ => {
                return Err(ErrorCode::Parse("Corrupt List partial state".to_string()));
            }
        };
        self.missing = data.read_bool_value()?;
        self.is_float = data.read_bool_value()?;
        Ok(())
    }
}

// ---------------------------------------------------------- select_one

pub struct SelectOne;

impl Aggregator for SelectOne {
    fn name(&self) -> &'static str {
        "Select One"
    }

    fn supports(&self, _tag: TypeId) -> bool {
        true
    }

    fn output_tag(&self, input_tags: &[TypeId]) -> Result<TypeId> {
        Ok(input_tags[0])
    }

    fn new_state(&self, _input_tags: &[TypeId]) -> Box<dyn AggregatorState> {
        Box::new(SelectOneState { value: None })
    }
}

/// Any one value per group; this implementation keeps the first in
/// partition order, so combine is intentionally one-sided.
#[derive(Clone)]
struct SelectOneState {
    value: Option<DataValue>,
}

impl AggregatorState for SelectOneState {
    fn add_row(&mut self, values: &[DataValue]) -> Result<()> {
        if self.value.is_none() {
            self.value = Some(values[0].clone());
        }
        Ok(())
    }

    fn combine(&mut self, other: &dyn AggregatorState) -> Result<()> {
        let other = downcast::<SelectOneState>("Select One", other)?;
        if self.value.is_none() {
            self.value = other.value.clone();
        }
        Ok(())
    }

    fn emit(&mut self) -> DataValue {
        self.value.clone().unwrap_or(DataValue::Undefined)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save(&self, out: &mut Vec<u8>) -> Result<()> {
        match &self.value {
            Some(v) => {
                out.write_bool_value(true)?;
                v.write_to(out)
            }
            None => out.write_bool_value(false),
        }
    }

    fn load(&mut self, data: &mut &[u8]) -> Result<()> {
        self.value = if data.read_bool_value()? {
            Some(DataValue::read_from(data)?)
        } else {
            None
        };
        Ok(())
    }
}
