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

mod aggregator;
mod aggregators;
mod group_key;
mod quantile_sketch;
mod transform_groupby;

pub use aggregator::Aggregator;
pub use aggregator::AggregatorState;
pub use aggregators::ArgMax;
pub use aggregators::ArgMin;
pub use aggregators::Avg;
pub use aggregators::Count;
pub use aggregators::Max;
pub use aggregators::Min;
pub use aggregators::Quantile;
pub use aggregators::SelectOne;
pub use aggregators::Stdv;
pub use aggregators::Sum;
pub use aggregators::Var;
pub use aggregators::VectorAvg;
pub use aggregators::VectorSum;
pub use aggregators::ZipDict;
pub use aggregators::ZipList;
pub use group_key::GroupKey;
pub use quantile_sketch::QuantileSketch;
pub use transform_groupby::groupby_aggregate;
pub use transform_groupby::AggregationSpec;
