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

mod convert;
mod data_value;
mod data_value_ops;
mod date_time;
mod image;
mod parse;
mod serializations;
mod type_id;

pub mod prelude;

pub use data_value::DataValue;
pub use date_time::FlexDateTime;
pub use image::FlexImage;
pub use parse::parse_cell;
pub use type_id::TypeId;
