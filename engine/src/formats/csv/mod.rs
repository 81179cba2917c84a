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

mod options;
mod read;
mod tokenizer;
mod write;

pub use options::CsvReadOptions;
pub use options::CsvWriteOptions;
pub use read::make_unique_column_names;
pub use read::read_csv;
pub use read::CsvReadResult;
pub use tokenizer::CsvTokenizer;
pub use write::write_csv;
pub use write::write_csv_to_path;
