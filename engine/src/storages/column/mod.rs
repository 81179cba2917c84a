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

mod column;
mod index;
mod reader;
mod segment;
mod writer;

pub use column::Column;
pub use index::ColumnIndex;
pub use index::SegmentMeta;
pub use index::COLUMN_INDEX_EXT;
pub use reader::ColumnReader;
pub use reader::RangeScanner;
pub use segment::SegmentScanner;
pub use writer::ColumnSegmentWriter;
pub use writer::ColumnWriter;
