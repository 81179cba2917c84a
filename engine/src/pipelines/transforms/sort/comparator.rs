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

/// One sort key: a column and its direction.
#[derive(Clone, Debug)]
pub struct SortKey {
    pub column: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> SortKey {
        SortKey {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> SortKey {
        SortKey {
            column: column.into(),
            ascending: false,
        }
    }
}

/// The composite comparator over extracted key tuples. Undefined ranks
/// below every value in the total order, and a descending key reverses its
/// whole comparison, so ascending puts Undefined first and descending puts
/// it last.
pub fn compare_rows(left: &[DataValue], right: &[DataValue], ascending: &[bool]) -> Ordering {
    for ((l, r), asc) in left.iter().zip(right.iter()).zip(ascending.iter()) {
        let ord = l.total_cmp(r);
        let ord = if *asc { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
