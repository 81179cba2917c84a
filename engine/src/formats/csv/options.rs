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

use std::collections::BTreeMap;

use common_datavalues::TypeId;

/// Hint key applying one tag to every column.
pub const HINT_ALL_COLUMNS: &str = "__all_columns__";

/// Tokenizer and ingest configuration.
#[derive(Clone, Debug)]
pub struct CsvReadOptions {
    /// The first non-empty non-comment line carries column names.
    pub use_header: bool,
    /// Divert unparsable rows instead of failing the ingest.
    pub continue_on_failure: bool,
    /// Keep the raw text of failed rows in a per-file error column.
    pub store_errors: bool,
    /// Stop after this many accepted rows; 0 means unlimited.
    pub row_limit: u64,
    pub delimiter: String,
    /// Lines starting with this are skipped; '\0' disables.
    pub comment_char: char,
    pub escape_char: char,
    /// A doubled quote inside a quoted field is a literal quote.
    pub double_quote: bool,
    pub quote_char: char,
    /// Drop spaces right after a delimiter.
    pub skip_initial_space: bool,
    /// Cell spellings read as Undefined.
    pub na_values: Vec<String>,
    /// Column tag overrides: by name, positional `__X<i>__`, or
    /// [`HINT_ALL_COLUMNS`]. Unhinted columns parse as String.
    pub column_type_hints: BTreeMap<String, TypeId>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            use_header: true,
            continue_on_failure: false,
            store_errors: false,
            row_limit: 0,
            delimiter: ",".to_string(),
            comment_char: '\0',
            escape_char: '\\',
            double_quote: true,
            quote_char: '"',
            skip_initial_space: true,
            na_values: Vec::new(),
            column_type_hints: BTreeMap::new(),
        }
    }
}

/// CSV output configuration.
#[derive(Clone, Debug)]
pub struct CsvWriteOptions {
    pub delimiter: char,
    pub escape_char: char,
    pub double_quote: bool,
    pub quote_char: char,
    /// Always quote String cells; otherwise quote only when the content
    /// demands it.
    pub use_quote_char: bool,
    pub header: bool,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            escape_char: '\\',
            double_quote: true,
            quote_char: '"',
            use_quote_char: true,
            header: true,
        }
    }
}
