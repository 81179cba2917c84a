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

use common_datavalues::parse_cell;
use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;

use super::options::CsvReadOptions;

/// One line in, fields out. Quote, escape and NA handling follow the
/// configured options; typing is the caller's map from column position to
/// tag.
#[derive(Clone)]
pub struct CsvTokenizer {
    delimiter: Vec<char>,
    comment_char: char,
    escape_char: char,
    quote_char: char,
    double_quote: bool,
    skip_initial_space: bool,
    na_values: Vec<String>,
}

/// A raw field plus whether it was quoted; NA spellings only apply to
/// unquoted fields.
struct RawField {
    text: String,
    quoted: bool,
}

impl CsvTokenizer {
    pub fn new(options: &CsvReadOptions) -> CsvTokenizer {
        CsvTokenizer {
            delimiter: options.delimiter.chars().collect(),
            comment_char: options.comment_char,
            escape_char: options.escape_char,
            quote_char: options.quote_char,
            double_quote: options.double_quote,
            skip_initial_space: options.skip_initial_space,
            na_values: options.na_values.clone(),
        }
    }

    /// Whether the line carries no data: blank, or a comment.
    pub fn is_skippable(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return true;
        }
        self.comment_char != '\0' && trimmed.starts_with(self.comment_char)
    }

    /// The raw field strings of one line, unquoted and unescaped.
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        self.split_fields(line).into_iter().map(|f| f.text).collect()
    }

    /// Parses one line against the declared column tags. Fails with
    /// `SchemaMismatch` on arity skew and `Parse`/`TypeMismatch` on a bad
    /// cell.
    pub fn parse_line(&self, line: &str, tags: &[TypeId]) -> Result<Vec<DataValue>> {
        let fields = self.split_fields(line);
        if fields.len() != tags.len() {
            return Err(ErrorCode::SchemaMismatch(format!(
                "Expected {} fields, found {}",
                tags.len(),
                fields.len()
            )));
        }
        fields
            .into_iter()
            .zip(tags.iter())
            .map(|(field, tag)| {
                if !field.quoted && self.na_values.iter().any(|na| na == &field.text) {
                    return Ok(DataValue::Undefined);
                }
                parse_cell(&field.text, *tag)
            })
            .collect()
    }

    fn split_fields(&self, line: &str) -> Vec<RawField> {
        let chars: Vec<char> = line.chars().collect();
        let mut fields = Vec::new();
        let mut pos = 0usize;

        loop {
            if self.skip_initial_space {
                while pos < chars.len() && chars[pos] == ' ' {
                    pos += 1;
                }
            }
            let mut text = String::new();
            let mut quoted = false;
            if pos < chars.len() && chars[pos] == self.quote_char {
                quoted = true;
                pos += 1;
                while pos < chars.len() {
                    let c = chars[pos];
                    if c == self.quote_char {
                        if self.double_quote
                            && pos + 1 < chars.len()
                            && chars[pos + 1] == self.quote_char
                        {
                            text.push(self.quote_char);
                            pos += 2;
                            continue;
                        }
                        pos += 1;
                        break;
                    }
                    if c == self.escape_char && pos + 1 < chars.len() {
                        text.push(unescape(chars[pos + 1]));
                        pos += 2;
                        continue;
                    }
                    text.push(c);
                    pos += 1;
                }
                // stray characters between the closing quote and the
                // delimiter are kept verbatim
                while pos < chars.len() && !self.at_delimiter(&chars, pos) {
                    text.push(chars[pos]);
                    pos += 1;
                }
            } else {
                while pos < chars.len() && !self.at_delimiter(&chars, pos) {
                    let c = chars[pos];
                    if c == self.escape_char && pos + 1 < chars.len() {
                        text.push(unescape(chars[pos + 1]));
                        pos += 2;
                        continue;
                    }
                    text.push(c);
                    pos += 1;
                }
            }
            fields.push(RawField { text, quoted });
            if pos < chars.len() {
                pos += self.delimiter.len();
            } else {
                break;
            }
        }
        fields
    }

    fn at_delimiter(&self, chars: &[char], pos: usize) -> bool {
        if self.delimiter.is_empty() || pos + self.delimiter.len() > chars.len() {
            return false;
        }
        chars[pos..pos + self.delimiter.len()] == self.delimiter[..]
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}
