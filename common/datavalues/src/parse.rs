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

use chrono::DateTime as ChronoDateTime;
use common_exception::ErrorCode;
use common_exception::Result;

use crate::DataValue;
use crate::FlexDateTime;
use crate::TypeId;

/// Parses one CSV cell into a value of the declared tag. The cell arrives
/// already unquoted and unescaped; an empty cell for a non-String tag is
/// Undefined.
pub fn parse_cell(cell: &str, tag: TypeId) -> Result<DataValue> {
    if cell.is_empty() && tag != TypeId::String {
        return Ok(DataValue::Undefined);
    }
    match tag {
        TypeId::String => Ok(DataValue::String(cell.to_string())),
        TypeId::Undefined => Ok(DataValue::Undefined),
        TypeId::Int64 => parse_int(cell).map(DataValue::Int64),
        TypeId::Float64 => parse_float(cell).map(DataValue::Float64),
        TypeId::Vector => parse_vector(cell).map(DataValue::Vector),
        TypeId::List => parse_list(cell).map(DataValue::List),
        TypeId::Dict => parse_dict(cell).map(DataValue::Dict),
        TypeId::DateTime => parse_datetime(cell).map(DataValue::DateTime),
        TypeId::Image => Err(ErrorCode::TypeMismatch(
            "Image cells cannot be parsed from text".to_string(),
        )),
    }
}

fn parse_int(cell: &str) -> Result<i64> {
    let s = cell.trim();
    lexical_core::parse::<i64>(s.as_bytes())
        .map_err(|_| ErrorCode::Parse(format!("Cannot parse \"{}\" as Int64", cell)))
}

fn parse_float(cell: &str) -> Result<f64> {
    let s = cell.trim();
    lexical_core::parse::<f64>(s.as_bytes())
        .map_err(|_| ErrorCode::Parse(format!("Cannot parse \"{}\" as Float64", cell)))
}

fn bracket_body<'a>(cell: &'a str, open: char, close: char) -> Result<&'a str> {
    let s = cell.trim();
    if s.len() < 2 || !s.starts_with(open) || !s.ends_with(close) {
        return Err(ErrorCode::Parse(format!(
            "Expected {}...{} around \"{}\"",
            open, close, cell
        )));
    }
    Ok(&s[open.len_utf8()..s.len() - close.len_utf8()])
}

/// `[1 1 1]`, with spaces, commas or semicolons between elements.
fn parse_vector(cell: &str) -> Result<Vec<f64>> {
    let body = bracket_body(cell, '[', ']')?;
    body.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
        .map(parse_float)
        .collect()
}

/// `[a,b,c]`: elements become Int64/Float64 when they parse as numbers,
/// Strings otherwise. Quoted elements are always Strings.
fn parse_list(cell: &str) -> Result<Vec<DataValue>> {
    let body = bracket_body(cell, '[', ']')?;
    Ok(split_elements(body, ',')
        .into_iter()
        .map(|t| scalar_from_token(&t))
        .collect())
}

/// `{k:v,k:v}` with scalar keys and values.
fn parse_dict(cell: &str) -> Result<Vec<(DataValue, DataValue)>> {
    let body = bracket_body(cell, '{', '}')?;
    let mut out = Vec::new();
    for pair in split_elements(body, ',') {
        let colon = find_outside_quotes(&pair, ':').ok_or_else(|| {
            ErrorCode::Parse(format!("Dict entry \"{}\" is missing ':'", pair))
        })?;
        out.push((
            scalar_from_token(&pair[..colon]),
            scalar_from_token(&pair[colon + 1..]),
        ));
    }
    Ok(out)
}

fn find_outside_quotes(s: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == target => return Some(i),
            None => {}
        }
    }
    None
}

fn parse_datetime(cell: &str) -> Result<FlexDateTime> {
    let s = cell.trim();
    if let Ok(seconds) = s.parse::<i64>() {
        return Ok(FlexDateTime::from_epoch(seconds));
    }
    ChronoDateTime::parse_from_rfc3339(s)
        .map(|dt| FlexDateTime::new(dt.timestamp(), dt.offset().local_minus_utc() / 60))
        .map_err(|_| ErrorCode::Parse(format!("Cannot parse \"{}\" as DateTime", cell)))
}

/// Splits on `sep` outside quotes; quote characters are kept so the caller
/// can still tell quoted tokens apart. All-whitespace unquoted elements are
/// dropped.
fn split_elements(body: &str, sep: char) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in body.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    current.push(c);
                } else if c == sep {
                    out.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
        }
    }
    if !current.is_empty() || !out.is_empty() {
        out.push(current);
    }
    out.retain(|t| !t.trim().is_empty());
    out
}

/// Quoted tokens are always Strings; unquoted tokens become Int64/Float64
/// when they parse as numbers.
fn scalar_from_token(token: &str) -> DataValue {
    let t = token.trim();
    if t.len() >= 2 {
        let first = t.chars().next().unwrap();
        if (first == '"' || first == '\'') && t.ends_with(first) {
            return DataValue::String(t[1..t.len() - 1].to_string());
        }
    }
    if let Ok(v) = t.parse::<i64>() {
        return DataValue::Int64(v);
    }
    if let Ok(v) = t.parse::<f64>() {
        return DataValue::Float64(v);
    }
    DataValue::String(t.to_string())
}
