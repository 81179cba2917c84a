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

use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use common_datavalues::DataValue;
use common_exception::Result;

use super::options::CsvWriteOptions;
use crate::config::config;
use crate::storages::frame::Frame;

/// Streams a frame out as CSV, column order preserved.
pub fn write_csv<W: Write>(frame: &Frame, out: &mut W, options: &CsvWriteOptions) -> Result<()> {
    if options.header {
        let names = frame.column_names();
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                write!(out, "{}", options.delimiter)?;
            }
            // header names are quoted only when their content demands it
            write_field(out, name, false, options)?;
        }
        writeln!(out)?;
    }

    let mut scan = frame.clone();
    scan.begin_iterator()?;
    let batch = config().read_batch_size;
    loop {
        let rows = scan.next_batch(batch)?;
        if rows.is_empty() {
            break;
        }
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(out, "{}", options.delimiter)?;
                }
                let is_string = matches!(cell, DataValue::String(_));
                write_field(out, &cell.to_string(), is_string, options)?;
            }
            writeln!(out)?;
        }
        if rows.len() < batch {
            break;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv_to_path(frame: &Frame, path: &Path, options: &CsvWriteOptions) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_csv(frame, &mut writer, options)
}

fn write_field<W: Write>(
    out: &mut W,
    field: &str,
    is_string: bool,
    options: &CsvWriteOptions,
) -> Result<()> {
    let must_quote = field.contains(options.delimiter)
        || field.contains(options.quote_char)
        || field.contains('\n')
        || field.contains('\r')
        || (is_string && options.use_quote_char);
    if !must_quote {
        write!(out, "{}", field)?;
        return Ok(());
    }
    write!(out, "{}", options.quote_char)?;
    for c in field.chars() {
        if c == options.quote_char {
            if options.double_quote {
                write!(out, "{}{}", options.quote_char, options.quote_char)?;
            } else {
                write!(out, "{}{}", options.escape_char, options.quote_char)?;
            }
        } else {
            write!(out, "{}", c)?;
        }
    }
    write!(out, "{}", options.quote_char)?;
    Ok(())
}
