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

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use common_base::cancel;
use common_base::runtime::parallel_map;
use common_base::runtime::pool_size;
use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;
use flate2::read::GzDecoder;
use tracing::info;
use tracing::warn;

use super::options::CsvReadOptions;
use super::options::HINT_ALL_COLUMNS;
use super::tokenizer::CsvTokenizer;
use crate::config::config;
use crate::storages::column::Column;
use crate::storages::column::ColumnWriter;
use crate::storages::frame::Frame;
use crate::storages::frame::FrameSegmentWriter;
use crate::storages::frame::FrameWriter;

pub struct CsvReadResult {
    pub frame: Frame,
    /// One raw-line error column per input file, when `store_errors` is on.
    pub errors: Vec<(String, Column)>,
    pub num_rows: u64,
    pub num_failures: u64,
}

impl std::fmt::Debug for CsvReadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvReadResult")
            .field("num_rows", &self.num_rows)
            .field("num_failures", &self.num_failures)
            .finish()
    }
}

/// Parses one or many (globbable, optionally gzipped) CSV inputs into a
/// frame, with the schema discovered from the first file.
pub fn read_csv(inputs: &[&str], options: &CsvReadOptions) -> Result<CsvReadResult> {
    let files = expand_inputs(inputs)?;
    let tokenizer = CsvTokenizer::new(options);

    let first_line = read_first_data_line(&files[0], &tokenizer)?.ok_or_else(|| {
        ErrorCode::Parse(format!("{:?} has no data lines", files[0]))
    })?;
    let first_tokens = tokenizer.tokenize(&first_line);
    let ncols = first_tokens.len();
    if ncols == 0 {
        return Err(ErrorCode::Parse("First line is empty".to_string()));
    }
    let names = if options.use_header {
        let mut names = first_tokens;
        make_unique_column_names(&mut names);
        names
    } else {
        (1..=ncols).map(|i| format!("X{}", i)).collect()
    };
    let tags = resolve_column_types(&names, ncols, options)?;

    let num_segments = config().default_segments().max(1);
    let mut writer = FrameWriter::create(&names, &tags, num_segments)?;
    let mut segment_writers = writer.segment_writers()?;

    let total_bytes: u64 = files
        .iter()
        .map(|f| std::fs::metadata(f).map(|m| m.len()).unwrap_or(0))
        .sum();

    let mut state = IngestState {
        options: options.clone(),
        tokenizer,
        tags,
        num_segments,
        total_bytes,
        cumulative_bytes: 0,
        current_segment: 0,
        accepted: 0,
        failures: 0,
    };
    let mut errors = Vec::new();

    for path in &files {
        cancel::check_cancelled()?;
        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if state.limit_reached() {
            break;
        }

        // A file whose leading line disagrees with the discovered column
        // count is dropped entirely, unless errors are being stored, in
        // which case its rows flow through the normal error path.
        if !options.store_errors {
            if let Some(line) = read_first_data_line(path, &state.tokenizer)? {
                let found = state.tokenizer.tokenize(&line).len();
                if found != ncols {
                    warn!(
                        "skipping {:?}: {} columns where {} were expected",
                        path, found, ncols
                    );
                    state.cumulative_bytes += file_size;
                    continue;
                }
            }
        }

        let file_errors = parse_one_file(path, &mut state, &mut segment_writers)?;
        state.cumulative_bytes += file_size;
        if options.store_errors {
            errors.push((
                path.to_string_lossy().to_string(),
                build_error_column(file_errors)?,
            ));
        }
    }

    let frame = writer.close(segment_writers)?;
    info!(
        "csv ingest: {} rows, {} failed lines, {} files",
        state.accepted,
        state.failures,
        files.len()
    );
    Ok(CsvReadResult {
        frame,
        errors,
        num_rows: state.accepted,
        num_failures: state.failures,
    })
}

struct IngestState {
    options: CsvReadOptions,
    tokenizer: CsvTokenizer,
    tags: Vec<TypeId>,
    num_segments: usize,
    total_bytes: u64,
    cumulative_bytes: u64,
    current_segment: usize,
    accepted: u64,
    failures: u64,
}

impl IngestState {
    fn limit_reached(&self) -> bool {
        self.options.row_limit > 0 && self.accepted >= self.options.row_limit
    }

    /// Output segment by cumulative byte position: monotone, capped at the
    /// last segment.
    fn pick_segment(&mut self, bytes_into_file: u64) {
        if self.total_bytes == 0 {
            return;
        }
        let pos = self.cumulative_bytes + bytes_into_file;
        let next = ((pos * self.num_segments as u64) / self.total_bytes) as usize;
        self.current_segment = self
            .current_segment
            .max(next.min(self.num_segments - 1));
    }
}

fn expand_inputs(inputs: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.contains('*') || input.contains('?') || input.contains('[') {
            let matched = glob::glob(input)
                .map_err(|e| ErrorCode::InvalidArgument(format!("Bad glob {}: {}", input, e)))?;
            let mut paths: Vec<PathBuf> = matched
                .filter_map(|entry| entry.ok())
                .filter(|p| p.is_file())
                .collect();
            paths.sort();
            files.extend(paths);
        } else {
            files.push(PathBuf::from(input));
        }
    }
    if files.is_empty() {
        return Err(ErrorCode::NotFound(format!(
            "No input files match {:?}",
            inputs
        )));
    }
    Ok(files)
}

fn open_input(path: &Path) -> Result<Box<dyn Read + Send>> {
    let file = File::open(path)
        .map_err(|e| ErrorCode::from(e).add_message(format!("Cannot open {:?}", path)))?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// The first non-empty non-comment line, for schema discovery and the
/// header-mismatch check.
fn read_first_data_line(path: &Path, tokenizer: &CsvTokenizer) -> Result<Option<String>> {
    let mut reader = open_input(path)?;
    let mut carry = Vec::new();
    loop {
        match take_line(&mut carry) {
            Some(line) => {
                let line = String::from_utf8_lossy(&line).to_string();
                if !tokenizer.is_skippable(&line) {
                    return Ok(Some(line));
                }
            }
            None => {
                let mut chunk = [0u8; 65536];
                let n = reader.read(&mut chunk)?;
                if n == 0 {
                    // whatever is left has no line ending
                    if carry.is_empty() {
                        return Ok(None);
                    }
                    let line = String::from_utf8_lossy(&carry).to_string();
                    return Ok(if tokenizer.is_skippable(&line) {
                        None
                    } else {
                        Some(line)
                    });
                }
                carry.extend_from_slice(&chunk[..n]);
            }
        }
    }
}

/// Pops one full line (any of `\n`, `\r`, `\r\n`) off the front of `buf`,
/// or `None` when no terminator is buffered yet.
fn take_line(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buf.iter().position(|b| *b == b'\n' || *b == b'\r')?;
    let line = buf[..pos].to_vec();
    let mut cut = pos + 1;
    if buf[pos] == b'\r' && buf.get(cut) == Some(&b'\n') {
        cut += 1;
    }
    buf.drain(..cut);
    Some(line)
}

fn resolve_column_types(
    names: &[String],
    ncols: usize,
    options: &CsvReadOptions,
) -> Result<Vec<TypeId>> {
    let hints = &options.column_type_hints;
    if let Some(tag) = hints.get(HINT_ALL_COLUMNS) {
        return Ok(vec![*tag; ncols]);
    }
    if hints.contains_key("__X0__") {
        if hints.len() != ncols {
            return Err(ErrorCode::InvalidArgument(format!(
                "{} positional type hints for {} columns",
                hints.len(),
                ncols
            )));
        }
        return (0..ncols)
            .map(|i| {
                hints.get(&format!("__X{}__", i)).copied().ok_or_else(|| {
                    ErrorCode::InvalidArgument(format!("Missing positional hint __X{}__", i))
                })
            })
            .collect();
    }
    let mut used: BTreeSet<&str> = BTreeSet::new();
    let tags = names
        .iter()
        .map(|name| match hints.get(name) {
            Some(tag) => {
                used.insert(name.as_str());
                *tag
            }
            None => TypeId::String,
        })
        .collect();
    for key in hints.keys() {
        if !used.contains(key.as_str()) {
            warn!("column type hint \"{}\" was not used", key);
        }
    }
    Ok(tags)
}

/// Duplicate names get `.1`, `.2`, ... suffixes, skipping suffixes that are
/// already taken: `{A, A, A.1}` becomes `{A, A.2, A.1}`.
pub fn make_unique_column_names(names: &mut [String]) {
    let mut accepted: BTreeSet<String> = BTreeSet::new();
    for i in 0..names.len() {
        if accepted.contains(&names[i]) {
            let all: BTreeSet<String> = names.iter().cloned().collect();
            let mut number = 1;
            loop {
                let candidate = format!("{}.{}", names[i], number);
                if !all.contains(&candidate) && !accepted.contains(&candidate) {
                    names[i] = candidate;
                    break;
                }
                number += 1;
            }
        }
        accepted.insert(names[i].clone());
    }
}

struct ParsedChunk {
    rows: Vec<Vec<DataValue>>,
    errors: Vec<String>,
    failures: u64,
}

/// Parses one file through the buffered, multi-threaded tokenize loop,
/// appending accepted rows to the currently selected output segment.
fn parse_one_file(
    path: &Path,
    state: &mut IngestState,
    segment_writers: &mut [FrameSegmentWriter],
) -> Result<Vec<String>> {
    let mut reader = open_input(path)?;
    let mut carry: Vec<u8> = Vec::new();
    let mut file_errors: Vec<String> = Vec::new();
    let mut bytes_into_file = 0u64;

    if state.options.use_header {
        consume_header_line(&mut reader, &mut carry, &state.tokenizer)?;
    }

    let buffer_size = config().csv_read_buffer_size.max(4096);
    loop {
        cancel::check_cancelled()?;
        if state.limit_reached() {
            break;
        }

        let mut chunk = vec![0u8; buffer_size];
        let mut filled = 0;
        while filled < buffer_size {
            let n = reader.read(&mut chunk[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        chunk.truncate(filled);
        let eof = filled == 0;
        bytes_into_file += filled as u64;

        let mut buffer = std::mem::take(&mut carry);
        buffer.extend_from_slice(&chunk);
        drop(chunk);
        if buffer.is_empty() {
            break;
        }

        // keep the trailing partial line for the next round
        let parse_len = if eof {
            buffer.len()
        } else {
            match buffer.iter().rposition(|b| *b == b'\n' || *b == b'\r') {
                Some(pos) => pos + 1,
                None => {
                    carry = buffer;
                    continue;
                }
            }
        };
        carry = buffer.split_off(parse_len);

        let parsed = parse_buffer_parallel(Arc::new(buffer), state)?;
        state.failures += parsed.iter().map(|p| p.failures).sum::<u64>();

        state.pick_segment(bytes_into_file.saturating_sub(carry.len() as u64));
        let writer = &mut segment_writers[state.current_segment];
        'write: for chunk in parsed {
            for row in &chunk.rows {
                if state.limit_reached() {
                    break 'write;
                }
                writer.write_row(row)?;
                state.accepted += 1;
            }
            file_errors.extend(chunk.errors);
        }

        if eof {
            break;
        }
    }
    Ok(file_errors)
}

/// Drops the first non-skippable line of the stream.
fn consume_header_line(
    reader: &mut Box<dyn Read + Send>,
    carry: &mut Vec<u8>,
    tokenizer: &CsvTokenizer,
) -> Result<()> {
    loop {
        match take_line(carry) {
            Some(line) => {
                let line = String::from_utf8_lossy(&line).to_string();
                if !tokenizer.is_skippable(&line) {
                    return Ok(());
                }
            }
            None => {
                let mut chunk = [0u8; 65536];
                let n = reader.read(&mut chunk)?;
                if n == 0 {
                    return Ok(());
                }
                carry.extend_from_slice(&chunk[..n]);
            }
        }
    }
}

/// Slices the buffer into one byte range per worker. Every worker except
/// the first advances its start past the first line boundary inside its
/// slice; every worker extends its end to the line boundary at or after
/// its slice end, so each line is parsed exactly once.
fn parse_buffer_parallel(buffer: Arc<Vec<u8>>, state: &IngestState) -> Result<Vec<ParsedChunk>> {
    let nthreads = pool_size().max(1);
    let tokenizer = state.tokenizer.clone();
    let tags = state.tags.clone();
    let continue_on_failure = state.options.continue_on_failure;
    let store_errors = state.options.store_errors;
    let failures_seen = state.failures;

    parallel_map(nthreads, move |tid| {
        let buf = buffer.as_slice();
        let step = (buf.len() / nthreads).max(1);
        let mut start = tid * step;
        let mut end = if tid == nthreads - 1 {
            buf.len()
        } else {
            (tid + 1) * step
        };
        if start >= buf.len() {
            return Ok(ParsedChunk {
                rows: vec![],
                errors: vec![],
                failures: 0,
            });
        }

        if tid > 0 {
            match find_line_start(buf, start, end) {
                Some(adjusted) => start = adjusted,
                None => {
                    return Ok(ParsedChunk {
                        rows: vec![],
                        errors: vec![],
                        failures: 0,
                    });
                }
            }
        }
        if tid != nthreads - 1 {
            end = match find_line_start(buf, end, buf.len()) {
                Some(adjusted) => adjusted,
                None => buf.len(),
            };
        }

        let mut chunk = ParsedChunk {
            rows: vec![],
            errors: vec![],
            failures: 0,
        };
        let mut pos = start;
        while pos < end {
            let (line_start, line_end, next) = next_line(buf, pos, end);
            pos = next;
            let line = match std::str::from_utf8(&buf[line_start..line_end]) {
                Ok(line) => line,
                Err(_) => {
                    record_failure(
                        &mut chunk,
                        String::from_utf8_lossy(&buf[line_start..line_end]).to_string(),
                        continue_on_failure,
                        store_errors,
                        failures_seen,
                    )?;
                    continue;
                }
            };
            if tokenizer.is_skippable(line) {
                continue;
            }
            match tokenizer.parse_line(line, &tags) {
                Ok(row) => chunk.rows.push(row),
                Err(_) => {
                    record_failure(
                        &mut chunk,
                        line.to_string(),
                        continue_on_failure,
                        store_errors,
                        failures_seen,
                    )?;
                }
            }
        }
        Ok(chunk)
    })
}

fn record_failure(
    chunk: &mut ParsedChunk,
    line: String,
    continue_on_failure: bool,
    store_errors: bool,
    failures_seen: u64,
) -> Result<()> {
    if store_errors {
        chunk.errors.push(line.clone());
    }
    if continue_on_failure {
        if failures_seen + chunk.failures < 10 {
            warn!("unable to parse line \"{}\"", line.trim_end());
        }
        chunk.failures += 1;
        Ok(())
    } else {
        Err(ErrorCode::Parse(format!(
            "Unable to parse line \"{}\"",
            line.trim_end()
        )))
    }
}

/// The position just past the first line boundary in `[from, limit)`, or
/// `None` when the range holds no boundary.
fn find_line_start(buf: &[u8], from: usize, limit: usize) -> Option<usize> {
    let mut pos = from;
    while pos < limit && buf[pos] != b'\n' && buf[pos] != b'\r' {
        pos += 1;
    }
    if pos >= limit {
        return None;
    }
    let mut adjusted = pos + 1;
    if buf[pos] == b'\r' && adjusted < buf.len() && buf[adjusted] == b'\n' {
        adjusted += 1;
    }
    Some(adjusted)
}

/// One line starting at `pos`: `(start, end_of_content, next_pos)`.
fn next_line(buf: &[u8], pos: usize, end: usize) -> (usize, usize, usize) {
    let mut cursor = pos;
    while cursor < end && buf[cursor] != b'\n' && buf[cursor] != b'\r' {
        cursor += 1;
    }
    let content_end = cursor;
    let mut next = cursor.saturating_add(1).min(end);
    if cursor < end && buf[cursor] == b'\r' && next < end && buf[next] == b'\n' {
        next += 1;
    }
    (pos, content_end, next)
}

fn build_error_column(lines: Vec<String>) -> Result<Column> {
    let mut writer = ColumnWriter::create(TypeId::String, 1)?;
    let mut segments = writer.segment_writers()?;
    for line in lines {
        segments[0].push(&DataValue::String(line))?;
    }
    writer.close(segments)
}
