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
use std::io::Write;
use std::path::Path;

use common_exception::ErrorCode;
use common_exception::Result;

/// Writes a single `[metadata]` section. Keys are sorted for stable output.
pub(crate) fn write_metadata_ini(path: &Path, metadata: &BTreeMap<String, String>) -> Result<()> {
    let mut out = Vec::new();
    writeln!(out, "[metadata]").and_then(|_| {
        for (k, v) in metadata {
            writeln!(out, "{}={}", k, v)?;
        }
        Ok(())
    })?;
    std::fs::write(path, out)?;
    Ok(())
}

/// Reads the `[metadata]` section of an archive ini. Unknown sections are
/// ignored; malformed lines fail.
pub(crate) fn read_metadata_ini(path: &Path) -> Result<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ErrorCode::BadArchive(format!("Cannot read {:?}: {}", path, e)))?;
    let mut metadata = BTreeMap::new();
    let mut in_metadata = false;
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            if !line.ends_with(']') {
                return Err(ErrorCode::BadArchive(format!(
                    "Malformed section header at line {} of {:?}",
                    lineno + 1,
                    path
                )));
            }
            in_metadata = line == "[metadata]";
            continue;
        }
        if !in_metadata {
            continue;
        }
        match line.split_once('=') {
            Some((k, v)) => {
                metadata.insert(k.trim().to_string(), v.trim().to_string());
            }
            None => {
                return Err(ErrorCode::BadArchive(format!(
                    "Expected key=value at line {} of {:?}",
                    lineno + 1,
                    path
                )));
            }
        }
    }
    Ok(metadata)
}
