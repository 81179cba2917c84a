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

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::ErrorCode;
use common_exception::Result;
use common_io::prelude::*;

pub(crate) const SEGMENT_MAGIC: &[u8; 4] = b"SSEG";
pub(crate) const SEGMENT_VERSION: u8 = 1;
/// magic + version + tag byte.
pub(crate) const SEGMENT_HEADER_LEN: u64 = 6;
/// tag byte + 8 payload bytes.
pub(crate) const FIXED_RECORD_LEN: u64 = 9;

/// Int64/Float64 columns use fixed nine-byte records, which makes range
/// seeks pure arithmetic. Undefined slots keep the fixed width with a zero
/// payload.
pub(crate) fn is_fixed_width(tag: TypeId) -> bool {
    tag.is_numeric()
}

pub(crate) fn write_segment_header<W: Write>(w: &mut W, tag: TypeId) -> Result<()> {
    w.write_all(SEGMENT_MAGIC)?;
    w.write_u8_value(SEGMENT_VERSION)?;
    w.write_u8_value(tag.to_u8())?;
    Ok(())
}

pub(crate) fn write_record<W: Write>(w: &mut W, v: &DataValue, fixed: bool) -> Result<()> {
    if !fixed {
        return v.write_to(w);
    }
    match v {
        DataValue::Int64(x) => {
            w.write_u8_value(TypeId::Int64.to_u8())?;
            w.write_i64_le(*x)
        }
        DataValue::Float64(x) => {
            w.write_u8_value(TypeId::Float64.to_u8())?;
            w.write_all(&x.to_le_bytes())?;
            Ok(())
        }
        DataValue::Undefined => {
            w.write_u8_value(TypeId::Undefined.to_u8())?;
            w.write_all(&[0u8; 8])?;
            Ok(())
        }
        other => Err(ErrorCode::TypeMismatch(format!(
            "Fixed-width segment cannot hold {}",
            other.data_type_id()
        ))),
    }
}

pub(crate) fn read_record<R: Read>(r: &mut R, fixed: bool) -> Result<DataValue> {
    if !fixed {
        return DataValue::read_from(r);
    }
    let mut buf = [0u8; 9];
    r.read_exact(&mut buf)?;
    let payload: [u8; 8] = buf[1..9].try_into().unwrap();
    match TypeId::from_u8(buf[0])? {
        TypeId::Int64 => Ok(DataValue::Int64(i64::from_le_bytes(payload))),
        TypeId::Float64 => Ok(DataValue::Float64(f64::from_le_bytes(payload))),
        TypeId::Undefined => Ok(DataValue::Undefined),
        other => Err(ErrorCode::Parse(format!(
            "Unexpected tag {} in fixed-width segment",
            other
        ))),
    }
}

/// Sequential decoder over one closed segment file.
pub struct SegmentScanner {
    reader: BufReader<File>,
    fixed: bool,
    remaining: u64,
}

impl SegmentScanner {
    pub fn open(path: &Path, tag: TypeId, length: u64) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| ErrorCode::Io(format!("Cannot open segment {:?}: {}", path, e)))?;
        let mut reader = BufReader::new(file);
        let mut header = [0u8; SEGMENT_HEADER_LEN as usize];
        reader.read_exact(&mut header)?;
        if &header[0..4] != SEGMENT_MAGIC || header[4] != SEGMENT_VERSION {
            return Err(ErrorCode::BadArchive(format!(
                "Segment {:?} has a malformed header",
                path
            )));
        }
        if header[5] != tag.to_u8() {
            return Err(ErrorCode::BadArchive(format!(
                "Segment {:?} tag does not match the column index",
                path
            )));
        }
        Ok(Self {
            reader,
            fixed: is_fixed_width(tag),
            remaining: length,
        })
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Appends up to `k` records to `out`; returns how many were read.
    pub fn read_into(&mut self, k: usize, out: &mut Vec<DataValue>) -> Result<usize> {
        let n = (k as u64).min(self.remaining) as usize;
        for _ in 0..n {
            out.push(read_record(&mut self.reader, self.fixed)?);
        }
        self.remaining -= n as u64;
        Ok(n)
    }

    /// Discards up to `k` records; a seek for fixed-width segments.
    pub fn skip(&mut self, k: usize) -> Result<usize> {
        let n = (k as u64).min(self.remaining);
        if self.fixed {
            self.reader
                .seek(SeekFrom::Current((n * FIXED_RECORD_LEN) as i64))?;
        } else {
            for _ in 0..n {
                read_record(&mut self.reader, self.fixed)?;
            }
        }
        self.remaining -= n;
        Ok(n as usize)
    }
}
