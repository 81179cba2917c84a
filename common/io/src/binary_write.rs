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

use std::io::Write;

use common_exception::Result;

/// Framed little-endian primitives shared by segment records, index headers
/// and aggregator partial states.
pub trait BinaryWrite: Write {
    fn write_u8_value(&mut self, v: u8) -> Result<()> {
        self.write_all(&[v])?;
        Ok(())
    }

    fn write_bool_value(&mut self, v: bool) -> Result<()> {
        self.write_u8_value(u8::from(v))
    }

    /// LEB128 unsigned varint.
    fn write_uvarint(&mut self, mut v: u64) -> Result<()> {
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            self.write_all(&[byte])?;
            if v == 0 {
                return Ok(());
            }
        }
    }

    /// Zigzag-encoded signed varint.
    fn write_varint(&mut self, v: i64) -> Result<()> {
        self.write_uvarint(((v << 1) ^ (v >> 63)) as u64)
    }

    fn write_f64_value(&mut self, v: f64) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_i64_le(&mut self, v: i64) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    /// Length-prefixed raw bytes.
    fn write_binary(&mut self, v: &[u8]) -> Result<()> {
        self.write_uvarint(v.len() as u64)?;
        self.write_all(v)?;
        Ok(())
    }

    fn write_string_value(&mut self, v: &str) -> Result<()> {
        self.write_binary(v.as_bytes())
    }
}

impl<W: Write + ?Sized> BinaryWrite for W {}
