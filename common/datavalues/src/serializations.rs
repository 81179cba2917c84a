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

use std::io::Read;
use std::io::Write;

use common_exception::Result;
use common_io::prelude::*;

use crate::DataValue;
use crate::FlexDateTime;
use crate::FlexImage;
use crate::TypeId;

impl DataValue {
    /// Framed record: one tag byte, then a tag-specific payload. The framing
    /// is self-delimiting so records can be concatenated in segment files
    /// and in aggregator partial states.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8_value(self.data_type_id().to_u8())?;
        match self {
            DataValue::Undefined => Ok(()),
            DataValue::Int64(v) => w.write_varint(*v),
            DataValue::Float64(v) => w.write_f64_value(*v),
            DataValue::String(v) => w.write_string_value(v),
            DataValue::Vector(v) => {
                w.write_uvarint(v.len() as u64)?;
                for x in v {
                    w.write_f64_value(*x)?;
                }
                Ok(())
            }
            DataValue::List(v) => {
                w.write_uvarint(v.len() as u64)?;
                for x in v {
                    x.write_to(w)?;
                }
                Ok(())
            }
            DataValue::Dict(v) => {
                w.write_uvarint(v.len() as u64)?;
                for (k, val) in v {
                    k.write_to(w)?;
                    val.write_to(w)?;
                }
                Ok(())
            }
            DataValue::DateTime(v) => {
                w.write_varint(v.epoch_sec)?;
                w.write_varint(v.tz_offset_min as i64)
            }
            DataValue::Image(v) => {
                w.write_uvarint(v.width)?;
                w.write_uvarint(v.height)?;
                w.write_uvarint(v.channels)?;
                w.write_binary(&v.data)
            }
        }
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<DataValue> {
        let tag = TypeId::from_u8(r.read_u8_value()?)?;
        Ok(match tag {
            TypeId::Undefined => DataValue::Undefined,
            TypeId::Int64 => DataValue::Int64(r.read_varint()?),
            TypeId::Float64 => DataValue::Float64(r.read_f64_value()?),
            TypeId::String => DataValue::String(r.read_string_value()?),
            TypeId::Vector => {
                let len = r.read_uvarint()? as usize;
                let mut v = Vec::with_capacity(len);
                for _ in 0..len {
                    v.push(r.read_f64_value()?);
                }
                DataValue::Vector(v)
            }
            TypeId::List => {
                let len = r.read_uvarint()? as usize;
                let mut v = Vec::with_capacity(len);
                for _ in 0..len {
                    v.push(DataValue::read_from(r)?);
                }
                DataValue::List(v)
            }
            TypeId::Dict => {
                let len = r.read_uvarint()? as usize;
                let mut v = Vec::with_capacity(len);
                for _ in 0..len {
                    let k = DataValue::read_from(r)?;
                    let val = DataValue::read_from(r)?;
                    v.push((k, val));
                }
                DataValue::Dict(v)
            }
            TypeId::DateTime => {
                let epoch_sec = r.read_varint()?;
                let tz_offset_min = r.read_varint()? as i32;
                DataValue::DateTime(FlexDateTime::new(epoch_sec, tz_offset_min))
            }
            TypeId::Image => {
                let width = r.read_uvarint()?;
                let height = r.read_uvarint()?;
                let channels = r.read_uvarint()?;
                let data = r.read_binary()?;
                DataValue::Image(FlexImage::new(data, width, height, channels))
            }
        })
    }

    /// The framed bytes of a value, used as a stable hashing basis.
    pub fn to_frame_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        self.write_to(&mut buf).unwrap();
        buf
    }
}
