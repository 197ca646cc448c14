// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! PLAIN: fixed-width little-endian for numeric types, `u32` length prefix
//! plus raw bytes for `BYTE_ARRAY`, raw fixed-width bytes for
//! `FIXED_LEN_BYTE_ARRAY` (spec.md §4.2).

use bytes::Bytes;

use crate::basic::Type as PhysicalType;
use crate::basic::Encoding;
use crate::data_type::{ByteArray, Int96};
use crate::encodings::{Decoder, Encoder};
use crate::errors::{malformed_err, Result};
use crate::value::PhysicalValue;

pub struct PlainEncoder {
    physical_type: PhysicalType,
    buffer: Vec<u8>,
}

impl PlainEncoder {
    pub fn new(physical_type: PhysicalType) -> Self {
        PlainEncoder {
            physical_type,
            buffer: Vec::new(),
        }
    }
}

impl Encoder for PlainEncoder {
    fn put(&mut self, values: &[PhysicalValue]) -> Result<()> {
        // BOOLEAN packs 8 values per byte rather than one byte each.
        if self.physical_type == PhysicalType::BOOLEAN {
            encode_booleans(values, &mut self.buffer);
            return Ok(());
        }
        for value in values {
            match value {
                PhysicalValue::Null => {}
                PhysicalValue::Int32(v) => self.buffer.extend_from_slice(&v.to_le_bytes()),
                PhysicalValue::Int64(v) => self.buffer.extend_from_slice(&v.to_le_bytes()),
                PhysicalValue::Int96(v) => {
                    for word in v.data() {
                        self.buffer.extend_from_slice(&word.to_le_bytes());
                    }
                }
                PhysicalValue::Float(v) => self.buffer.extend_from_slice(&v.to_le_bytes()),
                PhysicalValue::Double(v) => self.buffer.extend_from_slice(&v.to_le_bytes()),
                PhysicalValue::ByteArray(b) => {
                    self.buffer
                        .extend_from_slice(&(b.len() as u32).to_le_bytes());
                    self.buffer.extend_from_slice(b.data());
                }
                PhysicalValue::FixedLenByteArray(b) => {
                    self.buffer.extend_from_slice(b.data());
                }
                PhysicalValue::Boolean(_) => unreachable!("handled above"),
            }
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<Vec<u8>> {
        Ok(std::mem::take(&mut self.buffer))
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.buffer.len()
    }

    fn encoding(&self) -> Encoding {
        Encoding::PLAIN
    }
}

fn encode_booleans(values: &[PhysicalValue], out: &mut Vec<u8>) {
    let mut current = 0u8;
    let mut bits = 0u32;
    for value in values {
        let bit = match value {
            PhysicalValue::Boolean(b) => *b,
            PhysicalValue::Null => continue,
            _ => unreachable!("BOOLEAN column received a non-boolean value"),
        };
        if bit {
            current |= 1 << bits;
        }
        bits += 1;
        if bits == 8 {
            out.push(current);
            current = 0;
            bits = 0;
        }
    }
    if bits > 0 {
        out.push(current);
    }
}

pub struct PlainDecoder {
    physical_type: PhysicalType,
    type_length: i32,
    data: Bytes,
    offset: usize,
    num_values: usize,
    consumed: usize,
    bit_offset: usize,
}

impl PlainDecoder {
    pub fn new(physical_type: PhysicalType, type_length: i32) -> Self {
        PlainDecoder {
            physical_type,
            type_length,
            data: Bytes::new(),
            offset: 0,
            num_values: 0,
            consumed: 0,
            bit_offset: 0,
        }
    }
}

impl Decoder for PlainDecoder {
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        self.data = data;
        self.offset = 0;
        self.num_values = num_values;
        self.consumed = 0;
        self.bit_offset = 0;
        Ok(())
    }

    fn get(&mut self, max_values: usize) -> Result<Vec<PhysicalValue>> {
        let remaining = self.num_values - self.consumed;
        let to_read = remaining.min(max_values);
        let mut out = Vec::with_capacity(to_read);
        if self.physical_type == PhysicalType::BOOLEAN {
            for _ in 0..to_read {
                let byte = *self
                    .data
                    .get(self.offset)
                    .ok_or_else(|| malformed_err!("PLAIN boolean data truncated"))?;
                let bit = (byte >> self.bit_offset) & 1 == 1;
                out.push(PhysicalValue::Boolean(bit));
                self.bit_offset += 1;
                if self.bit_offset == 8 {
                    self.bit_offset = 0;
                    self.offset += 1;
                }
            }
            self.consumed += to_read;
            return Ok(out);
        }
        for _ in 0..to_read {
            out.push(self.read_one()?);
        }
        self.consumed += to_read;
        Ok(out)
    }

    fn values_left(&self) -> usize {
        self.num_values - self.consumed
    }
}

impl PlainDecoder {
    fn read_one(&mut self) -> Result<PhysicalValue> {
        let take = |this: &mut Self, n: usize| -> Result<&[u8]> {
            let start = this.offset;
            let end = start + n;
            let slice = this
                .data
                .get(start..end)
                .ok_or_else(|| malformed_err!("PLAIN data truncated"))?;
            this.offset = end;
            Ok(slice)
        };
        Ok(match self.physical_type {
            PhysicalType::INT32 => {
                let b = take(self, 4)?;
                PhysicalValue::Int32(i32::from_le_bytes(b.try_into().unwrap()))
            }
            PhysicalType::INT64 => {
                let b = take(self, 8)?;
                PhysicalValue::Int64(i64::from_le_bytes(b.try_into().unwrap()))
            }
            PhysicalType::INT96 => {
                let b = take(self, 12)?;
                let w = |i: usize| u32::from_le_bytes(b[i * 4..i * 4 + 4].try_into().unwrap());
                PhysicalValue::Int96(Int96::new([w(0), w(1), w(2)]))
            }
            PhysicalType::FLOAT => {
                let b = take(self, 4)?;
                PhysicalValue::Float(f32::from_le_bytes(b.try_into().unwrap()))
            }
            PhysicalType::DOUBLE => {
                let b = take(self, 8)?;
                PhysicalValue::Double(f64::from_le_bytes(b.try_into().unwrap()))
            }
            PhysicalType::BYTE_ARRAY => {
                let len_bytes = take(self, 4)?;
                let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
                let data = take(self, len)?;
                PhysicalValue::ByteArray(ByteArray::from(data))
            }
            PhysicalType::FIXED_LEN_BYTE_ARRAY => {
                let len = self.type_length.max(0) as usize;
                let data = take(self, len)?;
                PhysicalValue::FixedLenByteArray(ByteArray::from(data))
            }
            PhysicalType::BOOLEAN => unreachable!("handled in get()"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int32_round_trips() {
        let mut encoder = PlainEncoder::new(PhysicalType::INT32);
        let values = vec![
            PhysicalValue::Int32(1),
            PhysicalValue::Int32(-5),
            PhysicalValue::Int32(i32::MAX),
        ];
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = PlainDecoder::new(PhysicalType::INT32, -1);
        decoder.set_data(Bytes::from(bytes), 3).unwrap();
        assert_eq!(decoder.get(3).unwrap(), values);
    }

    #[test]
    fn byte_array_round_trips_with_length_prefix() {
        let mut encoder = PlainEncoder::new(PhysicalType::BYTE_ARRAY);
        let values = vec![
            PhysicalValue::ByteArray(ByteArray::from("hello")),
            PhysicalValue::ByteArray(ByteArray::from("")),
            PhysicalValue::ByteArray(ByteArray::from("world!")),
        ];
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = PlainDecoder::new(PhysicalType::BYTE_ARRAY, -1);
        decoder.set_data(Bytes::from(bytes), 3).unwrap();
        assert_eq!(decoder.get(3).unwrap(), values);
    }

    #[test]
    fn booleans_pack_eight_per_byte() {
        let mut encoder = PlainEncoder::new(PhysicalType::BOOLEAN);
        let values: Vec<_> = (0..10)
            .map(|i| PhysicalValue::Boolean(i % 3 == 0))
            .collect();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        assert_eq!(bytes.len(), 2);
        let mut decoder = PlainDecoder::new(PhysicalType::BOOLEAN, -1);
        decoder.set_data(Bytes::from(bytes), 10).unwrap();
        assert_eq!(decoder.get(10).unwrap(), values);
    }
}
