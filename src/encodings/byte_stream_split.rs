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

//! BYTE_STREAM_SPLIT (spec.md §4.2): fixed-width values transposed into one
//! stream per byte offset (all byte 0s, then all byte 1s, ...), which lets a
//! downstream general-purpose compressor exploit cross-value correlation in
//! floating point mantissas/exponents.

use bytes::Bytes;

use crate::basic::Encoding;
use crate::basic::Type as PhysicalType;
use crate::data_type::ByteArray;
use crate::encodings::{Decoder, Encoder};
use crate::errors::{malformed_err, unsupported_err, Result};
use crate::value::PhysicalValue;

fn width_of(physical_type: PhysicalType, type_length: i32) -> Result<usize> {
    Ok(match physical_type {
        PhysicalType::INT32 | PhysicalType::FLOAT => 4,
        PhysicalType::INT64 | PhysicalType::DOUBLE => 8,
        PhysicalType::FIXED_LEN_BYTE_ARRAY if type_length > 0 => type_length as usize,
        other => {
            return Err(unsupported_err!(
                "BYTE_STREAM_SPLIT does not support {:?}",
                other
            ))
        }
    })
}

fn value_bytes(value: &PhysicalValue) -> Option<Vec<u8>> {
    Some(match value {
        PhysicalValue::Null => return None,
        PhysicalValue::Int32(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Int64(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Float(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Double(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::FixedLenByteArray(b) => b.data().to_vec(),
        _ => return None,
    })
}

pub struct ByteStreamSplitEncoder {
    physical_type: PhysicalType,
    width: usize,
    rows: Vec<Vec<u8>>,
}

impl ByteStreamSplitEncoder {
    pub fn new(physical_type: PhysicalType, type_length: i32) -> Result<Self> {
        let width = width_of(physical_type, type_length)?;
        Ok(ByteStreamSplitEncoder {
            physical_type,
            width,
            rows: Vec::new(),
        })
    }
}

impl Encoder for ByteStreamSplitEncoder {
    fn put(&mut self, values: &[PhysicalValue]) -> Result<()> {
        for value in values {
            let Some(bytes) = value_bytes(value) else {
                continue;
            };
            if bytes.len() != self.width {
                return Err(unsupported_err!(
                    "BYTE_STREAM_SPLIT received a {}-byte value for {:?} (expected {})",
                    bytes.len(),
                    self.physical_type,
                    self.width
                ));
            }
            self.rows.push(bytes);
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<Vec<u8>> {
        let rows = std::mem::take(&mut self.rows);
        let mut out = vec![0u8; rows.len() * self.width];
        for (row_idx, row) in rows.iter().enumerate() {
            for (byte_idx, byte) in row.iter().enumerate() {
                out[byte_idx * rows.len() + row_idx] = *byte;
            }
        }
        Ok(out)
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.rows.len() * self.width
    }

    fn encoding(&self) -> Encoding {
        Encoding::BYTE_STREAM_SPLIT
    }
}

pub struct ByteStreamSplitDecoder {
    physical_type: PhysicalType,
    width: usize,
    data: Bytes,
    num_values: usize,
    consumed: usize,
}

impl ByteStreamSplitDecoder {
    pub fn new(physical_type: PhysicalType, type_length: i32) -> Result<Self> {
        let width = width_of(physical_type, type_length)?;
        Ok(ByteStreamSplitDecoder {
            physical_type,
            width,
            data: Bytes::new(),
            num_values: 0,
            consumed: 0,
        })
    }
}

impl Decoder for ByteStreamSplitDecoder {
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        if data.len() != num_values * self.width {
            return Err(malformed_err!(
                "BYTE_STREAM_SPLIT data length {} does not match {} values of width {}",
                data.len(),
                num_values,
                self.width
            ));
        }
        self.data = data;
        self.num_values = num_values;
        self.consumed = 0;
        Ok(())
    }

    fn get(&mut self, max_values: usize) -> Result<Vec<PhysicalValue>> {
        let to_read = (self.num_values - self.consumed).min(max_values);
        let mut out = Vec::with_capacity(to_read);
        for i in self.consumed..self.consumed + to_read {
            let mut bytes = vec![0u8; self.width];
            for (byte_idx, slot) in bytes.iter_mut().enumerate() {
                *slot = self.data[byte_idx * self.num_values + i];
            }
            out.push(match self.physical_type {
                PhysicalType::INT32 => PhysicalValue::Int32(i32::from_le_bytes(
                    bytes[..4].try_into().unwrap(),
                )),
                PhysicalType::INT64 => PhysicalValue::Int64(i64::from_le_bytes(
                    bytes[..8].try_into().unwrap(),
                )),
                PhysicalType::FLOAT => PhysicalValue::Float(f32::from_le_bytes(
                    bytes[..4].try_into().unwrap(),
                )),
                PhysicalType::DOUBLE => PhysicalValue::Double(f64::from_le_bytes(
                    bytes[..8].try_into().unwrap(),
                )),
                PhysicalType::FIXED_LEN_BYTE_ARRAY => {
                    PhysicalValue::FixedLenByteArray(ByteArray::from(bytes))
                }
                other => {
                    return Err(unsupported_err!(
                        "BYTE_STREAM_SPLIT does not support {:?}",
                        other
                    ))
                }
            });
        }
        self.consumed += to_read;
        Ok(out)
    }

    fn values_left(&self) -> usize {
        self.num_values - self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_round_trip_through_transposed_streams() {
        let values = vec![
            PhysicalValue::Double(1.5),
            PhysicalValue::Double(-2.25),
            PhysicalValue::Double(std::f64::consts::PI),
        ];
        let mut encoder = ByteStreamSplitEncoder::new(PhysicalType::DOUBLE, -1).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        assert_eq!(bytes.len(), values.len() * 8);
        let mut decoder = ByteStreamSplitDecoder::new(PhysicalType::DOUBLE, -1).unwrap();
        decoder.set_data(Bytes::from(bytes), values.len()).unwrap();
        assert_eq!(decoder.get(values.len()).unwrap(), values);
    }

    #[test]
    fn floats_round_trip() {
        let values = vec![
            PhysicalValue::Float(0.0),
            PhysicalValue::Float(-1.0),
            PhysicalValue::Float(123.456),
        ];
        let mut encoder = ByteStreamSplitEncoder::new(PhysicalType::FLOAT, -1).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = ByteStreamSplitDecoder::new(PhysicalType::FLOAT, -1).unwrap();
        decoder.set_data(Bytes::from(bytes), values.len()).unwrap();
        assert_eq!(decoder.get(values.len()).unwrap(), values);
    }
}
