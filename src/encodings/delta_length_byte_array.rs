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

//! DELTA_LENGTH_BYTE_ARRAY (spec.md §4.2): lengths as DELTA_BINARY_PACKED
//! INT32, followed by the concatenated raw bytes, no per-value delimiter.

use bytes::Bytes;

use crate::basic::Encoding;
use crate::data_type::ByteArray;
use crate::encodings::delta_binary_packed::{DeltaBinaryPackedDecoder, DeltaBinaryPackedEncoder};
use crate::encodings::{Decoder, Encoder};
use crate::errors::{malformed_err, unsupported_err, Result};
use crate::value::PhysicalValue;

pub struct DeltaLengthByteArrayEncoder {
    lengths: DeltaBinaryPackedEncoder,
    data: Vec<u8>,
}

impl DeltaLengthByteArrayEncoder {
    pub fn new() -> Self {
        DeltaLengthByteArrayEncoder {
            lengths: DeltaBinaryPackedEncoder::new(crate::basic::Type::INT32)
                .expect("INT32 is always supported"),
            data: Vec::new(),
        }
    }
}

impl Default for DeltaLengthByteArrayEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for DeltaLengthByteArrayEncoder {
    fn put(&mut self, values: &[PhysicalValue]) -> Result<()> {
        for value in values {
            let bytes = match value {
                PhysicalValue::Null => continue,
                PhysicalValue::ByteArray(b) | PhysicalValue::FixedLenByteArray(b) => b,
                other => {
                    return Err(unsupported_err!(
                        "DELTA_LENGTH_BYTE_ARRAY received a non-byte-array value: {:?}",
                        other
                    ))
                }
            };
            self.lengths
                .put(&[PhysicalValue::Int32(bytes.len() as i32)])?;
            self.data.extend_from_slice(bytes.data());
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<Vec<u8>> {
        let mut out = self.lengths.flush_buffer()?;
        out.extend(std::mem::take(&mut self.data));
        Ok(out)
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.data.len()
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_LENGTH_BYTE_ARRAY
    }
}

pub struct DeltaLengthByteArrayDecoder {
    values: std::vec::IntoIter<ByteArray>,
}

impl DeltaLengthByteArrayDecoder {
    pub fn new() -> Self {
        DeltaLengthByteArrayDecoder {
            values: Vec::new().into_iter(),
        }
    }
}

impl Default for DeltaLengthByteArrayDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DeltaLengthByteArrayDecoder {
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        let mut length_decoder =
            DeltaBinaryPackedDecoder::new(crate::basic::Type::INT32).expect("always supported");
        length_decoder.set_data(data.clone(), num_values)?;
        let lengths = length_decoder.get(num_values)?;
        let lengths: Vec<usize> = lengths
            .into_iter()
            .map(|v| match v {
                PhysicalValue::Int32(n) => Ok(n as usize),
                _ => Err(malformed_err!("expected INT32 length")),
            })
            .collect::<Result<_>>()?;
        let mut offset = length_decoder.bytes_consumed();
        let mut values = Vec::with_capacity(lengths.len());
        for len in lengths {
            let end = offset + len;
            let slice = data
                .get(offset..end)
                .ok_or_else(|| malformed_err!("DELTA_LENGTH_BYTE_ARRAY data truncated"))?;
            values.push(ByteArray::from(slice));
            offset = end;
        }
        self.values = values.into_iter();
        Ok(())
    }

    fn get(&mut self, max_values: usize) -> Result<Vec<PhysicalValue>> {
        let mut out = Vec::with_capacity(max_values);
        for _ in 0..max_values {
            let Some(v) = self.values.next() else { break };
            out.push(PhysicalValue::ByteArray(v));
        }
        Ok(out)
    }

    fn values_left(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_and_bytes_round_trip() {
        let values = vec![
            PhysicalValue::ByteArray(ByteArray::from("a")),
            PhysicalValue::ByteArray(ByteArray::from("bcd")),
            PhysicalValue::ByteArray(ByteArray::from("")),
            PhysicalValue::ByteArray(ByteArray::from("longer string here")),
        ];
        let mut encoder = DeltaLengthByteArrayEncoder::new();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = DeltaLengthByteArrayDecoder::new();
        decoder.set_data(Bytes::from(bytes), values.len()).unwrap();
        assert_eq!(decoder.get(values.len()).unwrap(), values);
    }
}
