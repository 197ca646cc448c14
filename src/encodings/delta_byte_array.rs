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

//! DELTA_BYTE_ARRAY (spec.md §4.2): prefix lengths (shared with the
//! previous value) and suffix lengths, both DELTA_BINARY_PACKED INT32,
//! followed by the concatenated suffix bytes. Best suited to
//! lexicographically sorted or otherwise prefix-similar string columns.

use bytes::Bytes;

use crate::basic::Encoding;
use crate::data_type::ByteArray;
use crate::encodings::delta_binary_packed::{DeltaBinaryPackedDecoder, DeltaBinaryPackedEncoder};
use crate::encodings::{Decoder, Encoder};
use crate::errors::{malformed_err, unsupported_err, Result};
use crate::value::PhysicalValue;

fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

pub struct DeltaByteArrayEncoder {
    prefixes: DeltaBinaryPackedEncoder,
    suffixes: DeltaBinaryPackedEncoder,
    suffix_data: Vec<u8>,
    previous: Vec<u8>,
}

impl DeltaByteArrayEncoder {
    pub fn new() -> Self {
        DeltaByteArrayEncoder {
            prefixes: DeltaBinaryPackedEncoder::new(crate::basic::Type::INT32)
                .expect("INT32 is always supported"),
            suffixes: DeltaBinaryPackedEncoder::new(crate::basic::Type::INT32)
                .expect("INT32 is always supported"),
            suffix_data: Vec::new(),
            previous: Vec::new(),
        }
    }
}

impl Default for DeltaByteArrayEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for DeltaByteArrayEncoder {
    fn put(&mut self, values: &[PhysicalValue]) -> Result<()> {
        for value in values {
            let bytes = match value {
                PhysicalValue::Null => continue,
                PhysicalValue::ByteArray(b) | PhysicalValue::FixedLenByteArray(b) => b.data(),
                other => {
                    return Err(unsupported_err!(
                        "DELTA_BYTE_ARRAY received a non-byte-array value: {:?}",
                        other
                    ))
                }
            };
            let prefix_len = shared_prefix_len(&self.previous, bytes);
            let suffix = &bytes[prefix_len..];
            self.prefixes
                .put(&[PhysicalValue::Int32(prefix_len as i32)])?;
            self.suffixes
                .put(&[PhysicalValue::Int32(suffix.len() as i32)])?;
            self.suffix_data.extend_from_slice(suffix);
            self.previous = bytes.to_vec();
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<Vec<u8>> {
        let mut out = self.prefixes.flush_buffer()?;
        out.extend(self.suffixes.flush_buffer()?);
        out.extend(std::mem::take(&mut self.suffix_data));
        Ok(out)
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.suffix_data.len()
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_BYTE_ARRAY
    }
}

pub struct DeltaByteArrayDecoder {
    values: std::vec::IntoIter<ByteArray>,
}

impl DeltaByteArrayDecoder {
    pub fn new() -> Self {
        DeltaByteArrayDecoder {
            values: Vec::new().into_iter(),
        }
    }
}

impl Default for DeltaByteArrayDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DeltaByteArrayDecoder {
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        let mut prefix_decoder =
            DeltaBinaryPackedDecoder::new(crate::basic::Type::INT32).expect("always supported");
        prefix_decoder.set_data(data.clone(), num_values)?;
        let prefixes = to_usize_lengths(prefix_decoder.get(num_values)?)?;
        let mut offset = prefix_decoder.bytes_consumed();

        let mut suffix_decoder =
            DeltaBinaryPackedDecoder::new(crate::basic::Type::INT32).expect("always supported");
        suffix_decoder.set_data(data.slice(offset..), num_values)?;
        let suffixes = to_usize_lengths(suffix_decoder.get(num_values)?)?;
        offset += suffix_decoder.bytes_consumed();

        let mut previous: Vec<u8> = Vec::new();
        let mut values = Vec::with_capacity(prefixes.len());
        for (prefix_len, suffix_len) in prefixes.into_iter().zip(suffixes) {
            if prefix_len > previous.len() {
                return Err(malformed_err!(
                    "DELTA_BYTE_ARRAY prefix length {} exceeds previous value length {}",
                    prefix_len,
                    previous.len()
                ));
            }
            let end = offset + suffix_len;
            let suffix = data
                .get(offset..end)
                .ok_or_else(|| malformed_err!("DELTA_BYTE_ARRAY suffix data truncated"))?;
            let mut value = Vec::with_capacity(prefix_len + suffix_len);
            value.extend_from_slice(&previous[..prefix_len]);
            value.extend_from_slice(suffix);
            offset = end;
            previous = value.clone();
            values.push(ByteArray::from(value));
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

fn to_usize_lengths(values: Vec<PhysicalValue>) -> Result<Vec<usize>> {
    values
        .into_iter()
        .map(|v| match v {
            PhysicalValue::Int32(n) if n >= 0 => Ok(n as usize),
            _ => Err(malformed_err!("expected a non-negative INT32 length")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_strings_share_prefixes_and_round_trip() {
        let raw = ["apple", "application", "apply", "banana"];
        let values: Vec<_> = raw
            .iter()
            .map(|s| PhysicalValue::ByteArray(ByteArray::from(*s)))
            .collect();
        let mut encoder = DeltaByteArrayEncoder::new();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = DeltaByteArrayDecoder::new();
        decoder.set_data(Bytes::from(bytes), raw.len()).unwrap();
        assert_eq!(decoder.get(raw.len()).unwrap(), values);
    }

    #[test]
    fn unrelated_strings_round_trip_with_zero_shared_prefix() {
        let raw = ["zzz", "aaa", "qqq"];
        let values: Vec<_> = raw
            .iter()
            .map(|s| PhysicalValue::ByteArray(ByteArray::from(*s)))
            .collect();
        let mut encoder = DeltaByteArrayEncoder::new();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = DeltaByteArrayDecoder::new();
        decoder.set_data(Bytes::from(bytes), raw.len()).unwrap();
        assert_eq!(decoder.get(raw.len()).unwrap(), values);
    }
}
