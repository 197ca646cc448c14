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

//! DELTA_BINARY_PACKED (spec.md §4.2): INT32/INT64 only. Header of
//! (block size, miniblocks per block, total value count, first value), then
//! blocks of (min delta, one bit-width byte per miniblock, bit-packed
//! `delta - min_delta` per miniblock).

use bytes::Bytes;

use crate::basic::Encoding;
use crate::basic::Type as PhysicalType;
use crate::encodings::{Decoder, Encoder};
use crate::errors::{malformed_err, unsupported_err, Result};
use crate::util::bit_util::{num_required_bits, BitReader, BitWriter};
use crate::value::PhysicalValue;

const BLOCK_SIZE: usize = 128;
const MINIBLOCKS_PER_BLOCK: usize = 4;
const VALUES_PER_MINIBLOCK: usize = BLOCK_SIZE / MINIBLOCKS_PER_BLOCK;

pub struct DeltaBinaryPackedEncoder {
    physical_type: PhysicalType,
    values: Vec<i64>,
}

impl DeltaBinaryPackedEncoder {
    pub fn new(physical_type: PhysicalType) -> Result<Self> {
        match physical_type {
            PhysicalType::INT32 | PhysicalType::INT64 => Ok(DeltaBinaryPackedEncoder {
                physical_type,
                values: Vec::new(),
            }),
            other => Err(unsupported_err!(
                "DELTA_BINARY_PACKED does not support {:?}",
                other
            )),
        }
    }
}

impl Encoder for DeltaBinaryPackedEncoder {
    fn put(&mut self, values: &[PhysicalValue]) -> Result<()> {
        for value in values {
            match value {
                PhysicalValue::Null => {}
                PhysicalValue::Int32(v) => self.values.push(*v as i64),
                PhysicalValue::Int64(v) => self.values.push(*v),
                other => {
                    return Err(unsupported_err!(
                        "DELTA_BINARY_PACKED received a non-integer value: {:?}",
                        other
                    ))
                }
            }
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<Vec<u8>> {
        let values = std::mem::take(&mut self.values);
        Ok(encode_deltas(&values))
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.values.len() * 8
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_BINARY_PACKED
    }
}

fn encode_deltas(values: &[i64]) -> Vec<u8> {
    let mut header = BitWriter::new();
    header.put_vlq_int(BLOCK_SIZE as u64);
    header.put_vlq_int(MINIBLOCKS_PER_BLOCK as u64);
    header.put_vlq_int(values.len() as u64);
    header.put_zigzag_vlq_int(values.first().copied().unwrap_or(0));
    let mut out = header.consume();

    if values.len() <= 1 {
        return out;
    }

    let deltas: Vec<i64> = values.windows(2).map(|w| w[1].wrapping_sub(w[0])).collect();
    for block in deltas.chunks(BLOCK_SIZE) {
        let min_delta = block.iter().copied().min().unwrap();
        let mut block_header = BitWriter::new();
        block_header.put_zigzag_vlq_int(min_delta);
        let mut bit_widths = Vec::with_capacity(MINIBLOCKS_PER_BLOCK);
        let mut packed_groups = Vec::with_capacity(MINIBLOCKS_PER_BLOCK);
        // A block always carries exactly MINIBLOCKS_PER_BLOCK miniblocks,
        // even if the final block has fewer real deltas; the tail is
        // zero-padded so the decoder's fixed-shape read stays in sync.
        for m in 0..MINIBLOCKS_PER_BLOCK {
            let start = m * VALUES_PER_MINIBLOCK;
            let miniblock = if start < block.len() {
                &block[start..block.len().min(start + VALUES_PER_MINIBLOCK)]
            } else {
                &[][..]
            };
            let adjusted: Vec<u64> = miniblock
                .iter()
                .map(|d| d.wrapping_sub(min_delta) as u64)
                .collect();
            let max = adjusted.iter().copied().max().unwrap_or(0);
            let bit_width = num_required_bits(max);
            bit_widths.push(bit_width as u8);
            let mut packer = BitWriter::new();
            for i in 0..VALUES_PER_MINIBLOCK {
                packer.put_value(adjusted.get(i).copied().unwrap_or(0), bit_width);
            }
            packed_groups.push(packer.consume());
        }
        out.extend(block_header.consume());
        out.extend_from_slice(&bit_widths);
        for group in packed_groups {
            out.extend(group);
        }
    }
    out
}

pub struct DeltaBinaryPackedDecoder {
    physical_type: PhysicalType,
    values: std::vec::IntoIter<i64>,
    total: usize,
    bytes_consumed: usize,
}

impl DeltaBinaryPackedDecoder {
    pub fn new(physical_type: PhysicalType) -> Result<Self> {
        match physical_type {
            PhysicalType::INT32 | PhysicalType::INT64 => Ok(DeltaBinaryPackedDecoder {
                physical_type,
                values: Vec::new().into_iter(),
                total: 0,
                bytes_consumed: 0,
            }),
            other => Err(unsupported_err!(
                "DELTA_BINARY_PACKED does not support {:?}",
                other
            )),
        }
    }

    /// Bytes of the last buffer passed to `set_data` that the header and
    /// block payload actually occupied; callers packing another stream
    /// right after this one (DELTA_LENGTH_BYTE_ARRAY, DELTA_BYTE_ARRAY) use
    /// this to find where it ends.
    pub fn bytes_consumed(&self) -> usize {
        self.bytes_consumed
    }
}

impl Decoder for DeltaBinaryPackedDecoder {
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        let (values, consumed) = decode_deltas(&data, num_values)?;
        self.total = values.len();
        self.values = values.into_iter();
        self.bytes_consumed = consumed;
        Ok(())
    }

    fn get(&mut self, max_values: usize) -> Result<Vec<PhysicalValue>> {
        let mut out = Vec::with_capacity(max_values);
        for _ in 0..max_values {
            let Some(v) = self.values.next() else { break };
            out.push(match self.physical_type {
                PhysicalType::INT32 => PhysicalValue::Int32(v as i32),
                PhysicalType::INT64 => PhysicalValue::Int64(v),
                _ => unreachable!(),
            });
        }
        Ok(out)
    }

    fn values_left(&self) -> usize {
        self.values.len()
    }
}

fn decode_deltas(data: &[u8], expected_num_values: usize) -> Result<(Vec<i64>, usize)> {
    let mut reader = BitReader::new(data);
    let block_size = reader
        .get_vlq_int()
        .ok_or_else(|| malformed_err!("DELTA_BINARY_PACKED header truncated"))? as usize;
    let miniblocks_per_block = reader
        .get_vlq_int()
        .ok_or_else(|| malformed_err!("DELTA_BINARY_PACKED header truncated"))?
        as usize;
    let total_values = reader
        .get_vlq_int()
        .ok_or_else(|| malformed_err!("DELTA_BINARY_PACKED header truncated"))?
        as usize;
    let first_value = reader
        .get_zigzag_vlq_int()
        .ok_or_else(|| malformed_err!("DELTA_BINARY_PACKED header truncated"))?;
    let _ = expected_num_values;

    let mut values = Vec::with_capacity(total_values);
    values.push(first_value);
    if total_values <= 1 {
        return Ok((values, reader.bytes_consumed()));
    }
    let values_per_miniblock = block_size / miniblocks_per_block;
    let mut previous = first_value;
    let mut remaining = total_values - 1;
    while remaining > 0 {
        let min_delta = reader
            .get_zigzag_vlq_int()
            .ok_or_else(|| malformed_err!("DELTA_BINARY_PACKED block header truncated"))?;
        let mut bit_widths = Vec::with_capacity(miniblocks_per_block);
        for _ in 0..miniblocks_per_block {
            let byte = reader
                .get_value(8)
                .ok_or_else(|| malformed_err!("DELTA_BINARY_PACKED bit-width byte truncated"))?;
            bit_widths.push(byte as usize);
        }
        // Every miniblock is fully packed regardless of how many of its
        // slots hold real values; the tail past `remaining` is padding that
        // still has to be read off the bitstream to stay aligned with
        // whatever the caller packed right after this stream.
        for bit_width in bit_widths {
            for _ in 0..values_per_miniblock {
                let adjusted = reader
                    .get_value(bit_width)
                    .ok_or_else(|| malformed_err!("DELTA_BINARY_PACKED literal truncated"))?;
                if remaining == 0 {
                    continue;
                }
                let delta = min_delta.wrapping_add(adjusted as i64);
                previous = previous.wrapping_add(delta);
                values.push(previous);
                remaining -= 1;
            }
        }
    }
    Ok((values, reader.bytes_consumed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_int64_sequence_round_trips() {
        let values: Vec<PhysicalValue> = (0..300i64).map(PhysicalValue::Int64).collect();
        let mut encoder = DeltaBinaryPackedEncoder::new(PhysicalType::INT64).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = DeltaBinaryPackedDecoder::new(PhysicalType::INT64).unwrap();
        decoder.set_data(Bytes::from(bytes), 300).unwrap();
        assert_eq!(decoder.get(300).unwrap(), values);
    }

    #[test]
    fn single_value_round_trips() {
        let values = vec![PhysicalValue::Int32(42)];
        let mut encoder = DeltaBinaryPackedEncoder::new(PhysicalType::INT32).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = DeltaBinaryPackedDecoder::new(PhysicalType::INT32).unwrap();
        decoder.set_data(Bytes::from(bytes), 1).unwrap();
        assert_eq!(decoder.get(1).unwrap(), values);
    }

    #[test]
    fn non_monotonic_values_round_trip() {
        let raw = [5i32, 3, 3, 100, -20, 0, 7, 7, 7, 42];
        let values: Vec<PhysicalValue> = raw.iter().copied().map(PhysicalValue::Int32).collect();
        let mut encoder = DeltaBinaryPackedEncoder::new(PhysicalType::INT32).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();
        let mut decoder = DeltaBinaryPackedDecoder::new(PhysicalType::INT32).unwrap();
        decoder.set_data(Bytes::from(bytes), raw.len()).unwrap();
        assert_eq!(decoder.get(raw.len()).unwrap(), values);
    }
}
