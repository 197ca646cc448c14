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

//! The RLE/bit-packed hybrid (spec.md §4.2): repetition/definition levels
//! and `RLE_DICTIONARY` indices, never raw column values directly.
//!
//! Wire shape per run: a varint header `indicator = (run_len << 1) | is_bit_packed`,
//! then either a little-endian repeated value (RLE run) or
//! `ceil(group_len * bit_width / 8)` bytes of bit-packed literals
//! (bit-packed run, always emitted in groups of 8 values).

use crate::errors::{malformed_err, Result};
use crate::util::bit_util::{BitReader, BitWriter};

const BIT_PACKED_GROUP_SIZE: usize = 8;

/// Encodes a flat `u64` stream (levels or dictionary indices) at a fixed
/// `bit_width`, choosing RLE runs over literal runs of repeated values.
pub struct RleEncoder {
    bit_width: usize,
    buffer: Vec<u8>,
    // pending values not yet flushed into a run
    pending: Vec<u64>,
}

impl RleEncoder {
    pub fn new(bit_width: usize) -> Self {
        RleEncoder {
            bit_width,
            buffer: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn put(&mut self, values: &[u64]) {
        self.pending.extend_from_slice(values);
    }

    /// Greedily splits `pending` into RLE runs (>= 8 identical values) and
    /// bit-packed runs (groups of 8), writing both as hybrid-encoded bytes.
    pub fn consume(mut self) -> Vec<u8> {
        let values = std::mem::take(&mut self.pending);
        let mut i = 0;
        while i < values.len() {
            let run_start = i;
            while i + 1 < values.len() && values[i + 1] == values[run_start] {
                i += 1;
            }
            let run_len = i - run_start + 1;
            if run_len >= BIT_PACKED_GROUP_SIZE {
                self.write_rle_run(values[run_start], run_len);
                i += 1;
            } else {
                let literal_start = run_start;
                let mut j = run_start;
                // Accumulate literals until we hit another long repeat run
                // or run out of values, then flush as bit-packed groups.
                while j < values.len() {
                    let mut k = j;
                    while k + 1 < values.len() && values[k + 1] == values[j] {
                        k += 1;
                    }
                    if k - j + 1 >= BIT_PACKED_GROUP_SIZE {
                        break;
                    }
                    j = k + 1;
                }
                self.write_bit_packed_run(&values[literal_start..j]);
                i = j;
            }
        }
        self.buffer
    }

    fn write_rle_run(&mut self, value: u64, run_len: usize) {
        let mut header = BitWriter::new();
        header.put_vlq_int((run_len as u64) << 1);
        self.buffer.extend(header.consume());
        let num_bytes = self.bit_width.div_ceil(8).max(1);
        let value_bytes = value.to_le_bytes();
        self.buffer.extend_from_slice(&value_bytes[..num_bytes]);
    }

    fn write_bit_packed_run(&mut self, values: &[u64]) {
        let num_groups = values.len().div_ceil(BIT_PACKED_GROUP_SIZE);
        let mut header = BitWriter::new();
        header.put_vlq_int(((num_groups as u64) << 1) | 1);
        self.buffer.extend(header.consume());
        let mut packer = BitWriter::new();
        for idx in 0..num_groups * BIT_PACKED_GROUP_SIZE {
            let v = values.get(idx).copied().unwrap_or(0);
            packer.put_value(v, self.bit_width);
        }
        self.buffer.extend(packer.consume());
    }
}

/// Decodes a hybrid-encoded stream, `bit_width` bits per logical value.
pub struct RleDecoder<'a> {
    bit_width: usize,
    reader: BitReader<'a>,
    // state for the run currently being consumed
    rle_value: Option<u64>,
    rle_left: usize,
    bit_packed_left: usize,
}

impl<'a> RleDecoder<'a> {
    pub fn new(data: &'a [u8], bit_width: usize) -> Self {
        RleDecoder {
            bit_width,
            reader: BitReader::new(data),
            rle_value: None,
            rle_left: 0,
            bit_packed_left: 0,
        }
    }

    fn load_next_run(&mut self) -> Result<bool> {
        let Some(indicator) = self.reader.get_vlq_int() else {
            return Ok(false);
        };
        if indicator & 1 == 1 {
            let num_groups = (indicator >> 1) as usize;
            self.bit_packed_left = num_groups * BIT_PACKED_GROUP_SIZE;
        } else {
            let run_len = (indicator >> 1) as usize;
            let num_bytes = self.bit_width.div_ceil(8).max(1);
            let value = self
                .reader
                .get_value(num_bytes * 8)
                .ok_or_else(|| malformed_err!("RLE run value truncated"))?;
            self.rle_value = Some(value);
            self.rle_left = run_len;
        }
        Ok(true)
    }

    /// Fills `out` with up to `out.len()` decoded values, returning how many
    /// were produced (fewer than requested only at end of stream).
    pub fn get_batch(&mut self, out: &mut [u64]) -> Result<usize> {
        let mut produced = 0;
        while produced < out.len() {
            if self.rle_left == 0 && self.bit_packed_left == 0 {
                if !self.load_next_run()? {
                    break;
                }
                continue;
            }
            if self.rle_left > 0 {
                let value = self.rle_value.unwrap();
                let take = self.rle_left.min(out.len() - produced);
                out[produced..produced + take].fill(value);
                produced += take;
                self.rle_left -= take;
            } else {
                let take = self.bit_packed_left.min(out.len() - produced);
                for slot in out.iter_mut().skip(produced).take(take) {
                    *slot = self
                        .reader
                        .get_value(self.bit_width)
                        .ok_or_else(|| malformed_err!("bit-packed literal truncated"))?;
                }
                produced += take;
                self.bit_packed_left -= take;
            }
        }
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_run_of_repeats_encodes_as_rle() {
        let values = vec![5u64; 20];
        let encoder_bytes = {
            let mut e = RleEncoder::new(4);
            e.put(&values);
            e.consume()
        };
        let mut decoder = RleDecoder::new(&encoder_bytes, 4);
        let mut out = vec![0u64; 20];
        assert_eq!(decoder.get_batch(&mut out).unwrap(), 20);
        assert_eq!(out, values);
    }

    #[test]
    fn varied_values_round_trip_through_bit_packing() {
        let values: Vec<u64> = (0..40).map(|i| (i % 5) as u64).collect();
        let encoder_bytes = {
            let mut e = RleEncoder::new(3);
            e.put(&values);
            e.consume()
        };
        let mut decoder = RleDecoder::new(&encoder_bytes, 3);
        let mut out = vec![0u64; 40];
        assert_eq!(decoder.get_batch(&mut out).unwrap(), 40);
        assert_eq!(out, values);
    }

    #[test]
    fn mixed_runs_round_trip() {
        let mut values = vec![0u64; 0];
        values.extend(std::iter::repeat(2u64).take(12));
        values.extend([1u64, 2, 3, 1, 2, 3, 1, 2, 3, 1]);
        values.extend(std::iter::repeat(0u64).take(9));
        let encoder_bytes = {
            let mut e = RleEncoder::new(2);
            e.put(&values);
            e.consume()
        };
        let mut decoder = RleDecoder::new(&encoder_bytes, 2);
        let mut out = vec![0u64; values.len()];
        assert_eq!(decoder.get_batch(&mut out).unwrap(), values.len());
        assert_eq!(out, values);
    }
}
