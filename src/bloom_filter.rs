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

//! Split-block Bloom filter hashed on XXHASH64 (spec.md §4.5). Accumulated
//! across a whole column chunk and emitted once at chunk close.

use twox_hash::XxHash64;
use std::hash::Hasher;

use crate::data_type::{ByteArray, Int96};
use crate::value::PhysicalValue;

/// Canonical per-lane salt constants from the Parquet format spec.
const SALT: [u32; 8] = [
    0x47b6137b, 0x44974d91, 0x8824ad5b, 0xa2b7289d, 0x705495c7, 0x2df1424b, 0x9efc4947, 0x5c6bfb31,
];

const WORDS_PER_BLOCK: usize = 8;
const BLOCK_BYTES: usize = WORDS_PER_BLOCK * 4;
const DEFAULT_BITS_PER_VALUE: usize = 10;
const XXHASH64_SEED: u64 = 0;

#[derive(Debug, Clone)]
pub struct SplitBlockBloomFilter {
    blocks: Vec<[u32; WORDS_PER_BLOCK]>,
}

impl SplitBlockBloomFilter {
    /// `num_blocks = max(1, ceil(num_values * bits_per_value / 256))`.
    pub fn with_capacity(num_values: usize, bits_per_value: usize) -> Self {
        let total_bits = num_values * bits_per_value;
        let num_blocks = total_bits.div_ceil(256).max(1);
        SplitBlockBloomFilter {
            blocks: vec![[0u32; WORDS_PER_BLOCK]; num_blocks],
        }
    }

    pub fn new(num_values: usize) -> Self {
        Self::with_capacity(num_values, DEFAULT_BITS_PER_VALUE)
    }

    pub fn num_bytes(&self) -> usize {
        self.blocks.len() * BLOCK_BYTES
    }

    fn block_index(&self, hash: u64) -> usize {
        let h_low = hash & 0xFFFF_FFFF;
        ((h_low * self.blocks.len() as u64) >> 32) as usize
    }

    fn masks(hash: u64) -> [u32; WORDS_PER_BLOCK] {
        let h_high = (hash >> 32) as u32;
        let mut masks = [0u32; WORDS_PER_BLOCK];
        for (i, mask) in masks.iter_mut().enumerate() {
            let bit = (h_high.wrapping_mul(SALT[i])) >> 27;
            *mask = 1u32 << bit;
        }
        masks
    }

    pub fn insert_hash(&mut self, hash: u64) {
        let block_idx = self.block_index(hash);
        let masks = Self::masks(hash);
        let block = &mut self.blocks[block_idx];
        for i in 0..WORDS_PER_BLOCK {
            block[i] |= masks[i];
        }
    }

    pub fn insert(&mut self, value: &PhysicalValue) {
        self.insert_hash(hash_value(value));
    }

    pub fn check_hash(&self, hash: u64) -> bool {
        let block_idx = self.block_index(hash);
        let masks = Self::masks(hash);
        let block = &self.blocks[block_idx];
        (0..WORDS_PER_BLOCK).all(|i| block[i] & masks[i] == masks[i])
    }

    pub fn check(&self, value: &PhysicalValue) -> bool {
        self.check_hash(hash_value(value))
    }

    /// Uncompressed wire payload: each block's 8 little-endian u32 lanes,
    /// concatenated block after block.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.num_bytes());
        for block in &self.blocks {
            for word in block {
                out.extend_from_slice(&word.to_le_bytes());
            }
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let blocks = bytes
            .chunks_exact(BLOCK_BYTES)
            .map(|chunk| {
                let mut block = [0u32; WORDS_PER_BLOCK];
                for (i, word) in block.iter_mut().enumerate() {
                    *word = u32::from_le_bytes(chunk[i * 4..i * 4 + 4].try_into().unwrap());
                }
                block
            })
            .collect();
        SplitBlockBloomFilter { blocks }
    }
}

/// Hashes a value's plain-encoded bytes with XXHASH64 (spec.md §4.5 step 1).
pub fn hash_value(value: &PhysicalValue) -> u64 {
    let mut hasher = XxHash64::with_seed(XXHASH64_SEED);
    match value {
        PhysicalValue::Null => {}
        PhysicalValue::Boolean(b) => hasher.write_u8(*b as u8),
        PhysicalValue::Int32(v) => hasher.write_i32(*v),
        PhysicalValue::Int64(v) => hasher.write_i64(*v),
        PhysicalValue::Int96(v) => hash_int96(&mut hasher, v),
        PhysicalValue::Float(v) => hasher.write_u32(v.to_bits()),
        PhysicalValue::Double(v) => hasher.write_u64(v.to_bits()),
        PhysicalValue::ByteArray(b) | PhysicalValue::FixedLenByteArray(b) => hash_bytes(&mut hasher, b),
    }
    hasher.finish()
}

fn hash_int96(hasher: &mut XxHash64, v: &Int96) {
    for word in v.data() {
        hasher.write_u32(*word);
    }
}

fn hash_bytes(hasher: &mut XxHash64, b: &ByteArray) {
    hasher.write(b.data());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizing_matches_formula() {
        let bf = SplitBlockBloomFilter::new(1000);
        // ceil(1000*10/256) = 40 blocks * 32 bytes
        assert_eq!(bf.num_bytes(), 40 * 32);
    }

    #[test]
    fn minimum_one_block() {
        let bf = SplitBlockBloomFilter::new(1);
        assert_eq!(bf.num_bytes(), 32);
    }

    #[test]
    fn inserted_values_are_found() {
        let mut bf = SplitBlockBloomFilter::new(100);
        let values: Vec<_> = (0..50).map(PhysicalValue::Int64).collect();
        for v in &values {
            bf.insert(v);
        }
        for v in &values {
            assert!(bf.check(v), "expected {v:?} to be present");
        }
    }

    #[test]
    fn byte_round_trip_preserves_membership() {
        let mut bf = SplitBlockBloomFilter::new(20);
        for v in (0..20).map(PhysicalValue::Int32) {
            bf.insert(&v);
        }
        let restored = SplitBlockBloomFilter::from_bytes(&bf.to_bytes());
        for v in (0..20).map(PhysicalValue::Int32) {
            assert!(restored.check(&v));
        }
    }

    #[test]
    fn false_positive_rate_is_within_budget() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use std::collections::HashSet;

        let n = 5000;
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let inserted: HashSet<i64> = std::iter::repeat_with(|| rng.gen::<i64>()).take(n).collect();
        let mut bf = SplitBlockBloomFilter::new(n);
        for v in inserted.iter().map(|&i| PhysicalValue::Int64(i)) {
            bf.insert(&v);
        }
        let mut false_positives = 0;
        let trials = 10_000;
        let mut checked = 0;
        while checked < trials {
            let candidate = rng.gen::<i64>();
            if inserted.contains(&candidate) {
                continue;
            }
            checked += 1;
            if bf.check(&PhysicalValue::Int64(candidate)) {
                false_positives += 1;
            }
        }
        let rate = false_positives as f64 / trials as f64;
        assert!(rate < 0.02, "false positive rate too high: {rate}");
    }
}
