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

//! Insertion-ordered deduplicating value table (spec.md §4.4). Values hash
//! and compare bytewise for variable-length types, by value for fixed
//! types; once the table's estimated size crosses the configured limit the
//! column writer is told to fall back to plain encoding for the rest of
//! the chunk.

use std::collections::HashMap;

use crate::value::PhysicalValue;

/// A hashable, totally-ordered key derived from a [`PhysicalValue`].
/// `f32`/`f64` don't implement `Eq`/`Hash`, so floats key on their bit
/// pattern — two NaNs with different payloads are (rightly, for dictionary
/// purposes) distinct keys, mirroring IEEE-754 bit-for-bit identity rather
/// than numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DictKey {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96([u32; 3]),
    Float(u32),
    Double(u64),
    Bytes(Vec<u8>),
}

fn key_of(value: &PhysicalValue) -> Option<DictKey> {
    Some(match value {
        PhysicalValue::Null => return None,
        PhysicalValue::Boolean(b) => DictKey::Boolean(*b),
        PhysicalValue::Int32(v) => DictKey::Int32(*v),
        PhysicalValue::Int64(v) => DictKey::Int64(*v),
        PhysicalValue::Int96(v) => DictKey::Int96(*v.data()),
        PhysicalValue::Float(v) => DictKey::Float(v.to_bits()),
        PhysicalValue::Double(v) => DictKey::Double(v.to_bits()),
        PhysicalValue::ByteArray(b) | PhysicalValue::FixedLenByteArray(b) => {
            DictKey::Bytes(b.data().to_vec())
        }
    })
}

/// A rough per-entry byte cost, used only to decide when to fall back to
/// plain encoding; need not be exact.
fn estimated_size(value: &PhysicalValue) -> usize {
    match value {
        PhysicalValue::Null => 0,
        PhysicalValue::Boolean(_) => 1,
        PhysicalValue::Int32(_) | PhysicalValue::Float(_) => 4,
        PhysicalValue::Int64(_) | PhysicalValue::Double(_) => 8,
        PhysicalValue::Int96(_) => 12,
        PhysicalValue::ByteArray(b) | PhysicalValue::FixedLenByteArray(b) => b.len() + 4,
    }
}

pub struct Dictionary {
    index_of: HashMap<DictKey, u32>,
    values: Vec<PhysicalValue>,
    byte_size: usize,
    size_limit: usize,
    fell_back: bool,
}

impl Dictionary {
    pub fn new(size_limit: usize) -> Self {
        Dictionary {
            index_of: HashMap::new(),
            values: Vec::new(),
            byte_size: 0,
            size_limit,
            fell_back: false,
        }
    }

    pub fn has_fallen_back(&self) -> bool {
        self.fell_back
    }

    pub fn num_entries(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[PhysicalValue] {
        &self.values
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Looks up (or inserts) `value`, returning its dictionary index. Once
    /// the table has fallen back, callers must not insert further values
    /// and should route them through plain encoding instead.
    pub fn get_or_insert(&mut self, value: &PhysicalValue) -> Option<u32> {
        if self.fell_back {
            return None;
        }
        let key = key_of(value)?;
        if let Some(idx) = self.index_of.get(&key) {
            return Some(*idx);
        }
        let idx = self.values.len() as u32;
        self.byte_size += estimated_size(value);
        self.values.push(value.clone());
        self.index_of.insert(key, idx);
        if self.byte_size > self.size_limit {
            self.fell_back = true;
        }
        Some(idx)
    }

    /// Bit width an RLE_DICTIONARY index stream needs for this dictionary
    /// (spec.md §4.2: `bit width ≥ ceil(log2(dictionary_size))`).
    pub fn bit_width(&self) -> usize {
        crate::util::bit_util::num_required_bits(self.values.len().saturating_sub(1) as u64)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::ByteArray;

    #[test]
    fn deduplicates_repeated_values() {
        let mut dict = Dictionary::new(1024);
        let a = dict.get_or_insert(&PhysicalValue::ByteArray(ByteArray::from("x")));
        let b = dict.get_or_insert(&PhysicalValue::ByteArray(ByteArray::from("y")));
        let c = dict.get_or_insert(&PhysicalValue::ByteArray(ByteArray::from("x")));
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(dict.num_entries(), 2);
    }

    #[test]
    fn falls_back_once_size_limit_exceeded() {
        let mut dict = Dictionary::new(10);
        for i in 0..10 {
            dict.get_or_insert(&PhysicalValue::ByteArray(ByteArray::from(format!(
                "value-{i}"
            ))));
        }
        assert!(dict.has_fallen_back());
        assert_eq!(dict.get_or_insert(&PhysicalValue::ByteArray(ByteArray::from("z"))), None);
    }

    #[test]
    fn bit_width_matches_ceil_log2_of_size() {
        let mut dict = Dictionary::new(1 << 20);
        for i in 0..5 {
            dict.get_or_insert(&PhysicalValue::Int32(i));
        }
        assert_eq!(dict.bit_width(), 3);
    }
}
