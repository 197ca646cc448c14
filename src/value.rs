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

//! [`Value`], the tagged physical value that flows between the shredder,
//! column buffers and the assembler.
//!
//! Design note (spec.md §9): the source dispatches on physical type through
//! an interface table keyed by a kind enum. Here that becomes a plain Rust
//! sum type with one variant per physical type, so the type checker — not a
//! vtable — enforces exhaustiveness, and the hot paths (encode, compare,
//! stats) collapse to a single `match` at page boundaries instead of a
//! dynamic call per value.

use crate::data_type::{ByteArray, Int96};

/// A physical value with no repetition/definition/column context. `Null`
/// stands for any value whose definition level falls below its leaf's
/// maximum; it carries no physical payload because, per the Dremel model,
/// a null is *positional* information only.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96(Int96),
    Float(f32),
    Double(f64),
    ByteArray(ByteArray),
    FixedLenByteArray(ByteArray),
}

impl PhysicalValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PhysicalValue::Null)
    }

    pub fn physical_type(&self) -> Option<crate::basic::Type> {
        use crate::basic::Type;
        Some(match self {
            PhysicalValue::Null => return None,
            PhysicalValue::Boolean(_) => Type::BOOLEAN,
            PhysicalValue::Int32(_) => Type::INT32,
            PhysicalValue::Int64(_) => Type::INT64,
            PhysicalValue::Int96(_) => Type::INT96,
            PhysicalValue::Float(_) => Type::FLOAT,
            PhysicalValue::Double(_) => Type::DOUBLE,
            PhysicalValue::ByteArray(_) => Type::BYTE_ARRAY,
            PhysicalValue::FixedLenByteArray(_) => Type::FIXED_LEN_BYTE_ARRAY,
        })
    }
}

/// A single striped value produced by shredding (spec.md §3 "Value").
///
/// `column_index` doubles as an "is this value positioned yet" flag: while
/// the shredder is still walking a record it stores the *intended* column
/// index as its bitwise complement (always negative, since valid indexes
/// are non-negative), and [`Value::position`] commits the final, real
/// index once the value is appended to the flat [`crate::record::Row`].
/// This is the "two divergent Value layouts" design note resolved in favor
/// of packing rep/def levels and the column tag into one small struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub physical: PhysicalValue,
    pub repetition_level: i16,
    pub definition_level: i16,
    column_index: i32,
}

impl Value {
    /// Builds a value not yet positioned in a `Row`; `intended_column` is
    /// the leaf's column index it is destined for.
    pub fn new(
        physical: PhysicalValue,
        repetition_level: i16,
        definition_level: i16,
        intended_column: usize,
    ) -> Self {
        Value {
            physical,
            repetition_level,
            definition_level,
            column_index: !(intended_column as i32),
        }
    }

    /// A positioned value, as produced once a `Row` is finalized.
    pub fn positioned(
        physical: PhysicalValue,
        repetition_level: i16,
        definition_level: i16,
        column_index: usize,
    ) -> Self {
        Value {
            physical,
            repetition_level,
            definition_level,
            column_index: column_index as i32,
        }
    }

    pub fn is_positioned(&self) -> bool {
        self.column_index >= 0
    }

    /// The column index this value belongs to, whether or not it has been
    /// positioned yet.
    pub fn column_index(&self) -> usize {
        if self.column_index >= 0 {
            self.column_index as usize
        } else {
            (!self.column_index) as usize
        }
    }

    /// Commits this value's final position in the flat row.
    pub fn position(&mut self, column_index: usize) {
        self.column_index = column_index as i32;
    }

    pub fn is_null(&self) -> bool {
        self.physical.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpositioned_value_round_trips_intended_column() {
        let v = Value::new(PhysicalValue::Int32(7), 0, 1, 42);
        assert!(!v.is_positioned());
        assert_eq!(v.column_index(), 42);
    }

    #[test]
    fn positioning_flips_the_flag() {
        let mut v = Value::new(PhysicalValue::Null, 0, 0, 3);
        assert!(!v.is_positioned());
        v.position(3);
        assert!(v.is_positioned());
        assert_eq!(v.column_index(), 3);
    }
}
