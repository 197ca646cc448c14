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

//! Per-page and per-column-chunk min/max/null/distinct statistics
//! (spec.md §4.2 `page_stats`), using parquet's type-specific ordering:
//! unsigned comparison for `UINT*`-annotated integers, IEEE-754 with
//! `-0.0 < +0.0` and NaN excluded from min/max for floats, and plain
//! lexicographic (byte) ordering for byte arrays.

use crate::basic::LogicalType;
use crate::value::PhysicalValue;

/// Running min/max/null-count/distinct-count accumulator for one page or
/// one column chunk (chunk statistics are the running merge of its pages').
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    min: Option<PhysicalValue>,
    max: Option<PhysicalValue>,
    null_count: i64,
    distinct_count: Option<i64>,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    pub fn min(&self) -> Option<&PhysicalValue> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&PhysicalValue> {
        self.max.as_ref()
    }

    pub fn null_count(&self) -> i64 {
        self.null_count
    }

    pub fn distinct_count(&self) -> Option<i64> {
        self.distinct_count
    }

    pub fn set_distinct_count(&mut self, count: i64) {
        self.distinct_count = Some(count);
    }

    pub fn set_null_count(&mut self, count: i64) {
        self.null_count = count;
    }

    /// Sets the min/max directly, bypassing `update`'s comparison — used
    /// when restoring a [`Statistics`] from a footer's already-resolved
    /// Thrift min/max bytes rather than folding raw values.
    pub fn set_min(&mut self, value: PhysicalValue) {
        self.min = Some(value);
    }

    pub fn set_max(&mut self, value: PhysicalValue) {
        self.max = Some(value);
    }

    /// Folds one value into the running min/max, honoring `logical_type`'s
    /// signedness for ordering. Nulls only bump `null_count`.
    pub fn update(&mut self, value: &PhysicalValue, logical_type: Option<&LogicalType>) {
        if value.is_null() {
            self.null_count += 1;
            return;
        }
        if !is_comparable(value) {
            return;
        }
        let unsigned = logical_type.map(LogicalType::is_unsigned).unwrap_or(false);
        match &self.min {
            Some(current) if compare(current, value, unsigned) != std::cmp::Ordering::Greater => {}
            _ => self.min = Some(value.clone()),
        }
        match &self.max {
            Some(current) if compare(current, value, unsigned) != std::cmp::Ordering::Less => {}
            _ => self.max = Some(value.clone()),
        }
    }

    /// Merges another page's (or chunk's) statistics into this one.
    pub fn merge(&mut self, other: &Statistics, logical_type: Option<&LogicalType>) {
        self.null_count += other.null_count;
        let unsigned = logical_type.map(LogicalType::is_unsigned).unwrap_or(false);
        if let Some(other_min) = &other.min {
            self.update_extreme(other_min, unsigned, true);
        }
        if let Some(other_max) = &other.max {
            self.update_extreme(other_max, unsigned, false);
        }
        self.distinct_count = None;
    }

    fn update_extreme(&mut self, candidate: &PhysicalValue, unsigned: bool, is_min: bool) {
        let slot = if is_min { &mut self.min } else { &mut self.max };
        match slot {
            None => *slot = Some(candidate.clone()),
            Some(current) => {
                let ord = compare(current, candidate, unsigned);
                let replace = if is_min {
                    ord == std::cmp::Ordering::Greater
                } else {
                    ord == std::cmp::Ordering::Less
                };
                if replace {
                    *slot = Some(candidate.clone());
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.null_count == 0
    }
}

/// Floats exclude NaN from min/max per spec; everything else participates.
fn is_comparable(value: &PhysicalValue) -> bool {
    match value {
        PhysicalValue::Float(f) => !f.is_nan(),
        PhysicalValue::Double(f) => !f.is_nan(),
        _ => true,
    }
}

/// Same ordering `Statistics::update` folds values with, exposed for
/// sorting-column comparisons in `sorting`/`merge` (spec.md §4.7, §4.8).
pub(crate) fn compare_physical(a: &PhysicalValue, b: &PhysicalValue, unsigned: bool) -> std::cmp::Ordering {
    compare(a, b, unsigned)
}

/// `-0.0 < +0.0` for floats (spec.md §4.2); everything else uses its
/// natural ordering, switched to unsigned reinterpretation when
/// `unsigned` is set (INTEGER logical type with `is_signed: false`).
fn compare(a: &PhysicalValue, b: &PhysicalValue, unsigned: bool) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (PhysicalValue::Boolean(x), PhysicalValue::Boolean(y)) => x.cmp(y),
        (PhysicalValue::Int32(x), PhysicalValue::Int32(y)) => {
            if unsigned {
                (*x as u32).cmp(&(*y as u32))
            } else {
                x.cmp(y)
            }
        }
        (PhysicalValue::Int64(x), PhysicalValue::Int64(y)) => {
            if unsigned {
                (*x as u64).cmp(&(*y as u64))
            } else {
                x.cmp(y)
            }
        }
        (PhysicalValue::Int96(x), PhysicalValue::Int96(y)) => x.cmp(y),
        (PhysicalValue::Float(x), PhysicalValue::Float(y)) => compare_floats(*x as f64, *y as f64),
        (PhysicalValue::Double(x), PhysicalValue::Double(y)) => compare_floats(*x, *y),
        (PhysicalValue::ByteArray(x), PhysicalValue::ByteArray(y))
        | (PhysicalValue::FixedLenByteArray(x), PhysicalValue::FixedLenByteArray(y)) => {
            x.data().cmp(y.data())
        }
        _ => Ordering::Equal,
    }
}

fn compare_floats(x: f64, y: f64) -> std::cmp::Ordering {
    if x == y {
        // distinguishes -0.0 from +0.0, which plain `==` treats as equal.
        x.is_sign_negative().cmp(&y.is_sign_negative()).reverse()
    } else {
        x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::ByteArray;

    #[test]
    fn tracks_min_max_and_null_count() {
        let mut stats = Statistics::new();
        for v in [
            PhysicalValue::Int32(5),
            PhysicalValue::Null,
            PhysicalValue::Int32(-3),
            PhysicalValue::Int32(10),
        ] {
            stats.update(&v, None);
        }
        assert_eq!(stats.min(), Some(&PhysicalValue::Int32(-3)));
        assert_eq!(stats.max(), Some(&PhysicalValue::Int32(10)));
        assert_eq!(stats.null_count(), 1);
    }

    #[test]
    fn unsigned_logical_type_reorders_negative_bit_patterns() {
        let logical = LogicalType::Integer {
            bit_width: 32,
            is_signed: false,
        };
        let mut stats = Statistics::new();
        stats.update(&PhysicalValue::Int32(1), Some(&logical));
        stats.update(&PhysicalValue::Int32(-1), Some(&logical));
        // -1 as u32 is u32::MAX, so it's the max, not the min.
        assert_eq!(stats.max(), Some(&PhysicalValue::Int32(-1)));
        assert_eq!(stats.min(), Some(&PhysicalValue::Int32(1)));
    }

    #[test]
    fn nan_is_excluded_from_float_min_max() {
        let mut stats = Statistics::new();
        stats.update(&PhysicalValue::Double(1.0), None);
        stats.update(&PhysicalValue::Double(f64::NAN), None);
        stats.update(&PhysicalValue::Double(-1.0), None);
        assert_eq!(stats.min(), Some(&PhysicalValue::Double(-1.0)));
        assert_eq!(stats.max(), Some(&PhysicalValue::Double(1.0)));
    }

    #[test]
    fn byte_arrays_compare_lexicographically() {
        let mut stats = Statistics::new();
        for s in ["banana", "apple", "cherry"] {
            stats.update(&PhysicalValue::ByteArray(ByteArray::from(s)), None);
        }
        assert_eq!(
            stats.min(),
            Some(&PhysicalValue::ByteArray(ByteArray::from("apple")))
        );
        assert_eq!(
            stats.max(),
            Some(&PhysicalValue::ByteArray(ByteArray::from("cherry")))
        );
    }
}
