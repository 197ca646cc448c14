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

//! Variable-length and INT96 physical value carriers.

use std::fmt;

use bytes::Bytes;

/// A variable-length byte sequence, used for both `BYTE_ARRAY` and
/// `FIXED_LEN_BYTE_ARRAY` physical values.
///
/// Backed by [`Bytes`] rather than `Vec<u8>`/a borrow: spec.md §9 mandates
/// that any `Value` retained past the producing page's `Close()` owns its
/// bytes, and a refcounted buffer makes that ownership free to clone instead
/// of forcing an eager copy at every hand-off between shredder, column
/// buffer and dictionary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteArray(Bytes);

impl ByteArray {
    pub fn new(data: impl Into<Bytes>) -> Self {
        ByteArray(data.into())
    }

    pub fn data(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(value: Vec<u8>) -> Self {
        ByteArray(Bytes::from(value))
    }
}

impl From<&[u8]> for ByteArray {
    fn from(value: &[u8]) -> Self {
        ByteArray(Bytes::copy_from_slice(value))
    }
}

impl From<String> for ByteArray {
    fn from(value: String) -> Self {
        ByteArray(Bytes::from(value.into_bytes()))
    }
}

impl From<&str> for ByteArray {
    fn from(value: &str) -> Self {
        ByteArray(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl AsRef<[u8]> for ByteArray {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:?}", self.0.as_ref()),
        }
    }
}

/// Legacy 96-bit integer physical type, preserved for read compatibility
/// only (spec.md §3). Stored as three little-endian `u32` words exactly as
/// laid out on disk: `[nanoseconds_lo, nanoseconds_hi, julian_day]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Int96([u32; 3]);

impl Int96 {
    pub fn new(data: [u32; 3]) -> Self {
        Int96(data)
    }

    pub fn data(&self) -> &[u32; 3] {
        &self.0
    }

    /// Converts to nanoseconds since the Julian epoch, the only ordering
    /// that matters for min/max statistics and comparisons.
    pub fn to_i128(self) -> i128 {
        let nanos = ((self.0[1] as u64) << 32) | self.0[0] as u64;
        (self.0[2] as i128) * 86_400_000_000_000i128 + nanos as i128
    }
}

impl PartialOrd for Int96 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Int96 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_i128().cmp(&other.to_i128())
    }
}
