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

//! Error type shared by every module in this crate.
//!
//! Kinds line up with the taxonomy in the spec: a malformed on-disk file, an
//! unsupported encoding/codec/logical type, a row that doesn't match its
//! schema, a computed repetition/definition level outside the schema's
//! maxima, a wrapped I/O failure, and a cursor seek past end of data.
//! `BufferOverflow` is deliberately absent here: column buffers signal "flush
//! me" through a return value, never through `Result::Err`.

use thiserror::Error;

/// The result type used throughout this crate.
pub type Result<T, E = ParquetError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ParquetError {
    /// Magic mismatch, out-of-range footer length, Thrift decode failure.
    #[error("malformed parquet file: {0}")]
    MalformedFile(String),

    /// Unknown codec, encoding, or logical type with no fallback.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A row does not match its schema, or merge inputs are incompatible.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A computed repetition/definition level exceeds the schema's maxima,
    /// or a required field was missing a value.
    #[error("level violation: {0}")]
    LevelViolation(String),

    /// Wrapped I/O error from the underlying reader/writer.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A `Rows`/`Pages` cursor was asked to seek past the end of its data.
    #[error("seek out of range: {0}")]
    SeekOutOfRange(String),

    /// A merge input's declared sorting columns aren't a prefix of the
    /// merge's configured sorting columns.
    #[error("sorting columns mismatch: {0}")]
    SortingColumnsMismatch(String),

    /// Catch-all for internal invariants that should never be reached in
    /// practice but are cheaper to surface as an error than to `panic!`.
    #[error("{0}")]
    General(String),
}

impl From<thrift::Error> for ParquetError {
    fn from(e: thrift::Error) -> ParquetError {
        ParquetError::MalformedFile(format!("underlying Thrift error: {e}"))
    }
}

macro_rules! general_err {
    ($fmt:expr) => (ParquetError::General($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::General(format!($fmt, $($args),*)));
}

macro_rules! malformed_err {
    ($fmt:expr) => (ParquetError::MalformedFile($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::MalformedFile(format!($fmt, $($args),*)));
}

macro_rules! unsupported_err {
    ($fmt:expr) => (ParquetError::UnsupportedFeature($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::UnsupportedFeature(format!($fmt, $($args),*)));
}

macro_rules! schema_err {
    ($fmt:expr) => (ParquetError::SchemaMismatch($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::SchemaMismatch(format!($fmt, $($args),*)));
}

macro_rules! level_err {
    ($fmt:expr) => (ParquetError::LevelViolation($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::LevelViolation(format!($fmt, $($args),*)));
}

macro_rules! sorting_columns_err {
    ($fmt:expr) => (ParquetError::SortingColumnsMismatch($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::SortingColumnsMismatch(format!($fmt, $($args),*)));
}

pub(crate) use general_err;
pub(crate) use level_err;
pub(crate) use malformed_err;
pub(crate) use schema_err;
pub(crate) use sorting_columns_err;
pub(crate) use unsupported_err;
