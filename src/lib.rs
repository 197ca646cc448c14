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

//! A standalone implementation of the Parquet columnar file format: schema
//! definition, row shredding/assembly (Dremel), column encodings, page and
//! row-group framing, a forward-only writer, a footer-driven reader, and a
//! sort/merge row-group writer for producing globally-sorted files.
//!
//! Start at [`schema::types::SchemaDescriptor`] to describe a schema,
//! [`record::Record`] to build values, [`file::writer::SerializedFileWriter`]
//! (or the higher-level [`file::writer::RecordWriter`]/
//! [`sorting::SortingWriter`]) to write a file, and
//! [`file::reader::SerializedFileReader`] to read one back.

pub mod basic;
pub mod bloom_filter;
pub mod column;
pub mod compression;
pub mod data_type;
pub mod encodings;
pub mod errors;
pub mod file;
pub mod merge;
pub mod properties;
pub mod record;
pub mod schema;
pub mod sorting;
pub mod util;
pub mod value;

pub use errors::{ParquetError, Result};
