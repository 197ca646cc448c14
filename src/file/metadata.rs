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

//! In-memory footer metadata (spec.md §4.6, §3 "File"): [`FileMetaData`],
//! [`RowGroupMetaData`], [`ColumnChunkMetaData`], plus the per-page
//! [`ColumnIndex`]/[`OffsetIndex`] the page writer accumulates as it goes
//! (spec.md §4.3 step 7). Kept independent of the Thrift-generated
//! `parquet_format` structs; `file::writer`/`file::footer` are the only
//! places that translate between the two, mirroring the teacher's split
//! between its own `FileMetaData` and `parquet_format::FileMetaData`.

use crate::basic::{Compression, Encoding};
use crate::file::statistics::Statistics;
use crate::schema::types::SchemaDescPtr;
use crate::value::PhysicalValue;

/// One declared sort key of a row group (spec.md §3 "Row Group").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortingColumn {
    pub column_idx: i32,
    pub descending: bool,
    pub nulls_first: bool,
}

/// Per-page min/max/null-count/is-null-page flag, one entry per page in
/// the chunk, in page order (spec.md §4.3 step 7).
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    pub null_pages: Vec<bool>,
    pub min_values: Vec<Option<PhysicalValue>>,
    pub max_values: Vec<Option<PhysicalValue>>,
    pub null_counts: Vec<i64>,
}

impl ColumnIndex {
    pub fn push(&mut self, stats: &Statistics) {
        let is_null_page = stats.min().is_none() && stats.max().is_none();
        self.null_pages.push(is_null_page);
        self.min_values.push(stats.min().cloned());
        self.max_values.push(stats.max().cloned());
        self.null_counts.push(stats.null_count());
    }
}

/// One (offset, compressed_size, first_row_index) triple per page, used to
/// locate pages without decoding the chunk (spec.md §4.3 step 7). Offsets
/// start file-relative-pending and are patched to absolute values at
/// row-group flush time (spec.md §4.6).
#[derive(Debug, Clone, Copy)]
pub struct PageLocation {
    pub offset: i64,
    pub compressed_page_size: i32,
    pub first_row_index: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OffsetIndex {
    pub page_locations: Vec<PageLocation>,
}

/// Everything the file writer records about one leaf's column chunk
/// (spec.md §4.6 "per-column-chunk metadata").
#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    pub column_path: Vec<String>,
    pub physical_type: crate::basic::Type,
    pub encodings: Vec<Encoding>,
    pub compression: Compression,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub data_page_offset: i64,
    pub dictionary_page_offset: Option<i64>,
    pub statistics: Option<Statistics>,
    pub bloom_filter_offset: Option<i64>,
    pub bloom_filter_length: Option<i32>,
    pub column_index_offset: Option<i64>,
    pub column_index_length: Option<i32>,
    pub offset_index_offset: Option<i64>,
    pub offset_index_length: Option<i32>,
}

/// One row group's descriptor (spec.md §4.6 "Append the row-group
/// descriptor").
#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    pub columns: Vec<ColumnChunkMetaData>,
    pub num_rows: i64,
    pub total_byte_size: i64,
    pub sorting_columns: Option<Vec<SortingColumn>>,
    pub file_offset: i64,
}

impl RowGroupMetaData {
    pub fn total_compressed_size(&self) -> i64 {
        self.columns.iter().map(|c| c.total_compressed_size).sum()
    }
}

/// The whole footer (spec.md §3 "File"): schema, row groups, key/value
/// metadata and the writer identity string.
#[derive(Debug, Clone)]
pub struct FileMetaData {
    pub schema: SchemaDescPtr,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroupMetaData>,
    pub key_value_metadata: Vec<(String, Option<String>)>,
    pub created_by: Option<String>,
}

impl FileMetaData {
    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }
}
