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

//! [`Page`], the unit of a column chunk (spec.md §3 "Page"), and the
//! [`PageWriter`]/[`PageReader`] seam traits the row-group writer and the
//! k-way merge read/write through.

use bytes::Bytes;

use crate::basic::Encoding;
use crate::errors::Result;
use crate::file::statistics::Statistics;

/// A page's payload plus the framing spec.md §4.3 requires (levels already
/// RLE-encoded, values already encoded in whatever `encoding` names).
/// Dual-purpose depending which side holds it: wrapped in [`CompressedPage`]
/// on the write path, `buf` is the final compressed, CRC-able wire bytes
/// handed to [`PageWriter::write_page`]; returned from [`PageReader::next`]
/// on the read path, `buf` has already been decompressed back to raw
/// levels-plus-values bytes, ready for level/value decoding.
pub enum Page {
    DataPageV1 {
        /// `repetition levels || definition levels || encoded values`,
        /// length-prefixed levels per spec.md §4.3 step 1/2.
        buf: Bytes,
        num_values: u32,
        encoding: Encoding,
        def_level_encoding: Encoding,
        rep_level_encoding: Encoding,
        statistics: Statistics,
    },
    DataPageV2 {
        buf: Bytes,
        num_values: u32,
        num_nulls: u32,
        num_rows: u32,
        encoding: Encoding,
        def_levels_byte_len: u32,
        rep_levels_byte_len: u32,
        is_compressed: bool,
        statistics: Statistics,
    },
    DictionaryPage {
        buf: Bytes,
        num_values: u32,
        encoding: Encoding,
        is_sorted: bool,
    },
}

impl Page {
    pub fn buffer(&self) -> &Bytes {
        match self {
            Page::DataPageV1 { buf, .. } => buf,
            Page::DataPageV2 { buf, .. } => buf,
            Page::DictionaryPage { buf, .. } => buf,
        }
    }

    pub fn num_values(&self) -> u32 {
        match self {
            Page::DataPageV1 { num_values, .. } => *num_values,
            Page::DataPageV2 { num_values, .. } => *num_values,
            Page::DictionaryPage { num_values, .. } => *num_values,
        }
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        match self {
            Page::DataPageV1 { statistics, .. } => Some(statistics),
            Page::DataPageV2 { statistics, .. } => Some(statistics),
            Page::DictionaryPage { .. } => None,
        }
    }
}

/// A page whose `buf` is already wire-ready (levels + values, compressed
/// per the v1/v2 rule in spec.md §4.3 step 4), paired with the
/// uncompressed size the header must also carry.
pub struct CompressedPage {
    pub page: Page,
    pub uncompressed_size: usize,
}

/// Writes pages of one column chunk in order, tracking the file-absolute
/// offset of the first page (the dictionary page if present, else the
/// first data page) for `ColumnChunkMetaData`.
pub trait PageWriter {
    /// Returns the number of bytes written for this page (header + payload).
    fn write_page(&mut self, page: CompressedPage) -> Result<u64>;

    /// The file-absolute byte offset the next call to `write_page` will
    /// start at, so the caller can record a page's true location before
    /// writing it.
    fn current_offset(&self) -> u64;

    fn close(&mut self) -> Result<()>;
}

/// Minimal per-page metadata a [`PageReader`] exposes without decoding the
/// payload, used by the k-way merge to skip pages it doesn't need.
#[derive(Debug, Clone, Copy)]
pub struct PageMetadata {
    pub num_rows: usize,
    pub is_dict: bool,
}

pub trait PageReader: Iterator<Item = Result<Page>> {
    fn peek_next_page(&mut self) -> Result<Option<PageMetadata>>;
    fn skip_next_page(&mut self) -> Result<()>;
}
