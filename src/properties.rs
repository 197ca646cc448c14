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

//! Writer/reader/sorting-writer tuning knobs (spec.md §5 "Configuration"),
//! built through a builder the way the teacher's `file::properties` does,
//! immutable once built.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::basic::{Compression, DataPageVersion, Encoding};
use crate::file::metadata::SortingColumn;
use crate::schema::types::ColumnPath;
use crate::util::buffer_pool::{self, BufferPool};

pub const DEFAULT_PAGE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_WRITE_BATCH_SIZE: usize = 1024;
pub const DEFAULT_MAX_ROW_GROUP_SIZE: usize = 128 * 1024 * 1024;
pub const DEFAULT_COLUMN_INDEX_TRUNCATE_LENGTH: usize = 64;
pub const DEFAULT_DICTIONARY_SIZE_LIMIT: usize = 1024 * 1024;
pub const DEFAULT_CREATED_BY: &str = concat!("parquet-core version ", env!("CARGO_PKG_VERSION"));

/// Options controlling how the file writer lays out row groups, pages and
/// per-column chunk encodings (spec.md §5, §4.6).
#[derive(Debug, Clone)]
pub struct WriterProperties {
    pub data_page_size_limit: usize,
    pub write_buffer_size: usize,
    pub column_index_truncate_length: usize,
    pub data_page_version: DataPageVersion,
    pub data_page_statistics: bool,
    pub max_row_group_size: usize,
    pub dictionary_enabled: bool,
    pub dictionary_size_limit: usize,
    pub compression: Compression,
    pub column_compression: HashMap<ColumnPath, Compression>,
    pub column_encoding: HashMap<ColumnPath, Encoding>,
    pub sorting_columns: Option<Vec<SortingColumn>>,
    pub bloom_filter_columns: HashSet<ColumnPath>,
    pub key_value_metadata: Vec<(String, Option<String>)>,
    pub created_by: Option<String>,
    /// Supplies the scratch buffer each column writer assembles a page
    /// into; [`buffer_pool::HeapBufferPool`] by default.
    pub column_page_buffers: Arc<dyn BufferPool>,
}

impl WriterProperties {
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder::default()
    }

    pub fn compression_for(&self, path: &ColumnPath) -> Compression {
        self.column_compression
            .get(path)
            .copied()
            .unwrap_or(self.compression)
    }

    /// The configured encoding override for `path`, if any. `None` means
    /// the column falls back to its default plain-like encoding (spec.md
    /// §4.2); there is no crate-wide default encoding to fall back to.
    pub fn encoding_for(&self, path: &ColumnPath) -> Option<Encoding> {
        self.column_encoding.get(path).copied()
    }
}

impl Default for WriterProperties {
    fn default() -> Self {
        WriterProperties::builder().build()
    }
}

pub struct WriterPropertiesBuilder {
    data_page_size_limit: usize,
    write_buffer_size: usize,
    column_index_truncate_length: usize,
    data_page_version: DataPageVersion,
    data_page_statistics: bool,
    max_row_group_size: usize,
    dictionary_enabled: bool,
    dictionary_size_limit: usize,
    compression: Compression,
    column_compression: HashMap<ColumnPath, Compression>,
    column_encoding: HashMap<ColumnPath, Encoding>,
    sorting_columns: Option<Vec<SortingColumn>>,
    bloom_filter_columns: HashSet<ColumnPath>,
    key_value_metadata: Vec<(String, Option<String>)>,
    created_by: Option<String>,
    column_page_buffers: Arc<dyn BufferPool>,
}

impl Default for WriterPropertiesBuilder {
    fn default() -> Self {
        WriterPropertiesBuilder {
            data_page_size_limit: DEFAULT_PAGE_SIZE,
            write_buffer_size: DEFAULT_PAGE_SIZE,
            column_index_truncate_length: DEFAULT_COLUMN_INDEX_TRUNCATE_LENGTH,
            data_page_version: DataPageVersion::V1,
            data_page_statistics: true,
            max_row_group_size: DEFAULT_MAX_ROW_GROUP_SIZE,
            dictionary_enabled: true,
            dictionary_size_limit: DEFAULT_DICTIONARY_SIZE_LIMIT,
            compression: Compression::UNCOMPRESSED,
            column_compression: HashMap::new(),
            column_encoding: HashMap::new(),
            sorting_columns: None,
            bloom_filter_columns: HashSet::new(),
            key_value_metadata: Vec::new(),
            created_by: Some(DEFAULT_CREATED_BY.to_string()),
            column_page_buffers: buffer_pool::heap(),
        }
    }
}

impl WriterPropertiesBuilder {
    pub fn set_data_page_size_limit(mut self, value: usize) -> Self {
        self.data_page_size_limit = value;
        self
    }

    pub fn set_write_batch_size(mut self, value: usize) -> Self {
        self.write_buffer_size = value;
        self
    }

    pub fn set_column_index_truncate_length(mut self, value: usize) -> Self {
        self.column_index_truncate_length = value;
        self
    }

    pub fn set_data_page_version(mut self, value: DataPageVersion) -> Self {
        self.data_page_version = value;
        self
    }

    pub fn set_data_page_statistics_enabled(mut self, value: bool) -> Self {
        self.data_page_statistics = value;
        self
    }

    pub fn set_max_row_group_size(mut self, value: usize) -> Self {
        self.max_row_group_size = value;
        self
    }

    pub fn set_dictionary_enabled(mut self, value: bool) -> Self {
        self.dictionary_enabled = value;
        self
    }

    pub fn set_dictionary_size_limit(mut self, value: usize) -> Self {
        self.dictionary_size_limit = value;
        self
    }

    pub fn set_compression(mut self, value: Compression) -> Self {
        self.compression = value;
        self
    }

    pub fn set_column_compression(mut self, path: ColumnPath, value: Compression) -> Self {
        self.column_compression.insert(path, value);
        self
    }

    pub fn set_column_encoding(mut self, path: ColumnPath, value: Encoding) -> Self {
        self.column_encoding.insert(path, value);
        self
    }

    pub fn set_column_page_buffers(mut self, value: Arc<dyn BufferPool>) -> Self {
        self.column_page_buffers = value;
        self
    }

    pub fn set_sorting_columns(mut self, value: Option<Vec<SortingColumn>>) -> Self {
        self.sorting_columns = value;
        self
    }

    pub fn set_bloom_filter_enabled_for_column(mut self, path: ColumnPath) -> Self {
        self.bloom_filter_columns.insert(path);
        self
    }

    pub fn set_key_value_metadata(mut self, value: Vec<(String, Option<String>)>) -> Self {
        self.key_value_metadata = value;
        self
    }

    pub fn set_created_by(mut self, value: String) -> Self {
        self.created_by = Some(value);
        self
    }

    pub fn build(self) -> WriterProperties {
        WriterProperties {
            data_page_size_limit: self.data_page_size_limit,
            write_buffer_size: self.write_buffer_size,
            column_index_truncate_length: self.column_index_truncate_length,
            data_page_version: self.data_page_version,
            data_page_statistics: self.data_page_statistics,
            max_row_group_size: self.max_row_group_size,
            dictionary_enabled: self.dictionary_enabled,
            dictionary_size_limit: self.dictionary_size_limit,
            compression: self.compression,
            column_compression: self.column_compression,
            column_encoding: self.column_encoding,
            sorting_columns: self.sorting_columns,
            bloom_filter_columns: self.bloom_filter_columns,
            key_value_metadata: self.key_value_metadata,
            created_by: self.created_by,
            column_page_buffers: self.column_page_buffers,
        }
    }
}

/// Read-time knobs (spec.md §5): skipping index structures a caller doesn't
/// need keeps the footer parse path from paying for work that's thrown away.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderProperties {
    pub skip_page_index: bool,
    pub skip_bloom_filters: bool,
    /// When `true`, a page CRC mismatch is logged (`warn!`) and the page is
    /// still decoded; when `false` (the default) it is a fatal
    /// [`crate::errors::ParquetError::MalformedFile`] for that page (spec.md
    /// §8: "Readers treat CRC failures as fatal for the affected page
    /// (configurable to skip)").
    pub tolerate_crc_errors: bool,
}

/// Sorting-writer-specific knobs layered on top of [`WriterProperties`]
/// (spec.md §4.7).
#[derive(Debug, Clone, Copy)]
pub struct SortingWriterProperties {
    pub sort_row_count: usize,
    pub drop_duplicated_rows: bool,
}

impl Default for SortingWriterProperties {
    fn default() -> Self {
        SortingWriterProperties {
            sort_row_count: DEFAULT_MAX_ROW_GROUP_SIZE / 64,
            drop_duplicated_rows: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_teacher_conventions() {
        let props = WriterProperties::builder().build();
        assert_eq!(props.compression, Compression::UNCOMPRESSED);
        assert!(props.dictionary_enabled);
        assert_eq!(props.data_page_version, DataPageVersion::V1);
    }

    #[test]
    fn per_column_compression_overrides_the_default() {
        let path = ColumnPath::from_iter(["a", "b"]);
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_column_compression(path.clone(), Compression::GZIP)
            .build();
        assert_eq!(props.compression_for(&path), Compression::GZIP);
        let other = ColumnPath::from_iter(["a", "c"]);
        assert_eq!(props.compression_for(&other), Compression::SNAPPY);
    }

    #[test]
    fn per_column_encoding_override_falls_back_to_none() {
        let path = ColumnPath::from_iter(["a", "b"]);
        let props = WriterProperties::builder()
            .set_column_encoding(path.clone(), Encoding::DELTA_BINARY_PACKED)
            .build();
        assert_eq!(props.encoding_for(&path), Some(Encoding::DELTA_BINARY_PACKED));
        let other = ColumnPath::from_iter(["a", "c"]);
        assert_eq!(props.encoding_for(&other), None);
    }

    #[test]
    fn default_column_page_buffers_cap_is_unbounded() {
        let props = WriterProperties::builder().build();
        assert!(props.column_page_buffers.max_buffer_size().is_none());
    }
}
