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

//! Translation between this crate's [`FileMetaData`]/[`Page`] types and the
//! Thrift-generated `parquet_format` structs the footer and page headers are
//! actually written as (spec.md §4.6, §6). Kept separate from
//! `file::metadata` the same way the teacher splits its own `FileMetaData`
//! from `parquet_format::FileMetaData`.

use crate::basic::{PageType, Type as PhysicalType};
use crate::column::page::{CompressedPage, Page};
use crate::data_type::{ByteArray, Int96};
use crate::errors::{malformed_err, Result};
use crate::file::metadata::{
    ColumnChunkMetaData, ColumnIndex, FileMetaData, OffsetIndex, RowGroupMetaData, SortingColumn,
};
use crate::file::statistics::Statistics;
use crate::schema::{from_thrift_schema, to_thrift_schema};
use crate::value::PhysicalValue;

const PARQUET_FORMAT_VERSION: i32 = 1;

pub fn to_thrift_file_metadata(meta: &FileMetaData) -> parquet_format::FileMetaData {
    parquet_format::FileMetaData {
        version: PARQUET_FORMAT_VERSION,
        schema: to_thrift_schema(meta.schema.root_schema()),
        num_rows: meta.num_rows,
        row_groups: meta.row_groups.iter().map(row_group_to_thrift).collect(),
        key_value_metadata: (!meta.key_value_metadata.is_empty()).then(|| {
            meta.key_value_metadata
                .iter()
                .map(|(k, v)| parquet_format::KeyValue {
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect()
        }),
        created_by: meta.created_by.clone(),
        column_orders: None,
        encryption_algorithm: None,
        footer_signing_key_metadata: None,
    }
}

pub fn from_thrift_file_metadata(thrift_meta: parquet_format::FileMetaData) -> Result<FileMetaData> {
    let schema = std::sync::Arc::new(from_thrift_schema(&thrift_meta.schema)?);
    let row_groups = thrift_meta
        .row_groups
        .into_iter()
        .map(row_group_from_thrift)
        .collect::<Result<Vec<_>>>()?;
    let key_value_metadata = thrift_meta
        .key_value_metadata
        .unwrap_or_default()
        .into_iter()
        .map(|kv| (kv.key, kv.value))
        .collect();
    Ok(FileMetaData {
        schema,
        num_rows: thrift_meta.num_rows,
        row_groups,
        key_value_metadata,
        created_by: thrift_meta.created_by,
    })
}

fn row_group_to_thrift(rg: &RowGroupMetaData) -> parquet_format::RowGroup {
    parquet_format::RowGroup {
        columns: rg.columns.iter().map(column_chunk_to_thrift).collect(),
        total_byte_size: rg.total_byte_size,
        num_rows: rg.num_rows,
        sorting_columns: rg.sorting_columns.as_ref().map(|cols| {
            cols.iter()
                .map(|c| parquet_format::SortingColumn {
                    column_idx: c.column_idx,
                    descending: c.descending,
                    nulls_first: c.nulls_first,
                })
                .collect()
        }),
        file_offset: Some(rg.file_offset),
        total_compressed_size: Some(rg.total_compressed_size()),
        ordinal: None,
    }
}

fn row_group_from_thrift(rg: parquet_format::RowGroup) -> Result<RowGroupMetaData> {
    let sorting_columns = rg.sorting_columns.map(|cols| {
        cols.into_iter()
            .map(|c| SortingColumn {
                column_idx: c.column_idx,
                descending: c.descending,
                nulls_first: c.nulls_first,
            })
            .collect()
    });
    Ok(RowGroupMetaData {
        columns: rg
            .columns
            .into_iter()
            .map(column_chunk_from_thrift)
            .collect::<Result<Vec<_>>>()?,
        num_rows: rg.num_rows,
        total_byte_size: rg.total_byte_size,
        sorting_columns,
        file_offset: rg.file_offset.unwrap_or(0),
    })
}

fn column_chunk_to_thrift(col: &ColumnChunkMetaData) -> parquet_format::ColumnChunk {
    let meta = parquet_format::ColumnMetaData {
        type_: col.physical_type.into(),
        encodings: col.encodings.iter().map(|&e| e.into()).collect(),
        path_in_schema: col.column_path.clone(),
        codec: col.compression.into(),
        num_values: col.num_values,
        total_uncompressed_size: col.total_uncompressed_size,
        total_compressed_size: col.total_compressed_size,
        key_value_metadata: None,
        data_page_offset: col.data_page_offset,
        index_page_offset: None,
        dictionary_page_offset: col.dictionary_page_offset,
        statistics: col.statistics.as_ref().map(statistics_to_thrift),
        encoding_stats: None,
        bloom_filter_offset: col.bloom_filter_offset,
        bloom_filter_length: col.bloom_filter_length,
    };
    parquet_format::ColumnChunk {
        file_path: None,
        file_offset: col.dictionary_page_offset.unwrap_or(col.data_page_offset),
        meta_data: Some(meta),
        offset_index_offset: col.offset_index_offset,
        offset_index_length: col.offset_index_length,
        column_index_offset: col.column_index_offset,
        column_index_length: col.column_index_length,
        crypto_metadata: None,
        encrypted_column_metadata: None,
    }
}

fn column_chunk_from_thrift(chunk: parquet_format::ColumnChunk) -> Result<ColumnChunkMetaData> {
    let meta = chunk
        .meta_data
        .ok_or_else(|| malformed_err!("column chunk missing meta_data"))?;
    let physical_type = meta.type_.into();
    let statistics = meta
        .statistics
        .map(|s| statistics_from_thrift(&s, physical_type))
        .transpose()?;
    Ok(ColumnChunkMetaData {
        column_path: meta.path_in_schema,
        physical_type,
        encodings: meta.encodings.into_iter().map(Into::into).collect(),
        compression: meta.codec.into(),
        num_values: meta.num_values,
        total_uncompressed_size: meta.total_uncompressed_size,
        total_compressed_size: meta.total_compressed_size,
        data_page_offset: meta.data_page_offset,
        dictionary_page_offset: meta.dictionary_page_offset,
        statistics,
        bloom_filter_offset: meta.bloom_filter_offset,
        bloom_filter_length: meta.bloom_filter_length,
        column_index_offset: chunk.column_index_offset,
        column_index_length: chunk.column_index_length,
        offset_index_offset: chunk.offset_index_offset,
        offset_index_length: chunk.offset_index_length,
    })
}

/// Builds the trailing ColumnIndex section for one chunk (spec.md §4.3 step
/// 7, §3 "carries ColumnIndex, OffsetIndex"). Min/max are stored as raw
/// bytes the same way chunk statistics are (`physical_value_to_bytes`); a
/// null page gets an empty vec in both.
pub fn column_index_to_thrift(index: &ColumnIndex) -> parquet_format::ColumnIndex {
    let bytes_of = |v: &Option<PhysicalValue>| v.as_ref().map(physical_value_to_bytes).unwrap_or_default();
    parquet_format::ColumnIndex {
        null_pages: index.null_pages.clone(),
        min_values: index.min_values.iter().map(bytes_of).collect(),
        max_values: index.max_values.iter().map(bytes_of).collect(),
        boundary_order: parquet_format::BoundaryOrder::Unordered,
        null_counts: Some(index.null_counts.clone()),
        repetition_level_histograms: None,
        definition_level_histograms: None,
    }
}

/// Builds the trailing OffsetIndex section for one chunk (spec.md §4.3 step
/// 7, §8's offset-index seek property).
pub fn offset_index_to_thrift(index: &OffsetIndex) -> parquet_format::OffsetIndex {
    parquet_format::OffsetIndex {
        page_locations: index
            .page_locations
            .iter()
            .map(|p| parquet_format::PageLocation {
                offset: p.offset,
                compressed_page_size: p.compressed_page_size,
                first_row_index: p.first_row_index,
            })
            .collect(),
        unencoded_byte_array_data_bytes: None,
    }
}

/// Builds the header written immediately before a bloom filter's bitset
/// (spec.md §4.5). This crate only ever writes split-block/XXHASH/
/// uncompressed filters, so the algorithm/hash/compression fields are
/// fixed.
pub fn bloom_filter_header_thrift(num_bytes: i32) -> parquet_format::BloomFilterHeader {
    parquet_format::BloomFilterHeader {
        num_bytes,
        algorithm: parquet_format::BloomFilterAlgorithm::BLOCK(parquet_format::SplitBlockAlgorithm {}),
        hash: parquet_format::BloomFilterHash::XXHASH(parquet_format::XxHash {}),
        compression: parquet_format::BloomFilterCompression::UNCOMPRESSED(parquet_format::Uncompressed {}),
    }
}

fn statistics_to_thrift(stats: &Statistics) -> parquet_format::Statistics {
    parquet_format::Statistics {
        max: None,
        min: None,
        null_count: Some(stats.null_count()),
        distinct_count: stats.distinct_count(),
        max_value: stats.max().map(physical_value_to_bytes),
        min_value: stats.min().map(physical_value_to_bytes),
        is_max_value_exact: Some(true),
        is_min_value_exact: Some(true),
    }
}

fn statistics_from_thrift(
    t: &parquet_format::Statistics,
    physical_type: PhysicalType,
) -> Result<Statistics> {
    let mut stats = Statistics::new();
    if let Some(n) = t.null_count {
        stats.set_null_count(n);
    }
    if let Some(d) = t.distinct_count {
        stats.set_distinct_count(d);
    }
    let min_bytes = t.min_value.as_deref().or(t.min.as_deref());
    let max_bytes = t.max_value.as_deref().or(t.max.as_deref());
    if let Some(bytes) = min_bytes {
        stats.set_min(bytes_to_physical_value(bytes, physical_type)?);
    }
    if let Some(bytes) = max_bytes {
        stats.set_max(bytes_to_physical_value(bytes, physical_type)?);
    }
    Ok(stats)
}

/// Thrift `min_value`/`max_value` store a value's raw bytes with no
/// framing: fixed little-endian width for numerics, the bytes as-is for
/// byte arrays (unlike PLAIN page encoding, which length-prefixes them;
/// spec.md §4.3 "Statistics").
fn physical_value_to_bytes(value: &PhysicalValue) -> Vec<u8> {
    match value {
        PhysicalValue::Null => Vec::new(),
        PhysicalValue::Boolean(b) => vec![*b as u8],
        PhysicalValue::Int32(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Int64(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Int96(v) => v.data().iter().flat_map(|w| w.to_le_bytes()).collect(),
        PhysicalValue::Float(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::Double(v) => v.to_le_bytes().to_vec(),
        PhysicalValue::ByteArray(b) | PhysicalValue::FixedLenByteArray(b) => b.data().to_vec(),
    }
}

fn bytes_to_physical_value(bytes: &[u8], physical_type: PhysicalType) -> Result<PhysicalValue> {
    let err = || malformed_err!("truncated statistics value for {physical_type:?}");
    Ok(match physical_type {
        PhysicalType::BOOLEAN => PhysicalValue::Boolean(*bytes.first().ok_or_else(err)? != 0),
        PhysicalType::INT32 => {
            PhysicalValue::Int32(i32::from_le_bytes(bytes.try_into().map_err(|_| err())?))
        }
        PhysicalType::INT64 => {
            PhysicalValue::Int64(i64::from_le_bytes(bytes.try_into().map_err(|_| err())?))
        }
        PhysicalType::INT96 => {
            if bytes.len() != 12 {
                return Err(err());
            }
            let w = |i: usize| u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
            PhysicalValue::Int96(Int96::new([w(0), w(1), w(2)]))
        }
        PhysicalType::FLOAT => {
            PhysicalValue::Float(f32::from_le_bytes(bytes.try_into().map_err(|_| err())?))
        }
        PhysicalType::DOUBLE => {
            PhysicalValue::Double(f64::from_le_bytes(bytes.try_into().map_err(|_| err())?))
        }
        PhysicalType::BYTE_ARRAY => PhysicalValue::ByteArray(ByteArray::from(bytes)),
        PhysicalType::FIXED_LEN_BYTE_ARRAY => PhysicalValue::FixedLenByteArray(ByteArray::from(bytes)),
    })
}

/// Builds the Thrift page header for an already-compressed page, crc
/// included (spec.md §4.3 step 6).
pub fn page_header_of(page: &CompressedPage, crc: u32) -> parquet_format::PageHeader {
    let compressed_size = page.page.buffer().len() as i32;
    match &page.page {
        Page::DataPageV1 {
            num_values,
            encoding,
            def_level_encoding,
            rep_level_encoding,
            statistics,
            ..
        } => parquet_format::PageHeader {
            type_: PageType::DATA_PAGE.into(),
            uncompressed_page_size: page.uncompressed_size as i32,
            compressed_page_size: compressed_size,
            crc: Some(crc as i32),
            data_page_header: Some(parquet_format::DataPageHeader {
                num_values: *num_values as i32,
                encoding: (*encoding).into(),
                definition_level_encoding: (*def_level_encoding).into(),
                repetition_level_encoding: (*rep_level_encoding).into(),
                statistics: Some(statistics_to_thrift(statistics)),
            }),
            index_page_header: None,
            dictionary_page_header: None,
            data_page_header_v2: None,
        },
        Page::DataPageV2 {
            num_values,
            num_nulls,
            num_rows,
            encoding,
            def_levels_byte_len,
            rep_levels_byte_len,
            is_compressed,
            statistics,
            ..
        } => parquet_format::PageHeader {
            type_: PageType::DATA_PAGE_V2.into(),
            uncompressed_page_size: page.uncompressed_size as i32,
            compressed_page_size: compressed_size,
            crc: Some(crc as i32),
            data_page_header: None,
            index_page_header: None,
            dictionary_page_header: None,
            data_page_header_v2: Some(parquet_format::DataPageHeaderV2 {
                num_values: *num_values as i32,
                num_nulls: *num_nulls as i32,
                num_rows: *num_rows as i32,
                encoding: (*encoding).into(),
                definition_levels_byte_length: *def_levels_byte_len as i32,
                repetition_levels_byte_length: *rep_levels_byte_len as i32,
                is_compressed: Some(*is_compressed),
                statistics: Some(statistics_to_thrift(statistics)),
            }),
        },
        Page::DictionaryPage {
            num_values,
            encoding,
            is_sorted,
            ..
        } => parquet_format::PageHeader {
            type_: PageType::DICTIONARY_PAGE.into(),
            uncompressed_page_size: page.uncompressed_size as i32,
            compressed_page_size: compressed_size,
            crc: Some(crc as i32),
            data_page_header: None,
            index_page_header: None,
            dictionary_page_header: Some(parquet_format::DictionaryPageHeader {
                num_values: *num_values as i32,
                encoding: (*encoding).into(),
                is_sorted: Some(*is_sorted),
            }),
            data_page_header_v2: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Compression, Type as PhysicalType};
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder, SchemaDescriptor};
    use std::sync::Arc;

    #[test]
    fn file_metadata_round_trips_through_thrift() {
        let leaf = PrimitiveTypeBuilder::new("n", PhysicalType::INT32).build().unwrap();
        let root = GroupTypeBuilder::new_root("schema")
            .with_fields(vec![Arc::new(leaf)])
            .build()
            .unwrap();
        let schema = Arc::new(SchemaDescriptor::new(Arc::new(root)).unwrap());
        let column = ColumnChunkMetaData {
            column_path: vec!["n".to_string()],
            physical_type: PhysicalType::INT32,
            encodings: vec![crate::basic::Encoding::PLAIN],
            compression: Compression::UNCOMPRESSED,
            num_values: 3,
            total_uncompressed_size: 12,
            total_compressed_size: 12,
            data_page_offset: 4,
            dictionary_page_offset: None,
            statistics: None,
            bloom_filter_offset: None,
            bloom_filter_length: None,
            column_index_offset: None,
            column_index_length: None,
            offset_index_offset: None,
            offset_index_length: None,
        };
        let rg = RowGroupMetaData {
            columns: vec![column],
            num_rows: 3,
            total_byte_size: 12,
            sorting_columns: None,
            file_offset: 4,
        };
        let meta = FileMetaData {
            schema,
            num_rows: 3,
            row_groups: vec![rg],
            key_value_metadata: vec![],
            created_by: Some("parquet-core".to_string()),
        };
        let thrift = to_thrift_file_metadata(&meta);
        let restored = from_thrift_file_metadata(thrift).unwrap();
        assert_eq!(restored.num_rows, 3);
        assert_eq!(restored.row_groups.len(), 1);
        assert_eq!(restored.row_groups[0].columns[0].num_values, 3);
    }

    #[test]
    fn statistics_round_trip_plain_bytes() {
        let mut stats = Statistics::new();
        stats.set_min(PhysicalValue::Int32(1));
        stats.set_max(PhysicalValue::Int32(9));
        stats.set_null_count(2);
        let thrift = statistics_to_thrift(&stats);
        let restored = statistics_from_thrift(&thrift, PhysicalType::INT32).unwrap();
        assert_eq!(restored.min(), Some(&PhysicalValue::Int32(1)));
        assert_eq!(restored.max(), Some(&PhysicalValue::Int32(9)));
        assert_eq!(restored.null_count(), 2);
    }

    #[test]
    fn column_index_carries_one_entry_per_page() {
        use crate::file::metadata::ColumnIndex;

        let mut index = ColumnIndex::default();
        let mut page1 = Statistics::new();
        page1.set_min(PhysicalValue::Int32(1));
        page1.set_max(PhysicalValue::Int32(5));
        index.push(&page1);
        index.push(&Statistics::new());
        let thrift = column_index_to_thrift(&index);
        assert_eq!(thrift.null_pages, vec![false, true]);
        assert_eq!(thrift.min_values[0], 1i32.to_le_bytes().to_vec());
        assert!(thrift.min_values[1].is_empty());
    }

    #[test]
    fn offset_index_preserves_page_locations_in_order() {
        use crate::file::metadata::{OffsetIndex, PageLocation};

        let index = OffsetIndex {
            page_locations: vec![
                PageLocation { offset: 10, compressed_page_size: 20, first_row_index: 0 },
                PageLocation { offset: 30, compressed_page_size: 15, first_row_index: 100 },
            ],
        };
        let thrift = offset_index_to_thrift(&index);
        assert_eq!(thrift.page_locations.len(), 2);
        assert_eq!(thrift.page_locations[1].offset, 30);
        assert_eq!(thrift.page_locations[1].first_row_index, 100);
    }
}
