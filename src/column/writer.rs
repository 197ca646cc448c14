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

//! Drives one leaf's whole pipeline (spec.md §4.2-§4.4): buffer values,
//! maintain the dictionary until/unless it falls back, RLE-encode levels,
//! pick a value encoding, compress, CRC, and hand finished pages to a
//! [`PageWriter`]. One [`ColumnWriterImpl`] per leaf per row group.

use bytes::Bytes;
use crc32fast::Hasher as Crc32;
use log::{debug, trace};

use crate::basic::{Compression, DataPageVersion, Encoding};
use crate::bloom_filter::SplitBlockBloomFilter;
use crate::column::buffer::ColumnValueBuffer;
use crate::column::dictionary::Dictionary;
use crate::column::page::{CompressedPage, Page, PageWriter};
use crate::compression::{create_codec, Codec};
use crate::encodings::rle::RleEncoder;
use crate::encodings::{get_encoder, Encoder};
use crate::errors::Result;
use crate::file::metadata::{ColumnChunkMetaData, ColumnIndex, OffsetIndex, PageLocation};
use crate::schema::types::ColumnDescriptor;
use crate::util::bit_util::num_required_bits;
use crate::util::buffer_pool::{self, BufferPool};
use crate::value::Value;
use std::sync::Arc;

pub struct ColumnWriterOptions {
    pub compression: Compression,
    pub dictionary_enabled: bool,
    pub dictionary_size_limit: usize,
    pub page_size_limit: usize,
    pub data_page_version: DataPageVersion,
    pub data_page_statistics: bool,
    pub bloom_filter_enabled: bool,
    pub encoding: Option<Encoding>,
    pub page_buffers: Arc<dyn BufferPool>,
}

pub struct ColumnWriterImpl {
    descr: ColumnDescriptor,
    options: ColumnWriterOptions,
    buffer: ColumnValueBuffer,
    dictionary: Option<Dictionary>,
    dict_indices: Vec<u32>,
    use_dictionary: bool,
    fallback_encoding: Encoding,
    codec: Box<dyn Codec>,
    bloom_filter: Option<SplitBlockBloomFilter>,
    column_index: ColumnIndex,
    offset_index: OffsetIndex,
    encodings_used: Vec<Encoding>,
    total_num_values: i64,
    total_uncompressed_size: i64,
    total_compressed_size: i64,
    dictionary_page_offset: Option<i64>,
    data_page_offset: Option<i64>,
    rows_written_before_chunk: i64,
}

impl ColumnWriterImpl {
    pub fn new(descr: ColumnDescriptor, options: ColumnWriterOptions) -> Result<Self> {
        let codec = create_codec(options.compression)?;
        let use_dictionary = options.dictionary_enabled;
        let dictionary = use_dictionary.then(|| Dictionary::new(options.dictionary_size_limit));
        let bloom_filter = options
            .bloom_filter_enabled
            .then(|| SplitBlockBloomFilter::new(4096));
        let buffer = ColumnValueBuffer::new(&descr);
        Ok(ColumnWriterImpl {
            fallback_encoding: default_plain_like_encoding(&descr, options.encoding),
            descr,
            options,
            buffer,
            dictionary,
            dict_indices: Vec::new(),
            use_dictionary,
            codec,
            bloom_filter,
            column_index: ColumnIndex::default(),
            offset_index: OffsetIndex::default(),
            encodings_used: Vec::new(),
            total_num_values: 0,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
            dictionary_page_offset: None,
            data_page_offset: None,
            rows_written_before_chunk: 0,
        })
    }

    pub fn write_batch(&mut self, values: &[Value], page_writer: &mut dyn PageWriter) -> Result<()> {
        for v in values {
            self.write_one(v)?;
        }
        if self.estimated_buffered_bytes() >= self.options.page_size_limit {
            self.flush_data_page(page_writer)?;
        }
        Ok(())
    }

    fn write_one(&mut self, v: &Value) -> Result<()> {
        if let Some(bf) = &mut self.bloom_filter {
            if !v.is_null() {
                bf.insert(&v.physical);
            }
        }
        if self.use_dictionary && !v.is_null() {
            let dict = self.dictionary.as_mut().expect("use_dictionary implies Some");
            match dict.get_or_insert(&v.physical) {
                Some(idx) => self.dict_indices.push(idx),
                None => {
                    debug!(
                        "column {:?}: dictionary size limit reached at {} entries, falling back to {:?}",
                        self.descr.path(),
                        dict.num_entries(),
                        self.fallback_encoding
                    );
                    self.use_dictionary = false;
                }
            }
        }
        self.buffer.write_values(std::slice::from_ref(v));
        Ok(())
    }

    fn estimated_buffered_bytes(&self) -> usize {
        self.buffer.num_values() * 8
    }

    fn current_encoding(&self) -> Encoding {
        if self.use_dictionary {
            Encoding::RLE_DICTIONARY
        } else {
            self.fallback_encoding
        }
    }

    /// Emits the dictionary page, once, right before the first data page
    /// of the chunk (spec.md §4.3: "Dictionary pages are emitted once,
    /// before any data page of the chunk").
    fn flush_dictionary_page(&mut self, page_writer: &mut dyn PageWriter) -> Result<()> {
        let Some(dict) = &self.dictionary else { return Ok(()) };
        if dict.num_entries() == 0 || self.dictionary_page_offset.is_some() {
            return Ok(());
        }
        let mut encoder = get_encoder(Encoding::PLAIN, self.descr.physical_type(), self.descr.type_length())?;
        encoder.put(dict.values())?;
        let raw = encoder.flush_buffer()?;
        let uncompressed_size = raw.len();
        let mut compressed = Vec::new();
        self.codec.compress(&raw, &mut compressed)?;
        let page = Page::DictionaryPage {
            buf: Bytes::from(compressed),
            num_values: dict.num_entries() as u32,
            encoding: Encoding::PLAIN,
            is_sorted: false,
        };
        let offset = page_writer.current_offset() as i64;
        let written = page_writer.write_page(CompressedPage { page, uncompressed_size })?;
        self.total_uncompressed_size += uncompressed_size as i64;
        self.total_compressed_size += written as i64;
        self.dictionary_page_offset = Some(offset);
        self.encodings_used.push(Encoding::PLAIN);
        Ok(())
    }

    pub fn flush_data_page(&mut self, page_writer: &mut dyn PageWriter) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.flush_dictionary_page(page_writer)?;

        let encoding = self.current_encoding();
        let value_bytes = if self.use_dictionary {
            self.encode_dictionary_indices()
        } else {
            let mut encoder = get_encoder(encoding, self.descr.physical_type(), self.descr.type_length())?;
            self.buffer.encode_values(encoder.as_mut())?
        };
        if !self.encodings_used.contains(&encoding) {
            self.encodings_used.push(encoding);
        }

        let rep_bytes = encode_level_stream(self.buffer.rep_levels(), self.descr.max_rep_level());
        let def_bytes = encode_level_stream(self.buffer.def_levels(), self.descr.max_def_level());
        let num_values = self.buffer.num_values() as u32;
        let num_rows = self.buffer.num_rows() as u32;
        let num_nulls = self.buffer.num_nulls() as u32;
        let stats = self.buffer.stats().clone();

        let (wire_buf, uncompressed_size) = match self.options.data_page_version {
            DataPageVersion::V1 => {
                let size_hint = 4 + rep_bytes.len() + 4 + def_bytes.len() + value_bytes.len();
                let mut raw = self.options.page_buffers.acquire(size_hint).into_vec();
                write_v1_level_section(&mut raw, &rep_bytes, self.descr.max_rep_level());
                write_v1_level_section(&mut raw, &def_bytes, self.descr.max_def_level());
                raw.extend_from_slice(&value_bytes);
                let uncompressed_size = raw.len();
                let mut compressed = Vec::new();
                self.codec.compress(&raw, &mut compressed)?;
                (compressed, uncompressed_size)
            }
            DataPageVersion::V2 => {
                let uncompressed_size = rep_bytes.len() + def_bytes.len() + value_bytes.len();
                let mut compressed_values = Vec::new();
                self.codec.compress(&value_bytes, &mut compressed_values)?;
                let mut wire = Vec::with_capacity(rep_bytes.len() + def_bytes.len() + compressed_values.len());
                wire.extend_from_slice(&rep_bytes);
                wire.extend_from_slice(&def_bytes);
                wire.extend_from_slice(&compressed_values);
                (wire, uncompressed_size)
            }
        };

        let first_row_index = self.rows_written_before_chunk;
        self.rows_written_before_chunk += num_rows as i64;

        let page = match self.options.data_page_version {
            DataPageVersion::V1 => Page::DataPageV1 {
                buf: Bytes::from(wire_buf),
                num_values,
                encoding,
                def_level_encoding: Encoding::RLE,
                rep_level_encoding: Encoding::RLE,
                statistics: stats,
            },
            DataPageVersion::V2 => Page::DataPageV2 {
                buf: Bytes::from(wire_buf),
                num_values,
                num_nulls,
                num_rows,
                encoding,
                def_levels_byte_len: def_bytes.len() as u32,
                rep_levels_byte_len: rep_bytes.len() as u32,
                is_compressed: self.options.compression != Compression::UNCOMPRESSED,
                statistics: stats,
            },
        };

        let page_stats = page.statistics().cloned();
        let compressed_size = page.buffer().len();
        let offset = page_writer.current_offset() as i64;
        let written = page_writer.write_page(CompressedPage { page, uncompressed_size })?;
        trace!(
            "column {:?}: wrote page at offset {offset} ({num_values} values, {encoding:?}, {uncompressed_size}B -> {written}B)",
            self.descr.path()
        );

        if let Some(stats) = &page_stats {
            self.column_index.push(stats);
        }
        self.offset_index.page_locations.push(PageLocation {
            offset,
            compressed_page_size: written as i32,
            first_row_index,
        });

        self.total_num_values += num_values as i64;
        self.total_uncompressed_size += uncompressed_size as i64;
        self.total_compressed_size += compressed_size as i64;
        if self.data_page_offset.is_none() {
            self.data_page_offset = Some(offset);
        }

        self.buffer.reset();
        self.dict_indices.clear();
        Ok(())
    }

    fn encode_dictionary_indices(&self) -> Vec<u8> {
        let bit_width = self.dictionary.as_ref().map(Dictionary::bit_width).unwrap_or(1);
        let mut rle = RleEncoder::new(bit_width);
        let as_u64: Vec<u64> = self.dict_indices.iter().map(|&i| i as u64).collect();
        rle.put(&as_u64);
        let body = rle.consume();
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(bit_width as u8);
        out.extend(body);
        out
    }

    /// Closes the chunk: flushes any remaining buffered page, the bloom
    /// filter (if enabled), and returns the chunk's metadata (spec.md §4.6
    /// "Flush each column: emit its dictionary ... remaining data page(s),
    /// column index, offset index, bloom filter").
    pub fn close(
        mut self,
        page_writer: &mut dyn PageWriter,
    ) -> Result<(ColumnChunkMetaData, ColumnIndex, OffsetIndex, Option<SplitBlockBloomFilter>)> {
        self.flush_data_page(page_writer)?;
        page_writer.close()?;
        let metadata = ColumnChunkMetaData {
            column_path: self.descr.path().parts().to_vec(),
            physical_type: self.descr.physical_type(),
            encodings: self.encodings_used.clone(),
            compression: self.options.compression,
            num_values: self.total_num_values,
            total_uncompressed_size: self.total_uncompressed_size,
            total_compressed_size: self.total_compressed_size,
            data_page_offset: self.data_page_offset.unwrap_or(0),
            dictionary_page_offset: self.dictionary_page_offset,
            statistics: None,
            bloom_filter_offset: None,
            bloom_filter_length: None,
            column_index_offset: None,
            column_index_length: None,
            offset_index_offset: None,
            offset_index_length: None,
        };
        Ok((metadata, self.column_index, self.offset_index, self.bloom_filter))
    }
}

/// The fallback (non-dictionary) encoding for a leaf: the column's
/// configured encoding (spec.md §4.2, `WriterProperties::encoding_for`) if
/// one was set, else PLAIN. RLE_DICTIONARY is handled separately via
/// [`ColumnWriterImpl::encode_dictionary_indices`] and never goes through
/// here.
fn default_plain_like_encoding(_descr: &ColumnDescriptor, configured: Option<Encoding>) -> Encoding {
    configured.unwrap_or(Encoding::PLAIN)
}

fn encode_level_stream(levels: &[i16], max_level: i16) -> Vec<u8> {
    if max_level == 0 {
        return Vec::new();
    }
    let bit_width = num_required_bits(max_level as u64).max(1);
    let values: Vec<u64> = levels.iter().map(|&l| l as u64).collect();
    let mut enc = RleEncoder::new(bit_width);
    enc.put(&values);
    enc.consume()
}

fn write_v1_level_section(out: &mut Vec<u8>, encoded: &[u8], max_level: i16) {
    if max_level == 0 {
        return;
    }
    out.extend_from_slice(&(encoded.len() as i32).to_le_bytes());
    out.extend_from_slice(encoded);
}

/// IEEE CRC32 of the page's on-wire (compressed) payload (spec.md §4.3
/// step 5, §6).
pub fn page_crc32(buf: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(buf);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Repetition, Type as PhysicalType};
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder, SchemaDescriptor};
    use crate::value::PhysicalValue;
    use std::sync::Arc;

    struct VecPageWriter {
        pages: Vec<Page>,
        bytes_written: u64,
    }

    impl PageWriter for VecPageWriter {
        fn write_page(&mut self, page: CompressedPage) -> Result<u64> {
            let len = page.page.buffer().len() as u64;
            self.bytes_written += len;
            self.pages.push(page.page);
            Ok(len)
        }

        fn current_offset(&self) -> u64 {
            self.bytes_written
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn int_leaf_descr(repetition: Repetition) -> ColumnDescriptor {
        let leaf = PrimitiveTypeBuilder::new("n", PhysicalType::INT32)
            .with_repetition(repetition)
            .build()
            .unwrap();
        let root = GroupTypeBuilder::new_root("schema")
            .with_fields(vec![Arc::new(leaf)])
            .build()
            .unwrap();
        SchemaDescriptor::new(Arc::new(root)).unwrap().column(0).clone()
    }

    fn default_options() -> ColumnWriterOptions {
        ColumnWriterOptions {
            compression: Compression::UNCOMPRESSED,
            dictionary_enabled: false,
            dictionary_size_limit: 1024 * 1024,
            page_size_limit: 1024 * 1024,
            data_page_version: DataPageVersion::V1,
            data_page_statistics: true,
            bloom_filter_enabled: false,
            encoding: None,
            page_buffers: buffer_pool::heap(),
        }
    }

    #[test]
    fn closes_with_one_plain_page() {
        let descr = int_leaf_descr(Repetition::REQUIRED);
        let mut writer = ColumnWriterImpl::new(descr, default_options()).unwrap();
        let mut pw = VecPageWriter { pages: Vec::new(), bytes_written: 0 };
        let values: Vec<Value> = (0..10)
            .map(|i| Value::positioned(PhysicalValue::Int32(i), 0, 0, 0))
            .collect();
        writer.write_batch(&values, &mut pw).unwrap();
        let (meta, column_index, offset_index, _bf) = writer.close(&mut pw).unwrap();
        assert_eq!(meta.num_values, 10);
        assert_eq!(pw.pages.len(), 1);
        assert_eq!(column_index.null_pages.len(), 1);
        assert_eq!(offset_index.page_locations.len(), 1);
    }

    #[test]
    fn dictionary_fallback_switches_to_plain_mid_chunk() {
        let descr = int_leaf_descr(Repetition::REQUIRED);
        let mut options = default_options();
        options.dictionary_enabled = true;
        options.dictionary_size_limit = 8; // force an early fallback
        let mut writer = ColumnWriterImpl::new(descr, options).unwrap();
        let mut pw = VecPageWriter { pages: Vec::new(), bytes_written: 0 };
        let values: Vec<Value> = (0..50)
            .map(|i| Value::positioned(PhysicalValue::Int32(i), 0, 0, 0))
            .collect();
        writer.write_batch(&values, &mut pw).unwrap();
        let (meta, _ci, _oi, _bf) = writer.close(&mut pw).unwrap();
        assert_eq!(meta.num_values, 50);
        assert!(meta.encodings.contains(&Encoding::RLE_DICTIONARY));
        assert!(meta.encodings.contains(&Encoding::PLAIN));
    }

    #[test]
    fn nested_optional_column_emits_def_level_stream() {
        let descr = int_leaf_descr(Repetition::OPTIONAL);
        let mut writer = ColumnWriterImpl::new(descr, default_options()).unwrap();
        let mut pw = VecPageWriter { pages: Vec::new(), bytes_written: 0 };
        let values = vec![
            Value::positioned(PhysicalValue::Int32(1), 0, 1, 0),
            Value::positioned(PhysicalValue::Null, 0, 0, 0),
        ];
        writer.write_batch(&values, &mut pw).unwrap();
        let (meta, _ci, _oi, _bf) = writer.close(&mut pw).unwrap();
        assert_eq!(meta.num_values, 2);
    }

    #[test]
    fn configured_delta_encoding_is_actually_selected() {
        let descr = int_leaf_descr(Repetition::REQUIRED);
        let mut options = default_options();
        options.encoding = Some(Encoding::DELTA_BINARY_PACKED);
        let mut writer = ColumnWriterImpl::new(descr, options).unwrap();
        let mut pw = VecPageWriter { pages: Vec::new(), bytes_written: 0 };
        let values: Vec<Value> = (0..20)
            .map(|i| Value::positioned(PhysicalValue::Int32(i), 0, 0, 0))
            .collect();
        writer.write_batch(&values, &mut pw).unwrap();
        let (meta, _ci, _oi, _bf) = writer.close(&mut pw).unwrap();
        assert_eq!(meta.encodings, vec![Encoding::DELTA_BINARY_PACKED]);
    }

    #[test]
    fn page_and_dictionary_offsets_are_file_absolute() {
        let descr = int_leaf_descr(Repetition::REQUIRED);
        let mut options = default_options();
        options.dictionary_enabled = true;
        let mut writer = ColumnWriterImpl::new(descr, options).unwrap();
        let mut pw = VecPageWriter { pages: Vec::new(), bytes_written: 0 };
        pw.bytes_written = 128; // pretend earlier column chunks already occupy the file
        let values: Vec<Value> = (0..5)
            .map(|i| Value::positioned(PhysicalValue::Int32(i), 0, 0, 0))
            .collect();
        writer.write_batch(&values, &mut pw).unwrap();
        let (meta, _ci, oi, _bf) = writer.close(&mut pw).unwrap();
        assert_eq!(meta.dictionary_page_offset, Some(128));
        assert!(meta.data_page_offset > 128);
        assert!(oi.page_locations[0].offset > meta.dictionary_page_offset.unwrap());
    }
}
