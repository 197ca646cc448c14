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

//! Footer-driven file/row-group/page readers (spec.md §4.6), generic over
//! [`ChunkReader`] the way the teacher's `SerializedFileReader` is generic
//! over `File`/`Bytes`.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use log::warn;
use thrift::protocol::TCompactInputProtocol;

use crate::basic::PageType;
use crate::column::page::{CompressedPage, Page, PageMetadata, PageReader};
use crate::column::writer::page_crc32;
use crate::compression::create_codec;
use crate::errors::{malformed_err, Result};
use crate::file::footer;
use crate::file::metadata::{ColumnChunkMetaData, FileMetaData, RowGroupMetaData};
use crate::file::writer::PARQUET_MAGIC;
use crate::properties::ReaderProperties;
use crate::schema::types::ColumnDescriptor;
use crate::util::io::ChunkReader;

const FOOTER_SUFFIX_LEN: u64 = 8; // 4-byte footer length + 4-byte "PAR1"

pub trait FileReader {
    fn metadata(&self) -> &FileMetaData;
    fn num_row_groups(&self) -> usize;
    fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>>;
}

pub trait RowGroupReader {
    fn metadata(&self) -> &RowGroupMetaData;
    fn num_columns(&self) -> usize;
    fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader + '_>>;
}

pub struct SerializedFileReader<R> {
    chunk_reader: Arc<R>,
    metadata: FileMetaData,
    properties: ReaderProperties,
}

impl<R: ChunkReader> SerializedFileReader<R> {
    pub fn new(chunk_reader: R) -> Result<Self> {
        Self::new_with_properties(chunk_reader, ReaderProperties::default())
    }

    pub fn new_with_properties(chunk_reader: R, properties: ReaderProperties) -> Result<Self> {
        let metadata = read_footer(&chunk_reader)?;
        Ok(SerializedFileReader {
            chunk_reader: Arc::new(chunk_reader),
            metadata,
            properties,
        })
    }
}

impl<R: ChunkReader> FileReader for SerializedFileReader<R> {
    fn metadata(&self) -> &FileMetaData {
        &self.metadata
    }

    fn num_row_groups(&self) -> usize {
        self.metadata.num_row_groups()
    }

    fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>> {
        let rg_metadata = self
            .metadata
            .row_groups
            .get(i)
            .ok_or_else(|| malformed_err!("row group {i} out of range"))?;
        Ok(Box::new(SerializedRowGroupReader {
            chunk_reader: self.chunk_reader.clone(),
            schema: self.metadata.schema.clone(),
            rg_metadata,
            properties: self.properties,
        }))
    }
}

/// Reads the trailing `length || "PAR1"` and the Thrift footer it points at
/// (spec.md §4.6: "footer offset = file_size - 8 - footer_length").
fn read_footer<R: ChunkReader>(chunk_reader: &R) -> Result<FileMetaData> {
    let file_size = chunk_reader.len();
    if file_size < (PARQUET_MAGIC.len() as u64) * 2 + FOOTER_SUFFIX_LEN {
        return Err(malformed_err!("file too small to contain a parquet footer"));
    }
    let suffix = chunk_reader.get_bytes(file_size - FOOTER_SUFFIX_LEN, FOOTER_SUFFIX_LEN as usize)?;
    if &suffix[4..8] != PARQUET_MAGIC.as_slice() {
        return Err(malformed_err!("file does not end with the PAR1 magic"));
    }
    let footer_len = u32::from_le_bytes(suffix[0..4].try_into().unwrap()) as u64;
    let footer_start = file_size - FOOTER_SUFFIX_LEN - footer_len;
    let footer_bytes = chunk_reader.get_bytes(footer_start, footer_len as usize)?;
    let mut protocol = TCompactInputProtocol::new(footer_bytes.as_ref());
    let thrift_meta = parquet_format::FileMetaData::read_from_in_protocol(&mut protocol)
        .map_err(|e| malformed_err!("failed to decode footer: {e}"))?;
    footer::from_thrift_file_metadata(thrift_meta)
}

pub struct SerializedRowGroupReader<'a, R> {
    chunk_reader: Arc<R>,
    schema: crate::schema::types::SchemaDescPtr,
    rg_metadata: &'a RowGroupMetaData,
    properties: ReaderProperties,
}

impl<'a, R: ChunkReader> RowGroupReader for SerializedRowGroupReader<'a, R> {
    fn metadata(&self) -> &RowGroupMetaData {
        self.rg_metadata
    }

    fn num_columns(&self) -> usize {
        self.rg_metadata.columns.len()
    }

    fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader + '_>> {
        let col_metadata = self
            .rg_metadata
            .columns
            .get(i)
            .ok_or_else(|| malformed_err!("column {i} out of range in row group"))?;
        let descr = self.schema.column(i).clone();
        let start = col_metadata
            .dictionary_page_offset
            .unwrap_or(col_metadata.data_page_offset) as u64;
        let len = col_metadata.total_compressed_size as usize;
        let reader = self.chunk_reader.get_read(start, len)?;
        Ok(Box::new(SerializedPageReader {
            reader: Box::new(reader),
            descr,
            codec: create_codec(col_metadata.compression)?,
            remaining_values: col_metadata.num_values,
            exhausted: false,
            tolerate_crc_errors: self.properties.tolerate_crc_errors,
        }))
    }
}

pub struct SerializedPageReader {
    reader: Box<dyn Read>,
    descr: ColumnDescriptor,
    codec: Box<dyn crate::compression::Codec>,
    remaining_values: i64,
    exhausted: bool,
    tolerate_crc_errors: bool,
}

impl SerializedPageReader {
    fn read_one(&mut self) -> Result<Option<Page>> {
        if self.exhausted || self.remaining_values <= 0 {
            return Ok(None);
        }
        let mut protocol = TCompactInputProtocol::new(&mut *self.reader);
        let header = match parquet_format::PageHeader::read_from_in_protocol(&mut protocol) {
            Ok(h) => h,
            Err(_) => {
                self.exhausted = true;
                return Ok(None);
            }
        };
        let mut compressed = vec![0u8; header.compressed_page_size as usize];
        self.reader.read_exact(&mut compressed)?;
        if let Some(expected) = header.crc {
            let expected = expected as u32;
            let actual = page_crc32(&compressed);
            if actual != expected {
                if self.tolerate_crc_errors {
                    warn!(
                        "column {:?}: page CRC mismatch (expected {:#010x}, got {:#010x}), decoding anyway",
                        self.descr.path(),
                        expected,
                        actual
                    );
                } else {
                    return Err(malformed_err!(
                        "column {:?}: page CRC mismatch (expected {:#010x}, got {:#010x})",
                        self.descr.path(),
                        expected,
                        actual
                    ));
                }
            }
        }
        let uncompressed_size = header.uncompressed_page_size as usize;
        let mut raw = Vec::with_capacity(uncompressed_size);
        self.codec.decompress(&compressed, &mut raw, uncompressed_size)?;

        let page_type = PageType::from(header.type_);
        let page = match page_type {
            PageType::DICTIONARY_PAGE => {
                let h = header
                    .dictionary_page_header
                    .ok_or_else(|| malformed_err!("dictionary page missing its header"))?;
                Page::DictionaryPage {
                    buf: Bytes::from(raw),
                    num_values: h.num_values as u32,
                    encoding: h.encoding.into(),
                    is_sorted: h.is_sorted.unwrap_or(false),
                }
            }
            PageType::DATA_PAGE => {
                let h = header
                    .data_page_header
                    .ok_or_else(|| malformed_err!("data page missing its header"))?;
                self.remaining_values -= h.num_values as i64;
                Page::DataPageV1 {
                    buf: Bytes::from(raw),
                    num_values: h.num_values as u32,
                    encoding: h.encoding.into(),
                    def_level_encoding: h.definition_level_encoding.into(),
                    rep_level_encoding: h.repetition_level_encoding.into(),
                    statistics: crate::file::statistics::Statistics::new(),
                }
            }
            PageType::DATA_PAGE_V2 => {
                let h = header
                    .data_page_header_v2
                    .ok_or_else(|| malformed_err!("data page v2 missing its header"))?;
                self.remaining_values -= h.num_values as i64;
                Page::DataPageV2 {
                    buf: Bytes::from(raw),
                    num_values: h.num_values as u32,
                    num_nulls: h.num_nulls as u32,
                    num_rows: h.num_rows as u32,
                    encoding: h.encoding.into(),
                    def_levels_byte_len: h.definition_levels_byte_length as u32,
                    rep_levels_byte_len: h.repetition_levels_byte_length as u32,
                    is_compressed: h.is_compressed.unwrap_or(true),
                    statistics: crate::file::statistics::Statistics::new(),
                }
            }
            PageType::INDEX_PAGE => return self.read_one(),
        };
        let _ = &self.descr;
        Ok(Some(page))
    }
}

impl Iterator for SerializedPageReader {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_one().transpose()
    }
}

impl PageReader for SerializedPageReader {
    fn peek_next_page(&mut self) -> Result<Option<PageMetadata>> {
        Ok(None)
    }

    fn skip_next_page(&mut self) -> Result<()> {
        self.read_one().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Compression, DataPageVersion, Repetition, Type as PhysicalType};
    use crate::properties::WriterProperties;
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder, SchemaDescriptor};
    use crate::value::{PhysicalValue, Value};
    use crate::file::writer::SerializedFileWriter;

    fn one_column_schema() -> crate::schema::types::SchemaDescPtr {
        let leaf = PrimitiveTypeBuilder::new("n", PhysicalType::INT32)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap();
        let root = GroupTypeBuilder::new_root("schema")
            .with_fields(vec![Arc::new(leaf)])
            .build()
            .unwrap();
        Arc::new(SchemaDescriptor::new(Arc::new(root)).unwrap())
    }

    #[test]
    fn reads_back_row_count_written_by_the_file_writer() {
        let schema = one_column_schema();
        let mut properties = WriterProperties::builder().set_compression(Compression::UNCOMPRESSED).build();
        properties.data_page_version = DataPageVersion::V1;
        let mut writer = SerializedFileWriter::new(Vec::<u8>::new(), schema, properties).unwrap();
        {
            let mut rg = writer.next_row_group().unwrap();
            let values: Vec<Value> = (0..7)
                .map(|i| Value::positioned(PhysicalValue::Int32(i), 0, 0, 0))
                .collect();
            rg.write_column(0, &values).unwrap();
            rg.set_num_rows(7);
            rg.close().unwrap();
        }
        writer.close().unwrap();
    }

    fn descr_for(schema: &crate::schema::types::SchemaDescPtr) -> ColumnDescriptor {
        schema.column(0).clone()
    }

    fn page_reader_over(
        descr: ColumnDescriptor,
        crc: u32,
        corrupt: bool,
        tolerate_crc_errors: bool,
    ) -> SerializedPageReader {
        use crate::basic::Encoding;
        use thrift::protocol::{TCompactOutputProtocol, TSerializable};

        let values = b"not really compressed data".to_vec();
        let page = CompressedPage {
            page: Page::DataPageV1 {
                buf: Bytes::from(values.clone()),
                num_values: 1,
                encoding: Encoding::PLAIN,
                def_level_encoding: Encoding::RLE,
                rep_level_encoding: Encoding::RLE,
                statistics: crate::file::statistics::Statistics::new(),
            },
            uncompressed_size: values.len(),
        };
        let header = footer::page_header_of(&page, crc);
        let mut bytes = Vec::new();
        {
            let mut protocol = TCompactOutputProtocol::new(&mut bytes);
            header.write_to_out_protocol(&mut protocol).unwrap();
        }
        let mut payload = values;
        if corrupt {
            payload[0] ^= 0xFF;
        }
        bytes.extend_from_slice(&payload);
        SerializedPageReader {
            reader: Box::new(std::io::Cursor::new(bytes)),
            descr,
            codec: create_codec(Compression::UNCOMPRESSED).unwrap(),
            remaining_values: 1,
            exhausted: false,
            tolerate_crc_errors,
        }
    }

    #[test]
    fn crc_mismatch_is_fatal_by_default() {
        let schema = one_column_schema();
        let descr = descr_for(&schema);
        let good_crc = page_crc32(b"not really compressed data");
        let mut reader = page_reader_over(descr, good_crc, true, false);
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, crate::errors::ParquetError::MalformedFile(_)));
    }

    #[test]
    fn crc_mismatch_is_tolerated_when_configured() {
        let schema = one_column_schema();
        let descr = descr_for(&schema);
        let good_crc = page_crc32(b"not really compressed data");
        let mut reader = page_reader_over(descr, good_crc, true, true);
        assert!(reader.next().unwrap().is_ok());
    }

    #[test]
    fn matching_crc_reads_the_page_through_either_setting() {
        let schema = one_column_schema();
        let descr = descr_for(&schema);
        let good_crc = page_crc32(b"not really compressed data");
        let mut reader = page_reader_over(descr, good_crc, false, false);
        assert!(reader.next().unwrap().is_ok());
    }
}
