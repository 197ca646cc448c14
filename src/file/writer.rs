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

//! Forward-only file writer (spec.md §4.6): magic, row groups, footer,
//! trailer. `SerializedFileWriter` owns the sink; `SerializedRowGroupWriter`
//! hands out one [`ColumnWriterImpl`] per leaf in schema order, each of
//! which reports its own page/chunk offsets as file-absolute via
//! [`PageWriter::current_offset`] (the sink only grows, so "current" is
//! always final); the row-group writer also serializes each chunk's bloom
//! filter right after its pages. `SerializedFileWriter::close` writes the
//! trailing column-index and offset-index sections once every row group is
//! known, then the footer. `SerializedPageWriter` is the [`PageWriter`]
//! each column writer writes through.

use std::io::Write;

use bytes::Bytes;
use log::debug;
use thrift::protocol::{TCompactOutputProtocol, TSerializable};

use crate::bloom_filter::SplitBlockBloomFilter;
use crate::column::page::{CompressedPage, PageWriter};
use crate::column::writer::{page_crc32, ColumnWriterImpl, ColumnWriterOptions};
use crate::errors::{general_err, Result};
use crate::file::footer;
use crate::file::metadata::{
    ColumnChunkMetaData, ColumnIndex, FileMetaData, OffsetIndex, RowGroupMetaData, SortingColumn,
};
use crate::properties::WriterProperties;
use crate::record::{shred, Record};
use crate::schema::types::SchemaDescPtr;
use crate::util::io::TrackedWrite;
use crate::value::Value;

pub const PARQUET_MAGIC: &[u8; 4] = b"PAR1";

fn new_column_writers(schema: &SchemaDescPtr, properties: &WriterProperties) -> Result<Vec<ColumnWriterImpl>> {
    schema
        .columns()
        .iter()
        .map(|descr| {
            ColumnWriterImpl::new(
                descr.clone(),
                ColumnWriterOptions {
                    compression: properties.compression_for(descr.path()),
                    dictionary_enabled: properties.dictionary_enabled,
                    dictionary_size_limit: properties.dictionary_size_limit,
                    page_size_limit: properties.data_page_size_limit,
                    data_page_version: properties.data_page_version,
                    data_page_statistics: properties.data_page_statistics,
                    bloom_filter_enabled: properties.bloom_filter_columns.contains(descr.path()),
                    encoding: properties.encoding_for(descr.path()),
                    page_buffers: properties.column_page_buffers.clone(),
                },
            )
        })
        .collect()
}

pub struct SerializedFileWriter<W: Write> {
    sink: TrackedWrite<W>,
    schema: SchemaDescPtr,
    properties: WriterProperties,
    row_groups: Vec<RowGroupMetaData>,
    column_indexes: Vec<Vec<ColumnIndex>>,
    offset_indexes: Vec<Vec<OffsetIndex>>,
    total_num_rows: i64,
    finished: bool,
}

impl<W: Write> SerializedFileWriter<W> {
    pub fn new(sink: W, schema: SchemaDescPtr, properties: WriterProperties) -> Result<Self> {
        let mut sink = TrackedWrite::new(sink);
        sink.write_all(PARQUET_MAGIC)?;
        Ok(SerializedFileWriter {
            sink,
            schema,
            properties,
            row_groups: Vec::new(),
            column_indexes: Vec::new(),
            offset_indexes: Vec::new(),
            total_num_rows: 0,
            finished: false,
        })
    }

    pub fn next_row_group(&mut self) -> Result<SerializedRowGroupWriter<'_, W>> {
        let writers = new_column_writers(&self.schema, &self.properties)?;
        Ok(SerializedRowGroupWriter {
            file_writer: self,
            column_writers: writers,
            column_index: 0,
            file_offset: None,
            num_rows: 0,
            sorting_columns: None,
        })
    }

    fn append_row_group(
        &mut self,
        rg: RowGroupMetaData,
        column_indexes: Vec<ColumnIndex>,
        offset_indexes: Vec<OffsetIndex>,
    ) {
        self.total_num_rows += rg.num_rows;
        self.row_groups.push(rg);
        self.column_indexes.push(column_indexes);
        self.offset_indexes.push(offset_indexes);
    }

    /// Writes the trailing column-index and offset-index sections (all
    /// column indexes first, then all offset indexes, spec.md §4.3 step 7),
    /// patching each chunk's `column_index_offset`/`offset_index_offset`
    /// fields in place, then the Thrift-encoded footer and the
    /// `length || PAR1` trailer, consuming the writer (spec.md §4.6 "writer
    /// seeks only forward").
    pub fn close(mut self) -> Result<FileMetaData> {
        if self.finished {
            return Err(general_err!("file writer already closed"));
        }
        self.finished = true;

        for (rg, indexes) in self.row_groups.iter_mut().zip(self.column_indexes.iter()) {
            for (col, index) in rg.columns.iter_mut().zip(indexes.iter()) {
                let thrift_index = footer::column_index_to_thrift(index);
                let start = self.sink.bytes_written();
                {
                    let mut protocol = TCompactOutputProtocol::new(&mut self.sink);
                    thrift_index
                        .write_to_out_protocol(&mut protocol)
                        .map_err(|e| general_err!("failed to write column index: {e}"))?;
                }
                col.column_index_offset = Some(start as i64);
                col.column_index_length = Some((self.sink.bytes_written() - start) as i32);
            }
        }
        for (rg, indexes) in self.row_groups.iter_mut().zip(self.offset_indexes.iter()) {
            for (col, index) in rg.columns.iter_mut().zip(indexes.iter()) {
                let thrift_index = footer::offset_index_to_thrift(index);
                let start = self.sink.bytes_written();
                {
                    let mut protocol = TCompactOutputProtocol::new(&mut self.sink);
                    thrift_index
                        .write_to_out_protocol(&mut protocol)
                        .map_err(|e| general_err!("failed to write offset index: {e}"))?;
                }
                col.offset_index_offset = Some(start as i64);
                col.offset_index_length = Some((self.sink.bytes_written() - start) as i32);
            }
        }

        let metadata = FileMetaData {
            schema: self.schema.clone(),
            num_rows: self.total_num_rows,
            row_groups: std::mem::take(&mut self.row_groups),
            key_value_metadata: self.properties.key_value_metadata.clone(),
            created_by: self.properties.created_by.clone(),
        };
        let thrift_meta = footer::to_thrift_file_metadata(&metadata);
        let footer_start = self.sink.bytes_written();
        {
            let mut protocol = TCompactOutputProtocol::new(&mut self.sink);
            thrift_meta
                .write_to_out_protocol(&mut protocol)
                .map_err(|e| general_err!("failed to write footer: {e}"))?;
        }
        let footer_len = (self.sink.bytes_written() - footer_start) as u32;
        self.sink.write_all(&footer_len.to_le_bytes())?;
        self.sink.write_all(PARQUET_MAGIC)?;
        self.sink.flush()?;
        Ok(metadata)
    }
}

pub struct SerializedRowGroupWriter<'a, W: Write> {
    file_writer: &'a mut SerializedFileWriter<W>,
    column_writers: Vec<ColumnWriterImpl>,
    column_index: usize,
    file_offset: Option<i64>,
    num_rows: i64,
    sorting_columns: Option<Vec<SortingColumn>>,
}

impl<'a, W: Write> SerializedRowGroupWriter<'a, W> {
    pub fn set_sorting_columns(&mut self, sorting_columns: Vec<SortingColumn>) {
        self.sorting_columns = Some(sorting_columns);
    }

    /// Writes every leaf's buffered values for one [`crate::record::Row`]
    /// worth of columns, already split by column index (as produced by
    /// `crate::record::shred`).
    pub fn write_column(&mut self, column_index: usize, values: &[crate::value::Value]) -> Result<()> {
        if self.file_offset.is_none() {
            self.file_offset = Some(self.file_writer.sink.bytes_written() as i64);
        }
        let writer = self
            .column_writers
            .get_mut(column_index)
            .ok_or_else(|| general_err!("column index {column_index} out of range"))?;
        let mut page_writer = SerializedPageWriter::new(&mut self.file_writer.sink);
        writer.write_batch(values, &mut page_writer)
    }

    pub fn set_num_rows(&mut self, num_rows: i64) {
        self.num_rows = num_rows;
    }

    pub fn close(mut self) -> Result<RowGroupMetaData> {
        let file_offset = self.file_offset.unwrap_or_else(|| self.file_writer.sink.bytes_written() as i64);
        let mut columns = Vec::with_capacity(self.column_writers.len());
        let mut column_indexes = Vec::with_capacity(self.column_writers.len());
        let mut offset_indexes = Vec::with_capacity(self.column_writers.len());
        for writer in std::mem::take(&mut self.column_writers) {
            let mut page_writer = SerializedPageWriter::new(&mut self.file_writer.sink);
            let (mut meta, column_index, offset_index, bloom_filter) = writer.close(&mut page_writer)?;
            if let Some(bf) = &bloom_filter {
                let (offset, len) = write_bloom_filter(&mut self.file_writer.sink, bf)?;
                meta.bloom_filter_offset = Some(offset);
                meta.bloom_filter_length = Some(len);
            }
            columns.push(meta);
            column_indexes.push(column_index);
            offset_indexes.push(offset_index);
        }
        let total_byte_size = columns.iter().map(|c| c.total_uncompressed_size).sum();
        let rg = RowGroupMetaData {
            num_rows: self.num_rows,
            total_byte_size,
            sorting_columns: self.sorting_columns.take(),
            file_offset,
            columns,
        };
        debug!(
            "row group {}: {} rows, {} bytes uncompressed, {} bytes compressed",
            self.file_writer.row_groups.len(),
            rg.num_rows,
            rg.total_byte_size,
            rg.columns.iter().map(|c| c.total_compressed_size).sum::<i64>()
        );
        self.file_writer.append_row_group(rg.clone(), column_indexes, offset_indexes);
        Ok(rg)
    }
}

/// Writes the bloom filter header and bitset right after its chunk's pages
/// (spec.md §4.5), returning the file-absolute offset and total length the
/// caller patches into the chunk's metadata.
fn write_bloom_filter<W: Write>(
    sink: &mut TrackedWrite<W>,
    bloom_filter: &SplitBlockBloomFilter,
) -> Result<(i64, i32)> {
    let start = sink.bytes_written();
    let header = footer::bloom_filter_header_thrift(bloom_filter.num_bytes() as i32);
    {
        let mut protocol = TCompactOutputProtocol::new(&mut *sink);
        header
            .write_to_out_protocol(&mut protocol)
            .map_err(|e| general_err!("failed to write bloom filter header: {e}"))?;
    }
    sink.write_all(&bloom_filter.to_bytes())?;
    Ok((start as i64, (sink.bytes_written() - start) as i32))
}

/// Writes one column chunk's pages to the file sink in order, computing
/// each page's CRC32 and header before the payload (spec.md §4.3 steps
/// 5-7). `current_offset` reports the sink's live byte count, so
/// [`ColumnWriterImpl`] can record each page's true file-absolute location
/// as it writes it (spec.md §4.6 "writer seeks only forward").
pub struct SerializedPageWriter<'a, W: Write> {
    sink: &'a mut TrackedWrite<W>,
}

impl<'a, W: Write> SerializedPageWriter<'a, W> {
    fn new(sink: &'a mut TrackedWrite<W>) -> Self {
        SerializedPageWriter { sink }
    }
}

impl<'a, W: Write> PageWriter for SerializedPageWriter<'a, W> {
    fn write_page(&mut self, page: CompressedPage) -> Result<u64> {
        let crc = page_crc32(page.page.buffer());
        let header = footer::page_header_of(&page, crc);
        let start = self.sink.bytes_written();
        {
            let mut protocol = TCompactOutputProtocol::new(&mut self.sink);
            header
                .write_to_out_protocol(&mut protocol)
                .map_err(|e| general_err!("failed to write page header: {e}"))?;
        }
        self.sink.write_all(page.page.buffer())?;
        Ok(self.sink.bytes_written() - start)
    }

    fn current_offset(&self) -> u64 {
        self.sink.bytes_written()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Shreds records and dispatches their values to one column writer per
/// leaf, auto-flushing a row group once its buffered column chunk bytes
/// exceed `max_row_group_size` (spec.md §4.6 "For each row: shred once,
/// then dispatch each Value to its column writer by column index. After
/// each write, sum buffered column chunk byte sizes; when the sum exceeds
/// row_group_target_size, close the row group"). Where
/// [`SerializedRowGroupWriter`] is the manually-driven low-level API, this
/// is the size-triggered, record-at-a-time one built on top of it.
pub struct RecordWriter<W: Write> {
    file_writer: SerializedFileWriter<W>,
    column_writers: Vec<ColumnWriterImpl>,
    file_offset: Option<i64>,
    num_rows: i64,
    buffered_bytes: usize,
    max_row_group_size: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W, schema: SchemaDescPtr, properties: WriterProperties) -> Result<Self> {
        let max_row_group_size = properties.max_row_group_size;
        let column_writers = new_column_writers(&schema, &properties)?;
        let file_writer = SerializedFileWriter::new(sink, schema, properties)?;
        Ok(RecordWriter {
            file_writer,
            column_writers,
            file_offset: None,
            num_rows: 0,
            buffered_bytes: 0,
            max_row_group_size,
        })
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let schema = self.file_writer.schema.clone();
        let row = shred(&schema, record)?;
        if self.file_offset.is_none() {
            self.file_offset = Some(self.file_writer.sink.bytes_written() as i64);
        }
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); schema.num_columns()];
        for v in row.into_values() {
            columns[v.column_index()].push(v);
        }
        for (col_idx, values) in columns.into_iter().enumerate() {
            if values.is_empty() {
                continue;
            }
            self.buffered_bytes += values.len() * std::mem::size_of::<Value>();
            let mut page_writer = SerializedPageWriter::new(&mut self.file_writer.sink);
            self.column_writers[col_idx].write_batch(&values, &mut page_writer)?;
        }
        self.num_rows += 1;
        if self.buffered_bytes >= self.max_row_group_size {
            self.flush_row_group()?;
        }
        Ok(())
    }

    /// Closes the current row group and immediately opens a fresh one so
    /// the next `write_record` has column writers to dispatch into.
    fn flush_row_group(&mut self) -> Result<()> {
        if self.num_rows == 0 {
            return Ok(());
        }
        let schema = self.file_writer.schema.clone();
        let properties = self.file_writer.properties.clone();
        let writers = std::mem::replace(&mut self.column_writers, new_column_writers(&schema, &properties)?);
        let file_offset = self
            .file_offset
            .take()
            .unwrap_or_else(|| self.file_writer.sink.bytes_written() as i64);
        let mut columns = Vec::with_capacity(writers.len());
        let mut column_indexes = Vec::with_capacity(writers.len());
        let mut offset_indexes = Vec::with_capacity(writers.len());
        for writer in writers {
            let mut page_writer = SerializedPageWriter::new(&mut self.file_writer.sink);
            let (mut meta, column_index, offset_index, bloom_filter) = writer.close(&mut page_writer)?;
            if let Some(bf) = &bloom_filter {
                let (offset, len) = write_bloom_filter(&mut self.file_writer.sink, bf)?;
                meta.bloom_filter_offset = Some(offset);
                meta.bloom_filter_length = Some(len);
            }
            columns.push(meta);
            column_indexes.push(column_index);
            offset_indexes.push(offset_index);
        }
        let total_byte_size: i64 = columns.iter().map(|c| c.total_uncompressed_size).sum();
        debug!(
            "row group {}: {} rows, {} bytes uncompressed, auto-flushed at {} buffered bytes",
            self.file_writer.row_groups.len(),
            self.num_rows,
            total_byte_size,
            self.buffered_bytes
        );
        let rg = RowGroupMetaData {
            num_rows: self.num_rows,
            total_byte_size,
            sorting_columns: None,
            file_offset,
            columns,
        };
        self.file_writer.append_row_group(rg, column_indexes, offset_indexes);
        self.num_rows = 0;
        self.buffered_bytes = 0;
        Ok(())
    }

    pub fn close(mut self) -> Result<FileMetaData> {
        self.flush_row_group()?;
        self.file_writer.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{DataPageVersion, Repetition, Type as PhysicalType};
    use crate::properties::WriterProperties;
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder, SchemaDescriptor};
    use crate::value::{PhysicalValue, Value};
    use std::sync::Arc;

    fn one_column_schema() -> SchemaDescPtr {
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
    fn writes_magic_row_group_and_trailer() {
        let schema = one_column_schema();
        let mut properties = WriterProperties::builder().build();
        properties.data_page_version = DataPageVersion::V1;
        let buf: Vec<u8> = Vec::new();
        let mut writer = SerializedFileWriter::new(buf, schema, properties).unwrap();
        {
            let mut rg = writer.next_row_group().unwrap();
            let values: Vec<Value> = (0..5)
                .map(|i| Value::positioned(PhysicalValue::Int32(i), 0, 0, 0))
                .collect();
            rg.write_column(0, &values).unwrap();
            rg.set_num_rows(5);
            rg.close().unwrap();
        }
        let metadata = writer.close().unwrap();
        assert_eq!(metadata.num_rows, 5);
        assert_eq!(metadata.num_row_groups(), 1);
    }

    #[test]
    fn record_writer_buffers_one_row_group_under_the_size_threshold() {
        let schema = one_column_schema();
        let properties = WriterProperties::builder().build();
        let mut writer = RecordWriter::new(Vec::<u8>::new(), schema, properties).unwrap();
        for n in 0..5 {
            writer
                .write_record(&crate::record::Record::group(vec![("n", crate::record::Record::Int32(n))]))
                .unwrap();
        }
        let metadata = writer.close().unwrap();
        assert_eq!(metadata.num_rows, 5);
        assert_eq!(metadata.num_row_groups(), 1);
    }

    #[test]
    fn record_writer_auto_flushes_once_max_row_group_size_is_exceeded() {
        let schema = one_column_schema();
        let properties = WriterProperties::builder().set_max_row_group_size(1).build();
        let mut writer = RecordWriter::new(Vec::<u8>::new(), schema, properties).unwrap();
        for n in 0..4 {
            writer
                .write_record(&crate::record::Record::group(vec![("n", crate::record::Record::Int32(n))]))
                .unwrap();
        }
        let metadata = writer.close().unwrap();
        assert_eq!(metadata.num_rows, 4);
        assert!(metadata.num_row_groups() > 1, "expected more than one auto-flushed row group");
    }
}
