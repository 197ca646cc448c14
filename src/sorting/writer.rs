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

//! Sort-then-merge row group writer (spec.md §4.7). Rows accumulate in a
//! [`RowBuffer`]; once it reaches `sort_row_count` the buffer is sorted and
//! staged as one intermediate row group. On close, every staged group is
//! run through [`KWayMerge`] and the merged result becomes the file's only
//! row group.
//!
//! The spec's "temporary intermediate file" is kept as staged in-memory row
//! groups here rather than a literal file: round-tripping through an
//! on-disk parquet encode/decode would additionally require a full
//! page-to-row assembly reader, which is out of scope for this writer. The
//! externally observable behavior — sort each batch, merge, write one final
//! row group — matches spec.md §4.7 exactly.

use std::io::Write;

use crate::errors::Result;
use crate::file::metadata::{FileMetaData, SortingColumn};
use crate::file::writer::SerializedFileWriter;
use crate::merge::{KWayMerge, MergeInput};
use crate::properties::{SortingWriterProperties, WriterProperties};
use crate::record::{shred, Record};
use crate::schema::types::SchemaDescPtr;
use crate::sorting::row_buffer::RowBuffer;
use crate::value::Value;

pub struct SortingWriter<W: Write> {
    schema: SchemaDescPtr,
    writer_properties: WriterProperties,
    sorting_properties: SortingWriterProperties,
    sorting_columns: Vec<SortingColumn>,
    buffer: RowBuffer,
    pending_groups: Vec<MergeInput>,
    sink: Option<W>,
}

impl<W: Write> SortingWriter<W> {
    pub fn new(
        sink: W,
        schema: SchemaDescPtr,
        writer_properties: WriterProperties,
        sorting_properties: SortingWriterProperties,
        sorting_columns: Vec<SortingColumn>,
    ) -> Self {
        SortingWriter {
            schema,
            writer_properties,
            sorting_properties,
            sorting_columns,
            buffer: RowBuffer::new(),
            pending_groups: Vec::new(),
            sink: Some(sink),
        }
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let row = shred(&self.schema, record)?;
        self.buffer.push(row);
        if self.buffer.len() >= self.sorting_properties.sort_row_count {
            self.flush_buffer();
        }
        Ok(())
    }

    /// Sorts the buffered rows and stages them as one intermediate row
    /// group (spec.md §4.7 steps 1-3).
    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.buffer.sort(&self.sorting_columns, &self.schema);
        let rows = self.buffer.take();
        self.pending_groups.push(MergeInput {
            schema: self.schema.clone(),
            sorting_columns: self.sorting_columns.clone(),
            rows,
        });
    }

    /// Merges every staged row group into one sorted row group and writes
    /// the final file (spec.md §4.7 "on flush/close").
    pub fn close(mut self) -> Result<FileMetaData> {
        self.flush_buffer();
        let sink = self.sink.take().expect("close consumes the writer exactly once");
        let mut writer = SerializedFileWriter::new(sink, self.schema.clone(), self.writer_properties.clone())?;
        if !self.pending_groups.is_empty() {
            let groups = std::mem::take(&mut self.pending_groups);
            let merge = KWayMerge::new(
                self.schema.clone(),
                self.sorting_columns.clone(),
                groups,
                self.sorting_properties.drop_duplicated_rows,
            )?;
            let mut rg = writer.next_row_group()?;
            if !self.sorting_columns.is_empty() {
                rg.set_sorting_columns(self.sorting_columns.clone());
            }
            let mut num_rows = 0i64;
            let mut columns: Vec<Vec<Value>> = vec![Vec::new(); self.schema.num_columns()];
            for row in merge {
                num_rows += 1;
                for v in row.into_values() {
                    columns[v.column_index()].push(v);
                }
            }
            for (col_idx, values) in columns.into_iter().enumerate() {
                rg.write_column(col_idx, &values)?;
            }
            rg.set_num_rows(num_rows);
            rg.close()?;
        }
        writer.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Repetition, Type as PhysicalType};
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder, SchemaDescriptor};
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
    fn writes_one_sorted_row_group_from_two_batches() {
        let schema = one_column_schema();
        let writer_properties = WriterProperties::builder().build();
        let sorting_properties = SortingWriterProperties {
            sort_row_count: 3,
            drop_duplicated_rows: false,
        };
        let sorting_columns = vec![SortingColumn {
            column_idx: 0,
            descending: false,
            nulls_first: true,
        }];
        let mut writer = SortingWriter::new(
            Vec::<u8>::new(),
            schema.clone(),
            writer_properties,
            sorting_properties,
            sorting_columns,
        );
        for n in [5, 1, 4, 9, 2, 6] {
            writer
                .write_record(&Record::group(vec![("n", Record::Int32(n))]))
                .unwrap();
        }
        let metadata = writer.close().unwrap();
        assert_eq!(metadata.num_rows, 6);
        assert_eq!(metadata.num_row_groups(), 1);
        assert_eq!(
            metadata.row_groups[0].sorting_columns,
            Some(vec![SortingColumn {
                column_idx: 0,
                descending: false,
                nulls_first: true,
            }])
        );
    }

    #[test]
    fn empty_sorting_columns_still_produces_one_merged_group() {
        let schema = one_column_schema();
        let writer_properties = WriterProperties::builder().build();
        let sorting_properties = SortingWriterProperties {
            sort_row_count: 2,
            drop_duplicated_rows: false,
        };
        let mut writer = SortingWriter::new(
            Vec::<u8>::new(),
            schema,
            writer_properties,
            sorting_properties,
            vec![],
        );
        for n in [3, 1, 2, 4] {
            writer
                .write_record(&Record::group(vec![("n", Record::Int32(n))]))
                .unwrap();
        }
        let metadata = writer.close().unwrap();
        assert_eq!(metadata.num_rows, 4);
        assert_eq!(metadata.num_row_groups(), 1);
    }
}
