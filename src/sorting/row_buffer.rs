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

//! In-memory row accumulator for [`crate::sorting::SortingWriter`] (spec.md
//! §4.7 steps 1-3): buffer rows until `sort_row_count`, then stable-sort by
//! the configured sorting columns.

use crate::file::metadata::SortingColumn;
use crate::merge::compare_rows;
use crate::record::Row;
use crate::schema::types::SchemaDescriptor;

#[derive(Debug, Default)]
pub struct RowBuffer {
    rows: Vec<Row>,
}

impl RowBuffer {
    pub fn new() -> Self {
        RowBuffer::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort by `sorting_columns`, honoring nulls-first per column
    /// (spec.md §4.7 step 1).
    pub fn sort(&mut self, sorting_columns: &[SortingColumn], schema: &SchemaDescriptor) {
        self.rows.sort_by(|a, b| compare_rows(a, b, sorting_columns, schema));
    }

    pub fn take(&mut self) -> Vec<Row> {
        std::mem::take(&mut self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Repetition, Type as PhysicalType};
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder, SchemaDescPtr};
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

    fn row(n: i32) -> Row {
        Row::new(vec![Value::positioned(PhysicalValue::Int32(n), 0, 0, 0)])
    }

    #[test]
    fn sort_orders_rows_by_sorting_column() {
        let schema = one_column_schema();
        let sorting_columns = vec![SortingColumn {
            column_idx: 0,
            descending: false,
            nulls_first: true,
        }];
        let mut buffer = RowBuffer::new();
        for n in [5, 1, 4, 2, 3] {
            buffer.push(row(n));
        }
        buffer.sort(&sorting_columns, &schema);
        let rows = buffer.take();
        let values: Vec<i32> = rows
            .iter()
            .map(|r| match &r.values()[0].physical {
                PhysicalValue::Int32(n) => *n,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn descending_reverses_the_order() {
        let schema = one_column_schema();
        let sorting_columns = vec![SortingColumn {
            column_idx: 0,
            descending: true,
            nulls_first: true,
        }];
        let mut buffer = RowBuffer::new();
        for n in [1, 3, 2] {
            buffer.push(row(n));
        }
        buffer.sort(&sorting_columns, &schema);
        let rows = buffer.take();
        let values: Vec<i32> = rows
            .iter()
            .map(|r| match &r.values()[0].physical {
                PhysicalValue::Int32(n) => *n,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec![3, 2, 1]);
    }
}
