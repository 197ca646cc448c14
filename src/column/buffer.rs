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

//! One leaf's page-in-progress (spec.md §4.2): parallel rep/def-level
//! arrays plus the non-null physical values, with a running [`Statistics`].
//! Owns no encoding or compression logic itself — [`ColumnValueBuffer::
//! encode_values`] hands the non-null values to whatever [`Encoder`] the
//! column writer has chosen, and level encoding is the writer's job too,
//! since a leaf with `max_rep_level == 0` skips the repetition stream
//! entirely and that decision belongs one layer up.

use crate::basic::LogicalType;
use crate::encodings::Encoder;
use crate::errors::Result;
use crate::file::statistics::Statistics;
use crate::schema::types::ColumnDescriptor;
use crate::value::Value;

pub struct ColumnValueBuffer {
    max_rep_level: i16,
    max_def_level: i16,
    logical_type: Option<LogicalType>,
    rep_levels: Vec<i16>,
    def_levels: Vec<i16>,
    values: Vec<crate::value::PhysicalValue>,
    stats: Statistics,
    num_rows: usize,
}

impl ColumnValueBuffer {
    pub fn new(descr: &ColumnDescriptor) -> Self {
        ColumnValueBuffer {
            max_rep_level: descr.max_rep_level(),
            max_def_level: descr.max_def_level(),
            logical_type: descr.logical_type().cloned(),
            rep_levels: Vec::new(),
            def_levels: Vec::new(),
            values: Vec::new(),
            stats: Statistics::new(),
            num_rows: 0,
        }
    }

    /// Appends one leaf occurrence per `values` entry. A value starts a new
    /// row iff its repetition level is 0 (spec.md §3: "the first value of a
    /// record has repetition_level = 0").
    pub fn write_values(&mut self, values: &[Value]) {
        for v in values {
            if v.repetition_level == 0 {
                self.num_rows += 1;
            }
            self.rep_levels.push(v.repetition_level);
            self.def_levels.push(v.definition_level);
            if v.definition_level == self.max_def_level {
                self.values.push(v.physical.clone());
            }
            self.stats.update(&v.physical, self.logical_type.as_ref());
        }
    }

    pub fn rep_levels(&self) -> &[i16] {
        if self.max_rep_level == 0 {
            &[]
        } else {
            &self.rep_levels
        }
    }

    pub fn def_levels(&self) -> &[i16] {
        if self.max_def_level == 0 {
            &[]
        } else {
            &self.def_levels
        }
    }

    pub fn num_values(&self) -> usize {
        self.def_levels.len()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_nulls(&self) -> i64 {
        self.stats.null_count()
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.def_levels.is_empty()
    }

    /// Hands the buffered non-null values (dictionary indexes or raw
    /// physical values, whatever `encoder` expects) to `encoder` and
    /// returns the encoded byte stream.
    pub fn encode_values(&self, encoder: &mut dyn Encoder) -> Result<Vec<u8>> {
        encoder.put(&self.values)?;
        encoder.flush_buffer()
    }

    pub fn values(&self) -> &[crate::value::PhysicalValue] {
        &self.values
    }

    /// Clears the buffer but keeps the backing allocations, so the next
    /// page doesn't pay for fresh `Vec` growth (spec.md §4.2 `reset()`).
    pub fn reset(&mut self) {
        self.rep_levels.clear();
        self.def_levels.clear();
        self.values.clear();
        self.stats = Statistics::new();
        self.num_rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::PrimitiveTypeBuilder;
    use crate::basic::{Repetition, Type as PhysicalType};
    use crate::schema::types::{GroupTypeBuilder, SchemaDescriptor};
    use crate::value::PhysicalValue;
    use std::sync::Arc;

    fn leaf_descr() -> ColumnDescriptor {
        let leaf = PrimitiveTypeBuilder::new("amount", PhysicalType::INT32)
            .with_repetition(Repetition::OPTIONAL)
            .build()
            .unwrap();
        let root = GroupTypeBuilder::new_root("schema")
            .with_fields(vec![Arc::new(leaf)])
            .build()
            .unwrap();
        let descr = SchemaDescriptor::new(Arc::new(root)).unwrap();
        descr.column(0).clone()
    }

    #[test]
    fn tracks_rows_values_and_nulls() {
        let descr = leaf_descr();
        let mut buf = ColumnValueBuffer::new(&descr);
        buf.write_values(&[
            Value::positioned(PhysicalValue::Int32(1), 0, 1, 0),
            Value::positioned(PhysicalValue::Null, 0, 0, 0),
            Value::positioned(PhysicalValue::Int32(3), 0, 1, 0),
        ]);
        assert_eq!(buf.num_rows(), 3);
        assert_eq!(buf.num_values(), 3);
        assert_eq!(buf.num_nulls(), 1);
        assert_eq!(buf.values().len(), 2);
    }

    #[test]
    fn reset_clears_state_but_keeps_capacity() {
        let descr = leaf_descr();
        let mut buf = ColumnValueBuffer::new(&descr);
        buf.write_values(&[Value::positioned(PhysicalValue::Int32(1), 0, 1, 0)]);
        let cap = buf.def_levels.capacity();
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.num_rows(), 0);
        assert!(buf.def_levels.capacity() >= cap || cap == 0);
    }
}
