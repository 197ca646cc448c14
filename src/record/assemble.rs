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

//! `reconstruct`: the inverse of [`crate::record::shred`]. Walks per-column
//! value streams in lockstep, using repetition levels to find record and
//! list boundaries and definition levels to find nulls (spec.md §4.1).

use crate::basic::Repetition;
use crate::errors::{schema_err, Result};
use crate::record::Record;
use crate::schema::types::SchemaDescriptor;
use crate::schema::types::Type;
use crate::value::{PhysicalValue, Value};

struct ColumnCursor<'a> {
    values: &'a [Value],
    pos: usize,
}

impl<'a> ColumnCursor<'a> {
    fn new(values: &'a [Value]) -> Self {
        ColumnCursor { values, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Value> {
        self.values.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Value> {
        let v = self.values.get(self.pos);
        if v.is_some() {
            self.pos += 1;
        }
        v
    }
}

/// Reassembles every record striped across `columns`, one flat value
/// sequence per leaf column in schema order.
pub fn assemble_all(schema: &SchemaDescriptor, columns: &[Vec<Value>]) -> Result<Vec<Record>> {
    if columns.len() != schema.num_columns() {
        return Err(schema_err!(
            "expected {} columns, got {}",
            schema.num_columns(),
            columns.len()
        ));
    }
    let mut cursors: Vec<ColumnCursor> = columns.iter().map(|c| ColumnCursor::new(c)).collect();
    let mut records = Vec::new();
    while !cursors.is_empty() && cursors[0].peek().is_some() {
        records.push(assemble_one(schema, &mut cursors)?);
    }
    Ok(records)
}

fn assemble_one(schema: &SchemaDescriptor, cursors: &mut [ColumnCursor]) -> Result<Record> {
    let fields = match schema.root_schema().as_ref() {
        Type::Group { fields, .. } => fields,
        Type::Primitive { .. } => unreachable!("schema root is always a group"),
    };
    let mut next_col = 0usize;
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let (name, value) = assemble_field(field, 0, 0, cursors, &mut next_col)?;
        out.push((name, value));
    }
    Ok(Record::Group(out))
}

fn peek_level(cursors: &[ColumnCursor], col: usize) -> Option<(i16, i16)> {
    cursors[col]
        .peek()
        .map(|v| (v.repetition_level, v.definition_level))
}

fn assemble_field(
    field: &Type,
    rep: i16,
    def: i16,
    cursors: &mut [ColumnCursor],
    next_col: &mut usize,
) -> Result<(String, Record)> {
    let name = field.name().to_string();
    match field.basic_info().repetition() {
        Some(Repetition::REQUIRED) => {
            let value = assemble_present(field, rep, def, cursors, next_col)?;
            Ok((name, value))
        }
        Some(Repetition::OPTIONAL) => {
            let (_, leaf_def) = peek_level(cursors, *next_col).ok_or_else(|| {
                schema_err!("column exhausted while assembling field '{}'", field.name())
            })?;
            if leaf_def < def + 1 {
                consume_nulls(field, cursors, next_col)?;
                Ok((name, Record::Null))
            } else {
                let value = assemble_present(field, rep, def + 1, cursors, next_col)?;
                Ok((name, value))
            }
        }
        Some(Repetition::REPEATED) => {
            let depth = rep + 1;
            let start_col = *next_col;
            let mut items = Vec::new();
            loop {
                *next_col = start_col;
                let level = peek_level(cursors, *next_col);
                let Some((leaf_rep, leaf_def)) = level else {
                    break;
                };
                if items.is_empty() {
                    if leaf_def < def + 1 {
                        consume_nulls(field, cursors, next_col)?;
                        break;
                    }
                    let value = assemble_present(field, leaf_rep, def + 1, cursors, next_col)?;
                    items.push(value);
                } else {
                    if leaf_rep < depth {
                        break;
                    }
                    let value = assemble_present(field, leaf_rep, def + 1, cursors, next_col)?;
                    items.push(value);
                }
            }
            Ok((name, Record::List(items)))
        }
        None => unreachable!("only the schema root has no repetition"),
    }
}

fn assemble_present(
    field: &Type,
    rep: i16,
    def: i16,
    cursors: &mut [ColumnCursor],
    next_col: &mut usize,
) -> Result<Record> {
    match field {
        Type::Primitive { .. } => {
            let col = *next_col;
            *next_col += 1;
            let value = cursors[col]
                .next()
                .ok_or_else(|| schema_err!("column {} exhausted", col))?;
            record_of_physical(field, &value.physical)
        }
        Type::Group { fields, .. } => {
            let mut out = Vec::with_capacity(fields.len());
            for child in fields {
                let (name, value) = assemble_field(child, rep, def, cursors, next_col)?;
                out.push((name, value));
            }
            Ok(Record::Group(out))
        }
    }
}

fn consume_nulls(field: &Type, cursors: &mut [ColumnCursor], next_col: &mut usize) -> Result<()> {
    match field {
        Type::Primitive { .. } => {
            let col = *next_col;
            *next_col += 1;
            cursors[col]
                .next()
                .ok_or_else(|| schema_err!("column {} exhausted", col))?;
            Ok(())
        }
        Type::Group { fields, .. } => {
            for child in fields {
                consume_nulls(child, cursors, next_col)?;
            }
            Ok(())
        }
    }
}

fn record_of_physical(_field: &Type, physical: &PhysicalValue) -> Result<Record> {
    Ok(match physical {
        PhysicalValue::Null => Record::Null,
        PhysicalValue::Boolean(b) => Record::Boolean(*b),
        PhysicalValue::Int32(v) => Record::Int32(*v),
        PhysicalValue::Int64(v) => Record::Int64(*v),
        PhysicalValue::Int96(v) => Record::Int96(*v),
        PhysicalValue::Float(v) => Record::Float(*v),
        PhysicalValue::Double(v) => Record::Double(*v),
        PhysicalValue::ByteArray(b) | PhysicalValue::FixedLenByteArray(b) => {
            Record::Bytes(b.clone())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{LogicalType, Type as PhysicalType};
    use crate::record::shred::shred;
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder};
    use std::sync::Arc;

    fn address_book_schema() -> SchemaDescriptor {
        let name = PrimitiveTypeBuilder::new("name", PhysicalType::BYTE_ARRAY)
            .with_repetition(Repetition::REQUIRED)
            .with_logical_type(Some(LogicalType::String))
            .build()
            .unwrap();
        let phone = PrimitiveTypeBuilder::new("phoneNumber", PhysicalType::BYTE_ARRAY)
            .with_repetition(Repetition::OPTIONAL)
            .with_logical_type(Some(LogicalType::String))
            .build()
            .unwrap();
        let contacts = GroupTypeBuilder::new("contacts", Repetition::REPEATED)
            .with_fields(vec![Arc::new(name), Arc::new(phone)])
            .build()
            .unwrap();
        let root = GroupTypeBuilder::new_root("AddressBook")
            .with_fields(vec![Arc::new(contacts)])
            .build()
            .unwrap();
        SchemaDescriptor::new(Arc::new(root)).unwrap()
    }

    #[test]
    fn shred_then_assemble_round_trips_two_records() {
        let schema = address_book_schema();
        let records = vec![
            Record::group(vec![(
                "contacts",
                Record::List(vec![
                    Record::group(vec![
                        ("name", Record::str("Dmitriy Ryaboy")),
                        ("phoneNumber", Record::str("555-1234")),
                    ]),
                    Record::group(vec![("name", Record::str("Chris Aniszczyk"))]),
                ]),
            )]),
            Record::group(vec![("contacts", Record::List(vec![]))]),
        ];

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); schema.num_columns()];
        for record in &records {
            let row = shred(&schema, record).unwrap();
            for value in row.into_values() {
                columns[value.column_index()].push(value);
            }
        }

        let reassembled = assemble_all(&schema, &columns).unwrap();
        assert_eq!(reassembled, records);
    }

    #[test]
    fn three_fully_populated_contacts_round_trip_in_order() {
        let schema = address_book_schema();
        let record = Record::group(vec![(
            "contacts",
            Record::List(vec![
                Record::group(vec![
                    ("name", Record::str("a")),
                    ("phoneNumber", Record::str("1")),
                ]),
                Record::group(vec![
                    ("name", Record::str("b")),
                    ("phoneNumber", Record::str("2")),
                ]),
                Record::group(vec![
                    ("name", Record::str("c")),
                    ("phoneNumber", Record::str("3")),
                ]),
            ]),
        )]);

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); schema.num_columns()];
        let row = shred(&schema, &record).unwrap();
        for value in row.into_values() {
            columns[value.column_index()].push(value);
        }

        let reassembled = assemble_all(&schema, &columns).unwrap();
        assert_eq!(reassembled, vec![record]);
    }
}
