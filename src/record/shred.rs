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

//! `deconstruct`: turns one [`Record`] into a striped [`Row`] (spec.md §4.1).

use crate::basic::{Repetition, Type as PhysicalType};
use crate::data_type::ByteArray;
use crate::errors::{level_err, schema_err, Result};
use crate::record::{lookup, Record, Row};
use crate::schema::types::{SchemaDescriptor, Type};
use crate::value::{PhysicalValue, Value};

/// Shreds one record against `schema`, producing the flat, column-ordered
/// sequence of [`Value`]s Dremel calls a row.
pub fn shred(schema: &SchemaDescriptor, record: &Record) -> Result<Row> {
    let root_fields = match schema.root_schema().as_ref() {
        Type::Group { fields, .. } => fields,
        Type::Primitive { .. } => unreachable!("schema root is always a group"),
    };
    let group_fields = match record {
        Record::Group(fields) => fields,
        _ => return Err(schema_err!("top-level record must be a group")),
    };

    let num_columns = schema.num_columns();
    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); num_columns];
    let mut next_col = 0usize;
    for field in root_fields {
        let value = lookup(group_fields, field.name());
        shred_field(field, value, 0, 0, &mut columns, &mut next_col)?;
    }

    let mut flat = Vec::with_capacity(columns.iter().map(Vec::len).sum());
    for (idx, column) in columns.into_iter().enumerate() {
        for mut v in column {
            v.position(idx);
            flat.push(v);
        }
    }
    validate_levels(schema, &flat)?;
    Ok(Row::new(flat))
}

fn validate_levels(schema: &SchemaDescriptor, values: &[Value]) -> Result<()> {
    for value in values {
        let descriptor = schema.column(value.column_index());
        if value.repetition_level > descriptor.max_rep_level()
            || value.definition_level > descriptor.max_def_level()
        {
            return Err(level_err!(
                "value for column '{}' has levels ({}, {}) exceeding the schema maximum ({}, {})",
                descriptor.path(),
                value.repetition_level,
                value.definition_level,
                descriptor.max_rep_level(),
                descriptor.max_def_level()
            ));
        }
    }
    Ok(())
}

fn shred_field(
    field: &Type,
    value: Option<&Record>,
    rep: i16,
    def: i16,
    out: &mut [Vec<Value>],
    next_col: &mut usize,
) -> Result<()> {
    match field.basic_info().repetition() {
        Some(Repetition::REQUIRED) => {
            let present = match value {
                Some(v) if !matches!(v, Record::Null) => v,
                _ => {
                    return Err(level_err!(
                        "required field '{}' is missing a value",
                        field.name()
                    ))
                }
            };
            descend_present(field, present, rep, def, out, next_col)
        }
        Some(Repetition::OPTIONAL) => match value {
            None | Some(Record::Null) => emit_nulls(field, rep, def, out, next_col),
            Some(v) => descend_present(field, v, rep, def + 1, out, next_col),
        },
        Some(Repetition::REPEATED) => {
            let items: &[Record] = match value {
                None | Some(Record::Null) => &[],
                Some(Record::List(items)) => items,
                Some(_) => {
                    return Err(schema_err!(
                        "repeated field '{}' requires a list value",
                        field.name()
                    ))
                }
            };
            if items.is_empty() {
                return emit_nulls(field, rep, def, out, next_col);
            }
            let depth = rep + 1;
            let start_col = *next_col;
            for (i, item) in items.iter().enumerate() {
                let item_rep = if i == 0 { rep } else { depth };
                *next_col = start_col;
                descend_present(field, item, item_rep, def + 1, out, next_col)?;
            }
            Ok(())
        }
        None => unreachable!("only the schema root has no repetition"),
    }
}

fn descend_present(
    field: &Type,
    value: &Record,
    rep: i16,
    def: i16,
    out: &mut [Vec<Value>],
    next_col: &mut usize,
) -> Result<()> {
    match field {
        Type::Primitive { .. } => {
            let col = *next_col;
            *next_col += 1;
            let physical = physical_value_of(field, value)?;
            out[col].push(Value::new(physical, rep, def, col));
            Ok(())
        }
        Type::Group { fields, .. } => {
            let children = match value {
                Record::Group(fields) => fields,
                _ => {
                    return Err(schema_err!(
                        "expected a group value for field '{}'",
                        field.name()
                    ))
                }
            };
            for child in fields {
                let child_value = lookup(children, child.name());
                shred_field(child, child_value, rep, def, out, next_col)?;
            }
            Ok(())
        }
    }
}

fn emit_nulls(
    field: &Type,
    rep: i16,
    def: i16,
    out: &mut [Vec<Value>],
    next_col: &mut usize,
) -> Result<()> {
    match field {
        Type::Primitive { .. } => {
            let col = *next_col;
            *next_col += 1;
            out[col].push(Value::new(PhysicalValue::Null, rep, def, col));
            Ok(())
        }
        Type::Group { fields, .. } => {
            for child in fields {
                emit_nulls(child, rep, def, out, next_col)?;
            }
            Ok(())
        }
    }
}

fn physical_value_of(field: &Type, value: &Record) -> Result<PhysicalValue> {
    let physical_type = match field {
        Type::Primitive { physical_type, .. } => *physical_type,
        Type::Group { .. } => unreachable!("physical_value_of is only called on leaves"),
    };
    let bytes = |b: &ByteArray| b.clone();
    Ok(match (physical_type, value) {
        (_, Record::Null) => PhysicalValue::Null,
        (PhysicalType::BOOLEAN, Record::Boolean(b)) => PhysicalValue::Boolean(*b),
        (PhysicalType::INT32, Record::Int32(v)) => PhysicalValue::Int32(*v),
        (PhysicalType::INT64, Record::Int64(v)) => PhysicalValue::Int64(*v),
        (PhysicalType::INT96, Record::Int96(v)) => PhysicalValue::Int96(*v),
        (PhysicalType::FLOAT, Record::Float(v)) => PhysicalValue::Float(*v),
        (PhysicalType::DOUBLE, Record::Double(v)) => PhysicalValue::Double(*v),
        (PhysicalType::BYTE_ARRAY, Record::Bytes(b)) => PhysicalValue::ByteArray(bytes(b)),
        (PhysicalType::FIXED_LEN_BYTE_ARRAY, Record::Bytes(b)) => {
            PhysicalValue::FixedLenByteArray(bytes(b))
        }
        _ => {
            return Err(schema_err!(
                "value does not match the physical type of field '{}'",
                field.name()
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::LogicalType;
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
    fn two_contacts_produce_expected_levels_for_phone_number() {
        let schema = address_book_schema();
        let record = Record::group(vec![(
            "contacts",
            Record::List(vec![
                Record::group(vec![
                    ("name", Record::str("Dmitriy Ryaboy")),
                    ("phoneNumber", Record::str("555-1234")),
                ]),
                Record::group(vec![("name", Record::str("Chris Aniszczyk"))]),
            ]),
        )]);
        let row = shred(&schema, &record).unwrap();
        let phones: Vec<_> = row
            .values()
            .iter()
            .filter(|v| schema.column(v.column_index()).name() == "phoneNumber")
            .collect();
        assert_eq!(phones.len(), 2);
        assert_eq!((phones[0].repetition_level, phones[0].definition_level), (0, 2));
        assert_eq!((phones[1].repetition_level, phones[1].definition_level), (1, 1));
    }

    #[test]
    fn empty_repeated_group_emits_single_null_per_leaf() {
        let schema = address_book_schema();
        let record = Record::group(vec![("contacts", Record::List(vec![]))]);
        let row = shred(&schema, &record).unwrap();
        assert_eq!(row.len(), 2);
        for value in row.values() {
            assert!(value.is_null());
            assert_eq!(value.repetition_level, 0);
            assert_eq!(value.definition_level, 0);
        }
    }

    #[test]
    fn three_fully_populated_contacts_keep_each_leaf_in_its_own_column() {
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
        let row = shred(&schema, &record).unwrap();
        let names: Vec<_> = row
            .values()
            .iter()
            .filter(|v| schema.column(v.column_index()).name() == "name")
            .map(|v| match &v.physical {
                PhysicalValue::ByteArray(b) => String::from_utf8(b.data().to_vec()).unwrap(),
                _ => unreachable!(),
            })
            .collect();
        let phones: Vec<_> = row
            .values()
            .iter()
            .filter(|v| schema.column(v.column_index()).name() == "phoneNumber")
            .map(|v| match &v.physical {
                PhysicalValue::ByteArray(b) => String::from_utf8(b.data().to_vec()).unwrap(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(phones, vec!["1", "2", "3"]);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let schema = address_book_schema();
        let record = Record::group(vec![(
            "contacts",
            Record::List(vec![Record::group(vec![("phoneNumber", Record::str("x"))])]),
        )]);
        assert!(shred(&schema, &record).is_err());
    }
}
