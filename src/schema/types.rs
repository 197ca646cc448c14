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

//! The schema tree (spec.md §3 "Schema") and its derived [`SchemaDescriptor`]:
//! the flattened, left-to-right leaf list with column indexes and
//! max repetition/definition levels baked in.

use std::fmt;
use std::sync::Arc;

use crate::basic::{LogicalType, Repetition, Type as PhysicalType};
use crate::errors::{schema_err, ParquetError, Result};

pub type TypePtr = Arc<Type>;

/// Fields shared by every schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicTypeInfo {
    name: String,
    repetition: Option<Repetition>,
    logical_type: Option<LogicalType>,
    id: Option<i32>,
}

impl BasicTypeInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repetition(&self) -> Option<Repetition> {
        self.repetition
    }

    pub fn logical_type(&self) -> Option<&LogicalType> {
        self.logical_type.as_ref()
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }
}

/// A node of the schema tree: either a primitive leaf or an ordered group
/// of named children.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive {
        basic_info: BasicTypeInfo,
        physical_type: PhysicalType,
        /// Byte length for `FIXED_LEN_BYTE_ARRAY`; unused otherwise.
        type_length: i32,
    },
    Group {
        basic_info: BasicTypeInfo,
        fields: Vec<TypePtr>,
    },
}

impl Type {
    pub fn basic_info(&self) -> &BasicTypeInfo {
        match self {
            Type::Primitive { basic_info, .. } => basic_info,
            Type::Group { basic_info, .. } => basic_info,
        }
    }

    pub fn name(&self) -> &str {
        self.basic_info().name()
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive { .. })
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Type::Group { .. })
    }

    pub fn get_fields(&self) -> &[TypePtr] {
        match self {
            Type::Group { fields, .. } => fields,
            Type::Primitive { .. } => &[],
        }
    }

    /// A root message has no repetition of its own.
    pub fn is_root(&self) -> bool {
        self.basic_info().repetition.is_none()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn write_node(t: &Type, f: &mut fmt::Formatter, indent: usize) -> fmt::Result {
            let pad = " ".repeat(indent);
            match t {
                Type::Primitive {
                    basic_info,
                    physical_type,
                    ..
                } => writeln!(
                    f,
                    "{pad}{:?} {} {};",
                    basic_info.repetition.unwrap(),
                    physical_type,
                    basic_info.name
                ),
                Type::Group { basic_info, fields } => {
                    match basic_info.repetition {
                        Some(rep) => writeln!(f, "{pad}{:?} group {} {{", rep, basic_info.name)?,
                        None => writeln!(f, "{pad}message {} {{", basic_info.name)?,
                    }
                    for field in fields {
                        write_node(field, f, indent + 2)?;
                    }
                    writeln!(f, "{pad}}}")
                }
            }
        }
        write_node(self, f, 0)
    }
}

/// Builds a primitive (leaf) schema node.
pub struct PrimitiveTypeBuilder {
    name: String,
    repetition: Repetition,
    physical_type: PhysicalType,
    type_length: i32,
    logical_type: Option<LogicalType>,
    id: Option<i32>,
}

impl PrimitiveTypeBuilder {
    pub fn new(name: impl Into<String>, physical_type: PhysicalType) -> Self {
        PrimitiveTypeBuilder {
            name: name.into(),
            repetition: Repetition::REQUIRED,
            physical_type,
            type_length: -1,
            logical_type: None,
            id: None,
        }
    }

    pub fn with_repetition(mut self, repetition: Repetition) -> Self {
        self.repetition = repetition;
        self
    }

    pub fn with_logical_type(mut self, logical_type: Option<LogicalType>) -> Self {
        self.logical_type = logical_type;
        self
    }

    pub fn with_length(mut self, type_length: i32) -> Self {
        self.type_length = type_length;
        self
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn build(self) -> Result<Type> {
        if self.physical_type == PhysicalType::FIXED_LEN_BYTE_ARRAY && self.type_length < 0 {
            return Err(schema_err!(
                "FIXED_LEN_BYTE_ARRAY field {} requires a positive type_length",
                self.name
            ));
        }
        Ok(Type::Primitive {
            basic_info: BasicTypeInfo {
                name: self.name,
                repetition: Some(self.repetition),
                logical_type: self.logical_type,
                id: self.id,
            },
            physical_type: self.physical_type,
            type_length: self.type_length,
        })
    }
}

/// Builds a group (internal) schema node, or the root message when
/// constructed via [`GroupTypeBuilder::new_root`].
pub struct GroupTypeBuilder {
    name: String,
    repetition: Option<Repetition>,
    fields: Vec<TypePtr>,
    logical_type: Option<LogicalType>,
    id: Option<i32>,
}

impl GroupTypeBuilder {
    pub fn new(name: impl Into<String>, repetition: Repetition) -> Self {
        GroupTypeBuilder {
            name: name.into(),
            repetition: Some(repetition),
            fields: Vec::new(),
            logical_type: None,
            id: None,
        }
    }

    pub fn new_root(name: impl Into<String>) -> Self {
        GroupTypeBuilder {
            name: name.into(),
            repetition: None,
            fields: Vec::new(),
            logical_type: None,
            id: None,
        }
    }

    pub fn with_logical_type(mut self, logical_type: Option<LogicalType>) -> Self {
        self.logical_type = logical_type;
        self
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_fields(mut self, fields: Vec<TypePtr>) -> Self {
        self.fields = fields;
        self
    }

    pub fn build(self) -> Result<Type> {
        if self.fields.is_empty() {
            return Err(schema_err!("group {} has no fields", self.name));
        }
        Ok(Type::Group {
            basic_info: BasicTypeInfo {
                name: self.name,
                repetition: self.repetition,
                logical_type: self.logical_type,
                id: self.id,
            },
            fields: self.fields,
        })
    }
}

/// Convenience constructor for `REPEATED group list { <element> }` without
/// the caller needing to thread the LIST annotation by hand.
pub fn list_of(name: impl Into<String>, element: TypePtr) -> Result<TypePtr> {
    let inner = GroupTypeBuilder::new("list", Repetition::REPEATED)
        .with_fields(vec![element])
        .build()?;
    let outer = GroupTypeBuilder::new(name, Repetition::OPTIONAL)
        .with_logical_type(Some(LogicalType::List))
        .with_fields(vec![Arc::new(inner)])
        .build()?;
    Ok(Arc::new(outer))
}

/// Convenience constructor for
/// `REPEATED group key_value { REQUIRED key; OPTIONAL value }` (spec.md §4.1).
pub fn map_of(name: impl Into<String>, key: TypePtr, value: TypePtr) -> Result<TypePtr> {
    let key_value = GroupTypeBuilder::new("key_value", Repetition::REPEATED)
        .with_fields(vec![key, value])
        .build()?;
    let outer = GroupTypeBuilder::new(name, Repetition::OPTIONAL)
        .with_logical_type(Some(LogicalType::Map))
        .with_fields(vec![Arc::new(key_value)])
        .build()?;
    Ok(Arc::new(outer))
}

/// One leaf's column index, maximum levels and dotted path.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    primitive_type: TypePtr,
    max_def_level: i16,
    max_rep_level: i16,
    path: ColumnPath,
    column_index: usize,
}

impl ColumnDescriptor {
    pub fn max_def_level(&self) -> i16 {
        self.max_def_level
    }

    pub fn max_rep_level(&self) -> i16 {
        self.max_rep_level
    }

    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn column_index(&self) -> usize {
        self.column_index
    }

    pub fn physical_type(&self) -> PhysicalType {
        match self.primitive_type.as_ref() {
            Type::Primitive { physical_type, .. } => *physical_type,
            Type::Group { .. } => unreachable!("leaf column must be primitive"),
        }
    }

    pub fn type_length(&self) -> i32 {
        match self.primitive_type.as_ref() {
            Type::Primitive { type_length, .. } => *type_length,
            Type::Group { .. } => unreachable!("leaf column must be primitive"),
        }
    }

    pub fn logical_type(&self) -> Option<&LogicalType> {
        self.primitive_type.basic_info().logical_type()
    }

    pub fn name(&self) -> &str {
        self.primitive_type.basic_info().name()
    }

    pub fn self_type(&self) -> &TypePtr {
        &self.primitive_type
    }
}

/// A dotted leaf path, e.g. `contacts.phoneNumber`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPath(Vec<String>);

impl ColumnPath {
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ColumnPath(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for ColumnPath {
    fn from(parts: Vec<String>) -> Self {
        ColumnPath(parts)
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// The tree plus its flattened, DFS-ordered leaves (spec.md §3 invariants:
/// "column indexes are stable for a schema; two equal schemas produce equal
/// indexes").
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    root: TypePtr,
    leaves: Vec<ColumnDescriptor>,
}

pub type SchemaDescPtr = Arc<SchemaDescriptor>;

impl SchemaDescriptor {
    pub fn new(root: TypePtr) -> Result<Self> {
        if !root.is_group() {
            return Err(schema_err!("schema root must be a group"));
        }
        let mut leaves = Vec::new();
        let mut path = Vec::new();
        build_leaves(&root, 0, 0, false, &mut path, &mut leaves)?;
        Ok(SchemaDescriptor { root, leaves })
    }

    pub fn root_schema(&self) -> &TypePtr {
        &self.root
    }

    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    pub fn column(&self, i: usize) -> &ColumnDescriptor {
        &self.leaves[i]
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.leaves
    }
}

impl PartialEq for SchemaDescriptor {
    fn eq(&self, other: &Self) -> bool {
        // Structural equality of leaves: physical type, logical type and
        // path must match in the same order (spec.md §4.8 merge
        // constraint). Group nesting beyond the leaf list is intentionally
        // not compared — two schemas that reshred to the same flat columns
        // are equal for merge purposes.
        if self.leaves.len() != other.leaves.len() {
            return false;
        }
        self.leaves.iter().zip(other.leaves.iter()).all(|(a, b)| {
            a.path == b.path
                && a.physical_type() == b.physical_type()
                && a.logical_type() == b.logical_type()
                && a.max_def_level == b.max_def_level
                && a.max_rep_level == b.max_rep_level
        })
    }
}

fn build_leaves(
    node: &TypePtr,
    max_def: i16,
    max_rep: i16,
    parent_is_repeated: bool,
    path: &mut Vec<String>,
    out: &mut Vec<ColumnDescriptor>,
) -> Result<()> {
    let is_repeated = node.basic_info().repetition() == Some(Repetition::REPEATED);
    if is_repeated && parent_is_repeated {
        return Err(schema_err!(
            "raw nested repetition at '{}' without an intervening LIST/MAP annotation",
            node.name()
        ));
    }
    match node.as_ref() {
        Type::Primitive { .. } => {
            path.push(node.name().to_string());
            let (def, rep) = bump_levels(node, max_def, max_rep);
            out.push(ColumnDescriptor {
                primitive_type: node.clone(),
                max_def_level: def,
                max_rep_level: rep,
                path: ColumnPath(path.clone()),
                column_index: out.len(),
            });
            path.pop();
            Ok(())
        }
        Type::Group { fields, .. } => {
            let (def, rep) = bump_levels(node, max_def, max_rep);
            if !node.is_root() {
                path.push(node.name().to_string());
            }
            for field in fields {
                build_leaves(field, def, rep, is_repeated, path, out)?;
            }
            if !node.is_root() {
                path.pop();
            }
            Ok(())
        }
    }
}

fn bump_levels(node: &TypePtr, max_def: i16, max_rep: i16) -> (i16, i16) {
    match node.basic_info().repetition() {
        None => (max_def, max_rep),
        Some(Repetition::REQUIRED) => (max_def, max_rep),
        Some(Repetition::OPTIONAL) => (max_def + 1, max_rep),
        Some(Repetition::REPEATED) => (max_def + 1, max_rep + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Type as PhysicalType;

    fn sample_schema() -> SchemaDescPtr {
        let first = PrimitiveTypeBuilder::new("FirstName", PhysicalType::BYTE_ARRAY)
            .with_repetition(Repetition::REQUIRED)
            .with_logical_type(Some(LogicalType::String))
            .build()
            .unwrap();
        let last = PrimitiveTypeBuilder::new("LastName", PhysicalType::BYTE_ARRAY)
            .with_repetition(Repetition::REQUIRED)
            .with_logical_type(Some(LogicalType::String))
            .build()
            .unwrap();
        let root = GroupTypeBuilder::new_root("schema")
            .with_fields(vec![Arc::new(first), Arc::new(last)])
            .build()
            .unwrap();
        Arc::new(SchemaDescriptor::new(Arc::new(root)).unwrap())
    }

    #[test]
    fn column_indexes_are_left_to_right_dfs() {
        let schema = sample_schema();
        assert_eq!(schema.num_columns(), 2);
        assert_eq!(schema.column(0).name(), "FirstName");
        assert_eq!(schema.column(0).column_index(), 0);
        assert_eq!(schema.column(1).name(), "LastName");
        assert_eq!(schema.column(1).column_index(), 1);
    }

    #[test]
    fn equal_schemas_produce_equal_indexes() {
        let a = sample_schema();
        let b = sample_schema();
        assert_eq!(*a, *b);
    }

    #[test]
    fn required_fields_have_zero_max_levels() {
        let schema = sample_schema();
        assert_eq!(schema.column(0).max_def_level(), 0);
        assert_eq!(schema.column(0).max_rep_level(), 0);
    }

    #[test]
    fn optional_and_repeated_ancestors_raise_max_levels() {
        let phone = PrimitiveTypeBuilder::new("phoneNumber", PhysicalType::BYTE_ARRAY)
            .with_repetition(Repetition::OPTIONAL)
            .with_logical_type(Some(LogicalType::String))
            .build()
            .unwrap();
        let name = PrimitiveTypeBuilder::new("name", PhysicalType::BYTE_ARRAY)
            .with_repetition(Repetition::REQUIRED)
            .with_logical_type(Some(LogicalType::String))
            .build()
            .unwrap();
        let contact = GroupTypeBuilder::new("contacts", Repetition::REPEATED)
            .with_fields(vec![Arc::new(name), Arc::new(phone)])
            .build()
            .unwrap();
        let root = GroupTypeBuilder::new_root("AddressBook")
            .with_fields(vec![Arc::new(contact)])
            .build()
            .unwrap();
        let schema = SchemaDescriptor::new(Arc::new(root)).unwrap();

        // contacts.name: REQUIRED under REPEATED contacts -> def=1, rep=1
        assert_eq!(schema.column(0).max_def_level(), 1);
        assert_eq!(schema.column(0).max_rep_level(), 1);
        // contacts.phoneNumber: OPTIONAL under REPEATED contacts -> def=2, rep=1
        assert_eq!(schema.column(1).max_def_level(), 2);
        assert_eq!(schema.column(1).max_rep_level(), 1);
    }

    #[test]
    fn raw_nested_repetition_without_annotation_is_rejected() {
        let inner_elem = PrimitiveTypeBuilder::new("element", PhysicalType::INT32)
            .with_repetition(Repetition::REPEATED)
            .build()
            .unwrap();
        let outer = GroupTypeBuilder::new("matrix_row", Repetition::REPEATED)
            .with_fields(vec![Arc::new(inner_elem)])
            .build()
            .unwrap();
        let root = GroupTypeBuilder::new_root("schema")
            .with_fields(vec![Arc::new(outer)])
            .build()
            .unwrap();
        assert!(SchemaDescriptor::new(Arc::new(root)).is_err());
    }
}
