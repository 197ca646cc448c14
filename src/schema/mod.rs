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

//! Schema tree, leaf resolution, and Thrift flattening for the footer.

pub mod types;

use crate::errors::Result;
use crate::schema::types::{SchemaDescriptor, Type, TypePtr};

/// Flattens a schema tree into a preorder list of `SchemaElement`, the shape
/// the footer's `FileMetaData.schema` field expects (spec.md §4.6).
pub fn to_thrift_schema(root: &TypePtr) -> Vec<parquet_format::SchemaElement> {
    let mut elements = Vec::new();
    flatten(root, &mut elements);
    elements
}

fn flatten(node: &TypePtr, out: &mut Vec<parquet_format::SchemaElement>) {
    out.push(schema_element_of(node));
    if let Type::Group { fields, .. } = node.as_ref() {
        for field in fields {
            flatten(field, out);
        }
    }
}

fn schema_element_of(node: &TypePtr) -> parquet_format::SchemaElement {
    let info = node.basic_info();
    let (type_, type_length, converted_type, scale, precision) = match node.as_ref() {
        Type::Primitive {
            physical_type,
            type_length,
            ..
        } => {
            let len = if *type_length >= 0 {
                Some(*type_length)
            } else {
                None
            };
            (Some((*physical_type).into()), len, None, None, None)
        }
        Type::Group { .. } => (None, None, None, None, None),
    };
    let num_children = match node.as_ref() {
        Type::Group { fields, .. } => Some(fields.len() as i32),
        Type::Primitive { .. } => None,
    };
    parquet_format::SchemaElement {
        type_,
        type_length,
        repetition_type: info.repetition().map(Into::into),
        name: info.name().to_string(),
        num_children,
        converted_type,
        scale,
        precision,
        field_id: info.id(),
        logical_type: info.logical_type().cloned().map(Into::into),
    }
}

/// Rebuilds a [`SchemaDescriptor`] from the footer's flattened element list
/// by walking `num_children` the same way Java's `parquet-mr` does.
pub fn from_thrift_schema(elements: &[parquet_format::SchemaElement]) -> Result<SchemaDescriptor> {
    let mut index = 0usize;
    let root = from_thrift_recursive(elements, &mut index)?;
    SchemaDescriptor::new(std::sync::Arc::new(root))
}

fn from_thrift_recursive(
    elements: &[parquet_format::SchemaElement],
    index: &mut usize,
) -> Result<Type> {
    use crate::basic::{LogicalType, Repetition, Type as PhysicalType};
    use crate::errors::malformed_err;
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder};

    let element = elements
        .get(*index)
        .ok_or_else(|| malformed_err!("schema element index out of range"))?
        .clone();
    *index += 1;

    if let Some(num_children) = element.num_children {
        let mut fields = Vec::with_capacity(num_children as usize);
        for _ in 0..num_children {
            fields.push(std::sync::Arc::new(from_thrift_recursive(elements, index)?));
        }
        let repetition = element.repetition_type.map(Repetition::from);
        let logical_type = element
            .logical_type
            .map(LogicalType::try_from)
            .transpose()?;
        let builder = match repetition {
            None => GroupTypeBuilder::new_root(element.name),
            Some(rep) => GroupTypeBuilder::new(element.name, rep).with_logical_type(logical_type),
        };
        builder.with_fields(fields).build()
    } else {
        let physical_type = PhysicalType::from(
            element
                .type_
                .ok_or_else(|| malformed_err!("leaf schema element missing physical type"))?,
        );
        let repetition = element
            .repetition_type
            .map(Repetition::from)
            .ok_or_else(|| malformed_err!("leaf schema element missing repetition"))?;
        let logical_type = element
            .logical_type
            .map(LogicalType::try_from)
            .transpose()?;
        let mut builder = PrimitiveTypeBuilder::new(element.name, physical_type)
            .with_repetition(repetition)
            .with_logical_type(logical_type)
            .with_length(element.type_length.unwrap_or(-1));
        if let Some(id) = element.field_id {
            builder = builder.with_id(id);
        }
        builder.build()
    }
}
