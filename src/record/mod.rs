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

//! Row shredding and assembly: the Dremel algorithm (spec.md §4.1).
//!
//! The reflective record<->schema binding is out of scope (spec.md §1); in
//! its place, [`Record`] is the concrete tree-shaped value this crate's
//! `deconstruct`/`reconstruct` seam (spec.md §9) operates on. A host binding
//! a typed struct would build a `Record` from it and hand it to [`shred`].

pub mod assemble;
pub mod row;
pub mod shred;

use crate::data_type::{ByteArray, Int96};

pub use assemble::assemble_all;
pub use row::Row;
pub use shred::shred;

/// A tree-shaped record value: the `deconstruct(record)` input and
/// `reconstruct(Row)` output named in spec.md §9.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96(Int96),
    Float(f32),
    Double(f64),
    Bytes(ByteArray),
    /// Named children in schema-field order; lookup is by name.
    Group(Vec<(String, Record)>),
    /// Elements of a REPEATED field. An empty list and a missing field are
    /// both valid "no elements" inputs.
    List(Vec<Record>),
}

impl Record {
    pub fn group(fields: Vec<(&str, Record)>) -> Record {
        Record::Group(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    pub fn str(s: impl Into<String>) -> Record {
        Record::Bytes(ByteArray::from(s.into()))
    }

    pub fn field(&self, name: &str) -> Option<&Record> {
        match self {
            Record::Group(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

fn lookup<'a>(fields: &'a [(String, Record)], name: &str) -> Option<&'a Record> {
    fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
}
