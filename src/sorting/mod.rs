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

//! Sort-then-merge row group writer (spec.md §4.7): buffers rows up to
//! `sort_row_count`, stable-sorts each batch, and merges every batch through
//! [`crate::merge::KWayMerge`] into one sorted output row group.

pub mod row_buffer;
pub mod writer;

pub use row_buffer::RowBuffer;
pub use writer::SortingWriter;
