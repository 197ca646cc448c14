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

//! K-way merge over row groups that already share a sort order (spec.md
//! §4.8), the engine [`crate::sorting::SortingWriter`] drives to fold its
//! staged row groups back into one.

use std::sync::Arc;

use crate::basic::LogicalType;
use crate::errors::{schema_err, sorting_columns_err, Result};
use crate::file::metadata::SortingColumn;
use crate::file::statistics::compare_physical;
use crate::record::Row;
use crate::schema::types::{SchemaDescPtr, SchemaDescriptor};

/// One already-sorted row group feeding the merge, plus the sorting columns
/// it was sorted by (spec.md §4.8: "sorting columns of each input must be a
/// prefix of the declared merge sorting columns").
pub struct MergeInput {
    pub schema: SchemaDescPtr,
    pub sorting_columns: Vec<SortingColumn>,
    pub rows: Vec<Row>,
}

struct Cursor {
    rows: std::vec::IntoIter<Row>,
    front: Option<Row>,
}

impl Cursor {
    fn new(rows: Vec<Row>) -> Self {
        let mut rows = rows.into_iter();
        let front = rows.next();
        Cursor { rows, front }
    }

    fn advance(&mut self) {
        self.front = self.rows.next();
    }
}

/// Merges N sorted row groups into one sorted sequence of rows. Construction
/// checks schema compatibility and the sorting-column prefix constraint;
/// iterating pops the smallest front row across all cursors, ties broken by
/// cursor index for stability (spec.md §4.8).
pub struct KWayMerge {
    schema: SchemaDescPtr,
    sorting_columns: Vec<SortingColumn>,
    cursors: Vec<Cursor>,
    drop_duplicated_rows: bool,
    last_emitted: Option<Row>,
    closed: bool,
}

impl KWayMerge {
    pub fn new(
        schema: SchemaDescPtr,
        sorting_columns: Vec<SortingColumn>,
        inputs: Vec<MergeInput>,
        drop_duplicated_rows: bool,
    ) -> Result<Self> {
        for input in &inputs {
            let same_schema = Arc::ptr_eq(&input.schema, &schema) || *input.schema == *schema;
            if !same_schema {
                return Err(schema_err!("merge input schema does not match the merge's declared schema"));
            }
            if !sorting_columns.is_empty() && !is_prefix(&input.sorting_columns, &sorting_columns) {
                return Err(sorting_columns_err!(
                    "merge input's sorting columns are not a prefix of the merge's sorting columns"
                ));
            }
        }
        let cursors = inputs.into_iter().map(|i| Cursor::new(i.rows)).collect();
        Ok(KWayMerge {
            schema,
            sorting_columns,
            cursors,
            drop_duplicated_rows,
            last_emitted: None,
            closed: false,
        })
    }

    /// Propagates close to every underlying cursor (spec.md §4.8); also runs
    /// automatically on drop.
    pub fn close(&mut self) {
        self.closed = true;
        self.cursors.clear();
    }

    fn pick_min_cursor(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, cursor) in self.cursors.iter().enumerate() {
            if cursor.front.is_none() {
                continue;
            }
            best = Some(match best {
                None => i,
                Some(b) => {
                    let row = cursor.front.as_ref().unwrap();
                    let other = self.cursors[b].front.as_ref().unwrap();
                    if compare_rows(row, other, &self.sorting_columns, &self.schema) == std::cmp::Ordering::Less {
                        i
                    } else {
                        b
                    }
                }
            });
        }
        best
    }
}

impl Iterator for KWayMerge {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.closed {
            return None;
        }
        loop {
            let idx = self.pick_min_cursor()?;
            let row = self.cursors[idx].front.clone().expect("pick_min_cursor only returns non-empty cursors");
            self.cursors[idx].advance();
            if self.drop_duplicated_rows {
                if let Some(last) = &self.last_emitted {
                    if compare_rows(&row, last, &self.sorting_columns, &self.schema) == std::cmp::Ordering::Equal {
                        continue;
                    }
                }
            }
            self.last_emitted = Some(row.clone());
            return Some(row);
        }
    }
}

impl Drop for KWayMerge {
    fn drop(&mut self) {
        self.close();
    }
}

fn is_prefix(prefix: &[SortingColumn], full: &[SortingColumn]) -> bool {
    prefix.len() <= full.len() && prefix.iter().zip(full.iter()).all(|(a, b)| a == b)
}

/// Orders two rows by `sorting_columns`, honoring each column's ASC/DESC and
/// nulls-first/last, falling through to the next column on ties. Shared by
/// the merge's min-pick and [`crate::sorting::row_buffer::RowBuffer::sort`]
/// so both stages agree on what "sorted" means.
pub(crate) fn compare_rows(
    a: &Row,
    b: &Row,
    sorting_columns: &[SortingColumn],
    schema: &SchemaDescriptor,
) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    for sc in sorting_columns {
        let col_idx = sc.column_idx as usize;
        let unsigned = schema
            .column(col_idx)
            .logical_type()
            .map(LogicalType::is_unsigned)
            .unwrap_or(false);
        let av = value_for_column(a, col_idx);
        let bv = value_for_column(b, col_idx);
        let ord = match (av, bv) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) | (Some(_), None) => {
                let a_is_null = av.is_none();
                if a_is_null == sc.nulls_first {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (Some(x), Some(y)) => match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => if sc.nulls_first { Ordering::Less } else { Ordering::Greater },
                (false, true) => if sc.nulls_first { Ordering::Greater } else { Ordering::Less },
                (false, false) => {
                    let ord = compare_physical(&x.physical, &y.physical, unsigned);
                    if sc.descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
            },
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn value_for_column(row: &Row, col_idx: usize) -> Option<&crate::value::Value> {
    row.values().iter().find(|v| v.column_index() == col_idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Repetition, Type as PhysicalType};
    use crate::schema::types::{GroupTypeBuilder, PrimitiveTypeBuilder};
    use crate::value::{PhysicalValue, Value};

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

    fn sorting_columns() -> Vec<SortingColumn> {
        vec![SortingColumn {
            column_idx: 0,
            descending: false,
            nulls_first: true,
        }]
    }

    #[test]
    fn merges_two_sorted_inputs_in_order() {
        let schema = one_column_schema();
        let left = MergeInput {
            schema: schema.clone(),
            sorting_columns: sorting_columns(),
            rows: vec![row(1), row(3), row(5)],
        };
        let right = MergeInput {
            schema: schema.clone(),
            sorting_columns: sorting_columns(),
            rows: vec![row(2), row(4), row(6)],
        };
        let merge = KWayMerge::new(schema, sorting_columns(), vec![left, right], false).unwrap();
        let merged: Vec<i32> = merge
            .map(|r| match &r.values()[0].physical {
                PhysicalValue::Int32(n) => *n,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn drop_duplicated_rows_coalesces_ties() {
        let schema = one_column_schema();
        let left = MergeInput {
            schema: schema.clone(),
            sorting_columns: sorting_columns(),
            rows: vec![row(1), row(2)],
        };
        let right = MergeInput {
            schema: schema.clone(),
            sorting_columns: sorting_columns(),
            rows: vec![row(2), row(3)],
        };
        let merge = KWayMerge::new(schema, sorting_columns(), vec![left, right], true).unwrap();
        let merged: Vec<i32> = merge
            .map(|r| match &r.values()[0].physical {
                PhysicalValue::Int32(n) => *n,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(merged, vec![1, 2, 3]);
    }

    #[test]
    fn empty_sorting_columns_degenerates_to_concatenation() {
        let schema = one_column_schema();
        let left = MergeInput {
            schema: schema.clone(),
            sorting_columns: vec![],
            rows: vec![row(9), row(7)],
        };
        let right = MergeInput {
            schema: schema.clone(),
            sorting_columns: vec![],
            rows: vec![row(1), row(2)],
        };
        let merge = KWayMerge::new(schema, vec![], vec![left, right], false).unwrap();
        let merged: Vec<i32> = merge
            .map(|r| match &r.values()[0].physical {
                PhysicalValue::Int32(n) => *n,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(merged, vec![9, 7, 1, 2]);
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let schema = one_column_schema();
        let other_leaf = PrimitiveTypeBuilder::new("m", PhysicalType::INT64)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap();
        let other_root = GroupTypeBuilder::new_root("schema")
            .with_fields(vec![Arc::new(other_leaf)])
            .build()
            .unwrap();
        let other_schema = Arc::new(SchemaDescriptor::new(Arc::new(other_root)).unwrap());
        let input = MergeInput {
            schema: other_schema,
            sorting_columns: vec![],
            rows: vec![row(1)],
        };
        let err = KWayMerge::new(schema, vec![], vec![input], false).unwrap_err();
        assert!(matches!(err, crate::errors::ParquetError::SchemaMismatch(_)));
    }

    #[test]
    fn sorting_columns_not_a_prefix_is_rejected() {
        let schema = one_column_schema();
        let mismatched = SortingColumn {
            column_idx: 0,
            descending: true,
            nulls_first: true,
        };
        let input = MergeInput {
            schema: schema.clone(),
            sorting_columns: vec![mismatched],
            rows: vec![row(1)],
        };
        let err = KWayMerge::new(schema, sorting_columns(), vec![input], false).unwrap_err();
        assert!(matches!(err, crate::errors::ParquetError::SortingColumnsMismatch(_)));
    }

    #[test]
    fn many_randomly_shuffled_sorted_inputs_merge_into_total_order() {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let schema = one_column_schema();
        let mut rng = StdRng::seed_from_u64(0xc0ffee);
        let mut pool: Vec<i32> = (0..500).collect();
        pool.shuffle(&mut rng);

        let num_inputs = 8;
        let mut inputs = Vec::with_capacity(num_inputs);
        let mut all_values = Vec::new();
        for chunk in pool.chunks(pool.len() / num_inputs + 1) {
            let mut values = chunk.to_vec();
            values.sort_unstable();
            all_values.extend_from_slice(&values);
            inputs.push(MergeInput {
                schema: schema.clone(),
                sorting_columns: sorting_columns(),
                rows: values.into_iter().map(row).collect(),
            });
        }
        all_values.sort_unstable();

        let merge = KWayMerge::new(schema, sorting_columns(), inputs, false).unwrap();
        let merged: Vec<i32> = merge
            .map(|r| match &r.values()[0].physical {
                PhysicalValue::Int32(n) => *n,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(merged, all_values);
        assert!(merged.windows(2).all(|w| w[0] <= w[1]));
    }
}
