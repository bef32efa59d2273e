//! Secondary index conversion.

use std::collections::BTreeMap;

use tracing::debug;

use crate::ddl::{ColumnDef, CreateIndex};
use crate::keys::convert_keys;
use crate::schema::Index;

/// Converts the secondary indexes of one table.
///
/// Every column an index refers to must already be part of the target
/// table (`target_col_ids` / `target_col_defs`). That is the caller's
/// responsibility and is only asserted in debug builds.
#[must_use]
pub fn convert_indexes(
    target_table_id: &str,
    indexes: &[Index],
    target_col_ids: &[String],
    target_col_defs: &BTreeMap<String, ColumnDef>,
) -> Vec<CreateIndex> {
    indexes
        .iter()
        .map(|index| {
            debug_assert!(
                index
                    .keys
                    .iter()
                    .map(|k| &k.col_id)
                    .chain(&index.stored_column_ids)
                    .all(|id| target_col_ids.contains(id) && target_col_defs.contains_key(id)),
                "index '{}' refers to a column missing from table '{}'",
                index.name,
                target_table_id
            );
            debug!(table_id = %target_table_id, index = %index.name, "Converted index");

            CreateIndex {
                name: index.name.clone(),
                table_id: target_table_id.to_string(),
                unique: index.unique,
                keys: convert_keys(&index.keys),
                id: index.id.clone(),
                stored_column_ids: index.stored_column_ids.clone(),
            }
        })
        .collect()
}
