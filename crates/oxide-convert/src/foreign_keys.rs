//! Foreign key conversion.
//!
//! The target only supports `NO ACTION` for both referential actions, so
//! every source action is downgraded to it. This is a known capability gap
//! of the target and is not reported as an issue.
//!
//! Keys are converted in two situations:
//!
//! - while a table is converted, over the table's own keys
//!   ([`convert_foreign_keys`], `restore = false`), and
//! - when a table is restored, over every other table's keys that point at
//!   it ([`convert_foreign_keys_for_reference_table`], `restore = true`).
//!
//! A table that references itself goes through both, and unless
//! deduplication is requested it ends up with the key twice.

use tracing::debug;

use crate::context::ConversionContext;
use crate::ddl::{self, ForeignKeyAction};
use crate::diagnostics::IssueKind;
use crate::error::{ConvertError, Result};
use crate::schema;

/// Maps a source referential action onto the target's vocabulary.
#[must_use]
pub fn convert_action(action: schema::ForeignKeyAction) -> ForeignKeyAction {
    match action {
        schema::ForeignKeyAction::NoAction
        | schema::ForeignKeyAction::Restrict
        | schema::ForeignKeyAction::Cascade
        | schema::ForeignKeyAction::SetNull
        | schema::ForeignKeyAction::SetDefault => ForeignKeyAction::NoAction,
    }
}

/// Converts a single foreign key of `source_table_id`.
///
/// Outside restore mode the key name is reserved in the name registry
/// (and disambiguated if taken). In restore mode the name was reserved when
/// the key was first converted and is carried as is.
pub fn convert_foreign_key(
    ctx: &mut ConversionContext,
    target_table_id: &str,
    source_table_id: &str,
    key: &schema::ForeignKey,
    restore: bool,
) -> Result<ddl::ForeignKey> {
    if key.col_ids.len() != key.refer_column_ids.len() {
        return Err(ConvertError::ColumnCountMismatch {
            table_id: source_table_id.to_string(),
            foreign_key: key.name.clone(),
            columns: key.col_ids.len(),
            referenced_columns: key.refer_column_ids.len(),
        });
    }

    if !ctx.source_tables.contains_key(&key.refer_table_id) {
        return Err(ConvertError::unresolved(
            source_table_id,
            &key.name,
            &key.refer_table_id,
        ));
    }

    let name = if restore {
        key.name.clone()
    } else {
        ctx.names.register(&key.name)
    };

    if key.on_delete != schema::ForeignKeyAction::NoAction
        || key.on_update != schema::ForeignKeyAction::NoAction
    {
        debug!(
            table_id = %target_table_id,
            foreign_key = %name,
            on_delete = key.on_delete.to_sql(),
            on_update = key.on_update.to_sql(),
            "Downgraded referential actions to NO ACTION"
        );
    }

    debug!(
        table_id = %target_table_id,
        foreign_key = %name,
        refer_table_id = %key.refer_table_id,
        restore,
        "Converted foreign key"
    );

    Ok(ddl::ForeignKey {
        name,
        col_ids: key.col_ids.clone(),
        refer_table_id: key.refer_table_id.clone(),
        refer_column_ids: key.refer_column_ids.clone(),
        id: key.id.clone(),
        on_delete: convert_action(key.on_delete),
        on_update: convert_action(key.on_update),
    })
}

/// Converts the foreign keys of one table.
///
/// A key that cannot be converted is skipped and recorded in the
/// diagnostics of `source_table_id`; the rest are returned in input order.
pub fn convert_foreign_keys(
    ctx: &mut ConversionContext,
    target_table_id: &str,
    source_table_id: &str,
    keys: &[schema::ForeignKey],
    restore: bool,
) -> Vec<ddl::ForeignKey> {
    let mut converted = Vec::with_capacity(keys.len());
    for key in keys {
        match convert_foreign_key(ctx, target_table_id, source_table_id, key, restore) {
            Ok(fk) => converted.push(fk),
            Err(err) => record_skipped(ctx, source_table_id, key, &err),
        }
    }
    converted
}

/// Re-materializes the keys of `table_id` that reference `refer_table_id`
/// and appends them to `existing`, the table's current target keys.
///
/// With `dedupe`, a key whose id is already in `existing` is skipped.
pub fn convert_foreign_keys_for_reference_table(
    ctx: &mut ConversionContext,
    table_id: &str,
    refer_table_id: &str,
    keys: &[schema::ForeignKey],
    mut existing: Vec<ddl::ForeignKey>,
    dedupe: bool,
) -> Vec<ddl::ForeignKey> {
    for key in keys.iter().filter(|k| k.refer_table_id == refer_table_id) {
        if dedupe && existing.iter().any(|fk| fk.id == key.id) {
            debug!(
                table_id = %table_id,
                foreign_key = %key.name,
                "Foreign key already present, not duplicating"
            );
            continue;
        }
        match convert_foreign_key(ctx, table_id, table_id, key, true) {
            Ok(fk) => existing.push(fk),
            Err(err) => record_skipped(ctx, table_id, key, &err),
        }
    }
    existing
}

fn record_skipped(
    ctx: &mut ConversionContext,
    table_id: &str,
    key: &schema::ForeignKey,
    err: &ConvertError,
) {
    let kind = match err {
        ConvertError::ColumnCountMismatch { .. } => IssueKind::ForeignKeyColumnMismatch,
        _ => IssueKind::UnresolvedReference,
    };
    ctx.diagnostics
        .record(table_id, kind, &key.name, format!("Skipped foreign key: {}", err));
}
