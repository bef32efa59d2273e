//! Conversion engine.
//!
//! [`SchemaConverter`] drives the individual converters over a
//! [`ConversionContext`]: every source table becomes a target table, every
//! source sequence a target sequence, and the verification pass then filters
//! the check constraints.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::checks::convert_check_constraints;
use crate::context::ConversionContext;
use crate::ddl::{ColumnDef, CreateTable};
use crate::error::{ConvertError, Result};
use crate::foreign_keys::{convert_foreign_keys, convert_foreign_keys_for_reference_table};
use crate::indexes::convert_indexes;
use crate::keys::convert_keys;
use crate::options::ConvertOptions;
use crate::schema::SourceSchema;
use crate::sequences::apply_sequence;
use crate::verify::{verify_expressions, ExpressionVerificationAccessor};

/// Counts describing a finished conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    /// Tables in the target schema.
    pub tables: usize,
    /// Foreign keys across all target tables.
    pub foreign_keys: usize,
    /// Secondary indexes across all target tables.
    pub indexes: usize,
    /// Check constraints kept after verification.
    pub check_constraints: usize,
    /// Check constraints dropped by verification.
    pub dropped_check_constraints: usize,
    /// Target sequences.
    pub sequences: usize,
    /// Issues recorded in the diagnostics.
    pub issues: usize,
    /// Whether the converted schema needs user attention.
    pub needs_attention: bool,
}

impl ConversionSummary {
    fn collect(ctx: &ConversionContext, dropped: usize, needs_attention: bool) -> Self {
        let tables = ctx.target_tables.values();
        Self {
            tables: ctx.target_tables.len(),
            foreign_keys: tables.clone().map(|t| t.foreign_keys.len()).sum(),
            indexes: tables.clone().map(|t| t.indexes.len()).sum(),
            check_constraints: tables.map(|t| t.check_constraints.len()).sum(),
            dropped_check_constraints: dropped,
            sequences: ctx.target_sequences.len(),
            issues: ctx.diagnostics.issue_count(),
            needs_attention,
        }
    }
}

fn count_check_constraints(ctx: &ConversionContext) -> usize {
    ctx.target_tables
        .values()
        .map(|t| t.check_constraints.len())
        .sum()
}

/// Converts a source schema into the target schema.
#[derive(Clone)]
pub struct SchemaConverter {
    options: ConvertOptions,
    accessor: Option<Arc<dyn ExpressionVerificationAccessor>>,
}

impl fmt::Debug for SchemaConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaConverter")
            .field("options", &self.options)
            .field("has_accessor", &self.accessor.is_some())
            .finish()
    }
}

impl SchemaConverter {
    /// Creates a converter without an expression verifier.
    ///
    /// Fails if `options` are invalid.
    pub fn new(options: ConvertOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            accessor: None,
        })
    }

    /// Sets the accessor used by the verification pass.
    #[must_use]
    pub fn with_accessor(mut self, accessor: Arc<dyn ExpressionVerificationAccessor>) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// The options this converter runs with.
    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Creates a context over `source` using this converter's options.
    #[must_use]
    pub fn context(&self, source: SourceSchema) -> ConversionContext {
        ConversionContext::from_source(source, &self.options)
    }

    /// Converts one source table and stores it in the target schema,
    /// replacing any previous conversion of it.
    pub fn convert_table(&self, ctx: &mut ConversionContext, table_id: &str) -> Result<()> {
        let source = ctx.source_table(table_id)?.clone();

        let mut table = CreateTable::new(&source.id, &source.name);
        table.col_ids = source.col_ids.clone();
        table.col_defs = source
            .col_ids
            .iter()
            .filter_map(|id| source.col_defs.get(id))
            .map(|col| {
                let def = ColumnDef {
                    id: col.id.clone(),
                    name: col.name.clone(),
                    column_type: col.column_type.clone(),
                    not_null: col.not_null,
                };
                (col.id.clone(), def)
            })
            .collect();
        table.primary_keys = convert_keys(&source.primary_keys);
        table.foreign_keys =
            convert_foreign_keys(ctx, &source.id, &source.id, &source.foreign_keys, false);
        table.indexes = convert_indexes(&source.id, &source.indexes, &table.col_ids, &table.col_defs);
        table.check_constraints = convert_check_constraints(ctx, &source.check_constraints);

        debug!(
            table_id = %table.id,
            table = %table.name,
            columns = table.col_ids.len(),
            foreign_keys = table.foreign_keys.len(),
            indexes = table.indexes.len(),
            check_constraints = table.check_constraints.len(),
            "Converted table"
        );
        ctx.removed_tables.remove(&source.id);
        ctx.target_tables.insert(source.id, table);
        Ok(())
    }

    /// Converts every source table, then every source sequence, each in
    /// ascending id order.
    pub fn convert_schema(&self, ctx: &mut ConversionContext) -> Result<()> {
        let table_ids: Vec<String> = ctx.source_tables.keys().cloned().collect();
        for table_id in &table_ids {
            self.convert_table(ctx, table_id)?;
        }

        let sequences: Vec<_> = ctx.source_sequences.values().cloned().collect();
        for sequence in &sequences {
            apply_sequence(ctx, sequence);
        }

        info!(
            tables = table_ids.len(),
            sequences = sequences.len(),
            "Converted schema"
        );
        Ok(())
    }

    /// Runs the verification pass and returns whether the converted schema
    /// needs attention.
    ///
    /// Without an accessor, or with verification disabled, every check
    /// constraint is kept and the result is `false`.
    pub async fn verify(&self, ctx: &mut ConversionContext) -> bool {
        if !self.options.verify_expressions {
            info!("Expression verification disabled");
            return false;
        }
        let Some(accessor) = &self.accessor else {
            info!("No expression verifier configured, keeping all check constraints");
            return false;
        };
        verify_expressions(ctx, accessor.as_ref()).await
    }

    /// Converts the whole schema and verifies it.
    pub async fn run(&self, ctx: &mut ConversionContext) -> Result<ConversionSummary> {
        self.convert_schema(ctx)?;

        let before = count_check_constraints(ctx);
        let needs_attention = self.verify(ctx).await;
        let dropped = before - count_check_constraints(ctx);

        let summary = ConversionSummary::collect(ctx, dropped, needs_attention);
        info!(
            tables = summary.tables,
            issues = summary.issues,
            needs_attention = summary.needs_attention,
            "Conversion finished"
        );
        Ok(summary)
    }

    /// Removes a table from the target schema along with every foreign key
    /// that references it, and returns the removed table.
    ///
    /// The table is kept in the context exactly as it was, verified check
    /// constraints included, and its names stay reserved, so
    /// [`restore_table`](Self::restore_table) puts it back unchanged.
    pub fn remove_table(&self, ctx: &mut ConversionContext, table_id: &str) -> Result<CreateTable> {
        let removed = ctx
            .target_tables
            .remove(table_id)
            .ok_or_else(|| ConvertError::UnknownTable(table_id.to_string()))?;

        let mut stripped = 0;
        for table in ctx
            .target_tables
            .values_mut()
            .chain(ctx.removed_tables.values_mut())
        {
            let before = table.foreign_keys.len();
            table.foreign_keys.retain(|fk| fk.refer_table_id != table_id);
            stripped += before - table.foreign_keys.len();
        }

        info!(
            table_id = %table_id,
            table = %removed.name,
            inbound_foreign_keys = stripped,
            "Removed table"
        );
        ctx.removed_tables
            .insert(table_id.to_string(), removed.clone());
        Ok(removed)
    }

    /// Puts a removed table back and re-materializes the foreign keys that
    /// reference it, on every table present or removed, itself included.
    ///
    /// A self-referencing table keeps its own self-reference and gets it
    /// again from the reference pass unless `dedupe_reference_foreign_keys`
    /// is set. Fails with [`ConvertError::UnknownTable`] if the table was
    /// not removed.
    pub fn restore_table(&self, ctx: &mut ConversionContext, table_id: &str) -> Result<()> {
        let table = ctx
            .removed_tables
            .remove(table_id)
            .ok_or_else(|| ConvertError::UnknownTable(table_id.to_string()))?;
        ctx.target_tables.insert(table_id.to_string(), table);

        let dedupe = self.options.dedupe_reference_foreign_keys;
        let owner_ids: Vec<String> = ctx
            .target_tables
            .keys()
            .chain(ctx.removed_tables.keys())
            .cloned()
            .collect();
        for owner_id in &owner_ids {
            let keys = match ctx.source_tables.get(owner_id) {
                Some(source) => source.foreign_keys.clone(),
                None => continue,
            };
            let existing = std::mem::take(&mut ctx.converted_table_mut(owner_id)?.foreign_keys);
            let restored = convert_foreign_keys_for_reference_table(
                ctx, owner_id, table_id, &keys, existing, dedupe,
            );
            ctx.converted_table_mut(owner_id)?.foreign_keys = restored;
        }

        info!(table_id = %table_id, "Restored table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        CheckConstraint, Column, ColumnType, ForeignKey, Index, Key, Sequence, SequenceKind, Table,
    };

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn source() -> SourceSchema {
        SourceSchema::new()
            .table(
                Table::new("t1", "customers")
                    .column(Column::new("c1", "id", ColumnType::new("INT64")).not_null())
                    .column(Column::new("c2", "email", ColumnType::sized("STRING", 255)))
                    .primary_key(vec![Key::new("c1", false, 1)])
                    .index(Index {
                        name: "idx_email".to_string(),
                        id: "i1".to_string(),
                        unique: true,
                        keys: vec![Key::new("c2", false, 1)],
                        stored_column_ids: Vec::new(),
                    })
                    .check_constraint(CheckConstraint::new("ck1", "email check", "email != ''")),
            )
            .table(
                Table::new("t2", "orders")
                    .column(Column::new("c3", "id", ColumnType::new("INT64")).not_null())
                    .column(Column::new("c4", "customer_id", ColumnType::new("INT64")))
                    .column(Column::new("c5", "parent_id", ColumnType::new("INT64")))
                    .primary_key(vec![Key::new("c3", false, 1)])
                    .foreign_key(ForeignKey::new("f1", "fk_customer", ids(&["c4"]), "t1", ids(&["c1"])))
                    .foreign_key(ForeignKey::new("f2", "fk_parent", ids(&["c5"]), "t2", ids(&["c3"]))),
            )
            .sequence(Sequence {
                name: "order_seq".to_string(),
                id: "s1".to_string(),
                kind: SequenceKind::AutoIncrement,
                skip_range_min: None,
                skip_range_max: None,
                start_with_counter: Some("1000".to_string()),
            })
    }

    #[test]
    fn test_convert_table() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());

        converter.convert_table(&mut ctx, "t1").unwrap();

        let table = ctx.target_table("t1").unwrap();
        assert_eq!(table.name, "customers");
        assert_eq!(table.col_ids, vec!["c1", "c2"]);
        assert!(table.get_column("c1").unwrap().not_null);
        assert_eq!(table.primary_keys.len(), 1);
        assert_eq!(table.indexes[0].table_id, "t1");
        assert_eq!(table.check_constraints[0].name, "email_check");
    }

    #[test]
    fn test_convert_unknown_table() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());
        assert!(matches!(
            converter.convert_table(&mut ctx, "t9"),
            Err(ConvertError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let options = ConvertOptions::new().with_max_identifier_length(0);
        assert!(matches!(
            SchemaConverter::new(options),
            Err(ConvertError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_convert_schema() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());

        converter.convert_schema(&mut ctx).unwrap();

        assert_eq!(ctx.target_tables.len(), 2);
        assert_eq!(ctx.target_sequences.len(), 1);
        let orders = ctx.target_table("t2").unwrap();
        let names: Vec<&str> = orders.foreign_keys.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fk_customer", "fk_parent"]);
    }

    #[tokio::test]
    async fn test_run_without_accessor_keeps_checks() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());

        let summary = converter.run(&mut ctx).await.unwrap();

        assert_eq!(
            summary,
            ConversionSummary {
                tables: 2,
                foreign_keys: 2,
                indexes: 1,
                check_constraints: 1,
                dropped_check_constraints: 0,
                sequences: 1,
                issues: 0,
                needs_attention: false,
            }
        );
    }

    #[test]
    fn test_remove_table_strips_inbound_keys() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());
        converter.convert_schema(&mut ctx).unwrap();

        let removed = converter.remove_table(&mut ctx, "t1").unwrap();

        assert_eq!(removed.name, "customers");
        assert!(ctx.target_table("t1").is_err());
        let orders = ctx.target_table("t2").unwrap();
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.foreign_keys[0].name, "fk_parent");
        assert!(ctx.removed_tables.contains_key("t1"));
    }

    #[test]
    fn test_remove_table_keeps_names_reserved() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());
        converter.convert_schema(&mut ctx).unwrap();
        let reserved = ctx.names.len();

        converter.remove_table(&mut ctx, "t1").unwrap();

        assert_eq!(ctx.names.len(), reserved);
        assert_eq!(ctx.names.register("email_check"), "email_check_1");

        converter.restore_table(&mut ctx, "t1").unwrap();
        let customers = ctx.target_table("t1").unwrap();
        assert_eq!(customers.check_constraints[0].name, "email_check");
    }

    #[test]
    fn test_restore_unknown_table() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());
        converter.convert_schema(&mut ctx).unwrap();

        assert!(matches!(
            converter.restore_table(&mut ctx, "t1"),
            Err(ConvertError::UnknownTable(_))
        ));
        assert!(matches!(
            converter.restore_table(&mut ctx, "t9"),
            Err(ConvertError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_restore_keeps_keys_of_removed_tables_consistent() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());
        converter.convert_schema(&mut ctx).unwrap();

        converter.remove_table(&mut ctx, "t2").unwrap();
        converter.remove_table(&mut ctx, "t1").unwrap();
        assert!(ctx.removed_tables["t2"]
            .foreign_keys
            .iter()
            .all(|fk| fk.refer_table_id != "t1"));

        converter.restore_table(&mut ctx, "t1").unwrap();
        converter.restore_table(&mut ctx, "t2").unwrap();

        let orders = ctx.target_table("t2").unwrap();
        let names: Vec<&str> = orders.foreign_keys.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fk_parent", "fk_customer", "fk_parent"]);
        assert!(ctx.removed_tables.is_empty());
    }

    #[test]
    fn test_restore_table_brings_back_inbound_keys() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());
        converter.convert_schema(&mut ctx).unwrap();
        converter.remove_table(&mut ctx, "t1").unwrap();

        converter.restore_table(&mut ctx, "t1").unwrap();

        let customers = ctx.target_table("t1").unwrap();
        assert_eq!(customers.check_constraints[0].name, "email_check");
        let orders = ctx.target_table("t2").unwrap();
        let names: Vec<&str> = orders.foreign_keys.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fk_parent", "fk_customer"]);
    }

    #[test]
    fn test_restore_self_referencing_table() {
        let converter = SchemaConverter::new(ConvertOptions::default()).unwrap();
        let mut ctx = converter.context(source());
        converter.convert_schema(&mut ctx).unwrap();
        converter.remove_table(&mut ctx, "t2").unwrap();

        converter.restore_table(&mut ctx, "t2").unwrap();

        let orders = ctx.target_table("t2").unwrap();
        let names: Vec<&str> = orders.foreign_keys.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fk_customer", "fk_parent", "fk_parent"]);
    }

    #[test]
    fn test_restore_self_referencing_table_with_dedupe() {
        let options = ConvertOptions::new().with_reference_dedupe();
        let converter = SchemaConverter::new(options).unwrap();
        let mut ctx = converter.context(source());
        converter.convert_schema(&mut ctx).unwrap();
        converter.remove_table(&mut ctx, "t2").unwrap();

        converter.restore_table(&mut ctx, "t2").unwrap();

        let orders = ctx.target_table("t2").unwrap();
        let names: Vec<&str> = orders.foreign_keys.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fk_customer", "fk_parent"]);
    }
}
