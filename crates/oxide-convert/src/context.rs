//! Conversion state for one migration run.
//!
//! [`ConversionContext`] owns the source schema, the target schema being
//! built, the name registry and the diagnostics. It is not synchronized:
//! exactly one caller mutates it at a time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ddl::{self, CreateTable};
use crate::diagnostics::Diagnostics;
use crate::error::{ConvertError, Result};
use crate::names::NameRegistry;
use crate::options::ConvertOptions;
use crate::schema::{self, SourceSchema};

/// Mutable state of a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConversionContext {
    /// Source tables keyed by id. Read-only during conversion.
    pub source_tables: BTreeMap<String, schema::Table>,
    /// Source sequences keyed by id.
    pub source_sequences: BTreeMap<String, schema::Sequence>,
    /// Target tables keyed by id.
    pub target_tables: ddl::Schema,
    /// Converted tables taken out of the target schema, keyed by id, kept
    /// as they were so they can be put back unchanged.
    pub removed_tables: ddl::Schema,
    /// Target sequences keyed by id.
    pub target_sequences: BTreeMap<String, ddl::Sequence>,
    /// Identifiers already assigned to target objects.
    pub names: NameRegistry,
    /// Issues found so far.
    pub diagnostics: Diagnostics,
}

impl ConversionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context over `source` with an empty target schema.
    #[must_use]
    pub fn from_source(source: SourceSchema, options: &ConvertOptions) -> Self {
        Self {
            source_tables: source.tables,
            source_sequences: source.sequences,
            target_tables: ddl::Schema::new(),
            removed_tables: ddl::Schema::new(),
            target_sequences: BTreeMap::new(),
            names: NameRegistry::new(options.max_identifier_length),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Looks up a source table.
    pub fn source_table(&self, table_id: &str) -> Result<&schema::Table> {
        self.source_tables
            .get(table_id)
            .ok_or_else(|| ConvertError::UnknownTable(table_id.to_string()))
    }

    /// Looks up a target table.
    pub fn target_table(&self, table_id: &str) -> Result<&CreateTable> {
        self.target_tables
            .get(table_id)
            .ok_or_else(|| ConvertError::UnknownTable(table_id.to_string()))
    }

    /// Looks up a target table for modification.
    pub fn target_table_mut(&mut self, table_id: &str) -> Result<&mut CreateTable> {
        self.target_tables
            .get_mut(table_id)
            .ok_or_else(|| ConvertError::UnknownTable(table_id.to_string()))
    }

    /// Looks up a table that is either in the target schema or removed from
    /// it, for modification.
    pub fn converted_table_mut(&mut self, table_id: &str) -> Result<&mut CreateTable> {
        if self.target_tables.contains_key(table_id) {
            return self.target_table_mut(table_id);
        }
        self.removed_tables
            .get_mut(table_id)
            .ok_or_else(|| ConvertError::UnknownTable(table_id.to_string()))
    }

    /// Consumes the context, keeping only what downstream consumers need.
    ///
    /// Removed tables are not part of the result.
    #[must_use]
    pub fn into_converted(self) -> ConvertedSchema {
        ConvertedSchema {
            tables: self.target_tables,
            sequences: self.target_sequences,
            diagnostics: self.diagnostics,
        }
    }
}

/// Result of a conversion run, as handed to DDL emission and reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedSchema {
    /// Target tables keyed by id.
    pub tables: ddl::Schema,
    /// Target sequences keyed by id.
    pub sequences: BTreeMap<String, ddl::Sequence>,
    /// Issues found during conversion.
    pub diagnostics: Diagnostics,
}
