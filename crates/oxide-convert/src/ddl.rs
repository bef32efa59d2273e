//! Target DDL schema representation types.
//!
//! This is the destination model populated by the converters and consumed
//! downstream by DDL emission and reporting. It mirrors the source model in
//! [`crate::schema`], restricted to what the target database supports.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// One column of a target key (primary key or index key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey {
    /// Column id.
    pub col_id: String,
    /// Descending sort.
    pub desc: bool,
    /// 1-based position in the key.
    pub order: u32,
}

/// Referential action supported by the target.
///
/// The target only enforces `NO ACTION`; every source action maps onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeignKeyAction {
    /// No action.
    #[default]
    NoAction,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// Target foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Owning column ids.
    pub col_ids: Vec<String>,
    /// Referenced table id.
    pub refer_table_id: String,
    /// Referenced column ids.
    pub refer_column_ids: Vec<String>,
    /// Id carried over from the source key.
    pub id: String,
    /// Action on delete.
    pub on_delete: ForeignKeyAction,
    /// Action on update.
    pub on_update: ForeignKeyAction,
}

/// Target secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateIndex {
    /// Index name.
    pub name: String,
    /// Owning table id.
    pub table_id: String,
    /// Whether this is a unique index.
    pub unique: bool,
    /// Ordered key columns.
    pub keys: Vec<IndexKey>,
    /// Index id.
    pub id: String,
    /// Stored (covering) column ids.
    pub stored_column_ids: Vec<String>,
}

/// Target check constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckConstraint {
    /// Id carried over from the source constraint.
    pub id: String,
    /// Legal, unique constraint name.
    pub name: String,
    /// Boolean expression text, unmodified.
    pub expr: String,
    /// Correlation id used by expression verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr_id: Option<String>,
}

/// Target column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column id.
    pub id: String,
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column is NOT NULL.
    pub not_null: bool,
}

/// Target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTable {
    /// Table id (same as the source table's).
    pub id: String,
    /// Table name.
    pub name: String,
    /// Column ids in table order.
    pub col_ids: Vec<String>,
    /// Column definitions keyed by id.
    pub col_defs: BTreeMap<String, ColumnDef>,
    /// Primary key.
    pub primary_keys: Vec<IndexKey>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
    /// Secondary indexes.
    pub indexes: Vec<CreateIndex>,
    /// Check constraints.
    pub check_constraints: Vec<CheckConstraint>,
}

impl CreateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            col_ids: Vec::new(),
            col_defs: BTreeMap::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            check_constraints: Vec::new(),
        }
    }

    /// Gets a column by id.
    #[must_use]
    pub fn get_column(&self, id: &str) -> Option<&ColumnDef> {
        self.col_defs.get(id)
    }
}

/// Target schema: tables keyed by id.
pub type Schema = BTreeMap<String, CreateTable>;

/// Sequence kind supported by the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Bit-reversed positive sequence.
    #[serde(rename = "BIT REVERSED POSITIVE")]
    BitReversedPositive,
}

impl SequenceKind {
    /// Returns the DDL keyword for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BitReversedPositive => "BIT REVERSED POSITIVE",
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: String,
    /// Sequence id.
    pub id: String,
    /// Sequence kind.
    pub kind: SequenceKind,
    /// Lower bound of the skipped range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_range_min: Option<String>,
    /// Upper bound of the skipped range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_range_max: Option<String>,
    /// Starting counter value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_with_counter: Option<String>,
}
