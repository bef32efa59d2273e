//! Source schema representation types.
//!
//! These types describe the schema read from the source database, after
//! upstream introspection and type mapping. Every entity is addressed by a
//! stable id; display names are free-form and may collide.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A resolved column type.
///
/// Type mapping happens upstream, so this is already expressed in the
/// target's vocabulary and is carried through conversion untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnType {
    /// Type name (e.g. "INT64", "STRING").
    pub name: String,
    /// Length for sized types; `None` means unsized or MAX.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u64>,
    /// Whether this is an array of `name`.
    #[serde(default)]
    pub is_array: bool,
}

impl ColumnType {
    /// Creates an unsized scalar type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            len: None,
            is_array: false,
        }
    }

    /// Creates a sized scalar type.
    #[must_use]
    pub fn sized(name: impl Into<String>, len: u64) -> Self {
        Self {
            name: name.into(),
            len: Some(len),
            is_array: false,
        }
    }
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Stable column id.
    pub id: String,
    /// Display name (not unique across tables).
    pub name: String,
    /// Resolved type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column is NOT NULL.
    #[serde(default)]
    pub not_null: bool,
}

impl Column {
    /// Creates a nullable column.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type,
            not_null: false,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// One column of a key (primary key or index key).
///
/// Order is 1-based and semantically significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Referenced column id.
    pub col_id: String,
    /// Descending sort.
    #[serde(default)]
    pub desc: bool,
    /// 1-based position in the key.
    pub order: u32,
}

impl Key {
    /// Creates a key reference.
    #[must_use]
    pub fn new(col_id: impl Into<String>, desc: bool, order: u32) -> Self {
        Self {
            col_id: col_id.into(),
            desc,
            order,
        }
    }
}

/// Referential action of the source database (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeignKeyAction {
    /// No action (error if referenced row is deleted/updated).
    #[default]
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update to referencing rows.
    Cascade,
    /// Set the foreign key column to NULL.
    SetNull,
    /// Set the foreign key column to its default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Foreign key constraint.
///
/// `col_ids` and `refer_column_ids` are parallel lists and must have the
/// same length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Id, unique within the schema.
    pub id: String,
    /// Owning column ids.
    pub col_ids: Vec<String>,
    /// Referenced table id.
    pub refer_table_id: String,
    /// Referenced column ids.
    pub refer_column_ids: Vec<String>,
    /// Action on delete.
    #[serde(default)]
    pub on_delete: ForeignKeyAction,
    /// Action on update.
    #[serde(default)]
    pub on_update: ForeignKeyAction,
}

impl ForeignKey {
    /// Creates a foreign key with `NO ACTION` for both actions.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        col_ids: Vec<String>,
        refer_table_id: impl Into<String>,
        refer_column_ids: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            col_ids,
            refer_table_id: refer_table_id.into(),
            refer_column_ids,
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        }
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = action;
        self
    }
}

/// Secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Index id.
    pub id: String,
    /// Whether this is a unique index.
    #[serde(default)]
    pub unique: bool,
    /// Ordered key columns.
    pub keys: Vec<Key>,
    /// Stored (covering) column ids.
    #[serde(default)]
    pub stored_column_ids: Vec<String>,
}

/// Check constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckConstraint {
    /// Stable id.
    pub id: String,
    /// Constraint name as it appears in the source.
    pub name: String,
    /// Boolean expression text.
    pub expr: String,
    /// Correlation id used by expression verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr_id: Option<String>,
}

impl CheckConstraint {
    /// Creates a check constraint without an expression id.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            expr: expr.into(),
            expr_id: None,
        }
    }
}

/// Sequence generation strategy declared by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Derived from an auto-increment / identity column.
    #[serde(rename = "AUTO_INCREMENT")]
    AutoIncrement,
    /// An explicit bit-reversed positive sequence.
    #[serde(rename = "BIT REVERSED POSITIVE")]
    BitReversedPositive,
}

/// Sequence declaration.
///
/// Range and counter values are opaque decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: String,
    /// Sequence id.
    pub id: String,
    /// Generation strategy.
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

/// Source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Stable table id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Column ids in table order.
    pub col_ids: Vec<String>,
    /// Column definitions keyed by id.
    pub col_defs: BTreeMap<String, Column>,
    /// Primary key columns.
    #[serde(default)]
    pub primary_keys: Vec<Key>,
    /// Foreign keys.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    /// Secondary indexes.
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Check constraints.
    #[serde(default)]
    pub check_constraints: Vec<CheckConstraint>,
}

impl Table {
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

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        if !self.col_ids.contains(&column.id) {
            self.col_ids.push(column.id.clone());
        }
        self.col_defs.insert(column.id.clone(), column);
        self
    }

    /// Sets the primary key.
    #[must_use]
    pub fn primary_key(mut self, keys: Vec<Key>) -> Self {
        self.primary_keys = keys;
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a check constraint.
    #[must_use]
    pub fn check_constraint(mut self, check: CheckConstraint) -> Self {
        self.check_constraints.push(check);
        self
    }

    /// Gets a column by id.
    #[must_use]
    pub fn get_column(&self, id: &str) -> Option<&Column> {
        self.col_defs.get(id)
    }
}

/// The complete source schema, as handed over by introspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSchema {
    /// Tables keyed by id.
    #[serde(default)]
    pub tables: BTreeMap<String, Table>,
    /// Sequences keyed by id.
    #[serde(default)]
    pub sequences: BTreeMap<String, Sequence>,
}

impl SourceSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.insert(table.id.clone(), table);
        self
    }

    /// Adds a sequence.
    #[must_use]
    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.sequences.insert(sequence.id.clone(), sequence);
        self
    }

    /// Parses a schema from JSON.
    pub fn from_json_str(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
