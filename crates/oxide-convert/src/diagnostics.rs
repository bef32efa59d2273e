//! Per-table conversion issues.
//!
//! Converters append here whenever they skip or drop something. Nothing in
//! the engine reads diagnostics back; they are output for the caller and
//! for reporting.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Category of a recorded issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A foreign key references a table missing from the source schema.
    UnresolvedReference,
    /// A foreign key's column lists have different lengths.
    ForeignKeyColumnMismatch,
    /// A check expression has a syntax error in the target dialect.
    ExpressionSyntax,
    /// A check expression references an unknown name.
    ExpressionUnresolvedName,
    /// A check expression does not type-check.
    ExpressionTypeMismatch,
    /// A check expression was rejected for another reason.
    ExpressionInvalid,
    /// The verifier returned no result for a check expression.
    ExpressionUnverified,
    /// The verifier could not be reached for the whole batch.
    VerificationUnavailable,
}

impl IssueKind {
    /// Short human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnresolvedReference => "unresolved reference",
            Self::ForeignKeyColumnMismatch => "foreign key column mismatch",
            Self::ExpressionSyntax => "expression syntax error",
            Self::ExpressionUnresolvedName => "expression references unknown name",
            Self::ExpressionTypeMismatch => "expression type mismatch",
            Self::ExpressionInvalid => "invalid expression",
            Self::ExpressionUnverified => "expression not verified",
            Self::VerificationUnavailable => "verification unavailable",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue category.
    pub kind: IssueKind,
    /// Name of the affected object (foreign key, check constraint, ...).
    pub subject: String,
    /// Details.
    pub message: String,
}

/// Issues recorded for one table, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIssues {
    /// Recorded issues.
    pub issues: Vec<Issue>,
}

/// Issues for the whole run, keyed by table id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    tables: BTreeMap<String, TableIssues>,
}

impl Diagnostics {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an issue against `table_id` and logs it.
    pub fn record(
        &mut self,
        table_id: &str,
        kind: IssueKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        let issue = Issue {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        warn!(
            table_id = %table_id,
            kind = %issue.kind,
            subject = %issue.subject,
            "{}",
            issue.message
        );
        self.tables
            .entry(table_id.to_string())
            .or_default()
            .issues
            .push(issue);
    }

    /// Returns the issues for a table, if any were recorded.
    #[must_use]
    pub fn for_table(&self, table_id: &str) -> Option<&TableIssues> {
        self.tables.get(table_id)
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of issues across all tables.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.tables.values().map(|t| t.issues.len()).sum()
    }

    /// Iterates over `(table_id, issues)` in table id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableIssues)> {
        self.tables.iter().map(|(id, issues)| (id.as_str(), issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_groups_by_table() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.record("t2", IssueKind::ExpressionSyntax, "chk_a", "Syntax error");
        diagnostics.record("t1", IssueKind::UnresolvedReference, "fk1", "missing t9");
        diagnostics.record("t2", IssueKind::ExpressionTypeMismatch, "chk_b", "No matching signature");

        assert_eq!(diagnostics.issue_count(), 3);
        let t2 = diagnostics.for_table("t2").unwrap();
        assert_eq!(t2.issues.len(), 2);
        assert_eq!(t2.issues[0].subject, "chk_a");
        assert_eq!(t2.issues[1].kind, IssueKind::ExpressionTypeMismatch);

        let order: Vec<&str> = diagnostics.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["t1", "t2"]);
        assert!(diagnostics.for_table("t3").is_none());
    }
}
