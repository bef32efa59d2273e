//! Request and response types exchanged with the expression verifier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::IssueKind;

/// Metadata key holding the owning table id.
pub const META_TABLE_ID: &str = "tableId";
/// Metadata key holding the column id (empty for table-level checks).
pub const META_COLUMN_ID: &str = "colId";
/// Metadata key holding the check constraint name.
pub const META_CHECK_CONSTRAINT_NAME: &str = "checkConstraintName";

/// What kind of expression is being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// A CHECK constraint expression.
    #[serde(rename = "CHECK")]
    Check,
}

/// One expression submitted for verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionDetail {
    /// Expression text in the target dialect.
    pub expression: String,
    /// Expression kind.
    #[serde(rename = "type")]
    pub kind: ExpressionKind,
    /// Correlation data (`tableId`, `colId`, `checkConstraintName`).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Id used to match the result back to the expression.
    pub expression_id: String,
}

impl ExpressionDetail {
    /// Returns the owning table id from the metadata.
    #[must_use]
    pub fn table_id(&self) -> Option<&str> {
        self.metadata.get(META_TABLE_ID).map(String::as_str)
    }
}

/// A batch of expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyExpressionsInput {
    /// Expressions in submission order.
    pub expressions: Vec<ExpressionDetail>,
}

/// Verdict for one expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionVerificationOutput {
    /// Whether the target accepts the expression.
    pub result: bool,
    /// Why it was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The submitted expression, echoed back.
    pub expression_detail: ExpressionDetail,
}

/// Verdicts for a batch, one per submitted expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyExpressionsOutput {
    /// Results, in submission order.
    pub results: Vec<ExpressionVerificationOutput>,
}

/// Category of a verification failure, derived from the verifier's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationErrorKind {
    /// The expression does not parse.
    Syntax,
    /// The expression references a name the target does not know.
    UnresolvedName,
    /// No operator or function signature matches the operand types.
    TypeMismatch,
    /// Anything else.
    Other,
}

impl VerificationErrorKind {
    /// Classifies a verifier error message.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("syntax error") {
            Self::Syntax
        } else if lower.contains("unrecognized name") {
            Self::UnresolvedName
        } else if lower.contains("no matching signature") {
            Self::TypeMismatch
        } else {
            Self::Other
        }
    }

    /// The diagnostic category for this failure.
    #[must_use]
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Self::Syntax => IssueKind::ExpressionSyntax,
            Self::UnresolvedName => IssueKind::ExpressionUnresolvedName,
            Self::TypeMismatch => IssueKind::ExpressionTypeMismatch,
            Self::Other => IssueKind::ExpressionInvalid,
        }
    }
}
