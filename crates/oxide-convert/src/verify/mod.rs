//! Check expression verification.
//!
//! After conversion every check constraint in the target schema carries
//! expression text the target dialect has not seen yet. This pass sends all
//! of them to an [`ExpressionVerificationAccessor`] in one batch, keeps the
//! ones it accepts and drops the rest, recording a diagnostic for each drop.

mod accessor;
mod types;

use std::collections::HashMap;

use tracing::info;

pub use accessor::{CommandAccessor, ExpressionVerificationAccessor};
pub use types::{
    ExpressionDetail, ExpressionKind, ExpressionVerificationOutput, VerificationErrorKind,
    VerifyExpressionsInput, VerifyExpressionsOutput, META_CHECK_CONSTRAINT_NAME, META_COLUMN_ID,
    META_TABLE_ID,
};

use crate::context::ConversionContext;
use crate::ddl;
use crate::diagnostics::IssueKind;

/// The id a check constraint is verified under.
fn expression_id(check: &ddl::CheckConstraint) -> &str {
    check.expr_id.as_deref().unwrap_or(&check.id)
}

/// Builds one request per check constraint, in table id order and then
/// constraint order.
#[must_use]
pub fn build_requests(ctx: &ConversionContext) -> Vec<ExpressionDetail> {
    ctx.target_tables
        .iter()
        .flat_map(|(table_id, table)| {
            table.check_constraints.iter().map(move |check| {
                let metadata = [
                    (META_TABLE_ID.to_string(), table_id.clone()),
                    (META_COLUMN_ID.to_string(), String::new()),
                    (META_CHECK_CONSTRAINT_NAME.to_string(), check.name.clone()),
                ]
                .into_iter()
                .collect();
                ExpressionDetail {
                    expression: check.expr.clone(),
                    kind: ExpressionKind::Check,
                    metadata,
                    expression_id: expression_id(check).to_string(),
                }
            })
        })
        .collect()
}

/// Verifies every check constraint in the target schema.
///
/// Returns `true` when at least one expression was dropped, meaning the
/// converted schema needs attention. This never fails: a transport failure
/// drops every check constraint and records one
/// [`IssueKind::VerificationUnavailable`] per affected table.
pub async fn verify_expressions(
    ctx: &mut ConversionContext,
    accessor: &dyn ExpressionVerificationAccessor,
) -> bool {
    let requests = build_requests(ctx);
    if requests.is_empty() {
        info!("No check constraints to verify");
        return false;
    }
    let submitted = requests.len();

    let input = VerifyExpressionsInput {
        expressions: requests.clone(),
    };
    let output = match accessor.verify_expressions(input).await {
        Ok(output) => output,
        Err(e) => {
            withhold_all(ctx, &e.to_string());
            info!(dropped = submitted, "Expression verification unavailable");
            return true;
        }
    };

    // Correlate by echoed (tableId, expressionId), falling back to the
    // request at the same position when the echo lost its metadata.
    let mut results: HashMap<(String, String), &ExpressionVerificationOutput> = HashMap::new();
    for (i, out) in output.results.iter().enumerate() {
        let detail = &out.expression_detail;
        let table_id = detail
            .table_id()
            .or_else(|| requests.get(i).and_then(ExpressionDetail::table_id))
            .unwrap_or_default()
            .to_string();
        results.insert((table_id, detail.expression_id.clone()), out);
    }

    let mut dropped = 0;
    for (table_id, table) in ctx.target_tables.iter_mut() {
        let mut rejected = Vec::new();
        table.check_constraints.retain(|check| {
            let key = (table_id.clone(), expression_id(check).to_string());
            match results.get(&key) {
                Some(out) if out.result => true,
                Some(out) => {
                    let message = out
                        .error
                        .clone()
                        .unwrap_or_else(|| "expression rejected by verifier".to_string());
                    let kind = VerificationErrorKind::classify(&message).issue_kind();
                    rejected.push((kind, check.name.clone(), message));
                    false
                }
                None => {
                    rejected.push((
                        IssueKind::ExpressionUnverified,
                        check.name.clone(),
                        "verifier returned no result".to_string(),
                    ));
                    false
                }
            }
        });

        dropped += rejected.len();
        for (kind, subject, message) in rejected {
            ctx.diagnostics.record(table_id, kind, subject, message);
        }
    }

    info!(
        verified = submitted - dropped,
        dropped, "Verified check expressions"
    );
    dropped > 0
}

fn withhold_all(ctx: &mut ConversionContext, reason: &str) {
    for (table_id, table) in ctx.target_tables.iter_mut() {
        if table.check_constraints.is_empty() {
            continue;
        }
        let withheld = table.check_constraints.len();
        table.check_constraints.clear();
        ctx.diagnostics.record(
            table_id,
            IssueKind::VerificationUnavailable,
            table.name.clone(),
            format!("{} check constraint(s) withheld: {}", withheld, reason),
        );
    }
}
