#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use oxide_convert::prelude::*;

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| (*id).to_string()).collect()
}

/// Verifier that rejects a fixed set of expressions and records every batch.
#[derive(Default)]
pub struct StubAccessor {
    errors: HashMap<String, String>,
    batches: Mutex<Vec<VerifyExpressionsInput>>,
}

impl StubAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(mut self, expression: &str, error: &str) -> Self {
        self.errors
            .insert(expression.to_string(), error.to_string());
        self
    }

    pub fn batches(&self) -> Vec<VerifyExpressionsInput> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExpressionVerificationAccessor for StubAccessor {
    async fn verify_expressions(
        &self,
        input: VerifyExpressionsInput,
    ) -> Result<VerifyExpressionsOutput> {
        self.batches.lock().unwrap().push(input.clone());
        let results = input
            .expressions
            .into_iter()
            .map(|detail| {
                let error = self.errors.get(&detail.expression).cloned();
                ExpressionVerificationOutput {
                    result: error.is_none(),
                    error,
                    expression_detail: detail,
                }
            })
            .collect();
        Ok(VerifyExpressionsOutput { results })
    }
}

/// Verifier that is never reachable.
pub struct UnreachableAccessor;

#[async_trait]
impl ExpressionVerificationAccessor for UnreachableAccessor {
    async fn verify_expressions(
        &self,
        _input: VerifyExpressionsInput,
    ) -> Result<VerifyExpressionsOutput> {
        Err(ConvertError::Verification(
            "verifier unreachable".to_string(),
        ))
    }
}

/// `customers` (t1), `orders` (t2, references t1 and itself) and one
/// auto-increment sequence.
pub fn shop_schema() -> SourceSchema {
    SourceSchema::new()
        .table(
            Table::new("t1", "customers")
                .column(Column::new("c1", "id", ColumnType::new("INT64")).not_null())
                .column(Column::new("c2", "email", ColumnType::sized("STRING", 255)))
                .column(Column::new("c3", "age", ColumnType::new("INT64")))
                .primary_key(vec![Key::new("c1", false, 1)])
                .index(Index {
                    name: "idx_email".to_string(),
                    id: "i1".to_string(),
                    unique: true,
                    keys: vec![Key::new("c2", false, 1)],
                    stored_column_ids: ids(&["c3"]),
                })
                .check_constraint(CheckConstraint::new("ck1", "chk age", "(age > 0)"))
                .check_constraint(CheckConstraint::new("ck2", "chk-age", "(age < 150)")),
        )
        .table(
            Table::new("t2", "orders")
                .column(Column::new("c4", "id", ColumnType::new("INT64")).not_null())
                .column(Column::new("c5", "customer_id", ColumnType::new("INT64")))
                .column(Column::new("c6", "parent_id", ColumnType::new("INT64")))
                .column(Column::new("c7", "total", ColumnType::new("NUMERIC")))
                .primary_key(vec![Key::new("c4", false, 1)])
                .foreign_key(
                    ForeignKey::new("f1", "fk_customer", ids(&["c5"]), "t1", ids(&["c1"]))
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Restrict),
                )
                .foreign_key(ForeignKey::new(
                    "f2",
                    "fk_parent",
                    ids(&["c6"]),
                    "t2",
                    ids(&["c4"]),
                ))
                .check_constraint(CheckConstraint::new("ck3", "@total_positive", "(total > 0)")),
        )
        .sequence(Sequence {
            name: "Sequence1".to_string(),
            id: "s1".to_string(),
            kind: SequenceKind::AutoIncrement,
            skip_range_min: Some("1".to_string()),
            skip_range_max: Some("2".to_string()),
            start_with_counter: Some("3".to_string()),
        })
}
