//! Check constraint conversion.
//!
//! Names are sanitized and made unique across the converted schema.
//! Expressions are carried over untouched; whether the target accepts them
//! is decided later by the verification pass in [`crate::verify`].

use tracing::debug;

use crate::context::ConversionContext;
use crate::ddl;
use crate::names::sanitize_name;
use crate::schema;

/// Converts a table's check constraints, keeping their order.
pub fn convert_check_constraints(
    ctx: &mut ConversionContext,
    checks: &[schema::CheckConstraint],
) -> Vec<ddl::CheckConstraint> {
    let max_len = ctx.names.max_len();
    checks
        .iter()
        .map(|check| {
            let name = ctx.names.register(&sanitize_name(&check.name, max_len));
            if name != check.name {
                debug!(source = %check.name, name = %name, "Renamed check constraint");
            }
            ddl::CheckConstraint {
                id: check.id.clone(),
                name,
                expr: check.expr.clone(),
                expr_id: check.expr_id.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CheckConstraint;

    fn target(id: &str, name: &str, expr: &str) -> ddl::CheckConstraint {
        ddl::CheckConstraint {
            id: id.to_string(),
            name: name.to_string(),
            expr: expr.to_string(),
            expr_id: None,
        }
    }

    #[test]
    fn test_convert_check_constraints() {
        let mut ctx = ConversionContext::new();
        let source = vec![
            CheckConstraint::new("cc1", "check_1", "age > 0"),
            CheckConstraint::new("cc2", "check_2", "age < 99"),
            CheckConstraint::new("cc3", "@invalid_name", "age != 0"),
        ];

        let result = convert_check_constraints(&mut ctx, &source);

        assert_eq!(
            result,
            vec![
                target("cc1", "check_1", "age > 0"),
                target("cc2", "check_2", "age < 99"),
                target("cc3", "Ainvalid_name", "age != 0"),
            ]
        );
    }

    #[test]
    fn test_colliding_sanitized_names() {
        let mut ctx = ConversionContext::new();
        let source = vec![
            CheckConstraint::new("cc1", "chk age", "age > 0"),
            CheckConstraint::new("cc2", "chk-age", "age < 150"),
        ];

        let result = convert_check_constraints(&mut ctx, &source);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "chk_age");
        assert_eq!(result[1].name, "chk_age_1");
        assert_ne!(result[0].name, result[1].name);
        assert_eq!(result[0].expr, "age > 0");
        assert_eq!(result[1].expr, "age < 150");
    }

    #[test]
    fn test_collision_across_tables() {
        let mut ctx = ConversionContext::new();
        let first = convert_check_constraints(
            &mut ctx,
            &[CheckConstraint::new("cc1", "positive", "qty > 0")],
        );
        let second = convert_check_constraints(
            &mut ctx,
            &[CheckConstraint::new("cc2", "POSITIVE", "price > 0")],
        );

        assert_eq!(first[0].name, "positive");
        assert_eq!(second[0].name, "POSITIVE_1");
    }

    #[test]
    fn test_expr_id_is_carried() {
        let mut ctx = ConversionContext::new();
        let mut check = CheckConstraint::new("cc1", "check_1", "age > 0");
        check.expr_id = Some("expr1".to_string());

        let result = convert_check_constraints(&mut ctx, &[check]);
        assert_eq!(result[0].expr_id.as_deref(), Some("expr1"));
    }
}
