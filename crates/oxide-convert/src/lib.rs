//! Schema-to-DDL conversion kernel for database migrations.
//!
//! `oxide-convert` takes a source schema whose column types have already been
//! mapped to the target dialect and turns it into the target's DDL model:
//! - Primary keys, foreign keys, indexes and sequences are carried over with
//!   the target's restrictions applied (e.g. `NO ACTION` only)
//! - Check constraint names are sanitized and made unique
//! - Check expressions are verified against the target before being kept
//!
//! # Architecture
//!
//! - **Names** - Identifier sanitizing and the per-run name registry
//! - **Converters** - Keys, foreign keys, indexes, check constraints, sequences
//! - **Verify** - Batched check expression verification through an accessor
//! - **Engine** - Drives the converters over a [`ConversionContext`]
//! - **Diagnostics** - Everything skipped or dropped, keyed by table
//!
//! # Example
//!
//! ```rust
//! use oxide_convert::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> oxide_convert::error::Result<()> {
//! let source = SourceSchema::new().table(
//!     Table::new("t1", "users")
//!         .column(Column::new("c1", "id", ColumnType::new("INT64")).not_null())
//!         .primary_key(vec![Key::new("c1", false, 1)])
//!         .check_constraint(CheckConstraint::new("ck1", "id positive", "id > 0")),
//! );
//!
//! let converter = SchemaConverter::new(ConvertOptions::default())?;
//! let mut ctx = converter.context(source);
//! let summary = converter.run(&mut ctx).await?;
//!
//! assert_eq!(summary.tables, 1);
//! assert_eq!(ctx.target_tables["t1"].check_constraints[0].name, "id_positive");
//! # Ok(())
//! # }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Convert a JSON source schema, verifying check expressions
//! oxide-convert convert --input schema.json --verifier "spanner-verify"
//!
//! # Show how names would be sanitized
//! oxide-convert sanitize "chk age" "@invalid_name"
//! ```

pub mod checks;
pub mod context;
pub mod ddl;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod foreign_keys;
pub mod indexes;
pub mod keys;
pub mod names;
pub mod options;
pub mod schema;
pub mod sequences;
pub mod verify;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::context::{ConversionContext, ConvertedSchema};
    pub use crate::ddl::{
        CheckConstraint as TargetCheckConstraint, ColumnDef, CreateIndex, CreateTable,
        ForeignKey as TargetForeignKey, IndexKey, Sequence as TargetSequence,
    };
    pub use crate::diagnostics::{Diagnostics, Issue, IssueKind, TableIssues};
    pub use crate::engine::{ConversionSummary, SchemaConverter};
    pub use crate::error::{ConvertError, Result};
    pub use crate::names::{quote_if_needed, sanitize_name, NameRegistry};
    pub use crate::options::ConvertOptions;
    pub use crate::schema::{
        CheckConstraint, Column, ColumnType, ForeignKey, ForeignKeyAction, Index, Key, Sequence,
        SequenceKind, SourceSchema, Table,
    };
    pub use crate::verify::{
        CommandAccessor, ExpressionDetail, ExpressionKind, ExpressionVerificationAccessor,
        ExpressionVerificationOutput, VerificationErrorKind, VerifyExpressionsInput,
        VerifyExpressionsOutput,
    };
}
