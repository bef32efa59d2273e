//! The expression verification seam.
//!
//! The engine never evaluates expressions itself. It hands a batch to an
//! [`ExpressionVerificationAccessor`]; tests plug in a canned stub and
//! production plugs in a real verifier, such as [`CommandAccessor`].

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::types::{VerifyExpressionsInput, VerifyExpressionsOutput};
use crate::error::{ConvertError, Result};

/// Verifies expressions against the target dialect.
///
/// Implementations must return exactly one result per submitted expression.
/// A rejected expression is a normal result, not an error; `Err` is reserved
/// for transport failures, where no verdict is available for the batch.
#[async_trait]
pub trait ExpressionVerificationAccessor: Send + Sync {
    /// Verifies a batch of expressions.
    async fn verify_expressions(
        &self,
        input: VerifyExpressionsInput,
    ) -> Result<VerifyExpressionsOutput>;
}

/// Runs an external verifier program per batch.
///
/// The program receives the batch as JSON on stdin and must print a
/// [`VerifyExpressionsOutput`] as JSON on stdout. A spawn failure, non-zero
/// exit or unparsable output is reported as [`ConvertError::Verification`].
#[derive(Debug, Clone)]
pub struct CommandAccessor {
    program: String,
    args: Vec<String>,
}

impl CommandAccessor {
    /// Creates an accessor for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Builds an accessor from a whitespace-separated command line.
    ///
    /// Returns `None` for a blank command line.
    #[must_use]
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        Some(parts.fold(Self::new(program), Self::arg))
    }

    /// The program this accessor runs.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl ExpressionVerificationAccessor for CommandAccessor {
    async fn verify_expressions(
        &self,
        input: VerifyExpressionsInput,
    ) -> Result<VerifyExpressionsOutput> {
        let payload = serde_json::to_vec(&input)?;
        debug!(
            program = %self.program,
            expressions = input.expressions.len(),
            "Running expression verifier"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ConvertError::Verification(format!("failed to start '{}': {}", self.program, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ConvertError::Verification("verifier stdin unavailable".to_string()))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;

        match writer.await {
            Ok(Ok(())) => {}
            // The verifier may answer without draining its input.
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(e) => return Err(ConvertError::Verification(e.to_string())),
        }

        if !output.status.success() {
            return Err(ConvertError::Verification(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            ConvertError::Verification(format!("unreadable output from '{}': {}", self.program, e))
        })
    }
}
