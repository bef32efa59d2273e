//! Conversion options.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};
use crate::names::DEFAULT_MAX_IDENTIFIER_LENGTH;

/// Upper bound accepted for `max_identifier_length`.
const IDENTIFIER_LENGTH_LIMIT: usize = 1024;

/// Options controlling a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Longest identifier the target accepts.
    pub max_identifier_length: usize,
    /// Skip foreign keys already present on the owning table during the
    /// reference-table pass. Off by default, so a self-referencing table
    /// ends up with the key twice after a restore.
    pub dedupe_reference_foreign_keys: bool,
    /// Run the expression verification pass.
    pub verify_expressions: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
            dedupe_reference_foreign_keys: false,
            verify_expressions: true,
        }
    }
}

impl ConvertOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum identifier length.
    #[must_use]
    pub fn with_max_identifier_length(mut self, len: usize) -> Self {
        self.max_identifier_length = len;
        self
    }

    /// Enables deduplication in the reference-table pass.
    #[must_use]
    pub fn with_reference_dedupe(mut self) -> Self {
        self.dedupe_reference_foreign_keys = true;
        self
    }

    /// Disables the expression verification pass.
    #[must_use]
    pub fn without_verification(mut self) -> Self {
        self.verify_expressions = false;
        self
    }

    /// Checks that the options are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_identifier_length == 0 {
            return Err(ConvertError::InvalidOptions(
                "max_identifier_length must be at least 1".to_string(),
            ));
        }
        if self.max_identifier_length > IDENTIFIER_LENGTH_LIMIT {
            return Err(ConvertError::InvalidOptions(format!(
                "max_identifier_length must not exceed {} (got {})",
                IDENTIFIER_LENGTH_LIMIT, self.max_identifier_length
            )));
        }
        Ok(())
    }

    /// Parses and validates options from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
