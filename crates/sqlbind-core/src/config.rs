//! Engine configuration
//!
//! Configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! param_style = "named"
//! identifier_quote = "`"
//! strict_undefined = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{IdentifierQuote, ParamStyle, Result, SqlBindError};

/// Construction-time configuration for a template engine.
///
/// Every field is validated when the value is built or deserialized, so an
/// engine constructed from a `SqlBindConfig` can never fail at render time
/// because of its configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SqlBindConfig {
    /// Placeholder convention of the target driver
    pub param_style: ParamStyle,
    /// Quote character for the `identifier` filter
    pub identifier_quote: IdentifierQuote,
    /// Fail on undefined variables instead of binding them as NULL
    pub strict_undefined: bool,
    /// Remove the first newline after a block tag
    pub trim_blocks: bool,
    /// Strip leading whitespace before a block tag
    pub lstrip_blocks: bool,
}

impl SqlBindConfig {
    pub fn new(param_style: ParamStyle) -> Self {
        Self {
            param_style,
            ..Self::default()
        }
    }

    /// Build a configuration from loosely typed options, e.g. CLI flags.
    pub fn from_options(param_style: &str, identifier_quote: char) -> Result<Self> {
        Ok(Self {
            param_style: param_style.parse()?,
            identifier_quote: IdentifierQuote::try_from(identifier_quote)?,
            ..Self::default()
        })
    }

    pub fn param_style(mut self, param_style: ParamStyle) -> Self {
        self.param_style = param_style;
        self
    }

    pub fn identifier_quote(mut self, identifier_quote: IdentifierQuote) -> Self {
        self.identifier_quote = identifier_quote;
        self
    }

    pub fn strict_undefined(mut self, strict: bool) -> Self {
        self.strict_undefined = strict;
        self
    }

    pub fn trim_blocks(mut self, trim: bool) -> Self {
        self.trim_blocks = trim;
        self
    }

    pub fn lstrip_blocks(mut self, lstrip: bool) -> Self {
        self.lstrip_blocks = lstrip;
        self
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| SqlBindError::InvalidConfiguration(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), param_style = %config.param_style, "loaded sqlbind config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests;
