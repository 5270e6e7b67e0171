//! Identifier quoting

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SqlBindError;

/// The character used to quote dynamic identifiers.
///
/// Only the two quoting conventions with doubling-based escaping are
/// accepted: ANSI double quotes and MySQL backticks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "char", into = "char")]
pub enum IdentifierQuote {
    #[default]
    DoubleQuote,
    Backtick,
}

impl IdentifierQuote {
    pub fn as_char(&self) -> char {
        match self {
            IdentifierQuote::DoubleQuote => '"',
            IdentifierQuote::Backtick => '`',
        }
    }

    /// Quote one identifier segment, doubling embedded quote characters.
    pub fn quote_segment(&self, segment: &str) -> String {
        let quote = self.as_char();
        let mut quoted = String::with_capacity(segment.len() + 2);
        quoted.push(quote);
        for c in segment.chars() {
            if c == quote {
                quoted.push(quote);
            }
            quoted.push(c);
        }
        quoted.push(quote);
        quoted
    }

    /// Quote each segment of a dotted path and join them with `.`
    pub fn quote_path<I, S>(&self, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments
            .into_iter()
            .map(|segment| self.quote_segment(segment.as_ref()))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl TryFrom<char> for IdentifierQuote {
    type Error = SqlBindError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '"' => Ok(IdentifierQuote::DoubleQuote),
            '`' => Ok(IdentifierQuote::Backtick),
            other => Err(SqlBindError::InvalidConfiguration(format!(
                "unsupported identifier quote character `{}` (expected `\"` or `` ` ``)",
                other
            ))),
        }
    }
}

impl From<IdentifierQuote> for char {
    fn from(value: IdentifierQuote) -> Self {
        value.as_char()
    }
}

impl fmt::Display for IdentifierQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
