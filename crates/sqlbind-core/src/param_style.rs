//! Placeholder conventions
//!
//! Follows the DB-API paramstyle names, plus the `$N` style used by
//! PostgreSQL-native drivers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SqlBindError;

/// The placeholder convention a target database driver expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParamStyle {
    /// `where name = ?`
    Qmark,
    /// `where name = :1`
    Numeric,
    /// `where name = :name`
    Named,
    /// `where name = %s`
    #[default]
    Format,
    /// `where name = %(name)s`
    Pyformat,
    /// `where name = $1`
    #[serde(alias = "positional_dollar", alias = "positional-dollar", alias = "asyncpg")]
    Dollar,
}

impl ParamStyle {
    pub const ALL: [ParamStyle; 6] = [
        ParamStyle::Qmark,
        ParamStyle::Numeric,
        ParamStyle::Named,
        ParamStyle::Format,
        ParamStyle::Pyformat,
        ParamStyle::Dollar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamStyle::Qmark => "qmark",
            ParamStyle::Numeric => "numeric",
            ParamStyle::Named => "named",
            ParamStyle::Format => "format",
            ParamStyle::Pyformat => "pyformat",
            ParamStyle::Dollar => "dollar",
        }
    }

    /// Returns true if bound values are returned as a key/value mapping
    pub fn is_named(&self) -> bool {
        matches!(self, ParamStyle::Named | ParamStyle::Pyformat)
    }

    /// Returns true if bound values are returned in bind order
    pub fn is_positional(&self) -> bool {
        !self.is_named()
    }

    /// Returns true if a placeholder carries neither an ordinal nor a key,
    /// so the n-th placeholder in the query always means the n-th value.
    pub fn is_sequential(&self) -> bool {
        matches!(self, ParamStyle::Qmark | ParamStyle::Format)
    }

    /// Placeholder text for the value bound at `ordinal` (1-based) under `key`.
    pub fn placeholder(&self, ordinal: usize, key: &str) -> String {
        match self {
            ParamStyle::Qmark => "?".to_string(),
            ParamStyle::Format => "%s".to_string(),
            ParamStyle::Numeric => format!(":{}", ordinal),
            ParamStyle::Dollar => format!("${}", ordinal),
            ParamStyle::Named => format!(":{}", key),
            ParamStyle::Pyformat => format!("%({})s", key),
        }
    }
}

impl fmt::Display for ParamStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamStyle {
    type Err = SqlBindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qmark" => Ok(ParamStyle::Qmark),
            "numeric" => Ok(ParamStyle::Numeric),
            "named" => Ok(ParamStyle::Named),
            "format" => Ok(ParamStyle::Format),
            "pyformat" => Ok(ParamStyle::Pyformat),
            "dollar" | "positional_dollar" | "positional-dollar" | "asyncpg" => {
                Ok(ParamStyle::Dollar)
            }
            other => Err(SqlBindError::InvalidConfiguration(format!(
                "unsupported param style `{}` (expected one of: qmark, numeric, named, format, pyformat, dollar)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(ParamStyle::Qmark.placeholder(3, "id_3"), "?");
        assert_eq!(ParamStyle::Format.placeholder(3, "id_3"), "%s");
        assert_eq!(ParamStyle::Numeric.placeholder(3, "id_3"), ":3");
        assert_eq!(ParamStyle::Dollar.placeholder(3, "id_3"), "$3");
        assert_eq!(ParamStyle::Named.placeholder(3, "id_3"), ":id_3");
        assert_eq!(ParamStyle::Pyformat.placeholder(3, "id_3"), "%(id_3)s");
    }

    #[test]
    fn test_collection_shape() {
        assert!(ParamStyle::Named.is_named());
        assert!(ParamStyle::Pyformat.is_named());
        for style in [
            ParamStyle::Qmark,
            ParamStyle::Numeric,
            ParamStyle::Format,
            ParamStyle::Dollar,
        ] {
            assert!(style.is_positional(), "{style} should be positional");
        }
    }

    #[test]
    fn test_from_str_round_trips_display() {
        for style in ParamStyle::ALL {
            assert_eq!(style.to_string().parse::<ParamStyle>().unwrap(), style);
        }
        assert_eq!(
            "positional-dollar".parse::<ParamStyle>().unwrap(),
            ParamStyle::Dollar
        );
        assert_eq!(" QMARK ".parse::<ParamStyle>().unwrap(), ParamStyle::Qmark);
    }

    #[test]
    fn test_from_str_rejects_unknown_style() {
        let err = "colon".parse::<ParamStyle>().unwrap_err();
        assert!(matches!(err, SqlBindError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("colon"));
    }

    #[test]
    fn test_sequential_styles() {
        let sequential: Vec<_> = ParamStyle::ALL
            .into_iter()
            .filter(ParamStyle::is_sequential)
            .collect();
        assert_eq!(sequential, vec![ParamStyle::Qmark, ParamStyle::Format]);
    }

    #[test]
    fn test_default_is_format() {
        assert_eq!(ParamStyle::default(), ParamStyle::Format);
    }
}
