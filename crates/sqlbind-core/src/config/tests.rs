//! Tests for engine configuration

use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = SqlBindConfig::default();

    assert_eq!(config.param_style, ParamStyle::Format);
    assert_eq!(config.identifier_quote, IdentifierQuote::DoubleQuote);
    assert!(!config.strict_undefined);
    assert!(!config.trim_blocks);
    assert!(!config.lstrip_blocks);
}

#[test]
fn test_builder() {
    let config = SqlBindConfig::new(ParamStyle::Named)
        .identifier_quote(IdentifierQuote::Backtick)
        .strict_undefined(true)
        .trim_blocks(true);

    assert_eq!(config.param_style, ParamStyle::Named);
    assert_eq!(config.identifier_quote, IdentifierQuote::Backtick);
    assert!(config.strict_undefined);
    assert!(config.trim_blocks);
    assert!(!config.lstrip_blocks);
}

#[test]
fn test_from_options() {
    let config = SqlBindConfig::from_options("pyformat", '`').unwrap();

    assert_eq!(config.param_style, ParamStyle::Pyformat);
    assert_eq!(config.identifier_quote, IdentifierQuote::Backtick);
}

#[test]
fn test_from_options_fails_fast() {
    assert!(matches!(
        SqlBindConfig::from_options("invalid", '"'),
        Err(SqlBindError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        SqlBindConfig::from_options("qmark", '\''),
        Err(SqlBindError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_parse_toml() {
    let toml_str = r#"
param_style = "dollar"
identifier_quote = "`"
strict_undefined = true
"#;
    let config = SqlBindConfig::from_toml_str(toml_str).unwrap();

    assert_eq!(config.param_style, ParamStyle::Dollar);
    assert_eq!(config.identifier_quote, IdentifierQuote::Backtick);
    assert!(config.strict_undefined);
}

#[test]
fn test_parse_toml_alias() {
    let config = SqlBindConfig::from_toml_str(r#"param_style = "positional_dollar""#).unwrap();
    assert_eq!(config.param_style, ParamStyle::Dollar);
}

#[test]
fn test_parse_toml_rejects_invalid_values() {
    for toml_str in [
        r#"param_style = "colon""#,
        r#"identifier_quote = "[""#,
        r#"unknown_key = 1"#,
    ] {
        let err = SqlBindConfig::from_toml_str(toml_str).unwrap_err();
        assert!(
            matches!(err, SqlBindError::InvalidConfiguration(_)),
            "{toml_str} should be rejected"
        );
    }
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"param_style = "qmark""#).unwrap();

    let config = SqlBindConfig::load(file.path()).unwrap();
    assert_eq!(config.param_style, ParamStyle::Qmark);
}

#[test]
fn test_load_missing_file() {
    let err = SqlBindConfig::load("/definitely/not/here/sqlbind.toml").unwrap_err();
    assert!(matches!(err, SqlBindError::Io(_)));
}
