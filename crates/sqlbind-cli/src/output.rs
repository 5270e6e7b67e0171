//! Terminal output for rendered queries

use clap::ValueEnum;
use comfy_table::Table;
use sqlbind_core::{BoundQuery, Params};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// The query followed by a table of bound parameters
    #[default]
    Text,
    /// `{ "sql": ..., "params": ... }`
    Json,
}

pub fn format_query(query: &BoundQuery, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text(query)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(query)?),
    }
}

fn format_text(query: &BoundQuery) -> String {
    if query.params.is_empty() {
        return format!("{}\n\n(no parameters)", query.sql);
    }
    format!("{}\n\n{}", query.sql, params_table(&query.params))
}

fn params_table(params: &Params) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "key", "value"]);

    match params {
        Params::Positional(values) => {
            for (i, value) in values.iter().enumerate() {
                table.add_row(vec![(i + 1).to_string(), String::new(), value.to_string()]);
            }
        }
        Params::Named(map) => {
            for (i, (key, value)) in map.iter().enumerate() {
                table.add_row(vec![(i + 1).to_string(), key.clone(), value.to_string()]);
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_text_output_lists_named_params() {
        let mut map = IndexMap::new();
        map.insert("id_1".to_string(), json!(7));
        map.insert("name_2".to_string(), json!("alice"));
        let query = BoundQuery {
            sql: "WHERE id = :id_1 AND name = :name_2".to_string(),
            params: Params::Named(map),
        };

        let text = format_query(&query, OutputFormat::Text).unwrap();
        assert!(text.starts_with("WHERE id = :id_1 AND name = :name_2\n\n"));
        assert!(text.contains("id_1"));
        assert!(text.contains("\"alice\""));
    }

    #[test]
    fn test_text_output_without_params() {
        let query = BoundQuery {
            sql: "SELECT 1".to_string(),
            params: Params::Positional(Vec::new()),
        };

        assert_eq!(
            format_query(&query, OutputFormat::Text).unwrap(),
            "SELECT 1\n\n(no parameters)"
        );
    }

    #[test]
    fn test_json_output() {
        let query = BoundQuery {
            sql: "WHERE id = ?".to_string(),
            params: Params::Positional(vec![json!(3)]),
        };

        let text = format_query(&query, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({ "sql": "WHERE id = ?", "params": [3] }));
    }
}
