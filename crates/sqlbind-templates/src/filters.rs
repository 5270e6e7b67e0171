//! Custom SQL filters for MiniJinja

use std::sync::Arc;

use minijinja::{Environment, Error, ErrorKind, Value};
use sqlbind_core::{BindError, IdentifierQuote, SqlBindConfig};

use crate::context::BindContext;
use crate::rewrite::ANONYMOUS_PARAM;

/// SQL-specific filters
pub struct SqlFilters;

impl SqlFilters {
    /// Mark a value as pre-formatted SQL text.
    pub fn sqlsafe(value: &Value) -> Value {
        if value.is_safe() {
            return value.clone();
        }
        Value::from_safe_string(value.to_string())
    }

    /// Quote an identifier (table/column name) or a sequence of path segments
    pub fn identifier(value: &Value, quote: IdentifierQuote) -> Result<Value, BindError> {
        if let Some(segment) = value.as_str() {
            return Ok(Value::from_safe_string(quote.quote_segment(segment)));
        }

        let segments = match value.kind() {
            minijinja::value::ValueKind::Seq | minijinja::value::ValueKind::Iterable => value
                .try_iter()
                .map_err(|e| BindError::InvalidBindParameter(e.to_string()))?
                .collect::<Vec<_>>(),
            _ => {
                return Err(BindError::InvalidBindParameter(format!(
                    "identifier expects a string or a sequence of strings, got {}",
                    value.kind()
                )));
            }
        };
        if segments.is_empty() {
            return Err(BindError::InvalidBindParameter(
                "identifier got an empty sequence".to_string(),
            ));
        }

        let mut parts = Vec::with_capacity(segments.len());
        for segment in &segments {
            match segment.as_str() {
                Some(s) => parts.push(s),
                None => {
                    return Err(BindError::InvalidBindParameter(format!(
                        "identifier segments must be strings, got {}",
                        segment.kind()
                    )));
                }
            }
        }
        Ok(Value::from_safe_string(quote.quote_path(parts)))
    }
}

/// Wrap a binder failure so it survives the trip through the engine and can
/// be recovered with `source()` on the other side.
pub(crate) fn to_template_error(err: BindError) -> Error {
    Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

/// Built-in filters whose output is marked safe. Only the SQL filters below
/// may produce text that reaches the query unbound.
const SAFE_MARKING_BUILTINS: [&str; 3] = ["safe", "escape", "e"];

/// Register all SQL filters with a MiniJinja environment.
///
/// `bind` and `inclause` are registered as stand-ins that fail when used;
/// [`register_bind_filters`] replaces them on the per-render environment.
pub fn register_filters(env: &mut Environment<'_>, config: &SqlBindConfig) {
    let quote = config.identifier_quote;

    for name in SAFE_MARKING_BUILTINS {
        env.remove_filter(name);
    }
    // the built-in marks its output safe; this one returns a plain string
    // that is bound like any other value
    env.add_filter("tojson", |value: Value| -> Result<Value, Error> {
        serde_json::to_string(&value).map(Value::from).map_err(|e| {
            Error::new(ErrorKind::InvalidOperation, "cannot serialize value to JSON").with_source(e)
        })
    });

    env.add_filter("sqlsafe", |value: Value| SqlFilters::sqlsafe(&value));
    env.add_filter("identifier", move |value: Value| {
        SqlFilters::identifier(&value, quote).map_err(to_template_error)
    });
    env.add_filter("bind", |_value: Value, _name: Option<String>| -> Result<Value, Error> {
        Err(unbound_filter("bind"))
    });
    env.add_filter("inclause", |_value: Value| -> Result<Value, Error> {
        Err(unbound_filter("inclause"))
    });
}

/// Register `bind` and `inclause` filters that record into `ctx`.
pub fn register_bind_filters(env: &mut Environment<'_>, ctx: &Arc<BindContext>, strict: bool) {
    let bind_ctx = Arc::clone(ctx);
    env.add_filter("bind", move |value: Value, name: Option<String>| {
        if strict && value.is_undefined() {
            return Err(Error::from(ErrorKind::UndefinedError));
        }
        let name = name.as_deref().unwrap_or(ANONYMOUS_PARAM);
        bind_ctx.bind(value, name).map_err(to_template_error)
    });

    let in_clause_ctx = Arc::clone(ctx);
    env.add_filter("inclause", move |value: Value| {
        if strict && value.is_undefined() {
            return Err(Error::from(ErrorKind::UndefinedError));
        }
        in_clause_ctx.bind_in_clause(value).map_err(to_template_error)
    });
}

fn unbound_filter(name: &str) -> Error {
    Error::new(
        ErrorKind::InvalidOperation,
        format!("`{}` can only be used while preparing a query", name),
    )
}
