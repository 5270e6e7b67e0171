//! Per-render bind state

use indexmap::IndexMap;
use minijinja::Value;
use parking_lot::Mutex;
use sqlbind_core::{BindError, BoundQuery, ParamStyle, Params};

use crate::classify::BindValue;

/// Base parameter name for values bound through `inclause`.
pub const IN_CLAUSE_PARAM: &str = "inclause";

/// Delimiters of the ordinal marker written in place of `?` / `%s` while
/// rendering. Private-use code points, never produced by the engine itself.
const MARK_OPEN: char = '\u{E000}';
const MARK_CLOSE: char = '\u{E001}';

/// Bind state for exactly one render call.
///
/// Every `prepare_query` creates its own context and drops it when the call
/// returns, on success or failure, so nothing recorded here can leak into
/// another render.
#[derive(Debug)]
pub struct BindContext {
    style: ParamStyle,
    state: Mutex<BindState>,
}

#[derive(Debug, Default)]
struct BindState {
    params: IndexMap<String, serde_json::Value>,
    counter: usize,
}

impl BindContext {
    pub fn new(style: ParamStyle) -> Self {
        Self {
            style,
            state: Mutex::new(BindState::default()),
        }
    }

    pub fn param_style(&self) -> ParamStyle {
        self.style
    }

    /// Number of values bound so far
    pub fn len(&self) -> usize {
        self.state.lock().params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Classify `value` and either pass it through (safe text), reject it,
    /// or record it and return its placeholder as safe text.
    pub fn bind(&self, value: Value, name: &str) -> Result<Value, BindError> {
        match BindValue::classify(value) {
            BindValue::Safe(value) => Ok(value),
            BindValue::Sequence(_) => Err(BindError::MissingInClause {
                param: name.to_string(),
            }),
            BindValue::Mapping(_) => Err(BindError::InvalidBindParameter(format!(
                "got a mapping for parameter `{}`, expected a scalar value",
                name
            ))),
            BindValue::Scalar(value) => {
                let placeholder = self.record(name, &value)?;
                Ok(Value::from_safe_string(placeholder))
            }
        }
    }

    /// Bind every element of a sequence and return `(<ph1>,...,<phN>)`.
    ///
    /// An empty sequence renders as `()` with nothing bound.
    pub fn bind_in_clause(&self, value: Value) -> Result<Value, BindError> {
        let items: Vec<Value> = if value.is_undefined() {
            Vec::new()
        } else {
            match BindValue::classify(value) {
                BindValue::Sequence(seq) => seq
                    .try_iter()
                    .map_err(|e| BindError::InvalidBindParameter(e.to_string()))?
                    .collect(),
                other => {
                    return Err(BindError::InvalidBindParameter(format!(
                        "inclause expects a sequence, got a {}",
                        other.kind_name()
                    )));
                }
            }
        };

        let mut placeholders = Vec::with_capacity(items.len());
        for item in items {
            placeholders.push(self.bind(item, IN_CLAUSE_PARAM)?.to_string());
        }
        Ok(Value::from_safe_string(format!(
            "({})",
            placeholders.join(",")
        )))
    }

    /// Record a scalar under a fresh `<name>_<n>` key and return its placeholder.
    fn record(&self, name: &str, value: &Value) -> Result<String, BindError> {
        let json = serde_json::to_value(value).map_err(|e| {
            BindError::InvalidBindParameter(format!(
                "cannot bind parameter `{}`: {}",
                name, e
            ))
        })?;

        let mut state = self.state.lock();
        state.counter += 1;
        let ordinal = state.counter;
        let key = format!("{}_{}", name, ordinal);
        let placeholder = if self.style.is_sequential() {
            format!("{MARK_OPEN}{ordinal}{MARK_CLOSE}")
        } else {
            self.style.placeholder(ordinal, &key)
        };
        tracing::trace!(key = %key, ordinal, "bound parameter");
        state.params.insert(key, json);
        Ok(placeholder)
    }

    /// Take everything bound so far and pair it with the rendered text.
    ///
    /// For `qmark` and `format` the markers left in `rendered` are resolved in
    /// output order: each one becomes a placeholder and contributes its value,
    /// so a fragment emitted twice binds its values twice and a fragment that
    /// was captured but never emitted binds nothing.
    pub fn finish(&self, rendered: String) -> BoundQuery {
        let bound = {
            let mut state = self.state.lock();
            state.counter = 0;
            std::mem::take(&mut state.params)
        };

        if !self.style.is_sequential() {
            return BoundQuery {
                sql: rendered,
                params: Params::from_bound(self.style, bound),
            };
        }

        let values: Vec<serde_json::Value> = bound.into_values().collect();
        let placeholder = self.style.placeholder(0, "");
        let mut sql = String::with_capacity(rendered.len());
        let mut params = Vec::with_capacity(values.len());

        let mut rest = rendered.as_str();
        while let Some(start) = rest.find(MARK_OPEN) {
            sql.push_str(&rest[..start]);
            let after = &rest[start + MARK_OPEN.len_utf8()..];
            let marker = after.find(MARK_CLOSE).and_then(|end| {
                let ordinal = after[..end].parse::<usize>().ok()?;
                let value = values.get(ordinal.checked_sub(1)?)?;
                Some((end, value))
            });
            match marker {
                Some((end, value)) => {
                    sql.push_str(&placeholder);
                    params.push(value.clone());
                    rest = &after[end + MARK_CLOSE.len_utf8()..];
                }
                // not one of ours, keep the text as written
                None => {
                    sql.push(MARK_OPEN);
                    rest = after;
                }
            }
        }
        sql.push_str(rest);

        if params.len() != values.len() {
            tracing::debug!(
                bound = values.len(),
                emitted = params.len(),
                "positional parameters follow emitted placeholders"
            );
        }
        BoundQuery {
            sql,
            params: Params::Positional(params),
        }
    }
}
