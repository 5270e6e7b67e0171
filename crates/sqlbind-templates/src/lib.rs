//! sqlbind templates - injection-free SQL templating with MiniJinja
//!
//! Templates are written as ordinary Jinja. Before the engine parses them,
//! every `{{ ... }}` expression is rewritten to go through the `bind` filter,
//! which records the value and prints a placeholder in its place. Rendering
//! therefore yields a query plus the parameters to send with it, in the
//! placeholder convention of the target driver.
//!
//! ## Filters
//!
//! - **`bind`**: applied automatically; records a scalar and prints its placeholder
//! - **`inclause`**: expands a sequence into `(<ph1>,...,<phN>)`
//! - **`sqlsafe`**: prints a value verbatim (trusted SQL only)
//! - **`identifier`**: quotes a table or column name, or a dotted path given as a sequence
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use sqlbind_core::{ParamStyle, SqlBindConfig};
//! use sqlbind_templates::SqlTemplateEngine;
//!
//! let engine = SqlTemplateEngine::new(SqlBindConfig::new(ParamStyle::Named));
//! let query = engine
//!     .prepare_query(
//!         "SELECT {{ cols|sqlsafe }} FROM {{ table|identifier }} WHERE id = {{ request.id }}",
//!         json!({ "cols": "id, name", "table": "users", "request": { "id": 7 } }),
//!     )
//!     .unwrap();
//!
//! assert_eq!(query.sql, "SELECT id, name FROM \"users\" WHERE id = :request.id_1");
//! ```

mod classify;
mod context;
mod engine;
mod filters;
pub mod lexer;
pub mod rewrite;

pub use classify::BindValue;
pub use context::BindContext;
pub use engine::{CompiledTemplate, QuerySource, SqlTemplateEngine};
pub use filters::{SqlFilters, register_bind_filters, register_filters};
pub use rewrite::rewrite_source;
