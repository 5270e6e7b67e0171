//! sqlbind core - shared types for injection-free SQL templating
//!
//! This crate holds the pieces every other sqlbind crate agrees on:
//!
//! - `ParamStyle` - placeholder conventions (`?`, `%s`, `:1`, `$1`, `:name`, `%(name)s`)
//! - `IdentifierQuote` - quoting rules for dynamic identifiers
//! - `Params` / `BoundQuery` - the rendered query and its bound values
//! - `SqlBindConfig` - construction-time configuration, loadable from TOML
//! - `SqlBindError` / `BindError` - the error taxonomy

mod config;
mod error;
mod identifier;
mod param_style;
mod params;

pub use config::SqlBindConfig;
pub use error::*;
pub use identifier::IdentifierQuote;
pub use param_style::ParamStyle;
pub use params::{BoundQuery, Params};
