//! Template engine using MiniJinja

use std::sync::Arc;

use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior, Value};
use serde::Serialize;
use sqlbind_core::{BindError, BoundQuery, ParamStyle, Result, SqlBindConfig, SqlBindError};

use crate::context::BindContext;
use crate::filters::{register_bind_filters, register_filters};
use crate::rewrite::rewrite_source;

/// Name given to templates compiled from ad-hoc source.
const ADHOC_TEMPLATE_NAME: &str = "<string>";

/// Auto-binding SQL template engine.
///
/// Every `{{ ... }}` expression in a template is rewritten to pass through the
/// `bind` filter, so rendering produces parameter placeholders plus the values
/// to send alongside them instead of interpolated SQL.
///
/// ## Example
///
/// ```rust
/// use serde_json::json;
/// use sqlbind_templates::SqlTemplateEngine;
///
/// let engine = SqlTemplateEngine::default();
/// let query = engine
///     .prepare_query(
///         "SELECT * FROM t WHERE id = {{ x }} AND y IN {{ ys|inclause }}",
///         json!({ "x": 5, "ys": [1, 2, 3] }),
///     )
///     .unwrap();
///
/// assert_eq!(query.sql, "SELECT * FROM t WHERE id = %s AND y IN (%s,%s,%s)");
/// assert_eq!(query.params.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct SqlTemplateEngine {
    env: Environment<'static>,
    config: SqlBindConfig,
}

impl SqlTemplateEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: SqlBindConfig) -> Self {
        let mut env = Environment::new();

        // Macro and `{% set %}` block output is only marked safe while some
        // auto-escape mode is active.
        env.set_auto_escape_callback(|_name| AutoEscape::Custom("sql"));
        env.set_formatter(format_query_value);
        env.set_trim_blocks(config.trim_blocks);
        env.set_lstrip_blocks(config.lstrip_blocks);
        if config.strict_undefined {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }

        register_filters(&mut env, &config);

        Self { env, config }
    }

    /// Create an engine from string options, as read from a config file or
    /// the command line.
    pub fn from_options(param_style: &str, identifier_quote: char) -> Result<Self> {
        Ok(Self::new(SqlBindConfig::from_options(
            param_style,
            identifier_quote,
        )?))
    }

    pub fn config(&self) -> &SqlBindConfig {
        &self.config
    }

    pub fn param_style(&self) -> ParamStyle {
        self.config.param_style
    }

    /// Rewrite and validate an ad-hoc template source.
    pub fn compile(&self, source: &str) -> Result<CompiledTemplate> {
        self.compile_named(ADHOC_TEMPLATE_NAME, source)
    }

    /// Rewrite and validate a template source under `name`, which shows up
    /// in error messages.
    #[tracing::instrument(skip_all, fields(template = name))]
    pub fn compile_named(&self, name: &str, source: &str) -> Result<CompiledTemplate> {
        let rewritten = rewrite_source(source);
        self.env
            .template_from_named_str(name, &rewritten)
            .map_err(render_error)?;

        Ok(CompiledTemplate {
            name: Arc::from(name),
            source: Arc::from(rewritten),
        })
    }

    /// Register a named template for `{% include %}`, `{% import %}` and
    /// [`prepare_named`](Self::prepare_named).
    pub fn add_template(&mut self, name: impl Into<String>, source: &str) -> Result<()> {
        let name = name.into();
        tracing::debug!(template = %name, "registering template");
        self.env
            .add_template_owned(name, rewrite_source(source))
            .map_err(render_error)
    }

    /// Install a loader for templates that are not registered up front.
    ///
    /// Sources returned by the loader are rewritten before they are parsed.
    pub fn set_loader<F>(&mut self, loader: F)
    where
        F: Fn(&str) -> std::result::Result<Option<String>, Error> + Send + Sync + 'static,
    {
        self.env.set_loader(move |name| {
            Ok(loader(name)?.map(|source| {
                tracing::trace!(template = name, "rewriting loaded template");
                rewrite_source(&source)
            }))
        });
    }

    /// Render a template source or a compiled template into a query and its
    /// bound parameters.
    ///
    /// Values bound inside a macro or a `{% set %}` block are bound once, when
    /// that output is produced. Emitting the output again does not rebind them.
    /// With `named`, `pyformat`, `numeric` and `dollar` the repeated placeholder
    /// refers to the same parameter. With `qmark` and `format` the parameters
    /// follow the placeholders as they appear in the query, so repeated output
    /// repeats its values and captured output that is never emitted binds
    /// nothing.
    #[tracing::instrument(skip_all, fields(style = %self.config.param_style))]
    pub fn prepare_query<'a, S: Serialize>(
        &self,
        query: impl Into<QuerySource<'a>>,
        context: S,
    ) -> Result<BoundQuery> {
        match query.into() {
            QuerySource::Source(source) => {
                let rewritten = rewrite_source(source);
                self.prepare_with(|env| env.render_named_str(ADHOC_TEMPLATE_NAME, &rewritten, context))
            }
            QuerySource::Compiled(template) => self.prepare_with(|env| {
                env.render_named_str(&template.name, &template.source, context)
            }),
        }
    }

    /// Render a template registered with [`add_template`](Self::add_template)
    /// or found by the loader.
    #[tracing::instrument(skip_all, fields(template = name, style = %self.config.param_style))]
    pub fn prepare_named<S: Serialize>(&self, name: &str, context: S) -> Result<BoundQuery> {
        self.prepare_with(|env| env.get_template(name)?.render(context))
    }

    /// Render with a fresh bind context on a per-call environment.
    fn prepare_with<F>(&self, render: F) -> Result<BoundQuery>
    where
        F: FnOnce(&Environment<'static>) -> std::result::Result<String, Error>,
    {
        let ctx = Arc::new(BindContext::new(self.config.param_style));
        let mut env = self.env.clone();
        register_bind_filters(&mut env, &ctx, self.config.strict_undefined);

        let rendered = render(&env);
        drop(env);
        let sql = rendered.map_err(render_error)?;

        let query = ctx.finish(sql);
        tracing::debug!(
            style = %self.config.param_style,
            params = query.params.len(),
            "prepared query"
        );
        Ok(query)
    }
}

impl Default for SqlTemplateEngine {
    fn default() -> Self {
        Self::new(SqlBindConfig::default())
    }
}

/// A rewritten, validated template that can be rendered any number of times.
///
/// Holds the rewritten source rather than a parsed template, so it owns no
/// borrow of the engine and clones cheaply. Each render parses the source
/// again; [`SqlTemplateEngine::add_template`] keeps the parsed form instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    name: Arc<str>,
    source: Arc<str>,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rewritten template source
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// What [`SqlTemplateEngine::prepare_query`] renders.
#[derive(Debug, Clone, Copy)]
pub enum QuerySource<'a> {
    /// Raw template source, compiled on demand
    Source(&'a str),
    Compiled(&'a CompiledTemplate),
}

impl<'a> From<&'a str> for QuerySource<'a> {
    fn from(source: &'a str) -> Self {
        QuerySource::Source(source)
    }
}

impl<'a> From<&'a String> for QuerySource<'a> {
    fn from(source: &'a String) -> Self {
        QuerySource::Source(source.as_str())
    }
}

impl<'a> From<&'a CompiledTemplate> for QuerySource<'a> {
    fn from(template: &'a CompiledTemplate) -> Self {
        QuerySource::Compiled(template)
    }
}

/// Only safe values may reach the query text.
fn format_query_value(
    out: &mut minijinja::Output<'_>,
    _state: &minijinja::State<'_, '_>,
    value: &Value,
) -> std::result::Result<(), Error> {
    if !value.is_safe() {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "unbound value reached the query text; route it through bind, inclause, sqlsafe or identifier",
        ));
    }
    write!(out, "{}", value)
        .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write query text"))
}

/// Recover a binder failure from the error chain, otherwise report the
/// engine error with its debug info.
fn render_error(err: Error) -> SqlBindError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(current) = source {
        if let Some(bind) = current.downcast_ref::<BindError>() {
            return SqlBindError::Bind(bind.clone());
        }
        source = current.source();
    }
    SqlBindError::Template(format!("{:#}", err))
}
