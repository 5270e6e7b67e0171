//! sqlbind - render auto-binding SQL templates from the command line
//!
//! Usage:
//! ```bash
//! # Render a template with a JSON context, printing the query and a params table
//! sqlbind render report.sql --context request.json --param-style named
//!
//! # Read the template from stdin and print machine-readable output
//! echo 'SELECT * FROM t WHERE id = {{ id }}' | sqlbind render - --context-json '{"id": 1}' --format json
//!
//! # Show what a template looks like after auto-binding
//! sqlbind rewrite report.sql
//! ```

mod logging;
mod output;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use sqlbind_core::{BoundQuery, IdentifierQuote, ParamStyle, SqlBindConfig};
use sqlbind_templates::{SqlTemplateEngine, rewrite_source};

use logging::LoggingConfig;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "sqlbind",
    version,
    about = "Render SQL templates into queries with bound parameters"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a template into a query and its bound parameters
    Render(RenderArgs),

    /// Print a template after auto-binding, without rendering it
    Rewrite {
        /// Template file, or `-` for stdin
        template: String,
    },
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Template file, or `-` for stdin
    template: String,

    /// JSON file holding the template context
    #[arg(long, conflicts_with = "context_json")]
    context: Option<PathBuf>,

    /// Template context as inline JSON
    #[arg(long)]
    context_json: Option<String>,

    /// Placeholder style: qmark, format, numeric, named, pyformat or dollar
    #[arg(long, env = "SQLBIND_PARAM_STYLE")]
    param_style: Option<ParamStyle>,

    /// Identifier quote character: " or `
    #[arg(long)]
    quote: Option<char>,

    /// TOML file with engine settings; flags override it
    #[arg(long, env = "SQLBIND_CONFIG")]
    config: Option<PathBuf>,

    /// Directory searched by {% include %} and {% import %}
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// Fail on undefined variables instead of binding NULL
    #[arg(long)]
    strict: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&LoggingConfig::new(cli.verbose))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match cli.command {
        Command::Render(args) => {
            let query = render(&args)?;
            writeln!(out, "{}", output::format_query(&query, args.format)?)?;
        }
        Command::Rewrite { template } => {
            let source = read_template(&template)?;
            write!(out, "{}", rewrite_source(&source))?;
        }
    }
    Ok(())
}

fn render(args: &RenderArgs) -> anyhow::Result<BoundQuery> {
    let config = build_config(args)?;
    let mut engine = SqlTemplateEngine::new(config);
    if let Some(dir) = &args.template_dir {
        tracing::debug!(dir = %dir.display(), "loading templates from directory");
        engine.set_loader(minijinja::path_loader(dir));
    }

    let source = read_template(&args.template)?;
    let context = load_context(args)?;
    let name = template_name(&args.template);

    let compiled = engine
        .compile_named(&name, &source)
        .with_context(|| format!("failed to compile {}", name))?;
    let query = engine
        .prepare_query(&compiled, &context)
        .with_context(|| format!("failed to render {}", name))?;

    tracing::info!(
        template = %name,
        style = %engine.param_style(),
        params = query.params.len(),
        "rendered template"
    );
    Ok(query)
}

/// Settings from `--config`, overridden by explicit flags.
fn build_config(args: &RenderArgs) -> anyhow::Result<SqlBindConfig> {
    let mut config = match &args.config {
        Some(path) => SqlBindConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SqlBindConfig::default(),
    };

    if let Some(style) = args.param_style {
        config = config.param_style(style);
    }
    if let Some(quote) = args.quote {
        config = config.identifier_quote(IdentifierQuote::try_from(quote)?);
    }
    if args.strict {
        config = config.strict_undefined(true);
    }
    Ok(config)
}

fn read_template(template: &str) -> anyhow::Result<String> {
    if template == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read template from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(template).with_context(|| format!("failed to read {}", template))
}

fn load_context(args: &RenderArgs) -> anyhow::Result<serde_json::Value> {
    let context: serde_json::Value = match (&args.context, &args.context_json) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read context {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid JSON in {}", path.display()))?
        }
        (None, Some(raw)) => serde_json::from_str(raw).context("invalid JSON in --context-json")?,
        (None, None) => serde_json::Value::Object(Default::default()),
    };

    if !context.is_object() {
        bail!("template context must be a JSON object");
    }
    Ok(context)
}

fn template_name(template: &str) -> String {
    if template == "-" {
        return "<stdin>".to_string();
    }
    Path::new(template)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| template.to_string())
}
