//! Auto-bind rewrite
//!
//! Runs over the token stream before the template engine parses it and turns
//!
//! ```text
//! {{ some.variable | filter1 | filter2 }}
//! ```
//!
//! into
//!
//! ```text
//! {{ (some.variable | filter1 | filter2)|bind("some.variable") }}
//! ```
//!
//! so a template author cannot forget to bind a value. Expressions whose last
//! step is already `bind`, `inclause`, `sqlsafe` or `identifier` are left
//! alone, as is everything outside `{{ ... }}`.

use std::borrow::Cow;

use crate::lexer::{Token, render_tokens, tokenize};

/// Name of the binding filter appended to un-annotated expressions.
pub const BIND_FILTER: &str = "bind";

/// Base parameter name for expressions that don't start with a variable path.
pub const ANONYMOUS_PARAM: &str = "bind#0";

/// Filters that already decide how their value reaches the query text.
pub const BINDING_FILTERS: [&str; 4] = ["bind", "inclause", "sqlsafe", "identifier"];

/// Literal keywords that never name a parameter.
const LITERAL_NAMES: [&str; 7] = ["true", "false", "none", "True", "False", "None", "not"];

/// Rewrite a template source so every output expression is bound.
pub fn rewrite_source(source: &str) -> String {
    render_tokens(&rewrite(tokenize(source)))
}

/// Rewrite a token stream so every output expression is bound.
///
/// Single pass and stateless: tokens outside `{{ ... }}` and unterminated
/// expressions are passed through unchanged and in order.
pub fn rewrite(tokens: Vec<Token<'_>>) -> Vec<Token<'_>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        if !matches!(token, Token::VariableBegin(_)) {
            out.push(token);
            continue;
        }
        out.push(token);

        let mut expr = Vec::new();
        let mut end = None;
        for token in tokens.by_ref() {
            if matches!(token, Token::VariableEnd(_)) {
                end = Some(token);
                break;
            }
            expr.push(token);
        }

        match end {
            Some(end) => {
                out.extend(bind_expression(expr));
                out.push(end);
            }
            None => out.extend(expr),
        }
    }
    out
}

/// Wrap one expression (the tokens between its delimiters) in a `bind` call.
fn bind_expression(expr: Vec<Token<'_>>) -> Vec<Token<'_>> {
    if expr.iter().all(Token::is_whitespace) || is_annotated(&expr) {
        return expr;
    }

    let name = param_name(&expr);
    tracing::trace!(param = %name, "auto-binding output expression");

    let lead = expr.iter().take_while(|t| t.is_whitespace()).count();
    let trail = expr.iter().rev().take_while(|t| t.is_whitespace()).count();

    let mut expr = expr;
    let trailing = expr.split_off(expr.len() - trail);
    let body = expr.split_off(lead);
    let leading = expr;

    let mut out = Vec::with_capacity(body.len() + leading.len() + trailing.len() + 7);
    out.extend(leading);
    out.push(Token::Open("("));
    out.extend(body);
    out.push(Token::Close(")"));
    out.push(Token::Pipe);
    out.push(Token::Name(BIND_FILTER));
    out.push(Token::Open("("));
    out.push(Token::Str(Cow::Owned(quote_literal(&name))));
    out.push(Token::Close(")"));
    out.extend(trailing);
    out
}

/// True if the last step of the expression is one of [`BINDING_FILTERS`],
/// with nothing after it but its own argument list.
pub fn is_annotated(expr: &[Token<'_>]) -> bool {
    let mut depth = 0usize;
    let mut last_pipe = None;
    for (i, token) in expr.iter().enumerate() {
        match token {
            Token::Open(_) => depth += 1,
            Token::Close(_) => depth = depth.saturating_sub(1),
            Token::Pipe if depth == 0 => last_pipe = Some(i),
            _ => {}
        }
    }
    let Some(pipe) = last_pipe else {
        return false;
    };

    let mut rest = expr[pipe + 1..].iter().filter(|t| !t.is_whitespace());
    match rest.next() {
        Some(Token::Name(name)) if BINDING_FILTERS.contains(name) => {}
        _ => return false,
    }

    // allow an argument list, nothing else
    match rest.next() {
        None => true,
        Some(Token::Open("(")) => {
            let mut depth = 1usize;
            for token in rest.by_ref() {
                match token {
                    Token::Open(_) => depth += 1,
                    Token::Close(_) => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            depth == 0 && rest.next().is_none()
        }
        Some(_) => false,
    }
}

/// Derive a parameter name from the expression's leading dotted path,
/// e.g. `request.project_id` for `{{ request.project_id | upper }}`.
pub fn param_name(expr: &[Token<'_>]) -> String {
    let mut tokens = expr.iter().filter(|t| !t.is_whitespace()).peekable();

    let mut name = match tokens.next() {
        Some(Token::Name(first)) if !LITERAL_NAMES.contains(first) => first.to_string(),
        _ => return ANONYMOUS_PARAM.to_string(),
    };

    while let Some(Token::Dot) = tokens.peek() {
        tokens.next();
        match tokens.next() {
            Some(Token::Name(field)) => {
                name.push('.');
                name.push_str(field);
            }
            _ => break,
        }
    }
    name
}

fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
