//! Template lexer
//!
//! Splits template source into a flat token stream. Only output expressions
//! (`{{ ... }}`) are tokenized in detail; everything else (template data,
//! comments, statement tags and `{% raw %}` blocks) is carried through as
//! opaque [`Token::Text`], so concatenating the token sources always yields
//! the original template.

use std::borrow::Cow;

/// A lexical token of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'s> {
    /// Anything outside an output expression, passed through untouched
    Text(&'s str),
    /// `{{`, `{{-` or `{{+`
    VariableBegin(&'s str),
    /// `}}` or `-}}`
    VariableEnd(&'s str),
    /// Identifier or keyword
    Name(&'s str),
    Dot,
    Pipe,
    /// `(`, `[` or `{`
    Open(&'s str),
    /// `)`, `]` or `}`
    Close(&'s str),
    /// String literal, including its quotes
    Str(Cow<'s, str>),
    Whitespace(&'s str),
    /// Numbers, operators and any other punctuation
    Other(&'s str),
}

impl Token<'_> {
    /// The source text this token stands for.
    pub fn as_source(&self) -> &str {
        match self {
            Token::Text(s)
            | Token::VariableBegin(s)
            | Token::VariableEnd(s)
            | Token::Name(s)
            | Token::Open(s)
            | Token::Close(s)
            | Token::Whitespace(s)
            | Token::Other(s) => *s,
            Token::Str(s) => s.as_ref(),
            Token::Dot => ".",
            Token::Pipe => "|",
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace(_))
    }
}

/// Tokenize template source.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = source[pos..].find('{') {
        let start = pos + offset;
        let next = match bytes.get(start + 1) {
            Some(b) => *b,
            None => break,
        };

        let resume = match next {
            b'#' => source[start + 2..].find("#}").map(|end| start + 2 + end + 2),
            b'%' => skip_statement(source, start),
            b'{' => match lex_expression(source, start) {
                Some((expr, end)) => {
                    if text_start < start {
                        tokens.push(Token::Text(&source[text_start..start]));
                    }
                    tokens.extend(expr);
                    text_start = end;
                    Some(end)
                }
                None => None,
            },
            _ => Some(start + 1),
        };

        match resume {
            Some(end) => pos = end,
            // unterminated tag: leave the remainder to the template engine
            None => break,
        }
    }

    if text_start < source.len() {
        tokens.push(Token::Text(&source[text_start..]));
    }
    tokens
}

/// Serialize a token stream back into template source.
pub fn render_tokens(tokens: &[Token<'_>]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.as_source().len()).sum());
    for token in tokens {
        out.push_str(token.as_source());
    }
    out
}

/// Skip a `{% ... %}` tag starting at `start`; a `{% raw %}` tag is skipped
/// together with everything up to its `{% endraw %}`.
fn skip_statement(source: &str, start: usize) -> Option<usize> {
    let end = statement_end(source, start + 2)?;
    if tag_body(&source[start..end]) != "raw" {
        return Some(end);
    }

    let mut pos = end;
    while let Some(offset) = source[pos..].find("{%") {
        let tag_start = pos + offset;
        let tag_end = statement_end(source, tag_start + 2)?;
        if tag_body(&source[tag_start..tag_end]) == "endraw" {
            return Some(tag_end);
        }
        pos = tag_end;
    }
    None
}

/// Index just past the `%}` closing a statement, honoring string literals.
fn statement_end(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut pos = from;
    while pos < bytes.len() {
        match bytes[pos] {
            quote @ (b'\'' | b'"') => pos = string_end(bytes, pos, quote)?,
            b'%' if bytes.get(pos + 1) == Some(&b'}') => return Some(pos + 2),
            _ => pos += 1,
        }
    }
    None
}

/// The trimmed keyword content of a `{% ... %}` tag, without whitespace control markers.
fn tag_body(tag: &str) -> &str {
    let inner = &tag[2..tag.len() - 2];
    inner
        .trim_start_matches(['-', '+'])
        .trim_end_matches(['-', '+'])
        .trim()
}

/// Index just past the closing quote of the string literal opened at `start`.
fn string_end(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_name_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Lex the output expression opening at `start`, returning its tokens
/// (delimiters included) and the index just past its end marker.
fn lex_expression(source: &str, start: usize) -> Option<(Vec<Token<'_>>, usize)> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();

    let mut pos = start + 2;
    if matches!(bytes.get(pos), Some(b'-' | b'+')) {
        pos += 1;
    }
    tokens.push(Token::VariableBegin(&source[start..pos]));

    let mut depth = 0usize;
    loop {
        let rest = &source[pos..];
        let c = rest.chars().next()?;

        if depth == 0 {
            if rest.starts_with("}}") {
                tokens.push(Token::VariableEnd(&source[pos..pos + 2]));
                return Some((tokens, pos + 2));
            }
            if rest.starts_with("-}}") {
                tokens.push(Token::VariableEnd(&source[pos..pos + 3]));
                return Some((tokens, pos + 3));
            }
        }

        let len = match c {
            c if c.is_whitespace() => {
                let len = run_length(rest, char::is_whitespace);
                tokens.push(Token::Whitespace(&rest[..len]));
                len
            }
            c if is_name_start(c) => {
                let len = run_length(rest, is_name_continue);
                tokens.push(Token::Name(&rest[..len]));
                len
            }
            c if c.is_ascii_digit() => {
                let len = run_length(rest, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                tokens.push(Token::Other(&rest[..len]));
                len
            }
            '.' => {
                tokens.push(Token::Dot);
                1
            }
            '|' => {
                tokens.push(Token::Pipe);
                1
            }
            '(' | '[' | '{' => {
                depth += 1;
                tokens.push(Token::Open(&rest[..1]));
                1
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                tokens.push(Token::Close(&rest[..1]));
                1
            }
            '\'' | '"' => {
                let end = string_end(bytes, pos, c as u8)?;
                tokens.push(Token::Str(Cow::Borrowed(&source[pos..end])));
                end - pos
            }
            other => {
                let len = other.len_utf8();
                tokens.push(Token::Other(&rest[..len]));
                len
            }
        };
        pos += len;
    }
}

/// Byte length of the leading run of chars matching `pred`.
fn run_length(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.char_indices()
        .find(|(_, c)| !pred(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(source: &str) {
        assert_eq!(render_tokens(&tokenize(source)), source);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            tokenize("SELECT * FROM users"),
            vec![Token::Text("SELECT * FROM users")]
        );
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_simple_expression() {
        assert_eq!(
            tokenize("id = {{ request.id }}"),
            vec![
                Token::Text("id = "),
                Token::VariableBegin("{{"),
                Token::Whitespace(" "),
                Token::Name("request"),
                Token::Dot,
                Token::Name("id"),
                Token::Whitespace(" "),
                Token::VariableEnd("}}"),
            ]
        );
    }

    #[test]
    fn test_filter_with_arguments() {
        assert_eq!(
            tokenize("{{x|default('a')}}"),
            vec![
                Token::VariableBegin("{{"),
                Token::Name("x"),
                Token::Pipe,
                Token::Name("default"),
                Token::Open("("),
                Token::Str(Cow::Borrowed("'a'")),
                Token::Close(")"),
                Token::VariableEnd("}}"),
            ]
        );
    }

    #[test]
    fn test_whitespace_control_markers() {
        let tokens = tokenize("{{- x -}}");
        assert_eq!(tokens.first(), Some(&Token::VariableBegin("{{-")));
        assert_eq!(tokens.last(), Some(&Token::VariableEnd("-}}")));

        let tokens = tokenize("{{+ x }}");
        assert_eq!(tokens.first(), Some(&Token::VariableBegin("{{+")));
    }

    #[test]
    fn test_subtraction_is_not_an_end_marker() {
        let tokens = tokenize("{{ a - b }}");
        assert!(tokens.contains(&Token::Other("-")));
        assert_eq!(tokens.last(), Some(&Token::VariableEnd("}}")));
    }

    #[test]
    fn test_dict_literal_may_contain_closing_braces() {
        let tokens = tokenize("{{ {'a': {'b': 1}} }}");
        assert_eq!(tokens.last(), Some(&Token::VariableEnd("}}")));
        assert_eq!(
            tokens.iter().filter(|t| matches!(t, Token::VariableEnd(_))).count(),
            1
        );
    }

    #[test]
    fn test_string_may_contain_delimiters() {
        let tokens = tokenize(r#"{{ "}}" ~ 'it\'s' }}"#);
        assert_eq!(tokens[2], Token::Str(Cow::Borrowed(r#""}}""#)));
        assert!(tokens.contains(&Token::Str(Cow::Borrowed(r"'it\'s'"))));
        assert_eq!(tokens.last(), Some(&Token::VariableEnd("}}")));
    }

    #[test]
    fn test_comments_and_statements_are_text() {
        let source = "{# {{ x }} #}{% if a == '%}' %}{{ y }}{% endif %}";
        let tokens = tokenize(source);
        assert_eq!(tokens[0], Token::Text("{# {{ x }} #}{% if a == '%}' %}"));
        assert_eq!(tokens[1], Token::VariableBegin("{{"));
        assert_eq!(tokens.last(), Some(&Token::Text("{% endif %}")));
    }

    #[test]
    fn test_raw_block_is_text() {
        let source = "{% raw %}{{ not_an_expression }}{%- endraw %} {{ x }}";
        let tokens = tokenize(source);
        assert_eq!(
            tokens[0],
            Token::Text("{% raw %}{{ not_an_expression }}{%- endraw %} ")
        );
        assert_eq!(tokens[1], Token::VariableBegin("{{"));
    }

    #[test]
    fn test_unterminated_expression_is_text() {
        assert_eq!(
            tokenize("SELECT {{ x"),
            vec![Token::Text("SELECT {{ x")]
        );
        assert_eq!(
            tokenize("{{ ok }} {{ 'open"),
            vec![
                Token::VariableBegin("{{"),
                Token::Whitespace(" "),
                Token::Name("ok"),
                Token::Whitespace(" "),
                Token::VariableEnd("}}"),
                Token::Text(" {{ 'open"),
            ]
        );
    }

    #[test]
    fn test_numbers_and_unicode() {
        let tokens = tokenize("{{ 1.5 + größe }}");
        assert!(tokens.contains(&Token::Other("1.5")));
        assert!(tokens.contains(&Token::Name("größe")));
    }

    #[test]
    fn test_round_trips() {
        for source in [
            "",
            "plain {text} with { braces",
            "{{ a }}{{b}}{{- c -}}",
            "{% for d in days %}{{ d|upper }}{% endfor %}",
            "{% raw %}{{ x }}{% endraw %}",
            "{{ {'k': [1, 2]} }} trailing {",
            "unterminated {% if x",
            "{# comment",
        ] {
            round_trip(source);
        }
    }
}
