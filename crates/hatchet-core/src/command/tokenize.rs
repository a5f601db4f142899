//! Splits a console line into command tokens.

/// Tokenizes `line` on spaces, keeping quoted runs together.
///
/// A space inside single or double quotes does not split. Quote characters
/// stay part of the token until the end, when one surrounding pair of `"`
/// and then of `'` is stripped. An unclosed quote runs to the end of the
/// line. Empty tokens are dropped.
///
/// ```text
/// foo "bar baz" 'qux'  ->  ["foo", "bar baz", "qux"]
/// ```
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match (quote, ch) {
            (None, ' ' | '\t' | '\n' | '\r') => {
                push_token(&mut tokens, &mut current);
            }
            (None, '"' | '\'') => {
                quote = Some(ch);
                current.push(ch);
            }
            (Some(open), _) if ch == open => {
                quote = None;
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }
    push_token(&mut tokens, &mut current);
    tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    let raw = std::mem::take(current);
    let stripped = strip_pair(strip_pair(&raw, '"'), '\'');
    if !stripped.is_empty() {
        tokens.push(stripped.to_owned());
    }
}

fn strip_pair(token: &str, quote: char) -> &str {
    token
        .strip_prefix(quote)
        .and_then(|inner| inner.strip_suffix(quote))
        .unwrap_or(token)
}
