//! Pure predicates and splitters over raw token strings.

/// Strip the leading run of the token's first character.
///
/// The stripped count is the token's "prefix count": `--verbose` has body
/// `verbose` and prefix count 2.
pub(crate) fn flag_name(token: &str) -> &str {
    match token.chars().next() {
        Some(prefix) => token.trim_start_matches(prefix),
        None => token,
    }
}

/// Whether the token starts with one of the configured prefix characters.
pub(crate) fn is_option_token(token: &str, prefix_chars: &str) -> bool {
    token
        .chars()
        .next()
        .map_or(false, |first| prefix_chars.contains(first))
}

/// Split on the first `=`, such as `--key=value`.
pub(crate) fn split_equals(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => (token, None),
    }
}

/// Whether the entire token reads as a decimal number below zero.
pub(crate) fn is_negative_number(token: &str) -> bool {
    token.parse::<f64>().map_or(false, |value| value < 0.0)
}

/// Strip one matching pair of surrounding quotes, if present.
pub(crate) fn remove_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if token.len() > 1
        && bytes[0] == bytes[token.len() - 1]
        && (bytes[0] == b'\'' || bytes[0] == b'"')
    {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

/// Trim, mapping a blank result to `None`.
pub(crate) fn trim_nonempty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The final path component, with either separator style.
pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(path)
}

/// Join values with a separator, wrapping each in `quote`.
pub(crate) fn join_all<'a>(
    values: impl IntoIterator<Item = &'a str>,
    separator: &str,
    quote: &str,
) -> String {
    let mut out = String::new();
    for value in values {
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.push_str(quote);
        out.push_str(value);
        out.push_str(quote);
    }
    out
}
