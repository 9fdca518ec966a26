//! Inline function-decorator extraction: a registry-gated scan
//! over one already-captured `SHELL_TEXT` run, splitting it into literal
//! text and `FunctionDecorator` parts without disturbing characters that
//! merely look like a decorator (`user@host`, `@{array[@]}`, `@(id -u)`, or
//! `@name` where `name` is not a registered function decorator).

use crate::error::{ParseError, ParseErrorKind};
use crate::registry::DecoratorRegistry;
use crate::source::Location;
use crate::syntax::{Expression, FunctionDecorator, NamedParameter, ShellPart, TextPart};

/// Splits `raw` (the text of one `SHELL_TEXT` token located at `location`)
/// into literal text and extracted function-decorator parts.
pub fn extract_inline_decorators(
    raw: &str,
    location: &Location,
    registry: &DecoratorRegistry,
) -> Result<Vec<ShellPart>, ParseError> {
    let mut parts = Vec::new();
    let mut i = 0usize;
    let mut text_start = 0usize;

    while i < raw.len() {
        if raw.as_bytes()[i] == b'@' {
            if let Some((name, args_start)) = match_decorator_head(raw, i) {
                if registry.is_function(name) {
                    if i > text_start {
                        parts.push(ShellPart::Text(TextPart {
                            text: raw[text_start..i].to_string(),
                            location: sub_location(location, text_start, i),
                        }));
                    }
                    let (args, end) = parse_inline_args(raw, args_start, location)?;
                    parts.push(ShellPart::Decorator(FunctionDecorator {
                        name: name.to_string(),
                        args,
                        location: sub_location(location, i, end),
                    }));
                    i = end;
                    text_start = end;
                    continue;
                }
            }
        }
        let char_len = raw[i..].chars().next().map_or(1, char::len_utf8);
        i += char_len;
    }

    if text_start < raw.len() || parts.is_empty() {
        parts.push(ShellPart::Text(TextPart {
            text: raw[text_start..].to_string(),
            location: sub_location(location, text_start, raw.len()),
        }));
    }
    Ok(parts)
}

/// If `raw[at..]` begins with `@ident(` (no whitespace between the
/// identifier and the `(`), returns the identifier and the byte offset of
/// the character right after the `(`.
fn match_decorator_head(raw: &str, at: usize) -> Option<(&str, usize)> {
    let rest = &raw[at + 1..];
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let mut end = first.len_utf8();
    for (idx, c) in chars {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            end = idx + c.len_utf8();
        } else {
            break;
        }
    }
    let name = &rest[..end];
    if rest[end..].starts_with('(') {
        Some((name, at + 1 + end + 1))
    } else {
        None
    }
}

fn sub_location(location: &Location, start: usize, end: usize) -> Location {
    Location {
        code: std::sync::Arc::clone(&location.code),
        range: location.range.start + start..location.range.start + end,
    }
}

/// Parses a balanced, comma-separated argument list starting right after
/// the opening `(` (at byte offset `start` in `raw`). Each
/// argument is a bare identifier or a quoted string — not a full
/// expression, and never another function decorator (nesting is rejected,
/// matching the no-nesting invariant).
fn parse_inline_args(
    raw: &str,
    start: usize,
    location: &Location,
) -> Result<(Vec<NamedParameter>, usize), ParseError> {
    let mut args = Vec::new();
    let mut i = start;
    let mut arg_start = start;
    let mut in_quote: Option<char> = None;

    loop {
        let Some(c) = raw[i..].chars().next() else {
            return Err(ParseError::new(
                ParseErrorKind::UnmatchedParen,
                sub_location(location, start.saturating_sub(1), raw.len()),
            ));
        };
        match in_quote {
            Some(q) => {
                if c == q {
                    in_quote = None;
                }
                i += c.len_utf8();
            }
            None => match c {
                '"' | '\'' | '`' => {
                    in_quote = Some(c);
                    i += c.len_utf8();
                }
                '@' => {
                    return Err(ParseError::new(
                        ParseErrorKind::NestedFunctionDecorator,
                        sub_location(location, i, i + 1),
                    ));
                }
                ',' => {
                    push_arg(raw, arg_start, i, location, &mut args);
                    i += 1;
                    arg_start = i;
                }
                ')' => {
                    push_arg(raw, arg_start, i, location, &mut args);
                    return Ok((args, i + 1));
                }
                _ => {
                    i += c.len_utf8();
                }
            },
        }
    }
}

fn push_arg(raw: &str, start: usize, end: usize, location: &Location, args: &mut Vec<NamedParameter>) {
    let slice = &raw[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let leading_ws = slice.len() - slice.trim_start().len();
    let arg_start = start + leading_ws;
    let arg_end = arg_start + trimmed.len();
    let loc = sub_location(location, arg_start, arg_end);

    let value = if trimmed.len() >= 2
        && matches!(trimmed.as_bytes()[0], b'"' | b'\'' | b'`')
        && trimmed.as_bytes()[trimmed.len() - 1] == trimmed.as_bytes()[0]
    {
        Expression::String {
            raw: trimmed.to_string(),
            value: trimmed[1..trimmed.len() - 1].to_string(),
            location: loc,
        }
    } else {
        Expression::Identifier {
            name: trimmed.to_string(),
            location: loc,
        }
    };
    args.push(NamedParameter { name: None, value });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Code, Source};
    use std::sync::Arc;

    fn loc(text: &str) -> Location {
        Location {
            code: Arc::new(Code::new(text, Source::Unknown)),
            range: 0..text.len(),
        }
    }

    #[test]
    fn extracts_var_and_env_decorators() {
        let registry = DecoratorRegistry::with_builtins();
        let raw = "docker build -t @var(IMAGE):@var(TAG)";
        let location = loc(raw);
        let parts = extract_inline_decorators(raw, &location, &registry).unwrap();
        assert_eq!(parts.len(), 4);
        assert!(matches!(&parts[0], ShellPart::Text(t) if t.text == "docker build -t "));
        assert!(matches!(&parts[1], ShellPart::Decorator(d) if d.name == "var"));
        assert!(matches!(&parts[2], ShellPart::Text(t) if t.text == ":"));
        assert!(matches!(&parts[3], ShellPart::Decorator(d) if d.name == "var"));
    }

    #[test]
    fn leaves_unregistered_at_forms_untouched() {
        let registry = DecoratorRegistry::with_builtins();
        let raw = "echo 'Build failed' | mail admin@company.com";
        let location = loc(raw);
        let parts = extract_inline_decorators(raw, &location, &registry).unwrap();
        assert_eq!(parts.len(), 1);
        assert!(matches!(&parts[0], ShellPart::Text(t) if t.text == raw));
    }

    #[test]
    fn non_function_names_stay_as_text() {
        let registry = DecoratorRegistry::with_builtins();
        // `timeout` is a block decorator, not a function decorator, so it
        // must never be extracted from inline shell text.
        let raw = "@timeout(30s) echo hi";
        let location = loc(raw);
        let parts = extract_inline_decorators(raw, &location, &registry).unwrap();
        assert_eq!(parts.len(), 1);
        assert!(matches!(&parts[0], ShellPart::Text(t) if t.text == raw));
    }
}
