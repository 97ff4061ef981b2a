//! Conservative built-in JS minifier.
//!
//! Strips line and plain block comments, trims indentation, collapses
//! horizontal whitespace runs, and drops blank lines. Newlines between
//! statements are preserved, so semicolon-free code relying on automatic
//! semicolon insertion is never joined into one line. String, template, and
//! regex literals are copied verbatim; `/*! ... */` bang comments survive.
//!
//! Known limitation: a backtick inside a `${...}` template interpolation is
//! read as the end of the template.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::MinifyError;
use crate::registry::Minifier;

/// The built-in JS minifier.
pub struct JsMinifier;

impl Minifier for JsMinifier {
    fn minify(&self, source: &str) -> Result<String, MinifyError> {
        Ok(minify_js(source))
    }
}

fn flush_space(out: &mut String, pending: &mut bool) {
    if *pending {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push(' ');
        }
        *pending = false;
    }
}

fn minify_js(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut pending_space = false;

    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' => {
                flush_space(&mut out, &mut pending_space);
                out.push(ch);
                copy_string(&mut out, &mut chars, ch);
            }
            '`' => {
                flush_space(&mut out, &mut pending_space);
                out.push('`');
                copy_template(&mut out, &mut chars);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    chars.next();
                    skip_line_comment(&mut chars);
                    pending_space = false;
                }
                Some('*') => {
                    chars.next();
                    if chars.peek() == Some(&'!') {
                        flush_space(&mut out, &mut pending_space);
                        out.push_str("/*");
                        copy_until_close(&mut out, &mut chars);
                    } else {
                        skip_until_close(&mut chars);
                        pending_space = true;
                    }
                }
                _ => {
                    flush_space(&mut out, &mut pending_space);
                    out.push('/');
                    if regex_position(&out) {
                        copy_regex(&mut out, &mut chars);
                    }
                }
            },
            '\n' => {
                while out.ends_with(' ') {
                    out.pop();
                }
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                pending_space = false;
            }
            c if c.is_whitespace() => pending_space = true,
            c => {
                flush_space(&mut out, &mut pending_space);
                out.push(c);
            }
        }
    }

    while out.ends_with(' ') || out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Decide whether a `/` at the current output position starts a regex
/// literal rather than a division.
///
/// Heuristic on the preceding significant token: operators, openers, and a
/// handful of keywords put the parser in expression position. A wrong
/// "division" answer is harmless (the text is copied verbatim either way)
/// unless the regex itself contains comment-like character sequences.
fn regex_position(out: &str) -> bool {
    // `out` already ends with the freshly pushed '/'.
    let before = out.strip_suffix('/').unwrap_or(out);
    let trimmed = before.trim_end();
    let Some(last) = trimmed.chars().last() else {
        return true; // start of input
    };
    if "(,=:[!&|?{};+-*%<>^~\n".contains(last) {
        return true;
    }
    const KEYWORDS: [&str; 10] = [
        "return",
        "typeof",
        "case",
        "delete",
        "void",
        "new",
        "in",
        "of",
        "do",
        "else",
    ];
    KEYWORDS.iter().any(|kw| {
        trimmed.ends_with(kw)
            && trimmed
                .get(..trimmed.len() - kw.len())
                .and_then(|head| head.chars().last())
                .is_none_or(|c| !c.is_alphanumeric() && c != '_' && c != '$')
    })
}

fn copy_string(out: &mut String, chars: &mut Peekable<Chars<'_>>, quote: char) {
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else if c == quote || c == '\n' {
            // A raw newline means the literal was unterminated; resume
            // normal scanning rather than swallowing the rest of the file.
            break;
        }
    }
}

fn copy_template(out: &mut String, chars: &mut Peekable<Chars<'_>>) {
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else if c == '`' {
            break;
        }
    }
}

fn copy_regex(out: &mut String, chars: &mut Peekable<Chars<'_>>) {
    let mut in_class = false;
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => break,
            '\n' => break, // misread division; the text is unchanged anyway
            _ => {}
        }
    }
}

fn skip_line_comment(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| *c != '\n') {
        chars.next();
    }
}

fn copy_until_close(out: &mut String, chars: &mut Peekable<Chars<'_>>) {
    let mut prev = '\0';
    for c in chars.by_ref() {
        out.push(c);
        if prev == '*' && c == '/' {
            break;
        }
        prev = c;
    }
}

fn skip_until_close(chars: &mut Peekable<Chars<'_>>) {
    let mut prev = '\0';
    for c in chars.by_ref() {
        if prev == '*' && c == '/' {
            break;
        }
        prev = c;
    }
}
