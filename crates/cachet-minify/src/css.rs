//! Conservative built-in CSS minifier.
//!
//! Single pass: strips plain comments, collapses whitespace runs, and drops
//! the spaces CSS never needs around `{` `}` `;` `:` `,` `>`. String
//! literals and `/*! ... */` bang comments are copied verbatim. Spaces next
//! to parentheses are kept single instead of dropped so media queries like
//! `and (min-width: ...)` stay valid.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::MinifyError;
use crate::registry::Minifier;

/// The built-in CSS minifier.
pub struct CssMinifier;

impl Minifier for CssMinifier {
    fn minify(&self, source: &str) -> Result<String, MinifyError> {
        Ok(minify_css(source))
    }
}

// Characters that never need an adjacent space in CSS.
fn joins(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | ':' | ',' | '>')
}

fn flush_space(out: &mut String, pending: &mut bool) {
    if *pending {
        if !out.is_empty() && !out.ends_with(joins) {
            out.push(' ');
        }
        *pending = false;
    }
}

fn minify_css(input: &str) -> String {
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
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'!') {
                    flush_space(&mut out, &mut pending_space);
                    out.push_str("/*");
                    copy_until_close(&mut out, &mut chars);
                } else {
                    // A plain comment separates tokens like whitespace does.
                    skip_until_close(&mut chars);
                    pending_space = true;
                }
            }
            c if c.is_whitespace() => pending_space = true,
            c if joins(c) => {
                pending_space = false;
                out.push(c);
            }
            c => {
                flush_space(&mut out, &mut pending_space);
                out.push(c);
            }
        }
    }

    out
}

fn copy_string(out: &mut String, chars: &mut Peekable<Chars<'_>>, quote: char) {
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else if c == quote {
            break;
        }
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
