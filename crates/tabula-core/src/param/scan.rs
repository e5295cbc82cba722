//! Placeholder token scanner.
//!
//! Skips quoted literals (`'...'`, `"..."`, `` `...` ``, with doubled-quote
//! escapes), `::` casts and doubled markers. Everything else that starts
//! with the marker is a token: bare (`?`) or named (`?id`).
//!
//! A marker always captures the word that directly follows it, so `?AND`
//! is a parameter named `AND`. Separate a bare marker from a following
//! keyword with whitespace.

use std::ops::Range;

///
/// Token
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Token {
    /// Byte span of the whole token, marker included.
    pub(crate) span: Range<usize>,
    /// `None` for a bare token.
    pub(crate) name: Option<String>,
}

pub(crate) fn scan(text: &str, marker: char) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '\'' | '"' | '`' => skip_quoted(&mut chars, c),

            ':' if marker != ':' && chars.peek().is_some_and(|&(_, next)| next == ':') => {
                chars.next();
            }

            c if c == marker => {
                // doubled marker (or a `::` cast when the marker is ':')
                if chars.peek().is_some_and(|&(_, next)| next == marker) {
                    chars.next();
                    continue;
                }

                let mut end = start + c.len_utf8();
                while let Some(&(index, next)) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    end = index + next.len_utf8();
                    chars.next();
                }

                let name_start = start + c.len_utf8();
                let name = (end > name_start).then(|| text[name_start..end].to_string());

                tokens.push(Token {
                    span: start..end,
                    name,
                });
            }

            _ => {}
        }
    }

    tokens
}

fn skip_quoted(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, quote: char) {
    while let Some((_, c)) = chars.next() {
        if c == quote {
            // doubled quote is an escaped quote inside the literal
            if chars.peek().is_some_and(|&(_, next)| next == quote) {
                chars.next();
                continue;
            }
            return;
        }
    }
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

///
/// TESTS
///
