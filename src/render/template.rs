//! Scanner for templated fragment bodies.
//!
//! Markers:
//! * `:name` and `#{name}` bind a value and emit `?`
//! * `${name}` substitutes the value's text inline
//! * `\:`, `\#`, `\$` escape a marker; `::` is a cast, not a marker
//!
//! Anything inside single-quoted SQL literals is plain text.

use crate::error::{Result, SqlsetError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    Text(String),
    Bind(String),
    Inline(String),
}

impl Segment {
    pub(crate) fn reference(&self) -> Option<&str> {
        match self {
            Segment::Bind(path) | Segment::Inline(path) => Some(path),
            Segment::Text(_) => None,
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

pub(crate) fn parse(body: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut in_quote = false;
    let mut chars = body.char_indices().peekable();

    fn flush(text: &mut String, segments: &mut Vec<Segment>) {
        if !text.is_empty() {
            segments.push(Segment::Text(std::mem::take(text)));
        }
    }

    while let Some((pos, ch)) = chars.next() {
        if in_quote {
            text.push(ch);
            if ch == '\'' {
                in_quote = false;
            }
            continue;
        }
        match ch {
            '\'' => {
                in_quote = true;
                text.push(ch);
            }
            '\\' => match chars.peek() {
                Some(&(_, next)) if matches!(next, '#' | '$' | ':') => {
                    chars.next();
                    text.push(next);
                }
                _ => text.push(ch),
            },
            '#' | '$' if matches!(chars.peek(), Some(&(_, '{'))) => {
                chars.next();
                let start = pos + 2;
                let close = body[start..].find('}').ok_or_else(|| {
                    SqlsetError::template(format!("unterminated '{ch}{{' at offset {pos}"))
                })?;
                let end = start + close;
                let name = body[start..end].split(',').next().unwrap_or("").trim();
                if name.is_empty() || !name.chars().all(is_name_char) {
                    return Err(SqlsetError::template(format!(
                        "invalid marker '{}' at offset {pos}",
                        &body[pos..=end]
                    )));
                }
                flush(&mut text, &mut segments);
                segments.push(if ch == '#' {
                    Segment::Bind(name.to_owned())
                } else {
                    Segment::Inline(name.to_owned())
                });
                while chars.next_if(|&(p, _)| p <= end).is_some() {}
            }
            ':' => match chars.peek() {
                Some(&(_, ':')) => {
                    chars.next();
                    text.push_str("::");
                }
                Some(&(_, next)) if is_name_start(next) => {
                    let start = pos + 1;
                    let end = body[start..]
                        .find(|c: char| !is_name_char(c))
                        .map_or(body.len(), |i| start + i);
                    let name = body[start..end].trim_end_matches('.');
                    let end = start + name.len();
                    flush(&mut text, &mut segments);
                    segments.push(Segment::Bind(name.to_owned()));
                    while chars.next_if(|&(p, _)| p < end).is_some() {}
                }
                _ => text.push(ch),
            },
            _ => text.push(ch),
        }
    }
    flush(&mut text, &mut segments);
    Ok(segments)
}
