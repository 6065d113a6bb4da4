//! Hides literal text from the type-stripping regexes.
//!
//! Strings, comments, template text, element text and quoted attribute values
//! are swapped for placeholder tokens, so a pattern such as `x as T` only ever
//! matches code. `restore` puts the original text back.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::jsx::{
    in_expression_position, opens_tag, scan_name, skip_block_comment, skip_line, skip_quoted, skip_ws,
};

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// Regex fragment matching one placeholder.
pub(super) const PLACEHOLDER: &str = r"\x{E000}\d+\x{E001}";

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("valid regex"));

pub(super) struct Masked {
    code: String,
    literals: Vec<String>,
}

impl Masked {
    pub(super) fn new(source: &str) -> Self {
        let mut masker = Masker {
            src: source,
            literals: Vec::new(),
        };
        let mut code = String::with_capacity(source.len());
        masker.code(0, false, &mut code);
        Self {
            code,
            literals: masker.literals,
        }
    }

    pub(super) fn code(&self) -> &str {
        &self.code
    }

    /// Swap the placeholders in `code` back for the text they stand for.
    pub(super) fn restore(&self, code: &str) -> String {
        TOKEN
            .replace_all(code, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| self.literals.get(n))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

struct Masker<'a> {
    src: &'a str,
    literals: Vec<String>,
}

impl Masker<'_> {
    fn hide(&mut self, text: &str, out: &mut String) {
        if text.is_empty() {
            return;
        }
        out.push(OPEN);
        out.push_str(&self.literals.len().to_string());
        out.push(CLOSE);
        self.literals.push(text.to_string());
    }

    /// Copy code from `start`. With `until_brace` it stops at the `}` closing
    /// the current expression and returns its index.
    fn code(&mut self, start: usize, until_brace: bool, out: &mut String) -> usize {
        let src = self.src;
        let bytes = src.as_bytes();
        let mut depth = 0usize;
        let mut i = start;

        while i < bytes.len() {
            match bytes[i] {
                b'\'' | b'"' => {
                    let end = skip_quoted(bytes, i);
                    self.hide(&src[i..end], out);
                    i = end;
                }
                b'`' => i = self.template(i, out),
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    let end = skip_line(bytes, i);
                    self.hide(&src[i..end], out);
                    i = end;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let end = skip_block_comment(src, i);
                    self.hide(&src[i..end], out);
                    i = end;
                }
                b'{' => {
                    depth += 1;
                    out.push('{');
                    i += 1;
                }
                b'}' => {
                    if depth == 0 && until_brace {
                        return i;
                    }
                    depth = depth.saturating_sub(1);
                    out.push('}');
                    i += 1;
                }
                b'<' if opens_tag(bytes, i) && in_expression_position(out) => {
                    let mut element = String::new();
                    match self.element(i, &mut element) {
                        Some(end) => {
                            out.push_str(&element);
                            i = end;
                        }
                        None => {
                            out.push('<');
                            i += 1;
                        }
                    }
                }
                _ => {
                    let Some(c) = src[i..].chars().next() else {
                        break;
                    };
                    out.push(c);
                    i += c.len_utf8();
                }
            }
        }
        i
    }

    fn template(&mut self, start: usize, out: &mut String) -> usize {
        let src = self.src;
        let bytes = src.as_bytes();
        out.push('`');
        let mut i = start + 1;
        let mut run = i;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'`' => {
                    self.hide(&src[run..i], out);
                    out.push('`');
                    return i + 1;
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    self.hide(&src[run..i], out);
                    out.push_str("${");
                    let end = self.code(i + 2, true, out);
                    if end < bytes.len() {
                        out.push('}');
                    }
                    i = end + 1;
                    run = i.min(bytes.len());
                }
                _ => i += 1,
            }
        }
        self.hide(&src[run.min(bytes.len())..], out);
        bytes.len()
    }

    /// Skim one element from its `<`. `None` when the text is not an element.
    fn element(&mut self, start: usize, out: &mut String) -> Option<usize> {
        let src = self.src;
        let bytes = src.as_bytes();
        out.push('<');
        let mut i = start + 1;

        if bytes.get(i) == Some(&b'>') {
            out.push('>');
            return self.children(i + 1, out);
        }

        let name_end = scan_name(bytes, i);
        if name_end == i {
            return None;
        }
        out.push_str(&src[i..name_end]);
        i = name_end;

        loop {
            i = self.whitespace(i, out);
            match *bytes.get(i)? {
                b'/' => {
                    if bytes.get(i + 1) != Some(&b'>') {
                        return None;
                    }
                    out.push_str("/>");
                    return Some(i + 2);
                }
                b'>' => {
                    out.push('>');
                    return self.children(i + 1, out);
                }
                b'{' => i = self.expression(i, out)?,
                _ => {
                    let attr_end = scan_name(bytes, i);
                    if attr_end == i {
                        return None;
                    }
                    out.push_str(&src[i..attr_end]);
                    i = self.whitespace(attr_end, out);
                    if bytes.get(i) != Some(&b'=') {
                        continue;
                    }
                    out.push('=');
                    i = self.whitespace(i + 1, out);
                    i = match *bytes.get(i)? {
                        quote @ (b'"' | b'\'') => {
                            let close = bytes[i + 1..].iter().position(|&b| b == quote)? + i + 1;
                            self.hide(&src[i..=close], out);
                            close + 1
                        }
                        b'{' => self.expression(i, out)?,
                        b'<' => self.element(i, out)?,
                        _ => return None,
                    };
                }
            }
        }
    }

    fn children(&mut self, start: usize, out: &mut String) -> Option<usize> {
        let src = self.src;
        let bytes = src.as_bytes();
        let mut i = start;

        loop {
            match *bytes.get(i)? {
                b'<' if bytes.get(i + 1) == Some(&b'/') => {
                    let close = src[i..].find('>')? + i;
                    out.push_str(&src[i..=close]);
                    return Some(close + 1);
                }
                b'<' => i = self.element(i, out)?,
                b'{' => i = self.expression(i, out)?,
                _ => {
                    let end = src[i..]
                        .find(|c: char| c == '<' || c == '{')
                        .map_or(bytes.len(), |p| p + i);
                    self.hide(&src[i..end], out);
                    i = end;
                }
            }
        }
    }

    /// `{ ... }` inside an element; the contents are code.
    fn expression(&mut self, start: usize, out: &mut String) -> Option<usize> {
        out.push('{');
        let end = self.code(start + 1, true, out);
        if end >= self.src.len() {
            return None;
        }
        out.push('}');
        Some(end + 1)
    }

    fn whitespace(&self, start: usize, out: &mut String) -> usize {
        let end = skip_ws(self.src.as_bytes(), start);
        out.push_str(&self.src[start..end]);
        end
    }
}
