//! Tag syntax to `h(type, props, ...children)` calls.
//!
//! A small scanner rather than a parser: it tracks strings, comments,
//! template literals and brace depth so tags nested in expressions and
//! attribute values are found, and leaves anything it cannot read verbatim.

use super::imports::js_string;

/// Rewrite every element in `source` into nested `h(...)` calls.
pub fn tags_to_calls(source: &str) -> String {
    convert(source, 0, false).0
}

/// Copy code from `start`, converting elements on the way. With `until_brace`
/// it stops at the `}` closing the current expression and returns its index.
fn convert(src: &str, start: usize, until_brace: bool) -> (String, usize) {
    let bytes = src.as_bytes();
    let mut out = String::new();
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                let end = skip_quoted(bytes, i);
                out.push_str(&src[i..end]);
                i = end;
            }
            b'`' => i = template(src, i, &mut out),
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = skip_line(bytes, i);
                out.push_str(&src[i..end]);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = skip_block_comment(src, i);
                out.push_str(&src[i..end]);
                i = end;
            }
            b'{' => {
                depth += 1;
                out.push('{');
                i += 1;
            }
            b'}' => {
                if depth == 0 && until_brace {
                    return (out, i);
                }
                depth = depth.saturating_sub(1);
                out.push('}');
                i += 1;
            }
            b'<' if opens_tag(bytes, i) && in_expression_position(&out) => match parse_element(src, i) {
                Some((call, end)) => {
                    out.push_str(&call);
                    i = end;
                }
                None => {
                    out.push('<');
                    i += 1;
                }
            },
            _ => {
                let Some(c) = src[i..].chars().next() else {
                    break;
                };
                out.push(c);
                i += c.len_utf8();
            }
        }
    }
    (out, i)
}

/// Parse one element starting at its `<`; returns the call and the index
/// after the element. `None` when the text turns out not to be an element.
fn parse_element(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut i = start + 1;

    if bytes.get(i) == Some(&b'>') {
        let (children, end) = parse_children(src, i + 1)?;
        return Some((call("Fragment", &[], &children), end));
    }

    let name_end = scan_name(bytes, i);
    if name_end == i {
        return None;
    }
    let name = &src[i..name_end];
    i = name_end;

    let mut props = Vec::new();
    loop {
        i = skip_ws(bytes, i);
        match *bytes.get(i)? {
            b'/' => {
                if bytes.get(i + 1) != Some(&b'>') {
                    return None;
                }
                return Some((call(name, &props, &[]), i + 2));
            }
            b'>' => {
                let (children, end) = parse_children(src, i + 1)?;
                return Some((call(name, &props, &children), end));
            }
            b'{' => {
                let (expr, end) = convert(src, i + 1, true);
                if end >= bytes.len() {
                    return None;
                }
                let spread = expr.trim().strip_prefix("...")?;
                props.push(format!("...{}", spread.trim()));
                i = end + 1;
            }
            _ => {
                let attr_end = scan_name(bytes, i);
                if attr_end == i {
                    return None;
                }
                let attr = &src[i..attr_end];
                i = skip_ws(bytes, attr_end);
                if bytes.get(i) == Some(&b'=') {
                    let (value, end) = attribute_value(src, skip_ws(bytes, i + 1))?;
                    props.push(format!("{}: {value}", prop_key(attr)));
                    i = end;
                } else {
                    props.push(format!("{}: true", prop_key(attr)));
                }
            }
        }
    }
}

fn attribute_value(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    match *bytes.get(start)? {
        quote @ (b'"' | b'\'') => {
            let close = bytes[start + 1..].iter().position(|&b| b == quote)? + start + 1;
            Some((js_string(&decode_entities(&src[start + 1..close])), close + 1))
        }
        b'{' => {
            let (expr, end) = convert(src, start + 1, true);
            if end >= bytes.len() {
                return None;
            }
            Some((expr.trim().to_string(), end + 1))
        }
        b'<' => parse_element(src, start),
        _ => None,
    }
}

fn parse_children(src: &str, start: usize) -> Option<(Vec<String>, usize)> {
    let bytes = src.as_bytes();
    let mut children = Vec::new();
    let mut i = start;

    loop {
        match *bytes.get(i)? {
            b'<' if bytes.get(i + 1) == Some(&b'/') => {
                let close = src[i..].find('>')? + i;
                return Some((children, close + 1));
            }
            b'<' => {
                let (child, end) = parse_element(src, i)?;
                children.push(child);
                i = end;
            }
            b'{' => {
                let (expr, end) = convert(src, i + 1, true);
                if end >= bytes.len() {
                    return None;
                }
                if let Some(expr) = expression_child(&expr) {
                    children.push(expr);
                }
                i = end + 1;
            }
            _ => {
                let end = src[i..]
                    .find(|c: char| c == '<' || c == '{')
                    .map_or(bytes.len(), |p| p + i);
                if let Some(text) = jsx_text(&src[i..end]) {
                    children.push(text);
                }
                i = end;
            }
        }
    }
}

fn call(name: &str, props: &[String], children: &[String]) -> String {
    let mut out = format!("h({}, ", element_type(name));
    if props.is_empty() {
        out.push_str("null");
    } else {
        out.push_str(&format!("{{ {} }}", props.join(", ")));
    }
    for child in children {
        out.push_str(", ");
        out.push_str(child);
    }
    out.push(')');
    out
}

/// Intrinsic elements are lowercase and become strings; components stay references.
fn element_type(name: &str) -> String {
    let intrinsic = name.starts_with(|c: char| c.is_ascii_lowercase()) && !name.contains('.');
    if intrinsic {
        js_string(name)
    } else {
        name.to_string()
    }
}

fn prop_key(attr: &str) -> String {
    match attr {
        "class" => "className".to_string(),
        "for" => "htmlFor".to_string(),
        _ if is_identifier(attr) => attr.to_string(),
        _ => js_string(attr),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// `{}` and `{/* note */}` produce no child.
fn expression_child(expr: &str) -> Option<String> {
    let expr = expr.trim();
    let comment_only = (expr.starts_with("/*") && expr.ends_with("*/"))
        || (expr.starts_with("//") && !expr.contains('\n'));
    if expr.is_empty() || comment_only {
        None
    } else {
        Some(expr.to_string())
    }
}

/// Text children follow the usual whitespace rules: lines are trimmed where
/// they meet a line break, blank lines vanish, and the rest join with a space.
fn jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last = lines.len() - 1;
    let mut parts = Vec::new();

    for (n, line) in lines.iter().enumerate() {
        let mut text = *line;
        if n > 0 {
            text = text.trim_start();
        }
        if n < last {
            text = text.trim_end();
        }
        if !text.is_empty() {
            parts.push(text);
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(js_string(&decode_entities(&parts.join(" "))))
    }
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('\u{a9}'),
        "hellip" => Some('\u{2026}'),
        "middot" => Some('\u{b7}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn template(src: &str, start: usize, out: &mut String) -> usize {
    let bytes = src.as_bytes();
    let mut i = start + 1;
    let mut run = start;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                out.push_str(&src[run..=i]);
                return i + 1;
            }
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                out.push_str(&src[run..i + 2]);
                let (inner, end) = convert(src, i + 2, true);
                out.push_str(&inner);
                if end < bytes.len() {
                    out.push('}');
                }
                i = end + 1;
                run = i.min(bytes.len());
            }
            _ => i += 1,
        }
    }
    out.push_str(&src[run.min(bytes.len())..]);
    bytes.len()
}

/// An unterminated string ends at the line break.
pub(super) fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

pub(super) fn skip_line(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| start + p)
}

pub(super) fn skip_block_comment(src: &str, start: usize) -> usize {
    src[start + 2..].find("*/").map_or(src.len(), |p| start + 2 + p + 2)
}

pub(super) fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

pub(super) fn scan_name(bytes: &[u8], mut i: usize) -> usize {
    while bytes
        .get(i)
        .is_some_and(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.' | b':' | b'-'))
    {
        i += 1;
    }
    i
}

pub(super) fn opens_tag(bytes: &[u8], i: usize) -> bool {
    bytes
        .get(i + 1)
        .is_some_and(|&b| b == b'>' || b.is_ascii_alphabetic() || b == b'_')
}

/// `<` starts an element only where an expression may begin; after an
/// identifier, number or closing bracket it is a comparison.
pub(super) fn in_expression_position(out: &str) -> bool {
    let before = out.trim_end();
    let Some(last) = before.chars().last() else {
        return true;
    };
    if "([{,=:?&|!>;".contains(last) {
        return true;
    }
    let word_start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '$')
        .last()
        .map_or(before.len(), |(i, _)| i);
    matches!(
        &before[word_start..],
        "return" | "yield" | "default" | "case" | "else" | "await"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_expression_children() {
        assert_eq!(
            tags_to_calls(r#"<div className="box">Hello {name}!</div>"#),
            r#"h("div", { className: "box" }, "Hello ", name, "!")"#
        );
    }

    #[test]
    fn test_arrow_attribute_and_boolean_attribute() {
        assert_eq!(
            tags_to_calls("const App = () => <button onClick={() => setOpen(!open)} disabled>Go</button>;"),
            r#"const App = () => h("button", { onClick: () => setOpen(!open), disabled: true }, "Go");"#
        );
    }

    #[test]
    fn test_elements_inside_map_callback() {
        let source = "<ul>\n  {items.map((item) => (\n    <li key={item.id}>{item.label}</li>\n  ))}\n</ul>";
        assert_eq!(
            tags_to_calls(source),
            "h(\"ul\", null, items.map((item) => (\n    h(\"li\", { key: item.id }, item.label)\n  )))"
        );
    }

    #[test]
    fn test_comparisons_and_strings_untouched() {
        let source = "if (a < b && c > d) { return i<n; }\nconst s = \"<div>\";\nfor (let i = 0; i < 10; i++) {}";
        assert_eq!(tags_to_calls(source), source);
    }

    #[test]
    fn test_fragments_and_self_closing() {
        assert_eq!(
            tags_to_calls("return (<>\n  <A />\n  <B x=\"1\" />\n</>);"),
            r#"return (h(Fragment, null, h(A, null), h(B, { x: "1" })));"#
        );
    }

    #[test]
    fn test_multiline_text_collapses() {
        assert_eq!(
            tags_to_calls("<p>\n  Hello\n  world\n</p>"),
            r#"h("p", null, "Hello world")"#
        );
    }

    #[test]
    fn test_apostrophes_and_entities_in_text() {
        assert_eq!(
            tags_to_calls("<p>Don't &amp; won't</p>"),
            r#"h("p", null, "Don't & won't")"#
        );
    }

    #[test]
    fn test_spread_and_element_props() {
        assert_eq!(
            tags_to_calls("<Card {...props} title={t} icon={<Star size={16} />} />"),
            "h(Card, { ...props, title: t, icon: h(Star, { size: 16 }) })"
        );
    }

    #[test]
    fn test_attribute_keys() {
        assert_eq!(
            tags_to_calls(r#"<input class="x" data-id={1} aria-hidden />"#),
            r#"h("input", { className: "x", "data-id": 1, "aria-hidden": true })"#
        );
    }

    #[test]
    fn test_comment_children_and_member_tags() {
        assert_eq!(
            tags_to_calls("<Layout.Main>{/* body */}<b>{`n=${count}`}</b></Layout.Main>"),
            "h(Layout.Main, null, h(\"b\", null, `n=${count}`))"
        );
    }
}
