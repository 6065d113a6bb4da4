use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::literals::{Masked, PLACEHOLDER};

/// One type atom: a keyword type or a capitalized (possibly dotted, possibly
/// generic) name, with any number of `[]` suffixes.
const ATOM: &str = r"(?:string|number|boolean|any|void|unknown|never|object|bigint|symbol|[A-Z][\w.]*(?:<[^<>;=/]*(?:<[^<>;=/]*>[^<>;=/]*)*>)?)(?:\[\])*";

/// `| null`, `| undefined`, `| 'literal'` (possibly masked) and further atoms after the first.
const UNION_TAIL: &str = r#"(?:\s*\|\s*(?:null|undefined|'[^']*'|"[^"]*"|PLACEHOLDER|ATOM))*"#;

fn type_pattern() -> String {
    let tail = UNION_TAIL.replace("PLACEHOLDER", PLACEHOLDER).replace("ATOM", ATOM);
    format!("(?:{ATOM}){tail}")
}

static IMPORT_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*import\s+type\s[^;\n]*;?[ \t]*\r?\n?").expect("valid regex"));

static INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*(?:export\s+)?(?:declare\s+)?interface\s+\w+[^{]*\{.*?^\}[ \t]*;?[ \t]*\r?\n?")
        .expect("valid regex")
});

static OBJECT_TYPE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*(?:export\s+)?type\s+\w+(?:<[^>]*>)?\s*=\s*\{.*?^\}[ \t]*;?[ \t]*\r?\n?")
        .expect("valid regex")
});

static TYPE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?type\s+\w+(?:<[^>]*>)?\s*=[^;\n]*(?:\n[ \t]*\|[^;\n]*)*;?[ \t]*\r?\n?")
        .expect("valid regex")
});

static IMPORT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\b[^;'"]*?['"][^'"\n]+['"][ \t]*;?"#).expect("valid regex")
});

static GENERIC_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w)<(?:[\w\s.,|&\[\]'"?\x{E000}\x{E001}]|<[\w\s.,|&\[\]'"?\x{E000}\x{E001}]*>)*>\("#).expect("valid regex")
});

static FUNCTION_GENERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(function\s*[\w$]*)\s*<[^>(]*>\s*\(").expect("valid regex"));

static RETURN_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\)\s*:\s*(?:{}|\{{[^{{}}]*\}})\s*(=>|\{{)", type_pattern())).expect("valid regex")
});

static VAR_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(const|let|var)\s+([\w$]+|\[[^\]]*\]|\{{[^}}]*\}})\s*:\s*{}(\s*[=;])",
        type_pattern()
    ))
    .expect("valid regex")
});

static PARAM_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w$]*)(\s*)\(((?:[^()]|\([^()]*\))*)\)(\s*(?:=>|\{))").expect("valid regex")
});

/// Statements whose parenthesized condition is followed by a block.
const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "switch", "with"];

static AS_CAST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"([\w$)\]\x{{E001}}])\s+as\s+(?:const\b|{})", type_pattern())).expect("valid regex"));

static NON_NULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w\])])!([.\[)])").expect("valid regex"));

/// Remove type-only syntax so the result is plain script.
pub fn strip_types(source: &str) -> String {
    let source = IMPORT_TYPE.replace_all(source, "");
    let source = INTERFACE.replace_all(&source, "");
    let source = OBJECT_TYPE_ALIAS.replace_all(&source, "");
    let source = TYPE_ALIAS.replace_all(&source, "");

    // Import clauses use `as` for renaming, so annotations are only stripped between them
    map_outside_imports(&source, |segment| {
        let masked = Masked::new(segment);
        let code = GENERIC_CALL.replace_all(masked.code(), "${1}(");
        let code = FUNCTION_GENERIC.replace_all(&code, "${1}(");
        let code = RETURN_TYPE.replace_all(&code, ") ${1}");
        let code = VAR_ANNOTATION.replace_all(&code, "${1} ${2}${3}");
        let code = PARAM_LIST.replace_all(&code, |caps: &Captures<'_>| {
            if CONTROL_KEYWORDS.contains(&&caps[1]) {
                return caps[0].to_string();
            }
            format!("{}{}({}){}", &caps[1], &caps[2], strip_param_types(&caps[3]), &caps[4])
        });
        let code = AS_CAST.replace_all(&code, "${1}");
        let code = NON_NULL.replace_all(&code, "${1}${2}");
        masked.restore(&code)
    })
}

fn map_outside_imports(source: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for m in IMPORT_STATEMENT.find_iter(source) {
        out.push_str(&f(&source[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&f(&source[last..]));
    out
}

/// Drop `: Type` from each top-level parameter, keeping defaults. Colons
/// nested inside destructuring patterns are renames and stay.
fn strip_param_types(params: &str) -> String {
    if !params.contains(':') {
        return params.to_string();
    }

    let params_list = split_top_level(params, b',');
    // A colon after anything but a binding is a ternary or an object literal
    let all_bindings = params_list.iter().all(|param| match top_level_index(param, b':') {
        Some(colon) => is_binding(param[..colon].trim().trim_end_matches('?')),
        None => true,
    });
    if !all_bindings {
        return params.to_string();
    }

    params_list
        .into_iter()
        .map(|param| match top_level_index(param, b':') {
            Some(colon) => {
                let name = param[..colon].trim_end().trim_end_matches('?');
                let rest = &param[colon + 1..];
                match top_level_index(rest, b'=') {
                    Some(eq) => format!("{name} ={}", &rest[eq + 1..]),
                    None => name.to_string(),
                }
            }
            None => param.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn is_binding(name: &str) -> bool {
    let name = name.trim_start_matches("...");
    name.starts_with(['{', '[']) || (!name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'))
}

fn split_top_level(s: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let bytes = s.as_bytes();
    for (i, b) in bytes.iter().copied().enumerate() {
        match b {
            b'{' | b'[' | b'(' | b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b'}' | b']' | b')' | b'>' => depth -= 1,
            b if b == separator && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn top_level_index(s: &str, target: u8) -> Option<usize> {
    let mut depth = 0i32;
    let bytes = s.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        match *b {
            b'{' | b'[' | b'(' | b'<' => depth += 1,
            b'}' | b']' | b')' => depth -= 1,
            // `=>` inside a function type is not a default value
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b'>' => depth -= 1,
            b if b == target && depth == 0 => {
                if target == b'=' && bytes.get(i + 1) == Some(&b'>') {
                    continue;
                }
                return Some(i);
            }
            _ => {}
        }
    }
    None
}
