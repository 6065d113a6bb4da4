use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::imports::js_string;

static REEXPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*export\s+(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*['"][^'"\n]+['"][ \t]*;?[ \t]*\r?\n?"#)
        .expect("valid regex")
});

static DEFAULT_NAMED_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+default\s+((?:async\s+)?function\s*\*?\s*|class\s+)([A-Za-z_$][\w$]*)")
        .expect("valid regex")
});

static DEFAULT_ANONYMOUS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+default\s+((?:async\s+)?function(?:\s*\*)?|class)\s*([({])").expect("valid regex")
});

static DEFAULT_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+default\s+([A-Za-z_$][\w$]*)[ \t]*;?[ \t]*$").expect("valid regex")
});

static DEFAULT_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)export\s+default\s+").expect("valid regex"));

static NAMED_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+((?:async\s+)?function\s*\*?\s*|class\s+|(?:const|let|var)\s+)([A-Za-z_$][\w$]*)")
        .expect("valid regex")
});

static EXPORT_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*export\s*\{([^}]*)\}[ \t]*;?").expect("valid regex"));

static EXPORT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)export\s+").expect("valid regex"));

/// Binding for an anonymous default export expression.
pub const DEFAULT_LOCAL: &str = "__default";

/// One name a module makes available to the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    /// Name the component is registered under.
    pub name: String,
    /// Binding inside the module that holds the value.
    pub local: String,
    pub is_default: bool,
}

impl Export {
    fn new(name: &str, local: &str, is_default: bool) -> Self {
        Self {
            name: name.to_string(),
            local: local.to_string(),
            is_default,
        }
    }
}

/// Drop the `export` keywords, keeping each declaration, and append one
/// `__appforge.register` call per exported name. Anonymous defaults are
/// bound and registered as `fallback_name`.
pub fn rewrite_exports(source: &str, fallback_name: &str) -> (String, Vec<Export>) {
    let mut exports = Vec::new();

    let code = REEXPORT_FROM.replace_all(source, "");
    let code = DEFAULT_NAMED_DECL.replace_all(&code, |caps: &Captures<'_>| {
        exports.push(Export::new(&caps[3], &caps[3], true));
        format!("{}{}{}", &caps[1], &caps[2], &caps[3])
    });
    let code = DEFAULT_ANONYMOUS_DECL.replace_all(&code, |caps: &Captures<'_>| {
        exports.push(Export::new(fallback_name, fallback_name, true));
        let gap = if &caps[3] == "{" { " " } else { "" };
        format!("{}{} {fallback_name}{gap}{}", &caps[1], &caps[2], &caps[3])
    });
    let code = DEFAULT_IDENT.replace_all(&code, |caps: &Captures<'_>| {
        exports.push(Export::new(&caps[2], &caps[2], true));
        String::new()
    });
    let code = DEFAULT_EXPRESSION.replace_all(&code, |caps: &Captures<'_>| {
        exports.push(Export::new(fallback_name, DEFAULT_LOCAL, true));
        format!("{}const {DEFAULT_LOCAL} = ", &caps[1])
    });
    let code = NAMED_DECL.replace_all(&code, |caps: &Captures<'_>| {
        exports.push(Export::new(&caps[3], &caps[3], false));
        format!("{}{}{}", &caps[1], &caps[2], &caps[3])
    });
    let code = EXPORT_LIST.replace_all(&code, |caps: &Captures<'_>| {
        for item in caps[1].split(',').map(str::trim).filter(|i| !i.is_empty()) {
            match item.split_once(" as ") {
                Some((local, "default")) => exports.push(Export::new(local.trim(), local.trim(), true)),
                Some((local, name)) => exports.push(Export::new(name.trim(), local.trim(), false)),
                None => exports.push(Export::new(item, item, false)),
            }
        }
        String::new()
    });
    // Destructured and other unnamed forms lose only the keyword
    let mut code = EXPORT_KEYWORD.replace_all(&code, "${1}").into_owned();

    let mut registered = Vec::new();
    for export in &exports {
        if registered.contains(&export.name) {
            continue;
        }
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&format!(
            "__appforge.register({}, {});\n",
            js_string(&export.name),
            export.local
        ));
        registered.push(export.name.clone());
    }

    (code, exports)
}

/// Identifier a module's anonymous default export is registered under:
/// the file stem, or the directory name for `index` files, in PascalCase.
pub fn module_name(path: &str) -> String {
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    let file = segments.next().unwrap_or_default();
    let stem = file.split('.').next().unwrap_or_default();
    let stem = if stem == "index" {
        segments.next().unwrap_or(stem)
    } else {
        stem
    };

    let mut name = String::new();
    let mut upper = true;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            if upper {
                name.extend(c.to_uppercase());
            } else {
                name.push(c);
            }
            upper = false;
        } else {
            upper = true;
        }
    }

    match name.chars().next() {
        None => "Module".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{name}"),
        Some(_) => name,
    }
}
