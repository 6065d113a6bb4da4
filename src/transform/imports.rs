use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::config::PreviewConfig;

static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+([^'";]*?)\s*from\s*['"]([^'"\n]+)['"][ \t]*;?"#).expect("valid regex")
});

static SIDE_EFFECT_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s*['"]([^'"\n]+)['"][ \t]*;?[ \t]*\r?\n?"#).expect("valid regex")
});

const ASSET_EXTENSIONS: &[&str] = &[
    ".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".ico", ".css", ".json",
];

/// The bindings an import statement introduces.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportClause {
    pub default: Option<String>,
    pub namespace: Option<String>,
    /// `(imported, local)` pairs.
    pub named: Vec<(String, String)>,
}

impl ImportClause {
    pub fn parse(clause: &str) -> Self {
        let mut parsed = Self::default();
        let mut rest = clause.to_string();

        if let (Some(open), Some(close)) = (clause.find('{'), clause.rfind('}')) {
            if open < close {
                for item in clause[open + 1..close].split(',') {
                    let item = item.trim();
                    // Inline `type X` specifiers have no runtime value
                    if item.is_empty() || item.starts_with("type ") {
                        continue;
                    }
                    let (imported, local) = match item.split_once(" as ") {
                        Some((imported, local)) => (imported.trim(), local.trim()),
                        None => (item, item),
                    };
                    parsed.named.push((imported.to_string(), local.to_string()));
                }
                rest = format!("{}{}", &clause[..open], &clause[close + 1..]);
            }
        }

        for part in rest.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(ns) = part.strip_prefix('*') {
                let ns = ns.trim().trim_start_matches("as").trim();
                parsed.namespace = Some(ns.to_string());
            } else {
                parsed.default = Some(part.to_string());
            }
        }
        parsed
    }
}

/// Named and default imports of shimmed modules become reads from their globals.
pub fn rewrite_global_imports(source: &str, config: &PreviewConfig) -> String {
    IMPORT_FROM
        .replace_all(source, |caps: &Captures<'_>| {
            let Some(global) = config.global_for(&caps[2]) else {
                return caps[0].to_string();
            };
            let clause = ImportClause::parse(&caps[1]);
            let mut statements = Vec::new();

            for local in clause.default.iter().chain(clause.namespace.iter()) {
                // `import React from 'react'` would shadow the global it reads
                if local != global {
                    statements.push(format!("const {local} = {global};"));
                }
            }
            if !clause.named.is_empty() {
                statements.push(format!("const {{ {} }} = {global};", destructure(&clause.named)));
            }
            statements.join(" ")
        })
        .into_owned()
}

/// Default (and named) imports of project files become registry lookups.
/// Side-effect imports are dropped, assets become their path, and packages
/// the preview cannot provide get a visible placeholder.
pub fn rewrite_local_imports(source: &str) -> String {
    let source = SIDE_EFFECT_IMPORT.replace_all(source, "");

    IMPORT_FROM
        .replace_all(&source, |caps: &Captures<'_>| {
            let specifier = &caps[2];
            let clause = ImportClause::parse(&caps[1]);
            let quoted = js_string(specifier);
            let mut statements = Vec::new();

            if is_asset(specifier) {
                if let Some(local) = &clause.default {
                    statements.push(format!("const {local} = {quoted};"));
                }
            } else if is_local(specifier) {
                if let Some(local) = &clause.default {
                    statements.push(format!("const {local} = __appforge.resolve({quoted});"));
                }
                if let Some(ns) = &clause.namespace {
                    statements.push(format!("const {ns} = __appforge.components;"));
                }
                for (imported, local) in &clause.named {
                    statements.push(format!(
                        "const {local} = __appforge.resolve({quoted}, {});",
                        js_string(imported)
                    ));
                }
            } else {
                for local in clause.default.iter().chain(clause.namespace.iter()) {
                    statements.push(format!("const {local} = __appforge.missing({quoted});"));
                }
                if !clause.named.is_empty() {
                    statements.push(format!(
                        "const {{ {} }} = __appforge.missing({quoted});",
                        destructure(&clause.named)
                    ));
                }
            }
            statements.join(" ")
        })
        .into_owned()
}

fn destructure(named: &[(String, String)]) -> String {
    named
        .iter()
        .map(|(imported, local)| {
            if imported == local {
                imported.clone()
            } else {
                format!("{imported}: {local}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn is_local(specifier: &str) -> bool {
    specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with("@/")
        || specifier.starts_with("~/")
}

fn is_asset(specifier: &str) -> bool {
    let lower = specifier.to_ascii_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clause_forms() {
        let clause = ImportClause::parse("React, { useState, useEffect as effect, type FC }");
        assert_eq!(clause.default.as_deref(), Some("React"));
        assert_eq!(
            clause.named,
            vec![
                ("useState".to_string(), "useState".to_string()),
                ("useEffect".to_string(), "effect".to_string()),
            ]
        );

        let clause = ImportClause::parse("* as Icons");
        assert_eq!(clause.namespace.as_deref(), Some("Icons"));
        assert!(clause.default.is_none());
    }

    #[test]
    fn test_global_named_imports_destructure() {
        let config = PreviewConfig::default();
        let source = "import React, { useState } from 'react';\nimport { BrowserRouter as Router, Route } from \"react-router-dom\";\nimport { Star } from 'lucide-react';";
        assert_eq!(
            rewrite_global_imports(source, &config),
            "const { useState } = React;\nconst { BrowserRouter: Router, Route } = __appforge.router;\nconst { Star } = __appforge.icons;"
        );
    }

    #[test]
    fn test_multiline_named_import() {
        let config = PreviewConfig::default();
        let source = "import {\n  useState,\n  useMemo,\n} from 'react';";
        assert_eq!(
            rewrite_global_imports(source, &config),
            "const { useState, useMemo } = React;"
        );
    }

    #[test]
    fn test_local_and_foreign_imports() {
        let source = "import './index.css';\nimport Header from './components/Header';\nimport { Card, Badge as Tag } from '@/components/ui';\nimport logo from './logo.svg';\nimport axios from 'axios';\nimport React from 'react';";
        assert_eq!(
            rewrite_local_imports(source),
            "const Header = __appforge.resolve(\"./components/Header\");\nconst Card = __appforge.resolve(\"@/components/ui\", \"Card\"); const Tag = __appforge.resolve(\"@/components/ui\", \"Badge\");\nconst logo = \"./logo.svg\";\nconst axios = __appforge.missing(\"axios\");\nconst React = __appforge.missing(\"react\");"
        );
    }
}
