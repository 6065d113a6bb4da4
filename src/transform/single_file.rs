use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Name the entry component must end up bound to.
pub const ENTRY_COMPONENT: &str = "App";

const REACT_BINDINGS: &[&str] = &[
    "useState",
    "useEffect",
    "useContext",
    "useReducer",
    "useCallback",
    "useMemo",
    "useRef",
    "useLayoutEffect",
    "useId",
    "useTransition",
    "createContext",
    "forwardRef",
    "memo",
    "Fragment",
];

const ROUTER_BINDINGS: &[&str] = &["useNavigate", "useLocation", "useParams", "Navigate", "Outlet"];

static ANY_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\b[^;'"]*?['"][^'"\n]+['"][ \t]*;?[ \t]*\r?\n?"#).expect("valid regex")
});

static EXPORT_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*export\s*(?:\*|\{[^}]*\})(?:\s*from\s*['"][^'"\n]+['"])?[ \t]*;?[ \t]*\r?\n?"#)
        .expect("valid regex")
});

static DEFAULT_ANONYMOUS_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+default\s+(async\s+)?function\s*\(").expect("valid regex")
});

static DEFAULT_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+default\s+((?:async\s*)?\([^)]*\)\s*=>|(?:async\s+)?[\w$]+\s*=>)")
        .expect("valid regex")
});

static DEFAULT_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+default\s+([A-Za-z_$][\w$]*)[ \t]*;?[ \t]*\r?$\n?").expect("valid regex")
});

static EXPORT_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)export\s+(?:default\s+)?").expect("valid regex"));

static APP_DECLARED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:function\s*\*?\s*|class\s+|const\s+|let\s+|var\s+)App\b").expect("valid regex")
});

static ROUTER_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)(?:BrowserRouter|HashRouter|MemoryRouter|Router|Routes|Switch)\b").expect("valid regex")
});

static LINK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:NavLink|Link)\b([^>]*)>").expect("valid regex"));

static LINK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</(?:NavLink|Link)\s*>").expect("valid regex"));

static TO_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\s)to=").expect("valid regex"));

static ROUTE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(/?)Route\b").expect("valid regex"));

static BINDING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<&str> = REACT_BINDINGS.iter().chain(ROUTER_BINDINGS).copied().collect();
    Regex::new(&format!(r"\b(?:{})\b", names.join("|"))).expect("valid regex")
});

/// Prepare the entry file for the in-frame transpiler: tag syntax and types
/// stay, module syntax goes, routing collapses to plain elements, and the
/// hooks the file uses are bound from the globals.
pub fn prepare(source: &str) -> String {
    let code = ANY_IMPORT.replace_all(source, "");
    let code = EXPORT_LIST.replace_all(&code, "");
    let code = DEFAULT_ANONYMOUS_FUNCTION.replace_all(&code, |caps: &Captures<'_>| {
        let prefix = caps.get(2).map_or("", |m| m.as_str());
        format!("{}{prefix}function {ENTRY_COMPONENT}(", &caps[1])
    });
    let code = DEFAULT_ARROW.replace_all(&code, |caps: &Captures<'_>| {
        format!("{}const {ENTRY_COMPONENT} = {}", &caps[1], &caps[2])
    });
    let declares_app = APP_DECLARED.is_match(&code);
    let code = DEFAULT_IDENT.replace_all(&code, |caps: &Captures<'_>| {
        if &caps[1] == ENTRY_COMPONENT || declares_app {
            String::new()
        } else {
            format!("const {ENTRY_COMPONENT} = {};\n", &caps[1])
        }
    });
    let code = EXPORT_KEYWORDS.replace_all(&code, "${1}");

    let code = ROUTER_CONTAINER.replace_all(&code, "<${1}div");
    let code = LINK_OPEN.replace_all(&code, |caps: &Captures<'_>| {
        format!("<a{}>", TO_ATTR.replace_all(&caps[1], "${1}href="))
    });
    let code = LINK_CLOSE.replace_all(&code, "</a>");
    let code = ROUTE_TAG.replace_all(&code, "<${1}__Route");

    let mut prelude = String::new();
    let react = used(&code, REACT_BINDINGS);
    if !react.is_empty() {
        prelude.push_str(&format!("const {{ {} }} = React;\n", react.join(", ")));
    }
    let router = used(&code, ROUTER_BINDINGS);
    if !router.is_empty() {
        prelude.push_str(&format!("const {{ {} }} = __appforge.router;\n", router.join(", ")));
    }

    format!("{prelude}{code}")
}

/// The entries of `names` that occur in `code` as whole words, in `names` order.
fn used<'a>(code: &str, names: &[&'a str]) -> Vec<&'a str> {
    let found: HashSet<&str> = BINDING_NAME.find_iter(code).map(|m| m.as_str()).collect();
    names
        .iter()
        .copied()
        .filter(|name| found.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_modules_and_binds_hooks() {
        let source = "import React, { useState } from 'react';\nimport './App.css';\n\nexport default function App() {\n  const [n, setN] = useState<number>(0);\n  return <div>{n}</div>;\n}\n";
        assert_eq!(
            prepare(source),
            "const { useState } = React;\n\nfunction App() {\n  const [n, setN] = useState<number>(0);\n  return <div>{n}</div>;\n}\n"
        );
    }

    #[test]
    fn test_anonymous_defaults_become_app() {
        assert_eq!(prepare("export default function () { return null; }"), "function App() { return null; }");
        assert_eq!(prepare("export default () => <main />;"), "const App = () => <main />;");
    }

    #[test]
    fn test_default_identifier_is_aliased() {
        assert_eq!(
            prepare("const Root = () => null;\nexport default Root;\n"),
            "const Root = () => null;\nconst App = Root;\n"
        );
        assert_eq!(
            prepare("function App() {}\nexport default App;\n"),
            "function App() {}\n"
        );
    }

    #[test]
    fn test_routing_collapses_to_elements() {
        let source = "export default function App() {\n  return (\n    <BrowserRouter>\n      <NavLink to=\"/about\" className=\"nav\">About</NavLink>\n      <Routes>\n        <Route path=\"/\" element={<Home />} />\n      </Routes>\n    </BrowserRouter>\n  );\n}";
        assert_eq!(
            prepare(source),
            "function App() {\n  return (\n    <div>\n      <a href=\"/about\" className=\"nav\">About</a>\n      <div>\n        <__Route path=\"/\" element={<Home />} />\n      </div>\n    </div>\n  );\n}"
        );
    }

    #[test]
    fn test_bindings_match_whole_words_only() {
        let code = "const memoized = useMemoCache(); const ref = useRef(null); <Fragment />";
        assert_eq!(used(code, REACT_BINDINGS), vec!["useRef", "Fragment"]);
        assert!(used(code, ROUTER_BINDINGS).is_empty());
        assert_eq!(used("useNavigate(); Outlet", ROUTER_BINDINGS), vec!["useNavigate", "Outlet"]);
    }

    #[test]
    fn test_router_hooks_bound_from_shim() {
        let source = "export function Page() {\n  const navigate = useNavigate();\n  return null;\n}";
        assert_eq!(
            prepare(source),
            "const { useNavigate } = __appforge.router;\nfunction Page() {\n  const navigate = useNavigate();\n  return null;\n}"
        );
    }
}
