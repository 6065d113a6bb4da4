//! Assembles a self-contained preview document from a snapshot.

pub mod registry;

use serde::Serialize;
use tracing::{debug, info};

use crate::accumulator::{GeneratedFile, Snapshot};
use crate::config::PreviewConfig;
use crate::templates;
use crate::transform::{RegistryTransform, SingleFileTransform, SourceTransform, TransformStrategy};
pub use registry::ComponentRegistry;

/// Shown when single-file mode has nothing to run.
pub const MISSING_ENTRY_MESSAGE: &str =
    "No App.tsx or App.jsx file found. Generate an application with an App component to see a preview.";

const ENTRY_FILES: &[&str] = &["App.tsx", "App.jsx"];
const ENTRY_SCRIPT_ID: &str = "appforge-entry";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PreviewOutcome {
    #[serde(rename_all = "camelCase")]
    Ready { entry: Option<String>, modules: usize },
    MissingEntry { message: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBuild {
    pub outcome: PreviewOutcome,
    /// Full HTML document, absent when there is nothing to show.
    pub document: Option<String>,
    /// `<iframe>` element carrying the document.
    pub frame: Option<String>,
    pub logs: Vec<String>,
}

/// Progress lines for one build, mirrored to tracing.
#[derive(Default)]
struct BuildLog {
    lines: Vec<String>,
}

impl BuildLog {
    fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{line}");
        self.lines.push(line);
    }
}

/// Stateless: every call builds a new document from scratch.
#[derive(Clone, Debug, Default)]
pub struct PreviewHost {
    config: PreviewConfig,
}

impl PreviewHost {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, snapshot: &Snapshot, mode: TransformStrategy) -> PreviewBuild {
        let mut log = BuildLog::default();
        log.push(format!("Scanning {} files...", snapshot.code_files().count()));

        let entry = find_entry(snapshot);
        match entry {
            Some(file) => log.push(format!("Entry point detected: {}", file.filename)),
            None => log.push("No entry point found"),
        }

        let (outcome, document) = match (mode, entry) {
            (TransformStrategy::SingleFile, None) => (
                PreviewOutcome::MissingEntry {
                    message: MISSING_ENTRY_MESSAGE.to_string(),
                },
                None,
            ),
            (TransformStrategy::SingleFile, Some(file)) => {
                log.push(format!("Preparing preview environment ({mode})..."));
                let document = self.single_file_document(snapshot, file);
                log.push("Transformed 1 modules");
                (
                    PreviewOutcome::Ready {
                        entry: Some(file.filename.clone()),
                        modules: 1,
                    },
                    Some(document),
                )
            }
            (TransformStrategy::Registry, entry) => {
                log.push(format!("Preparing preview environment ({mode})..."));
                let (document, modules) = self.registry_document(snapshot);
                log.push(format!("Transformed {modules} modules"));
                (
                    PreviewOutcome::Ready {
                        entry: entry.map(|f| f.filename.clone()),
                        modules,
                    },
                    Some(document),
                )
            }
        };

        let frame = document.as_deref().map(templates::frame);
        if document.is_some() {
            log.push("Preview ready");
        }

        PreviewBuild {
            outcome,
            document,
            frame,
            logs: log.lines,
        }
    }

    fn registry_document(&self, snapshot: &Snapshot) -> (String, usize) {
        let transform = RegistryTransform::new(&self.config);
        let mut registry = ComponentRegistry::new();
        let mut scripts = Vec::new();

        for file in snapshot.code_files().filter(|f| is_script(&f.filename)) {
            if is_bootstrap(file) {
                debug!(path = %file.filename, "skipping bootstrap module");
                continue;
            }
            let module = transform.transform_module(&file.filename, &file.content);
            registry.record(&file.filename, &module);
            scripts.push(templates::inline_script(&module.script));
        }

        let head = [
            templates::external_script(&self.config.react_url),
            templates::external_script(&self.config.react_dom_url),
            templates::inline_script(templates::shim_runtime()),
            templates::inline_script(&registry.to_script()),
            templates::inline_style(&stylesheets(snapshot)),
        ]
        .join("\n");

        let modules = scripts.len();
        scripts.push(templates::inline_script(&templates::mount_script(self.config.mount_delay_ms)));
        (templates::page(&head, &scripts.join("\n")), modules)
    }

    fn single_file_document(&self, snapshot: &Snapshot, entry: &GeneratedFile) -> String {
        let source = SingleFileTransform.transform(&entry.filename, &entry.content);

        let head = [
            templates::external_script(&self.config.react_url),
            templates::external_script(&self.config.react_dom_url),
            templates::external_script(&self.config.babel_url),
            templates::inline_script(templates::shim_runtime()),
            templates::inline_style(&stylesheets(snapshot)),
        ]
        .join("\n");

        let body = [
            templates::babel_source(ENTRY_SCRIPT_ID, &entry.filename, &source),
            templates::inline_script(&format!(
                "{}\n{}",
                templates::single_file_runner(ENTRY_SCRIPT_ID, &entry.filename),
                templates::mount_script(self.config.mount_delay_ms)
            )),
        ]
        .join("\n");

        templates::page(&head, &body)
    }
}

/// The shortest `App.tsx`/`App.jsx` path; the first one seen on a tie.
pub fn find_entry(snapshot: &Snapshot) -> Option<&GeneratedFile> {
    snapshot
        .code_files()
        .filter(|f| {
            let name = f.filename.rsplit('/').next().unwrap_or_default();
            ENTRY_FILES.contains(&name)
        })
        .min_by_key(|f| f.filename.len())
}

fn is_script(filename: &str) -> bool {
    let scripted = [".ts", ".tsx", ".js", ".jsx"]
        .iter()
        .any(|ext| filename.ends_with(ext));
    scripted && !filename.ends_with(".d.ts")
}

/// Entry scripts that mount the app themselves, and tool configuration.
fn is_bootstrap(file: &GeneratedFile) -> bool {
    let name = file.filename.rsplit('/').next().unwrap_or_default();
    name.contains(".config.")
        || file.content.contains("createRoot(")
        || file.content.contains("ReactDOM.render(")
}

fn stylesheets(snapshot: &Snapshot) -> String {
    snapshot
        .code_files()
        .filter(|f| f.filename.ends_with(".css"))
        .map(|f| f.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::STATUS_FILE;

    fn snapshot(files: &[(&str, &str)]) -> Snapshot {
        files
            .iter()
            .map(|(filename, content)| GeneratedFile {
                filename: filename.to_string(),
                content: content.to_string(),
            })
            .collect()
    }

    fn project() -> Snapshot {
        snapshot(&[
            (STATUS_FILE, "{\"code\":\"Generating components\"}"),
            ("src/main.tsx", "import ReactDOM from 'react-dom/client';\nimport App from './App';\nReactDOM.createRoot(document.getElementById('root')!).render(<App />);\n"),
            ("src/components/Header.tsx", "export default function Header({ title }: { title: string }) {\n  return <h1>{title}</h1>;\n}\n"),
            ("src/App.tsx", "import Header from './components/Header';\nexport default function App() {\n  return <Header title=\"Hi\" />;\n}\n"),
            ("src/index.css", "body { margin: 0; }"),
            ("src/vite-env.d.ts", "/// <reference types=\"vite/client\" />"),
            ("vite.config.ts", "export default {};"),
        ])
    }

    #[test]
    fn test_registry_build() {
        let build = PreviewHost::default().build(&project(), TransformStrategy::Registry);

        assert_eq!(
            build.outcome,
            PreviewOutcome::Ready {
                entry: Some("src/App.tsx".into()),
                modules: 2
            }
        );
        assert_eq!(
            build.logs,
            vec![
                "Scanning 6 files...",
                "Entry point detected: src/App.tsx",
                "Preparing preview environment (registry)...",
                "Transformed 2 modules",
                "Preview ready",
            ]
        );

        let document = build.document.unwrap();
        let shim = document.find("window.__appforge = window.__appforge || {};\n  forge.components").unwrap();
        let aliases = document.find("\"components/Header\":\"Header\"").unwrap();
        let css = document.find("body { margin: 0; }").unwrap();
        let header = document.find("// src/components/Header.tsx").unwrap();
        let app = document.find("// src/App.tsx").unwrap();
        let mount = document.find("window.__appforge.mount(100);").unwrap();
        assert!(shim < aliases && aliases < css && css < header && header < app && app < mount);
        assert!(!document.contains("// src/main.tsx"));
        assert!(!document.contains("vite/client"));
        assert!(!document.contains("Generating components"));

        let frame = build.frame.unwrap();
        assert!(frame.starts_with("<iframe sandbox=\"allow-scripts\""));
        assert!(frame.contains("srcdoc=\"&lt;!DOCTYPE html&gt;"));
    }

    #[test]
    fn test_single_file_build() {
        let build = PreviewHost::default().build(&project(), TransformStrategy::SingleFile);
        let document = build.document.unwrap();

        assert!(document.contains("<script type=\"text/babel\" id=\"appforge-entry\" data-filename=\"src/App.tsx\">"));
        assert!(document.contains("function App() {\n  return <Header title=\"Hi\" />;\n}"));
        assert!(document.contains("babel.min.js"));
        assert!(document.contains("window.__appforge.runSingle(\"appforge-entry\", \"src/App.tsx\");"));
        assert!(!document.contains("// src/components/Header.tsx"));
        assert_eq!(build.logs[2], "Preparing preview environment (single-file)...");
    }

    #[test]
    fn test_single_file_without_entry() {
        let files = snapshot(&[("src/Main.tsx", "export default () => null;")]);
        let build = PreviewHost::default().build(&files, TransformStrategy::SingleFile);

        assert_eq!(
            build.outcome,
            PreviewOutcome::MissingEntry {
                message: MISSING_ENTRY_MESSAGE.into()
            }
        );
        assert!(build.document.is_none());
        assert!(build.frame.is_none());
        assert_eq!(build.logs, vec!["Scanning 1 files...", "No entry point found"]);
    }

    #[test]
    fn test_shortest_entry_wins() {
        let files = snapshot(&[
            ("src/legacy/App.jsx", "export default () => null;"),
            ("src/App.tsx", "export default () => null;"),
            ("src/Apps.tsx", "export default () => null;"),
        ]);
        assert_eq!(find_entry(&files).map(|f| f.filename.as_str()), Some("src/App.tsx"));
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome = PreviewOutcome::Ready {
            entry: None,
            modules: 3,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({"kind": "ready", "entry": null, "modules": 3})
        );
    }
}
