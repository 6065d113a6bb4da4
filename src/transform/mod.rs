//! Best-effort rewriting of generated component sources into scripts a
//! browser runs without a build step.

pub mod exports;
pub mod imports;
pub mod jsx;
mod literals;
pub mod single_file;
pub mod types;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::PreviewConfig;
use exports::Export;
use imports::js_string;

/// A rewrite of one source file. Never fails: syntax it does not
/// recognize is passed through unchanged.
pub trait SourceTransform {
    fn transform(&self, path: &str, source: &str) -> String;
}

/// How a preview turns the generated files into scripts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformStrategy {
    /// Every module is rewritten here and registers its exports.
    #[default]
    Registry,
    /// Only the entry file is prepared; the frame transpiles it.
    SingleFile,
}

impl fmt::Display for TransformStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => write!(f, "registry"),
            Self::SingleFile => write!(f, "single-file"),
        }
    }
}

/// Output of the registry strategy for one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformedModule {
    pub script: String,
    pub exports: Vec<Export>,
}

impl TransformedModule {
    pub fn default_export(&self) -> Option<&Export> {
        self.exports.iter().find(|e| e.is_default)
    }
}

pub struct RegistryTransform<'a> {
    config: &'a PreviewConfig,
}

impl<'a> RegistryTransform<'a> {
    pub fn new(config: &'a PreviewConfig) -> Self {
        Self { config }
    }

    pub fn transform_module(&self, path: &str, source: &str) -> TransformedModule {
        let code = types::strip_types(source);
        let code = imports::rewrite_global_imports(&code, self.config);
        let code = imports::rewrite_local_imports(&code);
        let (code, exports) = exports::rewrite_exports(&code, &exports::module_name(path));
        let code = jsx::tags_to_calls(&code);

        TransformedModule {
            script: wrap_module(path, &code),
            exports,
        }
    }
}

impl SourceTransform for RegistryTransform<'_> {
    fn transform(&self, path: &str, source: &str) -> String {
        self.transform_module(path, source).script
    }
}

pub struct SingleFileTransform;

impl SourceTransform for SingleFileTransform {
    fn transform(&self, _path: &str, source: &str) -> String {
        single_file::prepare(source)
    }
}

/// Isolate a module so a throw is reported and later modules still run.
/// The body is emitted as is; indenting it would change multi-line template text.
fn wrap_module(path: &str, code: &str) -> String {
    format!(
        "// {path}\n(function () {{\n  try {{\n{}\n  }} catch (error) {{\n    __appforge.showError({}, error);\n  }}\n}})();\n",
        code.trim_end(),
        js_string(path)
    )
}
