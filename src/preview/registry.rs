use indexmap::IndexMap;

use crate::transform::TransformedModule;

const SCRIPT_EXTENSIONS: &[&str] = &[".tsx", ".ts", ".jsx", ".js"];

/// Module key → default export name for one preview build. The shim's
/// `resolve()` consults this table to turn an import specifier into a
/// registered component.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    aliases: IndexMap<String, String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module's default export, if it has one.
    pub fn record(&mut self, path: &str, module: &TransformedModule) {
        if let Some(export) = module.default_export() {
            self.aliases.insert(module_key(path), export.name.clone());
        }
    }

    pub fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Script that installs the alias table in the frame.
    pub fn to_script(&self) -> String {
        let table = serde_json::to_string(&self.aliases).unwrap_or_else(|_| "{}".into());
        format!("window.__appforge = window.__appforge || {{}};\nwindow.__appforge.aliases = {table};")
    }
}

/// `src/components/Header.tsx` → `components/Header`; `src/pages/home/index.jsx` → `pages/home`.
pub fn module_key(path: &str) -> String {
    let key = path.trim_start_matches('/');
    let key = key.strip_prefix("src/").unwrap_or(key);
    let key = SCRIPT_EXTENSIONS
        .iter()
        .find_map(|ext| key.strip_suffix(ext))
        .unwrap_or(key);
    key.strip_suffix("/index").unwrap_or(key).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreviewConfig;
    use crate::transform::RegistryTransform;

    #[test]
    fn test_module_key() {
        assert_eq!(module_key("src/components/Header.tsx"), "components/Header");
        assert_eq!(module_key("/src/App.jsx"), "App");
        assert_eq!(module_key("src/pages/home/index.tsx"), "pages/home");
        assert_eq!(module_key("lib/types.d.ts"), "lib/types.d");
        assert_eq!(module_key("src/index.ts"), "index");
    }

    #[test]
    fn test_records_default_exports_only() {
        let config = PreviewConfig::default();
        let transform = RegistryTransform::new(&config);
        let mut registry = ComponentRegistry::new();

        let header = transform.transform_module("src/components/Header.tsx", "export default function Header() {}");
        let utils = transform.transform_module("src/utils.ts", "export const sum = (a, b) => a + b;");
        let card = transform.transform_module("src/components/card/index.tsx", "export default () => null;");
        registry.record("src/components/Header.tsx", &header);
        registry.record("src/utils.ts", &utils);
        registry.record("src/components/card/index.tsx", &card);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.to_script(),
            "window.__appforge = window.__appforge || {};\nwindow.__appforge.aliases = {\"components/Header\":\"Header\",\"components/card\":\"Card\"};"
        );
    }
}
