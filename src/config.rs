use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::util::expand_home;

/// Backend connection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub backend_url: String,
    pub generate_path: String,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".into(),
            generate_path: "/api/generate".into(),
            connect_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Full URL of the generation endpoint.
    pub fn endpoint(&self) -> Result<reqwest::Url> {
        let base = reqwest::Url::parse(&self.backend_url)
            .map_err(|e| AppError::Config(format!("backendUrl '{}': {e}", self.backend_url)))?;
        base.join(&self.generate_path)
            .map_err(|e| AppError::Config(format!("generatePath '{}': {e}", self.generate_path)))
    }
}

/// A module specifier the preview maps onto a global object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalModule {
    pub specifier: String,
    pub global: String,
}

impl GlobalModule {
    fn new(specifier: &str, global: &str) -> Self {
        Self {
            specifier: specifier.into(),
            global: global.into(),
        }
    }
}

/// Preview document settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewConfig {
    /// Delay before `App` is mounted, so every registration has run.
    pub mount_delay_ms: u64,
    pub react_url: String,
    pub react_dom_url: String,
    pub babel_url: String,
    pub globals: Vec<GlobalModule>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            mount_delay_ms: 100,
            react_url: "https://unpkg.com/react@18/umd/react.development.js".into(),
            react_dom_url: "https://unpkg.com/react-dom@18/umd/react-dom.development.js".into(),
            babel_url: "https://unpkg.com/@babel/standalone/babel.min.js".into(),
            globals: vec![
                GlobalModule::new("react", "React"),
                GlobalModule::new("react-dom", "ReactDOM"),
                GlobalModule::new("react-dom/client", "ReactDOM"),
                GlobalModule::new("react-router-dom", "__appforge.router"),
                GlobalModule::new("lucide-react", "__appforge.icons"),
            ],
        }
    }
}

impl PreviewConfig {
    /// Global expression for a module specifier, if it is one of the shimmed modules.
    pub fn global_for(&self, specifier: &str) -> Option<&str> {
        self.globals
            .iter()
            .find(|g| g.specifier == specifier)
            .map(|g| g.global.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub version: u32,
    pub client: ClientConfig,
    pub preview: PreviewConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            client: ClientConfig::default(),
            preview: PreviewConfig::default(),
            export_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from the default location; a missing file yields the defaults.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        config.client.endpoint()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()
            .ok_or_else(|| AppError::Custom("Cannot find home directory".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.client.endpoint()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Custom(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Directory exports land in when the user does not pick one.
    pub fn export_dir(&self) -> Option<PathBuf> {
        self.export_dir
            .as_deref()
            .map(expand_home)
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".appforge").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_path() {
        let config = ClientConfig {
            backend_url: "https://forge.example.com".into(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://forge.example.com/api/generate"
        );
    }

    #[test]
    fn test_invalid_backend_url() {
        let config = ClientConfig {
            backend_url: "not a url".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.endpoint(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"client": {"backendUrl": "http://10.0.0.2:9000"}, "preview": {"mountDelayMs": 250}}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.client.backend_url, "http://10.0.0.2:9000");
        assert_eq!(config.client.generate_path, "/api/generate");
        assert_eq!(config.preview.mount_delay_ms, 250);
        assert_eq!(config.preview.global_for("react"), Some("React"));
        assert_eq!(config.version, 1);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            export_dir: Some("/tmp/exports".into()),
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_export_dir_expands_home() {
        let config = AppConfig {
            export_dir: Some("~/exports".into()),
            ..AppConfig::default()
        };
        assert_eq!(
            config.export_dir(),
            dirs::home_dir().map(|h| h.join("exports"))
        );
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(AppError::Config(_))));
    }
}
