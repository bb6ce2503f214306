//! Settings file.
//!
//! Lives at `<config dir>/dqltools/config.toml`. A missing file means
//! defaults: no store timeout, no external parser and no store program.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ast::adapter::ProcessParser;
use crate::store::ProcessExecutor;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Upper bound on a single store call, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<ProgramCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<ProgramCommand>,
}

/// An external program and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramCommand {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dqltools")
            .join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Invalid settings file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }

    pub fn parser(&self) -> Option<ProcessParser> {
        self.parser
            .as_ref()
            .map(|command| ProcessParser::new(&command.program, command.args.clone()))
    }

    pub fn store(&self) -> Option<ProcessExecutor> {
        self.store
            .as_ref()
            .map(|command| ProcessExecutor::new(&command.program, command.args.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("dqltools-{}-{}", std::process::id(), name))
            .join("config.toml")
    }

    #[test]
    fn test_missing_file_is_default() {
        let settings = Settings::load_from(&scratch("missing")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.store_timeout().is_none());
        assert!(settings.parser().is_none());
        assert!(settings.store().is_none());
    }

    #[test]
    fn test_parse_settings() {
        let settings: Settings = toml::from_str(
            r#"
            store_timeout_ms = 1500

            [parser]
            program = "/usr/local/bin/dql-parse"
            args = ["--json"]

            [store]
            program = "dql-run"
            "#,
        )
        .unwrap();
        assert_eq!(settings.store_timeout(), Some(Duration::from_millis(1500)));
        let command = settings.parser.as_ref().unwrap();
        assert_eq!(command.program, PathBuf::from("/usr/local/bin/dql-parse"));
        assert_eq!(command.args, vec!["--json".to_string()]);
        let store = settings.store().unwrap();
        assert_eq!(store.program(), Path::new("dql-run"));
    }

    #[test]
    fn test_save_and_load() {
        let path = scratch("roundtrip");
        let settings = Settings {
            store_timeout_ms: Some(250),
            parser: Some(ProgramCommand {
                program: PathBuf::from("dql-parse"),
                args: vec![],
            }),
            store: Some(ProgramCommand {
                program: PathBuf::from("dql-run"),
                args: vec!["--endpoint".to_string(), "localhost:9080".to_string()],
            }),
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_file_names_path() {
        let path = scratch("invalid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "store_timeout_ms = \"soon\"").unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid settings file"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_config_path_location() {
        let path = Settings::config_path();
        assert!(path.ends_with("dqltools/config.toml"));
    }
}
