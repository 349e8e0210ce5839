//! Configuration file discovery and loading
//!
//! Search order:
//! 1. Explicit `--config` path (must exist)
//! 2. `umlgen.toml` in the current directory
//! 3. Platform config directory (`config.toml`)
//! 4. Built-in defaults

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::output::Format;

pub const LOCAL_CONFIG: &str = "umlgen.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub generator: GeneratorSettings,
    pub diagram: DiagramSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    pub tool_path: Option<PathBuf>,
    pub java_path: PathBuf,
    pub source_extensions: Vec<String>,
    pub timeout_secs: Option<u64>,
    pub verbose: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            tool_path: None,
            java_path: PathBuf::from("java"),
            source_extensions: vec!["java".to_string()],
            timeout_secs: None,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiagramSettings {
    pub include_relationships: bool,
}

impl Default for DiagramSettings {
    fn default() -> Self {
        Self {
            include_relationships: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub directory: Option<PathBuf>,
    pub auto_open_file: bool,
    pub workspace_root: Option<PathBuf>,
    pub format: Format,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: None,
            auto_open_file: true,
            workspace_root: None,
            format: Format::Text,
        }
    }
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "umlgen", "umlgen")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Path of the user-level config file
pub fn user_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Locate the config file that `load` would use, if any
pub fn find(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        return Ok(Some(local.to_path_buf()));
    }

    match user_config_path() {
        Ok(path) if path.exists() => Ok(Some(path)),
        Ok(path) => {
            debug!("No user config at {}", path.display());
            Ok(None)
        }
        Err(e) => {
            debug!("{}", e);
            Ok(None)
        }
    }
}

/// Load settings, falling back to defaults when no file is found
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    match find(explicit)? {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            load_file(&path)
        }
        None => {
            debug!("No configuration file found, using defaults");
            Ok(Settings::default())
        }
    }
}

pub fn load_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

pub fn parse(content: &str) -> Result<Settings> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.diagram.include_relationships);
        assert!(settings.output.auto_open_file);
        assert!(!settings.generator.verbose);
        assert_eq!(settings.generator.java_path, PathBuf::from("java"));
    }

    #[test]
    fn test_partial_config() {
        let settings = parse(
            r#"
[generator]
tool_path = "/opt/uml-generator.jar"
timeout_secs = 30

[diagram]
include_relationships = false

[output]
directory = "build/uml"
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(
            settings.generator.tool_path,
            Some(PathBuf::from("/opt/uml-generator.jar"))
        );
        assert_eq!(settings.generator.timeout_secs, Some(30));
        assert_eq!(settings.generator.source_extensions, vec!["java"]);
        assert!(!settings.diagram.include_relationships);
        assert_eq!(settings.output.directory, Some(PathBuf::from("build/uml")));
        assert!(settings.output.auto_open_file);
        assert_eq!(settings.output.format, Format::Json);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse("[generator]\njar = \"x\"\n").is_err());
    }

    #[test]
    fn test_template_parses() {
        let settings = parse(crate::commands::config::DEFAULT_CONFIG).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[generator]\nverbose = true\n").unwrap();

        let settings = load(Some(path.as_path())).unwrap();
        assert!(settings.generator.verbose);

        assert!(load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }
}
