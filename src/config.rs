use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{StepTraceError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity and location of the analyzed project
    pub project: ProjectConfig,

    /// Source analysis settings
    pub analysis: AnalysisConfig,

    /// Report sinks
    pub reporters: ReportersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, reported as `AnalyzedProject`
    pub name: String,

    /// Project version, reported as `Version`
    pub version: String,

    /// Root directory walked for Java sources
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Java language level of the analyzed sources (JAVA_8 .. JAVA_17)
    pub language_level: String,

    /// Simple type names to analyze; empty means every type
    #[serde(default)]
    pub filter: Vec<String>,

    /// Packages whose `<package>.<lang>` sub-packages hold step annotations
    pub step_annotation_packages: Vec<String>,

    /// Packages whose `<package>.<Lang>` interfaces register lambda steps
    pub registration_interface_packages: Vec<String>,

    /// Fully qualified name of the automation target annotation
    pub automation_target_annotation: String,

    /// Additional source roots resolved as non-local dependencies
    #[serde(default)]
    pub library_roots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportersConfig {
    /// Print the invocation trees to stdout
    pub console: bool,

    /// Base URL of the remote report service
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                name: "unnamed-project".to_string(),
                version: "0.0.0".to_string(),
                root: PathBuf::from("."),
            },
            analysis: AnalysisConfig {
                language_level: "JAVA_11".to_string(),
                filter: Vec::new(),
                step_annotation_packages: vec![
                    "cucumber.api.java".to_string(),
                    "io.cucumber.java".to_string(),
                ],
                registration_interface_packages: vec![
                    "cucumber.api.java8".to_string(),
                    "io.cucumber.java8".to_string(),
                ],
                automation_target_annotation:
                    "io.github.augurk.javaanalyzer.annotations.AutomationTarget".to_string(),
                library_roots: Vec::new(),
            },
            reporters: ReportersConfig {
                console: false,
                remote_url: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StepTraceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                let candidates = ["steptrace.toml", ".steptrace.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    /// Remote URL, treating a blank value as absent
    pub fn remote_url(&self) -> Option<&str> {
        self.reporters
            .remote_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_survives_a_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("steptrace.toml");

        Config::default().save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.analysis.language_level, "JAVA_11");
        assert_eq!(loaded.analysis.step_annotation_packages.len(), 2);
        assert!(loaded.remote_url().is_none());
    }

    #[test]
    fn partial_file_uses_serde_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("steptrace.toml");
        std::fs::write(
            &path,
            r#"
[project]
name = "cucumis"
version = "1.2.0"
root = "src"

[analysis]
language_level = "8"
step_annotation_packages = ["cucumber.api.java"]
registration_interface_packages = ["cucumber.api.java8"]
automation_target_annotation = "com.acme.Target"

[reporters]
console = true
remote_url = "   "
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.project.name, "cucumis");
        assert!(config.analysis.filter.is_empty());
        assert!(config.analysis.library_roots.is_empty());
        assert!(config.remote_url().is_none());
    }

    #[test]
    fn missing_explicit_path_falls_back_to_defaults() {
        let config = Config::load_or_default(Some("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.project.version, "0.0.0");
    }
}
