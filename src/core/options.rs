use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::Config;
use crate::error::{StepTraceError, Result};

/// Java language level the analyzed sources are written against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LanguageLevel {
    Java8,
    Java9,
    Java10,
    Java11,
    Java12,
    Java13,
    Java14,
    Java15,
    Java16,
    Java17,
}

impl LanguageLevel {
    pub fn release(self) -> u8 {
        match self {
            LanguageLevel::Java8 => 8,
            LanguageLevel::Java9 => 9,
            LanguageLevel::Java10 => 10,
            LanguageLevel::Java11 => 11,
            LanguageLevel::Java12 => 12,
            LanguageLevel::Java13 => 13,
            LanguageLevel::Java14 => 14,
            LanguageLevel::Java15 => 15,
            LanguageLevel::Java16 => 16,
            LanguageLevel::Java17 => 17,
        }
    }

    fn from_release(release: u8) -> Option<Self> {
        Some(match release {
            8 => LanguageLevel::Java8,
            9 => LanguageLevel::Java9,
            10 => LanguageLevel::Java10,
            11 => LanguageLevel::Java11,
            12 => LanguageLevel::Java12,
            13 => LanguageLevel::Java13,
            14 => LanguageLevel::Java14,
            15 => LanguageLevel::Java15,
            16 => LanguageLevel::Java16,
            17 => LanguageLevel::Java17,
            _ => return None,
        })
    }

    /// `var` became a reserved type name in Java 10
    pub fn supports_local_type_inference(self) -> bool {
        self >= LanguageLevel::Java10
    }
}

impl FromStr for LanguageLevel {
    type Err = StepTraceError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        let number = normalized
            .strip_prefix("JAVA_")
            .or_else(|| normalized.strip_prefix("JAVA"))
            .unwrap_or(&normalized);
        let number = number.strip_prefix("1.").unwrap_or(number);

        number
            .parse::<u8>()
            .ok()
            .and_then(Self::from_release)
            .ok_or_else(|| StepTraceError::UnsupportedLanguageLevel(value.to_string()))
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JAVA_{}", self.release())
    }
}

/// Validated options for one analysis run
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub project_name: String,
    pub version: String,
    pub root: PathBuf,
    pub language_level: LanguageLevel,
    /// Simple type names to analyze; empty means every type
    pub filter: Vec<String>,
    pub step_annotation_packages: Vec<String>,
    pub registration_interface_packages: Vec<String>,
    pub automation_target_annotation: String,
    pub library_roots: Vec<PathBuf>,
}

impl AnalyzeOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        let language_level = config.analysis.language_level.parse()?;

        if config.analysis.step_annotation_packages.is_empty()
            && config.analysis.registration_interface_packages.is_empty()
        {
            return Err(StepTraceError::Config(
                "at least one step annotation or registration interface package is required".to_string(),
            ));
        }

        Ok(Self {
            project_name: config.project.name.clone(),
            version: config.project.version.clone(),
            root: config.project.root.clone(),
            language_level,
            filter: config.analysis.filter.clone(),
            step_annotation_packages: config.analysis.step_annotation_packages.clone(),
            registration_interface_packages: config.analysis.registration_interface_packages.clone(),
            automation_target_annotation: config.analysis.automation_target_annotation.clone(),
            library_roots: config.analysis.library_roots.clone(),
        })
    }

    /// Options with default packages for a project rooted at `root`
    pub fn for_root<P: Into<PathBuf>>(root: P) -> Self {
        let defaults = Config::default();
        Self {
            project_name: defaults.project.name,
            version: defaults.project.version,
            root: root.into(),
            language_level: LanguageLevel::Java11,
            filter: Vec::new(),
            step_annotation_packages: defaults.analysis.step_annotation_packages,
            registration_interface_packages: defaults.analysis.registration_interface_packages,
            automation_target_annotation: defaults.analysis.automation_target_annotation,
            library_roots: Vec::new(),
        }
    }

    pub fn accepts_type(&self, simple_name: &str) -> bool {
        self.filter.is_empty() || self.filter.iter().any(|name| name == simple_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_accepted_spellings() {
        assert_eq!("JAVA_8".parse::<LanguageLevel>().unwrap(), LanguageLevel::Java8);
        assert_eq!("java_11".parse::<LanguageLevel>().unwrap(), LanguageLevel::Java11);
        assert_eq!("12".parse::<LanguageLevel>().unwrap(), LanguageLevel::Java12);
        assert_eq!("1.8".parse::<LanguageLevel>().unwrap(), LanguageLevel::Java8);
        assert_eq!(" Java17 ".parse::<LanguageLevel>().unwrap(), LanguageLevel::Java17);
    }

    #[test]
    fn rejects_unknown_levels() {
        for value in ["JAVA_7", "21", "kotlin", ""] {
            let err = value.parse::<LanguageLevel>().unwrap_err();
            assert!(matches!(err, StepTraceError::UnsupportedLanguageLevel(_)), "{}", value);
        }
    }

    #[test]
    fn var_inference_starts_at_java_10() {
        assert!(!LanguageLevel::Java9.supports_local_type_inference());
        assert!(LanguageLevel::Java10.supports_local_type_inference());
        assert_eq!(LanguageLevel::Java10.to_string(), "JAVA_10");
    }

    #[test]
    fn unknown_level_in_config_is_fatal() {
        let mut config = Config::default();
        config.analysis.language_level = "JAVA_99".to_string();
        assert!(AnalyzeOptions::from_config(&config).is_err());
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let mut options = AnalyzeOptions::for_root(".");
        assert!(options.accepts_type("Anything"));
        options.filter = vec!["GardenSteps".to_string()];
        assert!(options.accepts_type("GardenSteps"));
        assert!(!options.accepts_type("Gardener"));
    }
}
