use regex::Regex;

use crate::error::{StepTraceError, Result};
use super::options::AnalyzeOptions;

/// Compiled matchers shared by the detectors and the resolver
#[derive(Debug, Clone)]
pub struct Patterns {
    step_annotation_package: Regex,
    registration_interface: Regex,
    automation_target: Regex,
    super_call: Regex,
}

impl Patterns {
    pub fn new(options: &AnalyzeOptions) -> Result<Self> {
        Ok(Self {
            step_annotation_package: compile(&format!(
                r"^(?:{})\.([^.]+)$",
                alternatives(&options.step_annotation_packages)
            ))?,
            registration_interface: compile(&format!(
                r"^(?:{})\.([^.]+)$",
                alternatives(&options.registration_interface_packages)
            ))?,
            automation_target: compile(&format!(
                "^{}$",
                regex::escape(&options.automation_target_annotation)
            ))?,
            super_call: compile(r"^(?s:(?:.*\.)?super\..*)$")?,
        })
    }

    /// Language code of a step annotation package such as `cucumber.api.java.en`
    pub fn step_language(&self, package: &str) -> Option<String> {
        self.step_annotation_package
            .captures(package)
            .map(|captures| captures[1].to_lowercase())
    }

    /// Language code of a registration interface such as `cucumber.api.java8.En`
    pub fn registration_language(&self, qualified_name: &str) -> Option<String> {
        self.registration_interface
            .captures(qualified_name)
            .map(|captures| captures[1].to_lowercase())
    }

    pub fn is_automation_target(&self, qualified_name: &str) -> bool {
        self.automation_target.is_match(qualified_name)
    }

    pub fn is_super_call(&self, call_text: &str) -> bool {
        self.super_call.is_match(call_text)
    }
}

fn alternatives(packages: &[String]) -> String {
    if packages.is_empty() {
        // matches nothing
        return r"\b\B".to_string();
    }
    packages
        .iter()
        .map(|package| regex::escape(package))
        .collect::<Vec<_>>()
        .join("|")
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| StepTraceError::Config(format!("invalid pattern {}: {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Patterns {
        Patterns::new(&AnalyzeOptions::for_root(".")).unwrap()
    }

    #[test]
    fn step_packages_capture_the_language_code() {
        let patterns = patterns();
        assert_eq!(patterns.step_language("cucumber.api.java.en").as_deref(), Some("en"));
        assert_eq!(patterns.step_language("io.cucumber.java.nl").as_deref(), Some("nl"));
        assert_eq!(patterns.step_language("cucumber.api.java"), None);
        assert_eq!(patterns.step_language("cucumber.api.java8.en"), None);
        assert_eq!(patterns.step_language("com.acme.steps.en"), None);
    }

    #[test]
    fn registration_interfaces_are_lower_cased() {
        let patterns = patterns();
        assert_eq!(patterns.registration_language("cucumber.api.java8.En").as_deref(), Some("en"));
        assert_eq!(patterns.registration_language("io.cucumber.java8.Nl").as_deref(), Some("nl"));
        assert_eq!(patterns.registration_language("java.lang.Runnable"), None);
    }

    #[test]
    fn super_calls_are_recognized_with_and_without_qualifier() {
        let patterns = patterns();
        assert!(patterns.is_super_call("super.grow()"));
        assert!(patterns.is_super_call("Outer.super.grow()"));
        assert!(!patterns.is_super_call("superb.grow()"));
        assert!(!patterns.is_super_call("this.grow()"));
    }

    #[test]
    fn automation_target_requires_the_exact_name() {
        let patterns = patterns();
        assert!(patterns.is_automation_target("io.github.augurk.javaanalyzer.annotations.AutomationTarget"));
        assert!(!patterns.is_automation_target("AutomationTarget"));
    }

    #[test]
    fn empty_package_list_matches_nothing() {
        let mut options = AnalyzeOptions::for_root(".");
        options.registration_interface_packages.clear();
        let patterns = Patterns::new(&options).unwrap();
        assert_eq!(patterns.registration_language("cucumber.api.java8.En"), None);
    }
}
