use std::collections::HashMap;

/// Decides, for one spoken language, which step keyword names denote a WHEN step
pub trait StepKeywordStrategy: Send + Sync {
    /// Language code as it appears in the step annotation package, e.g. `en`
    fn language_code(&self) -> &str;

    /// Whether an annotation or registration method name is the WHEN keyword
    fn is_when_step(&self, name: &str) -> bool;
}

pub struct EnglishSteps;

impl StepKeywordStrategy for EnglishSteps {
    fn language_code(&self) -> &str {
        "en"
    }

    fn is_when_step(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("when")
    }
}

pub struct DutchSteps;

impl StepKeywordStrategy for DutchSteps {
    fn language_code(&self) -> &str {
        "nl"
    }

    fn is_when_step(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("als")
    }
}

/// Registered strategies by language code
pub struct StepStrategies {
    strategies: HashMap<String, Box<dyn StepKeywordStrategy>>,
}

impl StepStrategies {
    pub fn empty() -> Self {
        Self { strategies: HashMap::new() }
    }

    /// Adds a strategy, replacing any earlier one for the same language
    pub fn register(&mut self, strategy: Box<dyn StepKeywordStrategy>) {
        self.strategies.insert(strategy.language_code().to_ascii_lowercase(), strategy);
    }

    pub fn for_language(&self, code: &str) -> Option<&dyn StepKeywordStrategy> {
        self.strategies.get(&code.to_ascii_lowercase()).map(|strategy| strategy.as_ref())
    }
}

impl Default for StepStrategies {
    fn default() -> Self {
        let mut strategies = Self::empty();
        strategies.register(Box::new(EnglishSteps));
        strategies.register(Box::new(DutchSteps));
        strategies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_matches_when_only() {
        assert_eq!(EnglishSteps.language_code(), "en");
        assert!(EnglishSteps.is_when_step("When"));
        assert!(EnglishSteps.is_when_step("when"));
        assert!(!EnglishSteps.is_when_step("Given"));
        assert!(!EnglishSteps.is_when_step("invalid"));
    }

    #[test]
    fn dutch_matches_als() {
        assert!(DutchSteps.is_when_step("Als"));
        assert!(!DutchSteps.is_when_step("When"));
    }

    #[test]
    fn lookup_is_by_language_code() {
        let strategies = StepStrategies::default();
        assert!(strategies.for_language("en").is_some());
        assert!(strategies.for_language("NL").is_some());
        assert!(strategies.for_language("fr").is_none());
        assert!(StepStrategies::empty().for_language("en").is_none());
    }
}
