use tracing::warn;

use super::invocation::Invocation;

/// Which of several matching overloads a step is traced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverloadHandling {
    First,
    Last,
    #[default]
    All,
}

impl OverloadHandling {
    /// Parses an enum constant name; unknown names fall back to `All`
    pub fn from_name(name: &str) -> Self {
        match name {
            "FIRST" => OverloadHandling::First,
            "LAST" => OverloadHandling::Last,
            "ALL" => OverloadHandling::All,
            other => {
                warn!("⚠️  Unknown overload handling '{}', using ALL", other);
                OverloadHandling::All
            }
        }
    }
}

/// The method a step declares as its logical target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationTarget {
    pub declaring_type: String,
    /// Qualified signatures of every overload of the target method
    pub target_methods: Vec<String>,
    pub overload_handling: OverloadHandling,
}

impl AutomationTarget {
    /// Signatures of the root's descendants matching a target overload, in
    /// depth-first insertion order, reduced by the overload handling
    pub fn select(&self, root: &Invocation) -> Vec<String> {
        let mut matches = root
            .descendants()
            .into_iter()
            .filter(|invocation| self.target_methods.contains(&invocation.signature))
            .map(|invocation| invocation.signature.clone());

        match self.overload_handling {
            OverloadHandling::First => matches.next().into_iter().collect(),
            OverloadHandling::Last => vec![matches.last().unwrap_or_default()],
            OverloadHandling::All => matches.collect(),
        }
    }
}
