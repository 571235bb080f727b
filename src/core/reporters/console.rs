use tracing::info;

use super::Reporter;
use crate::core::call_graph::{AnalysisReport, Invocation};
use crate::error::Result;

const WIDTH: usize = 72;

/// Prints every root invocation and its call tree to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    /// Text written by [`Reporter::report`]
    pub fn render(&self, report: &AnalysisReport) -> String {
        let separator = "-".repeat(WIDTH);
        let mut lines = vec![
            separator.clone(),
            format!("CONSOLE REPORTER, project: {}, version: {}", report.project_name, report.version),
            separator,
        ];

        for root in &report.root_invocations {
            lines.push(format!(
                "ROOT: {} (automationTargets: [{}])",
                root.signature,
                root.automation_targets.join(", ")
            ));
            render_children(root, 0, &mut lines);
        }

        let mut rendered = lines.join("\n");
        rendered.push('\n');
        rendered
    }
}

fn render_children(invocation: &Invocation, level: usize, lines: &mut Vec<String>) {
    for child in &invocation.invocations {
        lines.push(format!("{}... {}", ".".repeat(level * 3), child.signature));
        render_children(child, level + 1, lines);
    }
}

#[async_trait::async_trait]
impl Reporter for ConsoleReporter {
    fn name(&self) -> &str {
        "console"
    }

    async fn report(&self, report: &AnalysisReport) -> Result<()> {
        print!("{}", self.render(report));
        info!("Printed {} root invocations", report.root_invocations.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::call_graph::InvocationKind;

    #[test]
    fn indents_children_by_depth() {
        let mut root = Invocation::root("garden.Steps.water()", "W");
        root.automation_targets = vec!["garden.Gardener.water(garden.Plant)".to_string()];
        let mut first = Invocation::call(InvocationKind::Public, "garden.Gardener.water(garden.Plant)", true, Vec::new());
        first
            .invocations
            .push(Invocation::call(InvocationKind::Private, "garden.Plant.soak()", true, Vec::new()));
        root.invocations.push(first);
        root.invocations
            .push(Invocation::call(InvocationKind::Public, "garden.Gardener.rest()", true, Vec::new()));

        let report = AnalysisReport::new("garden", "1.0", vec![root]);
        let rendered = ConsoleReporter::new().render(&report);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "-".repeat(72));
        assert_eq!(lines[1], "CONSOLE REPORTER, project: garden, version: 1.0");
        assert_eq!(
            lines[3],
            "ROOT: garden.Steps.water() (automationTargets: [garden.Gardener.water(garden.Plant)])"
        );
        assert_eq!(lines[4], "... garden.Gardener.water(garden.Plant)");
        assert_eq!(lines[5], "...... garden.Plant.soak()");
        assert_eq!(lines[6], "... garden.Gardener.rest()");
    }
}
