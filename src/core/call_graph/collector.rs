// src/core/call_graph/collector.rs
use tracing::{debug, warn};

use super::automation_target::AutomationTarget;
use super::invocation::{AnalysisReport, ArgumentType, Invocation, InvokedMethod};

type FrameId = usize;

/// One open call on the collector's stack
#[derive(Debug)]
struct Frame {
    /// Node without children; children are linked through `children`
    invocation: Invocation,
    children: Vec<FrameId>,
    parent: Option<FrameId>,
    argument_types: Vec<ArgumentType>,
}

/// Stack-shaped builder of the invocation tree of the current entry point
///
/// Frames live in an arena that is cleared when the root closes, so parent
/// links are plain indices.
pub struct InvocationCollector {
    project_name: String,
    version: String,
    frames: Vec<Frame>,
    current: Option<FrameId>,
    /// Identities of the methods currently stepped into, for recursion detection
    call_stack: Vec<InvokedMethod>,
    automation_target: Option<AutomationTarget>,
    root_invocations: Vec<Invocation>,
}

impl InvocationCollector {
    pub fn new(project_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            version: version.into(),
            frames: Vec::new(),
            current: None,
            call_stack: Vec::new(),
            automation_target: None,
            root_invocations: Vec::new(),
        }
    }

    /// Opens a root invocation and makes it the current frame
    pub fn begin_root(&mut self, signature: &str, step_text: &str, automation_target: Option<AutomationTarget>) {
        if !self.frames.is_empty() {
            warn!("Root {} opened before the previous root was closed", signature);
        }
        self.frames.clear();
        self.frames.push(Frame {
            invocation: Invocation::root(signature, step_text),
            children: Vec::new(),
            parent: None,
            argument_types: Vec::new(),
        });
        self.current = Some(0);
        self.call_stack.clear();
        self.automation_target = automation_target;
    }

    /// Appends `method` to the current frame and steps into it
    pub fn collect(&mut self, method: InvokedMethod) {
        let Some(parent) = self.current else {
            warn!("Ignoring {} collected outside of a root invocation", method.signature);
            return;
        };

        let id = self.frames.len();
        self.frames.push(Frame {
            invocation: method.to_invocation(),
            children: Vec::new(),
            parent: Some(parent),
            argument_types: method.argument_types.clone(),
        });
        self.frames[parent].children.push(id);
        self.call_stack.push(method);
        self.current = Some(id);
    }

    /// Returns to the parent frame; stays put at the root
    pub fn step_out(&mut self) {
        self.call_stack.pop();
        if let Some(current) = self.current {
            self.current = Some(self.frames[current].parent.unwrap_or(current));
        }
    }

    pub fn is_already_collected(&self, method: &InvokedMethod) -> bool {
        self.call_stack.contains(method)
    }

    /// Actual argument type bound to a parameter declared as `qualified_name`
    /// in the nearest enclosing frame that refines it, else the name itself
    pub fn actual_type_for(&self, qualified_name: &str) -> String {
        let mut frame = self.current;
        while let Some(id) = frame {
            let refined = self.frames[id].argument_types.iter().find(|argument| {
                erasure_of(&argument.declared) == qualified_name && erasure_of(&argument.actual) != qualified_name
            });
            if let Some(argument) = refined {
                return erasure_of(&argument.actual).to_string();
            }
            frame = self.frames[id].parent;
        }
        qualified_name.to_string()
    }

    /// Number of frames above the root
    pub fn depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Closes the root: reconciles its automation target and adds it to the report
    pub fn end_root(&mut self) {
        if self.frames.is_empty() {
            warn!("No root invocation to close");
            return;
        }

        let mut root = self.build(0);
        if let Some(target) = self.automation_target.take() {
            root.automation_targets = target.select(&root);
            debug!("Automation targets of {}: {:?}", root.signature, root.automation_targets);
        }
        self.root_invocations.push(root);

        self.frames.clear();
        self.current = None;
        self.call_stack.clear();
    }

    fn build(&self, id: FrameId) -> Invocation {
        let frame = &self.frames[id];
        let mut invocation = frame.invocation.clone();
        invocation.invocations = frame.children.iter().map(|child| self.build(*child)).collect();
        invocation
    }

    pub fn root_invocations(&self) -> &[Invocation] {
        &self.root_invocations
    }

    /// Completed roots as a report stamped with the current time
    pub fn into_report(self) -> AnalysisReport {
        AnalysisReport::new(self.project_name, self.version, self.root_invocations)
    }
}

fn erasure_of(type_name: &str) -> &str {
    type_name.split('<').next().unwrap_or(type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::call_graph::automation_target::OverloadHandling;
    use crate::core::call_graph::invocation::InvocationKind;

    fn method(signature: &str, arguments: &[(&str, &str)]) -> InvokedMethod {
        InvokedMethod {
            declaring_type: signature.rsplit_once('.').map(|(owner, _)| owner.to_string()).unwrap_or_default(),
            signature: signature.to_string(),
            kind: InvocationKind::Public,
            interface_definitions: Vec::new(),
            argument_types: arguments
                .iter()
                .map(|(declared, actual)| ArgumentType {
                    declared: declared.to_string(),
                    actual: actual.to_string(),
                })
                .collect(),
            local: true,
        }
    }

    #[test]
    fn builds_the_tree_in_collection_order() {
        let mut collector = InvocationCollector::new("garden", "1.0");
        collector.begin_root("garden.Steps.water()", "W", None);
        collector.collect(method("garden.Gardener.water()", &[]));
        collector.collect(method("garden.Gherkin.grow()", &[]));
        collector.step_out();
        collector.collect(method("garden.Gherkin.wilt()", &[]));
        collector.step_out();
        collector.step_out();
        collector.collect(method("garden.Gardener.rest()", &[]));
        collector.step_out();
        collector.end_root();

        let root = &collector.root_invocations()[0];
        assert!(root.is_root());
        assert_eq!(root.step_text.as_deref(), Some("W"));
        let children: Vec<&str> = root.invocations.iter().map(|i| i.signature.as_str()).collect();
        assert_eq!(children, vec!["garden.Gardener.water()", "garden.Gardener.rest()"]);
        let grandchildren: Vec<&str> = root.invocations[0].invocations.iter().map(|i| i.signature.as_str()).collect();
        assert_eq!(grandchildren, vec!["garden.Gherkin.grow()", "garden.Gherkin.wilt()"]);
    }

    #[test]
    fn step_out_at_the_root_stays_at_the_root() {
        let mut collector = InvocationCollector::new("garden", "1.0");
        collector.begin_root("garden.Steps.water()", "W", None);
        collector.step_out();
        collector.step_out();
        collector.collect(method("garden.Gardener.water()", &[]));
        assert_eq!(collector.depth(), 1);
        collector.end_root();

        assert_eq!(collector.root_invocations()[0].invocations.len(), 1);
    }

    #[test]
    fn detects_methods_already_on_the_stack() {
        let mut collector = InvocationCollector::new("garden", "1.0");
        collector.begin_root("garden.Steps.hello()", "W", None);
        let hello = method("garden.RecursivePerson.sayHello()", &[]);
        assert!(!collector.is_already_collected(&hello));
        collector.collect(hello.clone());
        assert!(collector.is_already_collected(&hello));
        collector.step_out();
        assert!(!collector.is_already_collected(&hello));
        collector.end_root();
    }

    #[test]
    fn actual_type_comes_from_the_nearest_refining_frame() {
        let mut collector = InvocationCollector::new("garden", "1.0");
        collector.begin_root("garden.Steps.water()", "W", None);
        collector.collect(method(
            "garden.Gardener.water(garden.Plant)",
            &[("garden.Plant", "garden.Melothria")],
        ));
        collector.collect(method("garden.Plant.grow(garden.Plant)", &[("garden.Plant", "garden.Plant")]));

        assert_eq!(collector.actual_type_for("garden.Plant"), "garden.Melothria");
        assert_eq!(collector.actual_type_for("garden.Gardener"), "garden.Gardener");

        collector.collect(method(
            "garden.Plant.graft(garden.Plant)",
            &[("garden.Plant", "garden.PickyPlant<garden.Seed>")],
        ));
        assert_eq!(collector.actual_type_for("garden.Plant"), "garden.PickyPlant");
        collector.end_root();
    }

    #[test]
    fn end_root_reconciles_the_automation_target() {
        let mut collector = InvocationCollector::new("garden", "1.0");
        let target = AutomationTarget {
            declaring_type: "garden.Gardener".to_string(),
            target_methods: vec!["garden.Gardener.water()".to_string()],
            overload_handling: OverloadHandling::All,
        };
        collector.begin_root("garden.Steps.water()", "W", Some(target));
        collector.collect(method("garden.Gardener.water()", &[]));
        collector.step_out();
        collector.end_root();

        collector.begin_root("garden.Steps.rest()", "R", None);
        collector.collect(method("garden.Gardener.water()", &[]));
        collector.end_root();

        let report = collector.into_report();
        assert_eq!(report.project_name, "garden");
        assert_eq!(report.root_invocations[0].automation_targets, vec!["garden.Gardener.water()"]);
        assert!(report.root_invocations[1].automation_targets.is_empty());
    }
}
