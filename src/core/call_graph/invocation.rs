// src/core/call_graph/invocation.rs
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::symbols::ResolvedMethod;
use crate::core::syntax::Access;
use crate::error::Result;

/// How an invocation was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationKind {
    /// Entry point of a step definition
    RootStep,
    Public,
    Private,
    Protected,
    PackagePrivate,
    #[default]
    Unknown,
}

impl InvocationKind {
    /// Name used in the report JSON
    pub fn wire_name(self) -> &'static str {
        match self {
            InvocationKind::RootStep => "When",
            InvocationKind::Public => "Public",
            InvocationKind::Private => "Private",
            InvocationKind::Protected | InvocationKind::PackagePrivate => "Internal",
            InvocationKind::Unknown => "None",
        }
    }

    /// `Internal` cannot tell protected from package-private and decodes as the latter
    pub fn from_wire(name: &str) -> Self {
        match name {
            "When" => InvocationKind::RootStep,
            "Public" => InvocationKind::Public,
            "Private" => InvocationKind::Private,
            "Internal" => InvocationKind::PackagePrivate,
            _ => InvocationKind::Unknown,
        }
    }

    pub fn from_access(access: Access) -> Self {
        match access {
            Access::Public => InvocationKind::Public,
            Access::Protected => InvocationKind::Protected,
            Access::PackagePrivate => InvocationKind::PackagePrivate,
            Access::Private => InvocationKind::Private,
        }
    }
}

impl Serialize for InvocationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for InvocationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(InvocationKind::from_wire(&name))
    }
}

/// One node of a reconstructed call tree
///
/// Equality is structural over the reported fields, so kinds compare by their
/// report name and a protected call equals its package-private decoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "InvocationWire")]
pub struct Invocation {
    pub kind: InvocationKind,

    /// Qualified signature, e.g. `garden.Gardener.water(garden.Plant)`
    pub signature: String,

    /// Whether the invoked method's source belongs to the analyzed project
    pub local: bool,

    /// Qualified signatures of the interface methods this method implements
    pub interface_definitions: Vec<String>,

    /// Step text, present on roots only
    pub step_text: Option<String>,

    /// Signatures selected by automation target reconciliation, roots only
    pub automation_targets: Vec<String>,

    /// Calls made by this method, in textual order
    pub invocations: Vec<Invocation>,
}

impl Invocation {
    pub fn root(signature: impl Into<String>, step_text: impl Into<String>) -> Self {
        Self {
            kind: InvocationKind::RootStep,
            signature: signature.into(),
            local: true,
            interface_definitions: Vec::new(),
            step_text: Some(step_text.into()),
            automation_targets: Vec::new(),
            invocations: Vec::new(),
        }
    }

    pub fn call(kind: InvocationKind, signature: impl Into<String>, local: bool, interface_definitions: Vec<String>) -> Self {
        Self {
            kind,
            signature: signature.into(),
            local,
            interface_definitions,
            step_text: None,
            automation_targets: Vec::new(),
            invocations: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.kind == InvocationKind::RootStep
    }

    /// Every descendant in depth-first pre-order
    pub fn descendants(&self) -> Vec<&Invocation> {
        let mut found = Vec::new();
        let mut pending: Vec<&Invocation> = self.invocations.iter().rev().collect();
        while let Some(invocation) = pending.pop() {
            found.push(invocation);
            pending.extend(invocation.invocations.iter().rev());
        }
        found
    }
}

impl PartialEq for Invocation {
    fn eq(&self, other: &Self) -> bool {
        self.kind.wire_name() == other.kind.wire_name()
            && self.signature == other.signature
            && self.local == other.local
            && self.interface_definitions == other.interface_definitions
            && self.step_text == other.step_text
            && self.automation_targets == other.automation_targets
            && self.invocations == other.invocations
    }
}

impl Serialize for Invocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.is_root() {
            let mut root = serializer.serialize_struct("Invocation", 5)?;
            root.serialize_field("Kind", &self.kind)?;
            root.serialize_field("Signature", &self.signature)?;
            root.serialize_field("RegularExpressions", &self.step_text.iter().collect::<Vec<_>>())?;
            root.serialize_field("AutomationTargets", &self.automation_targets)?;
            root.serialize_field("Invocations", &self.invocations)?;
            root.end()
        } else {
            let mut call = serializer.serialize_struct("Invocation", 5)?;
            call.serialize_field("Kind", &self.kind)?;
            call.serialize_field("Signature", &self.signature)?;
            call.serialize_field("InterfaceDefinitions", &self.interface_definitions)?;
            call.serialize_field("Local", &self.local)?;
            call.serialize_field("Invocations", &self.invocations)?;
            call.end()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InvocationWire {
    #[serde(default)]
    kind: InvocationKind,
    #[serde(default)]
    signature: String,
    #[serde(default)]
    local: bool,
    #[serde(default)]
    interface_definitions: Vec<String>,
    #[serde(default)]
    regular_expressions: Vec<String>,
    #[serde(default)]
    automation_targets: Vec<String>,
    #[serde(default)]
    invocations: Vec<Invocation>,
}

impl From<InvocationWire> for Invocation {
    fn from(wire: InvocationWire) -> Self {
        let is_root = wire.kind == InvocationKind::RootStep;
        Self {
            kind: wire.kind,
            signature: wire.signature,
            local: wire.local || is_root,
            interface_definitions: wire.interface_definitions,
            step_text: is_root.then(|| wire.regular_expressions.into_iter().next().unwrap_or_default()),
            automation_targets: wire.automation_targets,
            invocations: wire.invocations,
        }
    }
}

/// Result of one analysis run, in the layout the report service expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisReport {
    #[serde(rename = "AnalyzedProject")]
    pub project_name: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub root_invocations: Vec<Invocation>,
}

impl AnalysisReport {
    pub fn new(project_name: impl Into<String>, version: impl Into<String>, root_invocations: Vec<Invocation>) -> Self {
        Self {
            project_name: project_name.into(),
            version: version.into(),
            timestamp: Utc::now(),
            root_invocations,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Declared and actual type of one call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentType {
    pub declared: String,
    pub actual: String,
}

/// A method the resolver decided a call steps into
///
/// Equality is identity for recursion detection and deliberately ignores the
/// argument type values and any children.
#[derive(Debug, Clone)]
pub struct InvokedMethod {
    pub declaring_type: String,
    /// Qualified signature
    pub signature: String,
    pub kind: InvocationKind,
    pub interface_definitions: Vec<String>,
    pub argument_types: Vec<ArgumentType>,
    pub local: bool,
}

impl InvokedMethod {
    pub fn from_resolved(method: &ResolvedMethod, interface_definitions: Vec<String>, argument_types: Vec<ArgumentType>) -> Self {
        Self {
            declaring_type: method.declaring_type.clone(),
            signature: method.qualified_signature(),
            kind: if method.is_abstract {
                InvocationKind::Public
            } else {
                InvocationKind::from_access(method.access)
            },
            interface_definitions,
            argument_types,
            local: method.is_local(),
        }
    }

    pub fn to_invocation(&self) -> Invocation {
        Invocation::call(self.kind, self.signature.clone(), self.local, self.interface_definitions.clone())
    }
}

impl PartialEq for InvokedMethod {
    fn eq(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type
            && self.signature == other.signature
            && self.interface_definitions == other.interface_definitions
            && self.argument_types.len() == other.argument_types.len()
            && self.local == other.local
    }
}

impl Eq for InvokedMethod {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample_report() -> AnalysisReport {
        let mut root = Invocation::root("garden.Steps.water()", "^I water the plants$");
        root.automation_targets = vec!["garden.Gardener.water(garden.Plant)".to_string()];

        let mut water = Invocation::call(
            InvocationKind::Public,
            "garden.MockedGardener.waterPlants()",
            true,
            vec!["garden.Person.waterPlants()".to_string()],
        );
        water.invocations.push(Invocation::call(
            InvocationKind::PackagePrivate,
            "garden.Gherkin.grow()",
            true,
            Vec::new(),
        ));
        root.invocations.push(water);
        root.invocations.push(Invocation::call(
            InvocationKind::Public,
            "java.io.PrintStream.println(java.lang.String)",
            false,
            Vec::new(),
        ));

        AnalysisReport::new("garden", "1.0.0", vec![root])
    }

    #[test]
    fn report_uses_the_wire_field_names() {
        let json: Value = serde_json::from_str(&sample_report().to_json().unwrap()).unwrap();

        assert_eq!(json["AnalyzedProject"], "garden");
        assert_eq!(json["Version"], "1.0.0");
        assert!(json["Timestamp"].is_string());

        let root = &json["RootInvocations"][0];
        assert_eq!(root["Kind"], "When");
        assert_eq!(root["Signature"], "garden.Steps.water()");
        assert_eq!(root["RegularExpressions"][0], "^I water the plants$");
        assert_eq!(root["AutomationTargets"][0], "garden.Gardener.water(garden.Plant)");
        assert!(root.get("Local").is_none());

        let child = &root["Invocations"][0];
        assert_eq!(child["Kind"], "Public");
        assert_eq!(child["InterfaceDefinitions"][0], "garden.Person.waterPlants()");
        assert_eq!(child["Local"], true);
        assert_eq!(child["Invocations"][0]["Kind"], "Internal");
        assert!(child.get("RegularExpressions").is_none());
        assert_eq!(root["Invocations"][1]["Local"], false);
    }

    #[test]
    fn protected_and_package_private_are_both_internal() {
        assert_eq!(InvocationKind::Protected.wire_name(), "Internal");
        assert_eq!(InvocationKind::PackagePrivate.wire_name(), "Internal");
        assert_eq!(InvocationKind::from_wire("Internal"), InvocationKind::PackagePrivate);
        assert_eq!(InvocationKind::from_wire("Something"), InvocationKind::Unknown);
    }

    #[test]
    fn report_survives_a_json_round_trip() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        let parsed = AnalysisReport::from_json(&json).unwrap();

        assert_eq!(parsed, report);
        assert_eq!(parsed.to_json().unwrap(), json);
    }

    #[test]
    fn protected_calls_survive_a_json_round_trip() {
        let mut root = Invocation::root("garden.Steps.tend()", "T");
        root.invocations.push(Invocation::call(InvocationKind::Protected, "garden.Gherkin.grow()", true, Vec::new()));
        let report = AnalysisReport::new("garden", "1.0.0", vec![root]);

        let parsed = AnalysisReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed.root_invocations[0].invocations[0].kind, InvocationKind::PackagePrivate);
        assert_eq!(parsed, report);

        let mut renamed = report.clone();
        renamed.root_invocations[0].invocations[0].kind = InvocationKind::Private;
        assert_ne!(parsed, renamed);
    }

    #[test]
    fn descendants_are_listed_depth_first() {
        let report = sample_report();
        let signatures: Vec<&str> = report.root_invocations[0]
            .descendants()
            .iter()
            .map(|invocation| invocation.signature.as_str())
            .collect();
        assert_eq!(
            signatures,
            vec![
                "garden.MockedGardener.waterPlants()",
                "garden.Gherkin.grow()",
                "java.io.PrintStream.println(java.lang.String)",
            ]
        );
    }

    #[test]
    fn invoked_method_identity_ignores_argument_values() {
        let method = InvokedMethod {
            declaring_type: "garden.Gardener".to_string(),
            signature: "garden.Gardener.water(garden.Plant)".to_string(),
            kind: InvocationKind::Public,
            interface_definitions: Vec::new(),
            argument_types: vec![ArgumentType {
                declared: "garden.Plant".to_string(),
                actual: "garden.Plant".to_string(),
            }],
            local: true,
        };
        let mut refined = method.clone();
        refined.argument_types[0].actual = "garden.Melothria".to_string();
        assert_eq!(method, refined);

        let mut remote = method.clone();
        remote.local = false;
        assert_ne!(method, remote);
    }
}
