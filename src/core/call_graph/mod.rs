// src/core/call_graph/mod.rs
//! Step definition call graphs
//!
//! Entry points are found per type, then every call reachable from an entry
//! point is resolved against the symbol table and recorded as a tree of
//! invocations.

mod automation_target;
mod collector;
mod entry_point_detector;
mod invocation;
mod invocation_resolver;
mod strategies;

pub use automation_target::{AutomationTarget, OverloadHandling};
pub use collector::InvocationCollector;
pub use entry_point_detector::EntryPointDetector;
pub use invocation::{AnalysisReport, ArgumentType, Invocation, InvocationKind, InvokedMethod};
pub use invocation_resolver::InvocationResolver;
pub use strategies::{DutchSteps, EnglishSteps, StepKeywordStrategy, StepStrategies};
