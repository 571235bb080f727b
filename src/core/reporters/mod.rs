//! Sinks for a completed analysis report

mod console;
mod remote;

use crate::core::call_graph::AnalysisReport;
use crate::error::Result;

pub use console::ConsoleReporter;
pub use remote::RemoteReporter;

/// Receives the report once traversal has finished
#[async_trait::async_trait]
pub trait Reporter: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &str;

    async fn report(&self, report: &AnalysisReport) -> Result<()>;
}
