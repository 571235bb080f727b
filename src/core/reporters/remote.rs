use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{error, info, warn};

use super::Reporter;
use crate::core::call_graph::AnalysisReport;
use crate::error::Result;

/// Status reported when the service could not be reached at all
pub const SERVICE_UNAVAILABLE: u16 = 503;

const TIMEOUT: Duration = Duration::from_secs(30);

/// Posts the report as JSON to a remote report service
pub struct RemoteReporter {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteReporter {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Report endpoint for one product version
    pub fn endpoint(&self, project_name: &str, version: &str) -> String {
        format!(
            "{}/api/v2/products/{}/versions/{}/analysis/reports",
            self.base_url.trim_end_matches('/'),
            project_name,
            version
        )
    }

    /// Posts the report and returns the HTTP status
    ///
    /// Transport failures are logged and mapped to 503; there is no retry.
    pub async fn send(&self, report: &AnalysisReport) -> Result<u16> {
        let body = report.to_json()?;
        let url = self.endpoint(&report.project_name, &report.version);
        info!("📤 Sending analysis report to {}", url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await;

        match response {
            Ok(response) => Ok(response.status().as_u16()),
            Err(e) => {
                error!("Failed to send analysis report to {}: {}", url, e);
                Ok(SERVICE_UNAVAILABLE)
            }
        }
    }
}

#[async_trait::async_trait]
impl Reporter for RemoteReporter {
    fn name(&self) -> &str {
        "remote"
    }

    async fn report(&self, report: &AnalysisReport) -> Result<()> {
        let status = self.send(report).await?;
        if (200..300).contains(&status) {
            info!("✅ Remote report accepted with status {}", status);
        } else {
            warn!("⚠️  Remote report answered with status {}", status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_product_and_version() {
        let reporter = RemoteReporter::new("http://reports.local:8080/").unwrap();
        assert_eq!(
            reporter.endpoint("garden", "1.2.3"),
            "http://reports.local:8080/api/v2/products/garden/versions/1.2.3/analysis/reports"
        );
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_503() {
        let reporter = RemoteReporter::new("http://127.0.0.1:9").unwrap();
        let report = AnalysisReport::new("garden", "1.0", Vec::new());

        assert_eq!(reporter.send(&report).await.unwrap(), SERVICE_UNAVAILABLE);
        assert!(reporter.report(&report).await.is_ok());
    }
}
