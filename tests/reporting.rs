use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use steptrace::cli::Cli;
use steptrace::core::call_graph::AnalysisReport;
use steptrace::core::reporters::{ConsoleReporter, RemoteReporter};
use steptrace::core::{AnalyzeOptions, Engine, SourceTree};
use steptrace::Config;

fn garden() -> TempDir {
    let project = TempDir::new().unwrap();
    project
        .child("src/main/java/garden/Gardener.java")
        .write_str(
            r#"package garden;
            public class Gardener {
                public void plant() { dig(); }
                private void dig() { System.out.println("dig"); }
            }"#,
        )
        .unwrap();
    project
        .child("src/test/java/garden/GardenSteps.java")
        .write_str(
            r#"package garden;
            import io.cucumber.java.en.When;
            public class GardenSteps {
                @When("^the gardener plants$")
                public void plant() { new Gardener().plant(); }
            }"#,
        )
        .unwrap();
    project
}

fn report_for(project: &TempDir) -> AnalysisReport {
    let mut options = AnalyzeOptions::for_root(project.path());
    options.project_name = "garden".to_string();
    options.version = "1.0.0".to_string();

    Engine::new(options, Box::new(SourceTree::new(project.path())), Vec::new())
        .unwrap()
        .analyze()
        .unwrap()
}

#[test]
fn report_json_uses_the_service_field_names() {
    let project = garden();
    let json: Value = serde_json::from_str(&report_for(&project).to_json().unwrap()).unwrap();

    assert_eq!(json["AnalyzedProject"], "garden");
    assert_eq!(json["Version"], "1.0.0");

    let root = &json["RootInvocations"][0];
    assert_eq!(root["Kind"], "When");
    assert_eq!(root["Signature"], "garden.GardenSteps.plant()");
    assert_eq!(root["RegularExpressions"], serde_json::json!(["^the gardener plants$"]));
    assert!(root.get("Local").is_none());

    let plant = &root["Invocations"][0];
    assert_eq!(plant["Kind"], "Public");
    assert_eq!(plant["Local"], true);
    assert_eq!(plant["InterfaceDefinitions"], serde_json::json!([]));

    let dig = &plant["Invocations"][0];
    assert_eq!(dig["Kind"], "Private");
    assert_eq!(dig["Invocations"][0]["Local"], false);
}

#[test]
fn analyzed_report_survives_a_json_round_trip() {
    let project = garden();
    let report = report_for(&project);

    let parsed = AnalysisReport::from_json(&report.to_json().unwrap()).unwrap();
    assert_eq!(parsed.root_invocations, report.root_invocations);
    assert_eq!(parsed.project_name, report.project_name);
}

#[test]
fn protected_calls_keep_a_round_trip_equal() {
    let project = TempDir::new().unwrap();
    project
        .child("src/main/java/garden/Gherkin.java")
        .write_str(
            r#"package garden;
            public class Gherkin {
                public void tend() { grow(); }
                protected void grow() {}
            }"#,
        )
        .unwrap();
    project
        .child("src/test/java/garden/GardenSteps.java")
        .write_str(
            r#"package garden;
            import io.cucumber.java.en.When;
            public class GardenSteps {
                @When("^the gherkin is tended$")
                public void tend() { new Gherkin().tend(); }
            }"#,
        )
        .unwrap();

    let report = report_for(&project);
    let json = report.to_json().unwrap();
    assert!(json.contains("\"Kind\": \"Internal\""));

    let parsed = AnalysisReport::from_json(&json).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn console_output_indents_each_level() {
    let project = garden();
    let rendered = ConsoleReporter::new().render(&report_for(&project));
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[1], "CONSOLE REPORTER, project: garden, version: 1.0.0");
    assert_eq!(lines[3], "ROOT: garden.GardenSteps.plant() (automationTargets: [])");
    assert_eq!(lines[4], "... garden.Gardener.plant()");
    assert_eq!(lines[5], "...... garden.Gardener.dig()");
    assert_eq!(lines[6], "......... java.io.PrintStream.println(java.lang.String)");
}

/// Accepts one request, answers 202 and returns the raw request
async fn accept_one(listener: TcpListener) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut request = Vec::new();
    let mut buffer = [0u8; 4096];

    loop {
        let read = socket.read(&mut buffer).await.unwrap();
        if read == 0 {
            break;
        }
        request.extend_from_slice(&buffer[..read]);

        let text = String::from_utf8_lossy(&request);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if request.len() >= header_end + 4 + length {
                break;
            }
        }
    }

    socket
        .write_all(b"HTTP/1.1 202 Accepted\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    String::from_utf8_lossy(&request).into_owned()
}

#[tokio::test]
async fn remote_reporter_posts_json_to_the_version_endpoint() {
    let project = garden();
    let report = report_for(&project);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = tokio::spawn(accept_one(listener));

    let reporter = RemoteReporter::new(format!("http://{}/", address)).unwrap();
    let status = reporter.send(&report).await.unwrap();
    let request = server.await.unwrap();

    assert_eq!(status, 202);
    assert!(request.starts_with("POST /api/v2/products/garden/versions/1.0.0/analysis/reports HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(request.contains("\"AnalyzedProject\": \"garden\""));
}

#[tokio::test]
async fn init_writes_a_loadable_default_configuration() {
    let dir = TempDir::new().unwrap();
    let target = dir.child("steptrace.toml");
    let path = target.path().to_string_lossy().into_owned();

    let cli = <Cli as clap::Parser>::try_parse_from(["steptrace", "init", "--path", path.as_str()]).unwrap();
    cli.execute().await.unwrap();

    target.assert(predicate::path::is_file());
    target.assert(predicate::str::contains("[analysis]").and(predicate::str::contains("language_level = \"JAVA_11\"")));

    let config = Config::load(target.path()).unwrap();
    assert_eq!(config.analysis.registration_interface_packages, vec!["cucumber.api.java8", "io.cucumber.java8"]);

    // a second init refuses to overwrite
    let again = <Cli as clap::Parser>::try_parse_from(["steptrace", "init", "--path", path.as_str()]).unwrap();
    assert!(again.execute().await.is_err());
}

#[tokio::test]
async fn analyze_command_reads_the_configuration_file() {
    let project = garden();
    let config_file = project.child("steptrace.toml");
    let mut config = Config::default();
    config.project.root = project.path().to_path_buf();
    config.analysis.language_level = "JAVA_17".to_string();
    config.save(config_file.path()).unwrap();

    let config_path = config_file.path().to_string_lossy().into_owned();
    let cli = <Cli as clap::Parser>::try_parse_from(["steptrace", "--config", config_path.as_str(), "analyze", "GardenSteps"])
        .unwrap();
    cli.execute().await.unwrap();

    let broken = <Cli as clap::Parser>::try_parse_from([
        "steptrace",
        "--config",
        config_path.as_str(),
        "analyze",
        "--language-level",
        "JAVA_5",
    ])
    .unwrap();
    assert!(broken.execute().await.is_err());
}
