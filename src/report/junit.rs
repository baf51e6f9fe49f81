use crate::runner::state::{ScenarioOutcome, ScenarioReport, StepStatus, SuiteResult};
use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

/// Generate JUnit XML report string from suite results
pub fn generate_junit_xml(results: &SuiteResult) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total = results.scenarios.len().to_string();
    let failures = results.summary.failed.to_string();
    let time = seconds(results.summary.total_duration_ms.unwrap_or(0));

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "todomvc-tester"));
    suites_start.push_attribute(("tests", total.as_str()));
    suites_start.push_attribute(("failures", failures.as_str()));
    suites_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(suites_start))?;

    // One <testsuite> per run, named after the browser
    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", results.browser.as_str()));
    suite_start.push_attribute(("tests", total.as_str()));
    suite_start.push_attribute(("failures", failures.as_str()));
    suite_start.push_attribute(("skipped", "0"));
    suite_start.push_attribute(("id", results.session_id.as_str()));
    suite_start.push_attribute(("time", time.as_str()));
    suite_start.push_attribute(("timestamp", results.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for scenario in &results.scenarios {
        write_test_case(&mut writer, scenario)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    scenario: &ScenarioReport,
) -> Result<()> {
    let time = seconds(scenario.total_duration_ms.unwrap_or(0));
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", scenario.name.as_str()));
    case_start.push_attribute(("classname", "todomvc"));
    case_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(case_start))?;

    if let ScenarioOutcome::Fail { reason } = &scenario.outcome {
        let mut fail_start = BytesStart::new("failure");
        fail_start.push_attribute(("message", reason.as_str()));
        fail_start.push_attribute(("type", scenario.error_kind.as_deref().unwrap_or("Failure")));
        writer.write_event(Event::Start(fail_start))?;

        // Step trail up to and including the failure
        let trail: Vec<String> = scenario
            .steps
            .iter()
            .filter(|s| !matches!(s.status, StepStatus::Skipped { .. }))
            .map(|s| match &s.status {
                StepStatus::Failed { error } => format!("✗ {}: {}", s.display, error),
                _ => format!("✓ {}", s.display),
            })
            .collect();
        writer.write_event(Event::Text(BytesText::new(&trail.join("\n"))))?;

        writer.write_event(Event::End(BytesEnd::new("failure")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write or print the JUnit report
pub fn generate(results: &SuiteResult, output: Option<&Path>) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    match output {
        Some(path) => {
            std::fs::write(path, xml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("JUnit report saved to: {}", path.display());
        }
        None => println!("{}", xml),
    }
    Ok(())
}

/// Write report to file
pub fn write_report(results: &SuiteResult, output_dir: &Path) -> Result<()> {
    generate(results, Some(&output_dir.join("junit.xml")))
}
