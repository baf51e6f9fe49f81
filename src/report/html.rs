use crate::runner::state::{ScenarioOutcome, ScenarioReport, StepStatus, SuiteResult};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate HTML report
pub fn generate(results: &SuiteResult, output: Option<&Path>) -> Result<()> {
    let html = generate_html(results);

    if let Some(path) = output {
        std::fs::write(path, html)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("HTML report saved to: {}", path.display());
    } else {
        println!("{}", html);
    }

    Ok(())
}

fn scenario_html(scenario: &ScenarioReport) -> String {
    let (badge, class) = match &scenario.outcome {
        ScenarioOutcome::Pass => ("Passed", "passed"),
        ScenarioOutcome::Fail { .. } => ("Failed", "failed"),
    };

    let mut steps_html = String::new();
    for step in &scenario.steps {
        let (icon, step_class) = match &step.status {
            StepStatus::Passed => ("✓", "passed"),
            StepStatus::Failed { .. } => ("✗", "failed"),
            StepStatus::Skipped { .. } => ("○", "skipped"),
            StepStatus::Running => ("⋯", "running"),
            StepStatus::Pending => ("○", "pending"),
        };

        let detail = match &step.status {
            StepStatus::Failed { error } => {
                format!(r#"<div class="error">{}</div>"#, html_escape(error))
            }
            StepStatus::Skipped { reason } => {
                format!(r#"<span class="reason">{}</span>"#, html_escape(reason))
            }
            _ => String::new(),
        };

        let duration = step
            .duration_ms
            .map(|d| format!(r#"<span class="duration">{}ms</span>"#, d))
            .unwrap_or_default();

        steps_html.push_str(&format!(
            r#"<li class="step {step_class}"><span class="icon">{icon}</span><code>{}</code> {duration}{detail}</li>
"#,
            html_escape(&step.display),
        ));
    }

    let failure = match (&scenario.outcome, &scenario.error_kind) {
        (ScenarioOutcome::Fail { reason }, kind) => format!(
            r#"<div class="error"><strong>{}</strong>: {}</div>"#,
            kind.as_deref().unwrap_or("Failure"),
            html_escape(reason)
        ),
        _ => String::new(),
    };

    let screenshot = scenario
        .screenshot_path
        .as_ref()
        .map(|p| {
            format!(
                r#"<a class="screenshot" href="{0}"><img src="{0}" alt="failure screenshot"></a>"#,
                html_escape(p)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<section class="scenario {class}">
  <header><h3>{}</h3><span class="badge">{badge}</span><span class="duration">{}</span></header>
  {failure}
  <ol class="steps">
{steps_html}  </ol>
  {screenshot}
</section>
"#,
        html_escape(&scenario.name),
        format_duration(scenario.total_duration_ms.unwrap_or(0)),
    )
}

fn generate_html(results: &SuiteResult) -> String {
    let summary = &results.summary;
    let pass_rate = if summary.total_scenarios > 0 {
        (summary.passed as f64 / summary.total_scenarios as f64 * 100.0) as u32
    } else {
        0
    };

    let scenarios_html: String = results.scenarios.iter().map(scenario_html).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>TodoMVC Test Report - {session}</title>
<style>
  :root {{ --bg: #0f172a; --panel: #1e293b; --border: #334155; --text: #e2e8f0; --muted: #94a3b8; --green: #22c55e; --red: #ef4444; --yellow: #eab308; }}
  body {{ font-family: system-ui, sans-serif; background: var(--bg); color: var(--text); margin: 0; padding: 2rem; }}
  main {{ max-width: 960px; margin: 0 auto; }}
  .summary {{ display: flex; gap: 1rem; margin: 1.5rem 0; }}
  .stat {{ background: var(--panel); border: 1px solid var(--border); border-radius: 0.75rem; padding: 1rem 1.5rem; }}
  .stat b {{ display: block; font-size: 2rem; }}
  .stat.passed b {{ color: var(--green); }}
  .stat.failed b {{ color: var(--red); }}
  .bar {{ height: 8px; background: var(--panel); border-radius: 4px; overflow: hidden; margin-bottom: 2rem; }}
  .bar div {{ height: 100%; background: var(--green); }}
  .scenario {{ background: var(--panel); border: 1px solid var(--border); border-radius: 0.75rem; margin-bottom: 1rem; padding: 1rem 1.5rem; }}
  .scenario header {{ display: flex; align-items: center; gap: 1rem; }}
  .scenario h3 {{ flex: 1; margin: 0; font-size: 1.1rem; }}
  .scenario.passed .badge {{ color: var(--green); }}
  .scenario.failed .badge {{ color: var(--red); }}
  .steps {{ list-style: none; padding: 0; }}
  .step {{ padding: 0.3rem 0; }}
  .step .icon {{ display: inline-block; width: 1.5rem; }}
  .step.passed .icon {{ color: var(--green); }}
  .step.failed .icon {{ color: var(--red); }}
  .step.skipped {{ color: var(--muted); }}
  .duration, .reason {{ color: var(--muted); font-size: 0.8rem; }}
  .error {{ background: rgba(239, 68, 68, 0.1); border: 1px solid rgba(239, 68, 68, 0.3); border-radius: 0.5rem; padding: 0.5rem 0.75rem; margin: 0.5rem 0; font-family: monospace; color: #fca5a5; }}
  .screenshot img {{ max-width: 100%; border-radius: 0.5rem; margin-top: 0.5rem; }}
  footer {{ color: var(--muted); font-size: 0.8rem; text-align: center; margin-top: 2rem; }}
</style>
</head>
<body>
<main>
  <h1>TodoMVC Test Report</h1>
  <div>{browser} &middot; {base_url} &middot; {duration}</div>
  <div class="summary">
    <div class="stat"><b>{total}</b>Scenarios</div>
    <div class="stat passed"><b>{passed}</b>Passed</div>
    <div class="stat failed"><b>{failed}</b>Failed</div>
    <div class="stat"><b>{skipped}</b>Steps skipped</div>
  </div>
  <div class="bar"><div style="width: {pass_rate}%"></div></div>
{scenarios_html}
  <footer>Session: {session} &middot; Generated: {generated}</footer>
</main>
</body>
</html>"#,
        session = html_escape(&results.session_id),
        browser = html_escape(&results.browser),
        base_url = html_escape(&results.base_url),
        duration = format_duration(summary.total_duration_ms.unwrap_or(0)),
        total = summary.total_scenarios,
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped_steps,
        generated = results.generated_at,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {:.0}s", ms / 60000, (ms % 60000) as f64 / 1000.0)
    }
}
