use colored::Colorize;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use super::assertion::{poll_until, Expectation, PollPolicy};
use super::events::{EventEmitter, TestEvent};
use super::state::{ScenarioReport, ScenarioState, StepState, StepStatus, SuiteResult};
use crate::driver::traits::{PageDriver, SessionFactory};
use crate::error::{TestError, TestResult};
use crate::parser::types::{Action, Scenario};
use crate::utils::config::Config;

/// Runs scenarios against fresh browser sessions
///
/// Every scenario gets its own session, starts from a fresh navigation and
/// stops at its first failing step. Failures never leak into other scenarios.
pub struct ScenarioRunner {
    factory: Arc<dyn SessionFactory>,
    config: Config,
    emitter: EventEmitter,
    filter: Option<String>,
}

impl ScenarioRunner {
    pub fn new(factory: Arc<dyn SessionFactory>, config: Config, emitter: EventEmitter) -> Self {
        Self {
            factory,
            config,
            emitter,
            filter: None,
        }
    }

    /// Only run scenarios whose name contains the pattern (case-insensitive)
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Subscribe to suite execution events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<TestEvent> {
        self.emitter.subscribe()
    }

    fn selected<'a>(&self, scenarios: &'a [Scenario]) -> Vec<&'a Scenario> {
        match &self.filter {
            Some(pattern) => {
                let pattern = pattern.to_lowercase();
                scenarios
                    .iter()
                    .filter(|s| s.name.to_lowercase().contains(&pattern))
                    .collect()
            }
            None => scenarios.iter().collect(),
        }
    }

    /// Run a suite and return its result in suite order
    ///
    /// Rejects the suite up front if two scenarios share a name.
    pub async fn run_suite(&self, scenarios: &[Scenario]) -> TestResult<SuiteResult> {
        let mut seen = HashSet::new();
        for scenario in scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(TestError::DuplicateScenario(scenario.name.clone()));
            }
        }

        let selected = self.selected(scenarios);
        let session_id = Uuid::new_v4().to_string();
        let browser = self.factory.browser_name();
        let started = Instant::now();
        let deadline = self.config.suite_timeout().map(|t| started + t);
        let workers = self.config.workers.max(1);

        self.emitter.emit(TestEvent::SuiteStarted {
            session_id: session_id.clone(),
            browser: browser.clone(),
            scenario_count: selected.len(),
        });

        if workers > 1 {
            log::debug!("Running {} scenarios on {} workers", selected.len(), workers);
        }

        let mut reports: Vec<(usize, ScenarioReport)> = stream::iter(selected.into_iter().enumerate())
            .map(|(index, scenario)| async move {
                (index, self.run_scenario(scenario, deadline).await)
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        // Completion order is arbitrary with several workers
        reports.sort_by_key(|(index, _)| *index);

        let result = SuiteResult::new(
            &session_id,
            &browser,
            &self.config.base_url,
            reports.into_iter().map(|(_, r)| r).collect(),
            Some(started.elapsed().as_millis() as u64),
        );

        self.emitter.emit(TestEvent::SuiteFinished {
            summary: result.summary.clone(),
        });

        Ok(result)
    }

    /// Run one scenario in a fresh session; the session is closed on every path
    pub async fn run_scenario(&self, scenario: &Scenario, deadline: Option<Instant>) -> ScenarioReport {
        let steps = scenario
            .steps
            .iter()
            .enumerate()
            .map(|(i, action)| StepState::new(i, &action.display_name()))
            .collect();
        let mut state = ScenarioState::new(&scenario.name, steps);

        self.emitter.emit(TestEvent::ScenarioStarted {
            name: scenario.name.clone(),
            step_count: scenario.steps.len(),
        });
        state.start();

        let expired = deadline.map_or(false, |d| Instant::now() >= d);
        let session = if expired {
            None
        } else {
            within(deadline, self.factory.open()).await
        };

        match session {
            None => Self::timed_out(&mut state),
            Some(Err(e)) => {
                state.fail(e);
                state.skip_remaining("Session could not be opened");
            }
            Some(Ok(page)) => {
                if within(deadline, self.run_steps(page.as_ref(), scenario, &mut state))
                    .await
                    .is_none()
                {
                    Self::timed_out(&mut state);
                }
                self.release(page.as_ref(), &scenario.name).await;
            }
        }

        state.finish();
        let report = state.to_report();

        self.emitter.emit(TestEvent::ScenarioFinished {
            name: report.name.clone(),
            outcome: report.outcome.clone(),
            duration_ms: report.total_duration_ms,
        });

        report
    }

    fn timed_out(state: &mut ScenarioState) {
        let error = TestError::Timeout;
        for step in &mut state.steps {
            if step.status == StepStatus::Running {
                step.fail(error.to_string());
            }
        }
        state.fail(error);
        state.skip_remaining("Suite timeout");
    }

    async fn release(&self, page: &dyn PageDriver, scenario: &str) {
        let limit = Duration::from_millis(self.config.navigation_timeout_ms);
        match tokio::time::timeout(limit, page.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Closing session for '{}' failed: {}", scenario, e),
            Err(_) => log::warn!("Closing session for '{}' timed out", scenario),
        }
    }

    async fn run_steps(&self, page: &dyn PageDriver, scenario: &Scenario, state: &mut ScenarioState) {
        let start_url = scenario.url.as_deref().unwrap_or("");
        if let Err(e) = page.navigate(start_url).await {
            state.fail(e);
            state.skip_remaining("Initial navigation failed");
            return;
        }

        for (index, action) in scenario.steps.iter().enumerate() {
            state.current_index = index;
            state.steps[index].start();

            match self.execute(page, action).await {
                Ok(()) => {
                    state.steps[index].pass();
                    self.emitter.emit(TestEvent::StepPassed {
                        scenario: scenario.name.clone(),
                        index,
                        step: state.steps[index].display.clone(),
                        duration_ms: state.steps[index].duration_ms.unwrap_or(0),
                    });
                }
                Err(e) => {
                    state.steps[index].fail(e.to_string());
                    self.emitter.emit(TestEvent::StepFailed {
                        scenario: scenario.name.clone(),
                        index,
                        step: state.steps[index].display.clone(),
                        error: e.to_string(),
                        duration_ms: state.steps[index].duration_ms.unwrap_or(0),
                    });

                    // Record the outcome before capture: the suite deadline may cut capture short
                    state.fail(e);
                    state.current_index = index + 1;
                    state.skip_remaining("Previous step failed");

                    state.screenshot_path = self.handle_failure(page, &scenario.name, index).await;
                    return;
                }
            }
        }
    }

    fn policy(&self) -> PollPolicy {
        self.config.assertion_policy()
    }

    /// Execute a single action
    pub async fn execute(&self, page: &dyn PageDriver, action: &Action) -> TestResult<()> {
        match action {
            Action::Navigate { url } => page.navigate(url).await,
            Action::Fill { selector, text } => page.fill(selector, text).await,
            Action::PressKey { selector, key } => page.press_key(selector, key).await,
            Action::Click { selector } => page.click(selector).await,
            Action::Hover { selector } => page.hover(selector).await,
            Action::DoubleClick { selector } => page.double_click(selector).await,
            Action::AssertCount { selector, expected } => {
                poll_until(page, selector, &Expectation::Count(*expected), self.policy()).await
            }
            Action::AssertText { selector, expected } => {
                let expectation = Expectation::ContainsText(expected.clone());
                poll_until(page, selector, &expectation, self.policy()).await
            }
            Action::AssertTextEquals { selector, expected } => {
                let expectation = Expectation::ExactText(expected.clone());
                poll_until(page, selector, &expectation, self.policy()).await
            }
            Action::AssertHasClass {
                selector,
                class_name,
            } => {
                let expectation = Expectation::HasClass(class_name.clone());
                poll_until(page, selector, &expectation, self.policy()).await
            }
            Action::AssertVisible { selector } => {
                poll_until(page, selector, &Expectation::Visible, self.policy()).await
            }
        }
    }

    /// Save a screenshot and the page HTML for a failed step
    ///
    /// Returns the screenshot path if one was written. Capture errors are
    /// logged and never change the scenario outcome.
    async fn handle_failure(&self, page: &dyn PageDriver, scenario: &str, index: usize) -> Option<String> {
        if !self.config.artifacts {
            return None;
        }

        self.emitter
            .log(format!("{} Capturing failure context...", "ℹ".blue()));

        let dir = &self.config.output_dir;
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            log::warn!("Cannot create output directory {}: {}", dir.display(), e);
            return None;
        }

        let prefix = failure_prefix(scenario, index);
        let mut saved = None;

        let screenshot = dir.join(format!("{}.png", prefix));
        let screenshot_str = screenshot.to_string_lossy().to_string();
        match page.take_screenshot(&screenshot_str).await {
            Ok(()) => {
                self.emitter.log(format!(
                    "{} Saved Screenshot: {}",
                    "📸".green(),
                    screenshot.display()
                ));
                saved = Some(screenshot_str);
            }
            Err(e) => log::warn!("Failed to take screenshot: {}", e),
        }

        match page.page_content().await {
            Ok(html) => {
                let path: PathBuf = dir.join(format!("{}.html", prefix));
                match tokio::fs::write(&path, html).await {
                    Ok(()) => self.emitter.log(format!(
                        "{} Saved Page HTML: {}",
                        "📄".green(),
                        path.display()
                    )),
                    Err(e) => log::warn!("Failed to write {}: {}", path.display(), e),
                }
            }
            Err(e) => log::warn!("Failed to read page content: {}", e),
        }

        saved
    }
}

/// `fail_<scenario>_<time>_step<N>_<id>`, safe for file names
fn failure_prefix(scenario: &str, index: usize) -> String {
    let safe_name: String = scenario
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let uuid = Uuid::new_v4().to_string();
    let timestamp = chrono::Local::now().format("%H%M%S");

    format!("fail_{}_{}_step{}_{}", safe_name, timestamp, index, &uuid[..8])
}

/// Await `fut` unless the deadline passes first
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_prefix_is_file_safe() {
        let prefix = failure_prefix("should add a/new todo", 3);
        assert!(prefix.starts_with("fail_should_add_a_new_todo_"));
        assert!(prefix.contains("_step3_"));
        assert!(!prefix.contains(' '));
    }

    #[tokio::test(start_paused = true)]
    async fn test_within_without_deadline_always_completes() {
        let value = within(None, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            7
        })
        .await;
        assert_eq!(value, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_within_expired_deadline() {
        let deadline = Instant::now() + Duration::from_millis(10);
        let value = within(Some(deadline), tokio::time::sleep(Duration::from_secs(1))).await;
        assert!(value.is_none());
    }
}
