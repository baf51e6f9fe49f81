use crate::error::TestError;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Step execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Passed,
    Failed { error: String },
    Skipped { reason: String },
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Passed | StepStatus::Failed { .. } | StepStatus::Skipped { .. }
        )
    }
}

/// State for a single step execution
#[derive(Debug, Clone)]
pub struct StepState {
    pub index: usize,
    pub display: String,
    pub status: StepStatus,
    pub started_at: Option<Instant>,
    pub duration_ms: Option<u64>,
}

impl StepState {
    pub fn new(index: usize, display: &str) -> Self {
        Self {
            index,
            display: display.to_string(),
            status: StepStatus::Pending,
            started_at: None,
            duration_ms: None,
        }
    }

    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn pass(&mut self) {
        self.finish(StepStatus::Passed);
    }

    pub fn fail(&mut self, error: String) {
        self.finish(StepStatus::Failed { error });
    }

    pub fn skip(&mut self, reason: &str) {
        self.status = StepStatus::Skipped {
            reason: reason.to_string(),
        };
    }

    fn finish(&mut self, status: StepStatus) {
        self.status = status;
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }

    /// Serialize state for reporting (without Instant which isn't serializable)
    pub fn to_report(&self) -> StepReport {
        StepReport {
            index: self.index,
            display: self.display.clone(),
            status: self.status.clone(),
            duration_ms: self.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub display: String,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pending,
    Running,
    Passed,
    Failed,
}

/// Final outcome of one scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScenarioOutcome {
    Pass,
    Fail { reason: String },
}

impl ScenarioOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, ScenarioOutcome::Pass)
    }
}

/// State for one scenario execution: Pending -> Running -> {Passed, Failed}
#[derive(Debug, Clone)]
pub struct ScenarioState {
    pub name: String,
    pub status: ScenarioStatus,
    pub steps: Vec<StepState>,
    pub current_index: usize,
    pub started_at: Option<Instant>,
    pub total_duration_ms: Option<u64>,
    pub error: Option<TestError>,
    pub screenshot_path: Option<String>,
}

impl ScenarioState {
    pub fn new(name: &str, steps: Vec<StepState>) -> Self {
        Self {
            name: name.to_string(),
            status: ScenarioStatus::Pending,
            steps,
            current_index: 0,
            started_at: None,
            total_duration_ms: None,
            error: None,
            screenshot_path: None,
        }
    }

    pub fn start(&mut self) {
        self.status = ScenarioStatus::Running;
        self.started_at = Some(Instant::now());
    }

    /// Record the scenario-ending error. Only the first one is kept.
    pub fn fail(&mut self, error: TestError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn skip_remaining(&mut self, reason: &str) {
        let from = self.current_index.min(self.steps.len());
        for step in &mut self.steps[from..] {
            if !step.status.is_terminal() {
                step.skip(reason);
            }
        }
    }

    pub fn finish(&mut self) {
        if let Some(start) = self.started_at {
            self.total_duration_ms = Some(start.elapsed().as_millis() as u64);
        }

        let step_failed = self
            .steps
            .iter()
            .any(|s| matches!(s.status, StepStatus::Failed { .. }));

        self.status = if self.error.is_some() || step_failed {
            ScenarioStatus::Failed
        } else {
            ScenarioStatus::Passed
        };
    }

    pub fn outcome(&self) -> ScenarioOutcome {
        match (&self.status, &self.error) {
            (ScenarioStatus::Passed, _) => ScenarioOutcome::Pass,
            (_, Some(e)) => ScenarioOutcome::Fail {
                reason: e.to_string(),
            },
            (ScenarioStatus::Failed, None) => ScenarioOutcome::Fail {
                reason: "step failed".to_string(),
            },
            (status, None) => ScenarioOutcome::Fail {
                reason: format!("scenario did not finish ({:?})", status),
            },
        }
    }

    /// Serialize state for reporting
    pub fn to_report(&self) -> ScenarioReport {
        ScenarioReport {
            name: self.name.clone(),
            status: self.status,
            outcome: self.outcome(),
            error_kind: self.error.as_ref().map(|e| e.kind().to_string()),
            steps: self.steps.iter().map(|s| s.to_report()).collect(),
            total_duration_ms: self.total_duration_ms,
            screenshot_path: self.screenshot_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub name: String,
    pub status: ScenarioStatus,
    pub outcome: ScenarioOutcome,
    pub error_kind: Option<String>,
    pub steps: Vec<StepReport>,
    pub total_duration_ms: Option<u64>,
    pub screenshot_path: Option<String>,
}

impl ScenarioReport {
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            ScenarioOutcome::Pass => None,
            ScenarioOutcome::Fail { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    pub total_scenarios: u32,
    pub passed: u32,
    pub failed: u32,
    pub total_steps: u32,
    pub skipped_steps: u32,
    pub total_duration_ms: Option<u64>,
}

/// Outcome of one suite run, keyed by scenario name in suite order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResult {
    pub session_id: String,
    pub browser: String,
    pub base_url: String,
    pub scenarios: Vec<ScenarioReport>,
    pub summary: SuiteSummary,
    pub generated_at: String,
}

impl SuiteResult {
    pub fn new(
        session_id: &str,
        browser: &str,
        base_url: &str,
        scenarios: Vec<ScenarioReport>,
        total_duration_ms: Option<u64>,
    ) -> Self {
        let mut summary = SuiteSummary {
            total_scenarios: scenarios.len() as u32,
            total_duration_ms,
            ..SuiteSummary::default()
        };

        for scenario in &scenarios {
            if scenario.outcome.is_pass() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            summary.total_steps += scenario.steps.len() as u32;
            summary.skipped_steps += scenario
                .steps
                .iter()
                .filter(|s| matches!(s.status, StepStatus::Skipped { .. }))
                .count() as u32;
        }

        Self {
            session_id: session_id.to_string(),
            browser: browser.to_string(),
            base_url: base_url.to_string(),
            scenarios,
            summary,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn outcome(&self, name: &str) -> Option<&ScenarioOutcome> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.outcome)
    }

    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.outcome.is_pass())
    }
}
