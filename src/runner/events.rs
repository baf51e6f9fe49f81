use super::state::{ScenarioOutcome, SuiteSummary};
use tokio::sync::broadcast;

/// Suite execution events for real-time updates
#[derive(Debug, Clone)]
pub enum TestEvent {
    // Suite events
    SuiteStarted {
        session_id: String,
        browser: String,
        scenario_count: usize,
    },
    SuiteFinished {
        summary: SuiteSummary,
    },

    // Scenario events
    ScenarioStarted {
        name: String,
        step_count: usize,
    },
    ScenarioFinished {
        name: String,
        outcome: ScenarioOutcome,
        duration_ms: Option<u64>,
    },

    // Step events
    StepPassed {
        scenario: String,
        index: usize,
        step: String,
        duration_ms: u64,
    },
    StepFailed {
        scenario: String,
        index: usize,
        step: String,
        error: String,
        duration_ms: u64,
    },

    // Log event for coordinated output
    Log {
        message: String,
    },
}

/// Event emitter for broadcasting suite events
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<TestEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<TestEvent>) {
        let (sender, receiver) = broadcast::channel(256);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: TestEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TestEvent> {
        self.sender.subscribe()
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(TestEvent::Log {
            message: message.into(),
        });
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }
}

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Console event listener for printing real-time updates
///
/// Scenarios may finish in any order when workers > 1, so output is one line
/// per finished scenario plus a suite-level progress bar.
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<TestEvent>, verbose: bool) {
        use colored::Colorize;
        use std::io::IsTerminal;

        let mut progress: Option<ProgressBar> = None;

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("Console listener lagged, {} events dropped", missed);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                TestEvent::SuiteStarted {
                    session_id,
                    browser,
                    scenario_count,
                } => {
                    println!(
                        "\n{} Test session started: {} ({}, {} scenarios)",
                        "▶".green().bold(),
                        session_id.cyan(),
                        browser,
                        scenario_count
                    );

                    let pb = if std::io::stdout().is_terminal() {
                        ProgressBar::new(scenario_count as u64)
                    } else {
                        // Piped output: no terminal escape codes
                        ProgressBar::with_draw_target(
                            Some(scenario_count as u64),
                            ProgressDrawTarget::hidden(),
                        )
                    };
                    if let Ok(style) =
                        ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {msg}")
                    {
                        pb.set_style(style);
                    }
                    progress = Some(pb);
                }

                TestEvent::SuiteFinished { summary } => {
                    if let Some(pb) = progress.take() {
                        pb.finish_and_clear();
                    }

                    println!("\n{} Test session finished", "■".blue().bold());
                    println!("  Total scenarios: {}", summary.total_scenarios);
                    println!(
                        "  {} passed, {} failed, {} steps skipped",
                        summary.passed.to_string().green(),
                        summary.failed.to_string().red(),
                        summary.skipped_steps.to_string().yellow()
                    );
                    if let Some(duration) = summary.total_duration_ms {
                        println!("  Duration: {}ms", duration);
                    }
                }

                TestEvent::ScenarioStarted { name, step_count } => {
                    if let Some(pb) = &progress {
                        pb.set_message(name.clone());
                    }
                    log::debug!("Scenario '{}' started ({} steps)", name, step_count);
                }

                TestEvent::ScenarioFinished {
                    name,
                    outcome,
                    duration_ms,
                } => {
                    let duration = duration_ms.map(|d| format!(" ({}ms)", d)).unwrap_or_default();
                    let line = match &outcome {
                        ScenarioOutcome::Pass => {
                            format!("  {} {}{}", "PASS".green().bold(), name, duration.dimmed())
                        }
                        ScenarioOutcome::Fail { reason } => format!(
                            "  {} {}{}\n      {}",
                            "FAIL".red().bold(),
                            name,
                            duration.dimmed(),
                            reason.red()
                        ),
                    };

                    match &progress {
                        Some(pb) => {
                            pb.println(line);
                            pb.inc(1);
                        }
                        None => println!("{}", line),
                    }
                }

                TestEvent::StepPassed {
                    scenario,
                    index,
                    step,
                    duration_ms,
                } => {
                    if verbose {
                        let line = format!(
                            "    {} [{}] {} {}({}ms)",
                            "✓".green(),
                            scenario.dimmed(),
                            index,
                            step,
                            duration_ms
                        );
                        Self::print(&progress, line);
                    }
                }

                TestEvent::StepFailed {
                    scenario,
                    index,
                    step,
                    error,
                    duration_ms,
                } => {
                    log::debug!("[{}] step {} failed: {}", scenario, index, error);
                    if verbose {
                        let line = format!(
                            "    {} [{}] {} {}({}ms)",
                            "✗".red(),
                            scenario.dimmed(),
                            index,
                            step,
                            duration_ms
                        );
                        Self::print(&progress, line);
                    }
                }

                TestEvent::Log { message } => {
                    Self::print(&progress, format!("      {}", message));
                }
            }
        }
    }

    fn print(progress: &Option<ProgressBar>, line: String) {
        match progress {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }
}
