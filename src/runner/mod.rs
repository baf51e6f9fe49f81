pub mod assertion;
pub mod events;
pub mod executor;
pub mod state;

use anyhow::{Context, Result};
use std::path::PathBuf;

pub use events::*;
pub use executor::ScenarioRunner;
pub use state::*;

use crate::parser::types::Scenario;
use crate::utils::config::Config;

/// What to run, on top of the shared configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// YAML scenario file or directory; the built-in catalog when absent
    pub scenarios: Option<PathBuf>,
    pub filter: Option<String>,
    /// Print every step, not only one line per scenario
    pub verbose: bool,
}

/// Load the scenarios a run will execute
pub fn load_suite(options: &RunOptions) -> Result<Vec<Scenario>> {
    match &options.scenarios {
        Some(path) => {
            let scenarios = crate::parser::yaml::load_scenarios(path)?;
            if scenarios.is_empty() {
                anyhow::bail!("No scenario files found in {}", path.display());
            }
            Ok(scenarios)
        }
        None => Ok(crate::catalog::todomvc_scenarios()),
    }
}

/// Launch the browser, run the suite and write reports if artifacts are enabled
pub async fn run_suite(config: Config, options: RunOptions) -> Result<SuiteResult> {
    let scenarios = load_suite(&options)?;

    let factory = crate::driver::launch(&config)
        .await
        .context("Failed to launch browser")?;

    let (emitter, receiver) = EventEmitter::new();
    let listener = tokio::spawn(ConsoleEventListener::listen(receiver, options.verbose));

    let runner = ScenarioRunner::new(factory.clone(), config.clone(), emitter)
        .with_filter(options.filter.clone());
    let result = runner.run_suite(&scenarios).await;

    // Dropping the last emitter ends the listener once it drains
    drop(runner);
    if let Err(e) = listener.await {
        log::warn!("Console listener failed: {}", e);
    }

    if let Err(e) = factory.shutdown().await {
        log::warn!("Browser shutdown failed: {}", e);
    }

    let result = result?;

    if config.artifacts {
        crate::report::write_all(&result, &config.output_dir)?;
    }

    Ok(result)
}
