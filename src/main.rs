use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use todomvc_tester::driver::web::BrowserType;
use todomvc_tester::runner::{self, RunOptions};
use todomvc_tester::utils::config::Config;
use todomvc_tester::report;

#[derive(Parser)]
#[command(name = "todomvc-tester")]
#[command(version = "0.1.0")]
#[command(about = "End-to-end browser tests for the TodoMVC demo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in scenarios, or YAML scenario file(s)
    Run {
        /// YAML scenario file or directory (built-in catalog if omitted)
        path: Option<PathBuf>,

        /// Application URL (default: hosted TodoMVC demo)
        #[arg(short, long)]
        url: Option<String>,

        /// Browser engine (chromium, firefox, webkit)
        #[arg(short, long)]
        browser: Option<String>,

        /// Show the browser window
        #[arg(long, default_value = "false")]
        headed: bool,

        /// Scenarios to run concurrently, each in its own browser context
        #[arg(short, long)]
        workers: Option<usize>,

        /// Only run scenarios whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Assertion timeout in milliseconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Implicit wait before each interaction, in milliseconds
        #[arg(long)]
        action_timeout: Option<u64>,

        /// Deadline for the whole suite, in seconds
        #[arg(long)]
        suite_timeout: Option<u64>,

        /// Output directory for reports and artifacts
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generate reports (JSON, HTML, JUnit) and failure screenshots
        #[arg(long, default_value = "false")]
        report: bool,

        /// Print every step
        #[arg(short, long, default_value = "false")]
        verbose: bool,
    },

    /// List scenarios without running them
    List {
        /// YAML scenario file or directory (built-in catalog if omitted)
        path: Option<PathBuf>,
    },

    /// Generate report from saved test results
    Report {
        /// Path to test-results.json
        results: PathBuf,

        /// Output format (json, html, junit)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            path,
            url,
            browser,
            headed,
            workers,
            filter,
            timeout,
            action_timeout,
            suite_timeout,
            output,
            report,
            verbose,
        } => {
            let mut config = Config::from_env();
            if let Some(url) = url {
                config.base_url = url;
            }
            if let Some(name) = browser {
                config.browser = BrowserType::from_name(&name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown browser: {}", name))?;
            }
            if headed {
                config.headless = false;
            }
            if let Some(n) = workers {
                config.workers = n.max(1);
            }
            if let Some(ms) = timeout {
                config.assertion_timeout_ms = ms;
            }
            if let Some(ms) = action_timeout {
                config.action_timeout_ms = ms;
            }
            if let Some(secs) = suite_timeout {
                config.suite_timeout_ms = Some(secs * 1000);
            }
            if let Some(dir) = output {
                config.output_dir = dir;
            }
            config.artifacts |= report;

            println!(
                "{} Running {} against: {}",
                "▶".green().bold(),
                path.as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "built-in scenarios".to_string()),
                config.base_url.cyan()
            );
            println!("  Browser: {}", config.browser.name().cyan());
            if config.workers > 1 {
                println!("  Workers: {}", config.workers.to_string().yellow());
            }
            if let Some(ref pattern) = filter {
                println!("  Filter: {}", pattern.yellow());
            }
            if config.artifacts {
                println!("  Reports: {}", config.output_dir.display().to_string().cyan());
            }

            let options = RunOptions {
                scenarios: path,
                filter,
                verbose,
            };
            let result = runner::run_suite(config, options).await?;

            if result.all_passed() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }

        Commands::List { path } => {
            let options = RunOptions {
                scenarios: path,
                ..RunOptions::default()
            };
            let scenarios = runner::load_suite(&options)?;
            for scenario in &scenarios {
                let tags = if scenario.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", scenario.tags.join(", "))
                };
                println!(
                    "  {} {}{} ({} steps)",
                    "•".blue(),
                    scenario.name,
                    tags.dimmed(),
                    scenario.steps.len()
                );
            }
            println!("{} scenarios", scenarios.len());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
