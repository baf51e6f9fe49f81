use crate::driver::web::BrowserType;
use crate::runner::assertion::PollPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Hosted TodoMVC demo targeted by the built-in catalog
pub const DEFAULT_BASE_URL: &str = "https://demo.playwright.dev/todomvc";

/// Application configuration
///
/// Built from defaults, then `TODOMVC_*` environment variables, then CLI flags.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL every scenario navigates to before its first step
    pub base_url: String,

    pub browser: BrowserType,

    pub headless: bool,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Implicit wait before each interaction (ms)
    pub action_timeout_ms: u64,

    /// How long an assertion polls before failing (ms)
    pub assertion_timeout_ms: u64,

    /// Delay between assertion polls (ms)
    pub poll_interval_ms: u64,

    pub navigation_timeout_ms: u64,

    /// Deadline for the whole suite (ms); scenarios past it fail with Timeout
    pub suite_timeout_ms: Option<u64>,

    /// Scenarios allowed in flight at once, each in its own browser context
    pub workers: usize,

    /// Output directory for reports and failure artifacts
    pub output_dir: PathBuf,

    /// Write JSON/HTML/JUnit reports and failure screenshots
    pub artifacts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: BrowserType::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 5000,
            assertion_timeout_ms: 5000,
            poll_interval_ms: 100,
            navigation_timeout_ms: 30000,
            suite_timeout_ms: None,
            workers: 1,
            output_dir: PathBuf::from("./output"),
            artifacts: false,
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Overlay settings from an environment lookup
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TODOMVC_BASE_URL").filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
        if let Some(v) = lookup("TODOMVC_HEADLESS") {
            self.headless = v == "true" || v == "1";
        }
        if let Some(b) = lookup("TODOMVC_BROWSER").and_then(|b| BrowserType::from_name(&b)) {
            self.browser = b;
        }
        if let Some(ms) = lookup("TODOMVC_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.assertion_timeout_ms = ms;
            self.action_timeout_ms = ms;
        }
        if let Some(n) = lookup("TODOMVC_WORKERS").and_then(|v| v.parse::<usize>().ok()) {
            self.workers = n.max(1);
        }
        self
    }

    pub fn assertion_policy(&self) -> PollPolicy {
        PollPolicy {
            timeout: Duration::from_millis(self.assertion_timeout_ms),
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }

    pub fn suite_timeout(&self) -> Option<Duration> {
        self.suite_timeout_ms.map(Duration::from_millis)
    }
}
