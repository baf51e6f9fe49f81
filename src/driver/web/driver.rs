//! Web Driver implementation using Playwright
//!
//! The browser is launched once per suite by [`WebSessionFactory`]; every
//! scenario gets its own browser context and page through [`WebPage`], so no
//! cookies, storage or DOM state leak between scenarios.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use playwright::api::{Browser, BrowserContext, Page, Viewport};
use playwright::Playwright;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::driver::traits::{PageDriver, SessionFactory};
use crate::error::{TestError, TestResult};

/// Web browser type
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum BrowserType {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "chromium" | "chrome" => Some(BrowserType::Chromium),
            "firefox" => Some(BrowserType::Firefox),
            "webkit" | "safari" => Some(BrowserType::Webkit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BrowserType::Chromium => "chromium",
            BrowserType::Firefox => "firefox",
            BrowserType::Webkit => "webkit",
        }
    }
}

/// Web Driver configuration
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub browser_type: BrowserType,
    pub headless: bool,
    pub base_url: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Bound on the implicit wait before each interaction
    pub action_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    /// Explicit browser executable (Chromium only)
    pub executable: Option<PathBuf>,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            browser_type: BrowserType::Chromium,
            headless: true,
            base_url: crate::utils::config::DEFAULT_BASE_URL.to_string(),
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 5000,
            navigation_timeout_ms: 30000,
            executable: std::env::var("PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH")
                .ok()
                .map(PathBuf::from),
        }
    }
}

impl WebDriverConfig {
    /// Resolve a URL against the base URL. Absolute URLs pass through.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("about:")
        {
            url.to_string()
        } else if url.is_empty() {
            self.base_url.clone()
        } else if url.starts_with('#') {
            format!("{}{}", self.base_url, url)
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

/// Launches the browser once and hands out one isolated page per scenario
pub struct WebSessionFactory {
    #[allow(dead_code)]
    playwright: Arc<Playwright>,
    browser: Arc<Browser>,
    config: WebDriverConfig,
}

impl WebSessionFactory {
    pub async fn launch(config: WebDriverConfig) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        let browser = match config.browser_type {
            BrowserType::Chromium => launch_chromium_browser(&playwright.chromium(), &config).await?,
            BrowserType::Firefox => playwright
                .firefox()
                .launcher()
                .headless(config.headless)
                .launch()
                .await
                .context("Failed to launch Firefox")?,
            BrowserType::Webkit => playwright
                .webkit()
                .launcher()
                .headless(config.headless)
                .launch()
                .await
                .context("Failed to launch WebKit")?,
        };

        debug!(
            "Launched {} (headless: {})",
            config.browser_type.name(),
            config.headless
        );

        Ok(Self {
            playwright: Arc::new(playwright),
            browser: Arc::new(browser),
            config,
        })
    }
}

#[async_trait]
impl SessionFactory for WebSessionFactory {
    fn browser_name(&self) -> String {
        self.config.browser_type.name().to_string()
    }

    async fn open(&self) -> TestResult<Box<dyn PageDriver>> {
        let context = self
            .browser
            .context_builder()
            .build()
            .await
            .map_err(|e| TestError::Session(format!("Failed to create context: {}", e)))?;

        let page = context
            .new_page()
            .await
            .map_err(|e| TestError::Session(format!("Failed to open page: {}", e)))?;

        page.set_viewport_size(Viewport {
            width: self.config.viewport_width as i32,
            height: self.config.viewport_height as i32,
        })
        .await
        .map_err(|e| TestError::Session(format!("Failed to set viewport: {}", e)))?;

        Ok(Box::new(WebPage {
            context,
            page: Mutex::new(page),
            config: self.config.clone(),
        }))
    }

    async fn shutdown(&self) -> TestResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| TestError::Session(format!("Failed to close browser: {}", e)))
    }
}

/// One browser context and its single page
pub struct WebPage {
    context: BrowserContext,
    page: Mutex<Page>,
    config: WebDriverConfig,
}

const TEXT_OF_ALL_JS: &str = "sel => Array.from(document.querySelectorAll(sel)).map(el => (el.value !== undefined && el.tagName === 'INPUT') ? el.value : (el.innerText || el.textContent || ''))";
const CLASS_OF_FIRST_JS: &str =
    "sel => { const el = document.querySelector(sel); return el ? el.className : null; }";
const FOCUS_JS: &str = "el => { el.focus(); return true; }";

impl WebPage {
    /// Wait until the selector resolves to a rendered element
    ///
    /// On failure the page is queried once more so a hidden element is not
    /// reported as a missing one.
    async fn wait_for(&self, page: &Page, action: &str, selector: &str) -> TestResult<()> {
        let result = page
            .wait_for_selector_builder(selector)
            .timeout(self.config.action_timeout_ms as f64)
            .wait_for_selector()
            .await;

        let detail = match result {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => "no element became visible".to_string(),
            Err(e) => e.to_string(),
        };
        debug!("wait_for_selector('{}') failed: {}", selector, detail);

        let attached = page
            .query_selector(selector)
            .await
            .map(|el| el.is_some())
            .map_err(|e| e.to_string());
        Err(wait_failure(action, selector, attached, detail))
    }

    fn timeout(&self) -> f64 {
        self.config.action_timeout_ms as f64
    }
}

#[async_trait]
impl PageDriver for WebPage {
    async fn navigate(&self, url: &str) -> TestResult<()> {
        let full_url = self.config.resolve_url(url);
        let page = self.page.lock().await;

        page.goto_builder(&full_url)
            .timeout(self.config.navigation_timeout_ms as f64)
            .goto()
            .await
            .map_err(|e| TestError::NavigationFailure {
                url: full_url.clone(),
                detail: e.to_string(),
            })?;

        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> TestResult<()> {
        let page = self.page.lock().await;
        self.wait_for(&page, "fill", selector).await?;

        let element = page
            .query_selector(selector)
            .await
            .map_err(|e| TestError::action("fill", selector, e))?
            .ok_or_else(|| TestError::not_found(selector))?;

        element
            .fill_builder(text)
            .timeout(self.timeout())
            .fill()
            .await
            .map_err(|e| TestError::action("fill", selector, e))
    }

    async fn press_key(&self, selector: &str, key: &str) -> TestResult<()> {
        let page = self.page.lock().await;
        self.wait_for(&page, "pressKey", selector).await?;

        let _focused: bool = page
            .evaluate_on_selector(selector, FOCUS_JS, None::<()>)
            .await
            .map_err(|e| TestError::action("pressKey", selector, e))?;

        // Key events land on the focused element
        page.keyboard
            .down(key)
            .await
            .map_err(|e| TestError::action("pressKey", selector, e))?;
        page.keyboard
            .up(key)
            .await
            .map_err(|e| TestError::action("pressKey", selector, e))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> TestResult<()> {
        let page = self.page.lock().await;
        self.wait_for(&page, "click", selector).await?;

        page.click_builder(selector)
            .timeout(self.timeout())
            .click()
            .await
            .map_err(|e| TestError::action("click", selector, e))
    }

    async fn hover(&self, selector: &str) -> TestResult<()> {
        let page = self.page.lock().await;
        self.wait_for(&page, "hover", selector).await?;

        let element = page
            .query_selector(selector)
            .await
            .map_err(|e| TestError::action("hover", selector, e))?
            .ok_or_else(|| TestError::not_found(selector))?;

        element
            .scroll_into_view_if_needed(Some(self.timeout()))
            .await
            .map_err(|e| TestError::action("hover", selector, e))?;

        let bounds = element
            .bounding_box()
            .await
            .map_err(|e| TestError::action("hover", selector, e))?
            .ok_or_else(|| TestError::action("hover", selector, "element has no bounding box"))?;

        page.mouse
            .r#move(
                bounds.x + bounds.width / 2.0,
                bounds.y + bounds.height / 2.0,
                None,
            )
            .await
            .map_err(|e| TestError::action("hover", selector, e))
    }

    async fn double_click(&self, selector: &str) -> TestResult<()> {
        let page = self.page.lock().await;
        self.wait_for(&page, "doubleClick", selector).await?;

        page.dblclick_builder(selector)
            .timeout(self.timeout())
            .dblclick()
            .await
            .map_err(|e| TestError::action("doubleClick", selector, e))
    }

    async fn count_matching(&self, selector: &str) -> TestResult<usize> {
        let page = self.page.lock().await;
        let elements = page
            .query_selector_all(selector)
            .await
            .map_err(|e| TestError::action("count", selector, e))?;
        Ok(elements.len())
    }

    async fn text_of(&self, selector: &str) -> TestResult<String> {
        let page = self.page.lock().await;
        let texts: Vec<String> = page
            .evaluate(TEXT_OF_ALL_JS, selector.to_string())
            .await
            .map_err(|e| TestError::action("textOf", selector, e))?;

        if texts.is_empty() {
            return Err(TestError::not_found(selector));
        }
        Ok(texts.join("\n"))
    }

    async fn has_class(&self, selector: &str, class_name: &str) -> TestResult<bool> {
        let page = self.page.lock().await;
        let class_attr: Option<String> = page
            .evaluate(CLASS_OF_FIRST_JS, selector.to_string())
            .await
            .map_err(|e| TestError::action("hasClass", selector, e))?;

        match class_attr {
            Some(classes) => Ok(classes.split_whitespace().any(|c| c == class_name)),
            None => Err(TestError::not_found(selector)),
        }
    }

    async fn is_visible(&self, selector: &str) -> TestResult<bool> {
        let page = self.page.lock().await;
        let element = page
            .query_selector(selector)
            .await
            .map_err(|e| TestError::action("isVisible", selector, e))?;

        match element {
            Some(el) => el
                .is_visible()
                .await
                .map_err(|e| TestError::action("isVisible", selector, e)),
            None => Ok(false),
        }
    }

    async fn take_screenshot(&self, path: &str) -> TestResult<()> {
        let page = self.page.lock().await;
        let path_buf = PathBuf::from(path);

        if let Some(parent) = path_buf.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TestError::action("screenshot", path, e))?;
        }

        page.screenshot_builder()
            .path(path_buf)
            .screenshot()
            .await
            .map_err(|e| TestError::action("screenshot", path, e))?;
        Ok(())
    }

    async fn page_content(&self) -> TestResult<String> {
        let page = self.page.lock().await;
        page.content()
            .await
            .map_err(|e| TestError::action("content", "html", e))
    }

    async fn close(&self) -> TestResult<()> {
        self.context
            .close()
            .await
            .map_err(|e| TestError::Session(format!("Failed to close context: {}", e)))
    }
}

/// Classify a failed wait by whether the selector still matches anything
///
/// `attached` is the result of a follow-up `query_selector`. An `Err` there
/// means the page rejected the selector itself.
fn wait_failure(action: &str, selector: &str, attached: Result<bool, String>, detail: String) -> TestError {
    match attached {
        Ok(true) => TestError::action(
            action,
            selector,
            format!("element is attached but not visible: {}", detail),
        ),
        Ok(false) => TestError::not_found(selector),
        Err(e) => TestError::action(action, selector, format!("invalid selector: {}", e)),
    }
}

/// Launch Chromium, preferring an explicit or system-installed executable
async fn launch_chromium_browser(
    chromium: &playwright::api::BrowserType,
    config: &WebDriverConfig,
) -> Result<Browser> {
    let mut launcher = chromium.launcher().headless(config.headless);

    let executable = config.executable.clone().or_else(find_system_browser);
    if let Some(ref path) = executable {
        debug!("Using browser executable: {}", path.display());
        launcher = launcher.executable(path);
    } else {
        warn!("No browser executable found. Falling back to Playwright's bundled Chromium");
    }

    let args: Vec<String> = [
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    launcher = launcher.args(&args);

    launcher.launch().await.context("Failed to launch Chromium")
}

fn find_system_browser() -> Option<PathBuf> {
    let common_paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    common_paths
        .iter()
        .map(std::path::Path::new)
        .find(|p| p.exists())
        .map(|p| p.to_path_buf())
}
