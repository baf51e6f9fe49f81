use crate::error::TestResult;
use async_trait::async_trait;

/// Page-level driver interface
///
/// One instance owns one isolated browser page. Every selector is a CSS
/// selector. Interaction operations wait for the element to be attached before
/// acting and fail with `ElementNotFound` or `ActionTimeout`; none of them
/// retry.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to an absolute URL, or one relative to the base URL
    async fn navigate(&self, url: &str) -> TestResult<()>;

    /// Replace the value of an input element
    async fn fill(&self, selector: &str, text: &str) -> TestResult<()>;

    /// Press a key (e.g. "Enter", "Escape") with the element focused
    async fn press_key(&self, selector: &str, key: &str) -> TestResult<()>;

    async fn click(&self, selector: &str) -> TestResult<()>;

    /// Move the pointer over the element, revealing hover-only controls
    async fn hover(&self, selector: &str) -> TestResult<()>;

    async fn double_click(&self, selector: &str) -> TestResult<()>;

    /// Number of elements currently matching. Never waits: zero is a valid answer.
    async fn count_matching(&self, selector: &str) -> TestResult<usize>;

    /// Rendered text of every matching element, joined by newlines
    ///
    /// Input elements report their current value.
    async fn text_of(&self, selector: &str) -> TestResult<String>;

    /// Whether the first matching element carries the class token
    async fn has_class(&self, selector: &str, class_name: &str) -> TestResult<bool>;

    /// Whether the first matching element is rendered and visible
    async fn is_visible(&self, selector: &str) -> TestResult<bool>;

    /// Save a screenshot of the page
    async fn take_screenshot(&self, _path: &str) -> TestResult<()> {
        Ok(())
    }

    /// Current page HTML, for failure diagnostics
    async fn page_content(&self) -> TestResult<String> {
        Ok(String::new())
    }

    /// Release the page and its browser context
    async fn close(&self) -> TestResult<()>;
}

/// Opens one fresh, isolated page session per scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Name of the backing browser (e.g. "chromium"), used in reports
    fn browser_name(&self) -> String;

    async fn open(&self) -> TestResult<Box<dyn PageDriver>>;

    /// Tear down the shared browser once the suite is done
    async fn shutdown(&self) -> TestResult<()> {
        Ok(())
    }
}
