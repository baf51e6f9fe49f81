use thiserror::Error;

/// Failure of a single driver operation, assertion or scenario lifecycle step.
///
/// Every variant is local to the scenario that produced it: the runner records
/// it as the scenario's failure reason and moves on to the next scenario.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TestError {
    /// The selector matched nothing within the action timeout
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    /// The element was found but the interaction could not complete
    #[error("{action} on '{selector}' did not complete: {detail}")]
    ActionTimeout {
        action: String,
        selector: String,
        detail: String,
    },

    /// The expected condition was never observed; carries the last observation
    #[error("Expected {selector} to {expected}, last observed: {last_observed}")]
    AssertionTimeout {
        selector: String,
        expected: String,
        last_observed: String,
    },

    #[error("Navigation to {url} failed: {detail}")]
    NavigationFailure { url: String, detail: String },

    /// The suite deadline elapsed while the scenario was pending or running
    #[error("Timeout: suite deadline exceeded")]
    Timeout,

    /// A browser context could not be opened or released
    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Duplicate scenario name: {0}")]
    DuplicateScenario(String),
}

impl TestError {
    /// Short machine-friendly kind, used as the JUnit failure type
    pub fn kind(&self) -> &'static str {
        match self {
            TestError::ElementNotFound { .. } => "ElementNotFound",
            TestError::ActionTimeout { .. } => "ActionTimeout",
            TestError::AssertionTimeout { .. } => "AssertionTimeout",
            TestError::NavigationFailure { .. } => "NavigationFailure",
            TestError::Timeout => "Timeout",
            TestError::Session(_) => "SessionError",
            TestError::DuplicateScenario(_) => "DuplicateScenario",
        }
    }

    pub fn not_found(selector: &str) -> Self {
        TestError::ElementNotFound {
            selector: selector.to_string(),
        }
    }

    pub fn action(action: &str, selector: &str, detail: impl ToString) -> Self {
        TestError::ActionTimeout {
            action: action.to_string(),
            selector: selector.to_string(),
            detail: detail.to_string(),
        }
    }
}

pub type TestResult<T> = std::result::Result<T, TestError>;
