use crate::driver::traits::PageDriver;
use crate::error::{TestError, TestResult};
use std::time::Duration;
use tokio::time::Instant;

/// Condition an assertion step waits for
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    Count(usize),
    ContainsText(String),
    ExactText(String),
    HasClass(String),
    Visible,
}

impl Expectation {
    pub fn describe(&self) -> String {
        match self {
            Expectation::Count(n) => format!("have count {}", n),
            Expectation::ContainsText(s) => format!("contain text {:?}", s),
            Expectation::ExactText(s) => format!("have text {:?}", s),
            Expectation::HasClass(c) => format!("have class {:?}", c),
            Expectation::Visible => "be visible".to_string(),
        }
    }
}

/// Bounds on assertion polling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            interval: Duration::from_millis(100),
        }
    }
}

/// Read the current value once. Returns (matched, observed value).
async fn observe(
    driver: &dyn PageDriver,
    selector: &str,
    expectation: &Expectation,
) -> (bool, String) {
    let result = match expectation {
        Expectation::Count(expected) => driver
            .count_matching(selector)
            .await
            .map(|n| (n == *expected, n.to_string())),
        Expectation::ContainsText(expected) => driver
            .text_of(selector)
            .await
            .map(|text| (text.contains(expected.as_str()), format!("{:?}", text))),
        Expectation::ExactText(expected) => driver
            .text_of(selector)
            .await
            .map(|text| (text == *expected, format!("{:?}", text))),
        Expectation::HasClass(class) => driver.has_class(selector, class).await.map(|has| {
            let observed = if has { "class present" } else { "class absent" };
            (has, observed.to_string())
        }),
        Expectation::Visible => driver.is_visible(selector).await.map(|visible| {
            let observed = if visible { "visible" } else { "hidden" };
            (visible, observed.to_string())
        }),
    };

    match result {
        Ok(observation) => observation,
        Err(TestError::ElementNotFound { .. }) => (false, "<no match>".to_string()),
        Err(e) => (false, format!("<error: {}>", e)),
    }
}

/// Poll until the expectation holds or the policy's timeout elapses
///
/// At least one observation is always made. On timeout the error carries the
/// most recently observed value.
pub async fn poll_until(
    driver: &dyn PageDriver,
    selector: &str,
    expectation: &Expectation,
    policy: PollPolicy,
) -> TestResult<()> {
    let deadline = Instant::now() + policy.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let (matched, observed) = observe(driver, selector, expectation).await;
        if matched {
            if attempts > 1 {
                log::debug!(
                    "'{}' matched {} after {} polls",
                    selector,
                    expectation.describe(),
                    attempts
                );
            }
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(TestError::AssertionTimeout {
                selector: selector.to_string(),
                expected: expectation.describe(),
                last_observed: observed,
            });
        }

        tokio::time::sleep(policy.interval.min(deadline - now)).await;
    }
}
