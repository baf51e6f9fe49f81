use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One independent end-to-end test case
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Unique within a suite
    pub name: String,
    pub steps: Vec<Action>,
    pub tags: Vec<String>,
    /// Initial page for this scenario; the suite base URL when `None`
    pub url: Option<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            steps,
            tags: Vec::new(),
            url: None,
        }
    }
}

/// One atomic browser interaction or assertion step
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate { url: String },
    Fill { selector: String, text: String },
    PressKey { selector: String, key: String },
    Click { selector: String },
    Hover { selector: String },
    DoubleClick { selector: String },
    AssertCount { selector: String, expected: usize },
    AssertText { selector: String, expected: String },
    /// Whole text (or input value) equals `expected`
    AssertTextEquals { selector: String, expected: String },
    AssertHasClass { selector: String, class_name: String },
    AssertVisible { selector: String },
}

impl Action {
    pub fn navigate(url: &str) -> Self {
        Action::Navigate {
            url: url.to_string(),
        }
    }

    pub fn fill(selector: &str, text: &str) -> Self {
        Action::Fill {
            selector: selector.to_string(),
            text: text.to_string(),
        }
    }

    pub fn press_key(selector: &str, key: &str) -> Self {
        Action::PressKey {
            selector: selector.to_string(),
            key: key.to_string(),
        }
    }

    pub fn click(selector: &str) -> Self {
        Action::Click {
            selector: selector.to_string(),
        }
    }

    pub fn hover(selector: &str) -> Self {
        Action::Hover {
            selector: selector.to_string(),
        }
    }

    pub fn double_click(selector: &str) -> Self {
        Action::DoubleClick {
            selector: selector.to_string(),
        }
    }

    pub fn assert_count(selector: &str, expected: usize) -> Self {
        Action::AssertCount {
            selector: selector.to_string(),
            expected,
        }
    }

    pub fn assert_text(selector: &str, expected: &str) -> Self {
        Action::AssertText {
            selector: selector.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn assert_text_equals(selector: &str, expected: &str) -> Self {
        Action::AssertTextEquals {
            selector: selector.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn assert_has_class(selector: &str, class_name: &str) -> Self {
        Action::AssertHasClass {
            selector: selector.to_string(),
            class_name: class_name.to_string(),
        }
    }

    pub fn assert_visible(selector: &str) -> Self {
        Action::AssertVisible {
            selector: selector.to_string(),
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Action::AssertCount { .. }
                | Action::AssertText { .. }
                | Action::AssertTextEquals { .. }
                | Action::AssertHasClass { .. }
                | Action::AssertVisible { .. }
        )
    }

    /// Human-readable form used in console output and reports
    pub fn display_name(&self) -> String {
        match self {
            Action::Navigate { url } => format!("navigate(\"{}\")", url),
            Action::Fill { selector, text } => format!("fill(\"{}\", \"{}\")", selector, text),
            Action::PressKey { selector, key } => {
                format!("pressKey(\"{}\", \"{}\")", selector, key)
            }
            Action::Click { selector } => format!("click(\"{}\")", selector),
            Action::Hover { selector } => format!("hover(\"{}\")", selector),
            Action::DoubleClick { selector } => format!("doubleClick(\"{}\")", selector),
            Action::AssertCount { selector, expected } => {
                format!("assertCount(\"{}\", {})", selector, expected)
            }
            Action::AssertText { selector, expected } => {
                format!("assertText(\"{}\", \"{}\")", selector, expected)
            }
            Action::AssertTextEquals { selector, expected } => {
                format!("assertTextEquals(\"{}\", \"{}\")", selector, expected)
            }
            Action::AssertHasClass {
                selector,
                class_name,
            } => format!("assertHasClass(\"{}\", \"{}\")", selector, class_name),
            Action::AssertVisible { selector } => format!("assertVisible(\"{}\")", selector),
        }
    }

    /// Apply `f` to every string argument (selector, text, url, key)
    pub fn map_strings<F: Fn(&str) -> String>(&self, f: F) -> Self {
        match self {
            Action::Navigate { url } => Action::Navigate { url: f(url) },
            Action::Fill { selector, text } => Action::Fill {
                selector: f(selector),
                text: f(text),
            },
            Action::PressKey { selector, key } => Action::PressKey {
                selector: f(selector),
                key: f(key),
            },
            Action::Click { selector } => Action::Click {
                selector: f(selector),
            },
            Action::Hover { selector } => Action::Hover {
                selector: f(selector),
            },
            Action::DoubleClick { selector } => Action::DoubleClick {
                selector: f(selector),
            },
            Action::AssertCount { selector, expected } => Action::AssertCount {
                selector: f(selector),
                expected: *expected,
            },
            Action::AssertText { selector, expected } => Action::AssertText {
                selector: f(selector),
                expected: f(expected),
            },
            Action::AssertTextEquals { selector, expected } => Action::AssertTextEquals {
                selector: f(selector),
                expected: f(expected),
            },
            Action::AssertHasClass {
                selector,
                class_name,
            } => Action::AssertHasClass {
                selector: f(selector),
                class_name: f(class_name),
            },
            Action::AssertVisible { selector } => Action::AssertVisible {
                selector: f(selector),
            },
        }
    }
}

/// Header document of a YAML scenario file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioHeader {
    #[serde(default)]
    pub name: Option<String>,

    /// Overrides the suite base URL for this file's navigations
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, alias = "vars")]
    pub env: Option<HashMap<String, String>>,
}
