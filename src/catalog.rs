//! Built-in TodoMVC scenarios
//!
//! Each scenario starts from a fresh load of the application root; the runner
//! performs that navigation, so none of the step lists begin with one.

use crate::parser::types::{Action, Scenario};

pub const NEW_TODO: &str = ".new-todo";
pub const TODO_ITEMS: &str = ".todo-list li";
pub const TODO_LABELS: &str = ".todo-list li label";
pub const TODO_COUNT: &str = ".todo-count";
pub const CLEAR_COMPLETED: &str = ".clear-completed";
pub const FILTER_ALL: &str = "a[href=\"#/\"]";
pub const FILTER_ACTIVE: &str = "a[href=\"#/active\"]";
pub const FILTER_COMPLETED: &str = "a[href=\"#/completed\"]";
pub const COMPLETED_CLASS: &str = "completed";

/// Selector for a part of the n-th (1-based) rendered item
pub fn nth_item(n: usize, part: &str) -> String {
    format!("{}:nth-child({}) {}", TODO_ITEMS, n, part)
}

/// Fluent builder for scenario step lists
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    name: String,
    steps: Vec<Action>,
}

impl ScenarioBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, action: Action) -> Self {
        self.steps.push(action);
        self
    }

    /// Type a todo into the new-todo input and submit it
    pub fn add_todo(self, text: &str) -> Self {
        self.step(Action::fill(NEW_TODO, text))
            .step(Action::press_key(NEW_TODO, "Enter"))
    }

    pub fn add_todos(self, texts: &[&str]) -> Self {
        texts.iter().fold(self, |b, t| b.add_todo(t))
    }

    pub fn click(self, selector: &str) -> Self {
        self.step(Action::click(selector))
    }

    pub fn expect_count(self, selector: &str, expected: usize) -> Self {
        self.step(Action::assert_count(selector, expected))
    }

    pub fn expect_text(self, selector: &str, expected: &str) -> Self {
        self.step(Action::assert_text(selector, expected))
    }

    pub fn build(self) -> Scenario {
        Scenario::new(self.name, self.steps)
    }
}

/// The nine TodoMVC behaviors under test, in suite order
pub fn todomvc_scenarios() -> Vec<Scenario> {
    vec![
        ScenarioBuilder::new("todo app should load")
            .step(Action::assert_visible(NEW_TODO))
            .expect_count(NEW_TODO, 1)
            .step(Action::assert_text_equals(NEW_TODO, ""))
            .expect_count(TODO_ITEMS, 0)
            .build(),
        ScenarioBuilder::new("should add a new todo item")
            .add_todo("Learn Playwright")
            .expect_count(TODO_ITEMS, 1)
            .expect_text(TODO_ITEMS, "Learn Playwright")
            .build(),
        ScenarioBuilder::new("should add multiple todos")
            .add_todos(&["Buy groceries", "Walk the dog", "Read a book"])
            .expect_count(TODO_ITEMS, 3)
            .expect_text(&nth_item(1, "label"), "Buy groceries")
            .expect_text(&nth_item(2, "label"), "Walk the dog")
            .expect_text(&nth_item(3, "label"), "Read a book")
            .build(),
        ScenarioBuilder::new("should mark todo as completed")
            .add_todo("Complete this task")
            .click(".todo-list li .toggle")
            .step(Action::assert_has_class(TODO_ITEMS, COMPLETED_CLASS))
            .build(),
        ScenarioBuilder::new("should delete a todo item")
            .add_todo("Task to delete")
            .step(Action::hover(TODO_ITEMS))
            .click(".todo-list li .destroy")
            .expect_count(TODO_ITEMS, 0)
            .build(),
        ScenarioBuilder::new("should edit a todo item")
            .add_todo("Original task")
            .step(Action::double_click(TODO_LABELS))
            .step(Action::fill(".todo-list li .edit", "Updated task"))
            .step(Action::press_key(".todo-list li .edit", "Enter"))
            .expect_text(TODO_LABELS, "Updated task")
            .build(),
        ScenarioBuilder::new("should filter todos correctly")
            .add_todos(&["Active task", "Completed task"])
            .click(&nth_item(2, ".toggle"))
            .click(FILTER_ACTIVE)
            .expect_count(TODO_ITEMS, 1)
            .expect_text(TODO_ITEMS, "Active task")
            .click(FILTER_COMPLETED)
            .expect_count(TODO_ITEMS, 1)
            .expect_text(TODO_ITEMS, "Completed task")
            .click(FILTER_ALL)
            .expect_count(TODO_ITEMS, 2)
            .build(),
        ScenarioBuilder::new("should clear completed todos")
            .add_todos(&["Task 1", "Task 2"])
            .click(".todo-list li:first-child .toggle")
            .click(CLEAR_COMPLETED)
            .expect_count(TODO_ITEMS, 1)
            .expect_text(TODO_ITEMS, "Task 2")
            .build(),
        ScenarioBuilder::new("should show correct item count")
            .add_todos(&["Task 1", "Task 2", "Task 3"])
            .expect_text(TODO_COUNT, "3 items left")
            .click(".todo-list li:first-child .toggle")
            .expect_text(TODO_COUNT, "2 items left")
            .build(),
    ]
}
