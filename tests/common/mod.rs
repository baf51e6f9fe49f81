//! In-memory TodoMVC used by the integration tests.
//!
//! Renders lag one read behind the application state: the first read after a
//! change still sees the previous render, the next one sees the change. That
//! forces every assertion through at least one retry.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use todomvc_tester::driver::{PageDriver, SessionFactory};
use todomvc_tester::runner::EventEmitter;
use todomvc_tester::utils::config::Config;
use todomvc_tester::{runner::ScenarioRunner, TestError, TestResult};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

#[derive(Debug, Clone)]
struct Todo {
    title: String,
    completed: bool,
}

#[derive(Debug, Clone, Default)]
struct AppState {
    todos: Vec<Todo>,
    input: String,
    filter: Filter,
    editing: Option<usize>,
    edit_value: String,
    hovered: Option<usize>,
}

impl AppState {
    /// Indices into `todos` of the rendered list items
    fn visible(&self) -> Vec<usize> {
        self.todos
            .iter()
            .enumerate()
            .filter(|(_, t)| match self.filter {
                Filter::All => true,
                Filter::Active => !t.completed,
                Filter::Completed => t.completed,
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn active_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    fn matching_items(&self, sel: ItemSel) -> Vec<usize> {
        let visible = self.visible();
        match sel {
            ItemSel::All => visible,
            ItemSel::Nth(n) => visible.get(n.wrapping_sub(1)).copied().into_iter().collect(),
            ItemSel::Completed => visible
                .into_iter()
                .filter(|&i| self.todos[i].completed)
                .collect(),
        }
    }

    fn matches(&self, target: &Target) -> Vec<usize> {
        match target {
            Target::NewTodo => vec![0],
            Target::Counter | Target::Footer => {
                if self.todos.is_empty() {
                    vec![]
                } else {
                    vec![0]
                }
            }
            Target::ClearCompleted => {
                if self.todos.iter().any(|t| t.completed) {
                    vec![0]
                } else {
                    vec![]
                }
            }
            Target::FilterLink(_) => {
                if self.todos.is_empty() {
                    vec![]
                } else {
                    vec![0]
                }
            }
            Target::Item(sel, Part::Edit) => self
                .matching_items(*sel)
                .into_iter()
                .filter(|i| self.editing == Some(*i))
                .collect(),
            Target::Item(sel, _) => self.matching_items(*sel),
            Target::Unknown => vec![],
        }
    }

    fn counter_text(&self) -> String {
        let n = self.active_count();
        format!("{} {} left", n, if n == 1 { "item" } else { "items" })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ItemSel {
    All,
    Nth(usize),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Part {
    Item,
    Label,
    Toggle,
    Destroy,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    NewTodo,
    Item(ItemSel, Part),
    Counter,
    Footer,
    ClearCompleted,
    FilterLink(Filter),
    Unknown,
}

fn parse_selector(selector: &str) -> Target {
    let selector = selector.trim();
    match selector {
        ".new-todo" => return Target::NewTodo,
        ".todo-count" => return Target::Counter,
        ".footer" => return Target::Footer,
        ".clear-completed" => return Target::ClearCompleted,
        "a[href=\"#/\"]" => return Target::FilterLink(Filter::All),
        "a[href=\"#/active\"]" => return Target::FilterLink(Filter::Active),
        "a[href=\"#/completed\"]" => return Target::FilterLink(Filter::Completed),
        _ => {}
    }

    let Some(rest) = selector.strip_prefix(".todo-list li") else {
        return Target::Unknown;
    };

    let (item, part) = match rest.split_once(' ') {
        Some((item, part)) => (item, part.trim()),
        None => (rest, ""),
    };

    let sel = if item.is_empty() {
        ItemSel::All
    } else if item == ":first-child" {
        ItemSel::Nth(1)
    } else if item == ".completed" {
        ItemSel::Completed
    } else if let Some(n) = item
        .strip_prefix(":nth-child(")
        .and_then(|s| s.strip_suffix(')'))
        .and_then(|s| s.parse().ok())
    {
        ItemSel::Nth(n)
    } else {
        return Target::Unknown;
    };

    let part = match part {
        "" => Part::Item,
        "label" => Part::Label,
        ".toggle" => Part::Toggle,
        ".destroy" => Part::Destroy,
        ".edit" => Part::Edit,
        _ => return Target::Unknown,
    };

    Target::Item(sel, part)
}

struct PageState {
    live: AppState,
    rendered: AppState,
}

/// One fake page session
pub struct FakePage {
    state: Mutex<PageState>,
    action_delay: Option<Duration>,
    screenshot_delay: Option<Duration>,
    closed: Arc<AtomicUsize>,
}

impl FakePage {
    fn new(
        action_delay: Option<Duration>,
        screenshot_delay: Option<Duration>,
        closed: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            state: Mutex::new(PageState {
                live: AppState::default(),
                rendered: AppState::default(),
            }),
            action_delay,
            screenshot_delay,
            closed,
        }
    }

    /// The current render; the next read will see the latest state
    fn read(&self) -> AppState {
        let mut state = self.state.lock().unwrap();
        let snapshot = state.rendered.clone();
        state.rendered = state.live.clone();
        snapshot
    }

    async fn act<F>(&self, action: &str, selector: &str, f: F) -> TestResult<()>
    where
        F: FnOnce(&mut AppState, Target, Vec<usize>) -> TestResult<()>,
    {
        if let Some(delay) = self.action_delay {
            tokio::time::sleep(delay).await;
        }
        let target = parse_selector(selector);
        let mut state = self.state.lock().unwrap();
        let matches = state.live.matches(&target);
        if matches.is_empty() {
            return Err(TestError::not_found(selector));
        }
        f(&mut state.live, target, matches).map_err(|e| match e {
            TestError::ActionTimeout { detail, .. } => TestError::action(action, selector, detail),
            other => other,
        })
    }
}

fn not_interactable() -> TestResult<()> {
    Err(TestError::action("", "", "element is not interactable"))
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> TestResult<()> {
        if url.contains("unreachable") {
            return Err(TestError::NavigationFailure {
                url: url.to_string(),
                detail: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        state.live.filter = match url.rsplit_once('#') {
            Some((_, "/active")) => Filter::Active,
            Some((_, "/completed")) => Filter::Completed,
            _ => Filter::All,
        };
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> TestResult<()> {
        self.act("fill", selector, |app, target, _| {
            match target {
                Target::NewTodo => app.input = text.to_string(),
                Target::Item(_, Part::Edit) => app.edit_value = text.to_string(),
                _ => return not_interactable(),
            }
            Ok(())
        })
        .await
    }

    async fn press_key(&self, selector: &str, key: &str) -> TestResult<()> {
        self.act("pressKey", selector, |app, target, _| {
            match (target, key) {
                (Target::NewTodo, "Enter") => {
                    let title = app.input.trim().to_string();
                    if !title.is_empty() {
                        app.todos.push(Todo {
                            title,
                            completed: false,
                        });
                    }
                    app.input.clear();
                }
                (Target::Item(_, Part::Edit), "Enter") => {
                    if let Some(i) = app.editing.take() {
                        let title = app.edit_value.trim().to_string();
                        if title.is_empty() {
                            app.todos.remove(i);
                        } else {
                            app.todos[i].title = title;
                        }
                    }
                }
                (Target::Item(_, Part::Edit), "Escape") => app.editing = None,
                _ => {}
            }
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str) -> TestResult<()> {
        self.act("click", selector, |app, target, matches| {
            let first = matches[0];
            match target {
                Target::Item(_, Part::Toggle) => {
                    app.todos[first].completed = !app.todos[first].completed;
                }
                Target::Item(_, Part::Destroy) => {
                    // Only rendered while the item is hovered
                    if app.hovered != Some(first) {
                        return not_interactable();
                    }
                    app.todos.remove(first);
                    app.hovered = None;
                }
                Target::ClearCompleted => app.todos.retain(|t| !t.completed),
                Target::FilterLink(filter) => app.filter = filter,
                Target::NewTodo | Target::Item(..) => {}
                _ => return not_interactable(),
            }
            Ok(())
        })
        .await
    }

    async fn hover(&self, selector: &str) -> TestResult<()> {
        self.act("hover", selector, |app, target, matches| {
            app.hovered = match target {
                Target::Item(..) => Some(matches[0]),
                _ => None,
            };
            Ok(())
        })
        .await
    }

    async fn double_click(&self, selector: &str) -> TestResult<()> {
        self.act("doubleClick", selector, |app, target, matches| {
            if let Target::Item(_, Part::Label) = target {
                app.editing = Some(matches[0]);
                app.edit_value = app.todos[matches[0]].title.clone();
            }
            Ok(())
        })
        .await
    }

    async fn count_matching(&self, selector: &str) -> TestResult<usize> {
        Ok(self.read().matches(&parse_selector(selector)).len())
    }

    async fn text_of(&self, selector: &str) -> TestResult<String> {
        let app = self.read();
        let target = parse_selector(selector);
        let matches = app.matches(&target);
        if matches.is_empty() {
            return Err(TestError::not_found(selector));
        }

        let text = match target {
            Target::NewTodo => app.input.clone(),
            Target::Counter => app.counter_text(),
            Target::Footer => format!("{}\nAll\nActive\nCompleted", app.counter_text()),
            Target::ClearCompleted => "Clear completed".to_string(),
            Target::FilterLink(f) => format!("{:?}", f),
            Target::Item(_, Part::Edit) => app.edit_value.clone(),
            Target::Item(..) => matches
                .iter()
                .map(|&i| app.todos[i].title.clone())
                .collect::<Vec<_>>()
                .join("\n"),
            Target::Unknown => String::new(),
        };
        Ok(text)
    }

    async fn has_class(&self, selector: &str, class_name: &str) -> TestResult<bool> {
        let app = self.read();
        let target = parse_selector(selector);
        let matches = app.matches(&target);
        let Some(&first) = matches.first() else {
            return Err(TestError::not_found(selector));
        };

        Ok(match (target, class_name) {
            (Target::Item(_, Part::Item), "completed") => app.todos[first].completed,
            (Target::Item(_, Part::Item), "editing") => app.editing == Some(first),
            (Target::NewTodo, "new-todo") => true,
            _ => false,
        })
    }

    async fn is_visible(&self, selector: &str) -> TestResult<bool> {
        Ok(!self.read().matches(&parse_selector(selector)).is_empty())
    }

    async fn take_screenshot(&self, path: &str) -> TestResult<()> {
        if let Some(delay) = self.screenshot_delay {
            tokio::time::sleep(delay).await;
        }
        std::fs::write(path, b"\x89PNG fake").map_err(|e| TestError::Session(e.to_string()))
    }

    async fn page_content(&self) -> TestResult<String> {
        let app = self.read();
        let items: String = app
            .todos
            .iter()
            .map(|t| format!("<li><label>{}</label></li>", t.title))
            .collect();
        Ok(format!(
            "<html><body><input class=\"new-todo\"><ul class=\"todo-list\">{}</ul></body></html>",
            items
        ))
    }

    async fn close(&self) -> TestResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Session factory handing out fresh fake pages
#[derive(Default)]
pub struct FakeTodoApp {
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    /// Sleep before every interaction
    pub action_delay: Option<Duration>,
    /// Sleep before writing a screenshot
    pub screenshot_delay: Option<Duration>,
    /// Refuse to open sessions
    pub fail_open: bool,
}

impl FakeTodoApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            action_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeTodoApp {
    fn browser_name(&self) -> String {
        "fake".to_string()
    }

    async fn open(&self) -> TestResult<Box<dyn PageDriver>> {
        if self.fail_open {
            return Err(TestError::Session("browser context refused".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage::new(
            self.action_delay,
            self.screenshot_delay,
            self.closed.clone(),
        )))
    }
}

/// Tight timeouts so failing assertions give up quickly
pub fn test_config() -> Config {
    Config {
        base_url: "http://todomvc.test".to_string(),
        assertion_timeout_ms: 500,
        poll_interval_ms: 10,
        action_timeout_ms: 500,
        ..Config::default()
    }
}

pub fn runner(app: Arc<FakeTodoApp>, config: Config) -> ScenarioRunner {
    ScenarioRunner::new(app, config, EventEmitter::default())
}
