mod common;

use common::{runner, test_config, FakeTodoApp};
use std::sync::Arc;
use std::time::Duration;
use todomvc_tester::catalog::{todomvc_scenarios, ScenarioBuilder, NEW_TODO, TODO_ITEMS};
use todomvc_tester::parser::types::Scenario;
use todomvc_tester::parser::yaml::load_scenarios;
use todomvc_tester::runner::{ScenarioOutcome, ScenarioStatus, StepStatus, TestEvent};
use todomvc_tester::TestError;

fn passing(name: &str) -> Scenario {
    ScenarioBuilder::new(name)
        .add_todo("ok")
        .expect_count(TODO_ITEMS, 1)
        .build()
}

fn failing(name: &str) -> Scenario {
    ScenarioBuilder::new(name)
        .add_todo("only one")
        .expect_count(TODO_ITEMS, 2)
        .add_todo("never added")
        .expect_count(TODO_ITEMS, 2)
        .build()
}

#[tokio::test]
async fn test_failure_is_isolated_and_rest_of_scenario_skipped() {
    let app = Arc::new(FakeTodoApp::new());
    let scenarios = vec![passing("before"), failing("broken"), passing("after")];
    let result = runner(app.clone(), test_config())
        .run_suite(&scenarios)
        .await
        .unwrap();

    assert_eq!(result.outcome("before"), Some(&ScenarioOutcome::Pass));
    assert_eq!(result.outcome("after"), Some(&ScenarioOutcome::Pass));

    let broken = &result.scenarios[1];
    assert_eq!(broken.status, ScenarioStatus::Failed);
    assert_eq!(broken.error_kind.as_deref(), Some("AssertionTimeout"));
    assert!(broken
        .failure_reason()
        .unwrap()
        .contains("last observed: 1"));

    let statuses: Vec<&StepStatus> = broken.steps.iter().map(|s| &s.status).collect();
    assert_eq!(statuses[0], &StepStatus::Passed);
    assert_eq!(statuses[1], &StepStatus::Passed);
    assert!(matches!(statuses[2], StepStatus::Failed { .. }));
    assert!(statuses[3..]
        .iter()
        .all(|s| matches!(s, StepStatus::Skipped { .. })));

    assert_eq!(result.summary.failed, 1);
    assert_eq!(result.summary.skipped_steps, 3);
    assert_eq!(app.opened(), 3);
    assert_eq!(app.closed(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_suite_timeout_fails_unfinished_scenarios() {
    // Every interaction takes a second; the first scenario needs three
    let app = Arc::new(FakeTodoApp::slow(Duration::from_secs(1)));
    let mut config = test_config();
    config.suite_timeout_ms = Some(4_500);

    let scenarios = vec![
        ScenarioBuilder::new("quick")
            .add_todo("a")
            .click(".todo-list li .toggle")
            .build(),
        ScenarioBuilder::new("slow")
            .add_todos(&["a", "b", "c"])
            .expect_count(TODO_ITEMS, 3)
            .build(),
        passing("never started"),
    ];

    let result = runner(app.clone(), config)
        .run_suite(&scenarios)
        .await
        .unwrap();

    assert_eq!(result.outcome("quick"), Some(&ScenarioOutcome::Pass));

    let timeout = ScenarioOutcome::Fail {
        reason: TestError::Timeout.to_string(),
    };
    assert_eq!(result.outcome("slow"), Some(&timeout));
    assert_eq!(result.outcome("never started"), Some(&timeout));

    let slow = &result.scenarios[1];
    assert_eq!(slow.error_kind.as_deref(), Some("Timeout"));
    assert_eq!(slow.steps[0].status, StepStatus::Passed);
    assert!(matches!(slow.steps[1].status, StepStatus::Failed { .. }));
    assert!(slow.steps[2..]
        .iter()
        .all(|s| matches!(s.status, StepStatus::Skipped { .. })));

    // Sessions opened before the deadline are still released
    assert_eq!(app.opened(), 2);
    assert_eq!(app.closed(), 2);
}

#[tokio::test]
async fn test_sessions_closed_on_every_path() {
    let app = Arc::new(FakeTodoApp::new());
    let mut unreachable = passing("unreachable");
    unreachable.url = Some("http://unreachable.test/".to_string());

    let scenarios = vec![passing("ok"), failing("assertion fails"), unreachable];
    let result = runner(app.clone(), test_config())
        .run_suite(&scenarios)
        .await
        .unwrap();

    let nav = &result.scenarios[2];
    assert_eq!(nav.error_kind.as_deref(), Some("NavigationFailure"));
    assert!(nav
        .steps
        .iter()
        .all(|s| matches!(s.status, StepStatus::Skipped { .. })));

    assert_eq!(app.opened(), 3);
    assert_eq!(app.closed(), 3);
}

#[tokio::test]
async fn test_session_open_failure_fails_scenario() {
    let app = Arc::new(FakeTodoApp {
        fail_open: true,
        ..FakeTodoApp::default()
    });
    let result = runner(app.clone(), test_config())
        .run_suite(&[passing("no browser")])
        .await
        .unwrap();

    assert_eq!(
        result.scenarios[0].error_kind.as_deref(),
        Some("SessionError")
    );
    assert_eq!(app.closed(), 0);
}

#[tokio::test]
async fn test_duplicate_scenario_names_rejected() {
    let app = Arc::new(FakeTodoApp::new());
    let err = runner(app.clone(), test_config())
        .run_suite(&[passing("same"), passing("same")])
        .await
        .unwrap_err();

    assert_eq!(err, TestError::DuplicateScenario("same".to_string()));
    assert_eq!(app.opened(), 0);
}

#[tokio::test]
async fn test_filter_selects_by_name_case_insensitive() {
    let app = Arc::new(FakeTodoApp::new());
    let result = runner(app.clone(), test_config())
        .with_filter(Some("TODO ITEM".to_string()))
        .run_suite(&todomvc_scenarios())
        .await
        .unwrap();

    let names: Vec<&str> = result.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "should add a new todo item",
            "should delete a todo item",
            "should edit a todo item"
        ]
    );
    assert_eq!(app.opened(), 3);
}

#[tokio::test]
async fn test_failure_artifacts_written_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.artifacts = true;
    config.output_dir = dir.path().join("out");

    let result = runner(Arc::new(FakeTodoApp::new()), config)
        .run_suite(&[failing("capture me")])
        .await
        .unwrap();

    let screenshot = result.scenarios[0].screenshot_path.clone().unwrap();
    assert!(std::path::Path::new(&screenshot).exists());

    let html: Vec<_> = std::fs::read_dir(dir.path().join("out"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |x| x == "html"))
        .collect();
    assert_eq!(html.len(), 1);
    let content = std::fs::read_to_string(html[0].path()).unwrap();
    assert!(content.contains("<label>only one</label>"));
}

#[tokio::test]
async fn test_deadline_during_capture_keeps_step_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(FakeTodoApp {
        screenshot_delay: Some(Duration::from_secs(10)),
        ..FakeTodoApp::default()
    });
    let mut config = test_config();
    config.artifacts = true;
    config.output_dir = dir.path().to_path_buf();
    config.suite_timeout_ms = Some(1_500);

    let result = runner(app.clone(), config)
        .run_suite(&[failing("slow capture")])
        .await
        .unwrap();

    let scenario = &result.scenarios[0];
    assert_eq!(scenario.error_kind.as_deref(), Some("AssertionTimeout"));
    assert!(scenario
        .failure_reason()
        .unwrap()
        .contains("last observed: 1"));
    assert!(matches!(scenario.steps[2].status, StepStatus::Failed { .. }));
    assert!(scenario.steps[3..]
        .iter()
        .all(|s| matches!(s.status, StepStatus::Skipped { .. })));
    assert_eq!(app.closed(), 1);
}

#[tokio::test]
async fn test_no_artifacts_by_default() {
    let result = runner(Arc::new(FakeTodoApp::new()), test_config())
        .run_suite(&[failing("no capture")])
        .await
        .unwrap();
    assert_eq!(result.scenarios[0].screenshot_path, None);
}

#[tokio::test]
async fn test_events_cover_suite_lifecycle() {
    let app = Arc::new(FakeTodoApp::new());
    let runner = runner(app, test_config());
    let mut rx = runner.subscribe();

    runner
        .run_suite(&[passing("one"), failing("two")])
        .await
        .unwrap();
    drop(runner);

    let mut kinds = Vec::new();
    while let Ok(event) = rx.recv().await {
        kinds.push(match event {
            TestEvent::SuiteStarted { .. } => "suite_started",
            TestEvent::SuiteFinished { .. } => "suite_finished",
            TestEvent::ScenarioStarted { .. } => "scenario_started",
            TestEvent::ScenarioFinished { .. } => "scenario_finished",
            TestEvent::StepPassed { .. } => "step_passed",
            TestEvent::StepFailed { .. } => "step_failed",
            TestEvent::Log { .. } => "log",
        });
    }

    assert_eq!(kinds.first(), Some(&"suite_started"));
    assert_eq!(kinds.last(), Some(&"suite_finished"));
    assert_eq!(kinds.iter().filter(|k| **k == "scenario_finished").count(), 2);
    assert_eq!(kinds.iter().filter(|k| **k == "step_failed").count(), 1);
}

#[tokio::test]
async fn test_yaml_scenarios_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("complete.yaml"),
        r#"
name: complete a todo
env:
  TITLE: "Walk the dog"
---
- fill:
    selector: ".new-todo"
    text: "${TITLE}"
- pressKey: { selector: ".new-todo", key: Enter }
- click: ".todo-list li .toggle"
- assertHasClass: { selector: ".todo-list li", class: completed }
- assertText: { selector: ".todo-count", expected: "0 items left" }
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("start_on_active.yaml"),
        r##"
url: "#/active"
---
- assertVisible: ".new-todo"
- assertCount: { selector: ".todo-list li", count: 0 }
"##,
    )
    .unwrap();

    let scenarios = load_scenarios(dir.path()).unwrap();
    assert_eq!(scenarios.len(), 2);
    assert_eq!(scenarios[0].steps[0], todomvc_tester::parser::Action::fill(NEW_TODO, "Walk the dog"));

    let result = runner(Arc::new(FakeTodoApp::new()), test_config())
        .run_suite(&scenarios)
        .await
        .unwrap();
    assert!(result.all_passed(), "{:?}", result.scenarios);
}
