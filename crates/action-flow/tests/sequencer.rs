use std::sync::{Arc, Mutex};
use std::time::Duration;

use action_flow::{
    FailurePolicy, SequenceStatus, Sequencer, SequencerConfig, StepRunner,
};
use action_primitives::{Action, ActionResult, FailureKind};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
enum Mark {
    Start(String),
    End(String),
}

/// Sleeps for waits, fails selectors containing "missing".
struct ScriptedRunner {
    origin: Instant,
    log: Mutex<Vec<(Mark, Duration)>>,
}

impl ScriptedRunner {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            log: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, mark: Mark) {
        self.log.lock().unwrap().push((mark, self.origin.elapsed()));
    }

    fn marks(&self) -> Vec<Mark> {
        self.log.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    fn at(&self, mark: &Mark) -> Duration {
        self.log
            .lock()
            .unwrap()
            .iter()
            .find(|(m, _)| m == mark)
            .map(|(_, at)| *at)
            .unwrap()
    }
}

#[async_trait]
impl StepRunner for ScriptedRunner {
    async fn run_step(&self, action: &Action) -> ActionResult {
        let name = action.to_string();
        self.record(Mark::Start(name.clone()));
        let result = match action {
            Action::Wait { duration_ms } => {
                tokio::time::sleep(Duration::from_millis(*duration_ms)).await;
                ActionResult::ok(None)
            }
            Action::Click { selector } if selector.contains("missing") => {
                ActionResult::failed(FailureKind::Resolution, format!("no element for {selector}"))
            }
            _ => ActionResult::ok(None),
        };
        self.record(Mark::End(name));
        result
    }
}

fn click(selector: &str) -> Action {
    Action::Click {
        selector: selector.into(),
    }
}

#[tokio::test(start_paused = true)]
async fn steps_run_in_order_and_type_waits_for_wait() {
    let runner = ScriptedRunner::new();
    let sequencer = Sequencer::new(runner.clone());
    let actions = vec![
        click("#a"),
        Action::Wait { duration_ms: 500 },
        Action::Type {
            selector: "#b".into(),
            text: "x".into(),
        },
    ];

    let report = sequencer.run(&actions, &CancellationToken::new()).await;
    assert!(report.is_success());
    assert_eq!(report.status, SequenceStatus::Completed);

    let click_name = actions[0].to_string();
    let wait_name = actions[1].to_string();
    let type_name = actions[2].to_string();
    assert_eq!(
        runner.marks(),
        vec![
            Mark::Start(click_name.clone()),
            Mark::End(click_name),
            Mark::Start(wait_name.clone()),
            Mark::End(wait_name.clone()),
            Mark::Start(type_name.clone()),
            Mark::End(type_name.clone()),
        ]
    );

    // 500 ms settle after the click, then the 500 ms wait, no settle after it.
    let wait_start = runner.at(&Mark::Start(actions[1].to_string()));
    let wait_end = runner.at(&Mark::End(wait_name));
    let type_start = runner.at(&Mark::Start(type_name));
    assert!(wait_start >= Duration::from_millis(500));
    assert!(type_start >= wait_end);
    assert!(type_start < wait_end + Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn navigation_settles_longer() {
    let runner = ScriptedRunner::new();
    let sequencer = Sequencer::new(runner.clone());
    let actions = vec![
        Action::Navigate {
            url: "example.com".into(),
        },
        click("#next"),
    ];
    sequencer.run(&actions, &CancellationToken::new()).await;
    assert!(runner.at(&Mark::Start(actions[1].to_string())) >= Duration::from_millis(2_000));
}

#[tokio::test(start_paused = true)]
async fn continue_policy_runs_past_failures() {
    let runner = ScriptedRunner::new();
    let sequencer = Sequencer::new(runner.clone());
    let report = sequencer
        .run(&[click("#missing"), click("#ok")], &CancellationToken::new())
        .await;

    assert_eq!(report.status, SequenceStatus::Completed);
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());

    let result = report.to_result();
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(FailureKind::Resolution));
    assert_eq!(result.data.unwrap()["steps"][1]["success"], true);
}

#[tokio::test(start_paused = true)]
async fn abort_policy_stops_at_first_failure() {
    let runner = ScriptedRunner::new();
    let sequencer = Sequencer::with_config(
        runner.clone(),
        SequencerConfig {
            failure_policy: FailurePolicy::Abort,
            ..SequencerConfig::default()
        },
    );
    let report = sequencer
        .run(&[click("#ok"), click("#missing"), click("#never")], &CancellationToken::new())
        .await;

    assert_eq!(report.status, SequenceStatus::Aborted { index: 1 });
    assert_eq!(report.steps.len(), 2);
    assert!(!runner
        .marks()
        .contains(&Mark::Start(click("#never").to_string())));
}

#[tokio::test]
async fn invalid_and_nested_steps_are_rejected_without_running() {
    let runner = ScriptedRunner::new();
    let sequencer = Sequencer::with_config(
        runner.clone(),
        SequencerConfig {
            settle_ms: 0,
            ..SequencerConfig::default()
        },
    );
    let report = sequencer
        .run(
            &[
                Action::Automate {
                    instruction: "do it again".into(),
                },
                click("  "),
            ],
            &CancellationToken::new(),
        )
        .await;

    assert!(runner.marks().is_empty());
    assert!(report
        .steps
        .iter()
        .all(|step| step.result.error_kind == Some(FailureKind::Invalid)));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_running_step() {
    let runner = ScriptedRunner::new();
    let sequencer = Arc::new(Sequencer::new(runner.clone()));
    let token = CancellationToken::new();

    let task = {
        let sequencer = sequencer.clone();
        let token = token.clone();
        tokio::spawn(async move {
            sequencer
                .run(&[Action::Wait { duration_ms: 60_000 }, click("#after")], &token)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let report = task.await.unwrap();
    assert_eq!(report.status, SequenceStatus::Cancelled { index: 0 });
    assert_eq!(report.steps[0].result.error_kind, Some(FailureKind::Interrupted));
    assert_eq!(report.to_result().error_kind, Some(FailureKind::Interrupted));
    assert_eq!(runner.marks().len(), 1);
}

#[test]
fn empty_run_completes() {
    let sequencer = Sequencer::new(ScriptedRunner::new());
    let report = tokio_test::block_on(sequencer.run(&[], &CancellationToken::new()));
    assert!(report.is_success());
    assert_eq!(report.message(), "Executed 0 of 0 steps successfully");
}
