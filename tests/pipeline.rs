use std::sync::Arc;
use std::time::Duration;

use action_flow::SequencerConfig;
use action_primitives::{Action, FailureKind};
use extensions_bridge::{Bridge, Endpoint, TabInfo};
use page_dom::{Dom, DomEvent, ElementSpec, EventKind, MemoryDom, NodeId};
use pretty_assertions::assert_eq;
use taxy_cli::{
    CommandListPlanner, CommandRouter, Config, InterceptOutcome, PipelineContext, Session,
    StaticCapture,
};
use taxy_core_types::{SelectionType, TabId};
use taxy_state_center::{StateCenter, HISTORY_CAPACITY};

struct Page {
    dom: Arc<MemoryDom>,
    submit: NodeId,
    prompt: NodeId,
}

fn chat_page(url: &str) -> Page {
    let dom = Arc::new(MemoryDom::with_location(url));
    let body = dom.body();
    let submit = dom.append(body, ElementSpec::new("button").id("submit").text("Send"));
    for text in ["Hello", "How can I help?"] {
        dom.append(body, ElementSpec::new("div").class("message").text(text));
    }
    let prompt = dom.append(
        body,
        ElementSpec::new("textarea")
            .id("prompt")
            .attr("placeholder", "Send a message"),
    );
    Page {
        dom,
        submit,
        prompt,
    }
}

fn quick_config() -> Config {
    Config {
        sequencer: SequencerConfig {
            settle_ms: 0,
            navigate_settle_ms: 0,
            ..SequencerConfig::default()
        },
        ..Config::default()
    }
}

fn session_with(config: Config) -> Session {
    Session::start(
        PipelineContext::new(config, StateCenter::in_memory()),
        Arc::new(StaticCapture::new(vec![1, 2, 3])),
        Some(Arc::new(CommandListPlanner::new())),
    )
}

fn executed(outcome: InterceptOutcome) -> action_primitives::ActionResult {
    match outcome {
        InterceptOutcome::Executed { result } => result,
        other => panic!("expected an executed command, got {other:?}"),
    }
}

#[tokio::test]
async fn click_command_runs_in_the_page_and_is_recorded() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    let result = executed(handle.submit(r##"/taxy click "#submit""##).await);
    assert!(result.success, "{result:?}");
    assert_eq!(
        page.dom.events_on(page.submit),
        vec![EventKind::MouseDown, EventKind::MouseUp, EventKind::Click]
    );

    let history = session.context().state().history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text, r##"click("#submit")"##);
}

#[tokio::test]
async fn navigate_adds_the_scheme() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    let result = executed(handle.submit("/taxy navigate example.com").await);
    assert!(result.success);
    assert_eq!(page.dom.location(), "https://example.com");
}

#[tokio::test]
async fn malformed_commands_are_never_dispatched() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    match handle.submit("/taxy wait notanumber").await {
        InterceptOutcome::Rejected { result } => {
            assert!(!result.success);
            assert_eq!(result.error_kind, Some(FailureKind::Parse));
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
    assert_eq!(handle.submit("hello there").await, InterceptOutcome::Ignored);
    assert!(page.dom.events().is_empty());
    assert!(session.context().state().history().is_empty());
}

#[tokio::test]
async fn help_stays_in_the_page() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    match handle.submit("/taxy help").await {
        InterceptOutcome::Help { text } => assert!(text.contains("/taxy click")),
        other => panic!("expected help, got {other:?}"),
    }
}

#[tokio::test]
async fn failures_come_back_as_results() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    let missing = executed(handle.submit("/taxy click #nowhere").await);
    assert!(!missing.success);
    assert_eq!(missing.error_kind, Some(FailureKind::Resolution));

    let not_text = executed(handle.submit("/taxy type #submit hello").await);
    assert_eq!(not_text.error_kind, Some(FailureKind::UnsupportedElement));
    assert!(session.context().state().history().is_empty());
}

#[tokio::test]
async fn enter_submits_the_chat_input_and_clears_it() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    page.dom.set_value(page.prompt, "/taxy test .message").unwrap();
    let handle = session.open_tab(page.dom.clone());

    assert_eq!(handle.interceptor.on_key_down("Enter", true).await, None);
    let result = executed(handle.interceptor.on_key_down("Enter", false).await.unwrap());
    assert!(result.success);
    assert_eq!(result.data.unwrap()["count"], 2);
    assert_eq!(page.dom.value(page.prompt).as_deref(), Some(""));

    page.dom.set_value(page.prompt, "just chatting").unwrap();
    assert_eq!(handle.interceptor.on_key_down("Enter", false).await, None);
    assert_eq!(page.dom.value(page.prompt).as_deref(), Some("just chatting"));
}

#[tokio::test]
async fn enter_key_events_on_the_chat_input_are_intercepted() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    page.dom.set_value(page.prompt, "/taxy test .message").unwrap();
    let handle = session.open_tab(page.dom.clone());
    let mut outcomes = handle.interceptor.subscribe();

    let shifted = page
        .dom
        .dispatch_event(page.prompt, DomEvent::key_down("Enter").with_shift());
    assert_eq!(shifted, Ok(true));
    assert_eq!(page.dom.value(page.prompt).as_deref(), Some("/taxy test .message"));

    let enter = page.dom.dispatch_event(page.prompt, DomEvent::key_down("Enter"));
    assert_eq!(enter, Ok(false), "the chat never sees the command");
    assert_eq!(page.dom.value(page.prompt).as_deref(), Some(""));
    let result = executed(outcomes.recv().await.unwrap());
    assert!(result.success, "{result:?}");
    assert_eq!(result.data.unwrap()["count"], 2);

    page.dom.set_value(page.prompt, "just chatting").unwrap();
    let chat = page.dom.dispatch_event(page.prompt, DomEvent::key_down("Enter"));
    assert_eq!(chat, Ok(true));
    assert_eq!(page.dom.value(page.prompt).as_deref(), Some("just chatting"));

    page.dom.set_value(page.prompt, "/taxy help").unwrap();
    let elsewhere = page.dom.dispatch_event(page.submit, DomEvent::key_down("Enter"));
    assert_eq!(elsewhere, Ok(true));
    assert_eq!(page.dom.value(page.prompt).as_deref(), Some("/taxy help"));

    let listeners = page.dom.listener_count();
    session.close_tab(handle);
    assert_eq!(page.dom.listener_count(), listeners - 1);
}

#[tokio::test]
async fn screenshots_round_trip_through_the_host() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    let result = executed(handle.submit("/taxy screenshot #prompt").await);
    assert!(result.success, "{result:?}");
    let data_url = result.data.unwrap()["dataUrl"].as_str().unwrap().to_string();
    assert_eq!(data_url, "data:image/png;base64,AQID");
    assert_eq!(
        session.context().state().last_screenshot().as_deref(),
        Some("data:image/png;base64,AQID")
    );
}

#[tokio::test]
async fn area_selection_is_persisted_and_used_by_new_pages() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let config = Config {
        state_path: Some(state_path.clone()),
        ..quick_config()
    };
    let session = Session::start(
        PipelineContext::open(config).unwrap(),
        Arc::new(StaticCapture::new(Vec::new())),
        None,
    );
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());
    let listeners_before = page.dom.listener_count();

    let area = session
        .select_area(&handle, SelectionType::Input, "textarea")
        .await
        .unwrap();
    assert_eq!(area.selector, "#prompt");
    assert_eq!(area.name, "Message input area");
    assert_eq!(page.dom.listener_count(), listeners_before);
    assert!(!handle.content.selection().is_selecting());

    let reopened = StateCenter::open(&state_path).unwrap();
    assert_eq!(
        reopened.selector(SelectionType::Input).as_deref(),
        Some("#prompt")
    );

    let second = session.open_tab(chat_page("https://chat.example.com/").dom);
    assert_eq!(second.interceptor.input_selector(), "#prompt");
}

#[tokio::test]
async fn target_tab_is_fixed_when_the_command_is_enqueued() {
    let session = session_with(quick_config());
    let first = chat_page("https://one.example.com/");
    let second = chat_page("https://two.example.com/");
    let _first_handle = session.open_tab(first.dom.clone());
    let second_handle = session.open_tab(second.dom.clone());

    let router = session.background().router();
    let queued = router.enqueue(Action::Click {
        selector: "#submit".into(),
    });
    session
        .context()
        .bridge()
        .activate_tab(second_handle.tab)
        .unwrap();

    let result = router.send(queued).await;
    assert!(result.success);
    assert_eq!(first.dom.events_on(first.submit).len(), 3);
    assert!(second.dom.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn automation_steps_stay_on_the_tab_they_started_on() {
    let session = session_with(quick_config());
    let first = chat_page("https://one.example.com/");
    let second = chat_page("https://two.example.com/");
    let _first_handle = session.open_tab(first.dom.clone());
    let second_handle = session.open_tab(second.dom.clone());

    let background = session.background().clone();
    let run = tokio::spawn(async move { background.automate("wait 300; click #submit").await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    session
        .context()
        .bridge()
        .activate_tab(second_handle.tab)
        .unwrap();

    let result = run.await.unwrap();
    assert!(result.success, "{result:?}");
    assert_eq!(first.dom.events_on(first.submit).len(), 3);
    assert!(second.dom.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn silent_pages_time_out_with_their_own_kind() {
    let config = Config {
        dispatch_timeout_ms: 200,
        ..quick_config()
    };
    let ctx = PipelineContext::new(config.clone(), StateCenter::in_memory());
    let bridge = ctx.bridge().clone();
    // Registered but never served.
    let _inbox = bridge.open_tab(TabInfo::new(TabId(7), "https://chat.example.com/"));

    let router = CommandRouter::from_context(&ctx);
    let started = tokio::time::Instant::now();
    let result = router
        .dispatch(Action::Wait { duration_ms: 300 })
        .await;
    assert_eq!(result.error_kind, Some(FailureKind::Timeout));
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(bridge.pending_count(), 0);
    assert!(ctx.state().history().is_empty());
}

#[tokio::test]
async fn no_open_tab_is_a_dispatch_failure() {
    let ctx = PipelineContext::new(quick_config(), StateCenter::in_memory());
    let router = CommandRouter::from_context(&ctx);
    let queued = router.enqueue(Action::Click {
        selector: "#submit".into(),
    });
    assert_eq!(queued.endpoint(), None);
    let result = router.send(queued).await;
    assert_eq!(result.error_kind, Some(FailureKind::Dispatch));

    let invalid = router
        .dispatch(Action::Click {
            selector: " ".into(),
        })
        .await;
    assert_eq!(invalid.error_kind, Some(FailureKind::Invalid));
}

#[tokio::test]
async fn history_keeps_the_latest_fifty_dispatches() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let _handle = session.open_tab(page.dom.clone());
    let router = session.background().router();

    for index in 0..HISTORY_CAPACITY + 5 {
        let result = router.dispatch(Action::Wait { duration_ms: 0 }).await;
        assert!(result.success, "dispatch {index} failed");
    }
    let history = session.context().state().history();
    assert_eq!(history.len(), HISTORY_CAPACITY);
}

#[tokio::test]
async fn automation_plans_and_runs_each_step() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    let result = executed(
        handle
            .submit("/taxy automate type #prompt hi there; click #submit")
            .await,
    );
    assert!(result.success, "{result:?}");
    let data = result.data.unwrap();
    assert_eq!(data["message"], "Executed 2 of 2 steps successfully");
    assert_eq!(page.dom.value(page.prompt).as_deref(), Some("hi there"));
    assert_eq!(page.dom.events_on(page.submit).len(), 3);

    let history: Vec<_> = session
        .context()
        .state()
        .history()
        .into_iter()
        .map(|entry| entry.text)
        .collect();
    assert_eq!(
        history,
        vec![r##"type("#prompt", "hi there")"##, r##"click("#submit")"##]
    );
}

#[tokio::test]
async fn automation_without_a_planner_is_refused() {
    let session = Session::start(
        PipelineContext::new(quick_config(), StateCenter::in_memory()),
        Arc::new(StaticCapture::new(Vec::new())),
        None,
    );
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    let result = executed(handle.submit("/taxy please log me in").await);
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("no action planner configured"));
    assert!(page.dom.events().is_empty());
}

#[tokio::test]
async fn page_outline_is_served_to_the_background() {
    let session = session_with(quick_config());
    let page = chat_page("https://chat.example.com/");
    let handle = session.open_tab(page.dom.clone());

    let reply = session
        .context()
        .bridge()
        .invoke_endpoint(
            Endpoint::Background,
            Endpoint::Tab(handle.tab),
            extensions_bridge::CommandMessage::GetPageDom,
            Duration::from_secs(1),
        )
        .await
        .unwrap();
    let outline = reply.data.unwrap()["dom"].as_str().unwrap().to_string();
    assert!(outline.contains(r#"<button id="submit">"#), "{outline}");
    assert!(outline.contains("textarea"));
}
