use std::sync::Arc;
use std::time::Duration;

use action_primitives::{Action, ActionResult};
use extensions_bridge::{
    Bridge, BridgeConfig, BridgeError, BridgeEvent, CommandMessage, Endpoint, ExtensionsBridge,
    Inbox, Replier, TabInfo, Target,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use taxy_core_types::{SelectionType, TabId};
use tokio::sync::mpsc;

const TIMEOUT: Duration = Duration::from_secs(5);

fn bridge_with_tab(id: u32) -> (Arc<ExtensionsBridge>, Inbox) {
    let bridge = ExtensionsBridge::new(BridgeConfig::default());
    let inbox = bridge.open_tab(TabInfo::new(TabId(id), "https://chat.example"));
    (bridge, inbox)
}

fn click(selector: &str) -> CommandMessage {
    CommandMessage::ExecuteAction(Action::Click {
        selector: selector.into(),
    })
}

/// Replies to every request with the endpoint name and the origin.
fn echo(mut inbox: Inbox, name: &'static str) {
    tokio::spawn(async move {
        while let Some(mut envelope) = inbox.recv().await {
            let origin = envelope.origin.to_string();
            envelope.respond(ActionResult::ok(Some(json!({"handledBy": name, "origin": origin}))));
        }
    });
}

#[tokio::test]
async fn request_gets_exactly_its_reply() {
    let (bridge, inbox) = bridge_with_tab(1);
    echo(inbox, "tab-1");

    let result = bridge
        .invoke(Endpoint::Background, Target::ActiveTab, click("#go"), TIMEOUT)
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(
        result.data,
        Some(json!({"handledBy": "tab-1", "origin": "background"}))
    );
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn concurrent_requests_are_correlated() {
    let (bridge, mut inbox) = bridge_with_tab(1);
    // Answer in reverse arrival order.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while held.len() < 3 {
            if let Some(envelope) = inbox.recv().await {
                held.push(envelope);
            }
        }
        while let Some(mut envelope) = held.pop() {
            let CommandMessage::ExecuteAction(Action::Click { selector }) = &envelope.message else {
                continue;
            };
            let selector = selector.clone();
            envelope.respond(ActionResult::ok(Some(json!(selector))));
        }
    });

    let calls = ["#a", "#b", "#c"].map(|selector| {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .invoke(Endpoint::Background, Target::Tab(TabId(1)), click(selector), TIMEOUT)
                .await
        })
    });
    for (call, expected) in calls.into_iter().zip(["#a", "#b", "#c"]) {
        let result = call.await.unwrap().unwrap();
        assert_eq!(result.data, Some(json!(expected)));
    }
}

#[tokio::test(start_paused = true)]
async fn silent_endpoint_times_out_and_late_reply_is_discarded() {
    let (bridge, mut inbox) = bridge_with_tab(1);
    let mut events = bridge.subscribe();
    let (held_tx, mut held_rx) = mpsc::unbounded_channel::<Replier>();
    tokio::spawn(async move {
        while let Some(mut envelope) = inbox.recv().await {
            if let Some(replier) = envelope.reply.take() {
                let _ = held_tx.send(replier);
            }
        }
    });

    let err = bridge
        .invoke(
            Endpoint::Background,
            Target::ActiveTab,
            click("#slow"),
            Duration::from_millis(250),
        )
        .await
        .unwrap_err();
    assert_eq!(err, BridgeError::Timeout { ms: 250 });
    assert_eq!(bridge.pending_count(), 0);

    let replier = held_rx.recv().await.unwrap();
    let late_id = replier.id();
    assert!(!replier.send(ActionResult::ok(None)));

    let mut saw_late = false;
    while let Ok(event) = events.try_recv() {
        if event == (BridgeEvent::LateReply { id: late_id }) {
            saw_late = true;
        }
    }
    assert!(saw_late);
}

#[tokio::test]
async fn dropped_request_fails_immediately() {
    let (bridge, mut inbox) = bridge_with_tab(1);
    tokio::spawn(async move {
        while let Some(envelope) = inbox.recv().await {
            drop(envelope);
        }
    });

    let err = bridge
        .invoke(Endpoint::Background, Target::ActiveTab, click("#x"), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err, BridgeError::ChannelClosed);
}

#[tokio::test]
async fn missing_targets_are_reported() {
    let bridge = ExtensionsBridge::new(BridgeConfig::default());
    assert_eq!(
        bridge
            .invoke(Endpoint::Background, Target::ActiveTab, click("#x"), TIMEOUT)
            .await
            .unwrap_err(),
        BridgeError::NoActiveTab
    );
    assert_eq!(
        bridge
            .invoke(Endpoint::Background, Target::Tab(TabId(7)), click("#x"), TIMEOUT)
            .await
            .unwrap_err(),
        BridgeError::EndpointUnavailable(Endpoint::Tab(TabId(7)))
    );
    assert_eq!(
        bridge.activate_tab(TabId(7)).unwrap_err(),
        BridgeError::UnknownTab(TabId(7))
    );
}

#[tokio::test]
async fn closed_inbox_makes_the_endpoint_unavailable() {
    let (bridge, inbox) = bridge_with_tab(1);
    drop(inbox);
    assert_eq!(
        bridge
            .invoke(Endpoint::Background, Target::ActiveTab, click("#x"), TIMEOUT)
            .await
            .unwrap_err(),
        BridgeError::EndpointUnavailable(Endpoint::Tab(TabId(1)))
    );
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn post_carries_no_replier() {
    let (bridge, mut inbox) = bridge_with_tab(3);
    bridge
        .post(
            Endpoint::Background,
            Target::ActiveTab,
            CommandMessage::StartAreaSelection {
                selection_type: SelectionType::Input,
            },
        )
        .await
        .unwrap();
    let envelope = inbox.recv().await.unwrap();
    assert!(envelope.reply.is_none());
    assert_eq!(envelope.origin, Endpoint::Background);
}

#[tokio::test]
async fn resolved_endpoint_ignores_later_tab_switches() {
    let bridge = ExtensionsBridge::new(BridgeConfig::default());
    echo(bridge.open_tab(TabInfo::new(TabId(1), "https://one.test")), "tab-1");
    echo(bridge.open_tab(TabInfo::new(TabId(2), "https://two.test")), "tab-2");

    let pinned = bridge.resolve(Target::ActiveTab).unwrap();
    bridge.activate_tab(TabId(2)).unwrap();

    let result = bridge
        .invoke_endpoint(Endpoint::Background, pinned, click("#a"), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(result.data.unwrap()["handledBy"], json!("tab-1"));

    let result = bridge
        .invoke(Endpoint::Background, Target::ActiveTab, click("#a"), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(result.data.unwrap()["handledBy"], json!("tab-2"));
}
