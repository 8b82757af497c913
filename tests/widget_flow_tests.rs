use std::sync::Arc;
use std::time::Duration;

use quill::api::HttpBackend;
use quill::core::reveal::{CURSOR_MARKER, Granularity, RevealConfig};
use quill::core::transcript::Origin;
use quill::core::{Controller, Outcome, Rejection};
use quill::host::MemoryHost;
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn quick_reveal() -> RevealConfig {
    RevealConfig {
        cursor_speed: Duration::from_millis(1),
        accumulate_speed: Duration::from_millis(1),
        granularity: Granularity::Char,
    }
}

fn controller_for(server: &MockServer) -> (Controller, MemoryHost) {
    let host = MemoryHost::new();
    let backend = Arc::new(HttpBackend::new(server.uri()));
    let controller = Controller::new(host.surfaces(), backend, quick_reveal());
    (controller, host)
}

async fn settle(controller: &Controller) {
    tokio::time::timeout(Duration::from_secs(5), controller.animator().wait_idle())
        .await
        .expect("reveal should finish");
}

// ============================================================================
// End-to-end flows
// ============================================================================

#[tokio::test]
async fn test_hello_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({"query": "hello", "historyAccess": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Hi there!"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (controller, host) = controller_for(&mock_server);
    host.input.set("hello");

    let outcome = controller.submit().await;
    assert!(matches!(outcome, Outcome::Sent(_)));
    settle(&controller).await;

    let messages = controller.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].origin(), Origin::User);
    assert_eq!(messages[0].raw_text(), "hello");
    assert_eq!(messages[1].origin(), Origin::Bot);
    assert_eq!(messages[1].raw_text(), "Hi there!");

    let entries = host.messages.entries();
    assert_eq!(entries[0].content, "hello");
    assert_eq!(entries[1].content, "Hi there!");
    assert!(!entries[1].content.contains(CURSOR_MARKER));
    assert_eq!(host.thinking.transitions(), vec![true, false]);
}

#[tokio::test]
async fn test_consent_options_flow() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "History access is disabled. Would you like to enable it or proceed with a normal response?",
            "options": ["Enable history access", "Proceed with normal response"]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/privacy"))
        .and(body_json(json!({"option": "Proceed with normal response"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "Okay, proceeding with a normal response."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (controller, host) = controller_for(&mock_server);
    host.input.set("what is rust");
    controller.submit().await;

    let set = controller.latest_option_set().expect("options attached");
    let groups = host.messages.option_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].labels.len(), 2);

    let chosen = controller
        .choose_option(set.id, "Proceed with normal response")
        .await;
    assert!(matches!(chosen, Outcome::Sent(ref r) if r.text == "Okay, proceeding with a normal response."));

    // Every control in the set is now dead.
    let repeat = controller.choose_option(set.id, "Enable history access").await;
    assert_eq!(repeat, Outcome::Ignored);
    assert!(host.messages.option_group(set.id).unwrap().disabled);

    settle(&controller).await;
    let last = host.messages.entries().pop().unwrap();
    assert_eq!(last.content, "Okay, proceeding with a normal response.");
    assert_eq!(host.thinking.hide_count(), 2);
}

#[tokio::test]
async fn test_history_gate_blocks_before_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Here you go"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (controller, host) = controller_for(&mock_server);

    host.input.set("show me my history");
    let blocked = controller.submit().await;
    assert_eq!(blocked, Outcome::Rejected(Rejection::HistoryAccessDisabled));
    assert!(controller.messages().is_empty());

    host.history_flag.set(true);
    let sent = controller.submit().await;
    assert!(matches!(sent, Outcome::Sent(_)));
    assert_eq!(controller.messages().len(), 2);
}

#[tokio::test]
async fn test_server_error_becomes_chat_line() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&mock_server)
        .await;

    let (controller, host) = controller_for(&mock_server);
    host.input.set("hello");
    controller.submit().await;
    settle(&controller).await;

    let last = host.messages.entries().pop().unwrap();
    assert_eq!(last.content, "Error: API error (HTTP 503): down");
    assert!(!host.thinking.is_visible());
    assert_eq!(host.thinking.hide_count(), 1);
    assert!(host.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_markdown_reply_is_escaped_and_rendered() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "## Tip\nUse `<b>` **carefully**"
        })))
        .mount(&mock_server)
        .await;

    let (controller, host) = controller_for(&mock_server);
    host.input.set("<i>tags</i> please");
    controller.submit().await;
    settle(&controller).await;

    let entries = host.messages.entries();
    assert_eq!(entries[0].content, "&lt;i&gt;tags&lt;/i&gt; please");
    assert_eq!(
        entries[1].content,
        "<h2>Tip</h2><br />Use <code>&lt;b&gt;</code> <strong>carefully</strong>"
    );
}
