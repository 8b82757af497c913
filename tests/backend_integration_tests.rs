use quill::api::{
    Backend, BackendError, HttpBackend, PrivacyRequest, Reply, SearchRequest,
};
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn search(query: &str, history_access: bool) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        history_access,
    }
}

// ============================================================================
// /search
// ============================================================================

#[tokio::test]
async fn test_search_sends_query_and_flag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"query": "hello", "historyAccess": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Hi there!"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let response = backend.query(&search("hello", false)).await;

    let response = tokio_test::assert_ok!(response);
    assert_eq!(response.response, "Hi there!");
    assert_eq!(response.options, None);
}

#[tokio::test]
async fn test_search_with_options() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "History access is disabled. Would you like to enable it or proceed with a normal response?",
            "options": ["Enable history access", "Proceed with normal response"]
        })))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let reply = Reply::from_search(backend.query(&search("anything", false)).await);

    assert!(!reply.failed);
    assert_eq!(
        reply.options,
        vec!["Enable history access", "Proceed with normal response"]
    );
}

#[tokio::test]
async fn test_search_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let result = backend.query(&search("hello", false)).await;

    match result {
        Err(BackendError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let result = backend.query(&search("hello", false)).await;
    assert!(matches!(result, Err(BackendError::Parse(_))));

    let reply = Reply::from_search(result);
    assert!(reply.text.starts_with("Error: parse error"));
    assert!(reply.failed);
}

#[tokio::test]
async fn test_search_connection_refused() {
    // Nothing listens on port 1.
    let backend = HttpBackend::new("http://127.0.0.1:1");
    let result = backend.query(&search("hello", false)).await;

    assert!(matches!(result, Err(BackendError::Network(_))));
}

// ============================================================================
// /privacy and /enable-history
// ============================================================================

#[tokio::test]
async fn test_submit_option() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/privacy"))
        .and(body_json(json!({"option": "Enable history access"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "History access has been enabled. You can now ask history-related questions."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(format!("{}/", mock_server.uri()));
    let request = PrivacyRequest {
        option: "Enable history access".to_string(),
    };
    let response = tokio_test::assert_ok!(backend.submit_option(&request).await);

    assert!(response.response.starts_with("History access has been enabled"));
}

#[tokio::test]
async fn test_enable_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/enable-history"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "History access has been enabled."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let response = tokio_test::assert_ok!(backend.enable_history().await);

    assert_eq!(response.response, "History access has been enabled.");
}
