use std::sync::{Arc, Mutex, Once};

use actix_web::http::{Method, StatusCode};
use actix_web::{test, web::Data, App};
use async_trait::async_trait;
use httpmock::prelude::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::{json, Value};

use accessibility_analyzer::config::Config;
use accessibility_analyzer::error::{
    AnalyzerError, CONFIGURATION_ERROR_MESSAGE, GATEWAY_ERROR_MESSAGE, PAYMENT_REQUIRED_MESSAGE,
    RATE_LIMITED_MESSAGE,
};
use accessibility_analyzer::model::{CompletionProvider, GatewayClient, Message, Role};
use accessibility_analyzer::prompts::{ANALYZE_SYSTEM_PROMPT, CHAT_SYSTEM_PROMPT};
use accessibility_analyzer::web::{routes, AppState};

const ANALYZER: &str = "/api/accessibility-analyzer";

#[derive(Clone, Copy)]
enum Reply {
    Text(&'static str),
    RateLimited,
    PaymentRequired,
    Gateway(u16),
}

/// Provider double that records every message list it receives.
struct FakeProvider {
    reply: Reply,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl FakeProvider {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(&self, messages: &[Message]) -> Result<String, AnalyzerError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match self.reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::RateLimited => Err(AnalyzerError::RateLimited),
            Reply::PaymentRequired => Err(AnalyzerError::PaymentRequired),
            Reply::Gateway(status) => Err(AnalyzerError::Gateway {
                status,
                body: "upstream exploded".to_string(),
            }),
        }
    }
}

static CAPTURED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

/// Keeps every log record emitted in this test binary.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        CAPTURED
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

fn capture_logs() {
    static INIT: Once = Once::new();
    static LOGGER: CaptureLogger = CaptureLogger;
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

fn logged(level: Level, needle: &str) -> bool {
    CAPTURED
        .lock()
        .unwrap()
        .iter()
        .any(|(l, msg)| *l == level && msg.contains(needle))
}

fn config(strict_actions: bool) -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        strict_actions,
        ..Config::default()
    }
}

macro_rules! test_app {
    ($provider:expr, $config:expr) => {{
        let provider: Arc<dyn CompletionProvider> = $provider;
        test::init_service(
            App::new()
                .app_data(Data::new(AppState::new($config, provider)))
                .wrap(routes::cors_headers())
                .configure(routes::configure),
        )
        .await
    }};
}

fn assert_cors(headers: &actix_web::http::header::HeaderMap) {
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        routes::ALLOW_ORIGIN
    );
    assert_eq!(
        headers.get("access-control-allow-headers").unwrap(),
        "authorization, x-client-info, apikey, content-type"
    );
}

fn analyze_request(body: Value) -> actix_web::test::TestRequest {
    test::TestRequest::post().uri(ANALYZER).set_json(body)
}

#[actix_web::test]
async fn success_wraps_completion_text() {
    let provider = FakeProvider::new(Reply::Text("Pontuação: 72/100"));
    let app = test_app!(provider.clone(), config(false));

    let resp = test::call_service(
        &app,
        analyze_request(json!({ "htmlContent": "<img src=\"a.png\">", "action": "analyze" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(resp.headers());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "result": "Pontuação: 72/100" }));

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0].role, Role::System);
    assert_eq!(calls[0][0].content, ANALYZE_SYSTEM_PROMPT);
    assert_eq!(
        calls[0][1].content,
        "Analise este conteúdo HTML quanto a problemas de acessibilidade:\n\n<img src=\"a.png\">"
    );
}

#[actix_web::test]
async fn unknown_action_answers_as_chat_by_default() {
    let provider = FakeProvider::new(Reply::Text("ok"));
    let app = test_app!(provider.clone(), config(false));

    let resp = test::call_service(
        &app,
        analyze_request(json!({ "htmlContent": "O que é ARIA?", "action": "translate" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let calls = provider.calls();
    assert_eq!(calls[0][0].content, CHAT_SYSTEM_PROMPT);
    assert_eq!(calls[0][1].content, "O que é ARIA?");
}

#[actix_web::test]
async fn strict_mode_rejects_unknown_action_without_calling_upstream() {
    let provider = FakeProvider::new(Reply::Text("ok"));
    let app = test_app!(provider.clone(), config(true));

    let resp = test::call_service(
        &app,
        analyze_request(json!({ "htmlContent": "x", "action": "translate" })).to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_cors(resp.headers());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Unknown action: translate" }));
    assert!(provider.calls().is_empty());
}

#[actix_web::test]
async fn upstream_failures_map_to_statuses() {
    let cases = [
        (Reply::RateLimited, StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE),
        (Reply::PaymentRequired, StatusCode::PAYMENT_REQUIRED, PAYMENT_REQUIRED_MESSAGE),
        (Reply::Gateway(503), StatusCode::INTERNAL_SERVER_ERROR, GATEWAY_ERROR_MESSAGE),
    ];

    for (reply, status, message) in cases {
        for action in ["analyze", "suggest", "chat"] {
            let app = test_app!(FakeProvider::new(reply), config(false));
            let resp = test::call_service(
                &app,
                analyze_request(json!({ "htmlContent": "<p>x</p>", "action": action }))
                    .to_request(),
            )
            .await;

            assert_eq!(resp.status(), status, "action {}", action);
            assert_cors(resp.headers());
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({ "error": message }));
        }
    }
}

#[actix_web::test]
async fn preflight_is_empty_with_cors_headers() {
    let app = test_app!(FakeProvider::new(Reply::Text("unused")), config(false));

    for uri in [
        ANALYZER,
        "/api/audit",
        "/api/audit/contrast",
        "/api/audit/contrast/page",
        "/api/audit/headings",
        "/api/audit/images",
        "/api/audit/keyboard",
    ] {
        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri(uri)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NO_CONTENT, "{}", uri);
        assert_cors(resp.headers());
        let body = test::read_body(resp).await;
        assert!(body.is_empty());
    }
}

#[actix_web::test]
async fn malformed_body_is_a_json_500() {
    let provider = FakeProvider::new(Reply::Text("unused"));
    let app = test_app!(provider.clone(), config(false));

    let req = test::TestRequest::post()
        .uri(ANALYZER)
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(resp.headers());
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    assert!(provider.calls().is_empty());
}

#[actix_web::test]
async fn json_body_is_read_whatever_the_content_type() {
    let provider = FakeProvider::new(Reply::Text("ok"));
    let app = test_app!(provider.clone(), config(false));

    for content_type in ["text/plain;charset=UTF-8", "application/x-www-form-urlencoded"] {
        let req = test::TestRequest::post()
            .uri(ANALYZER)
            .insert_header(("content-type", content_type))
            .set_payload(r#"{"htmlContent":"Olá","action":"chat"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", content_type);
    }

    let req = test::TestRequest::post()
        .uri(ANALYZER)
        .set_payload(r#"{"htmlContent":"sem cabeçalho","action":"chat"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let calls = provider.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2][1].content, "sem cabeçalho");
}

#[actix_web::test]
async fn null_html_content_is_forwarded_as_empty() {
    let provider = FakeProvider::new(Reply::Text("ok"));
    let app = test_app!(provider.clone(), config(false));

    let resp = test::call_service(
        &app,
        analyze_request(json!({ "htmlContent": null, "action": "chat" })).to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let calls = provider.calls();
    assert_eq!(calls[0][0].content, CHAT_SYSTEM_PROMPT);
    assert_eq!(calls[0][1].content, "");
}

#[actix_web::test]
async fn other_methods_are_a_json_405() {
    let app = test_app!(FakeProvider::new(Reply::Text("unused")), config(false));

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let req = test::TestRequest::default()
            .method(method.clone())
            .uri(ANALYZER)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", method);
        assert_cors(resp.headers());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }
}

#[actix_web::test]
async fn repeated_requests_are_identical() {
    let app = test_app!(FakeProvider::new(Reply::Text("same")), config(false));
    let payload = json!({ "htmlContent": "<main></main>", "action": "suggest" });

    let mut seen = Vec::new();
    for _ in 0..2 {
        let resp = test::call_service(&app, analyze_request(payload.clone()).to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        seen.push((status, body));
    }
    assert_eq!(seen[0], seen[1]);
}

// The same flows through the real gateway client against a mock upstream.

fn gateway_config(server: &MockServer, api_key: Option<&str>) -> Config {
    Config {
        gateway_url: server.url("/v1/chat/completions"),
        model: "google/gemini-2.5-flash".to_string(),
        api_key: api_key.map(str::to_string),
        ..Config::default()
    }
}

#[actix_web::test]
async fn gateway_round_trip() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body(json!({
                    "model": "google/gemini-2.5-flash",
                    "messages": [
                        { "role": "system", "content": CHAT_SYSTEM_PROMPT },
                        { "role": "user", "content": "Como testar contraste?" }
                    ]
                }));
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Use um analisador." } }]
            }));
        })
        .await;

    let config = gateway_config(&server, Some("test-key"));
    let app = test_app!(Arc::new(GatewayClient::new(&config)), config);

    let resp = test::call_service(
        &app,
        analyze_request(json!({ "htmlContent": "Como testar contraste?", "action": "chat" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "result": "Use um analisador." }));
    mock.assert_async().await;
}

#[actix_web::test]
async fn gateway_statuses_pass_through() {
    capture_logs();
    let cases = [
        (429, StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE),
        (402, StatusCode::PAYMENT_REQUIRED, PAYMENT_REQUIRED_MESSAGE),
        (500, StatusCode::INTERNAL_SERVER_ERROR, GATEWAY_ERROR_MESSAGE),
        (503, StatusCode::INTERNAL_SERVER_ERROR, GATEWAY_ERROR_MESSAGE),
    ];

    for (upstream, expected, message) in cases {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(upstream).body("upstream says no");
            })
            .await;

        let config = gateway_config(&server, Some("test-key"));
        let app = test_app!(Arc::new(GatewayClient::new(&config)), config);
        let resp = test::call_service(
            &app,
            analyze_request(json!({ "htmlContent": "<p/>", "action": "analyze" })).to_request(),
        )
        .await;

        assert_eq!(resp.status(), expected, "upstream {}", upstream);
        assert_cors(resp.headers());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": message }));
        mock.assert_hits_async(1).await;

        if expected == StatusCode::INTERNAL_SERVER_ERROR {
            let line = format!("AI gateway error: {} upstream says no", upstream);
            assert!(logged(Level::Error, &line), "no error record for {}", upstream);
        }
    }
}

#[actix_web::test]
async fn missing_secret_fails_before_any_upstream_call() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{ "message": { "content": "never" } }]
            }));
        })
        .await;

    let config = gateway_config(&server, None);
    let app = test_app!(Arc::new(GatewayClient::new(&config)), config);
    let resp = test::call_service(
        &app,
        analyze_request(json!({ "htmlContent": "<p/>", "action": "analyze" })).to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(resp.headers());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": CONFIGURATION_ERROR_MESSAGE }));
    mock.assert_hits_async(0).await;
}

#[actix_web::test]
async fn malformed_completion_is_a_500() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        })
        .await;

    let config = gateway_config(&server, Some("test-key"));
    let app = test_app!(Arc::new(GatewayClient::new(&config)), config);
    let resp = test::call_service(
        &app,
        analyze_request(json!({ "htmlContent": "q", "action": "chat" })).to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to extract content from response"));
}
