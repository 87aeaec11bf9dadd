// tests/api_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use docassist::{
    config::Config,
    routes,
    services::{
        credentials::MemoryStore,
        extraction::{ExtractionError, TextExtractor, decode_text},
        llm::ScriptedGateway,
    },
    state::AppState,
};
use reqwest::multipart::{Form, Part};
use tempfile::TempDir;

/// Extractor that decodes every document as UTF-8 and returns canned OCR text.
struct StubExtractor {
    ocr_text: String,
}

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn extract(&self, data: &[u8], _media_type: &str) -> Result<String, ExtractionError> {
        Ok(decode_text(data))
    }

    async fn ocr(&self, _data: &[u8], _media_type: &str) -> Result<String, ExtractionError> {
        Ok(self.ocr_text.clone())
    }
}

struct TestApp {
    address: String,
    gateway: Arc<ScriptedGateway>,
    static_dir: TempDir,
}

/// Helper function to spawn the app on a random port for testing.
async fn spawn_app(gateway: ScriptedGateway) -> TestApp {
    spawn_app_with_ocr(gateway, "").await
}

async fn spawn_app_with_ocr(gateway: ScriptedGateway, ocr_text: &str) -> TestApp {
    let static_dir = tempfile::tempdir().expect("Failed to create static dir");
    let gateway = Arc::new(gateway);

    let config = Config {
        openai_api_key: "test-key".to_string(),
        openai_base_url: "http://127.0.0.1:9".to_string(),
        llm_model: "test-model".to_string(),
        llm_timeout_secs: 1,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        users_file: "unused.json".to_string(),
        static_dir: static_dir.path().to_string_lossy().into_owned(),
        port: 0,
        rust_log: "error".to_string(),
        max_upload_bytes: 1024 * 1024,
        tesseract_cmd: "tesseract".to_string(),
        pdftotext_cmd: "pdftotext".to_string(),
        libreoffice_cmd: "libreoffice".to_string(),
    };

    let state = AppState {
        config,
        llm: gateway.clone(),
        extractor: Arc::new(StubExtractor {
            ocr_text: ocr_text.to_string(),
        }),
        users: Arc::new(MemoryStore::new()),
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        gateway,
        static_dir,
    }
}

fn unique_name() -> String {
    format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn unknown_path_without_frontend_is_404() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;

    let response = reqwest::get(format!("{}/random_path_that_does_not_exist", app.address))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn unknown_path_falls_back_to_index() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;
    std::fs::write(app.static_dir.path().join("index.html"), "<h1>home</h1>").unwrap();

    let response = reqwest::get(format!("{}/some/client/route", app.address))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "<h1>home</h1>");
}

#[tokio::test]
async fn signup_login_whoami_flow() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;
    let client = reqwest::Client::new();
    let username = unique_name();

    let signup = client
        .post(format!("{}/api/signup", app.address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .expect("Signup failed");
    assert_eq!(signup.status().as_u16(), 200);
    let signup: serde_json::Value = signup.json().await.unwrap();
    assert_eq!(signup["ok"], true);

    let login: serde_json::Value = client
        .post(format!("{}/api/login", app.address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");
    let token = login["token"].as_str().expect("Token not found");

    let me: serde_json::Value = client
        .get(format!("{}/api/whoami", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"], username.as_str());

    let anonymous: serde_json::Value = client
        .get(format!("{}/api/whoami", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(anonymous["user"].is_null());

    let logout: serde_json::Value = client
        .get(format!("{}/api/logout", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(logout["ok"], true);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;
    let client = reqwest::Client::new();
    let body = serde_json::json!({ "username": unique_name(), "password": "password123" });

    let first = client
        .post(format!("{}/api/signup", app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 200);

    let second = client
        .post(format!("{}/api/signup", app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
    let error: serde_json::Value = second.json().await.unwrap();
    assert_eq!(error["error"], "Username exists");
}

#[tokio::test]
async fn signup_fails_validation() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/signup", app.address))
        .json(&serde_json::json!({ "username": "yo", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;
    let client = reqwest::Client::new();
    let username = unique_name();

    client
        .post(format!("{}/api/signup", app.address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .unwrap();

    let wrong_password = client
        .post(format!("{}/api/login", app.address))
        .json(&serde_json::json!({ "username": username, "password": "nope-nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status().as_u16(), 401);

    let unknown_user = client
        .post(format!("{}/api/login", app.address))
        .json(&serde_json::json!({ "username": unique_name(), "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_user.status().as_u16(), 401);
}

#[tokio::test]
async fn make_quiz_returns_repaired_items() {
    let reply = r#"```json
[
  {"question": " What is 2+2? ", "type": "mcq", "answer": "4", "options": ["4", "3", "5", "2"]},
  {"question": "Define X", "type": "mcq", "answer": "Y"},
  {"question": "Explain Z", "type": "written", "answer": "Because"}
]
```"#;
    let app = spawn_app(ScriptedGateway::new([reply])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/make_quiz", app.address))
        .json(&serde_json::json!({ "summary": "Some text", "difficulty": "Easy", "num": 3 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let quiz: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(quiz.len(), 3);
    assert_eq!(app.gateway.calls(), 1);

    assert_eq!(quiz[0]["question"], "What is 2+2?");
    assert_eq!(quiz[0]["type"], "mcq");
    assert_eq!(quiz[0]["options"].as_array().unwrap().len(), 4);

    let fabricated = quiz[1]["options"].as_array().unwrap();
    assert_eq!(fabricated.len(), 4);
    assert!(fabricated.contains(&serde_json::json!("Y")));

    assert_eq!(quiz[2]["type"], "written");
    assert_eq!(quiz[2]["options"], serde_json::json!([]));
}

#[tokio::test]
async fn make_quiz_degrades_to_short_list() {
    let app = spawn_app(ScriptedGateway::new(["not json at all"])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/make_quiz", app.address))
        .json(&serde_json::json!({ "summary": "Some text", "difficulty": "hard", "num": 3 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let quiz: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(quiz.is_empty());
    assert_eq!(app.gateway.calls(), 4);
}

#[tokio::test]
async fn make_quiz_rejects_invalid_count() {
    let app = spawn_app(ScriptedGateway::new(["[]"])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/make_quiz", app.address))
        .json(&serde_json::json!({ "summary": "Some text", "difficulty": "hard", "num": 0 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn make_quiz_reports_unavailable_model() {
    let app = spawn_app(ScriptedGateway::unavailable()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/make_quiz", app.address))
        .json(&serde_json::json!({ "summary": "Some text", "difficulty": "hard", "num": 2 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
}

#[tokio::test]
async fn translate_without_language_skips_model() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/translate", app.address))
        .json(&serde_json::json!({ "text": "- item", "lang": "" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["translated"], "");
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn chat_sends_context_as_assistant_message() {
    let app = spawn_app(ScriptedGateway::new(["It is blue."])).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/chat", app.address))
        .json(&serde_json::json!({ "question": "What color?", "context": "The sky is blue." }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["answer"], "It is blue.");
    let request = &app.gateway.requests()[0];
    assert_eq!(request.messages.len(), 3);
    assert_eq!(request.messages[1].content, "The sky is blue.");
    assert_eq!(request.last_user_content(), Some("What color?"));
}

#[tokio::test]
async fn summarize_unreadable_document() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;
    let form = Form::new().part(
        "file",
        Part::bytes(b"too short".to_vec())
            .file_name("note.txt")
            .mime_str("text/plain")
            .unwrap(),
    );

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/summarize", app.address))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["domain"], "unknown");
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn summarize_classifies_and_rewrites() {
    let app = spawn_app(ScriptedGateway::new(["Plain-language summary."])).await;
    let text = "The plaintiff alleges the defendant is liable for breach of contract.";
    let form = Form::new().text("level", "16").part(
        "file",
        Part::bytes(text.as_bytes().to_vec())
            .file_name("case.txt")
            .mime_str("text/plain")
            .unwrap(),
    );

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/summarize", app.address))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["domain"], "legal");
    assert_eq!(body["summary"], "Plain-language summary.");

    let prompt = app.gateway.requests()[0]
        .last_user_content()
        .unwrap()
        .to_string();
    assert!(prompt.starts_with("Rewrite the following legal document for a college reader."));
    assert!(prompt.ends_with(text));
}

#[tokio::test]
async fn summarize_requires_file() {
    let app = spawn_app(ScriptedGateway::new(["unused"])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/summarize", app.address))
        .multipart(Form::new().text("level", "10"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn prescription_with_unreadable_image() {
    let app = spawn_app_with_ocr(ScriptedGateway::new(["unused"]), "  smudge ").await;
    let form = Form::new().part(
        "file",
        Part::bytes(vec![0u8; 16])
            .file_name("rx.png")
            .mime_str("image/png")
            .unwrap(),
    );

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/prescription", app.address))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["rx"], "Sorry — I couldn’t read that prescription clearly.");
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn prescription_is_explained() {
    let ocr = "Amoxicillin 500 mg, take one capsule three times daily";
    let app = spawn_app_with_ocr(ScriptedGateway::new(["• **Drug name**: Amoxicillin"]), ocr).await;
    let form = Form::new().part(
        "file",
        Part::bytes(vec![0u8; 16])
            .file_name("rx.png")
            .mime_str("image/png")
            .unwrap(),
    );

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/prescription", app.address))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["rx"], "• **Drug name**: Amoxicillin");
    let prompt = app.gateway.requests()[0]
        .last_user_content()
        .unwrap()
        .to_string();
    assert!(prompt.ends_with(ocr));
}
