//! HTTP tests for the router: documents, chat, and viewers.
//!
//! The model is replaced by a scripted client; uploads go to a temp dir.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use notebook_llm::AppState;
use notebook_llm::config::{
    AppConfig, LoggingConfig, RetrievalConfig, SecurityConfig, ServerConfig, StorageConfig,
};
use notebook_llm::llm::{LlmClient, Message};
use notebook_llm::security::issue_token;
use notebook_llm::server::build_router;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Replies with a fixed answer and records every prompt.
struct ScriptedLlm {
    reply: Result<String, String>,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlm {
    fn answering(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(reason.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, messages: Vec<Message>) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(messages);
        self.reply.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

const SECRET: &str = "test-secret";
const WONDERLAND_SHA256: &str =
    "a71a7c7011f53a1bab3642ec2ce12593f05230ace8de1e3e7645f69efac1443d";

fn test_config(upload_dir: &Path, jwt_required: bool) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            request_timeout_secs: 30,
        },
        security: SecurityConfig {
            jwt_required,
            jwt_secret: SECRET.to_string(),
            token_ttl_minutes: 30,
            users: HashMap::from([(
                "alice".to_string(),
                // sha256("wonderland")
                WONDERLAND_SHA256.to_string(),
            )]),
        },
        storage: StorageConfig {
            upload_dir: upload_dir.to_path_buf(),
            max_upload_bytes: 1024 * 1024,
        },
        retrieval: RetrievalConfig {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            embeddings: false,
        },
        logging: LoggingConfig { json: false },
    }
}

fn server_with(llm: Arc<ScriptedLlm>, jwt_required: bool) -> (TestServer, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path(), jwt_required));
    let state = AppState::new(config, llm, None);
    (TestServer::new(build_router(state)).unwrap(), dir)
}

fn server() -> (TestServer, TempDir) {
    server_with(ScriptedLlm::answering("The launch is in March."), false)
}

fn bearer(user: &str) -> String {
    issue_token(user, SECRET, chrono::Duration::minutes(5)).unwrap()
}

async fn upload(server: &TestServer, name: &str, body: &[u8]) -> String {
    let form = MultipartForm::new().add_part("file", Part::bytes(body.to_vec()).file_name(name));
    let res = server.post("/api/v1/documents/upload").multipart(form).await;
    res.assert_status_ok();
    res.json::<Value>()["document_id"].as_str().unwrap().to_string()
}

async fn open_viewer(server: &TestServer, document_id: &str) -> String {
    let res = server
        .post("/api/viewer")
        .json(&json!({ "document_id": document_id }))
        .await;
    res.assert_status_ok();
    res.json::<Value>()["viewer_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public_even_with_auth_required() {
    let (server, _dir) = server_with(ScriptedLlm::answering("x"), true);

    let res = server.get("/health").await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>(), json!({ "status": "healthy" }));

    server
        .get("/api/v1/documents")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_required_auth_accepts_valid_token() {
    let (server, _dir) = server_with(ScriptedLlm::answering("x"), true);

    let res = server
        .get("/api/v1/documents")
        .authorization_bearer(bearer("alice"))
        .await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>(), json!([]));

    server
        .get("/api/v1/documents")
        .authorization_bearer("not-a-token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_document_lifecycle() {
    let (server, dir) = server();
    let id = upload(&server, "notes.txt", b"The launch is planned for March.").await;

    let listed = server.get("/api/v1/documents").await.json::<Value>();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "notes.txt");
    assert_eq!(listed[0]["processed"], true);
    assert_eq!(listed[0]["metadata"]["chunk_count"], 1);

    let raw = server.get(&format!("/api/v1/documents/{id}/raw")).await;
    raw.assert_status_ok();
    assert_eq!(raw.text(), "The launch is planned for March.");
    assert!(raw.header("content-type").to_str().unwrap().starts_with("text/plain"));

    server
        .delete(&format!("/api/v1/documents/{id}"))
        .await
        .assert_status_ok();
    server
        .get(&format!("/api/v1/documents/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unsupported_upload_is_rejected() {
    let (server, _dir) = server();
    let form =
        MultipartForm::new().add_part("file", Part::bytes(b"MZ".to_vec()).file_name("tool.exe"));

    let res = server.post("/api/v1/documents/upload").multipart(form).await;

    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>()["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_oversized_uploads_are_payload_too_large() {
    let (server, dir) = server();

    // Over the upload limit but within the request body limit
    let form = MultipartForm::new()
        .add_part("file", Part::bytes(vec![b'a'; 1536 * 1024]).file_name("big.txt"));
    let res = server.post("/api/v1/documents/upload").multipart(form).await;
    res.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json::<Value>()["code"], "PAYLOAD_TOO_LARGE");

    // Over the request body limit: the stream is cut off mid-field
    let form = MultipartForm::new()
        .add_part("file", Part::bytes(vec![b'a'; 3 * 1024 * 1024]).file_name("huge.txt"));
    let res = server.post("/api/v1/documents/upload").multipart(form).await;
    res.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json::<Value>()["code"], "PAYLOAD_TOO_LARGE");

    assert_eq!(std::fs::read_dir(dir.path()).map_or(0, Iterator::count), 0);
}

#[tokio::test]
async fn test_login_issues_usable_token() {
    let (server, _dir) = server_with(ScriptedLlm::answering("x"), true);

    let res = server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "alice", "password": "wonderland" }))
        .await;
    res.assert_status_ok();
    let body = res.json::<Value>();
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    server
        .get("/api/v1/documents")
        .authorization_bearer(token)
        .await
        .assert_status_ok();

    let res = server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "alice", "password": "guess" }))
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>()["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_summarize_document() {
    let llm = ScriptedLlm::answering("  A launch plan for March.  ");
    let (server, _dir) = server_with(Arc::clone(&llm), false);
    let id = upload(&server, "notes.txt", b"The launch is planned for March.").await;

    let res = server.post(&format!("/api/v1/summaries/{id}")).await;
    res.assert_status_ok();
    assert_eq!(
        res.json::<Value>(),
        json!({ "document_id": id, "summary": "A launch plan for March." })
    );
    let prompts = llm.prompts.lock().unwrap();
    let prompt = prompts[0][1].content.as_text().unwrap();
    assert!(prompt.contains("The launch is planned for March."));
    drop(prompts);

    let image = upload(&server, "photo.png", &[0x89, 0x50, 0x4e, 0x47]).await;
    server
        .post(&format!("/api/v1/summaries/{image}"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/v1/summaries/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_documents_are_scoped_per_user() {
    let (server, _dir) = server_with(ScriptedLlm::answering("x"), false);
    let part = Part::bytes(b"secret plan".to_vec()).file_name("plan.md");
    let form = MultipartForm::new().add_part("file", part);
    let res = server
        .post("/api/v1/documents/upload")
        .authorization_bearer(bearer("alice"))
        .multipart(form)
        .await;
    res.assert_status_ok();
    let id = res.json::<Value>()["document_id"].as_str().unwrap().to_string();

    let anonymous = server.get("/api/v1/documents").await.json::<Value>();
    assert_eq!(anonymous, json!([]));
    server
        .get(&format!("/api/v1/documents/{id}"))
        .authorization_bearer(bearer("bob"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/v1/documents/{id}"))
        .authorization_bearer(bearer("alice"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_query_cites_matching_document() {
    let llm = ScriptedLlm::answering("  March.  ");
    let (server, _dir) = server_with(Arc::clone(&llm), false);
    let id = upload(&server, "notes.txt", b"The launch is planned for March.").await;

    let res = server
        .post("/api/v1/documents/query")
        .json(&json!({ "query": "when is the launch?" }))
        .await;

    res.assert_status_ok();
    let body = res.json::<Value>();
    assert_eq!(body["answer"], "March.");
    assert_eq!(body["sources"], json!([id]));
    assert_eq!(llm.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_query_validation_and_upstream_failure() {
    let (server, _dir) = server_with(ScriptedLlm::failing("model offline"), false);

    server
        .post("/api/v1/documents/query")
        .json(&json!({ "query": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let res = server
        .post("/api/v1/documents/query")
        .json(&json!({ "query": "anything" }))
        .await;
    res.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(res.json::<Value>()["code"], "LLM_ERROR");
}

#[tokio::test]
async fn test_chat_send_renders_panel_and_records_messages() {
    let (server, _dir) = server();

    let form = MultipartForm::new()
        .add_text("session_id", "s-1")
        .add_text("message", "When is the launch?");
    let res = server.post("/api/chat").multipart(form).await;

    res.assert_status_ok();
    let html = res.text();
    assert!(html.contains("id=\"chat-panel\""));
    assert!(html.contains("When is the launch?"));
    assert!(html.contains("The launch is in March."));

    let messages = server.get("/api/sessions/s-1/messages").await.json::<Value>();
    assert_eq!(messages.as_array().unwrap().len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");

    server
        .delete("/api/sessions/s-1")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let cleared = server.get("/api/sessions/s-1/messages").await.json::<Value>();
    assert_eq!(cleared, json!([]));
}

#[tokio::test]
async fn test_chat_image_only_send() {
    let llm = ScriptedLlm::answering("A cat.");
    let (server, _dir) = server_with(Arc::clone(&llm), false);

    let form = MultipartForm::new()
        .add_text("session_id", "s-img")
        .add_text("message", "")
        .add_part(
            "image",
            Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .file_name("cat.png")
                .mime_type("image/png"),
        );
    server.post("/api/chat").multipart(form).await.assert_status_ok();

    let messages = server.get("/api/sessions/s-img/messages").await.json::<Value>();
    assert_eq!(messages[0]["content"], "[image]");
    assert!(llm.prompts.lock().unwrap()[0][1].content.has_images());
}

#[tokio::test]
async fn test_empty_chat_submission_does_nothing() {
    let (server, _dir) = server();

    let form = MultipartForm::new()
        .add_text("session_id", "s-2")
        .add_text("message", "   ");
    server
        .post("/api/chat")
        .multipart(form)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let messages = server.get("/api/sessions/s-2/messages").await.json::<Value>();
    assert_eq!(messages, json!([]));
}

#[tokio::test]
async fn test_failed_chat_send_keeps_conversation() {
    let (server, _dir) = server_with(ScriptedLlm::failing("model offline"), false);

    let form = MultipartForm::new()
        .add_text("session_id", "s-3")
        .add_text("message", "hello");
    let res = server.post("/api/chat").multipart(form).await;

    res.assert_status(StatusCode::BAD_GATEWAY);
    let messages = server.get("/api/sessions/s-3/messages").await.json::<Value>();
    assert_eq!(messages, json!([]));
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (server, _dir) = server();
    server
        .get("/api/sessions/missing/messages")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_code_viewer_is_highlighted_on_render() {
    let (server, _dir) = server();
    let id = upload(&server, "script.py", b"def pump():\n    return 40\n").await;
    let viewer = open_viewer(&server, &id).await;

    let html = server.get(&format!("/api/viewer/{viewer}")).await.text();
    assert!(!html.contains("Loading document..."));
    assert!(html.contains("data-syntax=\"py\""));
    assert!(html.contains("<span style="));
    assert!(!html.contains("data-ready-signal"));
}

#[tokio::test]
async fn test_image_viewer_waits_for_its_own_signal() {
    let (server, _dir) = server();
    let id = upload(&server, "photo.png", &[0x89, 0x50, 0x4e, 0x47]).await;
    let viewer = open_viewer(&server, &id).await;

    let html = server.get(&format!("/api/viewer/{viewer}")).await.text();
    assert!(html.contains("Loading document..."));

    // A signal from another sub-renderer is ignored
    let html = server
        .post(&format!("/api/viewer/{viewer}/ready"))
        .json(&json!({ "signal": "paged_loaded", "page_count": 2 }))
        .await
        .text();
    assert!(html.contains("Loading document..."));

    let html = server
        .post(&format!("/api/viewer/{viewer}/ready"))
        .json(&json!({ "signal": "image_loaded" }))
        .await
        .text();
    assert!(!html.contains("Loading document..."));
}

#[tokio::test]
async fn test_switching_document_resets_viewer() {
    let (server, _dir) = server();
    let csv = upload(&server, "data.csv", b"name,qty\nbolt,4\n").await;
    let png = upload(&server, "photo.png", &[0x89, 0x50, 0x4e, 0x47]).await;
    let viewer = open_viewer(&server, &csv).await;

    // Tables are ready as soon as they render
    let html = server.get(&format!("/api/viewer/{viewer}")).await.text();
    assert!(!html.contains("Loading document..."));
    assert!(html.contains("bolt"));

    let html = server
        .post(&format!("/api/viewer/{viewer}/document"))
        .json(&json!({ "document_id": png }))
        .await
        .text();
    assert!(html.contains("Loading document..."));
    assert!(html.contains("data-branch=\"image\""));
    assert!(html.contains(&format!("data-document-id=\"{png}\"")));
}

#[tokio::test]
async fn test_paged_viewer_pagination() {
    let (server, _dir) = server();
    let first = upload(&server, "manual.pdf", b"%PDF-1.4 stub").await;
    let second = upload(&server, "guide.pdf", b"%PDF-1.4 stub").await;
    let viewer = open_viewer(&server, &first).await;
    let page_url = format!("/api/viewer/{viewer}/page");

    let html = server
        .post(&format!("/api/viewer/{viewer}/ready"))
        .json(&json!({ "signal": "paged_loaded", "page_count": 3 }))
        .await
        .text();
    assert!(html.contains("Page 1 of 3"));

    let html = server.post(&page_url).json(&json!({ "action": "next" })).await.text();
    assert!(html.contains("Page 2 of 3"));

    let html = server
        .post(&page_url)
        .json(&json!({ "action": "goto", "page": 10 }))
        .await
        .text();
    assert!(html.contains("Page 3 of 3"));

    server
        .post(&page_url)
        .json(&json!({ "action": "goto" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Another document starts over at page one with an unknown count
    let html = server
        .post(&format!("/api/viewer/{viewer}/document"))
        .json(&json!({ "document_id": second }))
        .await
        .text();
    assert!(html.contains("Loading document..."));
    assert!(html.contains("page=\"1\""));
    assert!(!html.contains("Page 3 of 3"));
}

#[tokio::test]
async fn test_viewers_belong_to_their_opener() {
    let (server, _dir) = server();
    let upload_as = |user: &'static str, name: &'static str| {
        let part = Part::bytes(b"# Notes".to_vec()).file_name(name);
        server
            .post("/api/v1/documents/upload")
            .authorization_bearer(bearer(user))
            .multipart(MultipartForm::new().add_part("file", part))
    };
    let alice_doc = upload_as("alice", "alice.md").await.json::<Value>()["document_id"]
        .as_str()
        .unwrap()
        .to_string();
    let bob_doc = upload_as("bob", "bob.md").await.json::<Value>()["document_id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = server
        .post("/api/viewer")
        .authorization_bearer(bearer("alice"))
        .json(&json!({ "document_id": alice_doc }))
        .await;
    let viewer = res.json::<Value>()["viewer_id"].as_str().unwrap().to_string();

    // Bob can neither read nor repoint Alice's viewer
    server
        .get(&format!("/api/viewer/{viewer}"))
        .authorization_bearer(bearer("bob"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post(&format!("/api/viewer/{viewer}/document"))
        .authorization_bearer(bearer("bob"))
        .json(&json!({ "document_id": bob_doc }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post(&format!("/api/viewer/{viewer}/page"))
        .authorization_bearer(bearer("bob"))
        .json(&json!({ "action": "next" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let res = server
        .get(&format!("/api/viewer/{viewer}"))
        .authorization_bearer(bearer("alice"))
        .await;
    res.assert_status_ok();
    assert!(res.text().contains(&format!("data-document-id=\"{alice_doc}\"")));
}

#[tokio::test]
async fn test_deleting_document_closes_its_viewers() {
    let (server, _dir) = server();
    let id = upload(&server, "notes.md", b"# Notes").await;
    let viewer = open_viewer(&server, &id).await;

    server
        .delete(&format!("/api/v1/documents/{id}"))
        .await
        .assert_status_ok();

    server
        .get(&format!("/api/viewer/{viewer}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pages_render() {
    let (server, _dir) = server();
    let id = upload(&server, "notes.md", b"# Notes").await;

    let index = server.get("/").await;
    index.assert_status_ok();
    let html = index.text();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("notes.md"));

    let page = server.get(&format!("/documents/{id}")).await;
    page.assert_status_ok();
    let html = page.text();
    assert!(html.contains("id=\"document-panel\""));
    assert!(html.contains("/static/pdf-viewer.js"));

    let fragment = server.get("/ui/documents?viewer_id=v1").await.text();
    assert!(fragment.contains("/api/viewer/v1/document"));
}
