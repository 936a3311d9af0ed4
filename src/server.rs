use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::chat::{ChatComposer, ChatMessage, ChatPanelState, SelectedFile, SubmitOutcome};
use crate::config::AppConfig;
use crate::document::{
    DocumentError, DocumentRecord, DocumentViewState, FileType, RenderSignal, pdf_page_count,
};
use crate::error::AppError;
use crate::llm::{ChatCompletionsClient, LlmSettings};
use crate::rag::{ConversationSender, Embedder, FastEmbedder, QueryAnswer};
use crate::security::{UserContext, auth_middleware, issue_token, verify_password};
use crate::ui;

/// Room for multipart framing on top of the upload limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// How often idle conversations and viewers are evicted.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub async fn start_server(config: Arc<AppConfig>, settings: LlmSettings) -> anyhow::Result<()> {
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let llm = Arc::new(ChatCompletionsClient::new(settings));
    let embedder = if config.retrieval.embeddings {
        load_embedder().await
    } else {
        info!("Embeddings disabled; retrieval uses term overlap");
        None
    };
    let state = AppState::new(Arc::clone(&config), llm, embedder);

    let conversations = state.conversations.clone();
    let viewers = state.viewers.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = conversations.cleanup_idle();
            if removed > 0 {
                info!(name: "conversations.cleanup", removed, "Removed idle conversations");
            }
            let closed = viewers.cleanup_idle();
            if closed > 0 {
                info!(name: "viewers.cleanup", closed, "Closed idle viewers");
            }
        }
    });

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        upload_dir = %config.storage.upload_dir.display(),
        jwt_required = config.security.jwt_required,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Load the local embedding model. Without it, retrieval stays lexical.
async fn load_embedder() -> Option<Arc<dyn Embedder>> {
    let embedder = FastEmbedder::new();
    match embedder.initialize().await {
        Ok(()) => {
            info!(name: "embeddings.ready", "Embedding model loaded");
            Some(Arc::new(embedder))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Embedding model unavailable; retrieval uses term overlap");
            None
        }
    }
}

/// Assemble routes and middleware.
///
/// Everything except `/health`, token login, and static assets runs behind
/// the auth middleware, which always attaches a [`UserContext`].
pub fn build_router(state: AppState) -> Router {
    let timeout_duration = Duration::from_secs(state.config.server.request_timeout_secs);
    let body_limit = state.config.storage.max_upload_bytes + MULTIPART_OVERHEAD;

    let protected = Router::new()
        // HTML pages
        .route("/", get(index_page))
        .route("/documents/{id}", get(document_page))
        .route("/ui/documents", get(document_list_fragment))
        // Chat
        .route("/api", get(api_root))
        .route("/api/chat", post(api_chat))
        .route("/api/sessions/{id}", delete(api_clear_session))
        .route("/api/sessions/{id}/messages", get(api_get_messages))
        // Documents
        .route("/api/v1/documents", get(list_documents))
        .route("/api/v1/documents/upload", post(upload_document))
        .route("/api/v1/documents/query", post(query_documents))
        .route(
            "/api/v1/documents/{id}",
            get(get_document).delete(delete_document),
        )
        .route("/api/v1/documents/{id}/raw", get(raw_document))
        .route("/api/v1/summaries/{id}", post(summarize_document))
        // Viewer
        .route("/api/viewer", post(open_viewer))
        .route("/api/viewer/{viewer_id}", get(get_viewer))
        .route("/api/viewer/{viewer_id}/document", post(switch_viewer_document))
        .route("/api/viewer/{viewer_id}/ready", post(viewer_ready))
        .route("/api/viewer/{viewer_id}/page", post(viewer_page))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(protected)
        .route("/health", get(health))
        .route("/api/v1/auth/token", post(login))
        .nest_service("/static", ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatPageQuery {
    #[serde(default)]
    session_id: Option<String>,
}

/// GET / - Chat page with the caller's documents.
async fn index_page(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Query(query): Query<ChatPageQuery>,
) -> Html<String> {
    let conversation = match query.session_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => state.conversations.get_or_create(id),
        None => state.conversations.create(),
    };
    let panel = ChatPanelState::new(conversation.messages(), false);
    let documents = state.documents.list_for_user(&user.user_id);
    Html(ui::render_chat_page(conversation.id(), panel, documents))
}

/// GET /documents/{id} - Viewer page for one document.
async fn document_page(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let record = state.documents.get_for_user(&id, &user.user_id)?;
    let view = new_view_state(&state, &record).await?;
    let viewer_id = state.viewers.open(&user.user_id, view.clone());
    let documents = state.documents.list_for_user(&user.user_id);
    Ok(Html(ui::render_viewer_page(&viewer_id, &record, view, documents)))
}

#[derive(Debug, Deserialize)]
struct ListFragmentQuery {
    #[serde(default)]
    viewer_id: Option<String>,
}

/// GET /ui/documents - Document list fragment.
async fn document_list_fragment(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Query(query): Query<ListFragmentQuery>,
) -> Html<String> {
    let documents = state.documents.list_for_user(&user.user_id);
    Html(ui::render_document_list(documents, query.viewer_id))
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// GET /api
async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the Notebook LLM API" }))
}

/// POST /api/chat - Submit the composer and re-render the chat panel.
///
/// Multipart fields: `session_id` (optional), `message`, `image` (optional).
/// An empty submission answers `204 No Content` without touching the
/// conversation.
async fn api_chat(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut session_id: Option<String> = None;
    let mut composer = ChatComposer::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "session_id" => {
                let id = field.text().await?;
                if !id.trim().is_empty() {
                    session_id = Some(id);
                }
            }
            "message" => composer.set_text(field.text().await?),
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().map_or_else(
                    || mime_guess::from_path(&file_name).first_or_octet_stream().to_string(),
                    ToString::to_string,
                );
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was picked
                if !file_name.is_empty() && !data.is_empty() {
                    let file = SelectedFile::from_bytes(file_name, mime_type, data.to_vec());
                    composer.select_file(file);
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown chat form field"),
        }
    }

    let conversation = match &session_id {
        Some(id) => state.conversations.get_or_create(id),
        None => state.conversations.create(),
    };

    info!(
        session_id = %conversation.id(),
        user_id = %user.user_id,
        has_image = composer.attachment().is_some(),
        "Received chat request"
    );

    let sender =
        ConversationSender::new(conversation.clone(), user.user_id.clone(), &state.pipeline);
    let outcome = composer.submit(&sender).await.map_err(|e| {
        tracing::warn!(session_id = %conversation.id(), error = %e, "Chat send failed");
        AppError::from(e)
    })?;

    match outcome {
        SubmitOutcome::Skipped => Ok(StatusCode::NO_CONTENT.into_response()),
        SubmitOutcome::Sent => {
            let mut panel = ChatPanelState::default();
            panel.replace_messages(conversation.messages());
            Ok(Html(ui::render_chat_panel(conversation.id(), panel, composer)).into_response())
        }
    }
}

/// GET /api/sessions/{id}/messages
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    state
        .conversations
        .get(&id)
        .map(|conversation| Json(conversation.messages()))
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

/// DELETE /api/sessions/{id} - Clear a conversation's messages.
async fn api_clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let conversation = state
        .conversations
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;
    conversation.clear();
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Document Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: String,
    document_id: String,
}

/// POST /api/v1/documents/upload - Store, chunk, and index one file.
async fn upload_document(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(ToString::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::BadRequest("Upload has no file name".to_string()))?;
        let data = field.bytes().await?;

        let mut record = state
            .documents
            .save_upload(&filename, &data, &user.user_id)
            .await?;

        let chunks = match state.loader.load_chunks(&record.file_path).await {
            Ok(chunks) => chunks,
            Err(e) => {
                if let Err(io) = tokio::fs::remove_file(&record.file_path).await {
                    tracing::warn!(
                        path = %record.file_path.display(),
                        error = %io,
                        "Failed to remove rejected upload"
                    );
                }
                return Err(e.into());
            }
        };

        if record.viewer_type() == FileType::Pdf {
            record.num_pages = pdf_page_count(&data);
        }
        record.chunk_ids = state
            .pipeline
            .index_document(&record.id, &user.user_id, &chunks)
            .await;
        record.processed = !chunks.is_empty();
        record
            .metadata
            .insert("chunk_count".to_string(), chunks.len().into());

        info!(
            name: "document.uploaded",
            document_id = %record.id,
            file_type = %record.file_type,
            size_bytes = record.size_bytes,
            chunks = chunks.len(),
            pages = ?record.num_pages,
            user_id = %user.user_id,
            "Document uploaded"
        );

        let document_id = record.id.clone();
        state.documents.insert(record);
        return Ok(Json(UploadResponse {
            message: "Document uploaded and processed successfully".to_string(),
            document_id,
        }));
    }

    Err(AppError::BadRequest("Missing multipart field: file".to_string()))
}

/// GET /api/v1/documents
async fn list_documents(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
) -> Json<Vec<DocumentRecord>> {
    Json(state.documents.list_for_user(&user.user_id))
}

/// GET /api/v1/documents/{id}
async fn get_document(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<DocumentRecord>, AppError> {
    Ok(Json(state.documents.get_for_user(&id, &user.user_id)?))
}

/// DELETE /api/v1/documents/{id} - Remove record, file, chunks, and viewers.
async fn delete_document(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state.documents.remove_for_user(&id, &user.user_id).await?;
    let chunks = state.pipeline.index().remove_document(&record.id);
    let viewers = state.viewers.close_document(&record.id);

    info!(
        name: "document.deleted",
        document_id = %record.id,
        chunks,
        viewers,
        "Document deleted"
    );

    Ok(Json(serde_json::json!({ "message": "Document deleted successfully" })))
}

/// GET /api/v1/documents/{id}/raw - Original bytes.
async fn raw_document(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = state.documents.get_for_user(&id, &user.user_id)?;
    let bytes = tokio::fs::read(&record.file_path)
        .await
        .map_err(DocumentError::from)?;
    let mime = mime_guess::from_path(&record.title).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    image_data: Option<String>,
}

/// POST /api/v1/documents/query
async fn query_documents(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, AppError> {
    if req.query.trim().is_empty() && req.image_data.is_none() {
        return Err(AppError::BadRequest("Query cannot be empty".to_string()));
    }
    let answer = state
        .pipeline
        .query(&user.user_id, &req.query, req.image_data.as_deref())
        .await
        .map_err(|e| AppError::Upstream(format!("{e:#}")))?;
    Ok(Json(answer))
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    document_id: String,
    summary: String,
}

/// POST /api/v1/summaries/{id} - Summarize one document with the model.
async fn summarize_document(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, AppError> {
    let record = state.documents.get_for_user(&id, &user.user_id)?;
    let summary = state
        .pipeline
        .summarize(&record.id, &user.user_id)
        .await
        .map_err(|e| AppError::Upstream(format!("{e:#}")))?
        .ok_or_else(|| {
            AppError::BadRequest(format!("Document has no text to summarize: {}", record.title))
        })?;

    info!(name: "document.summarized", document_id = %record.id, "Document summarized");
    Ok(Json(SummaryResponse {
        document_id: record.id,
        summary,
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

/// POST /api/v1/auth/token - Exchange configured credentials for a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let security = &state.config.security;
    if !verify_password(&security.users, &req.username, &req.password) {
        tracing::debug!(username = %req.username, "Rejected login");
        return Err(AppError::Unauthorized);
    }
    let ttl = chrono::Duration::minutes(security.token_ttl_minutes);
    let access_token = issue_token(&req.username, &security.jwt_secret, ttl)
        .map_err(|e| AppError::Internal(e.into()))?;

    info!(name: "auth.token_issued", username = %req.username, "Issued access token");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Viewer Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Fresh view state for a document. Synchronous branches start ready.
async fn new_view_state(
    state: &AppState,
    record: &DocumentRecord,
) -> Result<DocumentViewState, AppError> {
    let raw_url = format!("/api/v1/documents/{}/raw", record.id);
    let content = state.loader.load_content(record, &raw_url).await?;
    let mut view = DocumentViewState::new(record.id.clone(), record.viewer_type(), content);
    view.mark_rendered();
    Ok(view)
}

fn viewer_not_found(viewer_id: &str) -> AppError {
    AppError::NotFound(format!("Viewer not found: {viewer_id}"))
}

/// Render one of the caller's viewers, checking they still own its document.
fn render_viewer(
    state: &AppState,
    user: &UserContext,
    viewer_id: &str,
) -> Result<Html<String>, AppError> {
    let view = state
        .viewers
        .get(viewer_id, &user.user_id)
        .ok_or_else(|| viewer_not_found(viewer_id))?;
    let record = state.documents.get_for_user(view.document_id(), &user.user_id)?;
    Ok(Html(ui::render_document_panel(viewer_id, &record, view)))
}

#[derive(Debug, Deserialize)]
struct DocumentSelection {
    document_id: String,
}

#[derive(Debug, Serialize)]
struct OpenViewerResponse {
    viewer_id: String,
}

/// POST /api/viewer - Open a viewer on a document.
async fn open_viewer(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Json(req): Json<DocumentSelection>,
) -> Result<Json<OpenViewerResponse>, AppError> {
    let record = state.documents.get_for_user(&req.document_id, &user.user_id)?;
    let view = new_view_state(&state, &record).await?;
    let viewer_id = state.viewers.open(&user.user_id, view);
    Ok(Json(OpenViewerResponse { viewer_id }))
}

/// GET /api/viewer/{viewer_id} - Document panel fragment.
async fn get_viewer(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(viewer_id): Path<String>,
) -> Result<Html<String>, AppError> {
    render_viewer(&state, &user, &viewer_id)
}

/// POST /api/viewer/{viewer_id}/document - Point a viewer at another document.
///
/// Selecting the document already shown leaves the viewer untouched.
async fn switch_viewer_document(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(viewer_id): Path<String>,
    Json(req): Json<DocumentSelection>,
) -> Result<Html<String>, AppError> {
    let current = state
        .viewers
        .get(&viewer_id, &user.user_id)
        .ok_or_else(|| viewer_not_found(&viewer_id))?;
    let record = state.documents.get_for_user(&req.document_id, &user.user_id)?;

    if current.document_id() != record.id {
        let raw_url = format!("/api/v1/documents/{}/raw", record.id);
        let content = state.loader.load_content(&record, &raw_url).await?;
        let file_type = record.viewer_type();
        state
            .viewers
            .update(&viewer_id, &user.user_id, |view| {
                if view.reset_for(&record.id, file_type, content) {
                    view.mark_rendered();
                }
            })
            .ok_or_else(|| viewer_not_found(&viewer_id))?;
        tracing::debug!(
            viewer_id = %viewer_id,
            document_id = %record.id,
            "Viewer switched document"
        );
    }

    render_viewer(&state, &user, &viewer_id)
}

/// POST /api/viewer/{viewer_id}/ready - Deliver a sub-renderer signal.
async fn viewer_ready(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(viewer_id): Path<String>,
    Json(signal): Json<RenderSignal>,
) -> Result<Html<String>, AppError> {
    state
        .viewers
        .update(&viewer_id, &user.user_id, |view| view.on_ready(signal))
        .ok_or_else(|| viewer_not_found(&viewer_id))?;
    render_viewer(&state, &user, &viewer_id)
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PageAction {
    Next,
    Previous,
    Goto,
}

#[derive(Debug, Deserialize)]
struct PageRequest {
    action: PageAction,
    #[serde(default)]
    page: Option<u32>,
}

/// POST /api/viewer/{viewer_id}/page - Paginate a paged document.
async fn viewer_page(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(viewer_id): Path<String>,
    Json(req): Json<PageRequest>,
) -> Result<Html<String>, AppError> {
    let page = match (req.action, req.page) {
        (PageAction::Goto, None) => {
            return Err(AppError::BadRequest("goto requires a page".to_string()));
        }
        (_, page) => page,
    };
    state
        .viewers
        .update(&viewer_id, &user.user_id, |view| match req.action {
            PageAction::Next => view.next_page(),
            PageAction::Previous => view.previous_page(),
            PageAction::Goto => view.go_to_page(page.unwrap_or(1)),
        })
        .ok_or_else(|| viewer_not_found(&viewer_id))?;
    render_viewer(&state, &user, &viewer_id)
}
