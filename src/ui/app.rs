//! Page shell and HTML rendering entry points used by the server.

use leptos::prelude::*;

use crate::chat::{ChatComposer, ChatPanelState};
use crate::document::{DocumentRecord, DocumentViewState};
use crate::ui::chat::ChatPanel;
use crate::ui::components::SparklesIcon;
use crate::ui::document::{DocumentList, DocumentPanel};

/// Full HTML document around page content.
#[component]
fn Page(title: String, children: Children) -> impl IntoView {
    view! {
        <html lang="en" class="dark">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <meta name="description" content="Chat with your documents"/>

                <title>{format!("{title} - Notebook")}</title>

                // Local scripts only (no CDN)
                <script src="/static/vendor/htmx-2.0.8.min.js"></script>
                <script src="/static/vendor/htmx-json-enc.js"></script>
                <script defer src="/static/vendor/alpine.min.js"></script>

                <script type="module" src="/static/pdf-viewer.js"></script>
                <script type="module" src="/static/app.js"></script>
                <link rel="stylesheet" href="/static/app.css"/>
            </head>

            <body class="min-h-screen bg-background text-textPrimary antialiased">
                <div id="app-shell" class="flex flex-col min-h-screen">
                    <Header/>
                    <main id="app" class="flex-1 container mx-auto px-4 py-6 max-w-7xl">
                        {children()}
                    </main>
                    <Footer/>
                </div>
            </body>
        </html>
    }
}

const HEADER_CLASSES: &str = "sticky top-0 z-50 w-full border-b border-panelBorder \
                              bg-background/95 backdrop-blur \
                              supports-[backdrop-filter]:bg-background/60";

/// Application header with navigation.
#[component]
fn Header() -> impl IntoView {
    view! {
        <header class=HEADER_CLASSES>
            <div class="container mx-auto flex h-14 items-center justify-between px-4 max-w-7xl">
                <a href="/" class="flex items-center gap-2 font-semibold">
                    <SparklesIcon class="h-5 w-5 text-primary" />
                    <span class="text-lg">"Notebook"</span>
                </a>

                <nav class="flex items-center gap-6" hx-boost="true">
                    <a
                        href="/"
                        class="text-sm text-textMuted hover:text-textPrimary transition-colors"
                    >
                        "Chat"
                    </a>
                </nav>
            </div>
        </header>
    }
}

/// Footer component.
#[component]
fn Footer() -> impl IntoView {
    view! {
        <footer class="border-t border-panelBorder py-4">
            <div class="container mx-auto px-4 max-w-7xl">
                <p class="text-xs text-textMuted text-center">
                    "Answers are generated from your uploaded documents"
                </p>
            </div>
        </footer>
    }
}

/// `GET /`: document list beside the chat panel.
pub fn render_chat_page(
    session_id: &str,
    state: ChatPanelState,
    documents: Vec<DocumentRecord>,
) -> String {
    let session_id = session_id.to_string();
    let body = view! {
        <Page title="Chat".to_string()>
            <div class="grid gap-6 lg:grid-cols-[20rem_1fr]">
                <DocumentList documents=documents />
                <ChatPanel session_id=session_id state=state />
            </div>
        </Page>
    }
    .to_html();
    format!("<!DOCTYPE html>{body}")
}

/// `GET /documents/{id}`: document list beside one viewer.
pub fn render_viewer_page(
    viewer_id: &str,
    record: &DocumentRecord,
    state: DocumentViewState,
    documents: Vec<DocumentRecord>,
) -> String {
    let viewer_id = viewer_id.to_string();
    let title = record.title.clone();
    let page_count = record.num_pages;
    let body = view! {
        <Page title=title.clone()>
            <div class="grid gap-6 lg:grid-cols-[20rem_1fr]">
                <DocumentList documents=documents viewer_id=Some(viewer_id.clone()) />
                <DocumentPanel
                    viewer_id=viewer_id
                    title=title
                    state=state
                    page_count=page_count
                />
            </div>
        </Page>
    }
    .to_html();
    format!("<!DOCTYPE html>{body}")
}

/// Chat panel fragment swapped in after a send.
pub fn render_chat_panel(
    session_id: &str,
    state: ChatPanelState,
    composer: ChatComposer,
) -> String {
    view! { <ChatPanel session_id=session_id.to_string() state=state composer=composer /> }
        .to_html()
}

/// Document panel fragment for the document `state` currently shows.
pub fn render_document_panel(
    viewer_id: &str,
    record: &DocumentRecord,
    state: DocumentViewState,
) -> String {
    view! {
        <DocumentPanel
            viewer_id=viewer_id.to_string()
            title=record.title.clone()
            state=state
            page_count=record.num_pages
        />
    }
    .to_html()
}

/// Document list fragment.
pub fn render_document_list(documents: Vec<DocumentRecord>, viewer_id: Option<String>) -> String {
    view! { <DocumentList documents=documents viewer_id=viewer_id /> }.to_html()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentContent, FileType};

    #[test]
    fn test_chat_page_is_full_document() {
        let html = render_chat_page("s1", ChatPanelState::default(), Vec::new());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Chat - Notebook</title>"));
        assert!(html.contains("id=\"chat-panel\""));
        assert!(html.contains("id=\"document-list\""));
    }

    fn pdf_record() -> DocumentRecord {
        DocumentRecord {
            id: "d1".into(),
            title: "manual.pdf".into(),
            file_path: "uploads/d1.pdf".into(),
            file_type: "pdf".into(),
            upload_time: chrono::Utc::now(),
            user_id: "alice".into(),
            size_bytes: 10,
            num_pages: Some(7),
            processed: true,
            chunk_ids: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_viewer_page_embeds_panel() {
        let state =
            DocumentViewState::new("d1", FileType::Pdf, DocumentContent::Url("/raw".into()));
        let html = render_viewer_page("v1", &pdf_record(), state, Vec::new());
        assert!(html.contains("id=\"document-panel\""));
        assert!(html.contains("<title>manual.pdf - Notebook</title>"));
        assert!(html.contains("page-count=\"7\""));
        assert!(html.contains("src=\"/static/pdf-viewer.js\""));
    }
}
