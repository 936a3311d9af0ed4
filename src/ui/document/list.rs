//! Uploaded document list with upload form.

use leptos::prelude::*;

use crate::document::{DocumentRecord, SUPPORTED_EXTENSIONS};
use crate::ui::components::{
    Badge, BadgeVariant, Button, ButtonSize, ButtonVariant, Card, CardContent, CardHeader, FileIcon,
};

/// Human-readable file size.
fn format_size(bytes: usize) -> String {
    #[allow(clippy::cast_precision_loss)]
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{:.1} MB", kb / 1024.0)
    }
}

/// Refreshes the list after a successful upload or delete.
const REFRESH_LIST: &str = "if (event.detail.successful) htmx.trigger('#document-list', 'refresh')";

#[component]
fn DocumentRow(record: DocumentRecord, viewer_id: Option<String>) -> impl IntoView {
    let file_type = record.viewer_type();
    let size = format_size(record.size_bytes);

    // Inside a viewer, picking a document switches that viewer in place
    let open = match viewer_id {
        Some(viewer_id) => view! {
            <button
                type="button"
                class="flex-1 min-w-0 truncate text-left text-sm hover:underline"
                hx-post=format!("/api/viewer/{viewer_id}/document")
                hx-ext="json-enc"
                hx-vals=serde_json::json!({ "document_id": record.id }).to_string()
                hx-target="#document-panel"
                hx-swap="outerHTML"
            >
                {record.title.clone()}
            </button>
        }
        .into_any(),
        None => view! {
            <a
                class="flex-1 min-w-0 truncate text-sm hover:underline"
                href=format!("/documents/{}", record.id)
            >
                {record.title.clone()}
            </a>
        }
        .into_any(),
    };

    view! {
        <li class="flex items-center gap-2 py-2" data-document-id=record.id.clone()>
            <FileIcon class="shrink-0 text-textMuted" />
            {open}
            <Badge variant=BadgeVariant::for_file_type(&file_type)>{file_type.to_string()}</Badge>
            <span class="text-xs text-textMuted">{size}</span>
            <form
                hx-delete=format!("/api/v1/documents/{}", record.id)
                hx-swap="none"
                hx-confirm="Delete this document?"
                hx-on--after-request=REFRESH_LIST
            >
                <Button variant=ButtonVariant::Destructive size=ButtonSize::Sm button_type="submit">
                    "Delete"
                </Button>
            </form>
        </li>
    }
}

/// Card listing the caller's documents.
///
/// The list re-fetches itself from `/ui/documents` on the `refresh` event.
#[component]
pub fn DocumentList(
    /// Documents, newest first.
    documents: Vec<DocumentRecord>,
    /// When set, rows switch this viewer instead of linking to a page.
    #[prop(default = None)]
    viewer_id: Option<String>,
) -> impl IntoView {
    let accept = SUPPORTED_EXTENSIONS.join(",");
    let refresh_url = match &viewer_id {
        Some(id) => format!("/ui/documents?viewer_id={id}"),
        None => "/ui/documents".to_string(),
    };
    let empty = documents.is_empty();
    let rows = documents
        .into_iter()
        .map(|record| view! { <DocumentRow record=record viewer_id=viewer_id.clone() /> })
        .collect_view();

    view! {
        <div id="document-list" hx-get=refresh_url hx-trigger="refresh" hx-swap="outerHTML">
            <Card>
                <CardHeader>
                    <h2 class="font-semibold">"Documents"</h2>
                </CardHeader>
                <CardContent class="space-y-3">
                    <form
                        class="flex items-center gap-2"
                        hx-post="/api/v1/documents/upload"
                        hx-encoding="multipart/form-data"
                        hx-swap="none"
                        hx-on--after-request=REFRESH_LIST
                    >
                        <input
                            type="file"
                            name="file"
                            accept=accept
                            class="text-sm flex-1"
                            required
                        />
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            button_type="submit"
                        >
                            "Upload"
                        </Button>
                    </form>
                    {empty.then(|| view! {
                        <p class="text-sm text-textMuted">"No documents uploaded yet."</p>
                    })}
                    <ul class="divide-y divide-panelBorder">{rows}</ul>
                </CardContent>
            </Card>
        </div>
    }
}
