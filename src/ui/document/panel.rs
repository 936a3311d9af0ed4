//! Document panel component.

use leptos::prelude::*;

use super::highlight::highlight_to_html;
use crate::document::{DocumentViewState, ViewerBranch, extension_of};
use crate::ui::components::{
    Badge, BadgeVariant, Button, ButtonSize, ButtonVariant, ChevronLeftIcon, ChevronRightIcon,
    LoaderIcon,
};

/// Syntax extension for a file name. Notebooks hold Python.
fn syntax_for(title: &str) -> &'static str {
    match extension_of(title).as_deref() {
        Some("py" | "ipynb") => "py",
        Some("html") => "html",
        _ => "txt",
    }
}

/// The active sub-renderer.
///
/// Asynchronous renderers carry `data-ready-url` and `data-ready-signal`;
/// the client posts the signal there once they finish loading. Code is
/// highlighted here, so it is ready as soon as it renders.
fn branch_view(
    state: &DocumentViewState,
    title: &str,
    ready_url: &str,
    page_count: Option<u32>,
) -> AnyView {
    let content = state.content();
    let url = content.url().unwrap_or_default().to_string();

    match state.branch() {
        ViewerBranch::Paged => view! {
            <pdf-viewer
                class="block w-full min-h-[70vh]"
                src=url
                page=state.page_number().to_string()
                page-count=page_count.map(|count| count.to_string())
                data-ready-url=ready_url.to_string()
                data-ready-signal="paged_loaded"
            ></pdf-viewer>
        }
        .into_any(),
        ViewerBranch::Image => view! {
            <img
                src=url
                alt=title.to_string()
                class="max-w-full h-auto mx-auto"
                data-ready-url=ready_url.to_string()
                data-ready-signal="image_loaded"
            />
        }
        .into_any(),
        ViewerBranch::Code => {
            let syntax = syntax_for(title);
            let text = content.as_display_text();
            match highlight_to_html(&text, syntax) {
                Some(html) => view! {
                    <div
                        class="code-view overflow-auto rounded-lg text-sm"
                        data-syntax=syntax
                        inner_html=html
                    ></div>
                }
                .into_any(),
                None => view! {
                    <pre class="overflow-auto rounded-lg bg-background p-4 text-sm">
                        <code data-syntax=syntax>{text}</code>
                    </pre>
                }
                .into_any(),
            }
        }
        ViewerBranch::Table => {
            let rows = content
                .rows()
                .iter()
                .map(|row| {
                    let cells = row
                        .iter()
                        .map(|cell| {
                            view! {
                                <td class="border border-panelBorder px-2 py-1">{cell.clone()}</td>
                            }
                        })
                        .collect_view();
                    view! { <tr>{cells}</tr> }
                })
                .collect_view();
            view! {
                <div class="overflow-auto">
                    <table class="w-full text-sm border-collapse">
                        <tbody>{rows}</tbody>
                    </table>
                </div>
            }
            .into_any()
        }
        ViewerBranch::RawText => view! {
            <pre class="whitespace-pre-wrap text-sm p-4">{content.as_display_text()}</pre>
        }
        .into_any(),
    }
}

/// One pagination button: a tiny form posting `{"action": ...}` as JSON.
#[component]
fn PageButton(
    page_url: String,
    action: &'static str,
    disabled: bool,
    children: Children,
) -> impl IntoView {
    let label = if action == "next" { "Next page" } else { "Previous page" };

    view! {
        <form
            class="inline"
            hx-post=page_url
            hx-ext="json-enc"
            hx-target="#document-panel"
            hx-swap="outerHTML"
        >
            <input type="hidden" name="action" value=action />
            <Button
                variant=ButtonVariant::Ghost
                size=ButtonSize::Icon
                button_type="submit"
                disabled=disabled
                label=label
            >
                {children()}
            </Button>
        </form>
    }
}

/// Document viewer dispatching on the declared file type.
///
/// While loading, a spinner is shown and the active branch is mounted
/// hidden so its sub-renderer can still load and report readiness. For
/// paged documents with a known page count the page indicator and
/// pagination controls are shown.
#[component]
pub fn DocumentPanel(
    /// Viewer state id, used for the ready and page endpoints.
    viewer_id: String,
    /// Display title (original file name).
    title: String,
    /// Current view state.
    state: DocumentViewState,
    /// Page count known from upload, handed to the paged renderer.
    #[prop(default = None)]
    page_count: Option<u32>,
) -> impl IntoView {
    let ready_url = format!("/api/viewer/{viewer_id}/ready");
    let page_url = format!("/api/viewer/{viewer_id}/page");
    let loading = state.is_loading();
    let branch = state.branch();
    let file_type = state.file_type().clone();

    let pager = match (branch, state.page_count()) {
        (ViewerBranch::Paged, Some(count)) => {
            let page = state.page_number();
            Some(view! {
                <div class="flex items-center gap-2">
                    <PageButton page_url=page_url.clone() action="previous" disabled={page <= 1}>
                        <ChevronLeftIcon />
                    </PageButton>
                    <span class="text-sm text-textMuted" data-page=page.to_string()>
                        {format!("Page {page} of {count}")}
                    </span>
                    <PageButton page_url=page_url.clone() action="next" disabled={page >= count}>
                        <ChevronRightIcon />
                    </PageButton>
                </div>
            })
        }
        _ => None,
    };

    let body = branch_view(&state, &title, &ready_url, page_count);
    let body_classes = if loading { "hidden" } else { "block" };

    view! {
        <section
            id="document-panel"
            class="flex flex-col bg-panel border border-panelBorder rounded-2xl overflow-hidden"
            data-viewer-id=viewer_id
            data-document-id=state.document_id().to_string()
        >
            <header class="flex items-center justify-between gap-2 px-4 py-3 \
                           border-b border-panelBorder">
                <div class="flex items-center gap-2 min-w-0">
                    <h2 class="font-semibold truncate">{title.clone()}</h2>
                    <Badge variant=BadgeVariant::for_file_type(&file_type)>
                        {file_type.to_string()}
                    </Badge>
                </div>
                {pager}
            </header>

            <div class="relative flex-1 p-4">
                {loading.then(|| view! {
                    <div
                        class="flex items-center justify-center gap-2 py-12 text-textMuted"
                        role="status"
                        data-loading=""
                    >
                        <LoaderIcon class="h-6 w-6" />
                        <span>"Loading document..."</span>
                    </div>
                })}
                <div class=body_classes data-branch=branch.as_str()>
                    {body}
                </div>
            </div>
        </section>
    }
}
