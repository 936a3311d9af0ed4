//! Chat message list component.

use leptos::prelude::*;

use crate::chat::{ChatMessage, ChatRole};
use crate::ui::components::{LoaderIcon, ScrollArea, Separator};

/// One message bubble.
///
/// User messages sit at the end of the row in the primary color; assistant
/// messages sit at the start.
#[component]
fn MessageBubble(message: ChatMessage) -> impl IntoView {
    let (row_classes, bubble_classes) = match message.role {
        ChatRole::User => (
            "flex justify-end",
            "max-w-[80%] rounded-2xl px-4 py-2 bg-primary text-white",
        ),
        ChatRole::Assistant => (
            "flex justify-start",
            "max-w-[80%] rounded-2xl px-4 py-2 bg-background text-textPrimary \
             border border-panelBorder",
        ),
    };
    let sources = message
        .sources
        .as_ref()
        .map(|sources| format!("Sources: {}", sources.join(", ")));
    let time = message.display_time();

    view! {
        <div class=row_classes data-role=message.role.as_str() data-message-id=message.id>
            <div class=bubble_classes>
                <p class="whitespace-pre-wrap text-sm">{message.content}</p>
                {sources.map(|s| view! { <p class="mt-1 text-xs opacity-80">{s}</p> })}
                <p class="mt-1 text-[10px] opacity-60">{time}</p>
            </div>
        </div>
    }
}

/// Scrollable list of messages with a loading row and scroll anchor.
///
/// The anchor after the last message carries `data-scroll-to` with the
/// newest message id; the client scrolls it into view after each swap.
#[component]
pub fn ChatMessageList(
    /// Messages in conversation order.
    messages: Vec<ChatMessage>,
    /// Whether an answer is pending.
    #[prop(default = false)]
    loading: bool,
    /// Message to scroll to.
    #[prop(default = None)]
    scroll_to: Option<String>,
) -> impl IntoView {
    // Hidden by htmx until a request is in flight
    let loading_classes = if loading {
        "flex items-center gap-2 text-sm text-textMuted py-2"
    } else {
        "htmx-indicator flex items-center gap-2 text-sm text-textMuted py-2"
    };

    let rows = messages
        .into_iter()
        .enumerate()
        .map(|(i, message)| {
            view! {
                {(i > 0).then(|| view! { <Separator class="my-2 opacity-40" /> })}
                <MessageBubble message=message />
            }
        })
        .collect_view();

    view! {
        <ScrollArea id="chat-messages" class="flex-1 p-4">
            <div class="flex flex-col" aria-live="polite" aria-label="Chat messages">
                {rows}
            </div>
            <div id="chat-loading" class=loading_classes role="status">
                <LoaderIcon class="h-4 w-4" />
                <span>"Thinking..."</span>
            </div>
            <div id="chat-scroll-anchor" data-scroll-to=scroll_to></div>
        </ScrollArea>
    }
}
