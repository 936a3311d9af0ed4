//! Chat panel layout component.

use leptos::prelude::*;

use super::{ChatHeader, ChatInputArea, ChatMessageList};
use crate::chat::{ChatComposer, ChatPanelState};

/// Complete chat panel: header, message list, composer.
///
/// Rendered from the panel state and the composer that produced the last
/// request. The submit button starts disabled exactly when
/// [`ChatComposer::can_submit`] says so.
///
/// # Example
///
/// ```rust,ignore
/// view! {
///     <ChatPanel
///         session_id=conversation.id().to_string()
///         state=ChatPanelState::new(conversation.messages(), false)
///         composer=ChatComposer::new()
///     />
/// }
/// ```
#[component]
pub fn ChatPanel(
    /// Conversation id.
    session_id: String,
    /// Messages and loading flag.
    state: ChatPanelState,
    /// Pending composer input.
    #[prop(default = ChatComposer::new())]
    composer: ChatComposer,
    /// Title displayed in the header.
    #[prop(default = "Ask your documents")]
    title: &'static str,
) -> impl IntoView {
    let loading = state.is_loading();
    let can_submit = composer.can_submit(loading);
    let text = composer.text().to_string();
    let attachment_name = composer.attachment().map(|a| a.name().to_string());
    let scroll_to = state.scroll_target().map(|request| request.message_id);
    let messages = state.messages().to_vec();
    let session_attr = session_id.clone();

    view! {
        <section
            id="chat-panel"
            class="chat-panel flex flex-col h-[calc(100vh-6rem)] bg-panel border \
                   border-panelBorder rounded-2xl overflow-hidden"
            data-session-id=session_attr
        >
            <ChatHeader title=title loading=loading />

            <ChatMessageList messages=messages loading=loading scroll_to=scroll_to />

            <ChatInputArea
                session_id=session_id
                text=text
                attachment_name=attachment_name
                can_submit=can_submit
            />
        </section>
    }
}
