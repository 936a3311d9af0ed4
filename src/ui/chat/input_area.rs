//! Chat composer form.

use leptos::prelude::*;

use crate::ui::components::{ButtonSize, ButtonVariant, Input, PaperclipIcon, SendIcon};

/// Keeps the picked file name for display; non-images are cleared.
const PICK_IMAGE: &str = "const f = $event.target.files[0]; \
                          fileName = f && f.type.startsWith('image/') ? f.name : ''; \
                          if (!fileName) $event.target.value = ''";

/// Composer form posting text and an optional image to `/api/chat`.
///
/// Submission is multipart so the picked file travels as is; the server
/// turns it into a data URL. The file picker only offers images, and the
/// Alpine state mirrors the server's submit rule so the button enables as
/// soon as there is something to send.
#[component]
pub fn ChatInputArea(
    /// Conversation the form posts to.
    session_id: String,
    /// Pending text.
    #[prop(default = String::new())]
    text: String,
    /// Name of the pending image.
    #[prop(default = None)]
    attachment_name: Option<String>,
    /// Whether the submit button starts enabled.
    #[prop(default = false)]
    can_submit: bool,
) -> impl IntoView {
    let alpine_state = format!(
        "{{ text: {}, fileName: {} }}",
        serde_json::Value::String(text.clone()),
        serde_json::Value::String(attachment_name.clone().unwrap_or_default()),
    );
    let selected_label = attachment_name.map(|name| format!("Selected image: {name}"));
    let submit_classes = format!(
        "inline-flex items-center justify-center rounded-xl shrink-0 disabled:opacity-50 {} {}",
        ButtonVariant::Primary.classes(),
        ButtonSize::Icon.classes(),
    );
    let attach_classes = format!(
        "inline-flex items-center justify-center rounded-xl shrink-0 cursor-pointer {} {}",
        ButtonVariant::Ghost.classes(),
        ButtonSize::Icon.classes(),
    );

    view! {
        <div class="border-t border-panelBorder p-4 bg-panel/50 backdrop-blur-sm">
            <form
                class="flex flex-col gap-2"
                hx-post="/api/chat"
                hx-encoding="multipart/form-data"
                hx-target="#chat-panel"
                hx-swap="outerHTML"
                hx-indicator="#chat-loading"
                hx-disabled-elt="find button[type='submit']"
                x-data=alpine_state
            >
                <input type="hidden" name="session_id" value=session_id />

                <p
                    class="text-xs text-textMuted"
                    x-show="fileName"
                    x-text="'Selected image: ' + fileName"
                >
                    {selected_label}
                </p>

                <div class="flex gap-2 items-center">
                    <input
                        id="chat-image"
                        type="file"
                        name="image"
                        accept="image/*"
                        class="hidden"
                        x-on:change=PICK_IMAGE
                    />
                    <label for="chat-image" class=attach_classes aria-label="Attach image">
                        <PaperclipIcon class="h-5 w-5" />
                    </label>

                    <Input
                        name="message"
                        placeholder="Ask a question..."
                        value=text
                        class="flex-1"
                    />

                    <button
                        type="submit"
                        class=submit_classes
                        aria-label="Send"
                        disabled=!can_submit
                        x-bind:disabled="!text.trim() && !fileName"
                    >
                        <SendIcon class="h-5 w-5" />
                    </button>
                </div>
            </form>
        </div>
    }
}
