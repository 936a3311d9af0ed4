//! Chat header component.

use leptos::prelude::*;

use crate::ui::components::{Badge, BadgeVariant, SparklesIcon};

/// Chat header with title and status.
#[component]
pub fn ChatHeader(
    /// Title displayed in the header.
    #[prop(default = "Chat")]
    title: &'static str,
    /// Whether an answer is pending.
    #[prop(default = false)]
    loading: bool,
) -> impl IntoView {
    let status = if loading { "Thinking..." } else { "Ready" };

    view! {
        <header class="flex items-center justify-between px-4 py-3 border-b border-panelBorder \
                       bg-panel/50 backdrop-blur-sm">
            <div class="flex items-center gap-2">
                <SparklesIcon class="h-5 w-5 text-primary" />
                <h2 class="font-semibold text-lg">{title}</h2>
            </div>

            <Badge variant=BadgeVariant::Secondary>
                <span id="chat-status" class="text-xs">{status}</span>
            </Badge>
        </header>
    }
}
