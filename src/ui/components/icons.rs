//! SVG icon components.
//!
//! Icons are rendered inline as SVG elements for optimal performance
//! and styling flexibility.

use leptos::prelude::*;

const PAPERCLIP_PATH: &str = "m21.44 11.05-9.19 9.19a6 6 0 0 1-8.49-8.49l8.57-8.57A4 4 0 1 1 18 \
                              8.84l-8.59 8.57a2 2 0 0 1-2.83-2.83l8.49-8.48";

const SPARKLE_PATH: &str = "m12 3-1.912 5.813a2 2 0 0 1-1.275 1.275L3 12l5.813 1.912a2 2 0 0 1 \
                            1.275 1.275L12 21l1.912-5.813a2 2 0 0 1 1.275-1.275L21 12l-5.813\
                            -1.912a2 2 0 0 1-1.275-1.275L12 3Z";

/// Common icon size class.
const ICON_SIZE: &str = "h-4 w-4";

/// Send/arrow-right icon.
#[component]
pub fn SendIcon(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let classes = format!("{} {}", ICON_SIZE, class);

    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            viewBox="0 0 24 24"
            fill="none"
            stroke="currentColor"
            stroke-width="2"
            stroke-linecap="round"
            stroke-linejoin="round"
            class=classes
        >
            <line x1="22" y1="2" x2="11" y2="13" />
            <polygon points="22 2 15 22 11 13 2 9 22 2" />
        </svg>
    }
}

/// Loader/spinner icon.
#[component]
pub fn LoaderIcon(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let classes = format!("{} {} animate-spin", ICON_SIZE, class);

    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            viewBox="0 0 24 24"
            fill="none"
            stroke="currentColor"
            stroke-width="2"
            stroke-linecap="round"
            stroke-linejoin="round"
            class=classes
        >
            <path d="M21 12a9 9 0 1 1-6.219-8.56" />
        </svg>
    }
}

/// Paperclip icon for the attach button.
#[component]
pub fn PaperclipIcon(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let classes = format!("{} {}", ICON_SIZE, class);

    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            viewBox="0 0 24 24"
            fill="none"
            stroke="currentColor"
            stroke-width="2"
            stroke-linecap="round"
            stroke-linejoin="round"
            class=classes
        >
            <path d=PAPERCLIP_PATH />
        </svg>
    }
}

/// File/document icon.
#[component]
pub fn FileIcon(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let classes = format!("{} {}", ICON_SIZE, class);

    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            viewBox="0 0 24 24"
            fill="none"
            stroke="currentColor"
            stroke-width="2"
            stroke-linecap="round"
            stroke-linejoin="round"
            class=classes
        >
            <path d="M14.5 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V7.5L14.5 2z" />
            <polyline points="14 2 14 8 20 8" />
        </svg>
    }
}

/// Chevron-left icon (previous page).
#[component]
pub fn ChevronLeftIcon(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let classes = format!("{} {}", ICON_SIZE, class);

    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            viewBox="0 0 24 24"
            fill="none"
            stroke="currentColor"
            stroke-width="2"
            stroke-linecap="round"
            stroke-linejoin="round"
            class=classes
        >
            <polyline points="15 18 9 12 15 6" />
        </svg>
    }
}

/// Chevron-right icon (next page).
#[component]
pub fn ChevronRightIcon(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let classes = format!("{} {}", ICON_SIZE, class);

    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            viewBox="0 0 24 24"
            fill="none"
            stroke="currentColor"
            stroke-width="2"
            stroke-linecap="round"
            stroke-linejoin="round"
            class=classes
        >
            <polyline points="9 18 15 12 9 6" />
        </svg>
    }
}

/// Sparkles/AI icon.
#[component]
pub fn SparklesIcon(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let classes = format!("{} {}", ICON_SIZE, class);

    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            viewBox="0 0 24 24"
            fill="none"
            stroke="currentColor"
            stroke-width="2"
            stroke-linecap="round"
            stroke-linejoin="round"
            class=classes
        >
            <path d=SPARKLE_PATH />
            <path d="M5 3v4" />
            <path d="M19 17v4" />
            <path d="M3 5h4" />
            <path d="M17 19h4" />
        </svg>
    }
}
