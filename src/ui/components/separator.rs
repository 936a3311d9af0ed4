//! Horizontal divider.

use leptos::prelude::*;

/// Divider line placed between consecutive items.
#[component]
pub fn Separator(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let classes = format!("shrink-0 bg-panelBorder h-[1px] w-full {class}");

    view! {
        <div role="separator" class=classes />
    }
}
