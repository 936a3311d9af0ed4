//! Text input component.

use leptos::prelude::*;

/// Single-line text input.
///
/// `value` is owned so a re-rendered form can carry pending text. The
/// field is bound to the enclosing Alpine `text` property.
#[component]
pub fn Input(
    /// Input name attribute.
    name: &'static str,
    /// Placeholder text.
    #[prop(default = "")]
    placeholder: &'static str,
    /// Current value.
    #[prop(default = String::new())]
    value: String,
    /// Whether the input is disabled.
    #[prop(default = false)]
    disabled: bool,
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let base_classes = "flex h-10 w-full rounded-lg border border-panelBorder bg-background \
                        px-3 py-2 text-sm text-textPrimary placeholder:text-textMuted \
                        focus-visible:outline-none focus-visible:ring-2 focus-visible:ring-primary \
                        focus-visible:ring-offset-2 disabled:cursor-not-allowed \
                        disabled:opacity-50";

    let classes = format!("{} {}", base_classes, class);

    view! {
        <input
            type="text"
            class=classes
            placeholder=placeholder
            name=name
            value=value
            disabled=disabled
            autocomplete="off"
            x-model="text"
        />
    }
}
