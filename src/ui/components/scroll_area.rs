//! Scrollable area component.

use leptos::prelude::*;

/// Scrollable container component.
///
/// The client script scrolls the nearest scroll area when an element
/// marked with `data-scroll-to` is swapped in.
///
/// # Example
///
/// ```rust,ignore
/// view! {
///     <ScrollArea id="chat-messages" class="flex-1">
///         // Long content here
///     </ScrollArea>
/// }
/// ```
#[component]
pub fn ScrollArea(
    /// Element id.
    #[prop(default = "")]
    id: &'static str,
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
    /// Scrollable content.
    children: Children,
) -> impl IntoView {
    let classes = format!(
        "relative overflow-auto scrollbar-thin scrollbar-thumb-panelBorder \
         scrollbar-track-transparent {}",
        class
    );

    view! {
        <div id=id class=classes data-scroll-area="">
            {children()}
        </div>
    }
}
