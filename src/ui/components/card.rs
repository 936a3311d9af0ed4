//! Card component with header and content.

use leptos::prelude::*;

/// Card container component.
///
/// # Example
///
/// ```rust,ignore
/// view! {
///     <Card>
///         <CardHeader>
///             <h3>"Documents"</h3>
///         </CardHeader>
///         <CardContent>
///             <p>"No documents uploaded yet."</p>
///         </CardContent>
///     </Card>
/// }
/// ```
#[component]
pub fn Card(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
    /// Card content.
    children: Children,
) -> impl IntoView {
    let classes = format!(
        "rounded-xl border border-panelBorder bg-panel text-textPrimary shadow-sm {}",
        class
    );

    view! {
        <div class=classes>
            {children()}
        </div>
    }
}

/// Card header section.
#[component]
pub fn CardHeader(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
    /// Header content.
    children: Children,
) -> impl IntoView {
    let classes = format!(
        "flex items-center justify-between gap-2 px-4 py-3 border-b border-panelBorder {class}"
    );

    view! {
        <div class=classes>
            {children()}
        </div>
    }
}

/// Card content section.
#[component]
pub fn CardContent(
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
    /// Content.
    children: Children,
) -> impl IntoView {
    let classes = format!("p-4 {}", class);

    view! {
        <div class=classes>
            {children()}
        </div>
    }
}
