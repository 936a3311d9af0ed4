//! Badge component for file-type and status tags.

use leptos::prelude::*;

use crate::document::FileType;

/// Badge visual variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BadgeVariant {
    /// Default badge style.
    #[default]
    Default,
    /// Secondary badge.
    Secondary,
    /// Outline badge.
    Outline,
}

impl BadgeVariant {
    /// Get CSS classes for this variant.
    #[must_use]
    pub fn classes(self) -> &'static str {
        match self {
            Self::Default => "bg-primary text-white",
            Self::Secondary => "bg-panel text-textPrimary border border-panelBorder",
            Self::Outline => "border border-panelBorder bg-transparent text-textPrimary",
        }
    }

    /// Variant used to tag a document of the given type.
    ///
    /// Types without a dedicated viewer get the outline style.
    #[must_use]
    pub fn for_file_type(file_type: &FileType) -> Self {
        match file_type {
            FileType::Other(_) => Self::Outline,
            _ => Self::Secondary,
        }
    }
}

/// Badge component for displaying status or labels.
#[component]
pub fn Badge(
    /// Badge variant.
    #[prop(default = BadgeVariant::Default)]
    variant: BadgeVariant,
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
    /// Badge content.
    children: Children,
) -> impl IntoView {
    let base_classes = "inline-flex items-center rounded-full px-2.5 py-0.5 text-xs font-semibold \
                        transition-colors";

    let classes = format!("{} {} {}", base_classes, variant.classes(), class);

    view! {
        <span class=classes>
            {children()}
        </span>
    }
}
