//! ShadCN-style reusable UI components.
//!
//! This module provides a set of composable, accessible UI components
//! inspired by shadcn/ui, rendered via Leptos SSR.
//!
//! # Components
//!
//! - [`Button`]: Clickable button with variants
//! - [`Card`], [`CardHeader`], [`CardContent`]: Card container
//! - [`Input`]: Text input field
//! - [`Badge`]: File-type and status badge
//! - [`ScrollArea`]: Scrollable container
//! - [`Separator`]: Divider line
//! - [`icons`]: SVG icon components

mod badge;
mod button;
mod card;
mod icons;
mod input;
mod scroll_area;
mod separator;

pub use badge::{Badge, BadgeVariant};
pub use button::{Button, ButtonSize, ButtonVariant};
pub use card::{Card, CardContent, CardHeader};
pub use icons::*;
pub use input::Input;
pub use scroll_area::ScrollArea;
pub use separator::Separator;
