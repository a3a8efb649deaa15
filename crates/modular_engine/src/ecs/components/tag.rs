//! Tag component

use crate::ecs::Component;

/// Free-form label; many entities may share one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagComponent {
    /// Label text
    pub label: String,
}

impl Component for TagComponent {}

impl TagComponent {
    /// Create a tag
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}
