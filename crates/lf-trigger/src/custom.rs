//! Custom-Event Normalization
//!
//! The manual override is stored as the user typed it (trimmed); case
//! normalization happens when the stored text is formatted into a tag for
//! matching against layer declarations. Matching is exact after
//! normalization.

use crate::tag::{EventCategory, TriggerTag};

/// Normalize raw custom-event input for storage; blank input clears it
pub fn normalize_custom(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Format a stored custom-event name as its matchable trigger tag
pub fn format_custom(name: &str) -> TriggerTag {
    TriggerTag::new(EventCategory::Custom.key(), Some(name))
}
