//! LoreForge Trigger System
//!
//! The fixed event taxonomy of the crossfade controller and the logic that
//! turns game state into a single active trigger tag:
//! - Normalized trigger tags (`CATEGORY` or `CATEGORY: VALUE`)
//! - Event categories consumed by host configuration UIs
//! - Active-event resolution with pause/combat precedence
//! - Custom-event normalization for the manual override
//! - Lead-authority selection for the host's broadcast relay

pub mod authority;
pub mod custom;
pub mod resolve;
pub mod tag;

pub use authority::{Peer, is_lead, lead_peer};
pub use custom::{format_custom, normalize_custom};
pub use resolve::{GameState, resolve_event};
pub use tag::{Disposition, EventCategory, TriggerTag};

use thiserror::Error;

/// Trigger taxonomy error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("empty trigger tag")]
    EmptyTag,
}

pub type TriggerResult<T> = Result<T, TriggerError>;
