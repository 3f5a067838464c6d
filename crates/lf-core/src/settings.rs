//! Module Settings
//!
//! Host-persisted behavior toggles for the crossfade controller. The host
//! owns storage and change notification; the controller only reads these.

use serde::{Deserialize, Serialize};

/// Crossfade controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossfadeSettings {
    /// Master switch for layer crossfading; when off, only base tracks play
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Whether combat turn changes drive COMBATANT events
    #[serde(default = "default_combat_events")]
    pub combat_events: bool,

    /// Whether pausing the game drives the GAME: PAUSED event
    #[serde(default = "default_pause_event")]
    pub pause_event: bool,

    /// Pre-roll window (seconds before track end) for next-track preload;
    /// None disables scheduled preloading
    #[serde(default)]
    pub auto_preload_seconds: Option<f32>,
}

fn default_enabled() -> bool {
    true
}
fn default_combat_events() -> bool {
    true
}
fn default_pause_event() -> bool {
    true
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            combat_events: true,
            pause_event: true,
            auto_preload_seconds: None,
        }
    }
}
