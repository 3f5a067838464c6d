//! Active-Event Resolution
//!
//! Computes the single non-custom baseline event from game state. The
//! manual custom-event override is applied later, inside the crossfade
//! engine, because it only wins when the sound under evaluation actually
//! declares the custom tag.

use log::debug;

use lf_core::CrossfadeSettings;

use crate::tag::{Disposition, TriggerTag};

/// Host game-state seam consumed by the resolver and controller
pub trait GameState {
    /// Whether the game is currently paused
    fn paused(&self) -> bool;

    /// Whether a combat encounter is active
    fn combat_active(&self) -> bool;

    /// Disposition of the combatant whose turn it is, if known
    fn active_disposition(&self) -> Option<Disposition>;

    /// Global playlist volume multiplier
    fn global_volume(&self) -> f32 {
        1.0
    }
}

/// Resolve the active event, first match wins:
///
/// 1. Pause event enabled and game paused
/// 2. Combat events disabled, or no active encounter: DEFAULT
///    (a pause with the pause event disabled also lands here)
/// 3. Active combatant's disposition; unknown disposition: DEFAULT
pub fn resolve_event(state: &dyn GameState, settings: &CrossfadeSettings) -> TriggerTag {
    let resolved = if settings.pause_event && state.paused() {
        TriggerTag::game_paused()
    } else if !settings.combat_events || !state.combat_active() {
        TriggerTag::default_tag()
    } else {
        match state.active_disposition() {
            Some(disposition) => disposition.tag(),
            None => TriggerTag::default_tag(),
        }
    };
    debug!("resolved active event: {resolved}");
    resolved
}
