//! LoreForge Shared Foundation
//!
//! Common ground for the crossfade controller crates:
//! - Module settings (serde round-trippable, host-persisted)
//! - Identifier aliases for sounds and playlists
//! - Volume math shared by the crossfade engine

pub mod ids;
pub mod settings;
pub mod volume;

pub use ids::{INVALID_SOUND_ID, PlaylistId, SoundId, generate_sound_id};
pub use settings::CrossfadeSettings;
pub use volume::{clamp_unit, effective_volume};
