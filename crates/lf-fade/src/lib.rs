//! LoreForge Crossfade Engine
//!
//! Drives a set of audio-layer playback handles into agreement with the
//! active trigger event:
//! - Layer store adapter for the persisted flag format
//! - Runtime layer map with generation-counter invalidation
//! - Audio-handle seam consumed from the host audio engine
//! - Per-sound handle cache with stop-before-discard invalidation
//! - Crossfade state machine (idle / waiting on base / active)
//! - Playback controller reacting to host lifecycle notifications
//!
//! All handle operations are asynchronous command issues; completion comes
//! back through the controller's notification entry points. One failing
//! sound never aborts crossfading of its siblings.

pub mod cache;
pub mod controller;
pub mod engine;
pub mod handle;
pub mod layer;
pub mod playlist;
pub mod sound;

pub use cache::HandleCache;
pub use controller::{CrossfadeController, SoundUpdate};
pub use engine::{PlaybackPhase, SoundRuntime, SyncContext, SyncReport};
pub use handle::{AudioHandle, HandleFactory, LoadRequest, PlaybackRequest};
pub use layer::{SoundLayer, parse_layers, serialize_layers};
pub use playlist::{Playlist, PlaylistMode};
pub use sound::{LayerBinding, PlayableSound, RuntimeLayerMap};

use lf_core::SoundId;
use thiserror::Error;

/// Crossfade engine error types
///
/// All of these are contained at the public boundary: a failing sound is
/// logged and skipped, never surfaced to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FadeError {
    #[error("unknown sound {0}")]
    UnknownSound(SoundId),

    #[error("sound {0} has no base track path")]
    MissingBase(SoundId),

    #[error("handle {0} is not part of the current layer map")]
    UnknownHandle(String),
}

pub type FadeResult<T> = Result<T, FadeError>;
