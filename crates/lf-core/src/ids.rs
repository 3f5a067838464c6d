//! Identifier aliases for host-managed entities

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a playlist sound
pub type SoundId = u64;

/// Unique identifier for a playlist
pub type PlaylistId = u64;

/// Sentinel for "no sound" (hosts that assign their own ids start at 1)
pub const INVALID_SOUND_ID: SoundId = 0;

static NEXT_SOUND_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique sound id for hosts without their own id scheme
#[inline]
pub fn generate_sound_id() -> SoundId {
    NEXT_SOUND_ID.fetch_add(1, Ordering::Relaxed)
}
