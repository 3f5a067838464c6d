//! Playback Controller
//!
//! The orchestrator: owns the sound and playlist registries, reacts to
//! host lifecycle notifications at the right moments, and drives the
//! crossfade engine with a freshly resolved event context on every pass.
//! One sound's failure is logged and contained; it never aborts
//! crossfading of the sounds around it.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use parking_lot::RwLock;

use lf_core::{CrossfadeSettings, PlaylistId, SoundId};
use lf_trigger::{GameState, TriggerTag, format_custom, normalize_custom, resolve_event};

use crate::engine::{SoundRuntime, SyncContext, SyncReport};
use crate::handle::HandleFactory;
use crate::layer::SoundLayer;
use crate::playlist::Playlist;
use crate::sound::PlayableSound;
use crate::{FadeError, FadeResult};

/// Partial update applied to a registered sound
///
/// A `path` or `layers` change is a definition change: stale handles are
/// stopped and discarded, the runtime map rebuilt eagerly, and the sound
/// re-synced immediately.
#[derive(Debug, Clone, Default)]
pub struct SoundUpdate {
    pub path: Option<String>,
    pub volume: Option<f32>,
    pub fade_ms: Option<u32>,
    pub repeat: Option<bool>,
    pub playing: Option<bool>,
    /// Some(None) clears the paused offset, Some(Some(s)) sets it
    pub paused_offset: Option<Option<f64>>,
    pub layers: Option<Vec<SoundLayer>>,
}

impl SoundUpdate {
    /// Whether this update rewrites the handle-relevant definition
    fn changes_definition(&self) -> bool {
        self.path.is_some() || self.layers.is_some()
    }
}

/// Scheduled preload of the next track's handles
#[derive(Debug, Clone)]
struct PendingPreload {
    fire_at_ms: f64,
    playlist: PlaylistId,
    sound: SoundId,
}

/// The crossfade controller
pub struct CrossfadeController {
    settings: CrossfadeSettings,
    factory: Box<dyn HandleFactory>,
    sounds: HashMap<SoundId, SoundRuntime>,
    playlists: HashMap<PlaylistId, Playlist>,
    /// The manually set custom event; the one process-wide mutable cell.
    /// Written once per external signal, read by every sync pass.
    custom_event: RwLock<Option<String>>,
    preloads: Vec<PendingPreload>,
}

impl CrossfadeController {
    pub fn new(factory: Box<dyn HandleFactory>) -> Self {
        Self::with_settings(factory, CrossfadeSettings::default())
    }

    pub fn with_settings(factory: Box<dyn HandleFactory>, settings: CrossfadeSettings) -> Self {
        Self {
            settings,
            factory,
            sounds: HashMap::new(),
            playlists: HashMap::new(),
            custom_event: RwLock::new(None),
            preloads: Vec::new(),
        }
    }

    /// Current settings
    pub fn settings(&self) -> &CrossfadeSettings {
        &self.settings
    }

    /// Replace the settings and re-sync playing sounds (the enable switch
    /// takes effect immediately)
    pub fn update_settings(&mut self, settings: CrossfadeSettings, state: &dyn GameState) {
        self.settings = settings;
        self.crossfade_playlists(state);
    }

    // ─── Registry ───

    /// Register (or replace) a sound definition
    pub fn register_sound(&mut self, sound: PlayableSound) {
        debug!("registering sound {}", sound.id);
        self.sounds.insert(sound.id, SoundRuntime::new(sound));
    }

    /// Register (or replace) a playlist
    pub fn register_playlist(&mut self, playlist: Playlist) {
        self.playlists.insert(playlist.id, playlist);
    }

    /// The registered definition for a sound, if any
    pub fn sound(&self, id: SoundId) -> Option<&PlayableSound> {
        self.sounds.get(&id).map(|rt| &rt.sound)
    }

    /// Sound deleted: stop every unique handle, no replacement
    pub fn remove_sound(&mut self, id: SoundId) {
        match self.sounds.remove(&id) {
            Some(mut runtime) => runtime.shutdown(),
            None => debug!("remove for unknown sound {id}"),
        }
    }

    /// Playlist deleted: stop every member sound's handles
    pub fn remove_playlist(&mut self, id: PlaylistId) {
        let Some(playlist) = self.playlists.remove(&id) else {
            debug!("remove for unknown playlist {id}");
            return;
        };
        for sound_id in playlist.order {
            if let Some(runtime) = self.sounds.get_mut(&sound_id) {
                runtime.shutdown();
            }
        }
    }

    /// Apply a partial update to a sound, then re-sync it
    pub fn update_sound(&mut self, id: SoundId, update: SoundUpdate, state: &dyn GameState) {
        let ctx = self.build_ctx(state);
        let Some(runtime) = self.sounds.get_mut(&id) else {
            warn!("update for unknown sound {id}");
            return;
        };

        if let Some(volume) = update.volume {
            runtime.sound.volume = volume;
        }
        if let Some(fade_ms) = update.fade_ms {
            runtime.sound.fade_ms = fade_ms;
        }
        if let Some(repeat) = update.repeat {
            runtime.sound.repeat = repeat;
        }
        if let Some(playing) = update.playing {
            runtime.sound.playing = playing;
        }
        if let Some(paused_offset) = update.paused_offset {
            runtime.sound.paused_offset = paused_offset;
        }
        let definition_changed = update.changes_definition();
        if let Some(path) = update.path {
            runtime.sound.set_path(path);
        }
        if let Some(layers) = update.layers {
            runtime.sound.set_layers(layers);
        }
        if definition_changed {
            runtime.rebuild();
        }

        let report = runtime.sync(&ctx, self.factory.as_mut());
        debug!("synced sound {id} after update: {report:?}");
    }

    // ─── Crossfading ───

    /// Re-sync every playing sound that has layers
    pub fn crossfade_playlists(&mut self, state: &dyn GameState) {
        let ids: Vec<SoundId> = self
            .sounds
            .iter()
            .filter(|(_, rt)| rt.sound.playing && rt.sound.has_layers())
            .map(|(id, _)| *id)
            .collect();
        self.crossfade_sounds(&ids, state);
    }

    /// Re-sync a specific set of sounds
    pub fn crossfade_sounds(&mut self, ids: &[SoundId], state: &dyn GameState) {
        let ctx = self.build_ctx(state);
        for &id in ids {
            info!("handling crossfade for sound {id}");
            if let Err(err) = self.try_sync(id, &ctx) {
                warn!("skipping crossfade for sound {id}: {err}");
            }
        }
    }

    /// Re-sync one sound, containing any failure
    pub fn sync_sound(&mut self, id: SoundId, state: &dyn GameState) {
        let ctx = self.build_ctx(state);
        if let Err(err) = self.try_sync(id, &ctx) {
            warn!("sync failed for sound {id}: {err}");
        }
    }

    fn try_sync(&mut self, id: SoundId, ctx: &SyncContext) -> FadeResult<SyncReport> {
        let runtime = self
            .sounds
            .get_mut(&id)
            .ok_or(FadeError::UnknownSound(id))?;
        if runtime.sound.playing && runtime.sound.path.is_empty() {
            return Err(FadeError::MissingBase(id));
        }
        Ok(runtime.sync(ctx, self.factory.as_mut()))
    }

    // ─── Host lifecycle notifications ───

    /// Combat turn changed
    pub fn on_combat_update(&mut self, state: &dyn GameState) {
        if self.settings.combat_events {
            self.crossfade_playlists(state);
        }
    }

    /// Combat encounter ended
    pub fn on_combat_delete(&mut self, state: &dyn GameState) {
        if self.settings.combat_events {
            self.crossfade_playlists(state);
        }
    }

    /// Pause toggled
    pub fn on_pause_toggle(&mut self, state: &dyn GameState) {
        self.crossfade_playlists(state);
    }

    /// Global playlist volume changed
    pub fn on_global_volume_changed(&mut self, state: &dyn GameState) {
        self.crossfade_playlists(state);
    }

    /// Host finished starting up
    pub fn on_ready(&mut self, state: &dyn GameState) {
        if self.settings.enabled {
            self.crossfade_playlists(state);
        }
    }

    // ─── Handle notifications ───

    /// A handle reported its playback start
    pub fn handle_started(&mut self, id: SoundId, src: &str, state: &dyn GameState) {
        let ctx = self.build_ctx(state);
        match self.sounds.get_mut(&id) {
            Some(runtime) => {
                let report = runtime.handle_started(src, &ctx);
                if !report.is_empty() {
                    debug!("released deferred starts for sound {id}: {report:?}");
                }
            }
            None => debug!("start notification for unknown sound {id}"),
        }
    }

    /// A fade reached its target
    pub fn fade_completed(&mut self, id: SoundId, src: &str) {
        if let Err(err) = self.try_fade_completed(id, src) {
            debug!("ignoring fade completion: {err}");
        }
    }

    fn try_fade_completed(&mut self, id: SoundId, src: &str) -> FadeResult<bool> {
        let runtime = self
            .sounds
            .get_mut(&id)
            .ok_or(FadeError::UnknownSound(id))?;
        if !runtime.knows_handle(src) {
            return Err(FadeError::UnknownHandle(src.to_string()));
        }
        Ok(runtime.fade_completed(src))
    }

    /// A handle failed to decode; re-target with it excluded
    pub fn handle_failed(&mut self, id: SoundId, src: &str, state: &dyn GameState) {
        warn!("audio handle failed for sound {id}: {src}");
        self.sync_sound(id, state);
    }

    // ─── Custom events ───

    /// The stored custom-event name, if one is set
    pub fn custom_event(&self) -> Option<String> {
        self.custom_event.read().clone()
    }

    /// Set or clear the custom event, then re-sync playing sounds.
    /// This is the seam the host's broadcast relay calls into.
    pub fn set_custom_event(&mut self, raw: Option<&str>, state: &dyn GameState) {
        let normalized = raw.and_then(normalize_custom);
        {
            let mut cell = self.custom_event.write();
            if *cell == normalized {
                return;
            }
            *cell = normalized.clone();
        }
        match &normalized {
            Some(value) => info!("custom event set: {value}"),
            None => info!("custom event cleared"),
        }
        self.crossfade_playlists(state);
    }

    /// The resolved baseline event for the current game state
    pub fn current_event(&self, state: &dyn GameState) -> TriggerTag {
        resolve_event(state, &self.settings)
    }

    /// Custom-event names declared by layers of playing sounds
    pub fn playing_custom_events(&self, sorted: bool) -> Vec<String> {
        self.collect_custom_events(true, sorted)
    }

    /// Custom-event names declared by layers of any registered sound
    pub fn all_custom_events(&self, sorted: bool) -> Vec<String> {
        self.collect_custom_events(false, sorted)
    }

    fn collect_custom_events(&self, playing_only: bool, sorted: bool) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut names = Vec::new();
        for runtime in self.sounds.values() {
            if playing_only && !runtime.sound.playing {
                continue;
            }
            for layer in runtime.sound.layers() {
                for tag in &layer.events {
                    if !tag.is_custom() {
                        continue;
                    }
                    if let Some(value) = tag.value() {
                        if seen.insert(value.to_string()) {
                            names.push(value.to_string());
                        }
                    }
                }
            }
        }
        if sorted {
            names.sort();
        }
        names
    }

    // ─── Preloading ───

    /// Warm up every unique handle of every sound in a playlist
    pub fn preload_playlist(&mut self, id: PlaylistId) {
        let Some(playlist) = self.playlists.get(&id) else {
            debug!("preload for unknown playlist {id}");
            return;
        };
        let ids = playlist.order.clone();
        for sound_id in ids {
            if let Some(runtime) = self.sounds.get_mut(&sound_id) {
                let report = runtime.preload(self.factory.as_mut());
                if !report.loads.is_empty() {
                    debug!("preloading {} handles for sound {sound_id}", report.loads.len());
                }
            }
        }
    }

    /// A playlist track started: schedule a preload of the next track's
    /// handles inside the pre-roll window, if one is configured
    pub fn on_sound_start(&mut self, playlist_id: PlaylistId, sound_id: SoundId, now_ms: f64) {
        let Some(preroll) = self.settings.auto_preload_seconds else {
            return;
        };
        let advances = self
            .playlists
            .get(&playlist_id)
            .is_some_and(|p| p.mode.advances());
        if !advances {
            return;
        }
        let Some(duration) = self.sounds.get(&sound_id).and_then(|rt| rt.base_duration()) else {
            return;
        };
        let fire_at_ms = now_ms + (duration - f64::from(preroll)).max(0.0) * 1000.0;
        debug!("scheduling next-track preload for playlist {playlist_id} at {fire_at_ms}ms");
        self.preloads.push(PendingPreload {
            fire_at_ms,
            playlist: playlist_id,
            sound: sound_id,
        });
    }

    /// Fire due preloads. There is no cancellation token: each entry
    /// re-checks its triggering condition now and becomes a no-op if the
    /// track was paused, skipped or reordered in the meantime.
    pub fn poll_scheduled(&mut self, now_ms: f64) {
        let mut due = Vec::new();
        self.preloads.retain(|pending| {
            if pending.fire_at_ms <= now_ms {
                due.push((pending.playlist, pending.sound));
                false
            } else {
                true
            }
        });

        for (playlist_id, sound_id) in due {
            let still_playing = self
                .sounds
                .get(&sound_id)
                .is_some_and(|rt| rt.base_playing());
            if !still_playing {
                debug!("preload skipped; sound {sound_id} is no longer playing");
                continue;
            }
            let next = self
                .playlists
                .get(&playlist_id)
                .and_then(|p| p.next_sound(sound_id));
            let Some(next_id) = next else {
                continue;
            };
            if let Some(runtime) = self.sounds.get_mut(&next_id) {
                let report = runtime.preload(self.factory.as_mut());
                info!(
                    "preloaded {} handles for upcoming track {next_id}",
                    report.loads.len()
                );
            }
        }
    }

    // ─── Local volume preview ───

    /// Fade a sound's handles toward targets computed against an
    /// overridden, unpersisted nominal volume (local volume preview)
    pub fn refade_to_volume(&mut self, id: SoundId, volume: f32, state: &dyn GameState) {
        let ctx = self.build_ctx(state);
        match self.sounds.get_mut(&id) {
            Some(runtime) => {
                runtime.refade_to(volume, &ctx);
            }
            None => debug!("volume preview for unknown sound {id}"),
        }
    }

    /// Resolve the event context for one pass; the custom override is
    /// formatted here so matching stays exact and case-normalized
    fn build_ctx(&self, state: &dyn GameState) -> SyncContext {
        SyncContext {
            active_event: resolve_event(state, &self.settings),
            custom_event: self.custom_event.read().as_deref().map(format_custom),
            crossfade_enabled: self.settings.enabled,
            global_volume: state.global_volume(),
        }
    }
}

impl std::fmt::Debug for CrossfadeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossfadeController")
            .field("sounds", &self.sounds.len())
            .field("playlists", &self.playlists.len())
            .field("custom_event", &*self.custom_event.read())
            .finish()
    }
}
