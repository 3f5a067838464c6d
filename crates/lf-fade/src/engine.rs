//! Crossfade Engine
//!
//! Per-sound state machine that brings a set of playback handles into
//! agreement with the active trigger event. All layers of a playing sound
//! run simultaneously; the event only decides which handles are audible,
//! so switching layers is a volume crossfade, never a restart.
//!
//! Phases:
//! - `Idle`: the sound is not intended to play
//! - `WaitingBase`: playback intended, base handle not yet started; layer
//!   starts are deferred behind the base start event
//! - `Active`: base audible, layer handles follow every re-sync
//!
//! A sync pass only issues commands; decode completion, playback start and
//! fade completion arrive later through the notification entry points.

use std::collections::HashSet;

use log::{debug, warn};

use lf_core::volume::effective_volume;
use lf_trigger::TriggerTag;

use crate::cache::HandleCache;
use crate::handle::{HandleFactory, LoadRequest, PlaybackRequest};
use crate::sound::{PlayableSound, RuntimeLayerMap};

/// Playback phase of one sound's handle set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// Not playing
    #[default]
    Idle,
    /// Playback intended, waiting for the base handle to start
    WaitingBase,
    /// Base handle playing, layer handles following
    Active,
}

/// Resolved inputs to one sync pass
///
/// The active event is threaded in as an argument on every call; the
/// engine holds no global event state.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Baseline event produced by the resolver
    pub active_event: TriggerTag,
    /// Formatted manual override, if one is set
    pub custom_event: Option<TriggerTag>,
    /// Master crossfade switch
    pub crossfade_enabled: bool,
    /// Global playlist volume multiplier
    pub global_volume: f32,
}

impl SyncContext {
    pub fn new(active_event: TriggerTag) -> Self {
        Self {
            active_event,
            custom_event: None,
            crossfade_enabled: true,
            global_volume: 1.0,
        }
    }

    /// Builder: set the manual override
    pub fn with_custom(mut self, custom: TriggerTag) -> Self {
        self.custom_event = Some(custom);
        self
    }
}

/// Commands issued during one engine pass, for observability and tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Source paths a load was issued for
    pub loads: Vec<String>,
    /// Source paths a play was issued for
    pub plays: Vec<String>,
    /// Fades issued, with their target volumes
    pub fades: Vec<(String, f32)>,
    /// Source paths stopped outright
    pub stops: Vec<String>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty() && self.plays.is_empty() && self.fades.is_empty() && self.stops.is_empty()
    }
}

/// Runtime state of one playable sound: definitions plus live handles
pub struct SoundRuntime {
    /// The sound's definition and intent flags
    pub sound: PlayableSound,
    handles: HandleCache,
    layer_map: Option<RuntimeLayerMap>,
    phase: PlaybackPhase,
    deferred_starts: Vec<String>,
    pending_stops: HashSet<String>,
}

impl SoundRuntime {
    pub fn new(sound: PlayableSound) -> Self {
        Self {
            sound,
            handles: HandleCache::new(),
            layer_map: None,
            phase: PlaybackPhase::Idle,
            deferred_starts: Vec::new(),
            pending_stops: HashSet::new(),
        }
    }

    /// Current playback phase
    #[inline]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Whether a handle exists for the source path
    #[inline]
    pub fn knows_handle(&self, src: &str) -> bool {
        self.handles.contains(src)
    }

    /// Whether the base handle is currently playing
    pub fn base_playing(&self) -> bool {
        self.handles
            .get(&self.sound.path)
            .is_some_and(|h| h.playing())
    }

    /// Base asset duration in seconds, once decoded and finite
    pub fn base_duration(&self) -> Option<f64> {
        self.handles
            .get(&self.sound.path)
            .and_then(|h| h.duration())
            .filter(|d| d.is_finite())
    }

    /// Rebuild the layer map and handle set eagerly after a definition
    /// change, so a following sync is not racing stale handles
    pub fn rebuild(&mut self) {
        self.refresh_map();
    }

    /// Stop and discard every handle (sound deleted)
    pub fn shutdown(&mut self) {
        self.handles.clear_stopping();
        self.layer_map = None;
        self.phase = PlaybackPhase::Idle;
        self.deferred_starts.clear();
        self.pending_stops.clear();
    }

    /// Issue plain loads for every unique handle that is not yet decoded
    pub fn preload(&mut self, factory: &mut dyn HandleFactory) -> SyncReport {
        let mut report = SyncReport::default();
        if self.sound.path.is_empty() {
            return report;
        }
        self.refresh_map();
        self.ensure_handles(factory);
        for src in self.handles.srcs() {
            if let Some(handle) = self.handles.get_mut(&src) {
                if !handle.loaded() && !handle.failed() && !handle.playing() {
                    handle.load(LoadRequest::preload());
                    report.loads.push(src);
                }
            }
        }
        report
    }

    /// Bring every handle into agreement with the sound's intent and the
    /// active event; returns once every command has been issued
    pub fn sync(&mut self, ctx: &SyncContext, factory: &mut dyn HandleFactory) -> SyncReport {
        let mut report = SyncReport::default();

        if !self.sound.playing {
            self.stop_playback(&mut report);
            return report;
        }
        if self.sound.path.is_empty() {
            warn!("sync on sound {} without a base track", self.sound.id);
            return report;
        }

        self.refresh_map();
        self.ensure_handles(factory);

        if self
            .handles
            .get(&self.sound.path)
            .is_some_and(|h| h.failed())
        {
            debug!(
                "base track failed for sound {}; nothing will play",
                self.sound.id
            );
            return report;
        }

        // Resuming playback cancels any fade-to-stop still in flight
        self.pending_stops.clear();

        let effective = self.effective_event(ctx);
        let base = self.sound.path.clone();
        self.sync_handle(&base, &effective, ctx, None, &mut report);

        let layer_srcs = self.layer_srcs();
        if self.base_playing() {
            self.phase = PlaybackPhase::Active;
            let offset = self.handles.get(&base).and_then(|h| h.current_time());
            for src in &layer_srcs {
                self.sync_handle(src, &effective, ctx, offset, &mut report);
            }
            self.deferred_starts.clear();
        } else {
            self.phase = PlaybackPhase::WaitingBase;
            for src in &layer_srcs {
                if let Some(handle) = self.handles.get_mut(src) {
                    if !handle.failed() && !handle.loaded() && !handle.playing() {
                        handle.load(LoadRequest::preload());
                        report.loads.push(src.clone());
                    }
                }
            }
            self.deferred_starts = layer_srcs;
        }

        report
    }

    /// A handle reported its playback start
    ///
    /// The base start flips the sound to `Active` and releases the
    /// deferred layer starts, in phase with the base position. Layer
    /// starts arrive through the same hook and need no further action.
    pub fn handle_started(&mut self, src: &str, ctx: &SyncContext) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.sound.playing {
            debug!(
                "start notification for {src} after sound {} stopped",
                self.sound.id
            );
            return report;
        }
        if src == self.sound.path {
            self.phase = PlaybackPhase::Active;
            let effective = self.effective_event(ctx);
            let offset = self.handles.get(src).and_then(|h| h.current_time());
            let deferred = std::mem::take(&mut self.deferred_starts);
            for layer_src in &deferred {
                self.sync_handle(layer_src, &effective, ctx, offset, &mut report);
            }
        } else {
            debug!("layer handle started for sound {}: {src}", self.sound.id);
        }
        report
    }

    /// A fade reached its target; stop the handle if a fade-to-stop was
    /// pending and the sound is still meant to be silent
    pub fn fade_completed(&mut self, src: &str) -> bool {
        if self.pending_stops.remove(src) && !self.sound.playing {
            if let Some(handle) = self.handles.get_mut(src) {
                handle.stop();
                return true;
            }
        }
        false
    }

    /// Fade every playing handle toward targets computed against an
    /// overridden nominal volume, without persisting it (local preview)
    pub fn refade_to(&mut self, volume: f32, ctx: &SyncContext) -> SyncReport {
        let mut report = SyncReport::default();
        self.refresh_map();
        let effective = self.effective_event(ctx);
        let fade_ms = self.sound.fade_ms;
        for src in self.handles.srcs() {
            let target = self.target_from_nominal(&src, &effective, ctx, volume);
            if let Some(handle) = self.handles.get_mut(&src) {
                if handle.playing() && !handle.failed() {
                    handle.fade(target, fade_ms);
                    report.fades.push((src, target));
                }
            }
        }
        report
    }

    /// Rebuild the layer map when the definition generation moved on.
    /// Every handle other than the (possibly new) base is stopped and
    /// discarded before the rebuild.
    fn refresh_map(&mut self) {
        let stale = self
            .layer_map
            .as_ref()
            .is_none_or(|map| map.is_stale(&self.sound));
        if !stale {
            return;
        }
        let keep: HashSet<String> = HashSet::from([self.sound.path.clone()]);
        self.handles.retain_stopping(&keep);
        self.pending_stops.retain(|src| keep.contains(src));
        self.deferred_starts.clear();
        self.layer_map = Some(RuntimeLayerMap::build(&self.sound));
    }

    fn ensure_handles(&mut self, factory: &mut dyn HandleFactory) {
        let srcs = match &self.layer_map {
            Some(map) => map.unique_srcs(&self.sound.path),
            None => return,
        };
        for src in &srcs {
            self.handles.ensure(src, factory);
        }
    }

    /// Layer source paths, base excluded, in stable order
    fn layer_srcs(&self) -> Vec<String> {
        let mut srcs: Vec<String> = match &self.layer_map {
            Some(map) => map
                .srcs()
                .filter(|src| *src != self.sound.path)
                .map(String::from)
                .collect(),
            None => Vec::new(),
        };
        srcs.sort();
        srcs
    }

    /// The event actually used for targeting this sound's handles:
    /// the custom override when some layer declares it, the resolver's
    /// event when some layer declares that, DEFAULT otherwise
    fn effective_event(&self, ctx: &SyncContext) -> TriggerTag {
        let Some(map) = &self.layer_map else {
            return ctx.active_event.clone();
        };
        let declares = |tag: &TriggerTag| {
            map.srcs()
                .any(|src| !self.handle_failed(src) && map.get(src).is_some_and(|b| b.declares(tag)))
        };
        if let Some(custom) = &ctx.custom_event {
            if declares(custom) {
                return custom.clone();
            }
        }
        if !ctx.active_event.is_default() && !declares(&ctx.active_event) {
            return TriggerTag::default_tag();
        }
        ctx.active_event.clone()
    }

    fn handle_failed(&self, src: &str) -> bool {
        self.handles.get(src).is_some_and(|h| h.failed())
    }

    fn target_volume(&self, src: &str, effective: &TriggerTag, ctx: &SyncContext) -> f32 {
        self.target_from_nominal(src, effective, ctx, self.sound.volume * ctx.global_volume)
    }

    /// Target-volume algorithm for one handle
    ///
    /// Base handles default to the nominal volume, layers to silence.
    /// When crossfading applies and at least one non-failed handle matches
    /// the effective event, the matching set plays at nominal volume and
    /// every other tagged handle (plus the base) is silenced. A handle
    /// matching several tags carries no extra weight.
    fn target_from_nominal(
        &self,
        src: &str,
        effective: &TriggerTag,
        ctx: &SyncContext,
        nominal_base: f32,
    ) -> f32 {
        let adjustment = self
            .layer_map
            .as_ref()
            .map_or(1.0, |map| map.volume_adjustment(src));
        let nominal = effective_volume(nominal_base, adjustment);
        let is_base = src == self.sound.path;
        let mut target = if is_base { nominal } else { 0.0 };

        let Some(map) = &self.layer_map else {
            return target;
        };
        if !ctx.crossfade_enabled || map.is_empty() {
            return target;
        }

        let mut current: HashSet<&str> = HashSet::new();
        let mut others: HashSet<&str> = HashSet::new();
        for bound in map.srcs() {
            if self.handle_failed(bound) {
                continue;
            }
            let Some(binding) = map.get(bound) else {
                continue;
            };
            if binding.declares(effective) {
                current.insert(bound);
            } else {
                others.insert(bound);
            }
        }

        if !current.is_empty() {
            if current.contains(src) {
                target = nominal;
            } else if others.contains(src) || is_base {
                target = 0.0;
            }
        }
        target
    }

    /// Drive one handle toward its target: play when it is not running
    /// correctly, fade when it already is
    fn sync_handle(
        &mut self,
        src: &str,
        effective: &TriggerTag,
        ctx: &SyncContext,
        offset: Option<f64>,
        report: &mut SyncReport,
    ) {
        let target = self.target_volume(src, effective, ctx);
        let fade_ms = self.sound.fade_ms;
        let looping = self.sound.repeat;
        let is_base = src == self.sound.path;
        let start_offset = if is_base {
            self.sound.paused_offset
        } else {
            offset
        };

        let sound_id = self.sound.id;
        let Some(handle) = self.handles.get_mut(src) else {
            warn!("no handle for {src} on sound {sound_id}");
            return;
        };
        if handle.failed() {
            debug!("skipping failed handle {src} on sound {sound_id}");
            return;
        }

        if handle.playing() {
            if handle.looping() != looping {
                let mut request = PlaybackRequest::new(target, looping);
                if fade_ms > 0 {
                    request = request.with_fade(fade_ms);
                }
                handle.play(request);
                report.plays.push(src.to_string());
            } else {
                handle.fade(target, fade_ms);
                report.fades.push((src.to_string(), target));
            }
            return;
        }

        let mut request = PlaybackRequest::new(target, looping).with_offset(start_offset);
        if fade_ms > 0 {
            request = request.with_fade(fade_ms);
        }
        if handle.loaded() {
            handle.play(request);
            report.plays.push(src.to_string());
        } else {
            handle.load(LoadRequest::autoplay(request));
            report.loads.push(src.to_string());
        }
    }

    /// Wind playback down: fade-then-stop when a fade is configured and no
    /// paused offset is set, immediate stop otherwise. Stops for different
    /// handles are issued together, never sequenced on one another.
    fn stop_playback(&mut self, report: &mut SyncReport) {
        let fade_ms = self.sound.fade_ms;
        let immediate = fade_ms == 0 || self.sound.paused_offset.is_some();
        for src in self.handles.srcs() {
            let Some(handle) = self.handles.get_mut(&src) else {
                continue;
            };
            if !immediate && handle.playing() {
                handle.fade(0.0, fade_ms);
                self.pending_stops.insert(src.clone());
                report.fades.push((src, 0.0));
            } else {
                handle.stop();
                report.stops.push(src);
            }
        }
        self.phase = PlaybackPhase::Idle;
        self.deferred_starts.clear();
    }
}

impl std::fmt::Debug for SoundRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundRuntime")
            .field("sound", &self.sound.id)
            .field("phase", &self.phase)
            .field("handles", &self.handles)
            .finish()
    }
}
