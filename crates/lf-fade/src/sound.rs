//! Playable Sounds and the Runtime Layer Map
//!
//! A playable sound is one playlist entry capable of driving multiple
//! simultaneous audio layers. The runtime layer map is the derived,
//! in-memory view the engine actually works with: one entry per distinct
//! handle source path, stamped with the layer-definition generation it was
//! built from. Definition changes bump the generation; a stale map is
//! discarded and rebuilt, never patched in place.

use std::collections::{HashMap, HashSet};

use lf_core::SoundId;
use lf_trigger::TriggerTag;

use crate::layer::SoundLayer;

/// One logical playlist entry
#[derive(Debug, Clone)]
pub struct PlayableSound {
    /// Host identifier
    pub id: SoundId,
    /// Source path of the base track
    pub path: String,
    /// Nominal volume (0..1)
    pub volume: f32,
    /// Crossfade / fade-out duration in milliseconds
    pub fade_ms: u32,
    /// Whether playback loops
    pub repeat: bool,
    /// Whether this sound is currently intended to play
    pub playing: bool,
    /// Seconds into the track where playback was paused, if paused
    pub paused_offset: Option<f64>,

    layers: Vec<SoundLayer>,
    layer_generation: u64,
}

impl PlayableSound {
    pub fn new(id: SoundId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            volume: 1.0,
            fade_ms: 0,
            repeat: false,
            playing: false,
            paused_offset: None,
            layers: Vec::new(),
            layer_generation: 0,
        }
    }

    /// Builder: set the nominal volume
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Builder: set the fade duration
    pub fn with_fade_ms(mut self, fade_ms: u32) -> Self {
        self.fade_ms = fade_ms;
        self
    }

    /// Builder: set the repeat flag
    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// Builder: set the layer list
    pub fn with_layers(mut self, layers: Vec<SoundLayer>) -> Self {
        self.set_layers(layers);
        self
    }

    /// The sound's layer definitions
    #[inline]
    pub fn layers(&self) -> &[SoundLayer] {
        &self.layers
    }

    /// Whether any layer is defined (inert layers count as defined)
    #[inline]
    pub fn has_layers(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Definition generation; bumped by every layer or path change
    #[inline]
    pub fn layer_generation(&self) -> u64 {
        self.layer_generation
    }

    /// Replace the layer list, invalidating any derived map
    pub fn set_layers(&mut self, layers: Vec<SoundLayer>) {
        self.layers = layers;
        self.layer_generation += 1;
    }

    /// Change the base track path, invalidating any derived map
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
        self.layer_generation += 1;
    }
}

/// Tag set and volume adjustment bound to one handle source path
#[derive(Debug, Clone, PartialEq)]
pub struct LayerBinding {
    /// Normalized trigger tags declared for this handle
    pub tags: Vec<TriggerTag>,
    /// Effective volume-adjustment multiplier
    pub volume_adjustment: f32,
}

impl LayerBinding {
    /// Whether this binding declares the given tag
    #[inline]
    pub fn declares(&self, tag: &TriggerTag) -> bool {
        self.tags.contains(tag)
    }
}

/// Derived map from distinct handle source path to its binding
///
/// Inert layers (no tags) are skipped. When several layers share one
/// source path the later binding replaces the earlier one: a handle is
/// evaluated once, by identity, not once per layer.
#[derive(Debug, Clone)]
pub struct RuntimeLayerMap {
    generation: u64,
    bindings: HashMap<String, LayerBinding>,
}

impl RuntimeLayerMap {
    /// Build the map from the sound's current definitions
    pub fn build(sound: &PlayableSound) -> Self {
        let mut bindings = HashMap::new();
        for layer in sound.layers() {
            if layer.is_inert() || layer.src.is_empty() {
                continue;
            }
            bindings.insert(
                layer.src.clone(),
                LayerBinding {
                    tags: layer.events.clone(),
                    volume_adjustment: layer.adjustment(),
                },
            );
        }
        Self {
            generation: sound.layer_generation(),
            bindings,
        }
    }

    /// Generation this map was built from
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the sound's definitions have moved past this map
    #[inline]
    pub fn is_stale(&self, sound: &PlayableSound) -> bool {
        self.generation != sound.layer_generation()
    }

    /// Whether any handle binding exists
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binding for a source path, if it is part of the map
    #[inline]
    pub fn get(&self, src: &str) -> Option<&LayerBinding> {
        self.bindings.get(src)
    }

    /// All bound source paths
    pub fn srcs(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(|s| s.as_str())
    }

    /// Effective volume adjustment for a handle (1.0 when unbound)
    #[inline]
    pub fn volume_adjustment(&self, src: &str) -> f32 {
        self.bindings
            .get(src)
            .map(|b| b.volume_adjustment)
            .unwrap_or(1.0)
    }

    /// Every distinct source path of the sound: layers plus the base track
    pub fn unique_srcs(&self, base: &str) -> HashSet<String> {
        let mut srcs: HashSet<String> = self.bindings.keys().cloned().collect();
        if !base.is_empty() {
            srcs.insert(base.to_string());
        }
        srcs
    }
}
