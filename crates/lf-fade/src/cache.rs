//! Sound-Handle Cache
//!
//! Maps each distinct source path used by a sound to one lazily-created
//! playback handle. The base track's entry doubles as the base handle, so
//! a layer sharing the base path collapses onto it. Invalidation stops a
//! handle before discarding it; handles are never silently leaked.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::handle::{AudioHandle, HandleFactory};

/// Per-sound cache of playback handles keyed by source path
#[derive(Default)]
pub struct HandleCache {
    handles: HashMap<String, Box<dyn AudioHandle>>,
}

impl HandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live handles
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Whether a handle exists for the source path
    #[inline]
    pub fn contains(&self, src: &str) -> bool {
        self.handles.contains_key(src)
    }

    /// Shared view of a handle
    pub fn get(&self, src: &str) -> Option<&dyn AudioHandle> {
        self.handles.get(src).map(|h| h.as_ref())
    }

    /// Mutable view of a handle
    pub fn get_mut(&mut self, src: &str) -> Option<&mut (dyn AudioHandle + '_)> {
        self.handles.get_mut(src).map(|h| h.as_mut() as &mut dyn AudioHandle)
    }

    /// Existing handle for the path, or a freshly created one
    pub fn ensure(&mut self, src: &str, factory: &mut dyn HandleFactory) -> &mut dyn AudioHandle {
        self.handles
            .entry(src.to_string())
            .or_insert_with(|| {
                debug!("creating handle for {src}");
                factory.create(src)
            })
            .as_mut()
    }

    /// All cached source paths
    pub fn srcs(&self) -> Vec<String> {
        self.handles.keys().cloned().collect()
    }

    /// Drop every handle not in the keep set, stopping each first
    pub fn retain_stopping(&mut self, keep: &HashSet<String>) {
        self.handles.retain(|src, handle| {
            if keep.contains(src) {
                true
            } else {
                debug!("stopping and discarding handle for {src}");
                handle.stop();
                false
            }
        });
    }

    /// Stop and discard every handle
    pub fn clear_stopping(&mut self) {
        for (_, handle) in self.handles.iter_mut() {
            handle.stop();
        }
        self.handles.clear();
    }
}

impl std::fmt::Debug for HandleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleCache")
            .field("srcs", &self.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}
