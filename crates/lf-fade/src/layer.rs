//! Layer Store Adapter
//!
//! Parses the persisted layer list (an opaque flag value on the host's
//! playlist-sound entity) into in-memory layer records and serializes
//! edits back. The stored representation is a list of records:
//!
//! ```json
//! [{ "src": "path", "volumeAdjustment": 0.5, "events": [["COMBATANT", "HOSTILE"], ["CUSTOM"]] }]
//! ```
//!
//! Malformed entries (missing src, no usable events) are dropped, never
//! surfaced: the engine must not construct a layer without a source.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lf_trigger::TriggerTag;

/// One alternative audio asset for a playable sound
#[derive(Debug, Clone, PartialEq)]
pub struct SoundLayer {
    /// Source path of the layer asset
    pub src: String,
    /// Stored volume-adjustment multiplier; clamped only at playback time
    pub volume_adjustment: Option<f32>,
    /// Trigger tags under which this layer is audible
    pub events: Vec<TriggerTag>,
}

impl SoundLayer {
    pub fn new(src: impl Into<String>, events: Vec<TriggerTag>) -> Self {
        Self {
            src: src.into(),
            volume_adjustment: None,
            events,
        }
    }

    /// Builder: set the volume adjustment
    pub fn with_adjustment(mut self, adjustment: f32) -> Self {
        self.volume_adjustment = Some(adjustment);
        self
    }

    /// Effective adjustment multiplier (default 1.0)
    #[inline]
    pub fn adjustment(&self) -> f32 {
        self.volume_adjustment.unwrap_or(1.0)
    }

    /// A layer without trigger tags exists but never becomes audible
    #[inline]
    pub fn is_inert(&self) -> bool {
        self.events.is_empty()
    }
}

/// Stored form of a layer record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLayer {
    #[serde(default)]
    src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume_adjustment: Option<f32>,
    #[serde(default)]
    events: Vec<Vec<String>>,
}

/// Parse the persisted flag value into layer records
///
/// Anything that is not a list of well-formed records is skipped with a
/// diagnostic log; parsing never fails.
pub fn parse_layers(raw: &Value) -> Vec<SoundLayer> {
    let Some(entries) = raw.as_array() else {
        if !raw.is_null() {
            debug!("layer flag is not a list, ignoring: {raw}");
        }
        return Vec::new();
    };

    let mut layers = Vec::with_capacity(entries.len());
    for entry in entries {
        let record: RawLayer = match serde_json::from_value(entry.clone()) {
            Ok(record) => record,
            Err(err) => {
                debug!("dropping malformed layer record: {err}");
                continue;
            }
        };
        if record.src.is_empty() {
            debug!("dropping layer record without a source");
            continue;
        }
        let events: Vec<TriggerTag> = record
            .events
            .iter()
            .filter_map(|parts| TriggerTag::parse(parts))
            .collect();
        if events.is_empty() {
            debug!("dropping layer record without events: {}", record.src);
            continue;
        }
        layers.push(SoundLayer {
            src: record.src,
            volume_adjustment: record.volume_adjustment,
            events,
        });
    }
    layers
}

/// Serialize layer records back into the persisted flag value
///
/// Exact inverse of [`parse_layers`]: entry order is preserved and bare
/// single-part tags stay single-element lists.
pub fn serialize_layers(layers: &[SoundLayer]) -> Value {
    let records: Vec<RawLayer> = layers
        .iter()
        .map(|layer| RawLayer {
            src: layer.src.clone(),
            volume_adjustment: layer.volume_adjustment,
            events: layer.events.iter().map(|tag| tag.parts()).collect(),
        })
        .collect();
    serde_json::to_value(records).expect("layer records serialize to plain JSON")
}
