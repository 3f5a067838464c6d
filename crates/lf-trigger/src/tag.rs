//! Trigger Tags and Event Taxonomy
//!
//! A trigger tag is the normalized string form of a layer's activation
//! condition: a bare `CATEGORY`, or `CATEGORY: VALUE`. Layers declare tags;
//! the resolver produces one active tag; the crossfade engine compares the
//! two sets. Normalization (uppercase, `": "` separator) happens exactly
//! once, at construction, so membership checks are plain equality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TriggerError;

/// Separator between a tag's category and sub-value
pub const TAG_SEPARATOR: &str = ": ";

/// A normalized trigger tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerTag(String);

impl TriggerTag {
    /// Build a tag from a category and optional sub-value
    pub fn new(category: &str, value: Option<&str>) -> Self {
        let tag = match value {
            Some(value) => format!("{category}{TAG_SEPARATOR}{value}"),
            None => category.to_string(),
        };
        Self(tag.to_uppercase())
    }

    /// Build a tag from a stored 1-2 element part list
    ///
    /// Returns None for an empty list or a blank first part; extra parts
    /// beyond the second are ignored.
    pub fn parse(parts: &[String]) -> Option<Self> {
        let category = parts.first()?.trim();
        if category.is_empty() {
            return None;
        }
        Some(Self::new(category, parts.get(1).map(|v| v.as_str())))
    }

    /// The implicit tag matched when no layer matches the active event
    pub fn default_tag() -> Self {
        Self(EventCategory::Default.key().to_string())
    }

    /// The tag produced while the game is paused
    pub fn game_paused() -> Self {
        Self::new(EventCategory::Game.key(), Some("PAUSED"))
    }

    /// Normalized string form
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Category portion (text before the separator)
    pub fn category(&self) -> &str {
        match self.0.split_once(TAG_SEPARATOR) {
            Some((category, _)) => category,
            None => &self.0,
        }
    }

    /// Sub-value portion, if any
    pub fn value(&self) -> Option<&str> {
        self.0.split_once(TAG_SEPARATOR).map(|(_, value)| value)
    }

    /// Split back into the stored 1-2 element part list
    pub fn parts(&self) -> Vec<String> {
        match self.0.split_once(TAG_SEPARATOR) {
            Some((category, value)) => vec![category.to_string(), value.to_string()],
            None => vec![self.0.clone()],
        }
    }

    /// Whether this is the implicit DEFAULT tag
    #[inline]
    pub fn is_default(&self) -> bool {
        self.0 == EventCategory::Default.key()
    }

    /// Whether this tag belongs to the manual-entry CUSTOM category
    #[inline]
    pub fn is_custom(&self) -> bool {
        self.category() == EventCategory::Custom.key()
    }
}

impl fmt::Display for TriggerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TriggerTag {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TriggerError::EmptyTag);
        }
        Ok(Self(trimmed.to_uppercase()))
    }
}

/// Event category of the fixed taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Implicit baseline when nothing else applies
    Default,
    /// Driven by the active combatant's disposition
    Combatant,
    /// Driven by global game state (pause)
    Game,
    /// Manually entered free-text override
    Custom,
}

impl EventCategory {
    /// All categories, in configuration-UI order
    pub fn all() -> &'static [EventCategory] {
        &[Self::Default, Self::Combatant, Self::Game, Self::Custom]
    }

    /// Normalized category key
    pub fn key(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Combatant => "COMBATANT",
            Self::Game => "GAME",
            Self::Custom => "CUSTOM",
        }
    }

    /// Fixed sub-values selectable for this category
    pub fn sub_values(&self) -> &'static [&'static str] {
        match self {
            Self::Combatant => &["FRIENDLY", "NEUTRAL", "HOSTILE"],
            Self::Game => &["PAUSED"],
            Self::Default | Self::Custom => &[],
        }
    }

    /// Whether the sub-value is free text entered by the user
    pub fn manual_entry(&self) -> bool {
        matches!(self, Self::Custom)
    }
}

/// Disposition of the active combatant's token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Friendly,
    Neutral,
    Hostile,
}

impl Disposition {
    /// The trigger tag this disposition resolves to
    pub fn tag(&self) -> TriggerTag {
        let value = match self {
            Self::Friendly => "FRIENDLY",
            Self::Neutral => "NEUTRAL",
            Self::Hostile => "HOSTILE",
        };
        TriggerTag::new(EventCategory::Combatant.key(), Some(value))
    }
}
