//! Conditions gating choice options.

use serde::{Deserialize, Serialize};

use super::CharacterId;
use crate::state::{FlagValue, StoryState};

/// A predicate over [`StoryState`] attached to a choice option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// The flag exists, with any value.
    FlagSet { key: String },

    /// The flag exists and holds exactly this value.
    FlagEquals { key: String, value: FlagValue },

    TrustAtLeast {
        character_id: CharacterId,
        threshold: f32,
    },

    AffectionAtLeast {
        character_id: CharacterId,
        threshold: f32,
    },

    ChapterAtLeast { chapter: u32 },
}

impl Condition {
    pub fn flag_set(key: impl Into<String>) -> Self {
        Condition::FlagSet { key: key.into() }
    }

    pub fn flag_equals(key: impl Into<String>, value: FlagValue) -> Self {
        Condition::FlagEquals {
            key: key.into(),
            value,
        }
    }

    pub fn trust_at_least(character_id: impl Into<CharacterId>, threshold: f32) -> Self {
        Condition::TrustAtLeast {
            character_id: character_id.into(),
            threshold,
        }
    }

    pub fn affection_at_least(character_id: impl Into<CharacterId>, threshold: f32) -> Self {
        Condition::AffectionAtLeast {
            character_id: character_id.into(),
            threshold,
        }
    }

    /// Evaluate the condition. Relations that were never recorded count as
    /// failing any threshold check.
    pub fn is_satisfied(&self, state: &StoryState) -> bool {
        match self {
            Condition::FlagSet { key } => state.flag(key).is_some(),
            Condition::FlagEquals { key, value } => state.flag(key) == Some(value),
            Condition::TrustAtLeast {
                character_id,
                threshold,
            } => state
                .relation(character_id)
                .is_some_and(|r| r.trust >= *threshold),
            Condition::AffectionAtLeast {
                character_id,
                threshold,
            } => state
                .relation(character_id)
                .is_some_and(|r| r.affection >= *threshold),
            Condition::ChapterAtLeast { chapter } => state.chapter >= *chapter,
        }
    }
}
