//! Story state management - the running state of one playthrough.
//!
//! A [`StoryState`] is created once per session, changed only through
//! [`apply_state_delta`], and discarded when the session ends.

mod delta;

pub use delta::*;

use serde::{Deserialize, Serialize};

use crate::scene::CharacterId;

/// Flag value types for story state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl std::fmt::Display for FlagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagValue::Bool(v) => write!(f, "{}", v),
            FlagValue::Int(v) => write!(f, "{}", v),
            FlagValue::Float(v) => write!(f, "{}", v),
            FlagValue::String(v) => write!(f, "\"{}\"", v),
        }
    }
}

/// A named story flag. Keys are unique within a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub key: String,
    pub value: FlagValue,
}

impl Flag {
    pub fn new(key: impl Into<String>, value: FlagValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// The player's standing with one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub character_id: CharacterId,
    pub trust: f32,
    pub affection: f32,
}

impl Relation {
    pub fn new(character_id: impl Into<CharacterId>, trust: f32, affection: f32) -> Self {
        Self {
            character_id: character_id.into(),
            trust,
            affection,
        }
    }
}

/// Resolution of a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromiseStatus {
    Kept,
    Broken,
    #[default]
    Unresolved,
}

impl PromiseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromiseStatus::Kept => "kept",
            PromiseStatus::Broken => "broken",
            PromiseStatus::Unresolved => "unresolved",
        }
    }
}

/// Something the player committed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promise {
    pub id: String,
    pub description: String,
    pub status: PromiseStatus,
}

impl Promise {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: PromiseStatus::Unresolved,
        }
    }
}

/// The complete state of a playthrough at any point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryState {
    pub chapter: u32,
    pub act: u32,
    pub current_faction: String,
    pub flags: Vec<Flag>,
    pub relations: Vec<Relation>,
    pub promises: Vec<Promise>,
}

impl Default for StoryState {
    fn default() -> Self {
        Self {
            chapter: 1,
            act: 1,
            current_faction: String::new(),
            flags: Vec::new(),
            relations: Vec::new(),
            promises: Vec::new(),
        }
    }
}

impl StoryState {
    /// Create the state of a fresh playthrough.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a flag value by key.
    pub fn flag(&self, key: &str) -> Option<&FlagValue> {
        self.flags.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    /// Get the relation with a character.
    pub fn relation(&self, character_id: &CharacterId) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|r| &r.character_id == character_id)
    }

    /// Get a promise by id.
    pub fn promise(&self, id: &str) -> Option<&Promise> {
        self.promises.iter().find(|p| p.id == id)
    }
}

/// Human-readable dump of a story state.
///
/// Sections always appear in the order chapter/act, faction, flags,
/// relations, promises; entries within a section keep insertion order.
pub fn render_state_to_text(state: &StoryState) -> String {
    let mut out = String::new();

    out.push_str(&format!("Chapter {}, Act {}\n", state.chapter, state.act));

    let faction = if state.current_faction.is_empty() {
        "none"
    } else {
        state.current_faction.as_str()
    };
    out.push_str(&format!("Faction: {}\n", faction));

    if state.flags.is_empty() {
        out.push_str("Flags: none\n");
    } else {
        out.push_str("Flags:\n");
        for flag in &state.flags {
            out.push_str(&format!("- {} = {}\n", flag.key, flag.value));
        }
    }

    if state.relations.is_empty() {
        out.push_str("Relations: none\n");
    } else {
        out.push_str("Relations:\n");
        for relation in &state.relations {
            out.push_str(&format!(
                "- {}: trust {:.2}, affection {:.2}\n",
                relation.character_id, relation.trust, relation.affection
            ));
        }
    }

    if state.promises.is_empty() {
        out.push_str("Promises: none\n");
    } else {
        out.push_str("Promises:\n");
        for promise in &state.promises {
            out.push_str(&format!(
                "- {} [{}]: {}\n",
                promise.id,
                promise.status.as_str(),
                promise.description
            ));
        }
    }

    out
}
