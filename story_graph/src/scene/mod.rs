//! Scene definitions and the scene graph.
//!
//! The graph consists of:
//! - **Scenes**: Nodes holding an ordered list of narrative items
//! - **Transitions**: Items linking a scene to exactly one successor
//! - **Choices**: Items offering labeled options, each with its own successor
//!
//! The graph may be cyclic. Successor ids are optional so that half-authored
//! edges survive a round trip through the editor; every traversal skips them.

mod character;
mod condition;
mod importance;

pub use character::*;
pub use condition::*;
pub use importance::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::GraphError;
use crate::state::StoryState;

/// Unique identifier for scenes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub String);

impl SceneId {
    /// Create a scene id from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random scene id.
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create a scene id from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry in a scene's script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeItem {
    /// A spoken line.
    Dialogue { speaker: CharacterId, text: String },

    /// Narrator text with no speaker.
    Narration { text: String },

    /// Unconditional move to the next scene.
    Transition { target: Option<SceneId> },

    /// A player-facing decision.
    Choice { options: Vec<ChoiceOption> },
}

impl NarrativeItem {
    /// Create a dialogue line.
    pub fn dialogue(speaker: impl Into<CharacterId>, text: impl Into<String>) -> Self {
        NarrativeItem::Dialogue {
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// Create a narration line.
    pub fn narration(text: impl Into<String>) -> Self {
        NarrativeItem::Narration { text: text.into() }
    }

    /// Create a transition to the given scene.
    pub fn transition(target: impl Into<SceneId>) -> Self {
        NarrativeItem::Transition {
            target: Some(target.into()),
        }
    }

    /// Create a choice with the given options.
    pub fn choice(options: Vec<ChoiceOption>) -> Self {
        NarrativeItem::Choice { options }
    }

    /// Successor ids referenced by this item, skipping missing targets.
    pub fn successors(&self) -> Vec<&SceneId> {
        match self {
            NarrativeItem::Transition { target } => target.iter().collect(),
            NarrativeItem::Choice { options } => {
                options.iter().filter_map(|o| o.target.as_ref()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// One option of a [`NarrativeItem::Choice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub target: Option<SceneId>,

    /// All conditions must hold for the option to be offered.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ChoiceOption {
    /// Create an unconditional option leading to `target`.
    pub fn new(label: impl Into<String>, target: impl Into<SceneId>) -> Self {
        Self {
            label: label.into(),
            target: Some(target.into()),
            conditions: Vec::new(),
        }
    }

    /// Add a condition to this option.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Check whether the option should be offered in the given state.
    pub fn is_available(&self, state: &StoryState) -> bool {
        self.conditions.iter().all(|c| c.is_satisfied(state))
    }
}

/// A node in the narrative graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub title: String,

    /// Ordered script of the scene.
    pub items: Vec<NarrativeItem>,

    /// Characters appearing in the scene.
    #[serde(default)]
    pub characters: Vec<CharacterId>,

    /// Whether the scene carries a precomputed summary usable as
    /// long-range context.
    #[serde(default)]
    pub checkpoint: bool,

    /// Authored narrative weight.
    #[serde(default)]
    pub importance: Option<NodeImportanceFactors>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(id: impl Into<SceneId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items: Vec::new(),
            characters: Vec::new(),
            checkpoint: false,
            importance: None,
        }
    }

    /// Append a narrative item.
    pub fn with_item(mut self, item: NarrativeItem) -> Self {
        self.items.push(item);
        self
    }

    /// Add a character to the cast.
    pub fn with_character(mut self, character: impl Into<CharacterId>) -> Self {
        let character = character.into();
        if !self.characters.contains(&character) {
            self.characters.push(character);
        }
        self
    }

    /// Mark the scene as a checkpoint.
    pub fn as_checkpoint(mut self) -> Self {
        self.checkpoint = true;
        self
    }

    /// Set the authored importance factors.
    pub fn with_importance(mut self, factors: NodeImportanceFactors) -> Self {
        self.importance = Some(factors);
        self
    }

    /// Successor ids in script order. Missing targets are skipped.
    pub fn successors(&self) -> impl Iterator<Item = &SceneId> {
        self.items.iter().flat_map(|item| item.successors())
    }

    /// Dialogue lines as `(speaker, text)` in script order.
    pub fn dialogue_lines(&self) -> impl Iterator<Item = (&CharacterId, &str)> {
        self.items.iter().filter_map(|item| match item {
            NarrativeItem::Dialogue { speaker, text } => Some((speaker, text.as_str())),
            _ => None,
        })
    }

    /// Check whether the scene has no outgoing edges.
    pub fn is_ending(&self) -> bool {
        self.successors().next().is_none()
    }
}

/// The narrative graph: scenes by id plus the character roster.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SceneGraph {
    scenes: HashMap<SceneId, Scene>,

    #[serde(default)]
    characters: HashMap<CharacterId, CharacterProfile>,
}

impl SceneGraph {
    /// Create a new empty scene graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a scene. Returns the scene id.
    pub fn add_scene(&mut self, scene: Scene) -> SceneId {
        let id = scene.id.clone();
        self.scenes.insert(id.clone(), scene);
        id
    }

    /// Add or replace a character profile. Returns the character id.
    pub fn add_character(&mut self, profile: CharacterProfile) -> CharacterId {
        let id = profile.id.clone();
        self.characters.insert(id.clone(), profile);
        id
    }

    /// Get a scene by id.
    pub fn get_scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    /// Get a scene by id, failing on unknown ids.
    pub fn scene(&self, id: &SceneId) -> Result<&Scene, GraphError> {
        self.scenes
            .get(id)
            .ok_or_else(|| GraphError::UnknownScene(id.clone()))
    }

    /// Get a character profile by id, failing on unknown ids.
    pub fn character(&self, id: &CharacterId) -> Result<&CharacterProfile, GraphError> {
        self.characters
            .get(id)
            .ok_or_else(|| GraphError::UnknownCharacter(id.clone()))
    }

    /// Get a character profile by id.
    pub fn get_character(&self, id: &CharacterId) -> Option<&CharacterProfile> {
        self.characters.get(id)
    }

    /// Successor ids of a scene in script order.
    pub fn successors(&self, id: &SceneId) -> Result<Vec<&SceneId>, GraphError> {
        Ok(self.scene(id)?.successors().collect())
    }

    /// Cast of a scene.
    pub fn cast(&self, id: &SceneId) -> Result<&[CharacterId], GraphError> {
        Ok(&self.scene(id)?.characters)
    }

    /// Choice options of a scene that are available in the given state.
    pub fn available_options(
        &self,
        id: &SceneId,
        state: &StoryState,
    ) -> Result<Vec<&ChoiceOption>, GraphError> {
        let scene = self.scene(id)?;
        Ok(scene
            .items
            .iter()
            .filter_map(|item| match item {
                NarrativeItem::Choice { options } => Some(options),
                _ => None,
            })
            .flatten()
            .filter(|option| option.is_available(state))
            .collect())
    }

    /// Iterate over all scenes.
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    /// Get the total number of scenes.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Check if a scene exists in the graph.
    pub fn has_scene(&self, id: &SceneId) -> bool {
        self.scenes.contains_key(id)
    }
}
