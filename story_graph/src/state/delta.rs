//! Partial updates to a [`StoryState`].

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Flag, Promise, PromiseStatus, Relation, StoryState};
use crate::scene::CharacterId;

/// Trust and affection given to a relation first seen in a delta.
pub const DEFAULT_RELATION_VALUE: f32 = 0.5;

/// Partial update to one relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDelta {
    pub character_id: CharacterId,
    #[serde(default)]
    pub trust: Option<f32>,
    #[serde(default)]
    pub affection: Option<f32>,
}

impl RelationDelta {
    pub fn new(character_id: impl Into<CharacterId>) -> Self {
        Self {
            character_id: character_id.into(),
            trust: None,
            affection: None,
        }
    }

    pub fn trust(mut self, trust: f32) -> Self {
        self.trust = Some(trust);
        self
    }

    pub fn affection(mut self, affection: f32) -> Self {
        self.affection = Some(affection);
        self
    }
}

/// Partial update to one promise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromiseDelta {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<PromiseStatus>,
}

impl PromiseDelta {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            status: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: PromiseStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A partial update to a story state. Absent fields mean "no change".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StateDelta {
    pub chapter: Option<u32>,
    pub act: Option<u32>,
    pub current_faction: Option<String>,
    pub flags: Vec<Flag>,
    pub relations: Vec<RelationDelta>,
    pub promises: Vec<PromiseDelta>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chapter(mut self, chapter: u32) -> Self {
        self.chapter = Some(chapter);
        self
    }

    pub fn with_act(mut self, act: u32) -> Self {
        self.act = Some(act);
        self
    }

    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.current_faction = Some(faction.into());
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_relation(mut self, relation: RelationDelta) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn with_promise(mut self, promise: PromiseDelta) -> Self {
        self.promises.push(promise);
        self
    }

    /// Check whether applying this delta would change nothing.
    pub fn is_empty(&self) -> bool {
        self.chapter.is_none()
            && self.act.is_none()
            && self.current_faction.is_none()
            && self.flags.is_empty()
            && self.relations.is_empty()
            && self.promises.is_empty()
    }
}

/// Apply a delta to a state, returning the updated copy.
///
/// The input state is never modified. Flags, relations and promises are
/// upserted by key, character id and promise id respectively, so applying
/// the same delta twice yields the same state as applying it once.
pub fn apply_state_delta(state: &StoryState, delta: &StateDelta) -> StoryState {
    let mut next = state.clone();

    if let Some(chapter) = delta.chapter {
        next.chapter = chapter;
    }
    if let Some(act) = delta.act {
        next.act = act;
    }
    if let Some(faction) = &delta.current_faction {
        next.current_faction = faction.clone();
    }

    for flag in &delta.flags {
        match next.flags.iter_mut().find(|f| f.key == flag.key) {
            Some(existing) => existing.value = flag.value.clone(),
            None => next.flags.push(flag.clone()),
        }
    }

    for update in &delta.relations {
        match next
            .relations
            .iter_mut()
            .find(|r| r.character_id == update.character_id)
        {
            Some(existing) => {
                if let Some(trust) = update.trust {
                    existing.trust = trust;
                }
                if let Some(affection) = update.affection {
                    existing.affection = affection;
                }
            }
            None => {
                trace!(character = %update.character_id, "inserting new relation");
                next.relations.push(Relation {
                    character_id: update.character_id.clone(),
                    trust: update.trust.unwrap_or(DEFAULT_RELATION_VALUE),
                    affection: update.affection.unwrap_or(DEFAULT_RELATION_VALUE),
                });
            }
        }
    }

    for update in &delta.promises {
        match next.promises.iter_mut().find(|p| p.id == update.id) {
            Some(existing) => {
                if let Some(status) = update.status {
                    existing.status = status;
                }
                if let Some(description) = &update.description {
                    existing.description = description.clone();
                }
            }
            None => next.promises.push(Promise {
                id: update.id.clone(),
                description: update.description.clone().unwrap_or_default(),
                status: update.status.unwrap_or_default(),
            }),
        }
    }

    next
}
