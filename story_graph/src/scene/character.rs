//! Character definitions.

use serde::{Deserialize, Serialize};

/// Unique identifier for characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CharacterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A character in the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub id: CharacterId,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    pub current_goal: Option<String>,
}

impl CharacterProfile {
    /// Create a new character with the given id and name.
    pub fn new(id: impl Into<CharacterId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: None,
            description: None,
            personality_traits: Vec::new(),
            current_goal: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_trait(mut self, personality_trait: impl Into<String>) -> Self {
        self.personality_traits.push(personality_trait.into());
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.current_goal = Some(goal.into());
        self
    }

    /// One-line biography used as prompt material.
    ///
    /// Format: `Name, Title: description Traits: a, b. Goal: goal.`
    /// with absent parts omitted.
    pub fn biography(&self) -> String {
        let mut bio = self.name.clone();
        if let Some(title) = &self.title {
            bio.push_str(&format!(", {}", title));
        }
        if let Some(description) = &self.description {
            bio.push_str(&format!(": {}", description));
        }
        if !self.personality_traits.is_empty() {
            bio.push_str(&format!(" Traits: {}.", self.personality_traits.join(", ")));
        }
        if let Some(goal) = &self.current_goal {
            bio.push_str(&format!(" Goal: {}.", goal));
        }
        bio
    }
}
