//! Context chunks - candidate units of prompt material.

use serde::{Deserialize, Serialize};

/// Characters per token used when no precomputed count is available.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Category of a chunk. Each category has its own token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// Recent dialogue of the target scene.
    Local,
    /// Facts about characters present in the target scene.
    Character,
    /// Checkpoint summaries of ancestor scenes.
    Story,
    /// World-level material supplied by the caller.
    Global,
}

impl ChunkType {
    /// All categories, in prompt order.
    pub const ALL: [ChunkType; 4] = [
        ChunkType::Local,
        ChunkType::Character,
        ChunkType::Story,
        ChunkType::Global,
    ];

    /// Fixed relevance bonus for the category.
    pub fn type_bonus(&self) -> f64 {
        match self {
            ChunkType::Local => 1.0,
            ChunkType::Character => 0.8,
            ChunkType::Story => 0.7,
            ChunkType::Global => 0.6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Local => "local",
            ChunkType::Character => "character",
            ChunkType::Story => "story",
            ChunkType::Global => "global",
        }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate unit of material to forward to content generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub id: String,
    pub text: String,

    /// Fixed at construction; budgets are looked up by it.
    chunk_type: ChunkType,

    /// Hops from the chunk's origin scene to the target, against edge
    /// direction.
    pub graph_distance: u32,

    /// Recency within a scene (lines back).
    pub time_distance: u32,

    /// Jaccard similarity of the origin's and target's casts (0.0-1.0).
    pub char_overlap: f32,

    /// Externally supplied semantic similarity (0.0-1.0).
    pub embed_sim: f32,

    /// Importance of the origin scene.
    pub node_importance: f32,

    /// Estimated token cost.
    pub tokens: u32,
}

impl ContextChunk {
    /// Create a chunk with zero distances, zero similarity and the token
    /// count estimated from the text.
    pub fn new(id: impl Into<String>, text: impl Into<String>, chunk_type: ChunkType) -> Self {
        let text = text.into();
        let tokens = estimate_tokens(&text, DEFAULT_CHARS_PER_TOKEN);
        Self {
            id: id.into(),
            text,
            chunk_type,
            graph_distance: 0,
            time_distance: 0,
            char_overlap: 0.0,
            embed_sim: 0.0,
            node_importance: 0.0,
            tokens,
        }
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    pub fn with_graph_distance(mut self, distance: u32) -> Self {
        self.graph_distance = distance;
        self
    }

    pub fn with_time_distance(mut self, distance: u32) -> Self {
        self.time_distance = distance;
        self
    }

    pub fn with_char_overlap(mut self, overlap: f32) -> Self {
        self.char_overlap = overlap;
        self
    }

    pub fn with_embed_sim(mut self, similarity: f32) -> Self {
        self.embed_sim = similarity;
        self
    }

    pub fn with_node_importance(mut self, importance: f32) -> Self {
        self.node_importance = importance;
        self
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens = tokens;
        self
    }
}

/// Estimate the token cost of a text as `ceil(chars / chars_per_token)`.
///
/// A ratio of zero is treated as one.
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> u32 {
    let chars = text.chars().count();
    let per_token = chars_per_token.max(1);
    let tokens = chars.div_ceil(per_token);
    u32::try_from(tokens).unwrap_or(u32::MAX)
}
