//! Context Assembler - Selects prior narrative material for a target scene
//! under per-category token budgets.
//!
//! The pipeline works as follows:
//! 1. **Indexing**: Compute backward graph distances from the target scene
//! 2. **Building**: Emit candidate chunks (recent dialogue, checkpoint
//!    summaries, character biographies)
//! 3. **Scoring**: Rank every chunk by proximity, recency, overlap,
//!    similarity, category and importance, normalized by token cost
//! 4. **Selection**: Greedily pack each category into its budget
//! 5. **Assembly**: Render the selection and story state as prompt material

mod builder;
mod chunk;
mod distance;
mod scoring;
mod selection;

pub use builder::*;
pub use chunk::*;
pub use distance::*;
pub use scoring::*;
pub use selection::*;

use serde::{Deserialize, Serialize};
use tracing::debug;

use story_graph::{render_state_to_text, SceneGraph, SceneId, StoryState};

use crate::config::EngineConfig;

/// The context assembler runs chunk building and budgeted selection.
pub struct ContextAssembler {
    builder: ChunkBuilder,
    weights: ContextWeights,
    budgets: ContextBudgets,
}

impl ContextAssembler {
    /// Create a new context assembler with the given configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            builder: ChunkBuilder::new(config.builder.clone()),
            weights: config.weights.clone(),
            budgets: config.budgets.clone(),
        }
    }

    /// Create a context assembler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(&EngineConfig::default())
    }

    /// Build and select chunks for `target`.
    ///
    /// `extra` carries caller-supplied chunks (typically [`ChunkType::Global`]
    /// world material) that compete for budget alongside the built ones.
    pub fn select(
        &self,
        graph: &SceneGraph,
        target: &SceneId,
        sources: &ChunkSources<'_>,
        extra: Vec<ContextChunk>,
    ) -> Vec<ScoredChunk> {
        let mut chunks = self.builder.build(graph, target, sources);
        chunks.extend(extra);
        let candidates = chunks.len();

        let selected = select_scored(chunks, &self.budgets, &self.weights);
        debug!(
            target = %target,
            candidates,
            selected = selected.len(),
            "selected context"
        );
        selected
    }

    /// Assemble complete context for a generation prompt.
    pub fn assemble_context(
        &self,
        graph: &SceneGraph,
        target: &SceneId,
        sources: &ChunkSources<'_>,
        extra: Vec<ContextChunk>,
        state: &StoryState,
    ) -> AssembledContext {
        let selected = self.select(graph, target, sources, extra);

        AssembledContext {
            target: target.clone(),
            scene_title: graph.get_scene(target).map(|s| s.title.clone()),
            total_tokens: selected.iter().map(|s| s.chunk.tokens as u64).sum(),
            chunks: selected
                .into_iter()
                .map(|s| SelectedChunk {
                    id: s.chunk.id.clone(),
                    chunk_type: s.chunk.chunk_type(),
                    text: s.chunk.text,
                    tokens: s.chunk.tokens,
                    score: s.score,
                })
                .collect(),
            state_summary: render_state_to_text(state),
        }
    }
}

/// A selected chunk as it appears in the assembled context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedChunk {
    pub id: String,
    pub chunk_type: ChunkType,
    pub text: String,
    pub tokens: u32,
    pub score: f64,
}

/// The assembled context ready for prompt generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    pub target: SceneId,
    pub scene_title: Option<String>,

    /// Selected chunks, grouped by category.
    pub chunks: Vec<SelectedChunk>,

    /// Sum of the selected chunks' token costs.
    pub total_tokens: u64,

    /// Rendered story state.
    pub state_summary: String,
}

impl AssembledContext {
    /// Serialize the context as the JSON payload handed to content
    /// generation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Format the context as a prompt string.
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str("## Current Scene\n");
        match &self.scene_title {
            Some(title) => prompt.push_str(&format!("{} ({})\n\n", title, self.target)),
            None => prompt.push_str(&format!("{}\n\n", self.target)),
        }

        prompt.push_str("## Story State\n");
        prompt.push_str(&self.state_summary);
        prompt.push('\n');

        for chunk_type in ChunkType::ALL {
            let section: Vec<_> = self
                .chunks
                .iter()
                .filter(|c| c.chunk_type == chunk_type)
                .collect();
            if section.is_empty() {
                continue;
            }

            prompt.push_str(section_heading(chunk_type));
            prompt.push('\n');
            for chunk in section {
                prompt.push_str(&format!("- {}\n", chunk.text));
            }
            prompt.push('\n');
        }

        prompt
    }
}

fn section_heading(chunk_type: ChunkType) -> &'static str {
    match chunk_type {
        ChunkType::Local => "## Recent Dialogue",
        ChunkType::Character => "## Characters Present",
        ChunkType::Story => "## Story So Far",
        ChunkType::Global => "## World",
    }
}
