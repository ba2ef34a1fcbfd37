//! Candidate chunk assembly from the scene graph.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use story_graph::{
    compute_node_importance, CharacterId, ImportanceWeights, NodeImportanceFactors, Scene,
    SceneGraph, SceneId,
};

use super::{build_distance_map, estimate_tokens, ChunkType, ContextChunk, DEFAULT_CHARS_PER_TOKEN};

/// Source of semantic similarity between a chunk and the target scene.
///
/// Embedding computation happens outside this crate; implementors only
/// report the resulting score in `[0, 1]`.
pub trait SimilarityProvider {
    fn similarity(&self, target: &SceneId, chunk: &ContextChunk) -> f32;
}

/// Precomputed similarities keyed by chunk id. Unknown ids score 0.0.
impl SimilarityProvider for HashMap<String, f32> {
    fn similarity(&self, _target: &SceneId, chunk: &ContextChunk) -> f32 {
        self.get(&chunk.id).copied().unwrap_or(0.0)
    }
}

/// A precomputed summary of a checkpoint scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub text: String,
    /// Token count supplied by the summarizer, if known.
    #[serde(default)]
    pub tokens: Option<u32>,
}

impl CheckpointSummary {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

/// Supplementary data for one build, beyond the scene graph itself.
#[derive(Default)]
pub struct ChunkSources<'a> {
    pub checkpoint_summaries: HashMap<SceneId, CheckpointSummary>,
    /// Factors that take precedence over those authored on the scene.
    pub importance_overrides: HashMap<SceneId, NodeImportanceFactors>,
    pub similarity: Option<&'a dyn SimilarityProvider>,
}

impl<'a> ChunkSources<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, scene: impl Into<SceneId>, summary: CheckpointSummary) -> Self {
        self.checkpoint_summaries.insert(scene.into(), summary);
        self
    }

    pub fn with_importance(
        mut self,
        scene: impl Into<SceneId>,
        factors: NodeImportanceFactors,
    ) -> Self {
        self.importance_overrides.insert(scene.into(), factors);
        self
    }

    pub fn with_similarity(mut self, provider: &'a dyn SimilarityProvider) -> Self {
        self.similarity = Some(provider);
        self
    }
}

/// Settings for [`ChunkBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Number of trailing dialogue lines of the target scene to consider.
    pub local_window: usize,
    pub chars_per_token: usize,
    pub importance_weights: ImportanceWeights,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            local_window: 5,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            importance_weights: ImportanceWeights::default(),
        }
    }
}

/// Builds the candidate chunk list for a target scene.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuilder {
    settings: BuilderSettings,
}

impl ChunkBuilder {
    pub fn new(settings: BuilderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Produce local, character and story chunks for `target`.
    pub fn build(
        &self,
        graph: &SceneGraph,
        target: &SceneId,
        sources: &ChunkSources<'_>,
    ) -> Vec<ContextChunk> {
        let distances = build_distance_map(graph, target);

        let mut chunks = Vec::new();

        match graph.get_scene(target) {
            Some(scene) => {
                chunks.extend(self.local_chunks(graph, scene, sources));
                chunks.extend(self.character_chunks(graph, scene));
            }
            None => warn!(target = %target, "target scene not in graph"),
        }

        // Sorted so the output does not depend on map iteration order.
        let mut ancestors: Vec<(&SceneId, u32)> =
            distances.iter().map(|(id, d)| (id, *d)).collect();
        ancestors.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        let target_cast = graph
            .get_scene(target)
            .map(|s| s.characters.as_slice())
            .unwrap_or(&[]);

        for (scene_id, distance) in ancestors {
            let Some(scene) = graph.get_scene(scene_id) else {
                continue;
            };
            if !scene.checkpoint {
                continue;
            }
            let Some(summary) = sources.checkpoint_summaries.get(scene_id) else {
                debug!(scene = %scene_id, "checkpoint has no summary");
                continue;
            };

            let tokens = summary
                .tokens
                .unwrap_or_else(|| estimate_tokens(&summary.text, self.settings.chars_per_token));

            chunks.push(
                ContextChunk::new(format!("story:{}", scene_id), summary.text.clone(), ChunkType::Story)
                    .with_graph_distance(distance)
                    .with_char_overlap(jaccard(&scene.characters, target_cast))
                    .with_node_importance(self.importance(scene, sources))
                    .with_tokens(tokens),
            );
        }

        if let Some(provider) = sources.similarity {
            for chunk in &mut chunks {
                chunk.embed_sim = clamp_similarity(provider.similarity(target, chunk));
            }
        }

        debug!(
            target = %target,
            ancestors = distances.len(),
            chunks = chunks.len(),
            "built context chunks"
        );

        chunks
    }

    /// The trailing dialogue window of the target, most recent line at time
    /// distance 0.
    fn local_chunks(
        &self,
        graph: &SceneGraph,
        scene: &Scene,
        sources: &ChunkSources<'_>,
    ) -> Vec<ContextChunk> {
        let lines: Vec<(&CharacterId, &str)> = scene.dialogue_lines().collect();
        let count = lines.len();
        let start = count.saturating_sub(self.settings.local_window);
        let importance = self.importance(scene, sources);

        lines
            .into_iter()
            .enumerate()
            .skip(start)
            .map(|(index, (speaker, text))| {
                let name = graph
                    .get_character(speaker)
                    .map(|c| c.name.as_str())
                    .unwrap_or_else(|| speaker.as_str());
                let line = format!("{}: {}", name, text);
                let tokens = estimate_tokens(&line, self.settings.chars_per_token);

                ContextChunk::new(format!("local:{}:{}", scene.id, index), line, ChunkType::Local)
                    .with_time_distance((count - 1 - index) as u32)
                    .with_char_overlap(1.0)
                    .with_node_importance(importance)
                    .with_tokens(tokens)
            })
            .collect()
    }

    /// One biography per cast member with a roster entry.
    fn character_chunks(&self, graph: &SceneGraph, scene: &Scene) -> Vec<ContextChunk> {
        scene
            .characters
            .iter()
            .filter_map(|id| match graph.character(id) {
                Ok(profile) => Some(profile),
                Err(err) => {
                    debug!(scene = %scene.id, %err, "cast member without profile");
                    None
                }
            })
            .map(|profile| {
                let bio = profile.biography();
                let tokens = estimate_tokens(&bio, self.settings.chars_per_token);
                ContextChunk::new(format!("character:{}", profile.id), bio, ChunkType::Character)
                    .with_char_overlap(1.0)
                    .with_node_importance(1.0)
                    .with_tokens(tokens)
            })
            .collect()
    }

    fn importance(&self, scene: &Scene, sources: &ChunkSources<'_>) -> f32 {
        let factors = sources
            .importance_overrides
            .get(&scene.id)
            .copied()
            .or(scene.importance)
            .unwrap_or_default();
        compute_node_importance(&factors, &self.settings.importance_weights)
    }
}

/// Build chunks with default settings.
pub fn build_context_chunks(
    graph: &SceneGraph,
    target: &SceneId,
    sources: &ChunkSources<'_>,
) -> Vec<ContextChunk> {
    ChunkBuilder::default().build(graph, target, sources)
}

/// Clamp a provider score into `[0, 1]`; NaN counts as no similarity.
fn clamp_similarity(similarity: f32) -> f32 {
    if similarity.is_nan() {
        0.0
    } else {
        similarity.clamp(0.0, 1.0)
    }
}

/// Jaccard similarity of two casts. Two empty casts share nothing and score
/// 0.0.
pub fn jaccard(a: &[CharacterId], b: &[CharacterId]) -> f32 {
    let a: HashSet<&CharacterId> = a.iter().collect();
    let b: HashSet<&CharacterId> = b.iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f32 / union as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_graph::{CharacterProfile, NarrativeItem};

    fn id(s: &str) -> SceneId {
        SceneId::from(s)
    }

    /// prologue (checkpoint) -> road -> camp (checkpoint) -> ambush
    /// side (checkpoint, unreachable from ambush)
    fn story_graph() -> SceneGraph {
        let mut graph = SceneGraph::new();
        graph.add_character(CharacterProfile::new("mira", "Mira").with_title("Scout"));
        graph.add_character(CharacterProfile::new("oren", "Oren"));

        graph.add_scene(
            Scene::new("prologue", "Prologue")
                .as_checkpoint()
                .with_character("mira")
                .with_item(NarrativeItem::transition("road")),
        );
        graph.add_scene(Scene::new("road", "Road").with_item(NarrativeItem::transition("camp")));
        graph.add_scene(
            Scene::new("camp", "Camp")
                .as_checkpoint()
                .with_character("mira")
                .with_character("oren")
                .with_importance(NodeImportanceFactors::new(1.0, 0.0, 0.0, 0.0))
                .with_item(NarrativeItem::transition("ambush")),
        );
        let mut ambush = Scene::new("ambush", "Ambush")
            .with_character("mira")
            .with_character("ghost");
        for i in 0..7 {
            let speaker = if i % 2 == 0 { "mira" } else { "ghost" };
            ambush = ambush.with_item(NarrativeItem::dialogue(speaker, format!("line {}", i)));
        }
        graph.add_scene(ambush);
        graph.add_scene(Scene::new("side", "Side").as_checkpoint());
        graph
    }

    fn sources<'a>() -> ChunkSources<'a> {
        ChunkSources::new()
            .with_summary("prologue", CheckpointSummary::new("Mira left the city.").with_tokens(40))
            .with_summary("camp", CheckpointSummary::new("They camped by the river."))
            .with_summary("side", CheckpointSummary::new("Never seen."))
    }

    fn of_type(chunks: &[ContextChunk], chunk_type: ChunkType) -> Vec<&ContextChunk> {
        chunks.iter().filter(|c| c.chunk_type() == chunk_type).collect()
    }

    #[test]
    fn test_local_window_and_time_distance() {
        let graph = story_graph();
        let chunks = build_context_chunks(&graph, &id("ambush"), &sources());
        let local = of_type(&chunks, ChunkType::Local);

        assert_eq!(local.len(), 5);
        assert_eq!(local[0].id, "local:ambush:2");
        assert_eq!(local[0].time_distance, 4);
        assert_eq!(local[4].id, "local:ambush:6");
        assert_eq!(local[4].time_distance, 0);
        assert_eq!(local[4].text, "Mira: line 6");
        assert_eq!(local[3].text, "ghost: line 5");
        assert!(local.iter().all(|c| c.char_overlap == 1.0 && c.graph_distance == 0));
    }

    #[test]
    fn test_story_chunks_from_reachable_checkpoints() {
        let graph = story_graph();
        let chunks = build_context_chunks(&graph, &id("ambush"), &sources());
        let story = of_type(&chunks, ChunkType::Story);

        let ids: Vec<&str> = story.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["story:camp", "story:prologue"]);

        let camp = story[0];
        assert_eq!(camp.graph_distance, 1);
        assert_eq!(camp.time_distance, 0);
        // {mira, oren} vs {mira, ghost}
        assert!((camp.char_overlap - 1.0 / 3.0).abs() < 1e-6);
        assert!((camp.node_importance - 0.35).abs() < 1e-6);
        assert_eq!(camp.tokens, estimate_tokens("They camped by the river.", 4));

        let prologue = story[1];
        assert_eq!(prologue.graph_distance, 3);
        assert_eq!(prologue.tokens, 40);
        assert!((prologue.char_overlap - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_character_chunks() {
        let graph = story_graph();
        let chunks = build_context_chunks(&graph, &id("ambush"), &sources());
        let characters = of_type(&chunks, ChunkType::Character);

        // "ghost" has no profile.
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].text, "Mira, Scout");
        assert_eq!(characters[0].node_importance, 1.0);
        assert_eq!(characters[0].char_overlap, 1.0);
        assert_eq!(characters[0].graph_distance, 0);
        assert_eq!(characters[0].time_distance, 0);
    }

    #[test]
    fn test_target_checkpoint_included_at_distance_zero() {
        let graph = story_graph();
        let chunks = build_context_chunks(&graph, &id("camp"), &sources());
        let story = of_type(&chunks, ChunkType::Story);

        assert_eq!(story[0].id, "story:camp");
        assert_eq!(story[0].graph_distance, 0);
        assert!((story[0].char_overlap - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_importance_override() {
        let graph = story_graph();
        let sources = sources().with_importance("camp", NodeImportanceFactors::new(0.0, 0.0, 0.0, 1.0));
        let chunks = build_context_chunks(&graph, &id("ambush"), &sources);
        let camp = chunks.iter().find(|c| c.id == "story:camp").unwrap();
        assert!((camp.node_importance - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_provider() {
        let graph = story_graph();
        let mut scores: HashMap<String, f32> = HashMap::new();
        scores.insert("story:camp".to_string(), 0.9);

        let sources = sources().with_similarity(&scores);
        let chunks = build_context_chunks(&graph, &id("ambush"), &sources);

        let camp = chunks.iter().find(|c| c.id == "story:camp").unwrap();
        assert_eq!(camp.embed_sim, 0.9);
        let prologue = chunks.iter().find(|c| c.id == "story:prologue").unwrap();
        assert_eq!(prologue.embed_sim, 0.0);
    }

    #[test]
    fn test_similarity_scores_clamped() {
        let graph = story_graph();
        let mut scores: HashMap<String, f32> = HashMap::new();
        scores.insert("story:camp".to_string(), f32::NAN);
        scores.insert("story:prologue".to_string(), 3.5);
        scores.insert("character:mira".to_string(), -1.0);

        let sources = sources().with_similarity(&scores);
        let chunks = build_context_chunks(&graph, &id("ambush"), &sources);

        let sim = |chunk_id: &str| chunks.iter().find(|c| c.id == chunk_id).unwrap().embed_sim;
        assert_eq!(sim("story:camp"), 0.0);
        assert_eq!(sim("story:prologue"), 1.0);
        assert_eq!(sim("character:mira"), 0.0);
    }

    #[test]
    fn test_unknown_target_yields_nothing() {
        let graph = story_graph();
        let chunks = build_context_chunks(&graph, &id("nowhere"), &sources());
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_custom_window() {
        let graph = story_graph();
        let builder = ChunkBuilder::new(BuilderSettings {
            local_window: 2,
            ..BuilderSettings::default()
        });
        let chunks = builder.build(&graph, &id("ambush"), &sources());
        assert_eq!(of_type(&chunks, ChunkType::Local).len(), 2);
    }

    #[test]
    fn test_jaccard() {
        let a = vec![CharacterId::from("a"), CharacterId::from("b")];
        let b = vec![CharacterId::from("b"), CharacterId::from("c")];
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&[], &[]), 0.0);
    }
}
