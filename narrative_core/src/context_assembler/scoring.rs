//! Multi-factor relevance score for a single chunk.
//!
//! Factors: graph proximity, recency, cast overlap, semantic similarity,
//! category bonus, origin importance. The additive raw score is divided by
//! a power of the token cost so verbose chunks lose to terse ones carrying
//! the same relevance.

use serde::{Deserialize, Serialize};

use super::ContextChunk;

/// Guards the token normalization against zero-cost chunks.
pub const TOKEN_EPSILON: f64 = 1e-6;

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextWeights {
    /// Decay per hop of graph distance.
    pub lambda: f64,
    /// Decay per line of time distance.
    pub mu: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub eta: f64,
    pub kappa: f64,
    /// Exponent of the token-cost normalization.
    pub p: f64,
}

impl Default for ContextWeights {
    fn default() -> Self {
        Self {
            lambda: 0.35,
            mu: 0.15,
            alpha: 0.30,
            beta: 0.15,
            gamma: 0.15,
            delta: 0.20,
            eta: 0.10,
            kappa: 0.10,
            p: 0.3,
        }
    }
}

/// Compute the relevance score of one chunk.
pub fn score_chunk(chunk: &ContextChunk, weights: &ContextWeights) -> f64 {
    let f_graph = (-weights.lambda * chunk.graph_distance as f64).exp();
    let f_time = (-weights.mu * chunk.time_distance as f64).exp();

    let raw = weights.alpha * f_graph
        + weights.beta * f_time
        + weights.gamma * chunk.char_overlap as f64
        + weights.delta * chunk.embed_sim as f64
        + weights.eta * chunk.chunk_type().type_bonus()
        + weights.kappa * chunk.node_importance as f64;

    raw / (chunk.tokens as f64 + TOKEN_EPSILON).powf(weights.p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_assembler::ChunkType;

    fn chunk(tokens: u32) -> ContextChunk {
        ContextChunk::new("c", "text", ChunkType::Story)
            .with_tokens(tokens)
            .with_char_overlap(0.5)
            .with_embed_sim(0.2)
            .with_node_importance(0.6)
    }

    #[test]
    fn test_decreases_with_graph_distance() {
        let weights = ContextWeights::default();
        let near = score_chunk(&chunk(10).with_graph_distance(1), &weights);
        let far = score_chunk(&chunk(10).with_graph_distance(4), &weights);
        assert!(near > far, "near ({}) should beat far ({})", near, far);
    }

    #[test]
    fn test_decreases_with_time_distance() {
        let weights = ContextWeights::default();
        let recent = score_chunk(&chunk(10).with_time_distance(0), &weights);
        let old = score_chunk(&chunk(10).with_time_distance(3), &weights);
        assert!(recent > old);
    }

    #[test]
    fn test_verbose_chunks_penalized() {
        let weights = ContextWeights::default();
        let terse = score_chunk(&chunk(5), &weights);
        let verbose = score_chunk(&chunk(50), &weights);
        assert!(terse > verbose);
    }

    #[test]
    fn test_zero_exponent_ignores_tokens() {
        let weights = ContextWeights {
            p: 0.0,
            ..ContextWeights::default()
        };
        let a = score_chunk(&chunk(5), &weights);
        let b = score_chunk(&chunk(500), &weights);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_zero_tokens_is_finite() {
        let score = score_chunk(&chunk(0), &ContextWeights::default());
        assert!(score.is_finite());
        assert!(score > 0.0);
    }

    #[test]
    fn test_exact_formula() {
        let weights = ContextWeights {
            lambda: 1.0,
            mu: 1.0,
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
            delta: 1.0,
            eta: 1.0,
            kappa: 1.0,
            p: 0.0,
        };
        // 1 + 1 + 0.5 + 0.2 + 0.7 + 0.6
        let expected = 4.0;
        let score = score_chunk(&chunk(3), &weights);
        assert!((score - expected).abs() < 1e-6, "score was {}", score);
    }
}
