//! Budgeted selection of chunks.
//!
//! Each category is packed greedily in score order. A chunk that does not
//! fit the remaining budget is skipped and lower-ranked chunks are still
//! considered, so a small chunk can fill space left by a large one. This is
//! first-fit by rank, not an optimal knapsack.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{score_chunk, ChunkType, ContextChunk, ContextWeights};

/// Maximum token allowance per chunk category. Categories without an entry
/// are excluded from selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BudgetTable", into = "BudgetTable")]
pub struct ContextBudgets(HashMap<ChunkType, u32>);

/// Serialized form of [`ContextBudgets`], one optional field per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    local: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    character: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    story: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    global: Option<u32>,
}

impl From<BudgetTable> for ContextBudgets {
    fn from(table: BudgetTable) -> Self {
        let entries = [
            (ChunkType::Local, table.local),
            (ChunkType::Character, table.character),
            (ChunkType::Story, table.story),
            (ChunkType::Global, table.global),
        ];
        Self(
            entries
                .into_iter()
                .filter_map(|(chunk_type, budget)| budget.map(|b| (chunk_type, b)))
                .collect(),
        )
    }
}

impl From<ContextBudgets> for BudgetTable {
    fn from(budgets: ContextBudgets) -> Self {
        Self {
            local: budgets.get(ChunkType::Local),
            character: budgets.get(ChunkType::Character),
            story: budgets.get(ChunkType::Story),
            global: budgets.get(ChunkType::Global),
        }
    }
}

impl ContextBudgets {
    /// Budgets with no categories; selects nothing.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Set the budget of a category.
    pub fn with_budget(mut self, chunk_type: ChunkType, tokens: u32) -> Self {
        self.0.insert(chunk_type, tokens);
        self
    }

    pub fn get(&self, chunk_type: ChunkType) -> Option<u32> {
        self.0.get(&chunk_type).copied()
    }

    /// Sum of all category budgets.
    pub fn total(&self) -> u64 {
        self.0.values().map(|&b| b as u64).sum()
    }
}

impl Default for ContextBudgets {
    fn default() -> Self {
        Self::empty()
            .with_budget(ChunkType::Local, 400)
            .with_budget(ChunkType::Character, 300)
            .with_budget(ChunkType::Story, 600)
            .with_budget(ChunkType::Global, 200)
    }
}

/// A chunk together with its computed score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: ContextChunk,
    pub score: f64,
}

/// Select the chunks to forward, respecting each category's token ceiling.
///
/// The result is grouped by category in [`ChunkType::ALL`] order, each group
/// in descending score order.
pub fn select_context(
    chunks: Vec<ContextChunk>,
    budgets: &ContextBudgets,
    weights: &ContextWeights,
) -> Vec<ContextChunk> {
    select_scored(chunks, budgets, weights)
        .into_iter()
        .map(|scored| scored.chunk)
        .collect()
}

/// Like [`select_context`], keeping each accepted chunk's score.
pub fn select_scored(
    chunks: Vec<ContextChunk>,
    budgets: &ContextBudgets,
    weights: &ContextWeights,
) -> Vec<ScoredChunk> {
    let mut buckets: HashMap<ChunkType, Vec<ContextChunk>> = HashMap::new();
    for chunk in chunks {
        buckets.entry(chunk.chunk_type()).or_default().push(chunk);
    }

    let mut selected = Vec::new();

    for chunk_type in ChunkType::ALL {
        let Some(bucket) = buckets.remove(&chunk_type) else {
            continue;
        };
        let Some(budget) = budgets.get(chunk_type) else {
            debug!(category = %chunk_type, candidates = bucket.len(), "no budget, skipping category");
            continue;
        };

        let mut scored: Vec<ScoredChunk> = bucket
            .into_iter()
            .map(|chunk| {
                let score = score_chunk(&chunk, weights);
                if !score.is_finite() {
                    warn!(chunk = %chunk.id, score, "non-finite score, ranking last");
                }
                ScoredChunk {
                    score: if score.is_finite() { score } else { f64::NEG_INFINITY },
                    chunk,
                }
            })
            .collect();

        // Stable sort keeps input order among equal scores.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        let candidates = scored.len();
        let mut used: u64 = 0;
        let mut accepted = 0;
        for entry in scored {
            let tokens = entry.chunk.tokens as u64;
            if used + tokens <= budget as u64 {
                used += tokens;
                accepted += 1;
                selected.push(entry);
            }
        }

        debug!(
            category = %chunk_type,
            candidates,
            accepted,
            used,
            budget,
            "packed category"
        );
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Chunks whose scores strictly decrease in list order, independent of
    /// token cost (p = 0).
    fn ranked_chunks(chunk_type: ChunkType, tokens: &[u32]) -> Vec<ContextChunk> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                ContextChunk::new(format!("{}-{}", chunk_type, i), "x", chunk_type)
                    .with_tokens(t)
                    .with_graph_distance(i as u32)
            })
            .collect()
    }

    fn flat_weights() -> ContextWeights {
        ContextWeights {
            p: 0.0,
            ..ContextWeights::default()
        }
    }

    #[test]
    fn test_skips_chunk_that_does_not_fit() {
        let chunks = ranked_chunks(ChunkType::Story, &[7, 6, 4]);
        let budgets = ContextBudgets::empty().with_budget(ChunkType::Story, 12);

        let selected = select_context(chunks, &budgets, &flat_weights());
        let tokens: Vec<u32> = selected.iter().map(|c| c.tokens).collect();
        assert_eq!(tokens, vec![7, 4]);
    }

    #[test]
    fn test_budget_never_exceeded() {
        let chunks = ranked_chunks(ChunkType::Local, &[5, 9, 3, 3, 8, 1]);
        let budgets = ContextBudgets::empty().with_budget(ChunkType::Local, 10);

        let selected = select_context(chunks, &budgets, &flat_weights());
        let total: u32 = selected.iter().map(|c| c.tokens).sum();
        assert!(total <= 10);
        assert_eq!(total, 9);
    }

    #[test]
    fn test_missing_budget_excludes_category() {
        let mut chunks = ranked_chunks(ChunkType::Story, &[2, 2]);
        chunks.extend(ranked_chunks(ChunkType::Global, &[2, 2]));
        let budgets = ContextBudgets::empty().with_budget(ChunkType::Story, 100);

        let selected = select_context(chunks, &budgets, &flat_weights());
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|c| c.chunk_type() == ChunkType::Story));
    }

    #[test]
    fn test_zero_budget_selects_only_free_chunks() {
        let chunks = ranked_chunks(ChunkType::Global, &[3, 0]);
        let budgets = ContextBudgets::empty().with_budget(ChunkType::Global, 0);

        let selected = select_context(chunks, &budgets, &flat_weights());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].tokens, 0);
    }

    #[test]
    fn test_categories_budgeted_independently() {
        let mut chunks = ranked_chunks(ChunkType::Local, &[6, 6]);
        chunks.extend(ranked_chunks(ChunkType::Character, &[6, 6]));
        let budgets = ContextBudgets::empty()
            .with_budget(ChunkType::Local, 6)
            .with_budget(ChunkType::Character, 12);

        let selected = select_context(chunks, &budgets, &flat_weights());
        let local = selected
            .iter()
            .filter(|c| c.chunk_type() == ChunkType::Local)
            .count();
        let character = selected
            .iter()
            .filter(|c| c.chunk_type() == ChunkType::Character)
            .count();
        assert_eq!(local, 1);
        assert_eq!(character, 2);
    }

    #[test]
    fn test_output_grouped_by_category() {
        let mut chunks = ranked_chunks(ChunkType::Global, &[1]);
        chunks.extend(ranked_chunks(ChunkType::Story, &[1]));
        chunks.extend(ranked_chunks(ChunkType::Local, &[1]));

        let selected = select_context(chunks, &ContextBudgets::default(), &flat_weights());
        let order: Vec<ChunkType> = selected.iter().map(|c| c.chunk_type()).collect();
        assert_eq!(order, vec![ChunkType::Local, ChunkType::Story, ChunkType::Global]);
    }

    #[test]
    fn test_higher_scores_selected_first() {
        let chunks = ranked_chunks(ChunkType::Story, &[5, 5, 5]);
        let budgets = ContextBudgets::empty().with_budget(ChunkType::Story, 10);

        let selected = select_scored(chunks, &budgets, &flat_weights());
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].chunk.id, "story-0");
        assert_eq!(selected[1].chunk.id, "story-1");
        assert!(selected[0].score > selected[1].score);
    }

    #[test]
    fn test_nan_similarity_ranks_last_without_panicking() {
        let chunks: Vec<ContextChunk> = (0..64)
            .map(|i| {
                let chunk = ContextChunk::new(format!("story-{}", i), "x", ChunkType::Story)
                    .with_tokens(1)
                    .with_graph_distance(i % 5);
                if i % 3 == 0 {
                    chunk.with_embed_sim(f32::NAN)
                } else {
                    chunk
                }
            })
            .collect();
        let budgets = ContextBudgets::empty().with_budget(ChunkType::Story, 20);

        let selected = select_scored(chunks, &budgets, &ContextWeights::default());

        assert_eq!(selected.len(), 20);
        let total: u32 = selected.iter().map(|s| s.chunk.tokens).sum();
        assert!(total <= 20);
        assert!(selected.iter().all(|s| s.score.is_finite()));
        assert!(selected.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_non_finite_scores_still_fill_spare_budget() {
        let chunks = vec![
            ContextChunk::new("bad", "x", ChunkType::Local)
                .with_tokens(2)
                .with_embed_sim(f32::NAN),
            ContextChunk::new("good", "x", ChunkType::Local).with_tokens(2),
        ];
        let budgets = ContextBudgets::empty().with_budget(ChunkType::Local, 4);

        let selected = select_scored(chunks, &budgets, &ContextWeights::default());
        let ids: Vec<&str> = selected.iter().map(|s| s.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "bad"]);
        assert_eq!(selected[1].score, f64::NEG_INFINITY);
    }

    #[test]
    fn test_budgets_from_json() {
        let budgets: ContextBudgets = serde_json::from_str(r#"{"local": 50, "story": 80}"#).unwrap();
        assert_eq!(budgets.get(ChunkType::Local), Some(50));
        assert_eq!(budgets.get(ChunkType::Global), None);
        assert_eq!(budgets.total(), 130);
    }
}
