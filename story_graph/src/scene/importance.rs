//! Narrative weight of a scene.

use serde::{Deserialize, Serialize};

/// Authored metadata describing how much a scene matters to the story.
///
/// Each factor is nominally in `[0, 1]`. Values outside that range are the
/// author's responsibility and are not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeImportanceFactors {
    /// How much the player's agency is exercised here.
    pub decision_weight: f32,
    /// How much earlier setup pays off here.
    pub payoff_weight: f32,
    pub emotional_intensity: f32,
    /// How much world detail is established here.
    pub lore_density: f32,
}

impl NodeImportanceFactors {
    pub fn new(
        decision_weight: f32,
        payoff_weight: f32,
        emotional_intensity: f32,
        lore_density: f32,
    ) -> Self {
        Self {
            decision_weight,
            payoff_weight,
            emotional_intensity,
            lore_density,
        }
    }
}

impl Default for NodeImportanceFactors {
    /// Neutral factors for scenes with no authored metadata.
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5)
    }
}

/// Linear coefficients for [`compute_node_importance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceWeights {
    pub decision: f32,
    pub payoff: f32,
    pub emotional: f32,
    pub lore: f32,
}

impl Default for ImportanceWeights {
    fn default() -> Self {
        Self {
            decision: 0.35,
            payoff: 0.25,
            emotional: 0.25,
            lore: 0.15,
        }
    }
}

/// Weighted sum of the four importance factors. Not re-clamped.
pub fn compute_node_importance(
    factors: &NodeImportanceFactors,
    weights: &ImportanceWeights,
) -> f32 {
    weights.decision * factors.decision_weight
        + weights.payoff * factors.payoff_weight
        + weights.emotional * factors.emotional_intensity
        + weights.lore * factors.lore_density
}
