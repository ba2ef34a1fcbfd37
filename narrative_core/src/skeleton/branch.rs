//! Sub-branch generation for Split nodes.

use rand::Rng;
use tracing::trace;

use story_graph::SceneId;

use super::{next_id, NodeType, SchedulerConfig, SkeletonNode, SkeletonOption, SkeletonOutcome};

/// Chance that an eligible sub-branch rejoins the main line.
pub const REJOIN_PROBABILITY: f64 = 0.5;

/// Chance that an internal sub-branch node becomes a flavor Decision.
pub const BRANCH_DECISION_PROBABILITY: f64 = 0.3;

/// Grow the side line hanging off the Split at `split_index`.
///
/// The branch rejoins the main line only when it is shorter than what the
/// main line has left to run, and then only on a coin flip. Sub-branches
/// never split again.
pub(crate) fn generate_sub_branch<R: Rng + ?Sized>(
    config: &SchedulerConfig,
    split_index: usize,
    main_ids: &[SceneId],
    branch: usize,
    rng: &mut R,
) -> Vec<SkeletonNode> {
    let size = config.split_branch_size.max(1);
    let main_size = main_ids.len();

    let ids: Vec<SceneId> = (0..size).map(|_| next_id(rng)).collect();

    let remaining = main_size.saturating_sub(1 + split_index);
    let can_reconnect = size < remaining;
    let rejoin_draw: f64 = rng.gen();
    let should_reconnect = can_reconnect && rejoin_draw < REJOIN_PROBABILITY;

    let rejoin_index = main_size.saturating_sub(1).min(split_index + size);
    trace!(
        branch,
        split_index,
        can_reconnect,
        should_reconnect,
        rejoin_index,
        "growing sub-branch"
    );

    let mut nodes = Vec::with_capacity(size);
    for (position, id) in ids.iter().enumerate() {
        let label = format!("Branch {}.{}", branch + 1, position + 1);

        let (node_type, outcome) = if position + 1 < size {
            let next = &ids[position + 1];
            let draw: f64 = rng.gen();
            if draw < BRANCH_DECISION_PROBABILITY {
                (
                    NodeType::Decision,
                    SkeletonOutcome::Branch {
                        options: [
                            SkeletonOption::new("Option A", next),
                            SkeletonOption::new("Option B", next),
                        ],
                    },
                )
            } else {
                (NodeType::Linear, SkeletonOutcome::Continue { next: next.clone() })
            }
        } else if should_reconnect {
            (
                NodeType::Linear,
                SkeletonOutcome::Continue {
                    next: main_ids[rejoin_index].clone(),
                },
            )
        } else {
            (NodeType::Terminal, SkeletonOutcome::End)
        };

        nodes.push(SkeletonNode {
            id: id.clone(),
            node_type,
            label,
            outcome,
            branch: Some(branch),
        });
    }

    nodes
}
