//! Skeleton Scheduler - Procedural generation of branching story structure.
//!
//! A skeleton is a content-free scaffold: typed nodes and edges that a later
//! content-filling stage turns into real scenes. Generation works as follows:
//! 1. **Main line**: Allocate the main chain; the last node is Terminal
//! 2. **Typing**: One draw per internal node, Split checked before Decision
//! 3. **Guarantee**: Force one Split when branching was requested but never drawn
//! 4. **Materialization**: Attach outcomes to every main-line node
//! 5. **Sub-branches**: Each Split grows a short side line that either
//!    rejoins the main line or ends on its own
//!
//! All randomness comes from the caller's [`Rng`], so a seed reproduces the
//! whole skeleton including node ids.

mod branch;
mod realize;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};
use uuid::Builder;

use story_graph::SceneId;

use branch::generate_sub_branch;

/// Structural parameters of a generated skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of nodes on the main line, including the final Terminal.
    pub main_branch_size: usize,
    /// Number of nodes in each sub-branch.
    pub split_branch_size: usize,
    pub split_probability: f64,
    pub decision_probability: f64,
    /// Opaque creative brief, passed through to the skeleton.
    pub prompt: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            main_branch_size: 8,
            split_branch_size: 3,
            split_probability: 0.2,
            decision_probability: 0.3,
            prompt: String::new(),
        }
    }
}

impl SchedulerConfig {
    /// Clamp sizes to at least 1 and probabilities into `[0, 1]`.
    ///
    /// Bad parameters degrade the output instead of failing generation.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();

        if config.main_branch_size < 1 {
            warn!(value = config.main_branch_size, "main_branch_size below 1, clamping");
            config.main_branch_size = 1;
        }
        if config.split_branch_size < 1 {
            warn!(value = config.split_branch_size, "split_branch_size below 1, clamping");
            config.split_branch_size = 1;
        }
        config.split_probability = clamp_probability("split_probability", config.split_probability);
        config.decision_probability =
            clamp_probability("decision_probability", config.decision_probability);

        config
    }
}

fn clamp_probability(name: &str, value: f64) -> f64 {
    if value.is_nan() {
        warn!(field = name, "probability is NaN, using 0");
        return 0.0;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!(field = name, value, "probability outside [0, 1], clamping");
    }
    clamped
}

/// Structural role of a skeleton node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Continues to exactly one successor.
    Linear,
    /// Offers two options that lead to the same successor. The choice only
    /// matters through the state effects attached during content filling;
    /// structural divergence is what [`NodeType::Split`] is for.
    Decision,
    /// Offers the main line or a freshly generated sub-branch.
    Split,
    /// Ends the story.
    Terminal,
}

/// One option of a Decision or Split node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonOption {
    pub label: String,
    pub target: SceneId,
}

impl SkeletonOption {
    fn new(label: &str, target: &SceneId) -> Self {
        Self {
            label: label.to_string(),
            target: target.clone(),
        }
    }
}

/// Outgoing edges of a skeleton node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkeletonOutcome {
    Continue { next: SceneId },
    Branch { options: [SkeletonOption; 2] },
    End,
}

/// A node of a generated skeleton, before any content is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub id: SceneId,
    pub node_type: NodeType,
    pub label: String,
    pub outcome: SkeletonOutcome,
    /// Sub-branch this node belongs to; `None` on the main line.
    pub branch: Option<usize>,
}

impl SkeletonNode {
    /// Successor ids in option order.
    pub fn successors(&self) -> Vec<&SceneId> {
        match &self.outcome {
            SkeletonOutcome::Continue { next } => vec![next],
            SkeletonOutcome::Branch { options } => options.iter().map(|o| &o.target).collect(),
            SkeletonOutcome::End => Vec::new(),
        }
    }
}

/// A generated skeleton: main-line nodes first, then each sub-branch in
/// generation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySkeleton {
    pub prompt: String,
    pub nodes: Vec<SkeletonNode>,
}

impl StorySkeleton {
    /// The first main-line node.
    pub fn start(&self) -> Option<&SkeletonNode> {
        self.nodes.first()
    }

    pub fn get(&self, id: &SceneId) -> Option<&SkeletonNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn count_of(&self, node_type: NodeType) -> usize {
        self.nodes.iter().filter(|n| n.node_type == node_type).count()
    }

    pub fn split_count(&self) -> usize {
        self.count_of(NodeType::Split)
    }

    pub fn terminal_count(&self) -> usize {
        self.count_of(NodeType::Terminal)
    }

    /// Main-line nodes in order.
    pub fn main_line(&self) -> impl Iterator<Item = &SkeletonNode> {
        self.nodes.iter().filter(|n| n.branch.is_none())
    }

    /// Nodes of one sub-branch in order.
    pub fn branch_nodes(&self, branch: usize) -> impl Iterator<Item = &SkeletonNode> {
        self.nodes.iter().filter(move |n| n.branch == Some(branch))
    }

    /// Ids of nodes that cannot be reached from the start node.
    pub fn unreachable_nodes(&self) -> Vec<&SceneId> {
        let by_id: HashMap<&SceneId, &SkeletonNode> =
            self.nodes.iter().map(|n| (&n.id, n)).collect();

        let mut reached: HashSet<&SceneId> = HashSet::new();
        let mut queue: VecDeque<&SceneId> = VecDeque::new();
        if let Some(start) = self.start() {
            reached.insert(&start.id);
            queue.push_back(&start.id);
        }

        while let Some(id) = queue.pop_front() {
            let Some(node) = by_id.get(id) else {
                continue;
            };
            for next in node.successors() {
                if reached.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        self.nodes
            .iter()
            .map(|n| &n.id)
            .filter(|id| !reached.contains(id))
            .collect()
    }
}

/// Draw a node id from the generator so seeded runs reproduce ids too.
pub(crate) fn next_id<R: Rng + ?Sized>(rng: &mut R) -> SceneId {
    let bytes: [u8; 16] = rng.gen();
    SceneId::from_uuid(Builder::from_random_bytes(bytes).into_uuid())
}

/// Generate a story skeleton using the given random source.
pub fn generate_story_skeleton<R: Rng + ?Sized>(
    config: &SchedulerConfig,
    rng: &mut R,
) -> StorySkeleton {
    let config = config.sanitized();
    let size = config.main_branch_size;

    let main_ids: Vec<SceneId> = (0..size).map(|_| next_id(rng)).collect();

    let mut types = vec![NodeType::Linear; size];
    types[size - 1] = NodeType::Terminal;

    for node_type in types.iter_mut().take(size.saturating_sub(1)).skip(1) {
        let draw: f64 = rng.gen();
        if draw < config.split_probability {
            *node_type = NodeType::Split;
        } else if draw < config.split_probability + config.decision_probability {
            *node_type = NodeType::Decision;
        }
    }

    if config.split_probability > 0.0 && size >= 4 && !types.contains(&NodeType::Split) {
        let forced = size / 2;
        debug!(index = forced, "no split drawn, forcing one");
        types[forced] = NodeType::Split;
    }

    let mut nodes = Vec::with_capacity(size);
    let mut branches: Vec<Vec<SkeletonNode>> = Vec::new();

    for (index, node_type) in types.iter().copied().enumerate() {
        let outcome = match node_type {
            NodeType::Terminal => SkeletonOutcome::End,
            NodeType::Linear => SkeletonOutcome::Continue {
                next: main_ids[index + 1].clone(),
            },
            NodeType::Decision => {
                let next = &main_ids[index + 1];
                SkeletonOutcome::Branch {
                    options: [
                        SkeletonOption::new("Option A", next),
                        SkeletonOption::new("Option B", next),
                    ],
                }
            }
            NodeType::Split => {
                let branch = generate_sub_branch(&config, index, &main_ids, branches.len(), rng);
                let options = [
                    SkeletonOption::new("Continue main path", &main_ids[index + 1]),
                    SkeletonOption::new("Take divergent path", &branch[0].id),
                ];
                branches.push(branch);
                SkeletonOutcome::Branch { options }
            }
        };

        nodes.push(SkeletonNode {
            id: main_ids[index].clone(),
            node_type,
            label: format!("Scene {}", index + 1),
            outcome,
            branch: None,
        });
    }

    let branch_count = branches.len();
    nodes.extend(branches.into_iter().flatten());

    debug!(
        main = size,
        branches = branch_count,
        nodes = nodes.len(),
        "generated story skeleton"
    );

    StorySkeleton {
        prompt: config.prompt,
        nodes,
    }
}

/// Generate a story skeleton from a seed.
pub fn generate_story_skeleton_seeded(config: &SchedulerConfig, seed: u64) -> StorySkeleton {
    generate_story_skeleton(config, &mut StdRng::seed_from_u64(seed))
}
