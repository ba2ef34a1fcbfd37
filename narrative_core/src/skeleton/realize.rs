//! Turning a skeleton into scenes.

use story_graph::{ChoiceOption, NarrativeItem, Scene, SceneGraph};

use super::{NodeType, SkeletonOutcome, StorySkeleton};

impl StorySkeleton {
    /// Build a scene graph with one empty scene per skeleton node.
    ///
    /// Each scene carries only the structural item of its node: a transition,
    /// a two-option choice, or nothing for Terminal nodes. Decision and Split
    /// scenes are flagged as checkpoints so their summaries can later feed
    /// long-range context.
    pub fn to_scene_graph(&self) -> SceneGraph {
        let mut graph = SceneGraph::new();

        for node in &self.nodes {
            let mut scene = Scene::new(node.id.clone(), node.label.clone());

            match &node.outcome {
                SkeletonOutcome::Continue { next } => {
                    scene = scene.with_item(NarrativeItem::transition(next.clone()));
                }
                SkeletonOutcome::Branch { options } => {
                    scene = scene.with_item(NarrativeItem::choice(
                        options
                            .iter()
                            .map(|o| ChoiceOption::new(o.label.clone(), o.target.clone()))
                            .collect(),
                    ));
                }
                SkeletonOutcome::End => {}
            }

            if matches!(node.node_type, NodeType::Decision | NodeType::Split) {
                scene = scene.as_checkpoint();
            }

            graph.add_scene(scene);
        }

        graph
    }
}
