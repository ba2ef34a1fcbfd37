//! Backward graph distances from a target scene.

use std::collections::{HashMap, HashSet, VecDeque};

use story_graph::{NarrativeItem, SceneGraph, SceneId};
use tracing::trace;

/// Minimum hop count from every ancestor of a scene to that scene.
pub type DistanceMap = HashMap<SceneId, u32>;

/// Build the successor -> predecessors map from every transition and choice
/// option in the graph. Edges with no target are skipped.
pub fn build_parent_map(graph: &SceneGraph) -> HashMap<&SceneId, Vec<&SceneId>> {
    let mut parents: HashMap<&SceneId, Vec<&SceneId>> = HashMap::new();

    for scene in graph.scenes() {
        for item in &scene.items {
            match item {
                NarrativeItem::Transition { target: None } => {
                    trace!(scene = %scene.id, "skipping transition without target");
                }
                NarrativeItem::Choice { options } => {
                    for option in options.iter().filter(|o| o.target.is_none()) {
                        trace!(scene = %scene.id, option = %option.label, "skipping option without target");
                    }
                }
                _ => {}
            }

            for successor in item.successors() {
                parents.entry(successor).or_default().push(&scene.id);
            }
        }
    }

    parents
}

/// Compute the distance from every ancestor of `target` (including the
/// target itself, at distance 0) by breadth-first search over reversed
/// edges.
///
/// Scenes that cannot reach `target` are absent from the result. Cycles are
/// tolerated; each scene is visited once. The map is rebuilt from scratch on
/// every call.
pub fn build_distance_map(graph: &SceneGraph, target: &SceneId) -> DistanceMap {
    let parents = build_parent_map(graph);

    let mut distances = DistanceMap::new();
    let mut visited: HashSet<&SceneId> = HashSet::new();
    let mut queue: VecDeque<(&SceneId, u32)> = VecDeque::new();

    visited.insert(target);
    queue.push_back((target, 0));

    while let Some((scene, depth)) = queue.pop_front() {
        distances.insert(scene.clone(), depth);

        for parent in parents.get(scene).into_iter().flatten() {
            if visited.insert(parent) {
                queue.push_back((parent, depth + 1));
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_graph::{ChoiceOption, Scene};

    fn id(s: &str) -> SceneId {
        SceneId::from(s)
    }

    /// start -> a -> c, start -> b -> c, c -> end, orphan -> orphan_end
    fn diamond_graph() -> SceneGraph {
        let mut graph = SceneGraph::new();
        graph.add_scene(Scene::new("start", "Start").with_item(NarrativeItem::choice(vec![
            ChoiceOption::new("Left", "a"),
            ChoiceOption::new("Right", "b"),
        ])));
        graph.add_scene(Scene::new("a", "A").with_item(NarrativeItem::transition("c")));
        graph.add_scene(Scene::new("b", "B").with_item(NarrativeItem::transition("c")));
        graph.add_scene(Scene::new("c", "C").with_item(NarrativeItem::transition("end")));
        graph.add_scene(Scene::new("end", "End"));
        graph.add_scene(Scene::new("orphan", "Orphan").with_item(NarrativeItem::transition("orphan_end")));
        graph.add_scene(Scene::new("orphan_end", "Orphan End"));
        graph
    }

    #[test]
    fn test_target_has_distance_zero() {
        let graph = diamond_graph();
        let distances = build_distance_map(&graph, &id("c"));
        assert_eq!(distances[&id("c")], 0);
    }

    #[test]
    fn test_shortest_ancestor_distances() {
        let graph = diamond_graph();
        let distances = build_distance_map(&graph, &id("end"));

        assert_eq!(distances[&id("end")], 0);
        assert_eq!(distances[&id("c")], 1);
        assert_eq!(distances[&id("a")], 2);
        assert_eq!(distances[&id("b")], 2);
        assert_eq!(distances[&id("start")], 3);
        assert_eq!(distances.len(), 5);
    }

    #[test]
    fn test_unreachable_scenes_absent() {
        let graph = diamond_graph();
        let distances = build_distance_map(&graph, &id("c"));

        assert!(!distances.contains_key(&id("orphan")));
        assert!(!distances.contains_key(&id("end")));
    }

    #[test]
    fn test_cycle_through_target() {
        let mut graph = SceneGraph::new();
        graph.add_scene(Scene::new("x", "X").with_item(NarrativeItem::transition("y")));
        graph.add_scene(Scene::new("y", "Y").with_item(NarrativeItem::transition("z")));
        graph.add_scene(Scene::new("z", "Z").with_item(NarrativeItem::transition("x")));

        let distances = build_distance_map(&graph, &id("x"));
        assert_eq!(distances[&id("x")], 0);
        assert_eq!(distances[&id("z")], 1);
        assert_eq!(distances[&id("y")], 2);
    }

    #[test]
    fn test_self_loop_keeps_zero() {
        let mut graph = SceneGraph::new();
        graph.add_scene(Scene::new("loop", "Loop").with_item(NarrativeItem::transition("loop")));

        let distances = build_distance_map(&graph, &id("loop"));
        assert_eq!(distances.len(), 1);
        assert_eq!(distances[&id("loop")], 0);
    }

    #[test]
    fn test_malformed_edges_skipped() {
        let mut graph = SceneGraph::new();
        graph.add_scene(
            Scene::new("start", "Start")
                .with_item(NarrativeItem::Transition { target: None })
                .with_item(NarrativeItem::choice(vec![
                    ChoiceOption {
                        label: "Broken".to_string(),
                        target: None,
                        conditions: Vec::new(),
                    },
                    ChoiceOption::new("Fine", "next"),
                ])),
        );
        graph.add_scene(Scene::new("next", "Next"));

        let distances = build_distance_map(&graph, &id("next"));
        assert_eq!(distances[&id("start")], 1);
    }

    #[test]
    fn test_target_missing_from_graph() {
        let graph = diamond_graph();
        let distances = build_distance_map(&graph, &id("ghost"));
        assert_eq!(distances.len(), 1);
        assert_eq!(distances[&id("ghost")], 0);
    }
}
