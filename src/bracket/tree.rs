use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Serialize;

use super::types::{DrawNode, Feed, MAX_ROUNDS, NodeId, NodeSpec, RoundLabel, Slot};
use crate::errors::{EngineError, EngineResult};
use crate::rating::PlayerId;

/// Immutable single-elimination draw stored as an index-addressed arena.
///
/// Nodes are ordered round by round, so every node comes after both of its
/// children and a forward walk resolves a bracket in dependency order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawTree {
    nodes: Vec<DrawNode>,
    labels: Vec<RoundLabel>,
    players: Vec<PlayerId>,
    #[serde(skip)]
    player_index: HashMap<PlayerId, usize>,
    #[serde(skip)]
    player_leaf: Vec<NodeId>,
}

/// Builds a draw from first-round entries in bracket order.
pub fn build_bracket(entries: &[Slot]) -> EngineResult<DrawTree> {
    DrawTree::build(entries)
}

impl DrawTree {
    pub fn build(entries: &[Slot]) -> EngineResult<Self> {
        let count = entries.len();
        if count < 2 || !count.is_power_of_two() {
            return Err(EngineError::EntryCount(count));
        }
        let rounds = count.trailing_zeros() as usize;
        let labels = RoundLabel::for_draw(rounds)?;

        let mut nodes: Vec<DrawNode> = entries
            .chunks(2)
            .enumerate()
            .map(|(index, pair)| DrawNode {
                id: index,
                round: 0,
                label: labels[0],
                index,
                feed: Feed::Entrants([pair[0], pair[1]]),
                parent: None,
                external_id: None,
            })
            .collect();

        let mut previous: Vec<NodeId> = (0..nodes.len()).collect();
        for (round, &label) in labels.iter().enumerate().skip(1) {
            let mut current = Vec::with_capacity(previous.len() / 2);
            for (index, pair) in previous.chunks(2).enumerate() {
                let id = nodes.len();
                nodes.push(DrawNode {
                    id,
                    round,
                    label,
                    index,
                    feed: Feed::Winners([pair[0], pair[1]]),
                    parent: None,
                    external_id: None,
                });
                current.push(id);
            }
            previous = current;
        }

        let tree = Self::assemble(nodes, labels)?;
        debug!(
            "Built {}-entry draw with {} rounds and {} players",
            count,
            rounds,
            tree.players.len()
        );
        Ok(tree)
    }

    /// Validates a caller-supplied node graph and normalises it into an arena.
    pub fn from_nodes(specs: &[NodeSpec]) -> EngineResult<Self> {
        let by_id = index_specs(specs)?;
        let root = find_root(specs, &by_id)?;
        let levels = collect_levels(specs, &by_id, root)?;

        let rounds = levels.len();
        if rounds > MAX_ROUNDS {
            return Err(EngineError::DrawTooDeep {
                rounds,
                max: MAX_ROUNDS,
            });
        }
        let labels = RoundLabel::for_draw(rounds)?;

        let mut arena_of: HashMap<usize, NodeId> = HashMap::new();
        let mut nodes = Vec::with_capacity(specs.len());
        for (round, level) in levels.iter().rev().enumerate() {
            for (index, &spec_idx) in level.iter().enumerate() {
                let spec = &specs[spec_idx];
                if spec.round != labels[round] {
                    return Err(malformed(format!(
                        "node {} is labelled {} but sits in round {}",
                        spec.id, spec.round, labels[round]
                    )));
                }
                let feed = if round == 0 {
                    Feed::Entrants([spec.slots[0], spec.slots[1]])
                } else {
                    let child = |i: usize| arena_of[&by_id[&spec.children[i]]];
                    Feed::Winners([child(0), child(1)])
                };
                let id = nodes.len();
                arena_of.insert(spec_idx, id);
                nodes.push(DrawNode {
                    id,
                    round,
                    label: labels[round],
                    index,
                    feed,
                    parent: None,
                    external_id: Some(spec.id),
                });
            }
        }

        Self::assemble(nodes, labels)
    }

    fn assemble(mut nodes: Vec<DrawNode>, labels: Vec<RoundLabel>) -> EngineResult<Self> {
        let links: Vec<(NodeId, NodeId)> = nodes
            .iter()
            .filter_map(|n| n.children().map(|c| (n.id, c)))
            .flat_map(|(parent, [a, b])| [(a, parent), (b, parent)])
            .collect();
        for (child, parent) in links {
            nodes[child].parent = Some(parent);
        }

        let mut players = Vec::new();
        let mut player_index = HashMap::new();
        let mut player_leaf = Vec::new();
        for node in &nodes {
            if let Feed::Entrants(slots) = node.feed {
                for id in slots.iter().filter_map(Slot::player) {
                    if player_index.insert(id, players.len()).is_some() {
                        return Err(EngineError::DuplicatePlayer(id));
                    }
                    players.push(id);
                    player_leaf.push(node.id);
                }
            }
        }

        Ok(Self {
            nodes,
            labels,
            players,
            player_index,
            player_leaf,
        })
    }

    pub fn nodes(&self) -> &[DrawNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &DrawNode {
        &self.nodes[id]
    }

    /// The Final.
    pub fn root(&self) -> NodeId {
        self.nodes.len() - 1
    }

    pub fn rounds(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[RoundLabel] {
        &self.labels
    }

    /// Label of a round index; one past the Final is the virtual `W`.
    pub fn label(&self, round: usize) -> RoundLabel {
        self.labels.get(round).copied().unwrap_or(RoundLabel::W)
    }

    /// Entrants in order of appearance; their position is the dense player index.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.player_index.get(&id).copied()
    }

    /// First-round node of a player, by dense index.
    pub fn leaf_of(&self, player: usize) -> NodeId {
        self.player_leaf[player]
    }

    pub fn matches_in_round(&self, round: usize) -> usize {
        self.nodes.iter().filter(|n| n.round == round).count()
    }

    /// The other node feeding `node`'s parent.
    pub fn sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node].parent?;
        let [a, b] = self.nodes[parent].children()?;
        Some(if a == node { b } else { a })
    }
}

fn malformed(reason: String) -> EngineError {
    EngineError::MalformedDraw(reason)
}

fn index_specs(specs: &[NodeSpec]) -> EngineResult<HashMap<i64, usize>> {
    if specs.is_empty() {
        return Err(malformed("draw has no nodes".to_string()));
    }
    let mut by_id = HashMap::with_capacity(specs.len());
    for (idx, spec) in specs.iter().enumerate() {
        if by_id.insert(spec.id, idx).is_some() {
            return Err(malformed(format!("node id {} is used twice", spec.id)));
        }
    }

    for spec in specs {
        match (spec.children.len(), spec.slots.len()) {
            (0, 2) => {}
            (2, 0) => {
                if let Some(missing) = spec.children.iter().find(|c| !by_id.contains_key(c)) {
                    return Err(malformed(format!(
                        "node {} references missing child {}",
                        spec.id, missing
                    )));
                }
            }
            (children, slots) => {
                return Err(malformed(format!(
                    "node {} must have either two children or two slots, has {} children and {} slots",
                    spec.id, children, slots
                )));
            }
        }
    }
    Ok(by_id)
}

fn find_root(specs: &[NodeSpec], by_id: &HashMap<i64, usize>) -> EngineResult<usize> {
    let mut referenced: HashSet<i64> = HashSet::new();
    for spec in specs {
        for &child in &spec.children {
            if child == spec.id {
                return Err(malformed(format!("node {} is its own child", spec.id)));
            }
            if !referenced.insert(child) {
                return Err(malformed(format!("node {} has more than one parent", child)));
            }
        }
    }

    let roots: Vec<&NodeSpec> = specs.iter().filter(|s| !referenced.contains(&s.id)).collect();
    match roots.as_slice() {
        [root] if root.round == RoundLabel::F => Ok(by_id[&root.id]),
        [root] => Err(malformed(format!(
            "root node {} must be the Final, is labelled {}",
            root.id, root.round
        ))),
        [] => Err(malformed("no root node: the child links form a cycle".to_string())),
        many => Err(malformed(format!("expected exactly one root, found {}", many.len()))),
    }
}

/// Breadth-first levels from the root; every node must be reached and all
/// first-round nodes must sit on the deepest level.
fn collect_levels(
    specs: &[NodeSpec],
    by_id: &HashMap<i64, usize>,
    root: usize,
) -> EngineResult<Vec<Vec<usize>>> {
    let mut levels = vec![vec![root]];
    let mut visited = 1;
    loop {
        let Some(current) = levels.last() else { break };
        let leaves = current.iter().filter(|&&i| specs[i].children.is_empty()).count();
        if leaves == current.len() {
            break;
        }
        if leaves > 0 {
            return Err(malformed(
                "first-round nodes appear at different depths".to_string(),
            ));
        }
        let next: Vec<usize> = current
            .iter()
            .flat_map(|&i| specs[i].children.iter().map(|c| by_id[c]))
            .collect();
        visited += next.len();
        if visited > specs.len() {
            return Err(malformed("child links form a cycle".to_string()));
        }
        levels.push(next);
    }

    if visited != specs.len() {
        return Err(malformed(format!(
            "{} nodes are not connected to the Final",
            specs.len() - visited
        )));
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: i64) -> Vec<Slot> {
        (1..=n).map(Slot::Player).collect()
    }

    fn spec(id: i64, round: RoundLabel, slots: Vec<Slot>, children: Vec<i64>) -> NodeSpec {
        NodeSpec {
            id,
            round,
            slots,
            children,
        }
    }

    fn four_player_specs() -> Vec<NodeSpec> {
        vec![
            spec(10, RoundLabel::F, vec![], vec![11, 12]),
            spec(11, RoundLabel::SF, vec![Slot::Player(1), Slot::Player(2)], vec![]),
            spec(12, RoundLabel::SF, vec![Slot::Player(3), Slot::Bye], vec![]),
        ]
    }

    #[test]
    fn test_build_eight_draw() {
        let tree = build_bracket(&entries(8)).unwrap();
        assert_eq!(tree.rounds(), 3);
        assert_eq!(tree.nodes().len(), 7);
        assert_eq!(tree.labels(), &[RoundLabel::QF, RoundLabel::SF, RoundLabel::F]);
        assert_eq!(tree.node(tree.root()).label, RoundLabel::F);
        assert_eq!(tree.node(tree.root()).parent, None);
        assert_eq!(tree.matches_in_round(0), 4);
        assert_eq!(tree.players().len(), 8);
        assert_eq!(tree.player_index(5), Some(4));
        assert_eq!(tree.leaf_of(4), 2);
    }

    #[test]
    fn test_every_non_root_node_has_one_parent() {
        let tree = build_bracket(&entries(16)).unwrap();
        let mut child_refs = vec![0; tree.nodes().len()];
        for node in tree.nodes() {
            if let Some([a, b]) = node.children() {
                assert!(a < node.id && b < node.id);
                child_refs[a] += 1;
                child_refs[b] += 1;
            }
        }
        for node in tree.nodes() {
            let expected = if node.id == tree.root() { 0 } else { 1 };
            assert_eq!(child_refs[node.id], expected);
        }
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert_eq!(build_bracket(&entries(6)), Err(EngineError::EntryCount(6)));
        assert_eq!(build_bracket(&entries(1)), Err(EngineError::EntryCount(1)));
        assert_eq!(build_bracket(&[]), Err(EngineError::EntryCount(0)));
    }

    #[test]
    fn test_rejects_oversized_draw() {
        let err = build_bracket(&entries(256)).unwrap_err();
        assert_eq!(err, EngineError::DrawTooDeep { rounds: 8, max: 7 });
    }

    #[test]
    fn test_rejects_duplicate_player() {
        let slots = vec![Slot::Player(1), Slot::Player(2), Slot::Player(1), Slot::Bye];
        assert_eq!(build_bracket(&slots), Err(EngineError::DuplicatePlayer(1)));
    }

    #[test]
    fn test_byes_and_tbd_are_not_players() {
        let slots = vec![Slot::Player(1), Slot::Bye, Slot::Tbd, Slot::Player(2)];
        let tree = build_bracket(&slots).unwrap();
        assert_eq!(tree.players(), &[1, 2]);
    }

    #[test]
    fn test_sibling_lookup() {
        let tree = build_bracket(&entries(8)).unwrap();
        assert_eq!(tree.sibling(0), Some(1));
        assert_eq!(tree.sibling(3), Some(2));
        assert_eq!(tree.sibling(tree.root()), None);
    }

    #[test]
    fn test_from_nodes_normalises_graph() {
        let tree = DrawTree::from_nodes(&four_player_specs()).unwrap();
        assert_eq!(tree.rounds(), 2);
        assert_eq!(tree.node(tree.root()).external_id, Some(10));
        assert_eq!(tree.node(0).external_id, Some(11));
        assert_eq!(tree.players(), &[1, 2, 3]);
        assert_eq!(tree.node(2).children(), Some([0, 1]));
    }

    #[test]
    fn test_from_nodes_rejects_missing_child() {
        let mut specs = four_player_specs();
        specs[0].children = vec![11, 99];
        let err = DrawTree::from_nodes(&specs).unwrap_err();
        assert!(err.to_string().contains("missing child 99"));
    }

    #[test]
    fn test_from_nodes_rejects_cycle() {
        let specs = vec![
            spec(1, RoundLabel::F, vec![], vec![2, 3]),
            spec(2, RoundLabel::SF, vec![], vec![1, 3]),
            spec(3, RoundLabel::SF, vec![Slot::Player(1), Slot::Player(2)], vec![]),
        ];
        assert!(matches!(
            DrawTree::from_nodes(&specs),
            Err(EngineError::MalformedDraw(_))
        ));
    }

    #[test]
    fn test_from_nodes_rejects_detached_cycle() {
        let mut specs = four_player_specs();
        specs.push(spec(20, RoundLabel::SF, vec![], vec![21, 22]));
        specs.push(spec(21, RoundLabel::SF, vec![], vec![20, 23]));
        specs.push(spec(22, RoundLabel::SF, vec![Slot::Player(7), Slot::Player(8)], vec![]));
        specs.push(spec(23, RoundLabel::SF, vec![Slot::Player(9), Slot::Player(10)], vec![]));
        let err = DrawTree::from_nodes(&specs).unwrap_err();
        assert!(err.to_string().contains("4 nodes are not connected"));
    }

    #[test]
    fn test_from_nodes_rejects_uneven_leaves() {
        let specs = vec![
            spec(1, RoundLabel::F, vec![], vec![2, 3]),
            spec(2, RoundLabel::SF, vec![Slot::Player(1), Slot::Player(2)], vec![]),
            spec(3, RoundLabel::SF, vec![], vec![4, 5]),
            spec(4, RoundLabel::QF, vec![Slot::Player(3), Slot::Player(4)], vec![]),
            spec(5, RoundLabel::QF, vec![Slot::Player(5), Slot::Player(6)], vec![]),
        ];
        let err = DrawTree::from_nodes(&specs).unwrap_err();
        assert!(err.to_string().contains("different depths"));
    }

    #[test]
    fn test_from_nodes_rejects_wrong_labels_and_roots() {
        let mut specs = four_player_specs();
        specs[1].round = RoundLabel::QF;
        assert!(DrawTree::from_nodes(&specs).is_err());

        let mut specs = four_player_specs();
        specs[0].round = RoundLabel::SF;
        let err = DrawTree::from_nodes(&specs).unwrap_err();
        assert!(err.to_string().contains("must be the Final"));
    }
}
