//! Tree query engine - read-only views over one act's narrative graph.
//!
//! Loads the full graph for an act in one pass and derives root/current/
//! visited-path views plus resolved link badges from the flat rows.
//! Derivations never mutate anything; mutations go through
//! `GraphMutationOps` and callers re-load afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use plotloom_domain::{
    ActId, EncounterId, LinkTarget, MonsterId, NodeCheck, NodeId, NodeLink, StoryEdge, StoryNode,
    StoryNoteId,
};

use crate::infrastructure::ports::RepoError;
use crate::repositories::{NarrativeGraph, References};

/// A failed load. Surfaces as a single human-readable message; the only
/// recovery is re-running the whole load.
#[derive(Debug, thiserror::Error)]
#[error("Failed to load narrative graph: {source}")]
pub struct GraphLoadError {
    #[from]
    source: RepoError,
}

/// A linked entity resolved to its display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedBadge<Id> {
    pub id: Id,
    pub title: String,
}

/// A node's links partitioned by type: raw id lists plus resolved badges.
///
/// Ids without a resolved title (entity deleted out from under the link)
/// stay in the id list but get no badge.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLinks {
    pub note_ids: Vec<StoryNoteId>,
    pub notes: Vec<LinkedBadge<StoryNoteId>>,
    pub encounter_ids: Vec<EncounterId>,
    pub encounters: Vec<LinkedBadge<EncounterId>>,
    pub monster_ids: Vec<MonsterId>,
    pub monsters: Vec<LinkedBadge<MonsterId>>,
}

/// Everything known about one act's graph, loaded in a single pass.
#[derive(Debug, Clone)]
pub struct ActGraphSnapshot {
    pub act_id: ActId,
    pub nodes: Vec<StoryNode>,
    pub edges: Vec<StoryEdge>,
    pub links: Vec<NodeLink>,
    pub checks: Vec<NodeCheck>,
    pub note_titles: HashMap<StoryNoteId, String>,
    pub encounter_titles: HashMap<EncounterId, String>,
    pub monster_names: HashMap<MonsterId, String>,
}

impl ActGraphSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&StoryNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// The act's entry point, or None (caller shows create-root UI).
    pub fn root(&self) -> Option<&StoryNode> {
        self.nodes.iter().find(|n| n.is_root())
    }

    /// Where the party is right now, or None.
    pub fn current(&self) -> Option<&StoryNode> {
        self.nodes.iter().find(|n| n.is_current())
    }

    /// Visited nodes in the order they were reached. Nodes flagged
    /// visited but missing a timestamp cannot be ordered and are left out.
    pub fn visited_path(&self) -> Vec<&StoryNode> {
        let mut path: Vec<&StoryNode> = self
            .nodes
            .iter()
            .filter(|n| n.was_visited() && n.visited_at().is_some())
            .collect();
        path.sort_by_key(|n| n.visited_at());
        path
    }

    pub fn outgoing(&self, node_id: NodeId) -> Vec<&StoryEdge> {
        self.edges
            .iter()
            .filter(|e| e.from_node_id() == node_id)
            .collect()
    }

    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&StoryEdge> {
        self.edges.iter().find(|e| e.connects(from, to))
    }

    /// A node's links partitioned by type, with titles resolved from the
    /// already-fetched reference maps.
    pub fn links_for(&self, node_id: NodeId) -> NodeLinks {
        let mut resolved = NodeLinks::default();
        for link in self.links.iter().filter(|l| l.node_id() == node_id) {
            match link.target() {
                LinkTarget::Note(id) => {
                    resolved.note_ids.push(id);
                    if let Some(title) = self.note_titles.get(&id) {
                        resolved.notes.push(LinkedBadge {
                            id,
                            title: title.clone(),
                        });
                    }
                }
                LinkTarget::Encounter(id) => {
                    resolved.encounter_ids.push(id);
                    if let Some(title) = self.encounter_titles.get(&id) {
                        resolved.encounters.push(LinkedBadge {
                            id,
                            title: title.clone(),
                        });
                    }
                }
                LinkTarget::Monster(id) => {
                    resolved.monster_ids.push(id);
                    if let Some(name) = self.monster_names.get(&id) {
                        resolved.monsters.push(LinkedBadge {
                            id,
                            title: name.clone(),
                        });
                    }
                }
            }
        }
        resolved
    }

    /// A node's checks ordered by sort_order.
    pub fn checks_for(&self, node_id: NodeId) -> Vec<&NodeCheck> {
        let mut checks: Vec<&NodeCheck> = self
            .checks
            .iter()
            .filter(|c| c.node_id() == node_id)
            .collect();
        checks.sort_by_key(|c| c.sort_order());
        checks
    }
}

/// Loads act graphs and resolves linked-entity titles.
pub struct GraphQueryOps {
    graph: Arc<NarrativeGraph>,
    references: Arc<References>,
}

impl GraphQueryOps {
    pub fn new(graph: Arc<NarrativeGraph>, references: Arc<References>) -> Self {
        Self { graph, references }
    }

    /// Fetch everything for the act. Any failing query aborts the load;
    /// the caller offers a retry that re-runs the whole thing.
    pub async fn load(&self, act_id: ActId) -> Result<ActGraphSnapshot, GraphLoadError> {
        let nodes = self.graph.list_nodes_in_act(act_id).await?;
        let edges = self.graph.list_edges_in_act(act_id).await?;
        let links = self.graph.list_links_in_act(act_id).await?;
        let checks = self.graph.list_checks_in_act(act_id).await?;

        let mut note_ids = Vec::new();
        let mut encounter_ids = Vec::new();
        let mut monster_ids = Vec::new();
        for link in &links {
            match link.target() {
                LinkTarget::Note(id) => note_ids.push(id),
                LinkTarget::Encounter(id) => encounter_ids.push(id),
                LinkTarget::Monster(id) => monster_ids.push(id),
            }
        }

        let note_titles = self.references.note_titles(&note_ids).await?;
        let encounter_titles = self.references.encounter_titles(&encounter_ids).await?;
        let monster_names = self.references.monster_names(&monster_ids).await?;

        Ok(ActGraphSnapshot {
            act_id,
            nodes,
            edges,
            links,
            checks,
            note_titles,
            encounter_titles,
            monster_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockGraphRepo, MockReferenceRepo};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use plotloom_domain::{CheckKind, SessionId};

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp")
    }

    fn empty_snapshot(act_id: ActId) -> ActGraphSnapshot {
        ActGraphSnapshot {
            act_id,
            nodes: Vec::new(),
            edges: Vec::new(),
            links: Vec::new(),
            checks: Vec::new(),
            note_titles: HashMap::new(),
            encounter_titles: HashMap::new(),
            monster_names: HashMap::new(),
        }
    }

    fn node(act_id: ActId, title: &str) -> StoryNode {
        StoryNode::new(act_id, title, t0()).expect("valid node")
    }

    mod derivations {
        use super::*;

        #[test]
        fn root_and_current_absent_on_empty_act() {
            let snapshot = empty_snapshot(ActId::new());
            assert!(snapshot.is_empty());
            assert!(snapshot.root().is_none());
            assert!(snapshot.current().is_none());
            assert!(snapshot.visited_path().is_empty());
        }

        #[test]
        fn root_and_current_found_by_flags() {
            let act_id = ActId::new();
            let root = node(act_id, "Root").as_root();
            let other = node(act_id, "Other");

            let mut snapshot = empty_snapshot(act_id);
            snapshot.nodes = vec![other.clone(), root.clone()];

            assert_eq!(snapshot.root().map(|n| n.id()), Some(root.id()));
            assert_eq!(snapshot.current().map(|n| n.id()), Some(root.id()));
        }

        #[test]
        fn visited_path_sorted_by_visited_at_and_skips_null_timestamps() {
            let act_id = ActId::new();
            let session = SessionId::new();

            let mut first = node(act_id, "First");
            first.mark_visited(session, t0() + Duration::seconds(10));
            let mut second = node(act_id, "Second");
            second.mark_visited(session, t0() + Duration::seconds(20));
            // Visited flag without a timestamp: excluded from the ordering.
            let unordered = StoryNode::from_parts(
                NodeId::new(),
                act_id,
                "Unordered".to_string(),
                None,
                Default::default(),
                false,
                false,
                true,
                None,
                None,
                t0(),
                t0(),
            );

            let mut snapshot = empty_snapshot(act_id);
            snapshot.nodes = vec![second.clone(), unordered, first.clone()];

            let path: Vec<NodeId> = snapshot.visited_path().iter().map(|n| n.id()).collect();
            assert_eq!(path, vec![first.id(), second.id()]);
        }

        #[test]
        fn links_partition_by_type_and_resolve_titles() {
            let act_id = ActId::new();
            let beat = node(act_id, "Beat");
            let known_note = StoryNoteId::new();
            let dangling_note = StoryNoteId::new();
            let monster = MonsterId::new();

            let mut snapshot = empty_snapshot(act_id);
            snapshot.links = vec![
                NodeLink::new(beat.id(), LinkTarget::Note(known_note), t0()),
                NodeLink::new(beat.id(), LinkTarget::Note(dangling_note), t0()),
                NodeLink::new(beat.id(), LinkTarget::Monster(monster), t0()),
                // Another node's link must not bleed in.
                NodeLink::new(NodeId::new(), LinkTarget::Monster(MonsterId::new()), t0()),
            ];
            snapshot
                .note_titles
                .insert(known_note, "The ledger".to_string());
            snapshot.monster_names.insert(monster, "Owlbear".to_string());
            snapshot.nodes = vec![beat.clone()];

            let links = snapshot.links_for(beat.id());
            assert_eq!(links.note_ids, vec![known_note, dangling_note]);
            assert_eq!(
                links.notes,
                vec![LinkedBadge {
                    id: known_note,
                    title: "The ledger".to_string()
                }]
            );
            assert_eq!(links.monster_ids, vec![monster]);
            assert_eq!(links.monsters[0].title, "Owlbear");
            assert!(links.encounter_ids.is_empty());
        }

        #[test]
        fn checks_for_node_ordered_by_sort_order() {
            let act_id = ActId::new();
            let beat = node(act_id, "Beat");

            let late = NodeCheck::new(
                beat.id(),
                CheckKind::Condition {
                    text: "carries the sigil".to_string(),
                },
                "opens",
                "stays shut",
                t0(),
            )
            .expect("valid check")
            .with_sort_order(2);
            let early = NodeCheck::new(
                beat.id(),
                CheckKind::Ability {
                    skill: "Perception".to_string(),
                    dc: 12,
                },
                "spots it",
                "misses it",
                t0(),
            )
            .expect("valid check")
            .with_sort_order(1);

            let mut snapshot = empty_snapshot(act_id);
            snapshot.checks = vec![late.clone(), early.clone()];

            let ordered: Vec<_> = snapshot
                .checks_for(beat.id())
                .iter()
                .map(|c| c.id())
                .collect();
            assert_eq!(ordered, vec![early.id(), late.id()]);
        }
    }

    mod load {
        use super::*;

        fn no_reference_calls() -> MockReferenceRepo {
            let mut references = MockReferenceRepo::new();
            references
                .expect_note_titles()
                .returning(|_| Ok(HashMap::new()));
            references
                .expect_encounter_titles()
                .returning(|_| Ok(HashMap::new()));
            references
                .expect_monster_names()
                .returning(|_| Ok(HashMap::new()));
            references
        }

        #[tokio::test]
        async fn load_aggregates_all_queries() {
            let act_id = ActId::new();
            let beat = node(act_id, "Beat");
            let note = StoryNoteId::new();
            let link = NodeLink::new(beat.id(), LinkTarget::Note(note), t0());

            let mut repo = MockGraphRepo::new();
            let nodes = vec![beat.clone()];
            repo.expect_list_nodes_in_act()
                .returning(move |_| Ok(nodes.clone()));
            repo.expect_list_edges_in_act().returning(|_| Ok(Vec::new()));
            let links = vec![link.clone()];
            repo.expect_list_links_in_act()
                .returning(move |_| Ok(links.clone()));
            repo.expect_list_checks_in_act()
                .returning(|_| Ok(Vec::new()));

            let mut references = MockReferenceRepo::new();
            references
                .expect_note_titles()
                .withf(move |ids| ids.len() == 1 && ids[0] == note)
                .returning(move |_| {
                    let mut titles = HashMap::new();
                    titles.insert(note, "A note".to_string());
                    Ok(titles)
                });
            references
                .expect_encounter_titles()
                .returning(|_| Ok(HashMap::new()));
            references
                .expect_monster_names()
                .returning(|_| Ok(HashMap::new()));

            let ops = GraphQueryOps::new(
                Arc::new(NarrativeGraph::new(Arc::new(repo))),
                Arc::new(References::new(Arc::new(references))),
            );

            let snapshot = ops.load(act_id).await.expect("load");
            assert_eq!(snapshot.nodes.len(), 1);
            assert_eq!(snapshot.links.len(), 1);
            assert_eq!(
                snapshot.note_titles.get(&note).map(String::as_str),
                Some("A note")
            );
        }

        #[tokio::test]
        async fn any_failing_query_fails_the_whole_load() {
            let mut repo = MockGraphRepo::new();
            repo.expect_list_nodes_in_act().returning(|_| Ok(Vec::new()));
            repo.expect_list_edges_in_act().returning(|_| Ok(Vec::new()));
            repo.expect_list_links_in_act()
                .returning(|_| Ok(Vec::new()));
            repo.expect_list_checks_in_act()
                .returning(|_| Err(RepoError::database("list_checks_in_act", "disk on fire")));

            let ops = GraphQueryOps::new(
                Arc::new(NarrativeGraph::new(Arc::new(repo))),
                Arc::new(References::new(Arc::new(no_reference_calls()))),
            );

            let err = ops.load(ActId::new()).await.expect_err("load fails");
            assert!(err.to_string().contains("Failed to load narrative graph"));
        }
    }
}
