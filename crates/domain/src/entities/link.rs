//! NodeLink entity - association from a node to an external entity
//!
//! Links attach story notes, encounters, and monsters to graph nodes so
//! the views can show badges. The linked entities themselves are owned
//! by the surrounding CRUD layer; the graph core only references them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DomainError, EncounterId, MonsterId, NodeId, NodeLinkId, StoryNoteId};

/// Kind of external entity a node can link to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Note,
    Encounter,
    Monster,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Encounter => "encounter",
            Self::Monster => "monster",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Self::Note),
            "encounter" => Ok(Self::Encounter),
            "monster" => Ok(Self::Monster),
            other => Err(DomainError::parse(format!("Unknown link type: {other}"))),
        }
    }
}

/// Typed reference to the linked external entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "linkType", content = "linkId", rename_all = "lowercase")]
pub enum LinkTarget {
    Note(StoryNoteId),
    Encounter(EncounterId),
    Monster(MonsterId),
}

impl LinkTarget {
    pub fn link_type(&self) -> LinkType {
        match self {
            Self::Note(_) => LinkType::Note,
            Self::Encounter(_) => LinkType::Encounter,
            Self::Monster(_) => LinkType::Monster,
        }
    }

    pub fn link_id(&self) -> Uuid {
        match self {
            Self::Note(id) => id.to_uuid(),
            Self::Encounter(id) => id.to_uuid(),
            Self::Monster(id) => id.to_uuid(),
        }
    }

    /// Rebuild a target from its stored (link_type, link_id) pair.
    pub fn from_stored(link_type: LinkType, link_id: Uuid) -> Self {
        match link_type {
            LinkType::Note => Self::Note(StoryNoteId::from_uuid(link_id)),
            LinkType::Encounter => Self::Encounter(EncounterId::from_uuid(link_id)),
            LinkType::Monster => Self::Monster(MonsterId::from_uuid(link_id)),
        }
    }
}

/// Association from a node to an external entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLink {
    id: NodeLinkId,
    node_id: NodeId,
    #[serde(flatten)]
    target: LinkTarget,
    created_at: DateTime<Utc>,
}

impl NodeLink {
    pub fn new(node_id: NodeId, target: LinkTarget, now: DateTime<Utc>) -> Self {
        Self {
            id: NodeLinkId::new(),
            node_id,
            target,
            created_at: now,
        }
    }

    pub fn id(&self) -> NodeLinkId {
        self.id
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn target(&self) -> LinkTarget {
        self.target
    }

    pub fn link_type(&self) -> LinkType {
        self.target.link_type()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reconstruct a NodeLink from stored parts.
    pub fn from_parts(
        id: NodeLinkId,
        node_id: NodeId,
        target: LinkTarget,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            node_id,
            target,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp")
    }

    #[test]
    fn link_type_round_trips_through_str() {
        for lt in [LinkType::Note, LinkType::Encounter, LinkType::Monster] {
            assert_eq!(lt.as_str().parse::<LinkType>().expect("parses"), lt);
        }
        assert!("npc".parse::<LinkType>().is_err());
    }

    #[test]
    fn target_round_trips_through_stored_pair() {
        let encounter = EncounterId::new();
        let target = LinkTarget::Encounter(encounter);

        let rebuilt = LinkTarget::from_stored(target.link_type(), target.link_id());
        assert_eq!(rebuilt, target);
    }

    #[test]
    fn target_serializes_as_tagged_pair() {
        let note = StoryNoteId::new();
        let json = serde_json::to_value(LinkTarget::Note(note)).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "linkType": "note", "linkId": note.to_uuid() })
        );

        let back: LinkTarget = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, LinkTarget::Note(note));
    }

    #[test]
    fn new_link_carries_target() {
        let node_id = NodeId::new();
        let note = StoryNoteId::new();
        let link = NodeLink::new(node_id, LinkTarget::Note(note), test_now());

        assert_eq!(link.node_id(), node_id);
        assert_eq!(link.link_type(), LinkType::Note);
        assert_eq!(link.target(), LinkTarget::Note(note));
    }
}
