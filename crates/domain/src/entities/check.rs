//! NodeCheck entity - skill/save/condition gates attached to nodes
//!
//! Checks are an adjudication aid shown to the GM during live play;
//! they are not tied to traversal logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CheckId, DomainError, NodeId};

/// The kind of gate a check represents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "checkType", rename_all = "lowercase")]
pub enum CheckKind {
    /// A skill check against a difficulty class
    Ability { skill: String, dc: i32 },
    /// A saving throw against a difficulty class
    Save { ability: String, dc: i32 },
    /// A free-text condition with no numeric difficulty
    Condition { text: String },
}

impl CheckKind {
    /// Stored discriminant for the `check_type` column.
    pub fn check_type(&self) -> &'static str {
        match self {
            Self::Ability { .. } => "ability",
            Self::Save { .. } => "save",
            Self::Condition { .. } => "condition",
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Ability { skill, .. } if skill.trim().is_empty() => {
                Err(DomainError::validation("Ability check requires a skill name"))
            }
            Self::Save { ability, .. } if ability.trim().is_empty() => {
                Err(DomainError::validation("Save check requires an ability"))
            }
            Self::Condition { text } if text.trim().is_empty() => {
                Err(DomainError::validation("Condition check requires text"))
            }
            _ => Ok(()),
        }
    }
}

/// A skill/saving-throw/condition gate attached to a node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCheck {
    id: CheckId,
    node_id: NodeId,

    #[serde(flatten)]
    kind: CheckKind,

    /// What happens on a success (required, non-empty)
    success_text: String,
    /// What happens on a failure (required, non-empty)
    failure_text: String,
    /// Optional extra outcome for critical results
    critical_text: Option<String>,

    /// GM-only visibility flag
    is_hidden: bool,
    /// Display ordering among a node's checks
    sort_order: i64,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NodeCheck {
    pub fn new(
        node_id: NodeId,
        kind: CheckKind,
        success_text: impl Into<String>,
        failure_text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        kind.validate()?;
        let success_text = success_text.into();
        let failure_text = failure_text.into();
        if success_text.trim().is_empty() {
            return Err(DomainError::validation("Check success text cannot be empty"));
        }
        if failure_text.trim().is_empty() {
            return Err(DomainError::validation("Check failure text cannot be empty"));
        }
        Ok(Self {
            id: CheckId::new(),
            node_id,
            kind,
            success_text,
            failure_text,
            critical_text: None,
            is_hidden: false,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        })
    }

    // Read accessors
    pub fn id(&self) -> CheckId {
        self.id
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn kind(&self) -> &CheckKind {
        &self.kind
    }

    pub fn success_text(&self) -> &str {
        &self.success_text
    }

    pub fn failure_text(&self) -> &str {
        &self.failure_text
    }

    pub fn critical_text(&self) -> Option<&str> {
        self.critical_text.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    pub fn sort_order(&self) -> i64 {
        self.sort_order
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Builder methods
    pub fn with_critical_text(mut self, text: impl Into<String>) -> Self {
        self.critical_text = Some(text.into());
        self
    }

    pub fn with_hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    // Setter methods
    pub fn set_kind(&mut self, kind: CheckKind, now: DateTime<Utc>) -> Result<(), DomainError> {
        kind.validate()?;
        self.kind = kind;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_outcomes(
        &mut self,
        success_text: impl Into<String>,
        failure_text: impl Into<String>,
        critical_text: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let success_text = success_text.into();
        let failure_text = failure_text.into();
        if success_text.trim().is_empty() {
            return Err(DomainError::validation("Check success text cannot be empty"));
        }
        if failure_text.trim().is_empty() {
            return Err(DomainError::validation("Check failure text cannot be empty"));
        }
        self.success_text = success_text;
        self.failure_text = failure_text;
        self.critical_text = critical_text;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_hidden(&mut self, is_hidden: bool, now: DateTime<Utc>) {
        self.is_hidden = is_hidden;
        self.updated_at = now;
    }

    pub fn set_sort_order(&mut self, sort_order: i64, now: DateTime<Utc>) {
        self.sort_order = sort_order;
        self.updated_at = now;
    }

    /// Reconstruct a NodeCheck from stored parts.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: CheckId,
        node_id: NodeId,
        kind: CheckKind,
        success_text: String,
        failure_text: String,
        critical_text: Option<String>,
        is_hidden: bool,
        sort_order: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            node_id,
            kind,
            success_text,
            failure_text,
            critical_text,
            is_hidden,
            sort_order,
            created_at,
            updated_at,
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

    fn ability_kind() -> CheckKind {
        CheckKind::Ability {
            skill: "Perception".to_string(),
            dc: 15,
        }
    }

    #[test]
    fn test_new() {
        let node_id = NodeId::new();
        let check = NodeCheck::new(
            node_id,
            ability_kind(),
            "They spot the tripwire",
            "The trap springs",
            test_now(),
        )
        .expect("valid check");

        assert_eq!(check.node_id(), node_id);
        assert_eq!(check.kind().check_type(), "ability");
        assert_eq!(check.success_text(), "They spot the tripwire");
        assert_eq!(check.failure_text(), "The trap springs");
        assert_eq!(check.critical_text(), None);
        assert!(!check.is_hidden());
        assert_eq!(check.sort_order(), 0);
    }

    #[test]
    fn test_new_rejects_empty_outcome_text() {
        let node_id = NodeId::new();
        assert!(NodeCheck::new(node_id, ability_kind(), "", "fail", test_now()).is_err());
        assert!(NodeCheck::new(node_id, ability_kind(), "ok", " ", test_now()).is_err());
    }

    #[test]
    fn test_kind_validation() {
        let node_id = NodeId::new();
        let empty_skill = CheckKind::Ability {
            skill: String::new(),
            dc: 10,
        };
        assert!(NodeCheck::new(node_id, empty_skill, "ok", "fail", test_now()).is_err());

        let empty_condition = CheckKind::Condition {
            text: "  ".to_string(),
        };
        assert!(NodeCheck::new(node_id, empty_condition, "ok", "fail", test_now()).is_err());
    }

    #[test]
    fn test_condition_has_no_dc() {
        let check = NodeCheck::new(
            NodeId::new(),
            CheckKind::Condition {
                text: "The guard was bribed earlier".to_string(),
            },
            "He waves them through",
            "He raises the alarm",
            test_now(),
        )
        .expect("valid check");

        assert_eq!(check.kind().check_type(), "condition");
    }

    #[test]
    fn test_set_outcomes() {
        let now = test_now();
        let mut check =
            NodeCheck::new(NodeId::new(), ability_kind(), "ok", "fail", now).expect("valid check");

        let later = now + chrono::Duration::seconds(1);
        check
            .set_outcomes("better", "worse", Some("nat 20: perfect".to_string()), later)
            .expect("valid outcomes");

        assert_eq!(check.success_text(), "better");
        assert_eq!(check.failure_text(), "worse");
        assert_eq!(check.critical_text(), Some("nat 20: perfect"));
        assert_eq!(check.updated_at(), later);

        assert!(check.set_outcomes("", "worse", None, later).is_err());
    }

    #[test]
    fn test_builders() {
        let check = NodeCheck::new(NodeId::new(), ability_kind(), "ok", "fail", test_now())
            .expect("valid check")
            .with_critical_text("nat 1: disaster")
            .with_hidden(true)
            .with_sort_order(3);

        assert_eq!(check.critical_text(), Some("nat 1: disaster"));
        assert!(check.is_hidden());
        assert_eq!(check.sort_order(), 3);
    }
}
