//! Family member record.
//!
//! # Responsibility
//! - Define the canonical person record exchanged with import/export,
//!   persistence and the UI.
//! - Keep relation lists name-keyed on the wire, sorted for determinism.
//!
//! # Invariants
//! - `id` is stable and never reused for another member.
//! - `name` is non-blank and unique among current members.
//! - Relation lists never contain the member's own name.
//! - `level = None` means "generation not computed".

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Stable identifier for one family member.
pub type MemberId = Uuid;

/// One of the four relation lists carried by a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Parent,
    Spouse,
    Child,
    Sibling,
}

impl Relation {
    /// All relations in canonical order.
    pub const ALL: [Relation; 4] = [
        Relation::Parent,
        Relation::Spouse,
        Relation::Child,
        Relation::Sibling,
    ];

    /// Relation seen from the other endpoint of the edge.
    pub fn inverse(self) -> Relation {
        match self {
            Relation::Parent => Relation::Child,
            Relation::Child => Relation::Parent,
            Relation::Spouse => Relation::Spouse,
            Relation::Sibling => Relation::Sibling,
        }
    }
}

/// Person record as authored by the user or synthesized by import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    /// Assigned once at creation.
    pub id: MemberId,
    /// Primary key inside the member store.
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    /// Opaque reference to an attachment owned by the host application.
    #[serde(default)]
    pub image_reference: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub spouses: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub siblings: Vec<String>,
    /// Set for records synthesized by the system instead of the user.
    #[serde(default)]
    pub is_implicit: bool,
    /// Absolute generation. Older snapshots encode "unassigned" as `-1`.
    #[serde(default, deserialize_with = "deserialize_level")]
    pub level: Option<u32>,
}

impl FamilyMember {
    /// Creates a member with a generated stable ID and no relations.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a member with a caller-provided stable ID.
    ///
    /// Used by snapshot import where identity already exists.
    pub fn with_id(id: MemberId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            gender: None,
            image_reference: None,
            parents: Vec::new(),
            spouses: Vec::new(),
            children: Vec::new(),
            siblings: Vec::new(),
            is_implicit: false,
            level: None,
        }
    }

    /// Returns one relation list.
    pub fn relation(&self, relation: Relation) -> &[String] {
        match relation {
            Relation::Parent => &self.parents,
            Relation::Spouse => &self.spouses,
            Relation::Child => &self.children,
            Relation::Sibling => &self.siblings,
        }
    }

    /// Returns one relation list for mutation.
    pub fn relation_mut(&mut self, relation: Relation) -> &mut Vec<String> {
        match relation {
            Relation::Parent => &mut self.parents,
            Relation::Spouse => &mut self.spouses,
            Relation::Child => &mut self.children,
            Relation::Sibling => &mut self.siblings,
        }
    }

    /// Whether the member has a computed generation.
    pub fn has_level(&self) -> bool {
        self.level.is_some()
    }
}

/// Trims a candidate member name, rejecting blank input.
pub fn normalize_member_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| u32::try_from(value).ok()))
}

#[cfg(test)]
mod tests {
    use super::{normalize_member_name, FamilyMember, Relation};

    #[test]
    fn negative_wire_level_means_unassigned() {
        let value = serde_json::json!({
            "id": "11111111-2222-4333-8444-555555555555",
            "name": "Ada",
            "level": -1
        });
        let member: FamilyMember = serde_json::from_value(value).unwrap();
        assert_eq!(member.level, None);
        assert!(member.parents.is_empty());
        assert!(!member.is_implicit);
    }

    #[test]
    fn inverse_relations_pair_up() {
        for relation in Relation::ALL {
            assert_eq!(relation.inverse().inverse(), relation);
        }
        assert_eq!(Relation::Parent.inverse(), Relation::Child);
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(normalize_member_name("  "), None);
        assert_eq!(normalize_member_name(" Tom ").as_deref(), Some("Tom"));
    }
}
