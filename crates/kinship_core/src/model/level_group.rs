//! Render-ready generation bucket.

use crate::model::member::FamilyMember;
use serde::Serialize;

/// Members sharing one generation, already in display order.
///
/// Computed per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelGroup {
    pub level: u32,
    pub members: Vec<FamilyMember>,
}

impl LevelGroup {
    /// Member names in display order.
    pub fn names(&self) -> Vec<&str> {
        self.members
            .iter()
            .map(|member| member.name.as_str())
            .collect()
    }
}
