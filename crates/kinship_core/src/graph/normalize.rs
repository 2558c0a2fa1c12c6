//! Relation normalizer.
//!
//! # Responsibility
//! - Mirror every edge onto its other endpoint.
//! - Drop edges whose target has no record.
//!
//! # Invariants
//! - Postcondition: spouse, parent/child and sibling edges are symmetric
//!   among present members.
//! - Idempotent: a second run returns an empty `StoreChange`.

use crate::graph::store::{MemberStore, NameId, StoreChange};
use crate::model::member::Relation;
use log::debug;

/// Makes every relation in `store` symmetric and free of dangling targets.
pub fn normalize(store: &mut MemberStore) -> StoreChange {
    let members = store.member_ids();
    let mut mirrored: Vec<(NameId, Relation, NameId)> = Vec::new();
    let mut dropped: Vec<(NameId, Relation, NameId)> = Vec::new();

    for &owner in &members {
        let Some(slot) = store.slot(owner) else {
            continue;
        };
        for relation in Relation::ALL {
            for &target in slot.relations.get(relation) {
                if target == owner || !store.exists(target) {
                    dropped.push((owner, relation, target));
                } else {
                    mirrored.push((target, relation.inverse(), owner));
                }
            }
        }
    }

    let mut change = StoreChange::default();
    for (target, relation, owner) in mirrored {
        if let Some(slot) = store.slot_mut(target) {
            if slot.relations.get_mut(relation).insert(owner) {
                change.edges_added += 1;
            }
        }
    }
    for (owner, relation, target) in dropped {
        if let Some(slot) = store.slot_mut(owner) {
            if slot.relations.get_mut(relation).remove(&target) {
                change.edges_removed += 1;
            }
        }
    }

    debug!(
        "event=graph_normalize module=graph status=ok members={} edges_added={} dangling_dropped={}",
        members.len(),
        change.edges_added,
        change.edges_removed
    );
    change
}

#[cfg(test)]
mod tests {
    use super::normalize;
    use crate::graph::store::MemberStore;
    use crate::model::member::FamilyMember;

    #[test]
    fn dangling_targets_are_dropped_from_the_source() {
        let mut ann = FamilyMember::new("Ann");
        ann.parents = vec!["Ghost".to_string(), "Bob".to_string()];
        let store_members = vec![ann, FamilyMember::new("Bob")];
        let mut store = MemberStore::from_members(store_members);

        let change = normalize(&mut store);
        assert_eq!(change.edges_removed, 1);
        assert_eq!(store.get("Ann").unwrap().parents, vec!["Bob"]);
        assert_eq!(store.get("Bob").unwrap().children, vec!["Ann"]);
    }
}
