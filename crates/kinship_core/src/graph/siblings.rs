//! Sibling inference from shared parent sets.

use crate::graph::store::{MemberStore, NameId, StoreChange};
use crate::model::member::Relation;
use log::debug;
use std::collections::BTreeMap;

/// Members grouped by identical, non-empty parent signature.
///
/// Groups are ordered by signature; names inside a group alphabetically.
pub fn sibling_groups(store: &MemberStore) -> Vec<Vec<String>> {
    parent_groups(store)
        .into_values()
        .map(|group| {
            group
                .into_iter()
                .map(|id| store.name_of(id).to_string())
                .collect()
        })
        .collect()
}

/// Adds sibling edges between members that share the exact same parents.
///
/// Additive only: existing sibling edges are never removed.
pub fn infer_siblings(store: &mut MemberStore) -> StoreChange {
    let groups = parent_groups(store);
    let mut change = StoreChange::default();

    for group in groups.values().filter(|group| group.len() > 1) {
        for &member in group {
            let Some(slot) = store.slot_mut(member) else {
                continue;
            };
            for &other in group.iter().filter(|other| **other != member) {
                if slot.relations.get_mut(Relation::Sibling).insert(other) {
                    change.edges_added += 1;
                }
            }
        }
    }

    debug!(
        "event=graph_infer_siblings module=graph status=ok groups={} edges_added={}",
        groups.len(),
        change.edges_added
    );
    change
}

fn parent_groups(store: &MemberStore) -> BTreeMap<String, Vec<NameId>> {
    let mut groups: BTreeMap<String, Vec<NameId>> = BTreeMap::new();
    for id in store.member_ids() {
        let signature = store.parent_signature(id);
        if signature.is_empty() {
            continue;
        }
        groups.entry(signature).or_default().push(id);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::sibling_groups;
    use crate::graph::normalize::normalize;
    use crate::graph::store::MemberStore;
    use crate::model::member::FamilyMember;

    fn child(name: &str, parents: &[&str]) -> FamilyMember {
        let mut member = FamilyMember::new(name);
        member.parents = parents.iter().map(|value| value.to_string()).collect();
        member
    }

    #[test]
    fn groups_are_ordered_by_joined_parent_names() {
        let mut store = MemberStore::from_members(vec![
            FamilyMember::new("Ann"),
            FamilyMember::new("Bob"),
            FamilyMember::new("Ann Z"),
            child("Kim", &["Bob", "Ann"]),
            child("Lou", &["Ann Z"]),
        ]);
        normalize(&mut store);

        assert_eq!(
            sibling_groups(&store),
            vec![vec!["Lou".to_string()], vec!["Kim".to_string()]]
        );
    }
}
