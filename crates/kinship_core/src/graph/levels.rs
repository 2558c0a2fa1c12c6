//! Absolute generation levels.
//!
//! # Responsibility
//! - Assign stored levels with the two-pass fixed point (parents, then
//!   siblings/spouses).
//! - Build the full-tree level view by descending from parentless roots.
//!
//! # Invariants
//! - Both computations terminate: every loop iteration either places a
//!   member or stops.
//! - Members in parent cycles unreachable from a root stay unplaced; this
//!   is not an error.

use crate::graph::display::group_levels;
use crate::graph::store::{MemberStore, NameId, StoreChange};
use crate::model::level_group::LevelGroup;
use crate::model::member::{FamilyMember, Relation};
use log::debug;
use std::collections::{HashMap, VecDeque};

/// Recomputes the stored level of every member.
///
/// Roots get 0; a member takes `level + 1` of its first placed parent in
/// name order. Leftovers adopt the level of a placed sibling, else spouse.
pub fn assign_levels(store: &mut MemberStore) -> StoreChange {
    let members = store.member_ids();
    let mut levels: HashMap<NameId, u32> = HashMap::with_capacity(members.len());

    loop {
        let mut progressed = false;
        for &id in &members {
            if levels.contains_key(&id) {
                continue;
            }
            let parents = store.related(id, Relation::Parent);
            let level = if parents.is_empty() {
                Some(0)
            } else {
                parents
                    .iter()
                    .find_map(|parent| levels.get(parent).map(|level| level + 1))
            };
            if let Some(level) = level {
                levels.insert(id, level);
                progressed = true;
            }
        }
        if !progressed || levels.len() == members.len() {
            break;
        }
    }

    while spread_laterally(store, &members, &mut levels) {}

    let mut change = StoreChange::default();
    for &id in &members {
        let level = levels.get(&id).copied();
        if let Some(slot) = store.slot_mut(id) {
            if slot.level != level {
                slot.level = level;
                change.levels_changed += 1;
            }
        }
    }

    debug!(
        "event=graph_assign_levels module=graph status=ok members={} assigned={} levels_changed={}",
        members.len(),
        levels.len(),
        change.levels_changed
    );
    change
}

/// Full-tree level groups, independent of stored levels.
///
/// Descends from parentless roots; members reached only sideways take the
/// level of a placed sibling or spouse and keep descending from there.
/// Members never reached are left out (see [`unplaced_members`]).
pub fn all_levels(store: &MemberStore) -> Vec<LevelGroup> {
    group_levels(store, place_full_tree(store), None)
}

/// Members the full-tree view cannot place, sorted by name.
pub fn unplaced_members(store: &MemberStore) -> Vec<FamilyMember> {
    let placed = place_full_tree(store);
    store
        .member_ids()
        .into_iter()
        .filter(|id| !placed.contains_key(id))
        .map(|id| store.materialize(id))
        .collect()
}

fn place_full_tree(store: &MemberStore) -> HashMap<NameId, u32> {
    let members = store.member_ids();
    let mut levels = HashMap::with_capacity(members.len());
    let mut queue = VecDeque::new();

    for &id in &members {
        if store.related(id, Relation::Parent).is_empty() {
            levels.insert(id, 0);
            queue.push_back(id);
        }
    }
    descend(store, &mut levels, &mut queue);

    loop {
        let before = levels.len();
        if !spread_laterally(store, &members, &mut levels) {
            break;
        }
        queue.extend(
            members
                .iter()
                .copied()
                .filter(|id| levels.contains_key(id)),
        );
        descend(store, &mut levels, &mut queue);
        if levels.len() == before {
            break;
        }
    }

    levels
}

fn descend(store: &MemberStore, levels: &mut HashMap<NameId, u32>, queue: &mut VecDeque<NameId>) {
    while let Some(current) = queue.pop_front() {
        let Some(&level) = levels.get(&current) else {
            continue;
        };
        for child in store.related(current, Relation::Child) {
            if !levels.contains_key(&child) {
                levels.insert(child, level + 1);
                queue.push_back(child);
            }
        }
    }
}

/// One lateral sweep; returns whether any member was placed.
fn spread_laterally(
    store: &MemberStore,
    members: &[NameId],
    levels: &mut HashMap<NameId, u32>,
) -> bool {
    let mut progressed = false;
    for &id in members {
        if levels.contains_key(&id) {
            continue;
        }
        let adopted = [Relation::Sibling, Relation::Spouse]
            .into_iter()
            .find_map(|relation| {
                store
                    .related(id, relation)
                    .iter()
                    .find_map(|peer| levels.get(peer).copied())
            });
        if let Some(level) = adopted {
            levels.insert(id, level);
            progressed = true;
        }
    }
    progressed
}

#[cfg(test)]
mod tests {
    use super::{all_levels, assign_levels, unplaced_members};
    use crate::graph::normalize::normalize;
    use crate::graph::store::MemberStore;
    use crate::model::member::FamilyMember;

    fn member(name: &str, parents: &[&str], spouses: &[&str]) -> FamilyMember {
        let mut member = FamilyMember::new(name);
        member.parents = parents.iter().map(|value| value.to_string()).collect();
        member.spouses = spouses.iter().map(|value| value.to_string()).collect();
        member
    }

    #[test]
    fn lateral_placement_keeps_descending_in_full_tree() {
        let mut store = MemberStore::from_members(vec![
            member("Ann", &["Bob"], &[]),
            member("Bob", &["Ann"], &[]),
            member("X", &["Ann"], &["Solo"]),
            member("Solo", &[], &[]),
            member("Kid", &["X"], &[]),
        ]);
        normalize(&mut store);

        let groups = all_levels(&store);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].names(), vec!["Solo", "X"]);
        assert_eq!(groups[1].names(), vec!["Kid"]);

        assign_levels(&mut store);
        assert_eq!(store.level_of("X"), Some(0));
        assert_eq!(store.level_of("Kid"), None);
    }

    #[test]
    fn parent_cycle_stays_unassigned() {
        let mut ann = FamilyMember::new("Ann");
        ann.parents = vec!["Bob".to_string()];
        let mut bob = FamilyMember::new("Bob");
        bob.parents = vec!["Ann".to_string()];
        let mut store = MemberStore::from_members(vec![ann, bob, FamilyMember::new("Solo")]);
        normalize(&mut store);

        assign_levels(&mut store);
        assert_eq!(store.level_of("Ann"), None);
        assert_eq!(store.level_of("Bob"), None);
        assert_eq!(store.level_of("Solo"), Some(0));

        let groups = all_levels(&store);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].names(), vec!["Solo"]);
        let unplaced = unplaced_members(&store);
        assert_eq!(unplaced.len(), 2);
    }
}
