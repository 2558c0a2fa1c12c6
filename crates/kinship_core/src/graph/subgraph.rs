//! Focus-centered neighborhood extraction.
//!
//! # Responsibility
//! - Pick the members visible around a focused person.
//! - Convert focus-relative offsets into non-negative display levels.
//!
//! # Invariants
//! - Ancestors stop at `MAX_ANCESTOR_DEPTH` generations above the focus.
//! - Descendants are unbounded; a visited set makes diamonds and cycles
//!   finite.

use crate::graph::display::group_levels;
use crate::graph::relative::relative_levels_from;
use crate::graph::store::{MemberStore, NameId};
use crate::model::level_group::LevelGroup;
use crate::model::member::Relation;
use log::debug;
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Generations above the focus shown in the neighborhood view.
pub const MAX_ANCESTOR_DEPTH: usize = 2;

/// Display-ordered neighborhood of `focus`. Unknown focus yields no groups.
pub fn connected_family_of(store: &MemberStore, focus: &str) -> Vec<LevelGroup> {
    let Some(focus_id) = store.resolve(focus) else {
        return Vec::new();
    };
    let placement = place_neighborhood(store, focus_id);
    group_levels(store, placement, Some(store.name_of(focus_id)))
}

/// Neighborhood members with their normalized levels, keyed by name.
pub fn connected_members(store: &MemberStore, focus: &str) -> BTreeMap<String, u32> {
    let Some(focus_id) = store.resolve(focus) else {
        return BTreeMap::new();
    };
    place_neighborhood(store, focus_id)
        .into_iter()
        .map(|(id, level)| (store.name_of(id).to_string(), level))
        .collect()
}

fn place_neighborhood(store: &MemberStore, focus: NameId) -> Vec<(NameId, u32)> {
    let collected = collect_neighborhood(store, focus);
    let relative = relative_levels_from(store, focus);

    let placed = collected
        .iter()
        .filter_map(|id| relative.get(id).map(|level| (*id, *level)))
        .collect::<Vec<_>>();
    let Some(min_level) = placed.iter().map(|(_, level)| *level).min() else {
        return Vec::new();
    };

    debug!(
        "event=graph_neighborhood module=graph status=ok collected={} placed={}",
        collected.len(),
        placed.len()
    );
    placed
        .into_iter()
        .map(|(id, level)| (id, level.abs_diff(min_level)))
        .collect()
}

fn collect_neighborhood(store: &MemberStore, focus: NameId) -> HashSet<NameId> {
    let mut collected = HashSet::from([focus]);
    collected.extend(store.related(focus, Relation::Spouse));
    collected.extend(store.related(focus, Relation::Sibling));

    let mut seen = HashSet::new();
    let mut queue = store
        .related(focus, Relation::Parent)
        .into_iter()
        .map(|parent| (parent, 1))
        .collect::<VecDeque<_>>();
    while let Some((ancestor, depth)) = queue.pop_front() {
        if !seen.insert(ancestor) {
            continue;
        }
        collected.insert(ancestor);
        collected.extend(store.related(ancestor, Relation::Spouse));
        if depth < MAX_ANCESTOR_DEPTH {
            for parent in store.related(ancestor, Relation::Parent) {
                queue.push_back((parent, depth + 1));
            }
        }
    }

    let mut visited = HashSet::from([focus]);
    let mut pending = vec![focus];
    while let Some(current) = pending.pop() {
        for child in store.related(current, Relation::Child) {
            if visited.insert(child) {
                collected.insert(child);
                collected.extend(store.related(child, Relation::Spouse));
                pending.push(child);
            }
        }
    }

    collected
}
