//! Level grouping and deterministic in-level ordering.
//!
//! # Responsibility
//! - Bucket placed members by level.
//! - Order each bucket so repeated renders of the same data are stable.
//!
//! # Invariants
//! - Output depends only on the member set and the optional focus.
//! - Every input member appears exactly once in the output.

use crate::graph::store::{MemberStore, NameId};
use crate::model::level_group::LevelGroup;
use crate::model::member::FamilyMember;
use std::collections::BTreeMap;

/// Orders one level for display.
///
/// 1. The focus, then its spouses present on this level.
/// 2. Couples: members with a spouse on this level, alphabetically, each
///    followed by those spouses.
/// 3. Everyone else grouped by parent set (groups ordered by parent
///    names), alphabetically inside a group.
pub fn sort_level_members(members: Vec<FamilyMember>, focus: Option<&str>) -> Vec<FamilyMember> {
    let mut remaining = members
        .into_iter()
        .map(|member| (member.name.clone(), member))
        .collect::<BTreeMap<_, _>>();
    let mut ordered = Vec::with_capacity(remaining.len());

    if let Some(focus) = focus.and_then(|name| remaining.remove(name)) {
        emit_with_spouses(focus, &mut remaining, &mut ordered);
    }

    let couple_heads = remaining
        .values()
        .filter(|member| {
            member
                .spouses
                .iter()
                .any(|spouse| remaining.contains_key(spouse))
        })
        .map(|member| member.name.clone())
        .collect::<Vec<_>>();
    for name in couple_heads {
        if let Some(member) = remaining.remove(&name) {
            emit_with_spouses(member, &mut remaining, &mut ordered);
        }
    }

    let mut by_parents: BTreeMap<String, Vec<FamilyMember>> = BTreeMap::new();
    for member in remaining.into_values() {
        by_parents
            .entry(parent_signature(&member))
            .or_default()
            .push(member);
    }
    ordered.extend(by_parents.into_values().flatten());
    ordered
}

fn emit_with_spouses(
    member: FamilyMember,
    remaining: &mut BTreeMap<String, FamilyMember>,
    ordered: &mut Vec<FamilyMember>,
) {
    let mut spouses = member.spouses.clone();
    spouses.sort();
    ordered.push(member);
    for spouse in spouses {
        if let Some(partner) = remaining.remove(&spouse) {
            ordered.push(partner);
        }
    }
}

fn parent_signature(member: &FamilyMember) -> String {
    let mut parents = member
        .parents
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>();
    parents.sort_unstable();
    parents.join(",")
}

/// Buckets placed members into display-ordered level groups.
pub(crate) fn group_levels(
    store: &MemberStore,
    placement: impl IntoIterator<Item = (NameId, u32)>,
    focus: Option<&str>,
) -> Vec<LevelGroup> {
    let mut buckets: BTreeMap<u32, Vec<FamilyMember>> = BTreeMap::new();
    for (id, level) in placement {
        buckets
            .entry(level)
            .or_default()
            .push(store.materialize(id));
    }

    buckets
        .into_iter()
        .map(|(level, members)| LevelGroup {
            level,
            members: sort_level_members(members, focus),
        })
        .collect()
}
