//! Focus-relative generation offsets.

use crate::graph::store::{MemberStore, NameId};
use crate::model::member::Relation;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

const STEPS: [(Relation, i32); 4] = [
    (Relation::Parent, -1),
    (Relation::Child, 1),
    (Relation::Sibling, 0),
    (Relation::Spouse, 0),
];

/// Breadth-first generation offsets of everything reachable from `start`.
///
/// `start` is 0, parents are -1, children +1, siblings and spouses keep
/// the level. The first offset reached wins. Unknown `start` yields an
/// empty map.
pub fn relative_levels(store: &MemberStore, start: &str) -> BTreeMap<String, i32> {
    let Some(start) = store.resolve(start) else {
        return BTreeMap::new();
    };
    relative_levels_from(store, start)
        .into_iter()
        .map(|(id, level)| (store.name_of(id).to_string(), level))
        .collect()
}

pub(crate) fn relative_levels_from(store: &MemberStore, start: NameId) -> HashMap<NameId, i32> {
    let mut levels = HashMap::new();
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0)]);

    while let Some((current, level)) = queue.pop_front() {
        levels.insert(current, level);
        for (relation, delta) in STEPS {
            for next in store.related(current, relation) {
                if visited.insert(next) {
                    queue.push_back((next, level + delta));
                }
            }
        }
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::relative_levels;
    use crate::graph::normalize::normalize;
    use crate::graph::store::MemberStore;
    use crate::model::member::FamilyMember;

    #[test]
    fn parent_cycle_terminates() {
        let mut ann = FamilyMember::new("Ann");
        ann.parents = vec!["Bob".to_string()];
        let mut bob = FamilyMember::new("Bob");
        bob.parents = vec!["Ann".to_string()];
        let mut store = MemberStore::from_members(vec![ann, bob]);
        normalize(&mut store);

        let levels = relative_levels(&store, "Ann");
        assert_eq!(levels.len(), 2);
        assert_eq!(levels["Ann"], 0);
        assert_eq!(levels["Bob"], -1);
    }

    #[test]
    fn unknown_start_is_empty() {
        let store = MemberStore::new();
        assert!(relative_levels(&store, "Nobody").is_empty());
    }
}
