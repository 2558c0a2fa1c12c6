//! Interned member store.
//!
//! # Responsibility
//! - Own every `FamilyMember` keyed by unique name.
//! - Intern names into a small arena so relation sets are index sets.
//! - Report every mutation as an explicit `StoreChange` value.
//!
//! # Invariants
//! - A `NameId` is never reused for a different name while it has a record.
//! - At most one record per name and per `MemberId`.
//! - Relation sets never contain their owner.
//! - Relation sets may point at interned names without a record (dangling)
//!   until the normalizer drops them.

use crate::model::member::{normalize_member_name, FamilyMember, MemberId, Relation};
use log::warn;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store mutations that cannot be absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Name is empty after trim.
    BlankName,
    /// Another member already uses this name.
    DuplicateName(String),
    /// Another member already uses this id.
    DuplicateId(MemberId),
    /// No member is stored under this name.
    NotFound(String),
    /// No member is stored with this id.
    UnknownId(MemberId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "member name must not be blank"),
            Self::DuplicateName(name) => write!(f, "member name already exists: `{name}`"),
            Self::DuplicateId(id) => write!(f, "member id already exists: {id}"),
            Self::NotFound(name) => write!(f, "member not found: `{name}`"),
            Self::UnknownId(id) => write!(f, "member not found: {id}"),
        }
    }
}

impl Error for StoreError {}

/// Interned name handle. Only meaningful for the store that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);

impl NameId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Relations {
    parents: BTreeSet<NameId>,
    spouses: BTreeSet<NameId>,
    children: BTreeSet<NameId>,
    siblings: BTreeSet<NameId>,
}

impl Relations {
    pub(crate) fn get(&self, relation: Relation) -> &BTreeSet<NameId> {
        match relation {
            Relation::Parent => &self.parents,
            Relation::Spouse => &self.spouses,
            Relation::Child => &self.children,
            Relation::Sibling => &self.siblings,
        }
    }

    pub(crate) fn get_mut(&mut self, relation: Relation) -> &mut BTreeSet<NameId> {
        match relation {
            Relation::Parent => &mut self.parents,
            Relation::Spouse => &mut self.spouses,
            Relation::Child => &mut self.children,
            Relation::Sibling => &mut self.siblings,
        }
    }

    fn edge_count(&self) -> usize {
        self.parents.len() + self.spouses.len() + self.children.len() + self.siblings.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemberSlot {
    pub(crate) id: MemberId,
    pub(crate) gender: Option<String>,
    pub(crate) image_reference: Option<String>,
    pub(crate) is_implicit: bool,
    pub(crate) level: Option<u32>,
    pub(crate) relations: Relations,
}

impl MemberSlot {
    fn from_record(member: &FamilyMember) -> Self {
        Self {
            id: member.id,
            gender: member.gender.clone(),
            image_reference: member.image_reference.clone(),
            is_implicit: member.is_implicit,
            level: member.level,
            relations: Relations::default(),
        }
    }
}

/// Change notification returned by mutating calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreChange {
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    /// `(old, new)` name pairs.
    pub renamed: Vec<(String, String)>,
    pub edges_added: usize,
    pub edges_removed: usize,
    pub levels_changed: usize,
}

impl StoreChange {
    /// Whether the call left the store untouched.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
            && self.updated.is_empty()
            && self.removed.is_empty()
            && self.renamed.is_empty()
            && self.edges_added == 0
            && self.edges_removed == 0
            && self.levels_changed == 0
    }

    /// Folds a later change into this one.
    pub fn absorb(&mut self, other: StoreChange) {
        self.inserted.extend(other.inserted);
        self.updated.extend(other.updated);
        self.removed.extend(other.removed);
        self.renamed.extend(other.renamed);
        self.edges_added += other.edges_added;
        self.edges_removed += other.edges_removed;
        self.levels_changed += other.levels_changed;
    }
}

/// Name-keyed member store; the single source of truth for the family graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberStore {
    names: Vec<String>,
    index: HashMap<String, NameId>,
    slots: Vec<Option<MemberSlot>>,
    ids: HashMap<MemberId, NameId>,
}

impl MemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from records, merging records that share a name.
    pub fn from_members(members: impl IntoIterator<Item = FamilyMember>) -> Self {
        let mut store = Self::new();
        for member in members {
            if store.merge_by_name(&member).is_err() {
                warn!("event=store_build module=graph status=skipped reason=blank_name");
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<FamilyMember> {
        self.resolve(name).map(|id| self.materialize(id))
    }

    pub fn get_by_id(&self, id: MemberId) -> Option<FamilyMember> {
        self.ids.get(&id).map(|name_id| self.materialize(*name_id))
    }

    /// Current name of the member with this id.
    pub fn name_of_id(&self, id: MemberId) -> Option<&str> {
        self.ids.get(&id).map(|name_id| self.name_of(*name_id))
    }

    pub fn level_of(&self, name: &str) -> Option<u32> {
        self.resolve(name)
            .and_then(|id| self.slot(id))
            .and_then(|slot| slot.level)
    }

    /// All members sorted by name.
    pub fn members(&self) -> Vec<FamilyMember> {
        self.member_ids()
            .into_iter()
            .map(|id| self.materialize(id))
            .collect()
    }

    /// All member names sorted alphabetically.
    pub fn names(&self) -> Vec<&str> {
        self.member_ids()
            .into_iter()
            .map(|id| self.name_of(id))
            .collect()
    }

    /// Inserts a new member.
    ///
    /// # Errors
    /// - `BlankName` when the trimmed name is empty.
    /// - `DuplicateName`/`DuplicateId` when either key is taken.
    pub fn insert(&mut self, member: &FamilyMember) -> StoreResult<StoreChange> {
        let name = normalize_member_name(&member.name).ok_or(StoreError::BlankName)?;
        if self.contains(&name) {
            return Err(StoreError::DuplicateName(name));
        }
        if self.ids.contains_key(&member.id) {
            return Err(StoreError::DuplicateId(member.id));
        }

        let owner = self.intern(&name);
        self.slots[owner.index()] = Some(MemberSlot::from_record(member));
        self.ids.insert(member.id, owner);
        let edges_added = self.add_relations(owner, member);

        Ok(StoreChange {
            inserted: vec![name],
            edges_added,
            ..StoreChange::default()
        })
    }

    /// Unions `member` into the record with the same name, creating it if absent.
    ///
    /// Existing relations are never removed and existing metadata is only
    /// filled where it was empty.
    pub fn merge_by_name(&mut self, member: &FamilyMember) -> StoreResult<StoreChange> {
        let name = normalize_member_name(&member.name).ok_or(StoreError::BlankName)?;
        let Some(owner) = self.resolve(&name) else {
            let mut record = member.clone();
            if self.ids.contains_key(&record.id) {
                record.id = Uuid::new_v4();
            }
            record.name = name;
            return self.insert(&record);
        };

        let mut metadata_changed = false;
        if let Some(slot) = self.slot_mut(owner) {
            if slot.gender.is_none() && member.gender.is_some() {
                slot.gender = member.gender.clone();
                metadata_changed = true;
            }
            if slot.image_reference.is_none() && member.image_reference.is_some() {
                slot.image_reference = member.image_reference.clone();
                metadata_changed = true;
            }
        }
        let edges_added = self.add_relations(owner, member);

        let mut change = StoreChange {
            edges_added,
            ..StoreChange::default()
        };
        if metadata_changed || edges_added > 0 {
            change.updated.push(name);
        }
        Ok(change)
    }

    /// Unions `member` into the record with the same id.
    ///
    /// The imported name wins unless another member already holds it.
    /// Imported metadata wins when present. An unknown id falls back to a
    /// merge by name.
    pub fn merge_by_id(&mut self, member: &FamilyMember) -> StoreResult<StoreChange> {
        let Some(owner) = self.ids.get(&member.id).copied() else {
            return self.merge_by_name(member);
        };
        let name = normalize_member_name(&member.name).ok_or(StoreError::BlankName)?;

        let mut change = StoreChange::default();
        let current = self.name_of(owner).to_string();
        if current != name {
            match self.rename(&current, &name) {
                Ok(renamed) => change.absorb(renamed),
                Err(err) => warn!(
                    "event=store_merge module=graph status=rename_skipped reason={}",
                    err
                ),
            }
        }

        let mut metadata_changed = false;
        if let Some(slot) = self.slot_mut(owner) {
            if member.gender.is_some() && slot.gender != member.gender {
                slot.gender = member.gender.clone();
                metadata_changed = true;
            }
            if member.image_reference.is_some() && slot.image_reference != member.image_reference
            {
                slot.image_reference = member.image_reference.clone();
                metadata_changed = true;
            }
        }
        let edges_added = self.add_relations(owner, member);
        change.edges_added += edges_added;
        if metadata_changed || edges_added > 0 {
            change.updated.push(self.name_of(owner).to_string());
        }
        Ok(change)
    }

    /// Replaces the record with `member.id` by `member`, renaming if needed.
    ///
    /// Relations missing from `member` are removed on both endpoints. The
    /// computed level is kept; only the level assigner writes levels.
    pub fn replace(&mut self, member: &FamilyMember) -> StoreResult<StoreChange> {
        let owner = *self
            .ids
            .get(&member.id)
            .ok_or(StoreError::UnknownId(member.id))?;
        let name = normalize_member_name(&member.name).ok_or(StoreError::BlankName)?;

        let mut change = StoreChange::default();
        let current = self.name_of(owner).to_string();
        if current != name {
            change.absorb(self.rename(&current, &name)?);
        }

        let previous = match self.slot_mut(owner) {
            Some(slot) => {
                slot.gender = member.gender.clone();
                slot.image_reference = member.image_reference.clone();
                slot.is_implicit = member.is_implicit;
                std::mem::take(&mut slot.relations)
            }
            None => Relations::default(),
        };
        self.add_relations(owner, member);

        // Dropped edges leave the counterpart as well.
        let current = self
            .slot(owner)
            .map(|slot| slot.relations.clone())
            .unwrap_or_default();
        for relation in Relation::ALL {
            let kept = current.get(relation);
            let old = previous.get(relation);
            change.edges_added += kept.difference(old).count();
            for &target in old.difference(kept) {
                change.edges_removed += 1;
                if let Some(slot) = self.slot_mut(target) {
                    if slot.relations.get_mut(relation.inverse()).remove(&owner) {
                        change.edges_removed += 1;
                    }
                }
            }
        }
        change.updated.push(name);
        Ok(change)
    }

    /// Renames a member while keeping every edge that points at it.
    ///
    /// Dangling references to `new_name` held by other members are rebound
    /// to the renamed member.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> StoreResult<StoreChange> {
        let owner = self
            .resolve(old_name)
            .ok_or_else(|| StoreError::NotFound(old_name.to_string()))?;
        let new_name = normalize_member_name(new_name).ok_or(StoreError::BlankName)?;
        let old_name = self.name_of(owner).to_string();
        if old_name == new_name {
            return Ok(StoreChange::default());
        }
        if self.contains(&new_name) {
            return Err(StoreError::DuplicateName(new_name));
        }

        if let Some(dangling) = self.index.remove(&new_name) {
            for slot in self.slots.iter_mut().flatten() {
                for relation in Relation::ALL {
                    let set = slot.relations.get_mut(relation);
                    if set.remove(&dangling) {
                        set.insert(owner);
                    }
                }
            }
            if let Some(slot) = self.slots[owner.index()].as_mut() {
                for relation in Relation::ALL {
                    slot.relations.get_mut(relation).remove(&owner);
                }
            }
        }

        self.index.remove(&old_name);
        self.index.insert(new_name.clone(), owner);
        self.names[owner.index()] = new_name.clone();

        Ok(StoreChange {
            renamed: vec![(old_name, new_name)],
            ..StoreChange::default()
        })
    }

    /// Removes a member and every edge pointing at it.
    pub fn remove(&mut self, name: &str) -> StoreResult<StoreChange> {
        let owner = self
            .resolve(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let removed_edges = self
            .slot(owner)
            .map_or(0, |slot| slot.relations.edge_count());
        if let Some(slot) = self.slots[owner.index()].take() {
            self.ids.remove(&slot.id);
        }

        let mut edges_removed = removed_edges;
        for slot in self.slots.iter_mut().flatten() {
            for relation in Relation::ALL {
                if slot.relations.get_mut(relation).remove(&owner) {
                    edges_removed += 1;
                }
            }
        }

        Ok(StoreChange {
            removed: vec![self.name_of(owner).to_string()],
            edges_removed,
            ..StoreChange::default()
        })
    }

    /// Removes every member and forgets all interned names.
    pub fn clear(&mut self) -> StoreChange {
        let removed = self
            .names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        *self = Self::new();
        StoreChange {
            removed,
            ..StoreChange::default()
        }
    }

    /// Resets every level to unassigned.
    pub fn invalidate_levels(&mut self) -> StoreChange {
        let mut levels_changed = 0;
        for slot in self.slots.iter_mut().flatten() {
            if slot.level.take().is_some() {
                levels_changed += 1;
            }
        }
        StoreChange {
            levels_changed,
            ..StoreChange::default()
        }
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<NameId> {
        self.index
            .get(name.trim())
            .copied()
            .filter(|id| self.slots[id.index()].is_some())
    }

    pub(crate) fn slot(&self, id: NameId) -> Option<&MemberSlot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn slot_mut(&mut self, id: NameId) -> Option<&mut MemberSlot> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub(crate) fn name_of(&self, id: NameId) -> &str {
        self.names[id.index()].as_str()
    }

    pub(crate) fn exists(&self, id: NameId) -> bool {
        self.slot(id).is_some()
    }

    /// Present members, ordered by name.
    pub(crate) fn member_ids(&self) -> Vec<NameId> {
        let mut ids = self.ids.values().copied().collect::<Vec<_>>();
        self.sort_by_name(&mut ids);
        ids
    }

    /// Present targets of one relation, ordered by name.
    pub(crate) fn related(&self, id: NameId, relation: Relation) -> Vec<NameId> {
        let mut targets = self
            .slot(id)
            .map(|slot| {
                slot.relations
                    .get(relation)
                    .iter()
                    .copied()
                    .filter(|target| self.exists(*target))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        self.sort_by_name(&mut targets);
        targets
    }

    /// Sorted names of present parents joined by `,`. Empty for parentless
    /// members.
    pub(crate) fn parent_signature(&self, id: NameId) -> String {
        self.related(id, Relation::Parent)
            .into_iter()
            .map(|parent| self.name_of(parent))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub(crate) fn sort_by_name(&self, ids: &mut [NameId]) {
        ids.sort_by(|left, right| self.name_of(*left).cmp(self.name_of(*right)));
    }

    pub(crate) fn materialize(&self, id: NameId) -> FamilyMember {
        let mut member = FamilyMember::with_id(Uuid::nil(), self.name_of(id));
        if let Some(slot) = self.slot(id) {
            member.id = slot.id;
            member.gender = slot.gender.clone();
            member.image_reference = slot.image_reference.clone();
            member.is_implicit = slot.is_implicit;
            member.level = slot.level;
            for relation in Relation::ALL {
                let mut names = slot
                    .relations
                    .get(relation)
                    .iter()
                    .map(|target| self.name_of(*target).to_string())
                    .collect::<Vec<_>>();
                names.sort();
                *member.relation_mut(relation) = names;
            }
        }
        member
    }

    fn intern(&mut self, name: &str) -> NameId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.slots.push(None);
        self.index.insert(name.to_string(), id);
        id
    }

    fn add_relations(&mut self, owner: NameId, member: &FamilyMember) -> usize {
        let mut added = 0;
        for relation in Relation::ALL {
            for raw in member.relation(relation) {
                let Some(name) = normalize_member_name(raw) else {
                    continue;
                };
                let target = self.intern(&name);
                if target == owner {
                    continue;
                }
                if let Some(slot) = self.slot_mut(owner) {
                    if slot.relations.get_mut(relation).insert(target) {
                        added += 1;
                    }
                }
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::{MemberStore, StoreError};
    use crate::model::member::FamilyMember;

    fn member(name: &str, parents: &[&str], spouses: &[&str]) -> FamilyMember {
        let mut member = FamilyMember::new(name);
        member.parents = parents.iter().map(|value| value.to_string()).collect();
        member.spouses = spouses.iter().map(|value| value.to_string()).collect();
        member
    }

    #[test]
    fn insert_rejects_duplicate_and_blank_names() {
        let mut store = MemberStore::new();
        store.insert(&member("Ann", &[], &[])).unwrap();

        let err = store.insert(&member("Ann", &[], &[])).unwrap_err();
        assert_eq!(err, StoreError::DuplicateName("Ann".to_string()));
        let err = store.insert(&member("   ", &[], &[])).unwrap_err();
        assert_eq!(err, StoreError::BlankName);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn self_references_are_stripped_on_write() {
        let mut store = MemberStore::new();
        let mut ann = member("Ann", &["Ann", "Bob"], &["Ann"]);
        ann.siblings = vec!["Ann".to_string()];
        store.insert(&ann).unwrap();

        let stored = store.get("Ann").unwrap();
        assert_eq!(stored.parents, vec!["Bob"]);
        assert!(stored.spouses.is_empty());
        assert!(stored.siblings.is_empty());
    }

    #[test]
    fn merge_by_name_unions_relations() {
        let mut store = MemberStore::new();
        store.insert(&member("Ann", &["Bob"], &[])).unwrap();

        let change = store
            .merge_by_name(&member("Ann", &["Cid", "Bob"], &["Dan"]))
            .unwrap();
        assert_eq!(change.edges_added, 2);
        assert_eq!(change.updated, vec!["Ann"]);

        let stored = store.get("Ann").unwrap();
        assert_eq!(stored.parents, vec!["Bob", "Cid"]);
        assert_eq!(stored.spouses, vec!["Dan"]);
    }

    #[test]
    fn rename_rebinds_dangling_references() {
        let mut store = MemberStore::new();
        store.insert(&member("Ann", &["Robert"], &[])).unwrap();
        store.insert(&member("Bob", &[], &[])).unwrap();

        store.rename("Bob", "Robert").unwrap();
        assert!(!store.contains("Bob"));
        assert_eq!(store.get("Ann").unwrap().parents, vec!["Robert"]);
        assert!(store.get("Robert").unwrap().parents.is_empty());
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = MemberStore::new();
        store.insert(&member("Ann", &[], &[])).unwrap();
        let change = store.clear();
        assert_eq!(change.removed, vec!["Ann"]);
        assert!(store.is_empty());
    }
}
