//! Family tree use-case service.
//!
//! # Responsibility
//! - Validate edits at the boundary (blank and duplicate names).
//! - Re-run the consistency pipeline after every mutation.
//! - Answer the two render queries (full tree, focused neighborhood).
//!
//! # Invariants
//! - The service owns exactly one `MemberStore`; callers get snapshots.
//! - After any successful mutation the store is normalized and leveled.

use crate::graph::{
    all_levels, connected_family_of, rebuild, unplaced_members, MemberStore, StoreChange,
    StoreError,
};
use crate::import::bulk_text::{export_bulk_text, merge_bulk_text};
use crate::import::snapshot::{append_snapshot, export_snapshot, load_snapshot, SnapshotError};
use crate::model::level_group::LevelGroup;
use crate::model::member::{normalize_member_name, FamilyMember, MemberId};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tunables for the consistency pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyOptions {
    /// Add sibling edges between members with identical parent sets.
    pub infer_siblings: bool,
}

impl Default for FamilyOptions {
    fn default() -> Self {
        Self {
            infer_siblings: true,
        }
    }
}

/// Errors from family service operations.
#[derive(Debug)]
pub enum FamilyServiceError {
    /// Name is blank after trim.
    InvalidName,
    /// Another member already uses this name.
    DuplicateName(String),
    /// No member with this name.
    MemberNotFound(String),
    /// No member with this id.
    UnknownMember(MemberId),
    /// Snapshot could not be decoded or encoded.
    Snapshot(SnapshotError),
}

impl Display for FamilyServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "member name must not be blank"),
            Self::DuplicateName(name) => write!(f, "a member named `{name}` already exists"),
            Self::MemberNotFound(name) => write!(f, "member not found: `{name}`"),
            Self::UnknownMember(id) => write!(f, "member not found: {id}"),
            Self::Snapshot(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FamilyServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for FamilyServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::BlankName => Self::InvalidName,
            StoreError::DuplicateName(name) => Self::DuplicateName(name),
            StoreError::NotFound(name) => Self::MemberNotFound(name),
            StoreError::UnknownId(id) | StoreError::DuplicateId(id) => Self::UnknownMember(id),
        }
    }
}

impl From<SnapshotError> for FamilyServiceError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

pub type FamilyResult<T> = Result<T, FamilyServiceError>;

/// Use-case facade over one member store.
#[derive(Debug, Clone, Default)]
pub struct FamilyService {
    store: MemberStore,
    options: FamilyOptions,
}

impl FamilyService {
    pub fn new(options: FamilyOptions) -> Self {
        Self {
            store: MemberStore::new(),
            options,
        }
    }

    /// Adopts an existing store and brings it to a consistent state.
    pub fn with_store(store: MemberStore, options: FamilyOptions) -> Self {
        let mut service = Self { store, options };
        service.refresh();
        service
    }

    pub fn store(&self) -> &MemberStore {
        &self.store
    }

    pub fn into_store(self) -> MemberStore {
        self.store
    }

    pub fn options(&self) -> FamilyOptions {
        self.options
    }

    /// Normalize, optionally infer siblings, then reassign levels.
    pub fn refresh(&mut self) -> StoreChange {
        rebuild(&mut self.store, self.options.infer_siblings)
    }

    /// Creates one member without relations.
    ///
    /// # Errors
    /// - `InvalidName` for blank input.
    /// - `DuplicateName` when the trimmed name is taken.
    pub fn create_member(
        &mut self,
        name: &str,
        gender: Option<String>,
        image_reference: Option<String>,
    ) -> FamilyResult<MemberId> {
        let name = normalize_member_name(name).ok_or(FamilyServiceError::InvalidName)?;
        if self.store.contains(&name) {
            return Err(FamilyServiceError::DuplicateName(name));
        }

        let mut member = FamilyMember::new(name);
        member.gender = gender;
        member.image_reference = image_reference;
        self.store.insert(&member)?;
        self.refresh();

        info!("event=member_create module=service status=ok id={}", member.id);
        Ok(member.id)
    }

    /// Replaces one member's editable fields by id, renaming when needed.
    pub fn update_member(&mut self, member: &FamilyMember) -> FamilyResult<StoreChange> {
        let mut change = self.store.replace(member)?;
        change.absorb(self.refresh());
        info!(
            "event=member_update module=service status=ok id={} renamed={}",
            member.id,
            !change.renamed.is_empty()
        );
        Ok(change)
    }

    /// Deletes one member and every edge pointing at it.
    pub fn delete_member(&mut self, name: &str) -> FamilyResult<StoreChange> {
        let mut change = self.store.remove(name)?;
        change.absorb(self.refresh());
        info!(
            "event=member_delete module=service status=ok edges_removed={}",
            change.edges_removed
        );
        Ok(change)
    }

    /// Removes every member.
    pub fn clear_all(&mut self) -> StoreChange {
        let change = self.store.clear();
        info!(
            "event=store_clear module=service status=ok removed={}",
            change.removed.len()
        );
        change
    }

    pub fn import_bulk_text(&mut self, text: &str) -> StoreChange {
        merge_bulk_text(&mut self.store, text, self.options.infer_siblings)
    }

    pub fn load_snapshot(&mut self, json: &str) -> FamilyResult<StoreChange> {
        Ok(load_snapshot(
            &mut self.store,
            json,
            self.options.infer_siblings,
        )?)
    }

    pub fn append_snapshot(&mut self, json: &str) -> FamilyResult<StoreChange> {
        Ok(append_snapshot(
            &mut self.store,
            json,
            self.options.infer_siblings,
        )?)
    }

    pub fn export_snapshot(&self) -> FamilyResult<String> {
        Ok(export_snapshot(&self.store)?)
    }

    pub fn export_bulk_text(&self) -> String {
        export_bulk_text(&self.store)
    }

    /// Full tree grouped by generation.
    pub fn all_levels(&self) -> Vec<LevelGroup> {
        all_levels(&self.store)
    }

    /// Members the full tree cannot place (parent cycles).
    pub fn unplaced_members(&self) -> Vec<FamilyMember> {
        unplaced_members(&self.store)
    }

    /// Bounded neighborhood around the member with `focus_id`.
    pub fn connected_family_of(&self, focus_id: MemberId) -> FamilyResult<Vec<LevelGroup>> {
        let focus = self
            .store
            .name_of_id(focus_id)
            .ok_or(FamilyServiceError::UnknownMember(focus_id))?;
        Ok(connected_family_of(&self.store, focus))
    }
}
