//! JSON snapshot load/append/export.
//!
//! # Responsibility
//! - Read and write the member array exchanged with snapshot files.
//! - Implement replace (`load`) and merge-by-id (`append`) semantics.
//!
//! # Invariants
//! - Both imports invalidate levels and re-run the consistency pipeline.
//! - `load` keeps the last record per id, then the last record per name.
//! - `append` never removes relations from existing records.

use crate::graph::{rebuild, MemberStore, StoreChange};
use crate::model::member::{normalize_member_name, FamilyMember, MemberId};
use log::{info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors from snapshot decoding and encoding.
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid family snapshot: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Decodes a snapshot into records, keeping the last record per id.
pub fn parse_snapshot(json: &str) -> SnapshotResult<Vec<FamilyMember>> {
    let records: Vec<FamilyMember> = serde_json::from_str(json)?;
    let mut positions: HashMap<MemberId, usize> = HashMap::new();
    let mut unique: Vec<FamilyMember> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(&record.id) {
            Some(&position) => unique[position] = record,
            None => {
                positions.insert(record.id, unique.len());
                unique.push(record);
            }
        }
    }
    Ok(unique)
}

/// Replaces the whole store with the snapshot content.
pub fn load_snapshot(
    store: &mut MemberStore,
    json: &str,
    infer: bool,
) -> SnapshotResult<StoreChange> {
    let records = parse_snapshot(json)?;

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut latest: Vec<&FamilyMember> = Vec::with_capacity(records.len());
    for record in &records {
        let Some(name) = normalize_member_name(&record.name) else {
            warn!("event=snapshot_load module=import status=skipped reason=blank_name");
            continue;
        };
        match positions.get(&name) {
            Some(&position) => latest[position] = record,
            None => {
                positions.insert(name, latest.len());
                latest.push(record);
            }
        }
    }

    let mut fresh = MemberStore::new();
    let mut change = StoreChange::default();
    for record in latest {
        match fresh.insert(record) {
            Ok(inserted) => change.absorb(inserted),
            Err(err) => warn!(
                "event=snapshot_load module=import status=skipped reason={}",
                err
            ),
        }
    }

    let previous = std::mem::replace(store, fresh);
    change.removed = previous
        .names()
        .into_iter()
        .filter(|name| !store.contains(name))
        .map(str::to_string)
        .collect();
    store.invalidate_levels();
    change.absorb(rebuild(store, infer));

    info!(
        "event=snapshot_load module=import status=ok records={} members={}",
        records.len(),
        store.len()
    );
    Ok(change)
}

/// Merges snapshot records into the store by id.
pub fn append_snapshot(
    store: &mut MemberStore,
    json: &str,
    infer: bool,
) -> SnapshotResult<StoreChange> {
    let records = parse_snapshot(json)?;
    let mut change = StoreChange::default();
    for record in &records {
        match store.merge_by_id(record) {
            Ok(merged) => change.absorb(merged),
            Err(err) => warn!(
                "event=snapshot_append module=import status=skipped reason={}",
                err
            ),
        }
    }
    change.absorb(store.invalidate_levels());
    change.absorb(rebuild(store, infer));

    info!(
        "event=snapshot_append module=import status=ok records={} members={}",
        records.len(),
        store.len()
    );
    Ok(change)
}

/// Encodes the store as a pretty-printed member array sorted by name.
pub fn export_snapshot(store: &MemberStore) -> SnapshotResult<String> {
    Ok(serde_json::to_string_pretty(&store.members())?)
}
