//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level family tree functions to Dart via FRB.
//! - Load the persisted store, apply one service call, save it back.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Load-modify-save cycles are serialized inside the process.
//! - Failures are reported as `ok=false` envelopes, never as panics.

use kinship_core::db::open_db;
use kinship_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    FamilyMember, FamilyOptions, FamilyService, LevelGroup, MemberRepository, StoreChange,
    SqliteMemberRepository,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

const FAMILY_DB_FILE_NAME: &str = "kinship_family.sqlite3";
static FAMILY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static FAMILY_DB_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for family edits and exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Member ID created or edited by the call, when any.
    pub member_id: Option<String>,
    /// Exported text for export calls.
    pub payload: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl FamilyActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            member_id: None,
            payload: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            member_id: None,
            payload: None,
            message: message.into(),
        }
    }
}

/// One member as shown inside a generation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyMemberItem {
    pub member_id: String,
    pub name: String,
    pub gender: Option<String>,
    pub image_reference: Option<String>,
    pub parents: Vec<String>,
    pub spouses: Vec<String>,
    pub children: Vec<String>,
    pub siblings: Vec<String>,
    pub is_implicit: bool,
}

/// One generation row in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyLevelRow {
    pub level: u32,
    pub members: Vec<FamilyMemberItem>,
}

/// Render response for the full tree and the focused neighborhood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyLevelsResponse {
    pub ok: bool,
    /// Generation rows ordered top-down.
    pub levels: Vec<FamilyLevelRow>,
    /// Names the view could not place (parent cycles).
    pub unplaced: Vec<String>,
    pub message: String,
}

impl FamilyLevelsResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            levels: Vec::new(),
            unplaced: Vec::new(),
            message: message.into(),
        }
    }
}

/// Merges semicolon-delimited bulk text into the persisted family.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Lines without `NAME` are skipped, never rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn family_import_bulk_text(text: String) -> FamilyActionResponse {
    match with_family_service(true, |service| Ok(service.import_bulk_text(&text))) {
        Ok(change) => FamilyActionResponse::success(summarize("Imported", &change)),
        Err(err) => FamilyActionResponse::failure(format!("family_import_bulk_text failed: {err}")),
    }
}

/// Replaces the persisted family with a JSON snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn family_load_snapshot(json: String) -> FamilyActionResponse {
    let outcome = with_family_service(true, |service| {
        service.load_snapshot(&json).map_err(|err| err.to_string())
    });
    match outcome {
        Ok(change) => FamilyActionResponse::success(summarize("Loaded", &change)),
        Err(err) => FamilyActionResponse::failure(format!("family_load_snapshot failed: {err}")),
    }
}

/// Merges a JSON snapshot into the persisted family by member ID.
#[flutter_rust_bridge::frb(sync)]
pub fn family_append_snapshot(json: String) -> FamilyActionResponse {
    let outcome = with_family_service(true, |service| {
        service.append_snapshot(&json).map_err(|err| err.to_string())
    });
    match outcome {
        Ok(change) => FamilyActionResponse::success(summarize("Appended", &change)),
        Err(err) => FamilyActionResponse::failure(format!("family_append_snapshot failed: {err}")),
    }
}

/// Exports the persisted family as a JSON snapshot in `payload`.
#[flutter_rust_bridge::frb(sync)]
pub fn family_export_snapshot() -> FamilyActionResponse {
    let outcome = with_family_service(false, |service| {
        service.export_snapshot().map_err(|err| err.to_string())
    });
    match outcome {
        Ok(json) => FamilyActionResponse {
            payload: Some(json),
            ..FamilyActionResponse::success("Snapshot exported.")
        },
        Err(err) => FamilyActionResponse::failure(format!("family_export_snapshot failed: {err}")),
    }
}

/// Exports the persisted family as bulk text in `payload`.
#[flutter_rust_bridge::frb(sync)]
pub fn family_export_bulk_text() -> FamilyActionResponse {
    match with_family_service(false, |service| Ok(service.export_bulk_text())) {
        Ok(text) => FamilyActionResponse {
            payload: Some(text),
            ..FamilyActionResponse::success("Bulk text exported.")
        },
        Err(err) => {
            FamilyActionResponse::failure(format!("family_export_bulk_text failed: {err}"))
        }
    }
}

/// Creates one member without relations.
///
/// # FFI contract
/// - Blank `gender`/`image_reference` are stored as absent.
/// - Returns the created member ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn family_create_member(
    name: String,
    gender: Option<String>,
    image_reference: Option<String>,
) -> FamilyActionResponse {
    let outcome = with_family_service(true, |service| {
        service
            .create_member(&name, non_blank(gender), non_blank(image_reference))
            .map_err(|err| err.to_string())
    });
    match outcome {
        Ok(member_id) => FamilyActionResponse {
            member_id: Some(member_id.to_string()),
            ..FamilyActionResponse::success("Member created.")
        },
        Err(err) => FamilyActionResponse::failure(format!("family_create_member failed: {err}")),
    }
}

/// Replaces one member's editable fields by ID.
///
/// # FFI contract
/// - `name` may differ from the stored name; edges follow the rename.
/// - Relation lists are the complete new lists; names left out are
///   removed on both endpoints.
/// - Blank `gender`/`image_reference` are stored as absent.
#[flutter_rust_bridge::frb(sync)]
#[allow(clippy::too_many_arguments)]
pub fn family_update_member(
    member_id: String,
    name: String,
    gender: Option<String>,
    image_reference: Option<String>,
    parents: Vec<String>,
    spouses: Vec<String>,
    children: Vec<String>,
    siblings: Vec<String>,
) -> FamilyActionResponse {
    let id = match Uuid::parse_str(member_id.trim()) {
        Ok(id) => id,
        Err(_) => {
            return FamilyActionResponse::failure(format!(
                "family_update_member failed: invalid member id `{member_id}`"
            ));
        }
    };
    let outcome = with_family_service(true, |service| {
        let existing = service
            .store()
            .get_by_id(id)
            .ok_or_else(|| format!("member not found: {id}"))?;
        let mut member = FamilyMember::with_id(id, name);
        member.gender = non_blank(gender);
        member.image_reference = non_blank(image_reference);
        member.parents = parents;
        member.spouses = spouses;
        member.children = children;
        member.siblings = siblings;
        member.is_implicit = existing.is_implicit;
        service.update_member(&member).map_err(|err| err.to_string())
    });
    match outcome {
        Ok(change) => FamilyActionResponse {
            member_id: Some(id.to_string()),
            ..FamilyActionResponse::success(format!(
                "Member updated; {} edge(s) added, {} removed.",
                change.edges_added, change.edges_removed
            ))
        },
        Err(err) => FamilyActionResponse::failure(format!("family_update_member failed: {err}")),
    }
}

/// Deletes one member by name and strips every edge pointing at it.
#[flutter_rust_bridge::frb(sync)]
pub fn family_delete_member(name: String) -> FamilyActionResponse {
    let outcome = with_family_service(true, |service| {
        service.delete_member(&name).map_err(|err| err.to_string())
    });
    match outcome {
        Ok(change) => FamilyActionResponse::success(format!(
            "Member deleted; {} edge(s) removed.",
            change.edges_removed
        )),
        Err(err) => FamilyActionResponse::failure(format!("family_delete_member failed: {err}")),
    }
}

/// Removes every persisted member.
#[flutter_rust_bridge::frb(sync)]
pub fn family_clear_all() -> FamilyActionResponse {
    match with_family_service(true, |service| Ok(service.clear_all())) {
        Ok(change) => FamilyActionResponse::success(format!(
            "Cleared {} member(s).",
            change.removed.len()
        )),
        Err(err) => FamilyActionResponse::failure(format!("family_clear_all failed: {err}")),
    }
}

/// Full tree grouped by generation, roots first.
#[flutter_rust_bridge::frb(sync)]
pub fn family_all_levels() -> FamilyLevelsResponse {
    let outcome = with_family_service(false, |service| {
        let unplaced = service
            .unplaced_members()
            .into_iter()
            .map(|member| member.name)
            .collect::<Vec<_>>();
        Ok((service.all_levels(), unplaced))
    });
    match outcome {
        Ok((groups, unplaced)) => levels_response(groups, unplaced),
        Err(err) => FamilyLevelsResponse::failure(format!("family_all_levels failed: {err}")),
    }
}

/// Bounded neighborhood of the member with `focus_id`.
///
/// # FFI contract
/// - `focus_id` must be a UUID string of an existing member.
#[flutter_rust_bridge::frb(sync)]
pub fn family_connected_levels(focus_id: String) -> FamilyLevelsResponse {
    let focus_id = match Uuid::parse_str(focus_id.trim()) {
        Ok(id) => id,
        Err(_) => {
            return FamilyLevelsResponse::failure(format!(
                "family_connected_levels failed: invalid member id `{focus_id}`"
            ));
        }
    };
    let outcome = with_family_service(false, |service| {
        service
            .connected_family_of(focus_id)
            .map_err(|err| err.to_string())
    });
    match outcome {
        Ok(groups) => levels_response(groups, Vec::new()),
        Err(err) => {
            FamilyLevelsResponse::failure(format!("family_connected_levels failed: {err}"))
        }
    }
}

fn resolve_family_db_path() -> PathBuf {
    FAMILY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("KINSHIP_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(FAMILY_DB_FILE_NAME)
        })
        .clone()
}

fn with_family_service<T>(
    persist: bool,
    f: impl FnOnce(&mut FamilyService) -> Result<T, String>,
) -> Result<T, String> {
    let _guard = FAMILY_DB_LOCK
        .lock()
        .map_err(|_| "family DB lock poisoned".to_string())?;
    let db_path = resolve_family_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("family DB open failed: {err}"))?;
    let repo = SqliteMemberRepository::try_new(&conn)
        .map_err(|err| format!("family repo init failed: {err}"))?;
    let store = repo
        .load_store()
        .map_err(|err| format!("family load failed: {err}"))?;

    let mut service = FamilyService::with_store(store, FamilyOptions::default());
    let value = f(&mut service)?;
    if persist {
        repo.save_store(service.store())
            .map_err(|err| format!("family save failed: {err}"))?;
    }
    Ok(value)
}

fn levels_response(groups: Vec<LevelGroup>, unplaced: Vec<String>) -> FamilyLevelsResponse {
    if !unplaced.is_empty() {
        warn!(
            "event=family_levels module=ffi status=partial unplaced={}",
            unplaced.len()
        );
    }
    let levels = groups
        .into_iter()
        .map(|group| FamilyLevelRow {
            level: group.level,
            members: group.members.into_iter().map(to_member_item).collect(),
        })
        .collect::<Vec<_>>();
    let message = if levels.is_empty() {
        "No members.".to_string()
    } else {
        format!("{} generation(s).", levels.len())
    };
    FamilyLevelsResponse {
        ok: true,
        levels,
        unplaced,
        message,
    }
}

fn to_member_item(member: FamilyMember) -> FamilyMemberItem {
    FamilyMemberItem {
        member_id: member.id.to_string(),
        name: member.name,
        gender: member.gender,
        image_reference: member.image_reference,
        parents: member.parents,
        spouses: member.spouses,
        children: member.children,
        siblings: member.siblings,
        is_implicit: member.is_implicit,
    }
}

fn summarize(verb: &str, change: &StoreChange) -> String {
    format!(
        "{verb}: {} added, {} updated, {} removed.",
        change.inserted.len(),
        change.updated.len(),
        change.removed.len()
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, family_all_levels, family_connected_levels, family_create_member,
        family_delete_member, family_export_bulk_text, family_import_bulk_text,
        family_update_member, init_logging, ping,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn created_member_appears_in_connected_levels() {
        let name = unique_token("ffi-create");
        let created = family_create_member(name.clone(), Some(" ".to_string()), None);
        assert!(created.ok, "{}", created.message);
        let member_id = created
            .member_id
            .expect("created member should return member_id");

        let response = family_connected_levels(member_id.clone());
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.levels.len(), 1);
        let item = &response.levels[0].members[0];
        assert_eq!(item.member_id, member_id);
        assert_eq!(item.name, name);
        assert_eq!(item.gender, None);

        let duplicate = family_create_member(name, None, None);
        assert!(!duplicate.ok);
    }

    #[test]
    fn bulk_import_is_persisted_and_rendered() {
        let parent = unique_token("ffi-parent");
        let child = unique_token("ffi-child");
        let imported =
            family_import_bulk_text(format!("NAME:{parent}\nNAME:{child}; PARENTS:{parent}"));
        assert!(imported.ok, "{}", imported.message);

        let exported = family_export_bulk_text();
        assert!(exported.ok, "{}", exported.message);
        let payload = exported.payload.expect("export should return payload");
        assert!(payload.contains(&format!("NAME:{child}; PARENTS:{parent};")));

        let levels = family_all_levels();
        assert!(levels.ok, "{}", levels.message);
        let child_level = levels
            .levels
            .iter()
            .find(|row| row.members.iter().any(|item| item.name == child))
            .map(|row| row.level);
        let parent_level = levels
            .levels
            .iter()
            .find(|row| row.members.iter().any(|item| item.name == parent))
            .map(|row| row.level);
        assert_eq!(child_level, parent_level.map(|level| level + 1));

        let deleted = family_delete_member(parent);
        assert!(deleted.ok, "{}", deleted.message);
    }

    #[test]
    fn connected_levels_rejects_bad_ids() {
        let response = family_connected_levels("not-a-uuid".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid member id"));

        let response = family_connected_levels(uuid::Uuid::new_v4().to_string());
        assert!(!response.ok);
        assert!(response.message.contains("member not found"));
    }

    #[test]
    fn update_member_renames_and_drops_relations() {
        let left = unique_token("ffi-left");
        let right = unique_token("ffi-right");
        let imported =
            family_import_bulk_text(format!("NAME:{left}; SPOUSES:{right}\nNAME:{right}"));
        assert!(imported.ok, "{}", imported.message);

        let focus = family_all_levels()
            .levels
            .into_iter()
            .flat_map(|row| row.members)
            .find(|item| item.name == left)
            .expect("imported member should be listed");
        assert_eq!(focus.spouses, vec![right.clone()]);

        let renamed = format!("{left}-renamed");
        let updated = family_update_member(
            focus.member_id.clone(),
            renamed.clone(),
            Some("female".to_string()),
            None,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        assert!(updated.ok, "{}", updated.message);

        let response = family_connected_levels(focus.member_id);
        assert!(response.ok, "{}", response.message);
        let members = response
            .levels
            .into_iter()
            .flat_map(|row| row.members)
            .collect::<Vec<_>>();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, renamed);
        assert_eq!(members[0].gender.as_deref(), Some("female"));
        assert!(members[0].spouses.is_empty());

        let missing = family_update_member(
            uuid::Uuid::new_v4().to_string(),
            unique_token("ffi-ghost"),
            None,
            None,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        assert!(!missing.ok);
        assert!(missing.message.contains("member not found"));
    }

    #[test]
    fn deleting_unknown_member_fails() {
        let response = family_delete_member(unique_token("ffi-missing"));
        assert!(!response.ok);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
