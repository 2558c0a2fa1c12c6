//! Core domain logic for the family tree.
//! This crate is the single source of truth for graph invariants.

pub mod db;
pub mod graph;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use graph::{
    all_levels, assign_levels, connected_family_of, infer_siblings, normalize, MemberStore,
    StoreChange, StoreError,
};
pub use import::bulk_text::{export_bulk_text, parse_bulk_line, parse_bulk_text};
pub use import::snapshot::{SnapshotError, SnapshotResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::level_group::LevelGroup;
pub use model::member::{FamilyMember, MemberId, Relation};
pub use repo::member_repo::{MemberRepository, RepoError, RepoResult, SqliteMemberRepository};
pub use service::family_service::{
    FamilyOptions, FamilyResult, FamilyService, FamilyServiceError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
