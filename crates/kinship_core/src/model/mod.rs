//! Family domain model.
//!
//! # Responsibility
//! - Define the person record shared by import, persistence and rendering.
//! - Define the ephemeral per-generation view handed to renderers.
//!
//! # Invariants
//! - Every member is identified by a stable `MemberId`.
//! - Relation lists are name-keyed; the store interns them internally.

pub mod level_group;
pub mod member;
