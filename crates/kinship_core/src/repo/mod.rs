//! Persistence contract for the member store.
//!
//! # Responsibility
//! - Define the logical read/write contract for whole-store snapshots.
//! - Keep SQLite details out of the graph engine and services.
//!
//! # Invariants
//! - Saves replace the persisted store as a whole, never a partial patch.
//! - Loads reject invalid persisted rows instead of masking them.

pub mod member_repo;
