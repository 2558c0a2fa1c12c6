//! Family relationship graph engine.
//!
//! # Responsibility
//! - Keep the member store consistent (symmetric, deduplicated edges).
//! - Derive generation levels and the two renderable views: the full
//!   tree and the bounded neighborhood of a focused member.
//!
//! # Invariants
//! - Every algorithm works on one whole `MemberStore` and re-reads records
//!   by name; nothing holds a member across mutations.
//! - All traversals terminate through visited sets, depth limits or
//!   fixed-point progress checks.

mod display;
mod levels;
mod normalize;
mod relative;
mod siblings;
mod store;
mod subgraph;

pub use display::sort_level_members;
pub use levels::{all_levels, assign_levels, unplaced_members};
pub use normalize::normalize;
pub use relative::relative_levels;
pub use siblings::{infer_siblings, sibling_groups};
pub use store::{MemberStore, NameId, StoreChange, StoreError, StoreResult};
pub use subgraph::{connected_family_of, connected_members, MAX_ANCESTOR_DEPTH};

/// Runs the consistency pipeline: normalize, optionally infer siblings,
/// then recompute levels.
pub fn rebuild(store: &mut MemberStore, infer: bool) -> StoreChange {
    let mut change = normalize(store);
    if infer {
        change.absorb(infer_siblings(store));
    }
    change.absorb(assign_levels(store));
    change
}
