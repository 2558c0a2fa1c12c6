//! Record producers and exporters around the member store.
//!
//! # Responsibility
//! - Turn bulk text and JSON snapshots into candidate member records.
//! - Merge them into a store and re-run the consistency pipeline.
//! - Render the store back into both formats.

pub mod bulk_text;
pub mod snapshot;
