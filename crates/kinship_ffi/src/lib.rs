//! Flutter bridge surface for the family tree core.

pub mod api;
