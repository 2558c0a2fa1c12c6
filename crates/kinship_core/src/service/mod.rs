//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store edits, imports and the consistency pipeline into
//!   use-case level APIs.
//! - Keep UI/FFI layers decoupled from graph internals.

pub mod family_service;
