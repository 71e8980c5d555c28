//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate scene mutation, autosave, and background fetches into the
//!   document-level API the presentation layer calls.
//! - Keep UI layers decoupled from storage and transport details.

pub mod document;
pub mod store;
