//! Scene domain model.
//!
//! # Responsibility
//! - Define the serializable content of one document (background + elements).
//! - Keep a single canonical shape that controller and store both persist.
//!
//! # Invariants
//! - Every placed element is identified by a scene-unique `ElementId`.
//! - Element insertion order is preserved; it carries no z-order semantics.

pub mod scene;
