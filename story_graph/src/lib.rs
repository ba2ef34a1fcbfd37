//! # Story Graph
//!
//! The data model for branching narratives: scenes connected by transitions
//! and choices, the character roster, authored importance metadata, and the
//! running story state of a playthrough.
//!
//! This crate is the single source of truth for story data and does not
//! contain any selection or generation logic.

pub mod error;
pub mod scene;
pub mod state;

pub use error::*;
pub use scene::*;
pub use state::*;
