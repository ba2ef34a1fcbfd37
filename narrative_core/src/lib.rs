//! # Narrative Core
//!
//! The algorithmic core of the branching-narrative authoring tool. This crate
//! reads the scene graph from `story_graph` and never performs network I/O.
//!
//! ## Core Components
//!
//! - **context_assembler**: Picks prior narrative material for a target scene
//!   under per-category token budgets
//! - **skeleton**: Procedurally generates branching story structure before
//!   any content exists
//! - **config**: TOML-loadable weights, budgets and generation parameters
//!
//! ## Design Philosophy
//!
//! - **Pure**: Every operation is a synchronous function of its inputs
//! - **Forgiving**: Malformed edges, missing budgets and bad generation
//!   parameters degrade output instead of failing
//! - **Reproducible**: Randomness is injected, so a seed reproduces a skeleton

pub mod config;
pub mod context_assembler;
pub mod error;
pub mod skeleton;
pub mod telemetry;

pub use config::*;
pub use context_assembler::*;
pub use error::*;
pub use skeleton::*;
