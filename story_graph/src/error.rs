//! Errors raised by graph lookups.

use thiserror::Error;

use crate::scene::{CharacterId, SceneId};

/// Errors returned by [`SceneGraph`](crate::SceneGraph) accessors that
/// address a scene or character by id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown scene: {0}")]
    UnknownScene(SceneId),

    #[error("unknown character: {0}")]
    UnknownCharacter(CharacterId),
}
