//! Crate-wide error type.

use thiserror::Error;

use crate::net::embed::EmbedError;

/// Errors surfaced by the similarity, layout and room APIs.
#[derive(Debug, Error)]
pub enum RoomError {
    /// A vector with no components was supplied.
    #[error("embedding vector is empty")]
    EmptyVector,

    /// Two vectors that must share a dimensionality do not.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Cosine similarity is undefined for a zero vector.
    #[error("embedding vector has zero norm")]
    ZeroNorm,

    /// A component is NaN or infinite.
    #[error("embedding vector has a non-finite component")]
    NonFinite,

    /// Node labels must be unique within a room.
    #[error("duplicate node label: {0}")]
    DuplicateNode(String),

    /// A search query was issued to a room driven by a physics world.
    #[error("room is physics-driven; similarity layout is unavailable")]
    NotLayoutDriven,

    /// An impulse was requested on a room without a physics world.
    #[error("room is layout-driven; it has no physics world")]
    NotPhysicsDriven,

    /// The room has been torn down and holds no resources.
    #[error("room has been torn down")]
    TornDown,

    /// Bounded polling gave up.
    #[error("initialization failed after {attempts} attempts: {reason}")]
    Init { attempts: u32, reason: String },

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Embed(#[from] EmbedError),
}

pub type Result<T> = std::result::Result<T, RoomError>;
