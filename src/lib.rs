//! Semantic room: labelled points in 3-D space that rearrange themselves
//! around a query embedding. The closest matches gather on a spiral near the
//! origin, and the rest drift out to shells whose radius grows as similarity falls.

pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod net;
pub mod node;
pub mod physics;
pub mod render;
pub mod room;
pub mod similarity;
pub mod words;

// Math primitives (plain arrays, no SIMD)
pub mod fast_math;

pub use config::RoomConfig;
pub use error::{Result, RoomError};
pub use node::{Node, NodeId};
pub use room::{QueryOutcome, QueryPlan, Room, RoomEvent};
