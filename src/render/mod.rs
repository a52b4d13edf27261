pub mod animator;
pub mod camera;
pub mod color;
pub mod layout;
pub mod sync;

/// Where a room's node transforms come from each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Similarity layout + eased animation
    Layout,
    /// Rigid-body simulation
    Physics,
}

impl Default for DriveMode {
    fn default() -> Self {
        Self::Layout
    }
}
