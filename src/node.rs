//! Scene nodes.

use std::fmt;
use std::sync::Arc;

use crate::fast_math::{Quat, Vec3, QUAT_IDENTITY};
use crate::render::animator::{Animate, Motion, Transform};
use crate::render::color::Rgba;

/// Stable handle for a node within one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A labelled point in the room.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Unique within the room
    pub label: Arc<str>,
    pub embedding: Vec<f32>,
    /// Where population placed the node
    pub base_position: Vec3,
    /// What the renderer shows this frame
    pub live: Transform,
    /// Orientation, written only by a physics world
    pub rotation: Quat,
    pub color: Rgba,
    pub motion: Motion,
}

impl Node {
    pub fn new(id: NodeId, label: &str, embedding: Vec<f32>, position: Vec3) -> Self {
        Self {
            id,
            label: Arc::from(label),
            embedding,
            base_position: position,
            live: Transform::at(position),
            rotation: QUAT_IDENTITY,
            color: initial_color(label),
            motion: Motion::Idle,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.motion.is_animating()
    }
}

impl Animate for Node {
    fn motion_and_live(&mut self) -> (&mut Motion, &mut Transform) {
        (&mut self.motion, &mut self.live)
    }
}

impl AsRef<[f32]> for Node {
    fn as_ref(&self) -> &[f32] {
        &self.embedding
    }
}

/// Resting colour before any query: hue keyed on label length.
pub fn initial_color(label: &str) -> Rgba {
    let hue = (label.chars().count() % 10) as f32 / 10.0;
    Rgba::from_hsl(hue, 0.7, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_rests_at_base() {
        let n = Node::new(NodeId(3), "apple", vec![1.0, 0.0], [1.0, 0.0, -2.0]);
        assert_eq!(n.live.position, n.base_position);
        assert_eq!(n.live.label_opacity, 0.9);
        assert!(!n.is_animating());
        assert_eq!(n.id.to_string(), "node#3");
    }

    #[test]
    fn labels_of_equal_length_share_a_colour() {
        assert_eq!(initial_color("cat"), initial_color("dog"));
        assert_ne!(initial_color("cat"), initial_color("horse"));
        // 10 and 0 characters wrap to the same hue
        assert_eq!(initial_color("abcdefghij"), initial_color(""));
    }
}
