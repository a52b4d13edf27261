//! Scene synchronization: live node state into render frames.
//!
//! Once per display frame, copies each node's authoritative transform into a
//! render-ready [`RenderObject`], turns every label toward the camera, and
//! hands the frame to a [`RenderSink`]. The authoritative source is either
//! the animator (layout rooms) or a [`PhysicsWorld`] (physics rooms); both
//! feed the same frame structure.

use std::sync::Arc;

use crate::fast_math::{Quat, Vec3};
use crate::node::{Node, NodeId};
use crate::physics::PhysicsWorld;
use crate::render::camera::OrbitCamera;
use crate::render::color::Rgba;

/// Render-ready state of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    pub id: NodeId,
    pub label: Arc<str>,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub opacity: f32,
    pub color: Rgba,
    pub label_opacity: f32,
    /// Billboard orientation (the camera's)
    pub label_rotation: Quat,
}

/// Everything a sink needs to draw one frame.
#[derive(Debug, Clone, Default)]
pub struct RenderFrame {
    /// Frames synchronized since the room was created
    pub index: u64,
    pub objects: Vec<RenderObject>,
}

/// Where frames go. The room treats it as write-only.
pub trait RenderSink {
    /// Draw one frame.
    fn render(&mut self, frame: &RenderFrame, camera: &OrbitCamera);

    /// Free GPU/window resources. Called once, at room teardown.
    fn release(&mut self) {}
}

/// Reusable per-frame buffer.
#[derive(Debug, Default)]
pub struct SceneSync {
    frame: RenderFrame,
}

impl SceneSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    /// Copy every node's live state into the frame.
    pub fn capture(&mut self, nodes: &[Node], camera: &OrbitCamera) {
        let label_rotation = camera.orientation();
        let objects = &mut self.frame.objects;
        objects.truncate(nodes.len());

        for (i, node) in nodes.iter().enumerate() {
            let object = RenderObject {
                id: node.id,
                label: Arc::clone(&node.label),
                position: node.live.position,
                rotation: node.rotation,
                scale: node.live.scale,
                opacity: node.live.opacity,
                color: node.color,
                label_opacity: node.live.label_opacity,
                label_rotation,
            };
            match objects.get_mut(i) {
                Some(slot) => *slot = object,
                None => objects.push(object),
            }
        }
        self.frame.index += 1;
    }

    /// Present the captured frame.
    pub fn present<R: RenderSink + ?Sized>(&self, sink: &mut R, camera: &OrbitCamera) {
        sink.render(&self.frame, camera);
    }
}

/// Pull each node's pose out of `world` into the node itself.
/// Nodes without a body keep their last pose.
pub fn read_physics(nodes: &mut [Node], world: &dyn PhysicsWorld) {
    for node in nodes.iter_mut() {
        if let Some(body) = world.body_transform(node.id) {
            node.live.position = body.translation;
            node.rotation = body.rotation;
        }
    }
}
