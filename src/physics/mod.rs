//! Physics-driven rooms.
//!
//! A [`PhysicsWorld`] owns rigid bodies keyed by [`NodeId`]. The room spawns
//! one body per node and from then on only *reads* translation + rotation
//! after each step. It never writes a body's pose; a query can only push
//! bodies through [`PhysicsWorld::apply_impulse`].
//!
//! [`BallWorld`] is a small built-in world: spheres under gravity with
//! linear/angular damping, resting on a ground plane at y = 0.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::fast_math::{add3, length3, quat_mul, quat_normalize, scale3, Quat, Vec3, QUAT_IDENTITY};
use crate::node::NodeId;

/// Pose of one body after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

/// Simulation the room can drive and read back.
pub trait PhysicsWorld: Send {
    /// Create a body for `id` at `translation`. Replaces any existing body.
    fn spawn_body(&mut self, id: NodeId, translation: Vec3);

    fn remove_body(&mut self, id: NodeId);

    /// Add `impulse` scaled by `similarity` to a body's momentum. Unknown ids
    /// are ignored.
    fn apply_impulse(&mut self, id: NodeId, impulse: Vec3, similarity: f32);

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Current pose of `id`, if it has a body.
    fn body_transform(&self, id: NodeId) -> Option<BodyTransform>;
}

/// Body and world parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    pub gravity: Vec3,
    pub radius: f32,
    /// Added to the mass implied by radius and density
    pub additional_mass: f32,
    pub density: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Tangential velocity removed per second of ground contact, as a fraction
    pub friction: f32,
    /// Fraction of normal velocity kept on a bounce
    pub restitution: f32,
    /// Fixed simulation step (seconds)
    pub timestep: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            radius: 0.8,
            additional_mass: 3.0,
            density: 5.0,
            linear_damping: 8.0,
            angular_damping: 8.0,
            friction: 0.8,
            restitution: 0.1,
            timestep: 1.0 / 60.0,
        }
    }
}

impl BodyParams {
    pub fn mass(&self) -> f32 {
        let volume = 4.0 / 3.0 * std::f32::consts::PI * self.radius.powi(3);
        volume * self.density + self.additional_mass
    }
}

#[derive(Debug, Clone)]
struct Ball {
    position: Vec3,
    velocity: Vec3,
    rotation: Quat,
    angular_velocity: Vec3,
}

/// Spheres on a ground plane.
#[derive(Debug, Clone)]
pub struct BallWorld {
    params: BodyParams,
    bodies: BTreeMap<NodeId, Ball>,
}

impl BallWorld {
    pub fn new(params: BodyParams) -> Self {
        Self {
            params,
            bodies: BTreeMap::new(),
        }
    }

    pub fn params(&self) -> &BodyParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn set_angular_velocity(&mut self, id: NodeId, omega: Vec3) {
        if let Some(ball) = self.bodies.get_mut(&id) {
            ball.angular_velocity = omega;
        }
    }
}

impl Default for BallWorld {
    fn default() -> Self {
        Self::new(BodyParams::default())
    }
}

impl PhysicsWorld for BallWorld {
    fn spawn_body(&mut self, id: NodeId, translation: Vec3) {
        self.bodies.insert(
            id,
            Ball {
                position: translation,
                velocity: [0.0; 3],
                rotation: QUAT_IDENTITY,
                angular_velocity: [0.0; 3],
            },
        );
    }

    fn remove_body(&mut self, id: NodeId) {
        self.bodies.remove(&id);
    }

    fn apply_impulse(&mut self, id: NodeId, impulse: Vec3, similarity: f32) {
        let inv_mass = 1.0 / self.params.mass();
        if let Some(ball) = self.bodies.get_mut(&id) {
            ball.velocity = add3(ball.velocity, scale3(impulse, similarity * inv_mass));
        }
    }

    fn step(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        let p = &self.params;
        // Implicit damping: v' = v / (1 + dt·c)
        let lin_keep = 1.0 / (1.0 + dt * p.linear_damping);
        let ang_keep = 1.0 / (1.0 + dt * p.angular_damping);
        let friction_keep = (1.0 - p.friction * dt).max(0.0);

        for ball in self.bodies.values_mut() {
            // Semi-implicit Euler
            ball.velocity = scale3(add3(ball.velocity, scale3(p.gravity, dt)), lin_keep);
            ball.position = add3(ball.position, scale3(ball.velocity, dt));

            if ball.position[1] < p.radius {
                ball.position[1] = p.radius;
                if ball.velocity[1] < 0.0 {
                    ball.velocity[1] = -ball.velocity[1] * p.restitution;
                }
                ball.velocity[0] *= friction_keep;
                ball.velocity[2] *= friction_keep;
            }

            ball.angular_velocity = scale3(ball.angular_velocity, ang_keep);
            let omega = ball.angular_velocity;
            if length3(omega) > 0.0 {
                // q' = q + ½·(ω,0)·q·dt
                let spin = quat_mul([omega[0], omega[1], omega[2], 0.0], ball.rotation);
                let half_dt = 0.5 * dt;
                ball.rotation = quat_normalize([
                    ball.rotation[0] + spin[0] * half_dt,
                    ball.rotation[1] + spin[1] * half_dt,
                    ball.rotation[2] + spin[2] * half_dt,
                    ball.rotation[3] + spin[3] * half_dt,
                ]);
            }
        }
    }

    fn body_transform(&self, id: NodeId) -> Option<BodyTransform> {
        self.bodies.get(&id).map(|b| BodyTransform {
            translation: b.position,
            rotation: b.rotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(world: &mut BallWorld, seconds: f32) {
        let dt = world.params().timestep;
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            world.step(dt);
        }
    }

    #[test]
    fn bodies_fall_and_rest_on_ground() {
        let mut world = BallWorld::default();
        world.spawn_body(NodeId(0), [0.0, 5.0, 0.0]);
        run(&mut world, 0.1);
        let early = world.body_transform(NodeId(0)).unwrap().translation[1];
        assert!(early < 5.0);

        run(&mut world, 10.0);
        let rest = world.body_transform(NodeId(0)).unwrap().translation;
        assert!((rest[1] - world.params().radius).abs() < 1e-4);
    }

    #[test]
    fn impulse_is_scaled_by_similarity() {
        let params = BodyParams { gravity: [0.0; 3], linear_damping: 0.0, ..BodyParams::default() };
        let mut a = BallWorld::new(params.clone());
        let mut b = BallWorld::new(params);
        for w in [&mut a, &mut b] {
            w.spawn_body(NodeId(1), [0.0, 2.0, 0.0]);
        }
        a.apply_impulse(NodeId(1), [10.0, 0.0, 0.0], 1.0);
        b.apply_impulse(NodeId(1), [10.0, 0.0, 0.0], 0.5);
        a.step(0.1);
        b.step(0.1);
        let xa = a.body_transform(NodeId(1)).unwrap().translation[0];
        let xb = b.body_transform(NodeId(1)).unwrap().translation[0];
        assert!(xa > 0.0);
        assert!((xa - 2.0 * xb).abs() < 1e-5);
    }

    #[test]
    fn spin_stays_unit_and_decays() {
        let mut world = BallWorld::default();
        world.spawn_body(NodeId(2), [0.0, 0.8, 0.0]);
        world.set_angular_velocity(NodeId(2), [0.0, 6.0, 0.0]);
        run(&mut world, 0.5);
        let q = world.body_transform(NodeId(2)).unwrap().rotation;
        let n = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
        assert!((n - 1.0).abs() < 1e-4);
        assert!(q[1].abs() > 0.01);
    }

    #[test]
    fn removed_and_unknown_bodies() {
        let mut world = BallWorld::default();
        world.spawn_body(NodeId(7), [0.0; 3]);
        assert_eq!(world.len(), 1);
        world.remove_body(NodeId(7));
        assert!(world.is_empty());
        assert!(world.body_transform(NodeId(7)).is_none());
        world.apply_impulse(NodeId(7), [1.0, 0.0, 0.0], 1.0);
        world.step(0.0);
    }
}
