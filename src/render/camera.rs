//! Orbit camera.
//!
//! Holds the view labels are billboarded toward, and the
//! perspective projection the viewer uses to place nodes on screen.

use serde::Deserialize;

use crate::fast_math::{
    add3, cross3, dot3, normalize3_or, quat_from_basis, scale3, sub3, Quat, Vec3,
};

const WORLD_UP: Vec3 = [0.0, 1.0, 0.0];

/// Keeps the orbit off the poles, where the look-at basis degenerates.
const MAX_ELEVATION: f32 = 1.5;

/// Initial camera placement
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            eye: [0.0, 25.0, 50.0],
            target: [0.0, 0.0, 0.0],
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// A camera orbiting `target` at `distance`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal orbit angle in radians (0 = looking down -Z from +Z)
    pub azimuth: f32,
    /// Vertical orbit angle in radians (positive = looking down)
    pub elevation: f32,
    pub distance: f32,
    pub target: Vec3,
    pub fov_deg: f32,
    /// Width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

/// A world point mapped to the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    /// Distance along the view direction
    pub depth: f32,
    /// Screen pixels per world unit at this depth
    pub pixels_per_unit: f32,
}

impl OrbitCamera {
    pub fn from_config(cfg: &CameraConfig, aspect: f32) -> Self {
        let offset = sub3(cfg.eye, cfg.target);
        let horizontal = (offset[0] * offset[0] + offset[2] * offset[2]).sqrt();
        let distance = dot3(offset, offset).sqrt().max(1e-3);
        Self {
            azimuth: offset[0].atan2(offset[2]),
            elevation: offset[1].atan2(horizontal).clamp(-MAX_ELEVATION, MAX_ELEVATION),
            distance,
            target: cfg.target,
            fov_deg: cfg.fov_deg,
            aspect: sanitize_aspect(aspect),
            near: cfg.near,
            far: cfg.far,
        }
    }

    /// World-space eye position.
    pub fn eye(&self) -> Vec3 {
        let (sa, ca) = self.azimuth.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        add3(
            self.target,
            [
                self.distance * sa * ce,
                self.distance * se,
                self.distance * ca * ce,
            ],
        )
    }

    /// Orthonormal view basis: (right, up, forward).
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = normalize3_or(sub3(self.target, self.eye()), [0.0, 0.0, -1.0]);
        let right = normalize3_or(cross3(forward, WORLD_UP), [1.0, 0.0, 0.0]);
        let up = cross3(right, forward);
        (right, up, forward)
    }

    /// Camera orientation. Labels copy this to face the viewer.
    pub fn orientation(&self) -> Quat {
        let (right, up, forward) = self.basis();
        // Camera looks down its local -Z.
        quat_from_basis(right, up, scale3(forward, -1.0))
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = sanitize_aspect(width / height);
        }
    }

    /// Orbit by the given angle deltas (radians).
    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth += d_azimuth;
        self.elevation = (self.elevation + d_elevation).clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    /// Multiply the distance by `factor`, bounded by the clip planes.
    /// When the planes are too close for that range, the lower bound wins.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            let lo = self.near * 10.0;
            let hi = (self.far * 0.5).max(lo);
            self.distance = (self.distance * factor).max(lo).min(hi);
        }
    }

    /// Project a world point into a `width` × `height` viewport.
    /// Points behind the near plane or past the far plane return `None`.
    pub fn project(&self, point: Vec3, width: f32, height: f32) -> Option<Projected> {
        let (right, up, forward) = self.basis();
        let rel = sub3(point, self.eye());
        let depth = dot3(rel, forward);
        if depth <= self.near || depth > self.far {
            return None;
        }
        let focal = 1.0 / (self.fov_deg.to_radians() * 0.5).tan();
        let ndc_x = dot3(rel, right) * focal / (self.aspect * depth);
        let ndc_y = dot3(rel, up) * focal / depth;
        Some(Projected {
            x: (ndc_x + 1.0) * 0.5 * width,
            y: (1.0 - ndc_y) * 0.5 * height,
            depth,
            pixels_per_unit: focal * 0.5 * height / depth,
        })
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}
