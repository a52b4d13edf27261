//! Room configuration.
//!
//! Every constant the room uses lives here with a default. A JSON file may
//! override any subset; missing fields keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, RoomError};
use crate::net::retry::RetryPolicy;
use crate::physics::BodyParams;
use crate::render::animator::AnimationConfig;
use crate::render::camera::CameraConfig;
use crate::render::layout::LayoutConfig;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub layout: LayoutConfig,
    pub animation: AnimationConfig,
    pub camera: CameraConfig,
    pub physics: BodyParams,
    /// Distance between neighbours in the initial grid
    pub grid_spacing: f32,
    pub embed_endpoint: String,
    pub request_timeout_ms: u64,
    /// Polling used while the embedding provider warms up
    pub init_retry: RetryPolicy,
    /// Distinct texts kept by the embedding cache
    pub embed_cache_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            animation: AnimationConfig::default(),
            camera: CameraConfig::default(),
            physics: BodyParams::default(),
            grid_spacing: 4.0,
            embed_endpoint: "http://localhost:3000/api/embed".to_string(),
            request_timeout_ms: 15_000,
            init_retry: RetryPolicy::default(),
            embed_cache_capacity: 512,
        }
    }
}

impl RoomConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RoomConfig =
            serde_json::from_str(json).map_err(|e| RoomError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RoomError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Reject values that would make layout or animation meaningless.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.grid_spacing,
            self.layout.spiral_angle_step,
            self.layout.spiral_base_radius,
            self.layout.spiral_radius_step,
            self.layout.spiral_height_step,
            self.layout.shell_gap,
            self.layout.shell_spread,
            self.camera.fov_deg,
            self.camera.near,
            self.camera.far,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(RoomError::Config("non-finite layout constant".into()));
        }
        if !self.animation.duration_ms.is_finite() || self.animation.duration_ms < 0.0 {
            return Err(RoomError::Config("animation.duration_ms must be >= 0".into()));
        }
        if self.layout.shell_gap <= 0.0 {
            return Err(RoomError::Config("layout.shell_gap must be > 0".into()));
        }
        if self.layout.shell_spread < 0.0 {
            return Err(RoomError::Config("layout.shell_spread must be >= 0".into()));
        }
        if self.camera.near <= 0.0 {
            return Err(RoomError::Config("camera.near must be > 0".into()));
        }
        // Zoom keeps the distance within [near * 10, far / 2].
        if self.camera.far <= self.camera.near * 20.0 {
            return Err(RoomError::Config("camera.far must exceed 20 * camera.near".into()));
        }
        if !(self.camera.fov_deg > 0.0 && self.camera.fov_deg < 180.0) {
            return Err(RoomError::Config("camera.fov_deg must be in (0, 180)".into()));
        }
        Ok(())
    }
}
