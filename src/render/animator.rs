/// Similarity Animator.
///
/// Moves every node from where it is *now* to where the latest plan wants it.
/// - Tween: fixed duration, cubic ease-out, lerp of position/scale/opacity
/// - Motion: per-node state machine, `Idle` ↔ `Animating`
/// - AnimationLoop: runs only while some node is animating, re-arms on demand
///
/// A retarget always snapshots the node's live transform as the new start, so
/// a query that lands mid-flight bends the motion instead of snapping it.

use serde::Deserialize;

use crate::fast_math::{clamp01, ease_out_cubic, lerp, lerp3, Vec3};

/// Animation timing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Time from retarget to settle
    pub duration_ms: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { duration_ms: 2000.0 }
    }
}

/// The animatable part of a node's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Uniform scale
    pub scale: f32,
    pub opacity: f32,
    /// Opacity of the camera-facing label
    pub label_opacity: f32,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            scale: 1.0,
            opacity: 1.0,
            label_opacity: 0.9,
        }
    }

    /// Interpolate every field with the same weight.
    pub fn lerp(&self, to: &Transform, t: f32) -> Transform {
        Transform {
            position: lerp3(self.position, to.position, t),
            scale: lerp(self.scale, to.scale, t),
            opacity: lerp(self.opacity, to.opacity, t),
            label_opacity: lerp(self.label_opacity, to.label_opacity, t),
        }
    }
}

/// One in-flight animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub start_ms: f64,
    pub duration_ms: f64,
    pub from: Transform,
    pub to: Transform,
    /// Similarity that produced `to`
    pub similarity: f32,
}

impl Tween {
    /// Linear progress in [0, 1]. Non-positive durations complete immediately.
    pub fn progress(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        clamp01(((now_ms - self.start_ms) / self.duration_ms) as f32)
    }

    /// Eased transform at `now_ms`.
    pub fn sample(&self, now_ms: f64) -> (Transform, f32) {
        let progress = self.progress(now_ms);
        if progress >= 1.0 {
            return (self.to, progress);
        }
        (self.from.lerp(&self.to, ease_out_cubic(progress)), progress)
    }
}

/// Per-node animation state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Motion {
    #[default]
    Idle,
    Animating(Tween),
}

impl Motion {
    pub fn is_animating(&self) -> bool {
        matches!(self, Motion::Animating(_))
    }

    /// Replace whatever is in flight with a tween from `live` to `target`.
    pub fn retarget(
        &mut self,
        live: &Transform,
        target: Transform,
        similarity: f32,
        now_ms: f64,
        config: &AnimationConfig,
    ) {
        *self = Motion::Animating(Tween {
            start_ms: now_ms,
            duration_ms: config.duration_ms,
            from: *live,
            to: target,
            similarity,
        });
    }

    /// Write the eased transform into `live`. Returns true while still animating;
    /// on completion the state drops back to `Idle`.
    pub fn advance(&mut self, live: &mut Transform, now_ms: f64) -> bool {
        let done = match self {
            Motion::Idle => return false,
            Motion::Animating(tween) => {
                let (sampled, progress) = tween.sample(now_ms);
                *live = sampled;
                progress >= 1.0
            }
        };
        if done {
            *self = Motion::Idle;
        }
        !done
    }
}

/// Anything the loop can animate.
pub trait Animate {
    fn motion_and_live(&mut self) -> (&mut Motion, &mut Transform);
}

/// Outcome of one loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Some node is still animating; schedule another tick.
    Continue,
    /// The last node settled on this tick; the loop has stopped.
    Settled,
    /// The loop was not running; nothing was touched.
    Stopped,
}

/// Self-stopping animation loop.
#[derive(Debug, Clone, Default)]
pub struct AnimationLoop {
    running: bool,
    ticks: u64,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the loop as running. Returns true when it was stopped, meaning the
    /// caller must start a new tick chain.
    pub fn arm(&mut self) -> bool {
        let was_stopped = !self.running;
        self.running = true;
        if was_stopped {
            self.ticks = 0;
        }
        was_stopped
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks since the loop was last armed from stopped.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance every animating node once.
    pub fn tick<A: Animate>(&mut self, now_ms: f64, nodes: &mut [A]) -> Tick {
        if !self.running {
            return Tick::Stopped;
        }
        self.ticks += 1;

        let mut still_animating = false;
        for node in nodes.iter_mut() {
            let (motion, live) = node.motion_and_live();
            still_animating |= motion.advance(live, now_ms);
        }

        if still_animating {
            Tick::Continue
        } else {
            self.running = false;
            Tick::Settled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dot {
        motion: Motion,
        live: Transform,
    }

    impl Animate for Dot {
        fn motion_and_live(&mut self) -> (&mut Motion, &mut Transform) {
            (&mut self.motion, &mut self.live)
        }
    }

    fn target(x: f32) -> Transform {
        Transform {
            position: [x, 0.0, 0.0],
            scale: 2.0,
            opacity: 0.5,
            label_opacity: 0.45,
        }
    }

    fn cfg() -> AnimationConfig {
        AnimationConfig { duration_ms: 1000.0 }
    }

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let tween = Tween {
            start_ms: 100.0,
            duration_ms: 1000.0,
            from: Transform::at([0.0; 3]),
            to: target(10.0),
            similarity: 0.5,
        };
        assert_eq!(tween.progress(0.0), 0.0);
        assert_eq!(tween.progress(5000.0), 1.0);
        let mut prev = 0.0;
        for t in (0..1500).step_by(37) {
            let p = tween.progress(100.0 + t as f64);
            assert!(p >= prev && (0.0..=1.0).contains(&p));
            prev = p;
        }
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut m = Motion::Idle;
        let mut live = Transform::at([1.0, 2.0, 3.0]);
        m.retarget(&live, target(5.0), 0.3, 0.0, &AnimationConfig { duration_ms: 0.0 });
        assert!(!m.advance(&mut live, 0.0));
        assert_eq!(live, target(5.0));
        assert_eq!(m, Motion::Idle);
    }

    #[test]
    fn advance_eases_then_settles() {
        let mut m = Motion::Idle;
        let mut live = Transform::at([0.0; 3]);
        m.retarget(&live, target(10.0), 0.9, 0.0, &cfg());

        assert!(m.advance(&mut live, 500.0));
        // Cubic ease-out at half time is 0.875.
        assert!((live.position[0] - 8.75).abs() < 1e-4);

        assert!(!m.advance(&mut live, 1000.0));
        assert_eq!(live, target(10.0));
        assert!(!m.is_animating());
    }

    #[test]
    fn retarget_mid_flight_starts_from_live_state() {
        let mut m = Motion::Idle;
        let mut live = Transform::at([0.0; 3]);
        m.retarget(&live, target(10.0), 0.9, 0.0, &cfg());
        m.advance(&mut live, 300.0);
        let mid = live;

        m.retarget(&live, target(-10.0), 0.1, 300.0, &cfg());
        match &m {
            Motion::Animating(t) => assert_eq!(t.from, mid),
            Motion::Idle => panic!("expected animation"),
        }
        // No jump at the moment of override.
        m.advance(&mut live, 300.0);
        assert_eq!(live, mid);
    }

    #[test]
    fn loop_stops_and_rearms() {
        let mut nodes = vec![
            Dot { motion: Motion::Idle, live: Transform::at([0.0; 3]) },
            Dot { motion: Motion::Idle, live: Transform::at([1.0; 3]) },
        ];
        let mut anim = AnimationLoop::new();
        assert_eq!(anim.tick(0.0, &mut nodes), Tick::Stopped);

        for n in nodes.iter_mut() {
            let (motion, live) = n.motion_and_live();
            let from = *live;
            motion.retarget(&from, target(4.0), 0.5, 0.0, &cfg());
        }
        assert!(anim.arm());
        assert!(!anim.arm());

        assert_eq!(anim.tick(16.0, &mut nodes), Tick::Continue);
        assert_eq!(anim.tick(1000.0, &mut nodes), Tick::Settled);
        assert!(!anim.is_running());
        assert!(nodes.iter().all(|n| !n.motion.is_animating()));
        assert_eq!(anim.tick(1016.0, &mut nodes), Tick::Stopped);

        // Resumable after stopping.
        nodes[0].motion.retarget(&target(4.0), target(8.0), 0.7, 2000.0, &cfg());
        assert!(anim.arm());
        assert_eq!(anim.ticks(), 0);
        assert_eq!(anim.tick(2500.0, &mut nodes), Tick::Continue);
        assert_eq!(anim.tick(3000.0, &mut nodes), Tick::Settled);
    }
}
