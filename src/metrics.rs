//! Room telemetry.
//!
//! Tracks what the metrics overlay shows:
//! - **FPS**: frames counted over windows of at least one second
//! - **Nodes**: total and currently animating
//! - **Similarity**: average over the last plan

const FPS_WINDOW_MS: f64 = 1000.0;

/// Metrics snapshot for display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricsSnapshot {
    pub fps: f64,
    pub node_count: usize,
    pub animating_count: usize,
    pub average_similarity: f32,
    pub frames: u64,
    pub plans: u64,
}

/// Frame-rate counter.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    window_start: Option<f64>,
    window_frames: u32,
    fps: f64,
}

impl FpsCounter {
    /// Count one frame at `now_ms`; the rate updates once a window closes.
    pub fn frame(&mut self, now_ms: f64) {
        let start = *self.window_start.get_or_insert(now_ms);
        self.window_frames += 1;
        let elapsed = now_ms - start;
        if elapsed >= FPS_WINDOW_MS {
            self.fps = self.window_frames as f64 * 1000.0 / elapsed;
            self.window_frames = 0;
            self.window_start = Some(now_ms);
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

/// Counters owned by a room.
#[derive(Debug, Clone, Default)]
pub struct RoomMetrics {
    fps: FpsCounter,
    frames: u64,
    plans: u64,
    average_similarity: f32,
}

impl RoomMetrics {
    pub fn record_frame(&mut self, now_ms: f64) {
        self.frames += 1;
        self.fps.frame(now_ms);
    }

    pub fn record_plan(&mut self, average_similarity: f32) {
        self.plans += 1;
        self.average_similarity = average_similarity;
    }

    pub fn snapshot(&self, node_count: usize, animating_count: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            fps: self.fps.fps(),
            node_count,
            animating_count,
            average_similarity: self.average_similarity,
            frames: self.frames,
            plans: self.plans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_over_one_second_window() {
        let mut fps = FpsCounter::default();
        for i in 0..=60 {
            fps.frame(i as f64 * 1000.0 / 60.0);
        }
        // The first frame opens the window; 61 frames span exactly 1000 ms.
        assert!((fps.fps() - 61.0).abs() < 1e-6);
    }

    #[test]
    fn fps_stays_zero_inside_first_window() {
        let mut fps = FpsCounter::default();
        fps.frame(0.0);
        fps.frame(500.0);
        assert_eq!(fps.fps(), 0.0);
    }

    #[test]
    fn snapshot_reports_counters() {
        let mut m = RoomMetrics::default();
        m.record_frame(0.0);
        m.record_frame(16.0);
        m.record_plan(0.42);
        let s = m.snapshot(12, 3);
        assert_eq!(s.frames, 2);
        assert_eq!(s.plans, 1);
        assert_eq!(s.node_count, 12);
        assert_eq!(s.animating_count, 3);
        assert_eq!(s.average_similarity, 0.42);
    }
}
