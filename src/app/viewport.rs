//! Viewport rendering for `RoomApp`.
//!
//! `EguiSink` is the room's render sink: it keeps the last synchronized frame
//! and paints it with the egui painter as depth-sorted discs with labels.
//! Dragging orbits the camera, scrolling zooms.

use eframe::egui;

use semantic_room::render::camera::OrbitCamera;
use semantic_room::render::color::Rgba;
use semantic_room::render::sync::{RenderFrame, RenderSink};

use super::RoomApp;

/// World-space radius of a node at scale 1.
const NODE_RADIUS: f32 = 0.5;
const LABEL_SIZE: f32 = 13.0;
/// Radians of orbit per dragged pixel.
const ORBIT_SPEED: f32 = 0.005;
const ZOOM_SPEED: f32 = 0.001;

/// Render sink backed by the egui painter.
#[derive(Debug, Default)]
pub struct EguiSink {
    frame: RenderFrame,
    camera: Option<OrbitCamera>,
    released: bool,
}

impl RenderSink for EguiSink {
    fn render(&mut self, frame: &RenderFrame, camera: &OrbitCamera) {
        self.frame.clone_from(frame);
        self.camera = Some(camera.clone());
    }

    fn release(&mut self) {
        self.frame.objects.clear();
        self.camera = None;
        self.released = true;
    }
}

impl EguiSink {
    /// Paint the last frame into `rect`, far objects first.
    pub fn paint(&self, painter: &egui::Painter, rect: egui::Rect) {
        let Some(camera) = &self.camera else {
            return;
        };
        if self.released {
            return;
        }

        let mut visible: Vec<_> = self
            .frame
            .objects
            .iter()
            .filter_map(|obj| {
                camera
                    .project(obj.position, rect.width(), rect.height())
                    .map(|p| (obj, p))
            })
            .collect();
        visible.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));

        for (obj, p) in visible {
            let center = rect.min + egui::vec2(p.x, p.y);
            let radius = (NODE_RADIUS * obj.scale * p.pixels_per_unit).max(1.0);
            painter.circle_filled(center, radius, color32(obj.color, obj.opacity));

            if obj.label_opacity > 0.01 {
                painter.text(
                    center - egui::vec2(0.0, radius + 2.0),
                    egui::Align2::CENTER_BOTTOM,
                    obj.label.as_ref(),
                    egui::FontId::proportional(LABEL_SIZE),
                    color32(Rgba::WHITE, obj.label_opacity),
                );
            }
        }
    }
}

fn color32(c: Rgba, opacity: f32) -> egui::Color32 {
    let alpha = (c.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, alpha)
}

impl RoomApp {
    /// Camera input, one room frame, then paint.
    pub fn draw_viewport(&mut self, ui: &mut egui::Ui, now_ms: f64) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::drag());
        let rect = response.rect;

        if response.dragged() {
            let delta = response.drag_delta();
            self.room
                .camera_mut()
                .orbit(-delta.x * ORBIT_SPEED, delta.y * ORBIT_SPEED);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.room.camera_mut().zoom((-scroll * ZOOM_SPEED).exp());
            }
        }

        self.room.resize(rect.width(), rect.height());
        self.room.frame(now_ms);

        if let Some(sink) = self.room.renderer() {
            sink.paint(&painter, rect);
        }

        if self.show_stats {
            self.draw_stats(&painter, rect);
        }
    }

    fn draw_stats(&self, painter: &egui::Painter, rect: egui::Rect) {
        let m = self.room.metrics();
        let text = format!(
            "FPS {:.0}\nNodes {}\nAnimating {}\nAvg similarity {:.3}\nQueries {}",
            m.fps, m.node_count, m.animating_count, m.average_similarity, m.plans
        );
        painter.text(
            rect.left_top() + egui::vec2(10.0, 10.0),
            egui::Align2::LEFT_TOP,
            text,
            egui::FontId::monospace(12.0),
            egui::Color32::from_rgb(180, 220, 180),
        );
    }
}
