//! `RoomApp`: the top-level egui application state.
//!
//! This module declares the `RoomApp` struct and the `eframe::App` impl.
//! The remaining methods are split across the sibling sub-modules:
//!
//! - `search`  : background embedding for population and queries
//! - `toolbar` : query field and controls
//! - `viewport`: the egui render sink, camera input, metrics overlay

pub mod search;
pub mod toolbar;
pub mod viewport;

use std::sync::{mpsc, Arc};

use eframe::egui;

use semantic_room::clock::{FrameClock, SystemClock};
use semantic_room::net::cache::CachedEmbedder;
use semantic_room::net::embed::{EmbedError, HttpEmbedder};
use semantic_room::{Room, RoomError};

use self::viewport::EguiSink;

pub type Provider = Arc<CachedEmbedder<HttpEmbedder>>;

/// Words embedded at startup, or the reason they could not be.
pub type InitResult = Result<Vec<(String, Vec<f32>)>, RoomError>;

/// A finished query embedding, tagged with its text.
pub type SearchResult = (String, Result<Vec<f32>, EmbedError>);

// ─── Application state ───────────────────────────────────────────────────────

pub struct RoomApp {
    pub room: Room<EguiSink>,
    pub clock: SystemClock,
    pub provider: Provider,
    pub query: String,
    /// Last query that was applied
    pub active_query: Option<String>,
    pub error: Option<String>,
    pub init_rx: Option<mpsc::Receiver<InitResult>>,
    pub search_rx: Option<mpsc::Receiver<SearchResult>>,
    pub show_stats: bool,
}

impl RoomApp {
    pub fn new(room: Room<EguiSink>, provider: Provider, ctx: &egui::Context) -> Self {
        let mut app = Self {
            room,
            clock: SystemClock::new(),
            provider,
            query: String::new(),
            active_query: None,
            error: None,
            init_rx: None,
            search_rx: None,
            show_stats: true,
        };
        app.start_population(ctx);
        app
    }

    pub fn loading(&self) -> bool {
        self.init_rx.is_some()
    }

    pub fn searching(&self) -> bool {
        self.search_rx.is_some()
    }
}

impl eframe::App for RoomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_population();
        self.check_search();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui, ctx);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(10, 10, 20)))
            .show(ctx, |ui| {
                let now = self.clock.now_ms();
                self.room.tick_animation(now);
                self.draw_viewport(ui, now);
            });

        // The render loop runs every frame, animating or not.
        ctx.request_repaint();
    }
}
