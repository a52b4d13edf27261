//! Background embedding for `RoomApp`.
//!
//! Population (`start_population`, `check_population`) and queries
//! (`start_search`, `check_search`) both run the provider on a worker thread
//! and hand the result back over a channel; the room is only touched on the
//! UI thread.

use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;

use eframe::egui;

use semantic_room::clock::FrameClock;
use semantic_room::room::embed_words;
use semantic_room::words::COMMON_WORDS;
use semantic_room::net::embed::EmbeddingProvider;
use semantic_room::render::DriveMode;
use semantic_room::RoomError;

use super::RoomApp;

/// Upward push given to a fully similar body in a physics room.
const NUDGE: [f32; 3] = [0.0, 60.0, 0.0];

impl RoomApp {
    /// Embed the default vocabulary off the UI thread.
    pub fn start_population(&mut self, ctx: &egui::Context) {
        if self.loading() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        self.init_rx = Some(rx);

        let provider = Arc::clone(&self.provider);
        let retry = self.room.config().init_retry.clone();
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let result = embed_words(&*provider, COMMON_WORDS, &retry);
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    /// Poll the population channel and lay the words out when they arrive.
    /// A fatal initialization failure tears the room down.
    pub fn check_population(&mut self) {
        let Some(rx) = &self.init_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(RoomError::Init {
                attempts: 0,
                reason: "embedding worker exited without a result".to_string(),
            }),
        };
        self.init_rx = None;

        match self.room.finish_population(result) {
            Ok(count) => {
                log::info!("Room initialized with {} words", count);
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Embed the current query text. Ignored while a previous query is
    /// still in flight or the field is blank.
    pub fn start_search(&mut self, ctx: &egui::Context) {
        let text = self.query.trim().to_string();
        if text.is_empty() || self.searching() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        self.search_rx = Some(rx);

        let provider = Arc::clone(&self.provider);
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let result = provider.embed(&text);
            let _ = tx.send((text, result));
            ctx.request_repaint();
        });
    }

    /// Apply a finished query embedding: a re-layout, or a nudge in physics
    /// rooms. Failures are shown and leave the scene as it was.
    pub fn check_search(&mut self) {
        let Some(rx) = &self.search_rx else {
            return;
        };
        let (text, result) = match rx.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.search_rx = None;
                log::warn!("Search worker exited without a result");
                self.error = Some("search worker exited without a result".to_string());
                return;
            }
        };
        self.search_rx = None;

        let now = self.clock.now_ms();
        let room = &mut self.room;
        let outcome = result.map_err(RoomError::from).and_then(|embedding| {
            match room.drive_mode() {
                DriveMode::Layout => room.apply_query(&embedding, now).map(|outcome| {
                    log::debug!(
                        "Query {:?}: {} nodes retargeted, {} skipped",
                        text,
                        outcome.applied,
                        outcome.skipped
                    );
                }),
                DriveMode::Physics => room.nudge(&embedding, NUDGE).map(|pushed| {
                    log::debug!("Query {:?}: {} bodies nudged", text, pushed);
                }),
            }
        });

        match outcome {
            Ok(()) => {
                self.active_query = Some(text);
                self.error = None;
            }
            Err(e) => {
                log::warn!("Query {:?} failed: {}", text, e);
                self.error = Some(e.to_string());
            }
        }
    }
}
