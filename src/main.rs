use std::sync::Arc;

use eframe::egui;

use semantic_room::net::cache::CachedEmbedder;
use semantic_room::net::embed::HttpEmbedder;
use semantic_room::physics::BallWorld;
use semantic_room::{Room, RoomConfig};

mod app;

use app::viewport::EguiSink;
use app::RoomApp;

/// JSON file overriding any subset of [`RoomConfig`].
const CONFIG_ENV: &str = "SEMANTIC_ROOM_CONFIG";
/// Overrides `embed_endpoint`.
const ENDPOINT_ENV: &str = "SEMANTIC_ROOM_EMBED_URL";
/// Any value opens a physics-driven room instead of the similarity layout.
const PHYSICS_ENV: &str = "SEMANTIC_ROOM_PHYSICS";

fn load_config() -> semantic_room::Result<RoomConfig> {
    let mut config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            log::info!("Loading config from {}", path);
            RoomConfig::load(path)?
        }
        Err(_) => RoomConfig::default(),
    };
    if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
        config.embed_endpoint = endpoint;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = load_config()?;
    let embedder = HttpEmbedder::new(&config.embed_endpoint, config.request_timeout())?;
    log::info!("Embedding provider: {}", embedder.endpoint());
    let provider = Arc::new(CachedEmbedder::new(embedder, config.embed_cache_capacity));

    let (width, height) = (1280.0, 800.0);
    let aspect = width / height;
    let room = if std::env::var_os(PHYSICS_ENV).is_some() {
        let world = BallWorld::new(config.physics.clone());
        Room::with_physics(config, EguiSink::default(), aspect, Box::new(world))
    } else {
        Room::new(config, EguiSink::default(), aspect)
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "Semantic Room",
        options,
        Box::new(move |cc| Ok(Box::new(RoomApp::new(room, provider, &cc.egui_ctx)))),
    )?;
    Ok(())
}
