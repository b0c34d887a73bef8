mod catalog;
mod config;
mod console;
mod loader;
mod model;
mod normalizer;
mod parser;
mod quote;
mod report;
mod state;
mod storage;
mod utils;

use config::{AppConfig, load_config};
use console::Console;
use state::AppState;
use storage::SqliteStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file
    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    // Initialize storage (SQLite)
    let storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    // Load persisted catalog, quote cart and settings
    let state = match AppState::load(storage) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to load persisted state: {:?}", e);
            return;
        }
    };

    info!("🚀 QuoteDesk started.");
    let mut console = Console::new(state, config);
    console::listener::run(&mut console).await;
}
