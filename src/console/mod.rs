// Console surface: line listener + slash-command dispatch.

pub mod command_handler;
pub mod listener;

use crate::config::AppConfig;
use crate::loader::FileLoader;
use crate::model::CatalogEntry;
use crate::parser::CsvParser;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub struct Console {
    pub state: Arc<Mutex<AppState>>,
    pub config: Arc<AppConfig>,
    pub loader: FileLoader,
    pub parser: CsvParser,
    pub start_time: Instant,
    /// Session-only view state: the active catalog filter and the numbered
    /// hits of the last /search, which /add indexes into.
    pub scope_file: Option<String>,
    pub last_results: Vec<CatalogEntry>,
}

impl Console {
    pub fn new(state: Arc<Mutex<AppState>>, config: Arc<AppConfig>) -> Self {
        Self {
            state,
            config,
            loader: FileLoader::new(),
            parser: CsvParser::new(),
            start_time: Instant::now(),
            scope_file: None,
            last_results: Vec::new(),
        }
    }

    pub fn reply(&self, text: &str) {
        println!("{text}");
    }
}
