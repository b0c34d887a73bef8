// Core structs: CatalogEntry, QuoteLine, Settings, reports + error types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One SKU from an ingested rate card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub source_file: String,
    /// Composed presentation name: title + optional bracketed identifier +
    /// optional bracketed differentiators. Part of the dedup key.
    pub display_name: String,
    /// Raw trimmed product title as found in the source row.
    pub title: String,
    /// Lowercased concatenation of all non-price column values.
    pub search_blob: String,
    /// Normalized SKU / product id / part number values, for cross-reference.
    pub identifier_keys: Vec<String>,
    pub erp_price: f64,
    pub unit_sell_price: f64,
    pub discounted_price: f64,
    pub no_rebate_locked: bool,
    pub added_at: DateTime<Utc>,
}

/// One line of the active quote; catalog fields are snapshotted at add time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub cart_id: String,
    pub display_name: String,
    pub title: String,
    pub erp_price: f64,
    pub unit_sell_price: f64,
    pub discounted_price: f64,
    pub no_rebate_locked: bool,
    pub quantity: u32,
    pub extra_discount_percent: f64,
}

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tax_rate: f64,
    pub include_tax: bool,
    pub sidebar_collapsed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tax_rate: 18.0,
            include_tax: true,
            sidebar_collapsed: false,
        }
    }
}

/// A classified rate-card row that has not been deduplicated yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub source_file: String,
    pub display_name: String,
    pub title: String,
    pub search_blob: String,
    pub identifier_keys: Vec<String>,
    pub erp_price: f64,
    pub unit_sell_price: f64,
    pub discounted_price: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestReport {
    pub files: usize,
    pub added: usize,
    pub duplicates: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CrossRefReport {
    pub rows: usize,
    pub newly_locked: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct QuoteTotals {
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub grand_total: f64,
    pub include_tax: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Operation-level error for catalog commands.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Precondition(String),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("parse error: {0}")]
    Parse(#[from] ParserError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
