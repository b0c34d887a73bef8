// Application state: catalog, quote cart and settings over one storage handle.
//
// All mutation flows through a single Mutex<AppState>, so concurrent file
// ingestion jobs merge into shared state instead of clobbering each other.
use crate::model::{CatalogEntry, QuoteLine, Settings, StorageError};
use crate::storage::SqliteStorage;
use tracing::info;

pub struct AppState {
    pub catalog: Vec<CatalogEntry>,
    pub cart: Vec<QuoteLine>,
    pub settings: Settings,
    pub storage: SqliteStorage,
}

impl AppState {
    /// Loads every persisted part independently; each falls back to its safe
    /// default when absent or malformed.
    pub fn load(storage: SqliteStorage) -> Result<Self, StorageError> {
        let catalog = storage.load_catalog()?;
        let cart = storage.load_quote()?;
        let settings = storage.load_settings()?;
        info!(
            "Loaded state: {} catalog entries, {} quote lines",
            catalog.len(),
            cart.len()
        );
        Ok(Self {
            catalog,
            cart,
            settings,
            storage,
        })
    }

    /// The dedup key is the (display name, ERP price) pair.
    pub fn is_duplicate(&self, display_name: &str, erp_price: f64) -> bool {
        self.catalog
            .iter()
            .any(|e| e.display_name == display_name && e.erp_price == erp_price)
    }

    /// Writes all three settings back; called after any settings mutation.
    pub fn persist_settings(&self) -> Result<(), StorageError> {
        self.storage
            .save_setting("tax_rate", &self.settings.tax_rate.to_string())?;
        self.storage
            .save_setting("include_tax", &self.settings.include_tax.to_string())?;
        self.storage.save_setting(
            "sidebar_collapsed",
            &self.settings.sidebar_collapsed.to_string(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(display_name: &str, erp: f64) -> CatalogEntry {
        CatalogEntry {
            id: crate::utils::generate_id(),
            source_file: "cards.csv".into(),
            display_name: display_name.into(),
            title: display_name.into(),
            search_blob: String::new(),
            identifier_keys: Vec::new(),
            erp_price: erp,
            unit_sell_price: erp,
            discounted_price: erp,
            no_rebate_locked: false,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_needs_both_name_and_erp_to_match() {
        let mut state = AppState::load(SqliteStorage::open_in_memory().unwrap()).unwrap();
        state.catalog.push(entry("Widget A [W1]", 100.0));

        assert!(state.is_duplicate("Widget A [W1]", 100.0));
        assert!(!state.is_duplicate("Widget A [W1]", 100.5));
        assert!(!state.is_duplicate("Widget B", 100.0));
    }

    #[test]
    fn settings_persist_and_reload() {
        let state_storage = SqliteStorage::open_in_memory().unwrap();
        let mut state = AppState::load(state_storage).unwrap();
        state.settings.tax_rate = 9.0;
        state.settings.include_tax = false;
        state.persist_settings().unwrap();

        let reloaded = state.storage.load_settings().unwrap();
        assert_eq!(reloaded.tax_rate, 9.0);
        assert!(!reloaded.include_tax);
    }
}
