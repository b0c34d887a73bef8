// No-rebate cross-reference: locks catalog entries by identifier match.
use crate::loader::Loader;
use crate::model::{CatalogError, CrossRefReport, LoadError};
use crate::parser::Parser;
use crate::state::AppState;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Unmatched rows are logged individually up to this count.
const UNMATCHED_WARN_LIMIT: usize = 20;

/// Applies a no-rebate list to the catalog: every entry sharing a normalized
/// identifier with a list row gets `no_rebate_locked` set. The lock is a
/// one-way transition undone only by a full wipe, so re-running the same list
/// reports zero newly locked entries.
pub async fn cross_reference<L: Loader, P: Parser>(
    state: &Mutex<AppState>,
    loader: &L,
    parser: &P,
    path: &Path,
) -> Result<CrossRefReport, CatalogError> {
    {
        let guard = state.lock().await;
        if guard.catalog.is_empty() {
            return Err(CatalogError::Precondition(
                "ingest a master rate card before applying no-rebate rules".into(),
            ));
        }
    }

    let text = loader.load(path).await.map_err(|e| match e {
        LoadError::NotFound(p) => {
            CatalogError::Precondition(format!("no-rebate file not found: {}", p.display()))
        }
        other => CatalogError::Load(other),
    })?;
    let id_rows = parser.parse_identifier_rows(&text)?;

    let mut report = CrossRefReport::default();
    let mut guard = state.lock().await;
    let AppState { catalog, storage, .. } = &mut *guard;

    for id_row in &id_rows {
        report.rows += 1;
        let wanted: Vec<&str> = id_row
            .iter()
            .map(String::as_str)
            .filter(|k| !k.is_empty())
            .collect();
        if wanted.is_empty() {
            report.unmatched += 1;
            continue;
        }

        let mut match_found = false;
        for entry in catalog.iter_mut() {
            let hit = entry
                .identifier_keys
                .iter()
                .any(|k| !k.is_empty() && wanted.contains(&k.as_str()));
            if !hit {
                continue;
            }
            match_found = true;
            if !entry.no_rebate_locked {
                entry.no_rebate_locked = true;
                if let Err(e) = storage.set_no_rebate_locked(&entry.id, true) {
                    warn!("DB lock update failed for {}: {:?}", entry.display_name, e);
                }
                report.newly_locked += 1;
            }
        }

        if !match_found {
            report.unmatched += 1;
            if report.unmatched <= UNMATCHED_WARN_LIMIT {
                warn!("No-rebate identifiers not in catalog: {}", wanted.join(", "));
            }
        }
    }

    info!(
        "Cross-reference complete: {} rows, {} newly locked, {} unmatched",
        report.rows, report.newly_locked, report.unmatched
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogEntry, LoadError};
    use crate::parser::CsvParser;
    use crate::storage::SqliteStorage;
    use chrono::Utc;

    struct OneFile(String);

    #[async_trait::async_trait]
    impl Loader for OneFile {
        async fn load(&self, path: &Path) -> Result<String, LoadError> {
            if path == Path::new("nr.csv") {
                Ok(self.0.clone())
            } else {
                Err(LoadError::NotFound(path.to_path_buf()))
            }
        }
    }

    fn entry(display_name: &str, keys: &[&str]) -> CatalogEntry {
        CatalogEntry {
            id: crate::utils::generate_id(),
            source_file: "cards.csv".into(),
            display_name: display_name.into(),
            title: display_name.into(),
            search_blob: display_name.to_lowercase(),
            identifier_keys: keys.iter().map(|k| k.to_string()).collect(),
            erp_price: 100.0,
            unit_sell_price: 100.0,
            discounted_price: 100.0,
            no_rebate_locked: false,
            added_at: Utc::now(),
        }
    }

    async fn state_with(entries: Vec<CatalogEntry>) -> Mutex<AppState> {
        let mut state = AppState::load(SqliteStorage::open_in_memory().unwrap()).unwrap();
        for e in entries {
            state.storage.save_entry(&e).unwrap();
            state.catalog.push(e);
        }
        Mutex::new(state)
    }

    #[tokio::test]
    async fn requires_a_loaded_catalog() {
        let state = state_with(Vec::new()).await;
        let result = cross_reference(
            &state,
            &OneFile("SKU ID\nW1\n".into()),
            &CsvParser::new(),
            Path::new("nr.csv"),
        )
        .await;
        assert!(matches!(result, Err(CatalogError::Precondition(_))));
    }

    #[tokio::test]
    async fn missing_file_is_a_precondition_failure() {
        let state = state_with(vec![entry("Widget A", &["w1"])]).await;
        let result = cross_reference(
            &state,
            &OneFile(String::new()),
            &CsvParser::new(),
            Path::new("missing.csv"),
        )
        .await;
        assert!(matches!(result, Err(CatalogError::Precondition(_))));
        assert!(!state.lock().await.catalog[0].no_rebate_locked);
    }

    #[tokio::test]
    async fn locks_every_matching_entry() {
        let state = state_with(vec![
            entry("Widget A", &["w1"]),
            entry("Widget A bundle", &["w1", "b7"]),
            entry("Widget B", &["w2"]),
        ])
        .await;
        let loader = OneFile("SKU ID,Reason\nW-1,eol\nZZ-9,unknown\n".into());

        let report = cross_reference(&state, &loader, &CsvParser::new(), Path::new("nr.csv"))
            .await
            .unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(report.newly_locked, 2);
        assert_eq!(report.unmatched, 1);

        let guard = state.lock().await;
        assert!(guard.catalog[0].no_rebate_locked);
        assert!(guard.catalog[1].no_rebate_locked);
        assert!(!guard.catalog[2].no_rebate_locked);
        // the mutation was persisted
        let persisted = guard.storage.load_catalog().unwrap();
        assert!(persisted.iter().any(|e| e.no_rebate_locked));
    }

    #[tokio::test]
    async fn second_run_reports_nothing_newly_locked() {
        let state = state_with(vec![entry("Widget A", &["w1"]), entry("Widget B", &["w2"])]).await;
        let loader = OneFile("SKU ID\nW1\nNOPE\n".into());

        let first = cross_reference(&state, &loader, &CsvParser::new(), Path::new("nr.csv"))
            .await
            .unwrap();
        assert_eq!(first.newly_locked, 1);
        assert_eq!(first.unmatched, 1);

        let second = cross_reference(&state, &loader, &CsvParser::new(), Path::new("nr.csv"))
            .await
            .unwrap();
        assert_eq!(second.newly_locked, 0);
        assert_eq!(second.unmatched, 1);
    }

    #[tokio::test]
    async fn rows_without_identifiers_count_as_unmatched() {
        let state = state_with(vec![entry("Widget A", &["w1"])]).await;
        // the identifier column normalizes to empty on row 2
        let loader = OneFile("SKU ID,Note\nW1,ok\n#,blank id\n".into());

        let report = cross_reference(&state, &loader, &CsvParser::new(), Path::new("nr.csv"))
            .await
            .unwrap();
        assert_eq!(report.newly_locked, 1);
        assert_eq!(report.unmatched, 1);
    }

    #[tokio::test]
    async fn empty_identifier_keys_never_match_empty_ids() {
        // entry carries a normalized-to-empty key; it must not match anything
        let state = state_with(vec![entry("Widget X", &[""])]).await;
        let loader = OneFile("SKU ID\n#\n".into());

        let report = cross_reference(&state, &loader, &CsvParser::new(), Path::new("nr.csv"))
            .await
            .unwrap();
        assert_eq!(report.newly_locked, 0);
        assert_eq!(report.unmatched, 1);
        assert!(!state.lock().await.catalog[0].no_rebate_locked);
    }
}
