// Multi-file rate-card ingestion: independent parse jobs, one merge lock.
use crate::loader::Loader;
use crate::model::{CatalogEntry, CatalogError, IngestReport};
use crate::parser::{ParsedRateCard, Parser};
use crate::state::AppState;
use crate::utils::generate_id;
use chrono::Utc;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Ingests every given rate card into the shared catalog. Each file loads and
/// parses as an independent job; a completed job takes the state lock to
/// merge and persist, so overlapping completions accumulate in place.
pub async fn ingest_files<L: Loader, P: Parser + Sync>(
    state: &Mutex<AppState>,
    loader: &L,
    parser: &P,
    paths: &[PathBuf],
) -> Result<IngestReport, CatalogError> {
    if paths.is_empty() {
        return Err(CatalogError::Precondition(
            "select at least one master rate-card file first".into(),
        ));
    }

    let jobs = paths.iter().map(|path| ingest_one(state, loader, parser, path));
    let outcomes = join_all(jobs).await;

    let mut report = IngestReport::default();
    for outcome in outcomes {
        report.files += 1;
        report.added += outcome.added;
        report.duplicates += outcome.duplicates;
        report.failed += outcome.failed;
    }
    info!(
        "Ingest complete: {} added, {} duplicates, {} failed across {} file(s)",
        report.added, report.duplicates, report.failed, report.files
    );
    Ok(report)
}

struct FileOutcome {
    added: usize,
    duplicates: usize,
    failed: usize,
}

impl FileOutcome {
    fn empty() -> Self {
        Self { added: 0, duplicates: 0, failed: 0 }
    }
}

async fn ingest_one<L: Loader, P: Parser + Sync>(
    state: &Mutex<AppState>,
    loader: &L,
    parser: &P,
    path: &Path,
) -> FileOutcome {
    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let text = match loader.load(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Skipping {}: {}", source_file, e);
            return FileOutcome::empty();
        }
    };

    // A structurally broken file yields zero usable rows; the batch goes on.
    let ParsedRateCard { drafts, failed_rows } = match parser.parse_rate_card(&text, &source_file) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Parse error in {}: {}", source_file, e);
            return FileOutcome::empty();
        }
    };

    let mut added = 0;
    let mut duplicates = 0;
    let mut guard = state.lock().await;
    for draft in drafts {
        if guard.is_duplicate(&draft.display_name, draft.erp_price) {
            duplicates += 1;
            continue;
        }
        let entry = CatalogEntry {
            id: generate_id(),
            source_file: draft.source_file,
            display_name: draft.display_name,
            title: draft.title,
            search_blob: draft.search_blob,
            identifier_keys: draft.identifier_keys,
            erp_price: draft.erp_price,
            unit_sell_price: draft.unit_sell_price,
            discounted_price: draft.discounted_price,
            no_rebate_locked: false,
            added_at: Utc::now(),
        };
        if let Err(e) = guard.storage.save_entry(&entry) {
            warn!("DB save error for {}: {:?}", entry.display_name, e);
            continue;
        }
        guard.catalog.push(entry);
        added += 1;
    }
    info!(
        "{}: {} added, {} duplicates, {} failed",
        source_file, added, duplicates, failed_rows
    );
    FileOutcome { added, duplicates, failed: failed_rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LoadError;
    use crate::parser::CsvParser;
    use crate::storage::SqliteStorage;
    use std::collections::HashMap;

    struct MemLoader(HashMap<PathBuf, String>);

    impl MemLoader {
        fn with(files: &[(&str, &str)]) -> Self {
            Self(
                files
                    .iter()
                    .map(|(p, t)| (PathBuf::from(p), t.to_string()))
                    .collect(),
            )
        }
    }

    #[async_trait::async_trait]
    impl Loader for MemLoader {
        async fn load(&self, path: &Path) -> Result<String, LoadError> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
        }
    }

    fn test_state() -> Mutex<AppState> {
        Mutex::new(AppState::load(SqliteStorage::open_in_memory().unwrap()).unwrap())
    }

    #[tokio::test]
    async fn rejects_empty_file_selection() {
        let state = test_state();
        let result =
            ingest_files(&state, &MemLoader::with(&[]), &CsvParser::new(), &[]).await;
        assert!(matches!(result, Err(CatalogError::Precondition(_))));
        assert!(state.lock().await.catalog.is_empty());
    }

    #[tokio::test]
    async fn accumulates_entries_across_files() {
        let state = test_state();
        let loader = MemLoader::with(&[
            ("a.csv", "SKU Title,ERP,SKU ID\nWidget A,100,W1\n"),
            ("b.csv", "SKU Title,ERP,SKU ID\nWidget B,200,W2\nWidget C,,\n"),
        ]);
        let paths = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];

        let report = ingest_files(&state, &loader, &CsvParser::new(), &paths)
            .await
            .unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.added, 2);
        assert_eq!(report.duplicates, 0);
        assert_eq!(report.failed, 1);

        let guard = state.lock().await;
        assert_eq!(guard.catalog.len(), 2);
        // every added entry was persisted as well
        assert_eq!(guard.storage.load_catalog().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn same_name_and_erp_across_files_dedupes() {
        let state = test_state();
        let loader = MemLoader::with(&[
            ("a.csv", "SKU Title,ERP,SKU ID\nWidget A,100,W1\n"),
            ("b.csv", "SKU Title,ERP,SKU ID\nWidget A,100,W1\n"),
        ]);
        let paths = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];

        let report = ingest_files(&state, &loader, &CsvParser::new(), &paths)
            .await
            .unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(state.lock().await.catalog.len(), 1);
    }

    #[tokio::test]
    async fn same_name_with_different_erp_is_not_a_duplicate() {
        let state = test_state();
        let loader = MemLoader::with(&[
            ("a.csv", "SKU Title,ERP\nWidget A,100\nWidget A,150\n"),
        ]);
        let report = ingest_files(
            &state,
            &loader,
            &CsvParser::new(),
            &[PathBuf::from("a.csv")],
        )
        .await
        .unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(report.duplicates, 0);
    }

    #[tokio::test]
    async fn missing_file_contributes_nothing() {
        let state = test_state();
        let loader = MemLoader::with(&[("a.csv", "SKU Title,ERP\nWidget A,100\n")]);
        let paths = vec![PathBuf::from("a.csv"), PathBuf::from("gone.csv")];

        let report = ingest_files(&state, &loader, &CsvParser::new(), &paths)
            .await
            .unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.added, 1);
    }

    #[tokio::test]
    async fn ingested_entry_quotes_end_to_end() {
        let state = test_state();
        let loader = MemLoader::with(&[("a.csv", "SKU Title,ERP,SKU ID\nWidget A,100,W1\n")]);
        ingest_files(&state, &loader, &CsvParser::new(), &[PathBuf::from("a.csv")])
            .await
            .unwrap();

        let mut guard = state.lock().await;
        let entry = guard.catalog[0].clone();
        // no distinct discounted column: it defaulted to the ERP value
        assert_eq!(entry.discounted_price, 100.0);

        let cart_id = crate::quote::add_line(&mut guard, &entry, 10.0).unwrap();
        crate::quote::update_quantity(&mut guard, &cart_id, 1).unwrap();

        let line = &guard.cart[0];
        assert!((crate::quote::final_unit_price(line) - 90.0).abs() < 1e-9);
        assert!((crate::quote::line_total(line) - 180.0).abs() < 1e-9);

        // default settings: 18% tax, included
        let totals = crate::quote::compute_totals(&guard.cart, &guard.settings);
        assert!((totals.grand_total - 212.40).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rebate_locks_survive_further_ingests() {
        let state = test_state();
        let loader = MemLoader::with(&[
            ("a.csv", "SKU Title,ERP,SKU ID\nWidget A,100,W1\n"),
            ("b.csv", "SKU Title,ERP,SKU ID\nWidget B,200,W2\n"),
        ]);
        ingest_files(&state, &loader, &CsvParser::new(), &[PathBuf::from("a.csv")])
            .await
            .unwrap();
        {
            let mut guard = state.lock().await;
            guard.catalog[0].no_rebate_locked = true;
        }
        ingest_files(&state, &loader, &CsvParser::new(), &[PathBuf::from("b.csv")])
            .await
            .unwrap();

        let guard = state.lock().await;
        assert_eq!(guard.catalog.len(), 2);
        assert!(guard.catalog[0].no_rebate_locked);
        assert!(!guard.catalog[1].no_rebate_locked);
    }
}
