// Token search over normalized catalog blobs.
use crate::model::CatalogEntry;
use crate::normalizer::normalize_key;

pub const RESULT_LIMIT: usize = 100;

/// AND-of-tokens substring match: every whitespace-separated query token,
/// stripped to alphanumerics, must appear somewhere in the entry's stripped
/// search blob. A token that strips to nothing always matches. Results keep
/// catalog order and cap at `RESULT_LIMIT`; no ranking, no fuzziness.
pub fn search<'a>(
    catalog: &'a [CatalogEntry],
    query: &str,
    scope_file: Option<&str>,
) -> Vec<&'a CatalogEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() || catalog.is_empty() {
        return Vec::new();
    }
    let tokens: Vec<String> = query.split_whitespace().map(normalize_key).collect();

    catalog
        .iter()
        .filter(|entry| scope_file.is_none_or(|f| entry.source_file == f))
        .filter(|entry| {
            let squished = normalize_key(&entry.search_blob);
            tokens
                .iter()
                .all(|t| t.is_empty() || squished.contains(t.as_str()))
        })
        .take(RESULT_LIMIT)
        .collect()
}
