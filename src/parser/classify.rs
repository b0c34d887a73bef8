// Header classification and the price waterfall for rate-card rows.
//
// Rate cards arrive with unpredictable column naming ("ERP Price",
// "erp_price", "List Price ($)", ...), so every header is normalized and
// matched against fixed alias lists rather than a schema.

use crate::model::EntryDraft;
use crate::normalizer::{normalize_key, normalize_token};
use crate::utils::parse_money;
use std::collections::HashMap;

/// One CSV row as an ordered (raw header, raw cell) mapping.
pub type RawRow = Vec<(String, String)>;

pub const NAME_ALIASES: &[&str] = &["skutitle", "producttitle", "productname", "description"];
pub const ERP_ALIASES: &[&str] = &["erp", "erpprice", "listprice"];
pub const UNIT_SELL_ALIASES: &[&str] = &["unitsellprice", "unitsell", "price"];
pub const DISCOUNT_ALIASES: &[&str] = &["discountedprice", "discountprice", "cost"];
pub const SKU_ID_ALIASES: &[&str] = &["skuid", "sku"];
pub const PRODUCT_ID_ALIASES: &[&str] = &["productid", "itemnumber"];
pub const PART_NUMBER_ALIASES: &[&str] = &["partnumber"];

const PRICE_MARKERS: &[&str] = &["erp", "listprice", "unitsell", "price", "discountedprice", "cost"];
const CORE_MARKERS: &[&str] = &[
    "skutitle",
    "producttitle",
    "productname",
    "description",
    "skuid",
    "productid",
    "partnumber",
    "publisher",
    "changeindicator",
    "itemnumber",
    "sku",
];

fn is_price_column(clean_key: &str) -> bool {
    PRICE_MARKERS.iter().any(|m| clean_key.contains(m))
}

fn is_core_column(clean_key: &str) -> bool {
    CORE_MARKERS.iter().any(|m| clean_key.contains(m))
}

/// Normalized-header lookup for one row. First occurrence wins on collisions.
pub struct KeyMap {
    columns: HashMap<String, usize>,
}

impl KeyMap {
    pub fn build(row: &RawRow) -> Self {
        let mut columns = HashMap::new();
        for (idx, (header, _)) in row.iter().enumerate() {
            columns.entry(normalize_key(header)).or_insert(idx);
        }
        Self { columns }
    }

    /// Column index of the first alias present, in alias-list order.
    pub fn first_of(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.columns.get(*a).copied())
    }
}

/// Semantic roles resolved for one row, plus the side products of the scan:
/// the search blob and the differentiator values.
pub struct RowProfile {
    pub name: Option<usize>,
    pub erp: Option<usize>,
    pub unit_sell: Option<usize>,
    pub discounted: Option<usize>,
    pub sku_id: Option<usize>,
    pub product_id: Option<usize>,
    pub part_number: Option<usize>,
    pub search_blob: String,
    pub differentiators: Vec<String>,
}

pub fn classify_row(row: &RawRow) -> RowProfile {
    let keys = KeyMap::build(row);

    let mut blob_parts: Vec<String> = Vec::new();
    let mut differentiators: Vec<String> = Vec::new();
    for (header, cell) in row {
        let value = cell.trim();
        if value.is_empty() {
            continue;
        }
        let clean_key = normalize_key(header);
        let price = is_price_column(&clean_key);
        if !price {
            blob_parts.push(normalize_token(value));
        }
        let lowered = value.to_lowercase();
        if !price && !is_core_column(&clean_key) && lowered != "null" && lowered != "na" {
            differentiators.push(value.to_string());
        }
    }

    RowProfile {
        name: keys.first_of(NAME_ALIASES),
        erp: keys.first_of(ERP_ALIASES),
        unit_sell: keys.first_of(UNIT_SELL_ALIASES),
        discounted: keys.first_of(DISCOUNT_ALIASES),
        sku_id: keys.first_of(SKU_ID_ALIASES),
        product_id: keys.first_of(PRODUCT_ID_ALIASES),
        part_number: keys.first_of(PART_NUMBER_ALIASES),
        search_blob: blob_parts.join(" "),
        differentiators,
    }
}

/// The cell at `idx`, trimmed, if it is non-blank.
pub fn nonblank(row: &RawRow, idx: Option<usize>) -> Option<&str> {
    idx.map(|i| row[i].1.trim()).filter(|v| !v.is_empty())
}

/// Waterfall rule: the first of ERP / unit-sell / discounted that parses to a
/// positive value wins; failing that, the first that is non-blank at all wins,
/// whatever it parses to (zero and negative prices pass through here).
pub fn select_price(row: &RawRow, profile: &RowProfile) -> Option<f64> {
    let candidates = [profile.erp, profile.unit_sell, profile.discounted];
    for idx in candidates {
        if let Some(v) = nonblank(row, idx) {
            let parsed = parse_money(v);
            if parsed > 0.0 {
                return Some(parsed);
            }
        }
    }
    for idx in candidates {
        if let Some(v) = nonblank(row, idx) {
            return Some(parse_money(v));
        }
    }
    None
}

/// Resolves one price field from its own cell, else the waterfall value.
fn resolve_price(row: &RawRow, idx: Option<usize>, base: f64) -> f64 {
    match nonblank(row, idx) {
        Some(v) => parse_money(v),
        None => base,
    }
}

/// Builds a catalog entry draft from one row. `None` when the row has no
/// resolvable name column or no price cell at all.
pub fn build_draft(row: &RawRow, source_file: &str) -> Option<EntryDraft> {
    let profile = classify_row(row);
    let name_idx = profile.name?;
    let base = select_price(row, &profile)?;

    let title = row[name_idx].1.trim().to_string();
    let mut display_name = title.clone();
    let id_columns = [profile.sku_id, profile.product_id, profile.part_number];
    if let Some(id) = id_columns.into_iter().find_map(|idx| nonblank(row, idx)) {
        display_name.push_str(&format!(" [{id}]"));
    }
    if !profile.differentiators.is_empty() {
        display_name.push_str(&format!(" [{}]", profile.differentiators.join(" | ")));
    }

    let identifier_keys: Vec<String> = id_columns
        .into_iter()
        .filter_map(|idx| nonblank(row, idx))
        .map(normalize_key)
        .collect();

    Some(EntryDraft {
        source_file: source_file.to_string(),
        display_name,
        title,
        search_blob: profile.search_blob,
        identifier_keys,
        erp_price: resolve_price(row, profile.erp, base),
        unit_sell_price: resolve_price(row, profile.unit_sell, base),
        discounted_price: resolve_price(row, profile.discounted, base),
    })
}

/// Normalized identifier set for one row of a no-rebate list. Only the
/// SKU / product id / part number columns are consulted.
pub fn identifier_set(row: &RawRow) -> Vec<String> {
    let keys = KeyMap::build(row);
    [
        keys.first_of(SKU_ID_ALIASES),
        keys.first_of(PRODUCT_ID_ALIASES),
        keys.first_of(PART_NUMBER_ALIASES),
    ]
    .into_iter()
    .filter_map(|idx| nonblank(row, idx))
    .map(normalize_key)
    .collect()
}
