// Read-only text renderers over catalog and quote snapshots. Each call
// regenerates its whole output from the current state; nothing is cached.
use crate::model::{CatalogEntry, QuoteLine, Settings};
use crate::quote::{compute_totals, final_unit_price, line_total};
use crate::utils::format_inr;

const PREVIEW_LIMIT: usize = 100;

pub fn render_catalog_preview(catalog: &[CatalogEntry]) -> String {
    if catalog.is_empty() {
        return "Database is currently empty. Ingest a rate card first.".into();
    }
    let mut out = String::new();
    for entry in catalog.iter().take(PREVIEW_LIMIT) {
        let badge = if entry.no_rebate_locked { " [NO REBATE]" } else { "" };
        out.push_str(&format!(
            "{} | {} | ERP {} | Disc {}{}\n",
            entry.source_file,
            entry.display_name,
            format_inr(entry.erp_price),
            format_inr(entry.discounted_price),
            badge
        ));
    }
    if catalog.len() > PREVIEW_LIMIT {
        out.push_str(&format!("... and {} more\n", catalog.len() - PREVIEW_LIMIT));
    }
    out
}

/// Numbered search hits; the numbers feed /add.
pub fn render_search_results(results: &[CatalogEntry]) -> String {
    if results.is_empty() {
        return "No matches found. Try adjusting your terms.".into();
    }
    let mut out = String::new();
    for (i, entry) in results.iter().enumerate() {
        let nr = if entry.no_rebate_locked { "[NO REBATE] " } else { "" };
        out.push_str(&format!("{:>3}. {}{}\n", i + 1, nr, entry.display_name));
    }
    out
}

/// Working view of the quote, one numbered block per line.
pub fn render_builder_table(cart: &[QuoteLine]) -> String {
    if cart.is_empty() {
        return "Quote is empty. Search and add items first.".into();
    }
    let mut out = String::new();
    for (i, line) in cart.iter().enumerate() {
        let nr = if line.no_rebate_locked { " [NR]" } else { "" };
        out.push_str(&format!(
            "{:>3}. {}{}\n     ERP {} | Unit {} | Disc {}% | Final {} | Qty {} | Total {}\n",
            i + 1,
            line.display_name,
            nr,
            format_inr(line.erp_price),
            format_inr(line.discounted_price),
            line.extra_discount_percent,
            format_inr(final_unit_price(line)),
            line.quantity,
            format_inr(line_total(line)),
        ));
    }
    out
}

/// Email-style summary table. The description column leads with the product
/// title; the discounted column only appears when some line actually carries
/// a discount; subtotal and tax rows only appear when tax is included.
pub fn render_quote_summary(cart: &[QuoteLine], settings: &Settings) -> String {
    if cart.is_empty() {
        return "The quote is empty, nothing to render.".into();
    }
    let show_disc_column = cart.iter().any(|l| l.extra_discount_percent > 0.0);
    let totals = compute_totals(cart, settings);

    let mut header: Vec<String> = vec!["Description".into(), "ERP Price".into(), "Unit Price".into()];
    if show_disc_column {
        header.push("Discounted Price".into());
    }
    header.push("Qty".into());
    header.push("Ext. Total".into());

    let mut rows: Vec<Vec<String>> = vec![header];
    for line in cart {
        let description = if line.title.is_empty() {
            line.display_name.clone()
        } else {
            line.title.clone()
        };
        let mut row = vec![
            description,
            format_inr(line.erp_price),
            format_inr(line.discounted_price),
        ];
        if show_disc_column {
            // locked or undiscounted lines repeat the base price here
            let cell = if line.extra_discount_percent > 0.0 && !line.no_rebate_locked {
                format_inr(final_unit_price(line))
            } else {
                format_inr(line.discounted_price)
            };
            row.push(cell);
        }
        row.push(line.quantity.to_string());
        row.push(format_inr(line_total(line)));
        rows.push(row);
    }

    let widths: Vec<usize> = (0..rows[0].len())
        .map(|col| rows.iter().map(|r| r[col].chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .enumerate()
            .map(|(col, (cell, width))| {
                // description column left-aligned, everything else right
                if col == 0 {
                    format!("{:<w$}", cell, w = width)
                } else {
                    format!("{:>w$}", cell, w = width)
                }
            })
            .collect();
        out.push_str(&cells.join("  "));
        out.push('\n');
        if i == 0 {
            let total_width = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
            out.push_str(&"-".repeat(total_width));
            out.push('\n');
        }
    }

    out.push('\n');
    if totals.include_tax {
        out.push_str(&format!("Subtotal:    {}\n", format_inr(totals.subtotal)));
        out.push_str(&format!(
            "Tax ({}%): {}\n",
            totals.tax_rate,
            format_inr(totals.tax_amount)
        ));
        out.push_str(&format!("Grand Total: {}\n", format_inr(totals.grand_total)));
    } else {
        out.push_str(&format!("Total:       {}\n", format_inr(totals.grand_total)));
    }
    out
}

/// Per-catalog summary for the loaded database.
pub fn render_catalog_overview(overview: &[(String, usize, f64)], total_entries: usize) -> String {
    if overview.is_empty() {
        return "No catalogs loaded.".into();
    }
    let mut out = format!("Total loaded SKUs: {}\n", total_entries);
    for (file, count, avg_erp) in overview {
        out.push_str(&format!(
            "  {}: {} entries, avg ERP {}\n",
            file,
            count,
            format_inr(*avg_erp)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Settings;

    fn line(title: &str, price: f64, qty: u32, disc: f64, locked: bool) -> QuoteLine {
        QuoteLine {
            cart_id: crate::utils::generate_id(),
            display_name: format!("{title} [X1]"),
            title: title.into(),
            erp_price: price,
            unit_sell_price: price,
            discounted_price: price,
            no_rebate_locked: locked,
            quantity: qty,
            extra_discount_percent: disc,
        }
    }

    #[test]
    fn summary_hides_discount_column_when_unused() {
        let settings = Settings::default();
        let plain = render_quote_summary(&[line("Widget A", 100.0, 1, 0.0, false)], &settings);
        assert!(!plain.contains("Discounted Price"));

        let discounted = render_quote_summary(&[line("Widget A", 100.0, 1, 10.0, false)], &settings);
        assert!(discounted.contains("Discounted Price"));
        assert!(discounted.contains("₹ 90.00"));
    }

    #[test]
    fn summary_totals_follow_tax_setting() {
        let cart = vec![line("Widget A", 100.0, 2, 10.0, false)];
        let mut settings = Settings::default();

        let with_tax = render_quote_summary(&cart, &settings);
        assert!(with_tax.contains("Subtotal:"));
        assert!(with_tax.contains("Tax (18%):"));
        assert!(with_tax.contains("₹ 212.40"));

        settings.include_tax = false;
        let without_tax = render_quote_summary(&cart, &settings);
        assert!(!without_tax.contains("Subtotal:"));
        assert!(without_tax.contains("Total:"));
        assert!(without_tax.contains("₹ 180.00"));
    }

    #[test]
    fn summary_description_prefers_title_over_display_name() {
        let settings = Settings::default();
        let out = render_quote_summary(&[line("Widget A", 50.0, 1, 0.0, false)], &settings);
        let first_data_row = out.lines().nth(2).unwrap();
        assert!(first_data_row.starts_with("Widget A "));
        assert!(!first_data_row.contains("[X1]"));
    }

    #[test]
    fn builder_table_marks_locked_lines() {
        let out = render_builder_table(&[line("Widget A", 100.0, 1, 0.0, true)]);
        assert!(out.contains("[NR]"));
        assert!(render_builder_table(&[]).contains("Quote is empty"));
    }

    #[test]
    fn preview_tags_no_rebate_entries() {
        use crate::model::CatalogEntry;
        use chrono::Utc;
        let entry = CatalogEntry {
            id: "1".into(),
            source_file: "a.csv".into(),
            display_name: "Widget A".into(),
            title: "Widget A".into(),
            search_blob: "widget a".into(),
            identifier_keys: Vec::new(),
            erp_price: 100.0,
            unit_sell_price: 100.0,
            discounted_price: 90.0,
            no_rebate_locked: true,
            added_at: Utc::now(),
        };
        let out = render_catalog_preview(&[entry]);
        assert!(out.contains("[NO REBATE]"));
        assert!(out.contains("₹ 90.00"));
    }

    #[test]
    fn overview_lists_totals_per_file() {
        let out = render_catalog_overview(
            &[("a.csv".into(), 2, 200.0), ("b.csv".into(), 1, 50.0)],
            3,
        );
        assert!(out.contains("Total loaded SKUs: 3"));
        assert!(out.contains("a.csv: 2 entries, avg ERP ₹ 200.00"));
    }
}
