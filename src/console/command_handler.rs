// console/command_handler.rs

use super::Console;
use crate::catalog::{cross_reference, ingest, search};
use crate::model::CatalogError;
use crate::quote;
use crate::report;
use crate::utils::format_inr;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handles one console command and prints the outcome.
pub async fn handle_command(line: &str, console: &mut Console) {
    info!("Handling command: {}", line);
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    match command {
        "/help" => {
            let help_msg = "📋 Available commands:\n\
                /ingest <file...> — ingest master rate-card CSVs\n\
                /norebate <file> — apply a no-rebate list\n\
                /filter <file|all> — restrict /search to one catalog\n\
                /search <query> — token search over the catalog\n\
                /add <result#> [disc%] — add a search hit to the quote\n\
                /cart — show the quote builder\n\
                /qty <line#> <delta> — bump a line's quantity\n\
                /discount <line#> <pct> — set a line's extra discount\n\
                /remove <line#> — drop a line\n\
                /clearcart — empty the quote\n\
                /tax <rate> — set the tax rate\n\
                /taxmode on|off — include or exclude tax\n\
                /sidebar — toggle the collapsed-sidebar flag\n\
                /preview — first 100 catalog entries\n\
                /files — per-catalog overview\n\
                /quote — render the email-style summary\n\
                /wipe confirm — wipe the pricing database\n\
                /status — state summary\n\
                /uptime — session uptime\n\
                /exit — quit";
            console.reply(help_msg);
        }
        "/status" => {
            let guard = console.state.lock().await;
            let totals = quote::compute_totals(&guard.cart, &guard.settings);
            console.reply(&format!(
                "📊 {} catalog entries | {} quote lines | grand total {} | tax {}% ({})",
                guard.catalog.len(),
                guard.cart.len(),
                format_inr(totals.grand_total),
                guard.settings.tax_rate,
                if guard.settings.include_tax { "included" } else { "excluded" },
            ));
        }
        "/uptime" => {
            let uptime = console.start_time.elapsed();
            console.reply(&format!(
                "⏱ Uptime: {:02}:{:02}:{:02}",
                uptime.as_secs() / 3600,
                (uptime.as_secs() % 3600) / 60,
                uptime.as_secs() % 60
            ));
        }
        "/ingest" => {
            let paths: Vec<PathBuf> = args.iter().map(PathBuf::from).collect();
            match ingest::ingest_files(&console.state, &console.loader, &console.parser, &paths).await {
                Ok(r) => console.reply(&format!(
                    "✅ Processed {} file(s): {} added | {} duplicates skipped | {} failed",
                    r.files, r.added, r.duplicates, r.failed
                )),
                Err(CatalogError::Precondition(msg)) => console.reply(&format!("⚠️ {msg}")),
                Err(e) => console.reply(&format!("❌ Ingest error: {e}")),
            }
        }
        "/norebate" => {
            let Some(path) = args.first() else {
                console.reply("⚠️ Usage: /norebate <file>");
                return;
            };
            match cross_reference::cross_reference(
                &console.state,
                &console.loader,
                &console.parser,
                Path::new(path),
            )
            .await
            {
                Ok(r) => console.reply(&format!(
                    "✅ Processed {} row(s): {} locked | {} not found",
                    r.rows, r.newly_locked, r.unmatched
                )),
                Err(CatalogError::Precondition(msg)) => console.reply(&format!("⚠️ {msg}")),
                Err(e) => console.reply(&format!("❌ Cross-reference error: {e}")),
            }
        }
        "/filter" => {
            let Some(target) = args.first() else {
                console.reply("⚠️ Usage: /filter <file|all>");
                return;
            };
            if *target == "all" {
                console.scope_file = None;
                console.reply("🔎 Searching all catalogs.");
                return;
            }
            let known = {
                let guard = console.state.lock().await;
                guard.catalog.iter().any(|e| e.source_file == *target)
            };
            if known {
                console.scope_file = Some(target.to_string());
                console.reply(&format!("🔎 Searching only {target}."));
            } else {
                console.reply(&format!("⚠️ No catalog named {target} is loaded."));
            }
        }
        "/search" => {
            let query = args.join(" ");
            let hits: Vec<_> = {
                let guard = console.state.lock().await;
                search::search(&guard.catalog, &query, console.scope_file.as_deref())
                    .into_iter()
                    .cloned()
                    .collect()
            };
            console.last_results = hits;
            console.reply(&report::render_search_results(&console.last_results));
        }
        "/add" => {
            let Some(idx) = args.first().and_then(|a| a.parse::<usize>().ok()) else {
                console.reply("⚠️ Usage: /add <result#> [disc%]");
                return;
            };
            let Some(entry) = idx.checked_sub(1).and_then(|i| console.last_results.get(i)).cloned()
            else {
                console.reply("⚠️ No such search result. Run /search first.");
                return;
            };
            let discount = args
                .get(1)
                .and_then(|a| a.parse::<f64>().ok())
                .unwrap_or(console.config.default_discount_percent);
            let mut guard = console.state.lock().await;
            match quote::add_line(&mut guard, &entry, discount) {
                Ok(_) => console.reply(&format!(
                    "🛒 Added {} (quote now {} line(s))",
                    entry.display_name,
                    guard.cart.len()
                )),
                Err(e) => console.reply(&format!("❌ Add failed: {e}")),
            }
        }
        "/cart" => {
            let guard = console.state.lock().await;
            console.reply(&report::render_builder_table(&guard.cart));
        }
        "/qty" => {
            let (Some(idx), Some(delta)) = (
                args.first().and_then(|a| a.parse::<usize>().ok()),
                args.get(1).and_then(|a| a.parse::<i64>().ok()),
            ) else {
                console.reply("⚠️ Usage: /qty <line#> <delta>");
                return;
            };
            let mut guard = console.state.lock().await;
            let Some(cart_id) = idx
                .checked_sub(1)
                .and_then(|i| guard.cart.get(i))
                .map(|l| l.cart_id.clone())
            else {
                console.reply("⚠️ No such quote line.");
                return;
            };
            match quote::update_quantity(&mut guard, &cart_id, delta) {
                Ok(_) => {
                    let qty = guard.cart[idx - 1].quantity;
                    console.reply(&format!("✅ Quantity is now {qty}."));
                }
                Err(e) => console.reply(&format!("❌ Update failed: {e}")),
            }
        }
        "/discount" => {
            let (Some(idx), Some(pct)) = (
                args.first().and_then(|a| a.parse::<usize>().ok()),
                args.get(1).and_then(|a| a.parse::<f64>().ok()),
            ) else {
                console.reply("⚠️ Usage: /discount <line#> <pct>");
                return;
            };
            let mut guard = console.state.lock().await;
            let Some(line) = idx.checked_sub(1).and_then(|i| guard.cart.get(i)) else {
                console.reply("⚠️ No such quote line.");
                return;
            };
            if line.no_rebate_locked {
                console.reply("🔒 Discounts are locked for this item.");
                return;
            }
            let cart_id = line.cart_id.clone();
            match quote::set_discount(&mut guard, &cart_id, pct) {
                Ok(_) => {
                    let pct = guard.cart[idx - 1].extra_discount_percent;
                    console.reply(&format!("✅ Extra discount is now {pct}%."));
                }
                Err(e) => console.reply(&format!("❌ Update failed: {e}")),
            }
        }
        "/remove" => {
            let Some(idx) = args.first().and_then(|a| a.parse::<usize>().ok()) else {
                console.reply("⚠️ Usage: /remove <line#>");
                return;
            };
            let mut guard = console.state.lock().await;
            let Some(cart_id) = idx
                .checked_sub(1)
                .and_then(|i| guard.cart.get(i))
                .map(|l| l.cart_id.clone())
            else {
                console.reply("⚠️ No such quote line.");
                return;
            };
            match quote::remove_line(&mut guard, &cart_id) {
                Ok(_) => console.reply("🗑 Line removed."),
                Err(e) => console.reply(&format!("❌ Remove failed: {e}")),
            }
        }
        "/clearcart" => {
            let mut guard = console.state.lock().await;
            match quote::clear_cart(&mut guard) {
                Ok(()) => console.reply("🗑 Quote cleared."),
                Err(e) => console.reply(&format!("❌ Clear failed: {e}")),
            }
        }
        "/tax" => {
            let Some(rate) = args.first().and_then(|a| a.parse::<f64>().ok()) else {
                console.reply("⚠️ Usage: /tax <rate>");
                return;
            };
            let mut guard = console.state.lock().await;
            match quote::set_tax_rate(&mut guard, rate) {
                Ok(()) => console.reply(&format!("✅ Tax rate is now {}%.", guard.settings.tax_rate)),
                Err(e) => console.reply(&format!("❌ Update failed: {e}")),
            }
        }
        "/taxmode" => {
            let include = match args.first() {
                Some(&"on") => true,
                Some(&"off") => false,
                _ => {
                    console.reply("⚠️ Usage: /taxmode on|off");
                    return;
                }
            };
            let mut guard = console.state.lock().await;
            match quote::set_include_tax(&mut guard, include) {
                Ok(()) => console.reply(&format!(
                    "✅ Tax is now {} in totals.",
                    if include { "included" } else { "excluded" }
                )),
                Err(e) => console.reply(&format!("❌ Update failed: {e}")),
            }
        }
        "/sidebar" => {
            let mut guard = console.state.lock().await;
            match quote::toggle_sidebar(&mut guard) {
                Ok(collapsed) => console.reply(&format!(
                    "✅ Sidebar flag is now {}.",
                    if collapsed { "collapsed" } else { "expanded" }
                )),
                Err(e) => console.reply(&format!("❌ Update failed: {e}")),
            }
        }
        "/preview" => {
            let guard = console.state.lock().await;
            console.reply(&report::render_catalog_preview(&guard.catalog));
        }
        "/files" => {
            let guard = console.state.lock().await;
            match guard.storage.get_catalog_overview() {
                Ok(overview) => {
                    console.reply(&report::render_catalog_overview(&overview, guard.catalog.len()));
                }
                Err(e) => console.reply(&format!("❌ Error: {e}")),
            }
        }
        "/quote" => {
            let guard = console.state.lock().await;
            if guard.cart.is_empty() {
                console.reply("⚠️ Please add items to your quote first.");
                return;
            }
            console.reply(&report::render_quote_summary(&guard.cart, &guard.settings));
        }
        "/wipe" => {
            if args.first() != Some(&"confirm") {
                console.reply(
                    "⚠️ This permanently wipes the saved pricing database. Run /wipe confirm.",
                );
                return;
            }
            let mut guard = console.state.lock().await;
            match quote::wipe(&mut guard) {
                Ok(()) => {
                    drop(guard);
                    console.last_results.clear();
                    console.scope_file = None;
                    console.reply("🗑 Pricing database wiped.");
                }
                Err(e) => console.reply(&format!("❌ Wipe failed: {e}")),
            }
        }
        _ => {
            console.reply("🤖 Unknown command. Type /help for a list of commands.");
        }
    }
}
