// Quote cart: snapshot lines, quantity/discount mutation, totals.
use crate::model::{CatalogEntry, QuoteLine, QuoteTotals, Settings, StorageError};
use crate::state::AppState;
use crate::utils::generate_id;

fn clamp_percent(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        0.0
    } else if value > 100.0 {
        100.0
    } else {
        value
    }
}

/// Snapshots a catalog entry into a new quote line. Catalog mutations after
/// this point never reach existing lines. Rebate-locked entries enter with a
/// zero discount that stays zero.
pub fn add_line(
    state: &mut AppState,
    entry: &CatalogEntry,
    default_discount: f64,
) -> Result<String, StorageError> {
    let line = QuoteLine {
        cart_id: generate_id(),
        display_name: entry.display_name.clone(),
        title: if entry.title.is_empty() {
            entry.display_name.clone()
        } else {
            entry.title.clone()
        },
        erp_price: entry.erp_price,
        unit_sell_price: entry.unit_sell_price,
        discounted_price: entry.discounted_price,
        no_rebate_locked: entry.no_rebate_locked,
        quantity: 1,
        extra_discount_percent: if entry.no_rebate_locked {
            0.0
        } else {
            clamp_percent(default_discount)
        },
    };
    state.storage.save_quote_line(&line)?;
    let cart_id = line.cart_id.clone();
    state.cart.push(line);
    Ok(cart_id)
}

/// Adds `delta` to the line's quantity, never dropping below one.
/// Returns false when no line carries that id.
pub fn update_quantity(
    state: &mut AppState,
    cart_id: &str,
    delta: i64,
) -> Result<bool, StorageError> {
    let Some(line) = state.cart.iter_mut().find(|l| l.cart_id == cart_id) else {
        return Ok(false);
    };
    line.quantity = (line.quantity as i64 + delta).max(1) as u32;
    state.storage.update_quote_line(line)?;
    Ok(true)
}

/// Clamps to [0,100]. A no-op on rebate-locked lines, whatever the value.
pub fn set_discount(state: &mut AppState, cart_id: &str, value: f64) -> Result<bool, StorageError> {
    let Some(line) = state.cart.iter_mut().find(|l| l.cart_id == cart_id) else {
        return Ok(false);
    };
    if line.no_rebate_locked {
        return Ok(true);
    }
    line.extra_discount_percent = clamp_percent(value);
    state.storage.update_quote_line(line)?;
    Ok(true)
}

pub fn remove_line(state: &mut AppState, cart_id: &str) -> Result<bool, StorageError> {
    let before = state.cart.len();
    state.cart.retain(|l| l.cart_id != cart_id);
    if state.cart.len() == before {
        return Ok(false);
    }
    state.storage.delete_quote_line(cart_id)?;
    Ok(true)
}

pub fn clear_cart(state: &mut AppState) -> Result<(), StorageError> {
    state.cart.clear();
    state.storage.clear_quote()
}

/// Wipes the whole database: catalog, quote cart and every rebate lock go
/// together. Settings survive.
pub fn wipe(state: &mut AppState) -> Result<(), StorageError> {
    state.catalog.clear();
    state.cart.clear();
    state.storage.wipe()
}

pub fn set_tax_rate(state: &mut AppState, value: f64) -> Result<(), StorageError> {
    state.settings.tax_rate = clamp_percent(value);
    state.persist_settings()
}

pub fn set_include_tax(state: &mut AppState, include: bool) -> Result<(), StorageError> {
    state.settings.include_tax = include;
    state.persist_settings()
}

pub fn toggle_sidebar(state: &mut AppState) -> Result<bool, StorageError> {
    state.settings.sidebar_collapsed = !state.settings.sidebar_collapsed;
    state.persist_settings()?;
    Ok(state.settings.sidebar_collapsed)
}

/// Discounts apply to the discounted (cost) price; locked lines keep it as is.
pub fn final_unit_price(line: &QuoteLine) -> f64 {
    if line.no_rebate_locked {
        line.discounted_price
    } else {
        line.discounted_price * (1.0 - line.extra_discount_percent / 100.0)
    }
}

pub fn line_total(line: &QuoteLine) -> f64 {
    final_unit_price(line) * line.quantity as f64
}

pub fn compute_totals(cart: &[QuoteLine], settings: &Settings) -> QuoteTotals {
    let subtotal: f64 = cart.iter().map(line_total).sum();
    let tax_amount = if settings.include_tax {
        subtotal * settings.tax_rate / 100.0
    } else {
        0.0
    };
    QuoteTotals {
        subtotal,
        tax_rate: settings.tax_rate,
        tax_amount,
        grand_total: subtotal + tax_amount,
        include_tax: settings.include_tax,
    }
}
