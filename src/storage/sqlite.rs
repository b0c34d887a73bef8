use crate::model::{CatalogEntry, QuoteLine, Settings, StorageError};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use tracing::warn;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database file, creating tables and running migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::bootstrap(Connection::open(db_path)?)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS catalog (
                id TEXT PRIMARY KEY,
                source_file TEXT NOT NULL,
                display_name TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                search_blob TEXT NOT NULL DEFAULT '',
                identifier_keys TEXT NOT NULL DEFAULT '[]',
                erp_price REAL NOT NULL,
                unit_sell_price REAL NOT NULL DEFAULT 0,
                discounted_price REAL NOT NULL DEFAULT 0,
                no_rebate_locked INTEGER NOT NULL DEFAULT 0,
                added_at TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS quote_cart (
                cart_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                erp_price REAL NOT NULL,
                unit_sell_price REAL NOT NULL DEFAULT 0,
                discounted_price REAL NOT NULL DEFAULT 0,
                no_rebate_locked INTEGER NOT NULL DEFAULT 0,
                quantity INTEGER NOT NULL DEFAULT 1,
                extra_discount_percent REAL NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        // Migrations for columns that arrived after the first schema version
        Self::migrate_add_column_if_missing(&conn, "catalog", "title", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(&conn, "catalog", "added_at", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(&conn, "quote_cart", "title", "TEXT NOT NULL DEFAULT ''")?;

        Ok(Self { conn })
    }

    /// Checks for a column and adds it to the table when absent.
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    /// Inserts a freshly ingested catalog entry. Plain INSERT only: rowid
    /// order is the display order and ids never repeat.
    pub fn save_entry(&self, entry: &CatalogEntry) -> Result<(), StorageError> {
        let identifier_keys = serde_json::to_string(&entry.identifier_keys)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO catalog (
                id, source_file, display_name, title, search_blob,
                identifier_keys, erp_price, unit_sell_price, discounted_price,
                no_rebate_locked, added_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &entry.id,
                &entry.source_file,
                &entry.display_name,
                &entry.title,
                &entry.search_blob,
                identifier_keys,
                entry.erp_price,
                entry.unit_sell_price,
                entry.discounted_price,
                entry.no_rebate_locked,
                entry.added_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn set_no_rebate_locked(&self, id: &str, locked: bool) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE catalog SET no_rebate_locked = ?2 WHERE id = ?1",
            params![id, locked],
        )?;
        Ok(())
    }

    /// Loads the catalog in insertion order. Rows that fail to decode are
    /// skipped with a warning so one corrupt record cannot block startup.
    pub fn load_catalog(&self) -> Result<Vec<CatalogEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_file, display_name, title, search_blob,
                    identifier_keys, erp_price, unit_sell_price, discounted_price,
                    no_rebate_locked, added_at
             FROM catalog ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map([], Self::map_entry)?;

        let mut catalog = Vec::new();
        for row in rows {
            match row {
                Ok(entry) => catalog.push(entry),
                Err(e) => warn!("Skipping corrupt catalog row: {:?}", e),
            }
        }
        Ok(catalog)
    }

    fn map_entry(row: &Row) -> Result<CatalogEntry, rusqlite::Error> {
        let identifier_keys_json: String = row.get(5)?;
        let identifier_keys = serde_json::from_str(&identifier_keys_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let added_at_str: String = row.get(10)?;
        let added_at = added_at_str
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now());

        Ok(CatalogEntry {
            id: row.get(0)?,
            source_file: row.get(1)?,
            display_name: row.get(2)?,
            title: row.get(3)?,
            search_blob: row.get(4)?,
            identifier_keys,
            erp_price: row.get(6)?,
            unit_sell_price: row.get(7)?,
            discounted_price: row.get(8)?,
            no_rebate_locked: row.get(9)?,
            added_at,
        })
    }

    pub fn save_quote_line(&self, line: &QuoteLine) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO quote_cart (
                cart_id, display_name, title, erp_price, unit_sell_price,
                discounted_price, no_rebate_locked, quantity, extra_discount_percent
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &line.cart_id,
                &line.display_name,
                &line.title,
                line.erp_price,
                line.unit_sell_price,
                line.discounted_price,
                line.no_rebate_locked,
                line.quantity,
                line.extra_discount_percent,
            ],
        )?;
        Ok(())
    }

    /// Writes back the mutable parts of a quote line (quantity, discount).
    pub fn update_quote_line(&self, line: &QuoteLine) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE quote_cart SET quantity = ?2, extra_discount_percent = ?3 WHERE cart_id = ?1",
            params![&line.cart_id, line.quantity, line.extra_discount_percent],
        )?;
        Ok(())
    }

    pub fn delete_quote_line(&self, cart_id: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM quote_cart WHERE cart_id = ?1", params![cart_id])?;
        Ok(())
    }

    pub fn clear_quote(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM quote_cart", [])?;
        Ok(())
    }

    pub fn load_quote(&self) -> Result<Vec<QuoteLine>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT cart_id, display_name, title, erp_price, unit_sell_price,
                    discounted_price, no_rebate_locked, quantity, extra_discount_percent
             FROM quote_cart ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(QuoteLine {
                cart_id: row.get(0)?,
                display_name: row.get(1)?,
                title: row.get(2)?,
                erp_price: row.get(3)?,
                unit_sell_price: row.get(4)?,
                discounted_price: row.get(5)?,
                no_rebate_locked: row.get(6)?,
                quantity: row.get(7)?,
                extra_discount_percent: row.get(8)?,
            })
        })?;

        let mut cart = Vec::new();
        for row in rows {
            match row {
                Ok(line) => cart.push(line),
                Err(e) => warn!("Skipping corrupt quote line: {:?}", e),
            }
        }
        Ok(cart)
    }

    pub fn save_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Loads settings with per-key safe defaults: anything missing or
    /// unparsable keeps its default value.
    pub fn load_settings(&self) -> Result<Settings, StorageError> {
        let mut settings = Settings::default();
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            match key.as_str() {
                "tax_rate" => {
                    if let Ok(v) = value.parse::<f64>() {
                        settings.tax_rate = v;
                    }
                }
                "include_tax" => settings.include_tax = value != "false",
                "sidebar_collapsed" => settings.sidebar_collapsed = value == "true",
                _ => {}
            }
        }
        Ok(settings)
    }

    /// Full wipe: catalog and quote cart, rebate locks going with them.
    /// Settings survive.
    pub fn wipe(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch("DELETE FROM catalog; DELETE FROM quote_cart;")?;
        Ok(())
    }

    /// (source file, entry count, average ERP) per ingested catalog.
    pub fn get_catalog_overview(&self) -> Result<Vec<(String, usize, f64)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT source_file, COUNT(*), AVG(erp_price)
             FROM catalog GROUP BY source_file ORDER BY source_file ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)? as usize,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}
