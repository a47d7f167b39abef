//! Device table creation and verification.

use super::{DbError, DbResult};
use crate::model::device::DeviceField;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

/// Table name used when the caller does not choose one.
pub const DEFAULT_TABLE: &str = "devices";

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid table name regex"));

/// Accepts plain SQL identifiers only.
///
/// Table names cannot be bound as parameters, so every name is checked here
/// before it is placed in SQL text.
pub fn validate_table_name(table: &str) -> DbResult<()> {
    if TABLE_NAME_RE.is_match(table) {
        Ok(())
    } else {
        Err(DbError::InvalidTableName(table.to_string()))
    }
}

/// Creates the device table when absent, or verifies an existing one.
///
/// # Errors
/// - `InvalidTableName` for names that are not plain identifiers.
/// - `IncompatibleSchema` when an existing table misses a device column.
pub fn ensure_schema(conn: &Connection, table: &str) -> DbResult<()> {
    validate_table_name(table)?;

    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            property_number TEXT UNIQUE,
            manufacturer TEXT,
            description TEXT,
            cal_date TEXT,
            cal_due TEXT,
            custodian_email TEXT
        );"
    ))?;

    let columns = table_columns(conn, table)?;
    for field in DeviceField::ALL {
        if !columns.iter().any(|column| column == field.as_str()) {
            return Err(DbError::IncompatibleSchema {
                table: table.to_string(),
                column: field.as_str(),
            });
        }
    }

    info!("event=ensure_schema module=db status=ok table={table}");
    Ok(())
}

/// Column names of `table` in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    validate_table_name(table)?;

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::validate_table_name;

    #[test]
    fn table_names_must_be_plain_identifiers() {
        assert!(validate_table_name("devices").is_ok());
        assert!(validate_table_name("_lab_2").is_ok());
        assert!(validate_table_name("2devices").is_err());
        assert!(validate_table_name("devices; DROP TABLE x").is_err());
        assert!(validate_table_name("").is_err());
    }
}
