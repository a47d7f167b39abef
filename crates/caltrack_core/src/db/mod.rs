//! SQLite connection bootstrap and device table schema.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Create or verify the device table under a caller-chosen name.
//!
//! # Invariants
//! - Table names reach SQL text only after `validate_table_name` accepts them.
//! - Application data is read or written only after `ensure_schema` succeeds.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::{ensure_schema, table_columns, validate_table_name, DEFAULT_TABLE};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Table name is not a plain SQL identifier.
    InvalidTableName(String),
    /// Existing table lacks one of the device columns.
    IncompatibleSchema { table: String, column: &'static str },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidTableName(name) => write!(
                f,
                "invalid table name `{name}`; expected letters, digits and underscores"
            ),
            Self::IncompatibleSchema { table, column } => {
                write!(f, "table `{table}` exists but has no `{column}` column")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidTableName(_) => None,
            Self::IncompatibleSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
