//! Device record store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide uniqueness-enforcing CRUD over one device table.
//! - Own the in-memory index of known property numbers.
//!
//! # Invariants
//! - `property_number` is unique; a duplicate insert fails without writes.
//! - Listing is a fresh snapshot ordered ascending, ties by `property_number`.
//! - Date columns order by calendar date, never by their `MM/DD/YYYY` text.
//! - All SQL values are bound as parameters; column names come from
//!   `DeviceField` and the table name is validated by `db::schema`.

use crate::db::{ensure_schema, table_columns, DbError};
use crate::model::device::{parse_cal_date, DateError, Device, DeviceField};
use rusqlite::{params, Connection, ErrorCode, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Record store error.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Property number already present.
    DuplicateIdentifier(String),
    /// Property number absent.
    NotFound(String),
    /// New value for a date column does not parse.
    InvalidDate(DateError),
    /// Persisted row cannot be read back as a device.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateIdentifier(id) => write!(f, "property number already exists: {id}"),
            Self::NotFound(id) => write!(f, "property number not found: {id}"),
            Self::InvalidDate(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted device data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidDate(err) => Some(err),
            Self::DuplicateIdentifier(_) => None,
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<DateError> for RepoError {
    fn from(value: DateError) -> Self {
        Self::InvalidDate(value)
    }
}

/// Repository interface for device records.
pub trait DeviceRepository {
    /// Name of the backing table.
    fn table(&self) -> &str;
    /// All records ordered ascending by `order_by`.
    fn list_all(&self, order_by: DeviceField) -> RepoResult<Vec<Device>>;
    /// Known property numbers, ascending.
    fn list_identifiers(&self) -> Vec<String>;
    /// Index lookup; does not touch the database.
    fn contains(&self, property_number: &str) -> bool;
    fn get(&self, property_number: &str) -> RepoResult<Option<Device>>;
    fn count(&self) -> usize;
    /// Column names in table order.
    fn column_names(&self) -> RepoResult<Vec<String>>;
    fn insert(&mut self, device: &Device) -> RepoResult<()>;
    /// Inserts every device or none of them.
    fn insert_all(&mut self, devices: &[Device]) -> RepoResult<usize>;
    fn delete(&mut self, property_number: &str) -> RepoResult<()>;
    /// Sets one column of one record.
    fn update_field(
        &mut self,
        property_number: &str,
        field: DeviceField,
        new_value: &str,
    ) -> RepoResult<()>;
    /// Discards all rows and loads `devices` verbatim.
    fn replace_all(&mut self, devices: &[Device]) -> RepoResult<usize>;
    /// Re-derives the identifier index from the table.
    fn refresh_index(&mut self) -> RepoResult<()>;
}

/// SQLite-backed device repository.
pub struct SqliteDeviceRepository<'conn> {
    conn: &'conn Connection,
    table: String,
    index: BTreeSet<String>,
}

impl<'conn> SqliteDeviceRepository<'conn> {
    /// Ensures the schema of `table` and loads the identifier index.
    pub fn try_new(conn: &'conn Connection, table: &str) -> RepoResult<Self> {
        ensure_schema(conn, table)?;
        let mut repo = Self {
            conn,
            table: table.to_string(),
            index: BTreeSet::new(),
        };
        repo.refresh_index()?;
        Ok(repo)
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT property_number, manufacturer, description, cal_date, cal_due, custodian_email
             FROM {}",
            self.table
        )
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (
                property_number,
                manufacturer,
                description,
                cal_date,
                cal_due,
                custodian_email
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            self.table
        )
    }

    fn insert_rows(&self, tx: &Transaction<'_>, devices: &[Device]) -> RepoResult<usize> {
        let mut stmt = tx.prepare(&self.insert_sql())?;
        for device in devices {
            stmt.execute(params![
                device.property_number,
                device.manufacturer,
                device.description,
                device.cal_date,
                device.cal_due,
                device.custodian_email,
            ])
            .map_err(|err| unique_violation_or(err, &device.property_number))?;
        }
        Ok(devices.len())
    }
}

impl DeviceRepository for SqliteDeviceRepository<'_> {
    fn table(&self) -> &str {
        &self.table
    }

    fn list_all(&self, order_by: DeviceField) -> RepoResult<Vec<Device>> {
        let sql = if order_by.is_date() {
            format!("{} ORDER BY property_number ASC;", self.select_sql())
        } else {
            format!(
                "{} ORDER BY {} ASC, property_number ASC;",
                self.select_sql(),
                order_by.as_str()
            )
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut devices = Vec::new();
        while let Some(row) = rows.next()? {
            devices.push(parse_device_row(row)?);
        }

        if order_by.is_date() {
            // Stable sort keeps property_number order among equal dates;
            // unparseable dates go last.
            devices.sort_by_cached_key(|device| {
                let parsed = parse_cal_date(device.field(order_by)).ok();
                (parsed.is_none(), parsed)
            });
        }

        Ok(devices)
    }

    fn list_identifiers(&self) -> Vec<String> {
        self.index.iter().cloned().collect()
    }

    fn contains(&self, property_number: &str) -> bool {
        self.index.contains(property_number)
    }

    fn get(&self, property_number: &str) -> RepoResult<Option<Device>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE property_number = ?1;", self.select_sql()))?;
        let mut rows = stmt.query([property_number])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_device_row(row)?));
        }

        Ok(None)
    }

    fn count(&self) -> usize {
        self.index.len()
    }

    fn column_names(&self) -> RepoResult<Vec<String>> {
        Ok(table_columns(self.conn, &self.table)?)
    }

    fn insert(&mut self, device: &Device) -> RepoResult<()> {
        if self.index.contains(&device.property_number) {
            return Err(RepoError::DuplicateIdentifier(
                device.property_number.clone(),
            ));
        }

        self.conn
            .execute(
                &self.insert_sql(),
                params![
                    device.property_number,
                    device.manufacturer,
                    device.description,
                    device.cal_date,
                    device.cal_due,
                    device.custodian_email,
                ],
            )
            .map_err(|err| unique_violation_or(err, &device.property_number))?;

        self.index.insert(device.property_number.clone());
        Ok(())
    }

    fn insert_all(&mut self, devices: &[Device]) -> RepoResult<usize> {
        let mut seen = BTreeSet::new();
        for device in devices {
            if self.index.contains(&device.property_number)
                || !seen.insert(device.property_number.as_str())
            {
                return Err(RepoError::DuplicateIdentifier(
                    device.property_number.clone(),
                ));
            }
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = self.insert_rows(&tx, devices)?;
        tx.commit()?;

        self.index
            .extend(devices.iter().map(|device| device.property_number.clone()));
        Ok(inserted)
    }

    fn delete(&mut self, property_number: &str) -> RepoResult<()> {
        if !self.index.contains(property_number) {
            return Err(RepoError::NotFound(property_number.to_string()));
        }

        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE property_number = ?1;", self.table),
            [property_number],
        )?;
        if changed == 0 {
            // Index was stale; bring it back in line before reporting.
            self.refresh_index()?;
            return Err(RepoError::NotFound(property_number.to_string()));
        }

        self.index.remove(property_number);
        Ok(())
    }

    fn update_field(
        &mut self,
        property_number: &str,
        field: DeviceField,
        new_value: &str,
    ) -> RepoResult<()> {
        if !self.index.contains(property_number) {
            return Err(RepoError::NotFound(property_number.to_string()));
        }
        if field.is_date() {
            parse_cal_date(new_value)?;
        }
        let renames = field == DeviceField::PropertyNumber && new_value != property_number;
        if renames && self.index.contains(new_value) {
            return Err(RepoError::DuplicateIdentifier(new_value.to_string()));
        }

        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE {} SET {} = ?1 WHERE property_number = ?2;",
                    self.table,
                    field.as_str()
                ),
                params![new_value, property_number],
            )
            .map_err(|err| unique_violation_or(err, new_value))?;
        if changed == 0 {
            self.refresh_index()?;
            return Err(RepoError::NotFound(property_number.to_string()));
        }

        if renames {
            self.index.remove(property_number);
            self.index.insert(new_value.to_string());
        }
        Ok(())
    }

    fn replace_all(&mut self, devices: &[Device]) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(&format!("DELETE FROM {};", self.table), [])?;
        let inserted = self.insert_rows(&tx, devices)?;
        tx.commit()?;

        self.refresh_index()?;
        Ok(inserted)
    }

    fn refresh_index(&mut self) -> RepoResult<()> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT property_number FROM {} ORDER BY property_number ASC;",
            self.table
        ))?;
        let mut rows = stmt.query([])?;
        let mut index = BTreeSet::new();
        while let Some(row) = rows.next()? {
            if let Some(property_number) = row.get::<_, Option<String>>(0)? {
                index.insert(property_number);
            }
        }
        self.index = index;
        Ok(())
    }
}

fn parse_device_row(row: &Row<'_>) -> RepoResult<Device> {
    let property_number = row
        .get::<_, Option<String>>("property_number")?
        .ok_or_else(|| RepoError::InvalidData("NULL property_number".to_string()))?;

    Ok(Device {
        property_number,
        manufacturer: text_or_empty(row, "manufacturer")?,
        description: text_or_empty(row, "description")?,
        cal_date: text_or_empty(row, "cal_date")?,
        cal_due: text_or_empty(row, "cal_due")?,
        custodian_email: text_or_empty(row, "custodian_email")?,
    })
}

fn text_or_empty(row: &Row<'_>, column: &str) -> RepoResult<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

fn unique_violation_or(err: rusqlite::Error, property_number: &str) -> RepoError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => {
            RepoError::DuplicateIdentifier(property_number.to_string())
        }
        _ => RepoError::from(err),
    }
}

