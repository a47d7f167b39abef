//! Command translation for add/delete/update/select.
//!
//! # Responsibility
//! - Resolve user-supplied column names (canonical or alias) to `DeviceField`.
//! - Validate dates before any repository call.
//! - Dispatch each command to exactly one repository operation.
//!
//! # Invariants
//! - The repository only receives structurally valid intents; remaining
//!   failures are identity conflicts (`DuplicateIdentifier`, `NotFound`).
//! - Column names never reach SQL unless they resolved to a `DeviceField`.

use crate::model::device::{parse_cal_date, DateError, Device, DeviceField};
use crate::repo::device_repo::{DeviceRepository, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Short column names accepted alongside canonical ones.
const COLUMN_ALIASES: &[(&str, DeviceField)] = &[
    ("pn", DeviceField::PropertyNumber),
    ("property", DeviceField::PropertyNumber),
    ("id", DeviceField::PropertyNumber),
    ("mfr", DeviceField::Manufacturer),
    ("make", DeviceField::Manufacturer),
    ("desc", DeviceField::Description),
    ("date", DeviceField::CalDate),
    ("last_cal", DeviceField::CalDate),
    ("due", DeviceField::CalDue),
    ("due_date", DeviceField::CalDue),
    ("email", DeviceField::CustodianEmail),
    ("custodian", DeviceField::CustodianEmail),
];

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug)]
pub enum QueryError {
    /// Neither a column name nor a known alias.
    InvalidColumn(String),
    InvalidDate(DateError),
    Repo(RepoError),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidColumn(name) => write!(f, "unknown column `{name}`"),
            Self::InvalidDate(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidColumn(_) => None,
            Self::InvalidDate(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for QueryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidDate(err) => Self::InvalidDate(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DateError> for QueryError {
    fn from(value: DateError) -> Self {
        Self::InvalidDate(value)
    }
}

/// Resolves a canonical column name or alias, case-insensitively.
pub fn resolve_column(input: &str) -> QueryResult<DeviceField> {
    let normalized = input.trim().to_ascii_lowercase();
    DeviceField::from_column(&normalized)
        .or_else(|| {
            COLUMN_ALIASES
                .iter()
                .find(|(alias, _)| *alias == normalized)
                .map(|(_, field)| *field)
        })
        .ok_or_else(|| QueryError::InvalidColumn(input.to_string()))
}

/// Structured intent from the command surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    Add(Device),
    Delete {
        property_number: String,
    },
    Update {
        property_number: String,
        column: String,
        value: String,
    },
    /// Lists every device; `order_by` defaults to `property_number`.
    Select {
        order_by: Option<String>,
    },
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Added(String),
    Deleted(String),
    Updated {
        property_number: String,
        field: DeviceField,
    },
    Listed(Vec<Device>),
}

/// Validating front for a device repository.
pub struct QueryService<R: DeviceRepository> {
    repo: R,
}

impl<R: DeviceRepository> QueryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Direct repository access for bulk exchange.
    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn into_repo(self) -> R {
        self.repo
    }

    /// Runs one command.
    pub fn execute(&mut self, command: DeviceCommand) -> QueryResult<CommandOutcome> {
        match command {
            DeviceCommand::Add(device) => {
                self.add(&device)?;
                Ok(CommandOutcome::Added(device.property_number))
            }
            DeviceCommand::Delete { property_number } => {
                self.delete(&property_number)?;
                Ok(CommandOutcome::Deleted(property_number))
            }
            DeviceCommand::Update {
                property_number,
                column,
                value,
            } => {
                let field = self.update(&property_number, &column, &value)?;
                let property_number = if field == DeviceField::PropertyNumber {
                    value
                } else {
                    property_number
                };
                Ok(CommandOutcome::Updated {
                    property_number,
                    field,
                })
            }
            DeviceCommand::Select { order_by } => {
                let devices = self.select(order_by.as_deref())?;
                Ok(CommandOutcome::Listed(devices))
            }
        }
    }

    /// Adds one device after checking both dates.
    pub fn add(&mut self, device: &Device) -> QueryResult<()> {
        device.validate_dates()?;
        self.repo.insert(device)?;
        info!(
            "event=device_add module=query status=ok table={} property_number={}",
            self.repo.table(),
            device.property_number
        );
        Ok(())
    }

    pub fn delete(&mut self, property_number: &str) -> QueryResult<()> {
        self.repo.delete(property_number)?;
        info!(
            "event=device_delete module=query status=ok table={} property_number={}",
            self.repo.table(),
            property_number
        );
        Ok(())
    }

    /// Sets one column; `column` may be an alias. Returns the resolved field.
    pub fn update(
        &mut self,
        property_number: &str,
        column: &str,
        value: &str,
    ) -> QueryResult<DeviceField> {
        let field = resolve_column(column)?;
        if field.is_date() {
            parse_cal_date(value)?;
        }
        self.repo.update_field(property_number, field, value)?;
        info!(
            "event=device_update module=query status=ok table={} property_number={} field={}",
            self.repo.table(),
            property_number,
            field
        );
        Ok(field)
    }

    /// Lists all devices ordered by `order_by` (column or alias).
    pub fn select(&self, order_by: Option<&str>) -> QueryResult<Vec<Device>> {
        let field = match order_by {
            Some(column) => resolve_column(column)?,
            None => DeviceField::PropertyNumber,
        };
        Ok(self.repo.list_all(field)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_column, QueryError};
    use crate::model::device::DeviceField;

    #[test]
    fn resolves_canonical_names_and_aliases() {
        assert_eq!(resolve_column("cal_due").unwrap(), DeviceField::CalDue);
        assert_eq!(resolve_column("due").unwrap(), DeviceField::CalDue);
        assert_eq!(resolve_column(" PN ").unwrap(), DeviceField::PropertyNumber);
        assert_eq!(resolve_column("Email").unwrap(), DeviceField::CustodianEmail);
    }

    #[test]
    fn rejects_unknown_columns_verbatim() {
        let err = resolve_column("serial; DROP TABLE devices").unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidColumn(name) if name == "serial; DROP TABLE devices")
        );
    }
}
