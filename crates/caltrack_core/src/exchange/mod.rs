//! Bulk import and export between the device table and tabular files.
//!
//! # Responsibility
//! - Merge-append or fully replace the device table from a dataset.
//! - Dump the device table to a CSV sink.
//!
//! # Invariants
//! - `import_append` writes every row or none; any identifier conflict is
//!   reported as one `ImportConflict` naming all offending identifiers.
//! - `import_replace` is destructive and takes no backup; a failed replace
//!   leaves the previous rows in place.
//! - Imported rows load verbatim; dates are not validated here.

pub mod csv_file;

use crate::model::device::{Device, DeviceField};
use crate::repo::device_repo::{DeviceRepository, RepoError};
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub use csv_file::{export_to_path, read_dataset, read_devices, write_devices};

pub type ExchangeResult<T> = Result<T, ExchangeError>;

#[derive(Debug)]
pub enum ExchangeError {
    /// Dataset identifiers already present in the table or repeated in the dataset.
    ImportConflict { identifiers: Vec<String> },
    /// Header row differs from the schema columns.
    InvalidHeader { found: Vec<String> },
    Csv(csv::Error),
    Io(std::io::Error),
    Repo(RepoError),
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImportConflict { identifiers } => write!(
                f,
                "import conflicts on property numbers: {}",
                identifiers.join(", ")
            ),
            Self::InvalidHeader { found } => write!(
                f,
                "expected header `{}`, found `{}`",
                expected_header().join(","),
                found.join(",")
            ),
            Self::Csv(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::ImportConflict { .. } => None,
            Self::InvalidHeader { .. } => None,
        }
    }
}

impl From<csv::Error> for ExchangeError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for ExchangeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepoError> for ExchangeError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateIdentifier(id) => Self::ImportConflict {
                identifiers: vec![id],
            },
            other => Self::Repo(other),
        }
    }
}

pub(crate) fn expected_header() -> Vec<&'static str> {
    DeviceField::ALL.iter().map(|field| field.as_str()).collect()
}

/// Appends `dataset` to the repository's table.
///
/// Returns the number of rows written.
pub fn import_append<R: DeviceRepository>(
    repo: &mut R,
    dataset: &[Device],
) -> ExchangeResult<usize> {
    let mut identifiers: BTreeSet<String> = duplicates_within(dataset);
    identifiers.extend(
        dataset
            .iter()
            .filter(|device| repo.contains(&device.property_number))
            .map(|device| device.property_number.clone()),
    );
    if !identifiers.is_empty() {
        warn!(
            "event=import module=exchange status=error mode=append table={} rows={} conflicts={}",
            repo.table(),
            dataset.len(),
            identifiers.len()
        );
        return Err(ExchangeError::ImportConflict {
            identifiers: identifiers.into_iter().collect(),
        });
    }

    let inserted = repo.insert_all(dataset)?;
    info!(
        "event=import module=exchange status=ok mode=append table={} rows={}",
        repo.table(),
        inserted
    );
    Ok(inserted)
}

/// Replaces every row of the repository's table with `dataset`.
pub fn import_replace<R: DeviceRepository>(
    repo: &mut R,
    dataset: &[Device],
) -> ExchangeResult<usize> {
    let duplicates = duplicates_within(dataset);
    if !duplicates.is_empty() {
        warn!(
            "event=import module=exchange status=error mode=replace table={} rows={} conflicts={}",
            repo.table(),
            dataset.len(),
            duplicates.len()
        );
        return Err(ExchangeError::ImportConflict {
            identifiers: duplicates.into_iter().collect(),
        });
    }

    let previous = repo.count();
    let loaded = repo.replace_all(dataset)?;
    info!(
        "event=import module=exchange status=ok mode=replace table={} previous_rows={} rows={}",
        repo.table(),
        previous,
        loaded
    );
    Ok(loaded)
}

/// Writes every row of the repository's table to `destination`, overwriting it.
pub fn export<R: DeviceRepository>(
    repo: &R,
    destination: impl AsRef<Path>,
) -> ExchangeResult<usize> {
    let devices = repo.list_all(DeviceField::PropertyNumber)?;
    export_to_path(destination.as_ref(), &devices)?;
    info!(
        "event=export module=exchange status=ok table={} rows={}",
        repo.table(),
        devices.len()
    );
    Ok(devices.len())
}

fn duplicates_within(dataset: &[Device]) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    dataset
        .iter()
        .filter(|device| !seen.insert(device.property_number.as_str()))
        .map(|device| device.property_number.clone())
        .collect()
}
