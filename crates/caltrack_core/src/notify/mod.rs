//! Calibration reminders: custodian selection and dispatch.
//!
//! # Responsibility
//! - Select the distinct custodians whose devices fall inside the horizon.
//! - Hand each address to a mail transport, one delivery at a time.
//!
//! # Invariants
//! - A record with an unparseable due date is skipped, never fatal.
//! - A failed delivery affects only its own recipient.
//! - Custodian addresses are not written to the log.

pub mod reminder;
pub mod transport;

use crate::repo::device_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use reminder::{
    dispatch, due_custodians, remind, select_custodians, DispatchReport, ReminderMessage,
};
pub use transport::{LogTransport, MailTransport, TransportError};

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Debug)]
pub enum NotifyError {
    /// Delivery to one recipient failed.
    TransportFailure { recipient: String, message: String },
    Repo(RepoError),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransportFailure { recipient, message } => {
                write!(f, "reminder to {recipient} failed: {message}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TransportFailure { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for NotifyError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
