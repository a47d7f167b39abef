//! Core domain logic for tracking device calibration.
//! This crate owns every business invariant; front ends only call into it.

pub mod calendar;
pub mod db;
pub mod exchange;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use calendar::expiry::{
    classify, days_until, expiry_report, is_within_reminder_horizon, today, ExpiryEntry,
    ExpiryStatus, REMINDER_HORIZON_DAYS,
};
pub use db::{DbError, DbResult, DEFAULT_TABLE};
pub use exchange::{export, import_append, import_replace, ExchangeError, ExchangeResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::device::{parse_cal_date, DateError, Device, DeviceField, DATE_FORMAT};
pub use notify::{
    dispatch, due_custodians, remind, DispatchReport, LogTransport, MailTransport, NotifyError,
    NotifyResult, ReminderMessage, TransportError,
};
pub use repo::device_repo::{DeviceRepository, RepoError, RepoResult, SqliteDeviceRepository};
pub use service::query::{
    resolve_column, CommandOutcome, DeviceCommand, QueryError, QueryResult, QueryService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
