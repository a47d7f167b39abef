//! Reminder horizon scan and per-recipient dispatch.

use super::transport::MailTransport;
use super::{NotifyError, NotifyResult};
use crate::calendar::expiry::is_within_reminder_horizon;
use crate::model::device::{Device, DeviceField};
use crate::repo::device_repo::DeviceRepository;
use chrono::NaiveDate;
use log::{error, info, warn};

const REMINDER_SUBJECT: &str = "Calibration Reminder";
const REMINDER_BODY: &str =
    "Greetings,\n\nOne or more of your devices need to be calibrated.\n\nThank you.";

/// Static reminder text; no per-recipient templating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    pub sender: Option<String>,
    pub subject: String,
    pub body: String,
}

impl Default for ReminderMessage {
    fn default() -> Self {
        Self {
            sender: None,
            subject: REMINDER_SUBJECT.to_string(),
            body: REMINDER_BODY.to_string(),
        }
    }
}

impl ReminderMessage {
    pub fn with_sender(sender: impl Into<String>) -> Self {
        Self {
            sender: Some(sender.into()),
            ..Self::default()
        }
    }
}

/// Custodians with a device due within `horizon_days` of `reference`.
///
/// Devices are visited in `property_number` order; the first occurrence of an
/// address fixes its position.
pub fn select_custodians(
    devices: &[Device],
    reference: NaiveDate,
    horizon_days: i64,
) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::new();
    for device in devices {
        match is_within_reminder_horizon(&device.cal_due, reference, horizon_days) {
            Ok(true) => {
                if !addresses.contains(&device.custodian_email) {
                    addresses.push(device.custodian_email.clone());
                }
            }
            Ok(false) => {}
            Err(_) => {
                warn!(
                    "event=due_scan module=notify status=skipped property_number={} reason=invalid_cal_due",
                    device.property_number
                );
            }
        }
    }
    addresses
}

/// Scans the repository for custodians to remind.
pub fn due_custodians<R: DeviceRepository>(
    repo: &R,
    reference: NaiveDate,
    horizon_days: i64,
) -> NotifyResult<Vec<String>> {
    let devices = repo.list_all(DeviceField::PropertyNumber)?;
    let addresses = select_custodians(&devices, reference, horizon_days);
    info!(
        "event=due_scan module=notify status=ok table={} devices={} custodians={} horizon_days={}",
        repo.table(),
        devices.len(),
        addresses.len(),
        horizon_days
    );
    Ok(addresses)
}

/// Outcome of a batch dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    /// One `TransportFailure` per failed recipient.
    pub failures: Vec<NotifyError>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.failures.is_empty()
    }
}

/// Sends `message` to every address; each delivery stands alone.
pub fn dispatch<T: MailTransport + ?Sized>(
    transport: &mut T,
    addresses: &[String],
    message: &ReminderMessage,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    for (position, address) in addresses.iter().enumerate() {
        match transport.send(address, message) {
            Ok(()) => report.delivered.push(address.clone()),
            Err(err) => {
                error!(
                    "event=mail_send module=notify status=error recipient_index={} error={}",
                    position, err
                );
                report.failures.push(NotifyError::TransportFailure {
                    recipient: address.clone(),
                    message: err.message,
                });
            }
        }
    }
    info!(
        "event=dispatch module=notify status=ok delivered={} failed={}",
        report.delivered.len(),
        report.failures.len()
    );
    report
}

/// Selects due custodians and dispatches one reminder to each.
pub fn remind<R: DeviceRepository, T: MailTransport + ?Sized>(
    repo: &R,
    transport: &mut T,
    message: &ReminderMessage,
    reference: NaiveDate,
    horizon_days: i64,
) -> NotifyResult<DispatchReport> {
    let addresses = due_custodians(repo, reference, horizon_days)?;
    if addresses.is_empty() {
        info!("event=remind module=notify status=skipped reason=no_due_devices");
        return Ok(DispatchReport::default());
    }
    Ok(dispatch(transport, &addresses, message))
}
