//! Mail transport seam.

use super::reminder::ReminderMessage;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Delivery failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for TransportError {}

/// Delivers one reminder to one recipient.
pub trait MailTransport {
    fn send(&mut self, recipient: &str, message: &ReminderMessage) -> Result<(), TransportError>;
}

/// Transport that records deliveries in the log instead of sending mail.
#[derive(Debug, Default)]
pub struct LogTransport {
    sent: usize,
}

impl LogTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reminders accepted so far.
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl MailTransport for LogTransport {
    fn send(&mut self, _recipient: &str, message: &ReminderMessage) -> Result<(), TransportError> {
        self.sent += 1;
        info!(
            "event=mail_send module=notify status=ok transport=log subject_chars={} body_chars={} seq={}",
            message.subject.chars().count(),
            message.body.chars().count(),
            self.sent
        );
        Ok(())
    }
}
