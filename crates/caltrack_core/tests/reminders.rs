use caltrack_core::db::open_db_in_memory;
use caltrack_core::{
    dispatch, due_custodians, remind, Device, DeviceRepository, LogTransport, MailTransport,
    NotifyError, ReminderMessage, SqliteDeviceRepository, TransportError,
};
use chrono::NaiveDate;
use rusqlite::Connection;

fn seeded(conn: &Connection) -> SqliteDeviceRepository<'_> {
    let mut repo = SqliteDeviceRepository::try_new(conn, "devices").unwrap();
    for device in [
        Device::new("B000001", "Durgod", "Keyboard", "08/18/2023", "08/18/2024", "jane_doe@gmail.com"),
        Device::new("B000002", "National Instruments", "PXIe 5160 Oscilloscope", "01/01/2023", "03/02/2024", "john_doe1337@gmail.com"),
        Device::new("B000003", "Fluke", "Digital Multi-meter", "08/03/2022", "08/03/2023", "john_doe1337@gmail.com"),
        Device::new("B000004", "Newport", "Optical Detector", "07/01/2022", "07/01/2023", "john_doe1337@gmail.com"),
        Device::new("B000005", "Thorlabs", "Optical Power Meter", "01/02/2023", "01/01/2024", "jane_doe1337@yahoo.com"),
    ] {
        repo.insert(&device).unwrap();
    }
    repo
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Records deliveries and fails for chosen recipients.
#[derive(Default)]
struct ScriptedTransport {
    fail_for: Vec<String>,
    attempts: Vec<String>,
}

impl MailTransport for ScriptedTransport {
    fn send(&mut self, recipient: &str, _message: &ReminderMessage) -> Result<(), TransportError> {
        self.attempts.push(recipient.to_string());
        if self.fail_for.iter().any(|address| address == recipient) {
            return Err(TransportError::new("mailbox unavailable"));
        }
        Ok(())
    }
}

#[test]
fn selects_only_the_device_inside_the_horizon() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn);

    // 47 days before B000004 is due; every other device is further out.
    let addresses = due_custodians(&repo, day(2023, 5, 15), 60).unwrap();

    assert_eq!(addresses, vec!["john_doe1337@gmail.com".to_string()]);
}

#[test]
fn overdue_devices_qualify_and_addresses_are_deduplicated() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn);

    // B000003 and B000004 are both overdue and share a custodian.
    let addresses = due_custodians(&repo, day(2023, 8, 21), 60).unwrap();

    assert_eq!(addresses, vec!["john_doe1337@gmail.com".to_string()]);
}

#[test]
fn wider_horizon_keeps_property_number_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn);

    let addresses = due_custodians(&repo, day(2023, 8, 21), 365).unwrap();

    assert_eq!(
        addresses,
        vec![
            "jane_doe@gmail.com".to_string(),
            "john_doe1337@gmail.com".to_string(),
            "jane_doe1337@yahoo.com".to_string(),
        ]
    );
}

#[test]
fn unparseable_due_dates_are_skipped() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = seeded(&conn);
    repo.insert(&Device::new("A000001", "m", "d", "01/01/2023", "2023-06-01", "broken@x"))
        .unwrap();

    let addresses = due_custodians(&repo, day(2023, 5, 15), 60).unwrap();

    assert_eq!(addresses, vec!["john_doe1337@gmail.com".to_string()]);
}

#[test]
fn nothing_due_yields_empty_selection() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn);

    assert!(due_custodians(&repo, day(2022, 1, 1), 60).unwrap().is_empty());
}

#[test]
fn dispatch_continues_after_a_failed_recipient() {
    let mut transport = ScriptedTransport {
        fail_for: vec!["b@x".to_string()],
        ..ScriptedTransport::default()
    };
    let addresses = vec!["a@x".to_string(), "b@x".to_string(), "c@x".to_string()];

    let report = dispatch(&mut transport, &addresses, &ReminderMessage::default());

    assert_eq!(transport.attempts, addresses);
    assert_eq!(report.delivered, vec!["a@x".to_string(), "c@x".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        &report.failures[0],
        NotifyError::TransportFailure { recipient, message }
            if recipient == "b@x" && message == "mailbox unavailable"
    ));
}

#[test]
fn remind_dispatches_to_selected_custodians() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn);
    let mut transport = LogTransport::new();

    let report = remind(
        &repo,
        &mut transport,
        &ReminderMessage::with_sender("lab@example.com"),
        day(2023, 8, 21),
        60,
    )
    .unwrap();

    assert_eq!(report.delivered, vec!["john_doe1337@gmail.com".to_string()]);
    assert!(report.failures.is_empty());
    assert_eq!(transport.sent(), 1);
    assert_eq!(repo.count(), 5);
}

#[test]
fn remind_with_no_due_devices_sends_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn);
    let mut transport = ScriptedTransport::default();

    let report = remind(&repo, &mut transport, &ReminderMessage::default(), day(2022, 1, 1), 60)
        .unwrap();

    assert!(report.is_empty());
    assert!(transport.attempts.is_empty());
}
