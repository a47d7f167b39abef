use caltrack_core::db::{ensure_schema, open_db, open_db_in_memory, table_columns, DbError};
use caltrack_core::{Device, DeviceRepository, SqliteDeviceRepository};

const COLUMNS: [&str; 6] = [
    "property_number",
    "manufacturer",
    "description",
    "cal_date",
    "cal_due",
    "custodian_email",
];

#[test]
fn ensure_schema_creates_six_text_columns() {
    let conn = open_db_in_memory().unwrap();
    ensure_schema(&conn, "devices").unwrap();

    assert_eq!(table_columns(&conn, "devices").unwrap(), COLUMNS);

    let mut stmt = conn.prepare("PRAGMA table_info(devices);").unwrap();
    let types: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(2))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert!(types.iter().all(|kind| kind == "TEXT"));
}

#[test]
fn ensure_schema_is_idempotent_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devices.db");

    let conn = open_db(&path).unwrap();
    let mut repo = SqliteDeviceRepository::try_new(&conn, "devices").unwrap();
    repo.insert(&Device::new("B1", "Fluke", "DMM", "01/01/2023", "01/01/2024", "a@x"))
        .unwrap();
    drop(repo);
    drop(conn);

    let conn = open_db(&path).unwrap();
    ensure_schema(&conn, "devices").unwrap();
    let repo = SqliteDeviceRepository::try_new(&conn, "devices").unwrap();
    assert_eq!(repo.list_identifiers(), vec!["B1".to_string()]);
}

#[test]
fn ensure_schema_supports_custom_table_names() {
    let conn = open_db_in_memory().unwrap();
    ensure_schema(&conn, "lab_devices").unwrap();
    assert_eq!(table_columns(&conn, "lab_devices").unwrap(), COLUMNS);
}

#[test]
fn ensure_schema_rejects_injected_table_names() {
    let conn = open_db_in_memory().unwrap();
    let err = ensure_schema(&conn, "devices; DROP TABLE x").unwrap_err();
    assert!(matches!(err, DbError::InvalidTableName(name) if name == "devices; DROP TABLE x"));
}

#[test]
fn ensure_schema_rejects_incompatible_existing_table() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE devices (property_number TEXT UNIQUE, manufacturer TEXT);")
        .unwrap();

    let err = ensure_schema(&conn, "devices").unwrap_err();
    assert!(matches!(
        err,
        DbError::IncompatibleSchema { column: "description", .. }
    ));
}

#[test]
fn duplicate_property_numbers_are_rejected_by_the_table() {
    let conn = open_db_in_memory().unwrap();
    ensure_schema(&conn, "devices").unwrap();
    conn.execute("INSERT INTO devices (property_number) VALUES ('B1');", [])
        .unwrap();
    assert!(conn
        .execute("INSERT INTO devices (property_number) VALUES ('B1');", [])
        .is_err());
}
