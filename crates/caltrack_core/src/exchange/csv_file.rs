//! CSV source and sink for device datasets.
//!
//! The header row must equal the schema column names in schema order.

use super::{expected_header, ExchangeError, ExchangeResult};
use crate::model::device::Device;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Reads devices from CSV text, in file order.
pub fn read_devices<R: Read>(source: R) -> ExchangeResult<Vec<Device>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);

    let found: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if found != expected_header() {
        return Err(ExchangeError::InvalidHeader { found });
    }

    let mut devices = Vec::new();
    for row in reader.deserialize::<Device>() {
        devices.push(row?);
    }
    Ok(devices)
}

/// Writes a header line and one row per device.
///
/// The header is written even for an empty dataset.
pub fn write_devices<W: Write>(sink: W, devices: &[Device]) -> ExchangeResult<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(sink);
    writer.write_record(expected_header())?;
    for device in devices {
        writer.serialize(device)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a dataset from a CSV file.
pub fn read_dataset(path: impl AsRef<Path>) -> ExchangeResult<Vec<Device>> {
    read_devices(File::open(path)?)
}

/// Writes a dataset to a CSV file, truncating any existing content.
pub fn export_to_path(path: impl AsRef<Path>, devices: &[Device]) -> ExchangeResult<()> {
    write_devices(File::create(path)?, devices)
}

#[cfg(test)]
mod tests {
    use super::{read_devices, write_devices};
    use crate::exchange::ExchangeError;
    use crate::model::device::Device;

    #[test]
    fn writes_header_for_empty_dataset() {
        let mut out = Vec::new();
        write_devices(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "property_number,manufacturer,description,cal_date,cal_due,custodian_email\n"
        );
    }

    #[test]
    fn quotes_fields_containing_commas() {
        let device = Device::new(
            "B000002",
            "National Instruments",
            "Oscilloscope, PXIe 5160",
            "01/01/2023",
            "03/02/2024",
            "john@example.com",
        );
        let mut out = Vec::new();
        write_devices(&mut out, std::slice::from_ref(&device)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"Oscilloscope, PXIe 5160\""));

        let back = read_devices(text.as_bytes()).unwrap();
        assert_eq!(back, vec![device]);
    }

    #[test]
    fn rejects_reordered_header() {
        let text = "manufacturer,property_number,description,cal_date,cal_due,custodian_email\n";
        let err = read_devices(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidHeader { found } if found[0] == "manufacturer"));
    }

    #[test]
    fn short_rows_fail_to_parse() {
        let text = "property_number,manufacturer,description,cal_date,cal_due,custodian_email\nB1,Fluke\n";
        assert!(matches!(
            read_devices(text.as_bytes()).unwrap_err(),
            ExchangeError::Csv(_)
        ));
    }
}
