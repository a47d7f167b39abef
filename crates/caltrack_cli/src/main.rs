//! `caltrack`: command-line front end for the calibration tracker.
//!
//! # Usage
//!
//! ```text
//! caltrack add B000001 Fluke "Digital Multi-meter" 08/03/2022 08/03/2023 jane@example.com
//! caltrack update B000001 due 08/03/2024
//! caltrack list --order-by due --status
//! caltrack import additional_data.csv
//! caltrack export calibration_data.csv
//! caltrack remind
//! ```

mod config;

use anyhow::{bail, Context, Result};
use caltrack_core::db::open_db;
use caltrack_core::{
    expiry_report, init_logging, parse_cal_date, remind, today, CommandOutcome, Device,
    DeviceCommand, DeviceRepository, ExpiryStatus, LogTransport, QueryService, ReminderMessage,
    SqliteDeviceRepository,
};
use clap::{Parser, Subcommand};
use config::{ConfigFile, Overrides, Settings};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "caltrack", version, about = "Track device calibration due dates")]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long, env = "CALTRACK_DB")]
    database: Option<PathBuf>,

    /// Device table name.
    #[arg(long, env = "CALTRACK_TABLE")]
    table: Option<String>,

    /// Reminder horizon in days.
    #[arg(long, env = "CALTRACK_HORIZON_DAYS")]
    horizon_days: Option<i64>,

    /// Directory for rolling log files.
    #[arg(long, env = "CALTRACK_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "CALTRACK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Sender address placed on reminders.
    #[arg(long, env = "CALTRACK_SENDER")]
    sender: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add one device.
    Add {
        property_number: String,
        manufacturer: String,
        description: String,
        /// Last calibration, MM/DD/YYYY.
        cal_date: String,
        /// Calibration due, MM/DD/YYYY.
        cal_due: String,
        custodian_email: String,
    },
    /// Delete a device by property number.
    Delete { property_number: String },
    /// Set one column of one device; column may be an alias such as `due`.
    Update {
        property_number: String,
        column: String,
        value: String,
    },
    /// List devices.
    List {
        /// Column or alias to order by.
        #[arg(long)]
        order_by: Option<String>,
        /// Print property numbers only.
        #[arg(long, conflicts_with = "status")]
        ids: bool,
        /// Append days until due and the expiry bucket.
        #[arg(long)]
        status: bool,
    },
    /// Print the table's column names.
    Columns,
    /// Load devices from a CSV file.
    Import {
        file: PathBuf,
        /// Discard existing rows first.
        #[arg(long)]
        replace: bool,
    },
    /// Write all devices to a CSV file, overwriting it.
    Export { file: PathBuf },
    /// Remind custodians whose devices are due within the horizon.
    Remind {
        /// Reference date, MM/DD/YYYY; defaults to today.
        #[arg(long, value_name = "DATE")]
        as_of: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file = ConfigFile::load(args.config.as_deref())?;
    let cwd = std::env::current_dir().context("resolving working directory")?;
    let settings = Settings::resolve(
        Overrides {
            database: args.database,
            table: args.table,
            horizon_days: args.horizon_days,
            log_dir: args.log_dir,
            log_level: args.log_level,
            sender: args.sender,
        },
        file,
        &cwd,
    );

    let log_dir = settings
        .log_dir
        .to_str()
        .context("log directory is not valid UTF-8")?;
    if let Err(err) = init_logging(&settings.log_level, log_dir) {
        bail!("initializing logging: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok version={} table={}",
        caltrack_core::core_version(),
        settings.table
    );

    let conn = open_db(&settings.database)
        .with_context(|| format!("opening database {}", settings.database.display()))?;
    let repo = SqliteDeviceRepository::try_new(&conn, &settings.table)
        .with_context(|| format!("preparing table {}", settings.table))?;
    let mut service = QueryService::new(repo);

    run(args.command, &mut service, &settings)
}

fn run(
    command: Command,
    service: &mut QueryService<SqliteDeviceRepository<'_>>,
    settings: &Settings,
) -> Result<()> {
    match command {
        Command::Add {
            property_number,
            manufacturer,
            description,
            cal_date,
            cal_due,
            custodian_email,
        } => {
            let device = Device::new(
                property_number,
                manufacturer,
                description,
                cal_date,
                cal_due,
                custodian_email,
            );
            report(service.execute(DeviceCommand::Add(device))?);
        }
        Command::Delete { property_number } => {
            report(service.execute(DeviceCommand::Delete { property_number })?);
        }
        Command::Update {
            property_number,
            column,
            value,
        } => {
            report(service.execute(DeviceCommand::Update {
                property_number,
                column,
                value,
            })?);
        }
        Command::List {
            order_by,
            ids,
            status,
        } => {
            if ids {
                for property_number in service.repo().list_identifiers() {
                    println!("{property_number}");
                }
            } else {
                let devices = service.select(order_by.as_deref())?;
                if status {
                    print_status(&devices, settings.horizon_days);
                } else {
                    for device in &devices {
                        println!("{}", device_line(device));
                    }
                }
            }
        }
        Command::Columns => {
            println!("{}", service.repo().column_names()?.join(", "));
        }
        Command::Import { file, replace } => {
            let dataset = caltrack_core::exchange::read_dataset(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let rows = if replace {
                caltrack_core::import_replace(service.repo_mut(), &dataset)?
            } else {
                caltrack_core::import_append(service.repo_mut(), &dataset)?
            };
            println!("Imported {rows} devices.");
        }
        Command::Export { file } => {
            let rows = caltrack_core::export(service.repo(), &file)?;
            println!("Saved {rows} devices to {}.", file.display());
        }
        Command::Remind { as_of } => {
            let reference = match as_of {
                Some(text) => parse_cal_date(&text)?,
                None => today(),
            };
            let message = match &settings.sender {
                Some(sender) => ReminderMessage::with_sender(sender.clone()),
                None => ReminderMessage::default(),
            };
            let mut transport = LogTransport::new();
            let outcome = remind(
                service.repo(),
                &mut transport,
                &message,
                reference,
                settings.horizon_days,
            )?;
            if outcome.is_empty() {
                println!("No upcoming device calibration required.");
            } else {
                for address in &outcome.delivered {
                    println!("Reminder queued for {address}");
                }
                for failure in &outcome.failures {
                    eprintln!("{failure}");
                }
            }
        }
    }
    Ok(())
}

fn report(outcome: CommandOutcome) {
    match outcome {
        CommandOutcome::Added(id) => println!("Device {id} added."),
        CommandOutcome::Deleted(id) => println!("Device {id} deleted."),
        CommandOutcome::Updated {
            property_number,
            field,
        } => println!("Device {property_number} updated ({field})."),
        CommandOutcome::Listed(devices) => {
            for device in &devices {
                println!("{}", device_line(device));
            }
        }
    }
}

fn device_line(device: &Device) -> String {
    format!(
        "{} | {} | {} | {} | {} | {}",
        device.property_number,
        device.manufacturer,
        device.description,
        device.cal_date,
        device.cal_due,
        device.custodian_email
    )
}

fn print_status(devices: &[Device], horizon_days: i64) {
    let report = expiry_report(devices, today());
    for (device, entry) in devices.iter().zip(report) {
        let status = match entry.days {
            Ok(days) => format!(
                "{days} days ({})",
                ExpiryStatus::from_days(days, horizon_days).as_str()
            ),
            Err(err) => err.to_string(),
        };
        println!("{} | {status}", device_line(device));
    }
}
