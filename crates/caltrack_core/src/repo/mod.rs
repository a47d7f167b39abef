//! Repository layer over the device table.
//!
//! # Responsibility
//! - Define the record store contract used by services.
//! - Keep SQL text and the identifier index inside the persistence boundary.
//!
//! # Invariants
//! - The identifier index matches the table after every successful mutation.
//! - A failed mutation leaves both the table and the index unchanged.

pub mod device_repo;
