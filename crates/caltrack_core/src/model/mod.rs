//! Device record model.
//!
//! # Invariants
//! - `property_number` is the sole identity of a device.
//! - Dates are carried as `MM/DD/YYYY` text and parsed only where arithmetic
//!   needs them.

pub mod device;
