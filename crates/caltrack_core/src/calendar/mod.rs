//! Calibration date arithmetic.

pub mod expiry;
