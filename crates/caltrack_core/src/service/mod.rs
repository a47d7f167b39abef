//! Use-case services over the device repository.
//!
//! # Responsibility
//! - Turn user-level commands into validated repository calls.
//! - Keep the CLI decoupled from storage details.

pub mod query;
