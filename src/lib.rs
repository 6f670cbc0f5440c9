//! Reporting and records simulation for the tutoring center sign-in system.
//!
//! The crate reads visits from an [`store::EntityStore`], projects them into
//! report rows, buckets them by hour of day, and fabricates profiles the way
//! the institutional records system would once it is integrated.

pub mod db;
pub mod error;
pub mod lookup;
pub mod mock_records;
pub mod models;
pub mod peak_hours;
pub mod report;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod test_support;
