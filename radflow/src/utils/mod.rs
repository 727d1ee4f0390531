//! Utility functions for timestamp handling.

pub mod timestamps;

pub use timestamps::{format_date, format_iso8601, iso_timestamp, now_utc, Timestamp};
