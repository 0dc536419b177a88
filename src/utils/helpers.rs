//! Helper functions and utilities
//!
//! This module contains common formatting helpers used throughout the application.

use chrono::{DateTime, Utc};

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format a unit price with two decimals
pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

/// Human-readable time left until `deadline`
pub fn format_time_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = deadline.signed_duration_since(now);

    if left.num_seconds() <= 0 {
        "closed".to_string()
    } else if left.num_days() >= 1 {
        format!("{} days left", left.num_days())
    } else if left.num_hours() >= 1 {
        format!("{} hours left", left.num_hours())
    } else {
        format!("{} minutes left", left.num_minutes().max(1))
    }
}
