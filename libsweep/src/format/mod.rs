//! Human-readable formatting for reports.
//!
//! Sizes use binary units (KiB, MiB) and timestamps are rendered relative to
//! now, the way the cleaning report shows them.

use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use humansize::{BINARY, format_size as format_size_human};


/// Formats a byte size into a human-readable string using binary units.
///
/// # Examples
///
/// ```
/// use libsweep::format::format_size;
///
/// assert_eq!(format_size(1024 * 1024 * 5), "5 MiB");
/// ```
pub fn format_size(size_bytes: u64) -> String {
    format_size_human(size_bytes, BINARY)
}

/// Formats an optional size, using `-` when the registry did not report one.
pub fn format_optional_size(size_bytes: Option<u64>) -> String {
    size_bytes.map(format_size).unwrap_or_else(|| "-".to_string())
}

/// Formats a timestamp into a human-readable relative string.
///
/// # Examples
///
/// ```
/// use libsweep::format::format_timestamp;
/// use chrono::{Duration, Utc};
///
/// let one_day_ago = Utc::now() - Duration::days(1);
/// assert_eq!(format_timestamp(&one_day_ago), "a day ago");
/// ```
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.humanize()
}
