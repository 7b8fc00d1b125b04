//! `If-Modified-Since` handling.
//!
//! HTTP dates only carry whole seconds, so modification times are truncated
//! before they are formatted into `Last-Modified` and before they are compared
//! with what the client sends back.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Drops sub-second precision. Times before the epoch clamp to the epoch.
pub fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// `Last-Modified` header value for a modification time.
pub fn last_modified(modified: SystemTime) -> String {
    httpdate::fmt_http_date(truncate_to_seconds(modified))
}

/// Whether the client's cached copy is still current.
///
/// A missing or unparseable header never matches. Equal timestamps count as
/// not modified.
pub fn is_not_modified(modified: SystemTime, if_modified_since: Option<&str>) -> bool {
    let Some(value) = if_modified_since else {
        return false;
    };

    match httpdate::parse_http_date(value.trim()) {
        Ok(since) => truncate_to_seconds(modified) <= since,
        Err(_) => false,
    }
}
