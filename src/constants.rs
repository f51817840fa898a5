//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers and well-known label IDs.

/// System label that marks inbox membership.
pub const INBOX_LABEL: &str = "INBOX";

/// System label that marks a trashed message.
pub const TRASH_LABEL: &str = "TRASH";

/// System label for starred messages.
pub const STARRED_LABEL: &str = "STARRED";

/// Default lifetime of cached label display names in seconds.
/// Label names change rarely; a stale name is only a display glitch.
pub const LABEL_CACHE_TTL_SECS: u64 = 300;

/// Upper bound for cached label names.
pub const LABEL_CACHE_MAX_CAPACITY: u64 = 1_000;

/// Error message display duration in seconds before auto-dismiss.
pub const ERROR_TTL_SECS: u64 = 5;

/// Suffix appended to undo status messages when the restored messages may
/// not be part of the active (searched or filtered) list.
pub const REFRESH_HINT: &str = "(press refresh if not visible)";
