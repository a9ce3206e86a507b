//! Configuration history constants and helpers.

/// History action recorded when a configuration is created (including by
/// import or duplication).
pub const ACTION_CREATE: &str = "create";

/// History action recorded after a configuration or one of its extensions
/// changes.
pub const ACTION_UPDATE: &str = "update";

/// History action of the safety snapshot taken before a restore.
pub const ACTION_RESTORE: &str = "restore";

/// History action recorded when a configuration is soft-deleted.
pub const ACTION_DELETE: &str = "delete";

/// Default number of entries returned by the recent-changes feed.
pub const DEFAULT_RECENT_LIMIT: i64 = 50;

/// Upper bound on the recent-changes feed.
pub const MAX_RECENT_LIMIT: i64 = 500;

/// Maximum length of a human change comment.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Clamp a caller-supplied limit into `[1, max]`, defaulting when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Comment stored on the safety snapshot taken before restoring `version`.
pub fn restore_comment(target_version: i32, note: Option<&str>) -> String {
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("Before restore to version {target_version}: {note}"),
        None => format!("Before restore to version {target_version}"),
    }
}

/// Trim and bound a user-supplied change comment.
pub fn normalize_comment(comment: Option<&str>) -> Option<String> {
    comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.chars().take(MAX_COMMENT_LENGTH).collect())
}
