// SQLite persistence: saved prompts, user accounts and login sessions.
// Functions take the pool explicitly and return `sqlx::Result`; mapping to
// HTTP errors is left to the handlers.

pub mod prompts;
pub mod sessions;
pub mod users;

use chrono::{SecondsFormat, Utc};

/// Timestamps are stored as RFC 3339 text with millisecond precision so that
/// text order equals time order.
pub(crate) fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
