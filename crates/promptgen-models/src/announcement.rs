//! Site-wide announcement banner.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A dismissible site-wide announcement.
///
/// The id doubles as the dismissal key: a client that stored
/// `dismissed_announcement == id` hides the banner until a new one
/// (with a fresh id) is published.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Announcement {
    /// Millisecond timestamp assigned at publish time
    pub id: i64,
    /// Banner text
    pub message: String,
}

impl Announcement {
    /// Create a new announcement stamped with the current time.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Utc::now().timestamp_millis(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_announcements_get_fresh_ids() {
        let a = Announcement::new("maintenance at noon");
        assert!(a.id > 0);
        assert_eq!(a.message, "maintenance at noon");
    }
}
