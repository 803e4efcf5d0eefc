//! Subscription install records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Install record of one subscription on this device.
///
/// `id` always equals the id of the [`RawSubscription`](crate::RawSubscription)
/// it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsItem {
    pub id: i64,
    pub ctime: DateTime<Utc>,
    pub mtime: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default = "default_true")]
    pub enable_update: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
}

impl SubsItem {
    /// Create an enabled record at the given display position.
    pub fn new(id: i64, order: i32, update_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            ctime: now,
            mtime: now,
            enable: true,
            enable_update: true,
            order,
            update_url,
        }
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.mtime = Utc::now();
    }

    /// Whether the update coordinator should poll this subscription.
    pub fn wants_update(&self) -> bool {
        self.enable && self.enable_update && self.update_url.is_some()
    }
}

fn default_true() -> bool {
    true
}
