//! Installed-application metadata.

use serde::{Deserialize, Serialize};

/// Metadata of one installed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    /// Package identifier.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub version_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
}

impl AppInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_system: false,
            version_code: 0,
            version_name: None,
        }
    }
}
