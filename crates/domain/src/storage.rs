use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Remote collaboration unit that owns drives and recycle bins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Stable site identifier.
    pub id: String,
    /// Human readable name, falls back to the id when the API omits it.
    pub display_name: String,
    /// Absolute site URL. Empty when unknown.
    pub web_url: String,
}

impl Site {
    /// Creates a site, defaulting the display name to the id.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: Option<String>,
        web_url: Option<String>,
    ) -> Self {
        let id = id.into();
        Self {
            display_name: display_name
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| id.clone()),
            web_url: web_url.unwrap_or_default(),
            id,
        }
    }

    /// Returns the site URL when one is known.
    #[must_use]
    pub fn web_url(&self) -> Option<&str> {
        let url = self.web_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// File store belonging to a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    /// Stable drive identifier.
    pub id: String,
    /// Drive name, falls back to the id.
    pub name: String,
}

impl Drive {
    /// Creates a drive, defaulting the name to the id.
    #[must_use]
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        let id = id.into();
        Self {
            name: name
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| id.clone()),
            id,
        }
    }
}

/// File inside a drive as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveItem {
    /// Item identifier, unique within its drive.
    pub id: String,
    /// File name including extension.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation timestamp exactly as delivered by the remote API.
    pub created_date_time: String,
    /// Path of the containing folder, when the API reports it.
    pub parent_path: Option<String>,
}

/// Entry of a first- or second-stage recycle bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycleBinEntry {
    /// Entry identifier within its recycle bin.
    pub id: String,
    /// File name of the deleted item.
    pub leaf_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Deletion timestamp exactly as delivered, possibly empty.
    pub deleted_date_time: String,
}

/// Soft-delete tier of the remote storage system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecycleBinStage {
    /// Per-site recycle bin, addressed by site id.
    First,
    /// Site collection recycle bin, addressed by site URL.
    Second,
}

impl RecycleBinStage {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first_stage",
            Self::Second => "second_stage",
        }
    }

    /// Returns the scope key the stage is addressed by for one site.
    ///
    /// `None` means the stage cannot be reached for this site.
    #[must_use]
    pub fn scope_for<'a>(&self, site: &'a Site) -> Option<&'a str> {
        match self {
            Self::First => Some(site.id.as_str()),
            Self::Second => site.web_url(),
        }
    }
}

impl Display for RecycleBinStage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Drive, RecycleBinStage, Site};

    #[test]
    fn site_display_name_falls_back_to_id() {
        let site = Site::new("site-1", None, None);
        assert_eq!(site.display_name, "site-1");
        assert_eq!(site.web_url(), None);
    }

    #[test]
    fn drive_name_falls_back_to_id_when_blank() {
        let drive = Drive::new("drive-1", Some("  ".to_owned()));
        assert_eq!(drive.name, "drive-1");
    }

    #[test]
    fn second_stage_requires_site_url() {
        let without_url = Site::new("site-1", Some("Sales".to_owned()), Some(String::new()));
        let with_url = Site::new(
            "site-2",
            Some("Ops".to_owned()),
            Some("https://contoso.sharepoint.com/sites/ops".to_owned()),
        );

        assert_eq!(RecycleBinStage::Second.scope_for(&without_url), None);
        assert_eq!(RecycleBinStage::First.scope_for(&without_url), Some("site-1"));
        assert_eq!(
            RecycleBinStage::Second.scope_for(&with_url),
            Some("https://contoso.sharepoint.com/sites/ops")
        );
    }
}
