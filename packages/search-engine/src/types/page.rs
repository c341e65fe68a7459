//! Page types - fetched pages stored per site.

use serde::{Deserialize, Serialize};

use super::site::SiteId;

/// Store-assigned page identifier.
pub type PageId = i64;

/// A fetched page.
///
/// Unique per `(site_id, path)`. Pages are stored even for non-2xx
/// responses so the failure is visible; in that case `content` holds the
/// error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// `0` until the store assigns an id
    pub id: PageId,
    pub site_id: SiteId,
    /// Site-relative path, always starting with `/`
    pub path: String,
    pub code: u16,
    /// Raw response body
    pub content: String,
}

impl Page {
    pub fn new(site_id: SiteId, path: impl Into<String>, code: u16, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            site_id,
            path: path.into(),
            code,
            content: content.into(),
        }
    }
}
