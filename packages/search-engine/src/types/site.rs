//! Site types - crawled sites and their indexing status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned site identifier.
pub type SiteId = i64;

/// Lifecycle of a crawl session for one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    Indexing,
    Indexed,
    Failed,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Indexing => "INDEXING",
            SiteStatus::Indexed => "INDEXED",
            SiteStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INDEXING" => Ok(SiteStatus::Indexing),
            "INDEXED" => Ok(SiteStatus::Indexed),
            "FAILED" => Ok(SiteStatus::Failed),
            other => Err(format!("unknown site status: {other}")),
        }
    }
}

/// A site row.
///
/// Owned and mutated only by the session driver that crawls it; page tasks
/// report outcomes instead of touching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// `0` until the store assigns an id
    pub id: SiteId,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    /// Empty when healthy
    pub last_error: String,
}

impl Site {
    /// A fresh, unsaved site in `INDEXING` status.
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            url: url.into(),
            name: name.into(),
            status: SiteStatus::Indexing,
            status_time: Utc::now(),
            last_error: String::new(),
        }
    }

    /// Refresh the status time without changing the status.
    pub fn touch(&mut self) {
        self.status_time = Utc::now();
    }

    pub fn mark_indexing(&mut self) {
        self.status = SiteStatus::Indexing;
        self.last_error.clear();
        self.touch();
    }

    pub fn mark_indexed(&mut self) {
        self.status = SiteStatus::Indexed;
        self.touch();
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = SiteStatus::Failed;
        self.last_error = error.into();
        self.touch();
    }

    pub fn is_failed(&self) -> bool {
        self.status == SiteStatus::Failed
    }
}
