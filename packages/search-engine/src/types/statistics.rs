//! Index statistics returned by the engine.

use serde::{Deserialize, Serialize};

use super::site::SiteStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalStatistics {
    pub sites: usize,
    pub pages: usize,
    pub lemmas: usize,
    pub indexing: bool,
}

/// Per-site detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStatistics {
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    /// Epoch milliseconds of the last status change
    pub status_time: i64,
    pub error: String,
    pub pages: usize,
    pub lemmas: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<DetailedStatistics>,
}
