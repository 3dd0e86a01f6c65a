//! Posting history log
//!
//! One JSON array per file, one [`SlotReport`] per processed slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Result, ThreadcastError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Success,
    Partial,
    Failed,
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotStatus::Success => write!(f, "success"),
            SlotStatus::Partial => write!(f, "partial"),
            SlotStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    GenerationFailed,
    PostingFailed,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::GenerationFailed => write!(f, "generation_failed"),
            FailureReason::PostingFailed => write!(f, "posting_failed"),
        }
    }
}

/// Outcome of processing one scheduled slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotReport {
    pub id: Uuid,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Generated texts, in thread order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub posts: Vec<String>,
    /// Image attached to the first post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// URI of the thread's root post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Web link to the thread's root post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub posted: usize,
    #[serde(default)]
    pub requested: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SlotReport {
    fn base(status: SlotStatus, topic: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            status,
            reason: None,
            topic: topic.to_string(),
            time: None,
            posts: Vec::new(),
            image: None,
            uri: None,
            url: None,
            posted: 0,
            requested: 0,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn generation_failed(topic: &str, error: impl ToString) -> Self {
        Self {
            reason: Some(FailureReason::GenerationFailed),
            error: Some(error.to_string()),
            ..Self::base(SlotStatus::Failed, topic)
        }
    }

    /// Report for a thread whose publication was attempted
    ///
    /// `posted` is how many posts were created; `uri` is the root post.
    pub fn published(
        topic: &str,
        posts: Vec<String>,
        posted: usize,
        image: Option<String>,
        uri: Option<String>,
        error: Option<String>,
    ) -> Self {
        let requested = posts.len();
        let (status, reason) = if posted == 0 {
            (SlotStatus::Failed, Some(FailureReason::PostingFailed))
        } else if posted < requested {
            (SlotStatus::Partial, None)
        } else {
            (SlotStatus::Success, None)
        };

        Self {
            reason,
            posts,
            image,
            uri,
            posted,
            requested,
            error,
            ..Self::base(status, topic)
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == SlotStatus::Success
    }
}

/// Append-only JSON log file
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Vec<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ThreadcastError::History(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            ThreadcastError::History(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    /// Add a report, rewriting the whole file
    ///
    /// Entries already in the file are kept as-is, including ones this
    /// version cannot parse as a [`SlotReport`].
    pub fn append(&self, report: &SlotReport) -> Result<()> {
        let mut entries = self.read_raw()?;
        let value = serde_json::to_value(report)
            .map_err(|e| ThreadcastError::History(format!("Failed to encode report: {}", e)))?;
        entries.push(value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ThreadcastError::History(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = serde_json::to_string_pretty(&entries)
            .map_err(|e| ThreadcastError::History(format!("Failed to encode log: {}", e)))?;
        std::fs::write(&self.path, content).map_err(|e| {
            ThreadcastError::History(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        tracing::debug!("Logged {} report to {}", report.status, self.path.display());
        Ok(())
    }

    /// Every report in the file, skipping entries that do not parse
    pub fn entries(&self) -> Result<Vec<SlotReport>> {
        Ok(self
            .read_raw()?
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect())
    }
}
