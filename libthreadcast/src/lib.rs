//! Threadcast - scheduled thread publishing for Bluesky
//!
//! This library turns an ordered list of post texts (and an optional image)
//! into a reply chain on Bluesky through the AT Protocol XRPC API, and wraps
//! that core with a posting schedule, language-model text generation and a
//! posting history log.

pub mod bluesky;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod logging;
pub mod schedule;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use bluesky::{Session, ThreadOutcome, ThreadPublisher, ThreadResult};
pub use config::Config;
pub use error::{ConfigError, PlatformError, Result, ScheduleError, ThreadcastError};
pub use generator::ThreadGenerator;
pub use history::{HistoryLog, SlotReport, SlotStatus};
pub use schedule::{DaySchedule, Schedule, ThreadSlot};
pub use service::{DaySummary, ThreadService};
pub use types::{BlobRef, ImageMimeType, ImageUpload, RecordRef, ReplyRef};
