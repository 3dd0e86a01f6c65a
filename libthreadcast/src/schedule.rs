//! Posting schedule
//!
//! A schedule file is JSON in one of two shapes: a bare list of days, or an
//! object whose `schedule` key holds that list (other keys are ignored, so a
//! combined config export loads too). Both normalize into [`Schedule`].

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScheduleError, ThreadcastError};

/// Slot times used by [`Schedule::sample`]
pub const DEFAULT_SLOT_TIMES: [&str; 3] = ["09:00", "14:00", "19:00"];

const SAMPLE_TOPICS: [[&str; 3]; 7] = [
    [
        "What moving to a decentralized network taught me",
        "Five habits that made building in public easier",
        "Where small online communities are heading",
    ],
    [
        "Growing an audience without chasing algorithms",
        "Content mistakes I made in my first year",
        "How to build real connections online",
    ],
    [
        "Learning to program as a career changer",
        "A productivity system I actually kept using",
        "Why showing up beats being perfect",
    ],
    [
        "Writing threads people finish reading",
        "Finding a voice that sounds like you",
        "What 100 days of daily posting changed",
    ],
    [
        "Decentralization explained without the hype",
        "A project that failed and what it taught me",
        "Getting past a creative block",
    ],
    [
        "Running a side project that pays for itself",
        "Community matters more than follower counts",
        "Small tools that make posting sustainable",
    ],
    [
        "My toolkit for writing and editing",
        "Managing time when creating is not your day job",
        "Planning a year of content",
    ],
];

/// One scheduled thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSlot {
    /// Local time of day, `HH:MM`
    pub time: String,
    pub topic: String,
    /// Path to an image for the first post; `~` is expanded when used
    #[serde(default)]
    pub image: Option<String>,
}

/// All slots of one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(default)]
    pub day: u32,
    pub date: NaiveDate,
    #[serde(default, alias = "posts")]
    pub threads: Vec<ThreadSlot>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScheduleFile {
    Wrapped { schedule: Vec<DaySchedule> },
    Bare(Vec<DaySchedule>),
}

/// Normalized schedule: days in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    days: Vec<DaySchedule>,
}

/// Parse `H:MM` or `HH:MM` and return it as `HH:MM`
pub fn normalize_time(time: &str) -> std::result::Result<String, ScheduleError> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ScheduleError::InvalidTime(time.to_string()))
}

impl Schedule {
    pub fn new(days: Vec<DaySchedule>) -> Self {
        Self { days }
    }

    /// Read and parse a schedule file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ScheduleError::ReadError)?;
        Self::from_json(&content)
    }

    /// Parse either schedule shape and validate every slot time
    pub fn from_json(content: &str) -> Result<Self> {
        let days = match serde_json::from_str(content).map_err(ScheduleError::ParseError)? {
            ScheduleFile::Wrapped { schedule } => schedule,
            ScheduleFile::Bare(days) => days,
        };

        let mut schedule = Self { days };
        for slot in schedule.days.iter_mut().flat_map(|d| d.threads.iter_mut()) {
            slot.time = normalize_time(&slot.time)?;
        }
        Ok(schedule)
    }

    pub fn days(&self) -> &[DaySchedule] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Slots for `date`, empty if the date is not scheduled
    ///
    /// When a date appears more than once the first entry wins.
    pub fn threads_on(&self, date: NaiveDate) -> &[ThreadSlot] {
        self.days
            .iter()
            .find(|day| day.date == date)
            .map(|day| day.threads.as_slice())
            .unwrap_or(&[])
    }

    /// The slot scheduled at `time` on `date`
    pub fn slot_at(&self, date: NaiveDate, time: &str) -> Result<Option<&ThreadSlot>> {
        let time = normalize_time(time)?;
        Ok(self.threads_on(date).iter().find(|slot| slot.time == time))
    }

    pub fn total_threads(&self) -> usize {
        self.days.iter().map(|d| d.threads.len()).sum()
    }

    /// A `days`-long schedule starting at `start` with three slots a day,
    /// cycling through a built-in topic table
    ///
    /// Fails with `InvalidInput` when a date would fall outside the
    /// calendar range.
    pub fn sample(start: NaiveDate, days: u32) -> Result<Self> {
        let schedule = (0..days)
            .map(|offset| -> Result<DaySchedule> {
                let date = start
                    .checked_add_days(Days::new(u64::from(offset)))
                    .ok_or_else(|| {
                        ThreadcastError::InvalidInput(format!(
                            "schedule starting {} cannot span {} days",
                            start, days
                        ))
                    })?;
                let topics = SAMPLE_TOPICS[offset as usize % SAMPLE_TOPICS.len()];

                Ok(DaySchedule {
                    day: offset + 1,
                    date,
                    threads: DEFAULT_SLOT_TIMES
                        .iter()
                        .zip(topics)
                        .map(|(time, topic)| ThreadSlot {
                            time: time.to_string(),
                            topic: topic.to_string(),
                            image: None,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { days: schedule })
    }

    /// Write the schedule as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json_pretty()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ScheduleError::WriteError)?;
        }
        std::fs::write(path, content).map_err(ScheduleError::WriteError)?;
        Ok(())
    }

    /// Pretty JSON in the bare-list shape
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScheduleError::ParseError(e).into())
    }
}
