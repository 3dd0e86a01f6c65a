//! Service layer for Threadcast
//!
//! `ThreadService` ties the pieces together for one authenticated account:
//! it looks slots up in the [`Schedule`], asks the [`ThreadGenerator`] for
//! post texts, publishes them through a [`ThreadPublisher`] and records a
//! [`SlotReport`] for every slot it processes.
//!
//! # Example
//!
//! ```no_run
//! use libthreadcast::service::ThreadService;
//! use libthreadcast::Config;
//!
//! # async fn example() -> libthreadcast::Result<()> {
//! let config = Config::load()?;
//! let service = ThreadService::from_config(&config).await?;
//!
//! let today = chrono::Local::now().date_naive();
//! if let Some(report) = service.run_slot(today, "09:00").await? {
//!     println!("{}: {}", report.topic, report.status);
//! }
//! # Ok(())
//! # }
//! ```

mod summary;

pub use summary::DaySummary;

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::bluesky::{authenticate, ReqwestTransport, ThreadPublisher, XrpcTransport};
use crate::config::{expand_path, Config};
use crate::generator::{RotatingGenerator, ThreadGenerator};
use crate::history::{HistoryLog, SlotReport};
use crate::schedule::{Schedule, ThreadSlot};
use crate::types::{ImageMimeType, ImageUpload};
use crate::Result;

/// Pause between threads when running a whole day
pub const DEFAULT_SLOT_DELAY: Duration = Duration::from_secs(10);

/// Generates and publishes scheduled threads
pub struct ThreadService {
    generator: Arc<dyn ThreadGenerator>,
    publisher: ThreadPublisher,
    schedule: Schedule,
    history: Option<HistoryLog>,
    slot_delay: Duration,
}

impl ThreadService {
    pub fn new(
        generator: Arc<dyn ThreadGenerator>,
        publisher: ThreadPublisher,
        schedule: Schedule,
    ) -> Self {
        Self {
            generator,
            publisher,
            schedule,
            history: None,
            slot_delay: DEFAULT_SLOT_DELAY,
        }
    }

    /// Authenticate and assemble a service from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The schedule file cannot be read or parsed
    /// - No generator provider is configured
    /// - A configured duration is invalid
    /// - Authentication with the PDS fails
    pub async fn from_config(config: &Config) -> Result<Self> {
        let schedule = Schedule::load(&config.paths.schedule_path())?;
        let timeout = config.publishing.request_timeout()?;
        let generator = RotatingGenerator::from_config(&config.generator, timeout)?;

        let transport: Arc<dyn XrpcTransport> =
            Arc::new(ReqwestTransport::new(&config.bluesky.service_url, timeout)?);
        let session = authenticate(
            transport.as_ref(),
            &config.bluesky.handle,
            &config.bluesky.app_password(),
        )
        .await?;
        info!("Authenticated as {}", session.handle());

        let publisher = ThreadPublisher::new(transport, Arc::new(session))
            .with_inter_post_delay(config.publishing.inter_post_delay()?);

        let mut service = Self::new(Arc::new(generator), publisher, schedule)
            .with_slot_delay(config.publishing.slot_delay()?);
        if let Some(path) = config.paths.history_path() {
            service = service.with_history(HistoryLog::new(path));
        }
        Ok(service)
    }

    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_slot_delay(mut self, delay: Duration) -> Self {
        self.slot_delay = delay;
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn publisher(&self) -> &ThreadPublisher {
        &self.publisher
    }

    /// Generate a thread for `slot` and publish it
    ///
    /// Never fails: generation and posting problems are reported in the
    /// returned [`SlotReport`], which is also appended to the history log when
    /// one is configured.
    pub async fn generate_and_post(&self, slot: &ThreadSlot) -> SlotReport {
        info!("Processing thread: {}", slot.topic);

        let report = self.process(slot).await.with_time(slot.time.as_str());
        self.record(&report);
        report
    }

    async fn process(&self, slot: &ThreadSlot) -> SlotReport {
        let posts = match self.generator.generate(&slot.topic).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Generation failed for '{}': {}", slot.topic, e);
                return SlotReport::generation_failed(&slot.topic, e);
            }
        };

        let image = match slot.image.as_deref() {
            Some(path) => load_image(path).await.map(|upload| (path, upload)),
            None => None,
        };
        let (image_path, upload) = match image {
            Some((path, upload)) => (Some(path), Some(upload)),
            None => (None, None),
        };

        match self.publisher.publish_thread(&posts, upload).await {
            Ok(result) => {
                let uri = result.root().map(|root| root.uri.clone());
                let url = result
                    .root()
                    .map(|root| root.web_url(self.publisher.session().handle()));
                let image = image_path
                    .filter(|_| result.image_attached)
                    .map(str::to_string);
                let error = result.error.as_ref().map(ToString::to_string);
                SlotReport::published(&slot.topic, posts, result.posts.len(), image, uri, error)
                    .with_url(url)
            }
            Err(e) => {
                warn!("Thread for '{}' was not published: {}", slot.topic, e);
                SlotReport::published(&slot.topic, posts, 0, None, None, Some(e.to_string()))
            }
        }
    }

    fn record(&self, report: &SlotReport) {
        if let Some(history) = &self.history {
            if let Err(e) = history.append(report) {
                warn!("Could not write history log: {}", e);
            }
        }
    }

    /// Run the slot scheduled at `time` on `date`
    ///
    /// Returns `Ok(None)` when nothing is scheduled then, and an error only for
    /// a malformed `time`.
    pub async fn run_slot(&self, date: NaiveDate, time: &str) -> Result<Option<SlotReport>> {
        match self.schedule.slot_at(date, time)? {
            Some(slot) => Ok(Some(self.generate_and_post(slot).await)),
            None => {
                warn!("No thread scheduled for {} at {}", date, time);
                Ok(None)
            }
        }
    }

    /// Run every slot of `date` in schedule order, pausing between threads
    pub async fn run_day(&self, date: NaiveDate) -> Vec<SlotReport> {
        let slots = self.schedule.threads_on(date);
        if slots.is_empty() {
            warn!("No threads scheduled for {}", date);
            return Vec::new();
        }

        info!("Running {} threads for {}", slots.len(), date);
        let mut reports = Vec::with_capacity(slots.len());
        for (idx, slot) in slots.iter().enumerate() {
            info!("[{}/{}] {} {}", idx + 1, slots.len(), slot.time, slot.topic);
            reports.push(self.generate_and_post(slot).await);

            if idx + 1 < slots.len() && !self.slot_delay.is_zero() {
                info!("Waiting {:?} before next thread", self.slot_delay);
                sleep(self.slot_delay).await;
            }
        }
        reports
    }
}

/// Read an image for upload, or `None` (with a warning) if it cannot be read
async fn load_image(path: &str) -> Option<ImageUpload> {
    let resolved = expand_path(path);
    match tokio::fs::read(&resolved).await {
        Ok(bytes) => Some(ImageUpload::new(bytes, ImageMimeType::from_path(&resolved))),
        Err(e) => {
            warn!("Image {} not readable, posting without image: {}", resolved.display(), e);
            None
        }
    }
}
