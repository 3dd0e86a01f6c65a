//! Round-robin provider rotation

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::parse::{parse_thread, MIN_THREAD_POSTS};
use super::prompt::thread_prompt;
use super::providers::provider_from_config;
use super::{CompletionProvider, ThreadGenerator};
use crate::config::GeneratorConfig;
use crate::error::{ConfigError, Result, ThreadcastError};

/// Index of the provider after `current` in a list of `count`
///
/// Wraps to zero past the end. A `count` of zero yields zero.
pub fn next_index(current: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (current + 1) % count
    }
}

/// Tries providers in round-robin order until one yields a usable thread
///
/// The current index persists across calls and only advances when a provider
/// fails, so a healthy provider keeps being used.
pub struct RotatingGenerator {
    providers: Vec<Box<dyn CompletionProvider>>,
    current: AtomicUsize,
    max_attempts: usize,
    retry_delay: Duration,
}

impl RotatingGenerator {
    pub fn new(providers: Vec<Box<dyn CompletionProvider>>) -> Self {
        Self {
            providers,
            current: AtomicUsize::new(0),
            max_attempts: 2,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Build from the `[generator]` config section
    pub fn from_config(config: &GeneratorConfig, timeout: Duration) -> Result<Self> {
        if config.providers.is_empty() {
            return Err(ConfigError::MissingField("generator.providers".to_string()).into());
        }

        let providers = config
            .providers
            .iter()
            .map(|provider| provider_from_config(provider, timeout))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(providers)
            .with_max_attempts(config.max_attempts)
            .with_retry_delay(config.retry_delay()?))
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Index of the provider the next call starts with
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    fn attempts(&self) -> usize {
        self.max_attempts.min(self.providers.len())
    }

    async fn attempt(&self, provider: &dyn CompletionProvider, prompt: &str) -> Result<Vec<String>> {
        let content = provider.complete(prompt).await?;
        let posts = parse_thread(&content);
        if posts.len() < MIN_THREAD_POSTS {
            return Err(ThreadcastError::Generation(format!(
                "{} produced {} usable posts (need at least {})",
                provider.name(),
                posts.len(),
                MIN_THREAD_POSTS
            )));
        }
        Ok(posts)
    }
}

#[async_trait]
impl ThreadGenerator for RotatingGenerator {
    async fn generate(&self, topic: &str) -> Result<Vec<String>> {
        info!("Generating thread: {}", topic);
        let prompt = thread_prompt(topic);
        let attempts = self.attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            let index = self.current_index();
            let provider = self.providers[index].as_ref();
            info!("Using provider {}", provider.name());

            match self.attempt(provider, &prompt).await {
                Ok(posts) => {
                    info!("Thread generated: {} posts", posts.len());
                    return Ok(posts);
                }
                Err(e) => {
                    warn!("Provider {} failed: {}", provider.name(), e);
                    last_error = Some(e);
                }
            }

            self.current
                .store(next_index(index, self.providers.len()), Ordering::SeqCst);

            if attempt + 1 < attempts && !self.retry_delay.is_zero() {
                sleep(self.retry_delay).await;
            }
        }

        Err(match last_error {
            Some(e) => ThreadcastError::Generation(format!(
                "all {} attempts failed, last error: {}",
                attempts, e
            )),
            None => ThreadcastError::Generation("no providers configured".to_string()),
        })
    }
}
