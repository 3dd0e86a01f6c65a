//! Thread text generation
//!
//! A [`ThreadGenerator`] turns a topic into the ordered post texts of a
//! thread. The production generator, [`RotatingGenerator`], asks a list of
//! language-model [`CompletionProvider`]s in round-robin order and parses the
//! completion into posts.

use async_trait::async_trait;

use crate::error::Result;

mod parse;
mod prompt;
mod providers;
mod rotation;

pub use parse::{parse_thread, MAX_POST_CHARS, MIN_THREAD_POSTS};
pub use prompt::{thread_prompt, SYSTEM_PROMPT};
pub use providers::{
    provider_from_config, GeminiProvider, GroqProvider, DEFAULT_COMPLETION_TIMEOUT,
};
pub use rotation::{next_index, RotatingGenerator};

/// Sampling temperature used for every provider
pub const TEMPERATURE: f64 = 0.8;

/// Upper bound on completion length
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Produces the post texts of a thread about a topic
#[async_trait]
pub trait ThreadGenerator: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<Vec<String>>;
}

/// One language-model API
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Raw completion text for a prompt
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Generator returning canned posts, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct StaticGenerator {
    posts: Option<Vec<String>>,
}

impl StaticGenerator {
    /// Always returns `posts`
    pub fn new<S: Into<String>>(posts: impl IntoIterator<Item = S>) -> Self {
        Self {
            posts: Some(posts.into_iter().map(Into::into).collect()),
        }
    }

    /// Always fails
    pub fn failing() -> Self {
        Self { posts: None }
    }
}

#[async_trait]
impl ThreadGenerator for StaticGenerator {
    async fn generate(&self, topic: &str) -> Result<Vec<String>> {
        match &self.posts {
            Some(posts) => Ok(posts.clone()),
            None => Err(crate::error::ThreadcastError::Generation(format!(
                "no posts available for '{}'",
                topic
            ))),
        }
    }
}
