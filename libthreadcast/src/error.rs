//! Error types for Threadcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThreadcastError>;

#[derive(Error, Debug)]
pub enum ThreadcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Thread generation failed: {0}")]
    Generation(String),

    #[error("History log error: {0}")]
    History(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ThreadcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ThreadcastError::InvalidInput(_) => 3,
            ThreadcastError::Config(_) => 3,
            ThreadcastError::Schedule(_) => 3,
            ThreadcastError::Platform(PlatformError::Authentication(_)) => 2,
            ThreadcastError::Platform(_) => 1,
            ThreadcastError::Generation(_) => 1,
            ThreadcastError::History(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(std::io::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid duration for {field}: {value}")]
    InvalidDuration { field: String, value: String },
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Failed to read schedule file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to write schedule file: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse schedule: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid slot time '{0}' (expected HH:MM)")]
    InvalidTime(String),
}

/// Errors raised while talking to the Bluesky PDS.
///
/// `Clone` so a thread result can carry the error that stopped the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Blob upload failed: {0}")]
    Upload(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Thread has no posts to publish")]
    EmptyThread,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = ThreadcastError::InvalidInput("bad time".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let error = ThreadcastError::Platform(PlatformError::Authentication(
            "401: bad password".to_string(),
        ));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_platform_errors() {
        for platform_error in [
            PlatformError::Posting("500".to_string()),
            PlatformError::Upload("413".to_string()),
            PlatformError::Network("timeout".to_string()),
            PlatformError::RateLimit("429".to_string()),
            PlatformError::EmptyThread,
        ] {
            assert_eq!(ThreadcastError::Platform(platform_error).exit_code(), 1);
        }
    }

    #[test]
    fn test_exit_code_config_and_schedule() {
        let config = ThreadcastError::Config(ConfigError::MissingField("bluesky.handle".to_string()));
        assert_eq!(config.exit_code(), 3);

        let schedule = ThreadcastError::Schedule(ScheduleError::InvalidTime("9am".to_string()));
        assert_eq!(schedule.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_generation_error() {
        let error = ThreadcastError::Generation("all providers failed".to_string());
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting() {
        let error = ThreadcastError::Platform(PlatformError::Posting(
            "status 500: internal".to_string(),
        ));
        assert_eq!(
            error.to_string(),
            "Platform error: Posting failed: status 500: internal"
        );

        let empty = ThreadcastError::Platform(PlatformError::EmptyThread);
        assert_eq!(
            empty.to_string(),
            "Platform error: Thread has no posts to publish"
        );
    }

    #[test]
    fn test_invalid_duration_formatting() {
        let error = ConfigError::InvalidDuration {
            field: "publishing.inter_post_delay".to_string(),
            value: "soon".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid duration for publishing.inter_post_delay: soon"
        );
    }

    #[test]
    fn test_error_conversion_from_platform_error() {
        let error: ThreadcastError = PlatformError::Upload("test".to_string()).into();
        assert!(matches!(
            error,
            ThreadcastError::Platform(PlatformError::Upload(_))
        ));
    }

    #[test]
    fn test_error_conversion_from_config_error() {
        let error: ThreadcastError = ConfigError::MissingField("x".to_string()).into();
        assert!(matches!(error, ThreadcastError::Config(_)));
    }
}
