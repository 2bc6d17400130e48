use std::time::Duration;

use thiserror::Error;

use crate::quiz::Delays;

const DEFAULT_QUESTIONS_URL: &str = "http://127.0.0.1:8080/api/questions";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub questions_url: String,
    pub fetch_timeout: Duration,
    pub delays: Delays,
}

impl Config {
    /// Reads the process environment. `.env` should be loaded before this.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Delays::default();
        let number = |name: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(name)
                .map(|value| {
                    let parsed = value.trim().parse::<u64>();
                    parsed.map_err(|_| ConfigError::InvalidNumber { name, value })
                })
                .transpose()
        };

        let fetch_timeout = number("QUIZ_FETCH_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
        let choice = number("QUIZ_CHOICE_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.choice);
        let short_answer = number("QUIZ_SHORT_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.short_answer);

        Ok(Self {
            questions_url: lookup("QUIZ_QUESTIONS_URL")
                .unwrap_or_else(|| DEFAULT_QUESTIONS_URL.to_string()),
            fetch_timeout,
            delays: Delays {
                choice,
                short_answer,
            },
        })
    }
}
