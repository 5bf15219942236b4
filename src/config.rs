use std::time::Duration;

use chatgpt::{client::ChatGPT, config::ChatGPTEngine};
use thiserror::Error;

const DEFAULT_ENGINE: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_QUESTION_COUNT: usize = 5;
const MAX_QUESTION_COUNT: usize = 20;

const ENGINES: [&str; 6] = [
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-0301",
    "gpt-4",
    "gpt-4-32k",
    "gpt-4-0314",
    "gpt-4-32k-0314",
];

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings read from the environment (and `.env`, loaded by `main`).
pub struct Config {
    pub telegram_token: String,
    pub chatgpt_api_key: String,
    pub engine: &'static str,
    pub timeout: Duration,
    pub question_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let telegram_token = required("TELOXIDE_TOKEN", &lookup)?;
        let chatgpt_api_key = required("CHATGPT_API_KEY", &lookup)?;

        let engine = match lookup("QUIZBOT_ENGINE") {
            None => DEFAULT_ENGINE,
            Some(value) => ENGINES
                .iter()
                .copied()
                .find(|engine| *engine == value.trim())
                .ok_or_else(|| ConfigError::Invalid {
                    name: "QUIZBOT_ENGINE",
                    reason: format!("expected one of {}", ENGINES.join(", ")),
                    value,
                })?,
        };

        let timeout_secs = parse_number("QUIZBOT_TIMEOUT_SECS", &lookup, DEFAULT_TIMEOUT_SECS, 1..=600)?;
        let question_count = parse_number(
            "QUIZBOT_QUESTION_COUNT",
            &lookup,
            DEFAULT_QUESTION_COUNT,
            1..=MAX_QUESTION_COUNT,
        )?;

        Ok(Self {
            telegram_token,
            chatgpt_api_key,
            engine,
            timeout: Duration::from_secs(timeout_secs),
            question_count,
        })
    }

    /// A ChatGPT client configured for quiz generation.
    pub fn chat_gpt(&self) -> chatgpt::Result<ChatGPT> {
        let mut gpt = ChatGPT::new(&self.chatgpt_api_key)?;

        gpt.config.engine = self.chatgpt_engine();
        gpt.config.timeout = self.timeout;
        gpt.config.temperature = 1.0;
        gpt.config.top_p = 0.95;

        Ok(gpt)
    }

    fn chatgpt_engine(&self) -> ChatGPTEngine {
        match self.engine {
            "gpt-3.5-turbo-0301" => ChatGPTEngine::Gpt35Turbo_0301,
            "gpt-4" => ChatGPTEngine::Gpt4,
            "gpt-4-32k" => ChatGPTEngine::Gpt4_32k,
            "gpt-4-0314" => ChatGPTEngine::Gpt4_0314,
            "gpt-4-32k-0314" => ChatGPTEngine::Gpt4_32k_0314,
            _ => ChatGPTEngine::Gpt35Turbo,
        }
    }
}

fn required(name: &'static str, lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_number<T>(
    name: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
    range: std::ops::RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().parse::<T>() {
        Ok(number) if range.contains(&number) => Ok(number),
        _ => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a number from {} to {}", range.start(), range.end()),
            value,
        }),
    }
}
