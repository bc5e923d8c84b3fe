//! Application-level configuration loading, including the runtime question bank.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::bank::Question;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZROOM_BACK_CONFIG_PATH";
/// Number of questions a room must answer before its game ends, unless configured.
const DEFAULT_QUESTIONS_PER_GAME: u32 = 5;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    questions: Vec<Question>,
    questions_per_game: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the baked-in question bank.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        count = app_config.questions.len(),
                        questions_per_game = app_config.questions_per_game,
                        "loaded question bank from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Configured questions, in file order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of correctly answered questions that finishes a game.
    pub fn questions_per_game(&self) -> u32 {
        self.questions_per_game
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            questions: default_questions(),
            questions_per_game: DEFAULT_QUESTIONS_PER_GAME,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    questions: Vec<RawQuestion>,
    questions_per_game: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let questions = value
            .questions
            .into_iter()
            .map(Into::into)
            .collect::<Vec<_>>();
        Self {
            questions,
            questions_per_game: value
                .questions_per_game
                .unwrap_or(DEFAULT_QUESTIONS_PER_GAME),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single question inside the configuration file.
struct RawQuestion {
    id: u32,
    prompt: String,
    answer: String,
}

impl From<RawQuestion> for Question {
    fn from(value: RawQuestion) -> Self {
        Self {
            id: value.id,
            prompt: value.prompt,
            answer: value.answer,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in question bank shipped with the binary.
fn default_questions() -> Vec<Question> {
    vec![
        Question {
            id: 0,
            prompt: "What's 5 + 7?".into(),
            answer: "12".into(),
        },
        Question {
            id: 1,
            prompt: "What's 25 / 5?".into(),
            answer: "5".into(),
        },
        Question {
            id: 2,
            prompt: "What's 10 * 2?".into(),
            answer: "20".into(),
        },
        Question {
            id: 3,
            prompt: "What's 15 - 3?".into(),
            answer: "12".into(),
        },
        Question {
            id: 4,
            prompt: "What's 20 + 10?".into(),
            answer: "30".into(),
        },
    ]
}
