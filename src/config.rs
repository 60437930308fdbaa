//! Application-level configuration loading, including contest timing knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CODEVERSUS_BACK_CONFIG_PATH";

/// Contest runs for 90 minutes from its server-side start timestamp.
const DEFAULT_CONTEST_DURATION_SECS: u64 = 90 * 60;
/// Room codes are 6 uppercase alphanumerics.
const DEFAULT_ROOM_CODE_LENGTH: usize = 6;
/// Give up creating a room after this many code collisions in a row.
const DEFAULT_ROOM_CODE_ATTEMPTS: u32 = 5;
/// Verdict polling budget: attempts and the pause between them.
const DEFAULT_JUDGE_POLL_ATTEMPTS: u32 = 10;
const DEFAULT_JUDGE_POLL_INTERVAL_SECS: u64 = 2;
/// Broadcast channel capacity per SSE hub.
const DEFAULT_SSE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Length of the contest clock started by the server.
    pub contest_duration: Duration,
    /// Number of characters in generated room codes.
    pub room_code_length: usize,
    /// How many collisions to tolerate before failing room creation.
    pub room_code_attempts: u32,
    /// How many times to poll the judging service for a verdict.
    pub judge_poll_attempts: u32,
    /// Pause between verdict polls.
    pub judge_poll_interval: Duration,
    /// Capacity of each per-document SSE broadcast channel.
    pub sse_channel_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        contest_duration_secs = app_config.contest_duration.as_secs(),
                        "loaded configuration"
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
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            contest_duration: Duration::from_secs(DEFAULT_CONTEST_DURATION_SECS),
            room_code_length: DEFAULT_ROOM_CODE_LENGTH,
            room_code_attempts: DEFAULT_ROOM_CODE_ATTEMPTS,
            judge_poll_attempts: DEFAULT_JUDGE_POLL_ATTEMPTS,
            judge_poll_interval: Duration::from_secs(DEFAULT_JUDGE_POLL_INTERVAL_SECS),
            sse_channel_capacity: DEFAULT_SSE_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    contest_duration_secs: Option<u64>,
    room_code_length: Option<usize>,
    room_code_attempts: Option<u32>,
    judge_poll_attempts: Option<u32>,
    judge_poll_interval_secs: Option<u64>,
    sse_channel_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            contest_duration: value
                .contest_duration_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.contest_duration),
            room_code_length: value.room_code_length.unwrap_or(defaults.room_code_length),
            room_code_attempts: value
                .room_code_attempts
                .unwrap_or(defaults.room_code_attempts),
            judge_poll_attempts: value
                .judge_poll_attempts
                .unwrap_or(defaults.judge_poll_attempts),
            judge_poll_interval: value
                .judge_poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.judge_poll_interval),
            sse_channel_capacity: value
                .sse_channel_capacity
                .unwrap_or(defaults.sse_channel_capacity),
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
