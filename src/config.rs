use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_DUE_LIMIT, DEFAULT_HISTORY_LIMIT, DEFAULT_MASTERY_MIN_QUALITY,
    DEFAULT_MASTERY_MIN_REPETITIONS,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub scheduler: SchedulerEnvConfig,
}

#[derive(Debug, Clone)]
pub struct SchedulerEnvConfig {
    pub priority_policy: String,
    pub due_limit: usize,
    pub history_limit: usize,
    pub mastery_min_quality: u8,
    pub mastery_min_repetitions: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/recall.sled"),
            scheduler: SchedulerEnvConfig {
                priority_policy: env_or("SCHEDULER_PRIORITY_POLICY", "standard"),
                due_limit: env_or_parse("SCHEDULER_DUE_LIMIT", DEFAULT_DUE_LIMIT),
                history_limit: env_or_parse("SCHEDULER_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT),
                mastery_min_quality: env_or_parse(
                    "SCHEDULER_MASTERY_MIN_QUALITY",
                    DEFAULT_MASTERY_MIN_QUALITY,
                ),
                mastery_min_repetitions: env_or_parse(
                    "SCHEDULER_MASTERY_MIN_REPETITIONS",
                    DEFAULT_MASTERY_MIN_REPETITIONS,
                ),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
