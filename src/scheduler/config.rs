use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DUE_LIMIT, DEFAULT_HISTORY_LIMIT, DEFAULT_MASTERY_MIN_QUALITY,
    DEFAULT_MASTERY_MIN_REPETITIONS, MAX_QUALITY, PASSING_QUALITY,
};

/// Caller-side policy deciding when an item counts as mastered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryConfig {
    pub min_quality: u8,
    pub min_repetitions: u32,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            min_quality: DEFAULT_MASTERY_MIN_QUALITY,
            min_repetitions: DEFAULT_MASTERY_MIN_REPETITIONS,
        }
    }
}

/// Classification rule used by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorityPolicy {
    /// Overdue or hard-and-close is high, exactly three days out is medium.
    #[default]
    Standard,
    /// Anything due within three days is at least medium.
    ReferenceWindow,
}

impl PriorityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ReferenceWindow => "reference_window",
        }
    }
}

impl fmt::Display for PriorityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(Self::Standard),
            "reference_window" | "reference" => Ok(Self::ReferenceWindow),
            other => Err(format!("unknown priority policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerConfig {
    pub policy: PriorityPolicy,
    pub due_limit: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            policy: PriorityPolicy::Standard,
            due_limit: DEFAULT_DUE_LIMIT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    #[serde(default)]
    pub mastery: MasteryConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
}

impl SchedulerConfig {
    pub fn from_env(env_config: &crate::config::SchedulerEnvConfig) -> Self {
        let mut config = Self::default();
        match env_config.priority_policy.parse::<PriorityPolicy>() {
            Ok(policy) => config.planner.policy = policy,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid priority policy, using default");
            }
        }
        config.planner.due_limit = env_config.due_limit;
        config.planner.history_limit = env_config.history_limit;
        config.mastery.min_quality = env_config.mastery_min_quality;
        config.mastery.min_repetitions = env_config.mastery_min_repetitions;
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(PASSING_QUALITY..=MAX_QUALITY).contains(&self.mastery.min_quality) {
            return Err(format!(
                "mastery.min_quality must be in [{PASSING_QUALITY},{MAX_QUALITY}]"
            ));
        }
        if self.mastery.min_repetitions == 0 {
            return Err("mastery.min_repetitions must be > 0".to_string());
        }
        if self.planner.due_limit == 0 {
            return Err("planner.due_limit must be > 0".to_string());
        }
        if self.planner.history_limit == 0 {
            return Err("planner.history_limit must be > 0".to_string());
        }
        Ok(())
    }
}
