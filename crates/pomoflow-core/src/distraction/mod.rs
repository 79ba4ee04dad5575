//! Distraction self-reports and the policy deciding when to ask for them.

mod sampler;

pub use sampler::{DistractionSampler, PromptDecision, DEFAULT_GROUP_SIZE, DEFAULT_QUOTA};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user's answer to a distraction prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistractionReport {
    /// Counter value of the pomodoro being reported on.
    pub pomodoro_number: u64,
    pub had_distractions: bool,
    pub used_phone: bool,
    pub at: DateTime<Utc>,
}

impl DistractionReport {
    pub fn new(pomodoro_number: u64, had_distractions: bool, used_phone: bool) -> Self {
        Self {
            pomodoro_number,
            had_distractions,
            used_phone,
            at: Utc::now(),
        }
    }
}
