//! Grouped sampling of distraction prompts.
//!
//! Completed pomodoros are numbered from 1 and split into consecutive groups
//! of `group_size`. Within each group exactly `quota` of them trigger a
//! prompt: each position prompts with probability `needed / remaining`, and
//! the prompt is forced once the remaining positions only just cover the
//! prompts still owed.

use rand::Rng;
use tracing::debug;

use crate::error::ValidationError;

pub const DEFAULT_GROUP_SIZE: u64 = 10;
pub const DEFAULT_QUOTA: u64 = 3;

/// Outcome of [`DistractionSampler::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptDecision {
    Skip,
    /// The group would otherwise end short of its quota.
    Forced,
    /// Chosen by the random draw.
    Sampled,
}

impl PromptDecision {
    pub fn is_prompt(self) -> bool {
        !matches!(self, PromptDecision::Skip)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistractionSampler {
    group_size: u64,
    quota: u64,
    /// Counter values at which a prompt was shown, in order.
    history: Vec<u64>,
}

impl DistractionSampler {
    /// # Errors
    /// Returns `InvalidValue` unless `1 <= quota <= group_size`.
    pub fn new(group_size: u64, quota: u64) -> Result<Self, ValidationError> {
        if group_size == 0 {
            return Err(ValidationError::InvalidValue {
                field: "group_size".into(),
                message: "must be at least 1".into(),
            });
        }
        if quota == 0 || quota > group_size {
            return Err(ValidationError::InvalidValue {
                field: "prompts_per_group".into(),
                message: format!("must be between 1 and {group_size}"),
            });
        }
        Ok(Self {
            group_size,
            quota,
            history: Vec::new(),
        })
    }

    pub fn with_history(mut self, history: Vec<u64>) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &[u64] {
        &self.history
    }

    pub fn group_size(&self) -> u64 {
        self.group_size
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    /// Zero-based group of counter value `n` (`n >= 1`).
    pub fn group_of(&self, n: u64) -> u64 {
        (n - 1) / self.group_size
    }

    /// Prompts already recorded in `group`.
    pub fn prompts_in_group(&self, group: u64) -> u64 {
        self.history
            .iter()
            .filter(|&&h| h > 0 && self.group_of(h) == group)
            .count() as u64
    }

    /// Decide whether completed pomodoro `n` should prompt, recording it in
    /// the history when it does. Evaluating the same `n` again never
    /// prompts twice.
    pub fn evaluate<R: Rng + ?Sized>(&mut self, n: u64, rng: &mut R) -> PromptDecision {
        if n == 0 || self.history.contains(&n) {
            return PromptDecision::Skip;
        }
        let group = self.group_of(n);
        let so_far = self.prompts_in_group(group);
        if so_far >= self.quota {
            return PromptDecision::Skip;
        }

        let position = (n - 1) % self.group_size + 1;
        let needed = self.quota - so_far;
        let remaining = self.group_size + 1 - position;

        let decision = if needed >= remaining {
            PromptDecision::Forced
        } else if rng.gen::<f64>() < needed as f64 / remaining as f64 {
            PromptDecision::Sampled
        } else {
            PromptDecision::Skip
        };

        if decision.is_prompt() {
            self.history.push(n);
        }
        debug!(n, group, position, needed, ?decision, "distraction prompt evaluated");
        decision
    }
}

impl Default for DistractionSampler {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            quota: DEFAULT_QUOTA,
            history: Vec::new(),
        }
    }
}
