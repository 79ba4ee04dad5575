use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Which interval the timer is counting down.
///
/// Serialized names match the remote API (`pomodoro`, `shortBreak`,
/// `longBreak`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimerMode {
    #[default]
    #[serde(rename = "pomodoro", alias = "work")]
    Work,
    #[serde(rename = "shortBreak")]
    ShortBreak,
    #[serde(rename = "longBreak")]
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Work, TimerMode::ShortBreak, TimerMode::LongBreak];

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "Pomodoro",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    pub fn is_work(self) -> bool {
        self == TimerMode::Work
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pomodoro" | "work" | "focus" => Ok(TimerMode::Work),
            "shortbreak" | "short-break" | "short_break" | "short" => Ok(TimerMode::ShortBreak),
            "longbreak" | "long-break" | "long_break" | "long" => Ok(TimerMode::LongBreak),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("unknown timer mode '{other}'"),
            }),
        }
    }
}

/// Countdown length, in seconds, for each mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDurations {
    pub work_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
}

impl ModeDurations {
    /// Work and short break share `work_secs`.
    pub fn shared(work_secs: u64, long_break_secs: u64) -> Self {
        Self {
            work_secs,
            short_break_secs: work_secs,
            long_break_secs,
        }
    }

    pub fn for_mode(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Work => self.work_secs,
            TimerMode::ShortBreak => self.short_break_secs,
            TimerMode::LongBreak => self.long_break_secs,
        }
    }
}

impl Default for ModeDurations {
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
        }
    }
}
