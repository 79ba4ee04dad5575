mod engine;
mod mode;
mod session;
mod ticker;

pub use engine::{CompletionHandler, PomodoroTimer, WorkCompletion};
pub use mode::{ModeDurations, TimerMode};
pub use session::ActiveSession;
pub use ticker::{Ticker, TICK_PERIOD};
