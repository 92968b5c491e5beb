mod engine;
mod state;
mod ticker;

pub use engine::{TimerEngine, TICK_PERIOD};
pub use state::{
    format_clock, validate_minutes, Phase, TimerKind, TimerState, DEFAULT_BREAK_MIN,
    DEFAULT_FOCUS_MIN, MAX_DURATION_MIN, MIN_DURATION_MIN,
};
pub use ticker::{ManualScheduler, Scheduler, Tick, TickHandle, TickSource, TokioScheduler};
