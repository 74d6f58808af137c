//! Play session engine: deck choice, timed image reveal, questions, scoring.

mod engine;
pub mod scheduler;
mod score;
mod view;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use engine::{AnswerOutcome, LoadRequest, Notice, Phase, PlayEngine};
pub use scheduler::{Scheduler, Timer, TimerHandle, TimerKind, TokioScheduler};
pub use score::{RoundSummary, Scorecard};
pub use view::{OptionFeedback, PlayView};

/// Timing and scoring knobs for a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    /// Countdown units the image stays on screen.
    pub image_seconds: u32,
    /// Length of one countdown unit.
    pub tick_millis: u64,
    /// Pause between an answer and the next question.
    pub advance_delay_millis: u64,
    /// Points for a correct answer.
    pub correct_award: u32,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            image_seconds: 15,
            tick_millis: 1000,
            advance_delay_millis: 1500,
            correct_award: 10,
        }
    }
}

impl PlayConfig {
    /// One countdown unit.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// Delay before moving on after an answer.
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_millis)
    }
}
