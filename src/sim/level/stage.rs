//! Phase bookkeeping shared by every level variant
//!
//! Owns the board, the transient message and its tick countdown, and the
//! one-way transition into `Complete`. Countdowns are measured in update
//! ticks so nothing ever blocks the frame loop.

use crate::sim::board::{Board, DropOutcome};
use crate::sim::events::Notifier;
use crate::sim::input::{InputEvent, PointerButton};

use super::{LevelOutcome, LevelPhase};

/// Tick budgets for transient states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Ticks an error message stays up
    pub error_ticks: u32,
    /// Ticks between budget exhaustion and forced completion
    pub reveal_ticks: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            error_ticks: crate::consts::ERROR_DISPLAY_TICKS,
            reveal_ticks: crate::consts::REVEAL_TICKS,
        }
    }
}

/// What a pointer event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerAction {
    Ignored,
    /// Pointer-down swallowed to close the error message
    Dismissed,
    PickedUp(u32),
    Moved,
    Dropped(DropOutcome),
}

#[derive(Debug, Clone)]
pub struct Stage {
    pub board: Board,
    phase: LevelPhase,
    message: Option<String>,
    timer: u32,
    outcome: Option<LevelOutcome>,
    timing: Timing,
}

impl Stage {
    pub fn new(timing: Timing) -> Self {
        Self {
            board: Board::new(),
            phase: LevelPhase::Setup,
            message: None,
            timer: 0,
            outcome: None,
            timing,
        }
    }

    /// Start a fresh round on a new board
    pub fn reset(&mut self, board: Board) {
        self.board = board;
        self.phase = LevelPhase::Active;
        self.message = None;
        self.timer = 0;
        self.outcome = None;
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<LevelOutcome> {
        self.outcome
    }

    pub fn is_complete(&self) -> bool {
        self.phase == LevelPhase::Complete
    }

    /// Message currently on screen
    pub fn message(&self) -> Option<&str> {
        match self.phase {
            LevelPhase::ErrorDisplay | LevelPhase::Revealing => self.message.as_deref(),
            LevelPhase::Complete if self.outcome == Some(LevelOutcome::Forced) => {
                self.message.as_deref()
            }
            _ => None,
        }
    }

    /// Show a transient error message; input stays live
    pub fn show_error(&mut self, message: impl Into<String>) {
        if self.is_complete() {
            return;
        }
        self.message = Some(message.into());
        self.timer = self.timing.error_ticks;
        self.phase = if self.timer > 0 {
            LevelPhase::ErrorDisplay
        } else {
            LevelPhase::Active
        };
    }

    /// Budget exhausted: show `message`, then complete as forced
    pub fn begin_reveal(&mut self, message: impl Into<String>) {
        if self.is_complete() {
            return;
        }
        self.message = Some(message.into());
        self.timer = self.timing.reveal_ticks;
        self.phase = LevelPhase::Revealing;
        if self.timer == 0 {
            self.complete(LevelOutcome::Forced);
        }
    }

    /// Enter `Complete`. Only the first call has any effect.
    pub fn complete(&mut self, outcome: LevelOutcome) {
        if self.is_complete() {
            return;
        }
        self.phase = LevelPhase::Complete;
        self.outcome = Some(outcome);
        self.timer = 0;
    }

    /// Advance countdowns by one tick. Returns true if this tick completed the level.
    pub fn tick(&mut self) -> bool {
        match self.phase {
            LevelPhase::ErrorDisplay => {
                self.timer = self.timer.saturating_sub(1);
                if self.timer == 0 {
                    self.phase = LevelPhase::Active;
                }
                false
            }
            LevelPhase::Revealing => {
                self.timer = self.timer.saturating_sub(1);
                if self.timer == 0 {
                    self.complete(LevelOutcome::Forced);
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    fn dismiss(&mut self) {
        self.timer = 0;
        self.phase = LevelPhase::Active;
    }

    /// Apply a pointer event to the board. Placing a token speaks its text.
    pub fn route_pointer(&mut self, event: &InputEvent, notifier: &mut Notifier) -> PointerAction {
        if !matches!(self.phase, LevelPhase::Active | LevelPhase::ErrorDisplay) {
            return PointerAction::Ignored;
        }
        match *event {
            InputEvent::PointerDown {
                pos,
                button: PointerButton::Primary,
            } => {
                if self.phase == LevelPhase::ErrorDisplay {
                    self.dismiss();
                    return PointerAction::Dismissed;
                }
                self.board
                    .pointer_down(pos)
                    .map(PointerAction::PickedUp)
                    .unwrap_or(PointerAction::Ignored)
            }
            InputEvent::PointerMove { pos } => {
                self.board.pointer_move(pos);
                PointerAction::Moved
            }
            InputEvent::PointerUp {
                pos,
                button: PointerButton::Primary,
            } => {
                let outcome = self.board.pointer_up(pos);
                if let DropOutcome::Placed { text, .. } = &outcome {
                    notifier.speak(text.clone());
                }
                PointerAction::Dropped(outcome)
            }
            _ => PointerAction::Ignored,
        }
    }
}
