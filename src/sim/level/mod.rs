//! Level rule variants
//!
//! Every level runs the same phase machine:
//! `Setup -> Active <-> ErrorDisplay -> Active -> Complete`, with
//! `Revealing` as a timed detour into a forced `Complete` when the
//! failure budget runs out. `Complete` is terminal for the instance.

pub mod anagram;
pub mod ordered;
pub mod stage;
pub mod timed;

pub use anagram::AnagramLevel;
pub use ordered::OrderedLevel;
pub use stage::{PointerAction, Stage, Timing};
pub use timed::TimedLevel;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::Board;
use super::events::Notifier;
use super::input::InputEvent;
use super::view::LevelView;
use crate::settings::{CluedWord, Settings};

/// The three rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelKind {
    /// Put the word's syllables back in order
    OrderedAssembly,
    /// Fill each slot with its syllable before the clock runs out
    TimedFill,
    /// Spell short words from a long word's letters
    AnagramSearch,
}

impl LevelKind {
    /// Reference sequence of a session
    pub const SEQUENCE: [LevelKind; 3] = [
        LevelKind::OrderedAssembly,
        LevelKind::TimedFill,
        LevelKind::AnagramSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelKind::OrderedAssembly => "ordered-assembly",
            LevelKind::TimedFill => "timed-fill",
            LevelKind::AnagramSearch => "anagram-search",
        }
    }
}

impl std::fmt::Display for LevelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Tokens and slots being built
    Setup,
    /// Accepting drags
    Active,
    /// Transient error message on screen (input still live)
    ErrorDisplay,
    /// Budget exhausted, answer shown, forced completion pending
    Revealing,
    /// Terminal
    Complete,
}

/// How a level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelOutcome {
    /// Nominal win condition reached
    Solved,
    /// Failure budget exhausted
    Forced,
}

/// Malformed construction input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelError {
    #[error("{0} level has an empty word list")]
    EmptyWordList(LevelKind),
    #[error("{0} level word list contains an empty word")]
    EmptyWord(LevelKind),
    #[error("word group '{0}' has no words to find")]
    EmptyGroup(String),
    #[error("{level} level needs a positive {budget}")]
    ZeroBudget {
        level: LevelKind,
        budget: &'static str,
    },
    #[error("{level} level has a negative or undefined {budget}")]
    InvalidBudget {
        level: LevelKind,
        budget: &'static str,
    },
    #[error("session has no levels")]
    NoLevels,
}

/// Shared level interface
pub trait Level {
    fn kind(&self) -> LevelKind;

    /// Build a fresh round (new word, new tokens and slots)
    fn setup(&mut self, notifier: &mut Notifier);

    /// Advance one simulation tick of `dt` seconds
    fn update(&mut self, dt: f32, notifier: &mut Notifier);

    /// Apply one input event. Returns true once the level is complete.
    fn handle_input(&mut self, event: &InputEvent, notifier: &mut Notifier) -> bool;

    fn is_complete(&self) -> bool;

    fn phase(&self) -> LevelPhase;

    fn outcome(&self) -> Option<LevelOutcome>;

    fn board(&self) -> &Board;

    /// Read-only snapshot for rendering
    fn view(&self) -> LevelView;

    /// Input that moves the level one step toward its solution (demo mode)
    fn autoplay_step(&self) -> Vec<InputEvent>;
}

/// Construct the level for `kind` from `settings`
pub fn build_level(
    kind: LevelKind,
    settings: &Settings,
    seed: u64,
    notifier: &mut Notifier,
) -> Result<Box<dyn Level>, LevelError> {
    let timing = Timing {
        error_ticks: settings.error_display_ticks,
        reveal_ticks: settings.reveal_ticks,
    };
    let rng = Pcg32::seed_from_u64(seed);
    Ok(match kind {
        LevelKind::OrderedAssembly => Box::new(OrderedLevel::new(
            settings.ordered.clone(),
            timing,
            rng,
            notifier,
        )?),
        LevelKind::TimedFill => Box::new(TimedLevel::new(
            settings.timed.clone(),
            timing,
            rng,
            notifier,
        )?),
        LevelKind::AnagramSearch => Box::new(AnagramLevel::new(
            settings.anagram.clone(),
            timing,
            rng,
            notifier,
        )?),
    })
}

fn check_words(kind: LevelKind, words: &[CluedWord]) -> Result<(), LevelError> {
    if words.is_empty() {
        return Err(LevelError::EmptyWordList(kind));
    }
    if words.iter().any(|w| w.word.trim().is_empty()) {
        return Err(LevelError::EmptyWord(kind));
    }
    Ok(())
}

/// Point at which a click dismisses an error without touching anything
pub(crate) fn dismiss_point() -> Vec2 {
    Vec2::new(crate::consts::WIDTH - 1.0, crate::consts::HEIGHT - 1.0)
}

/// Drag the top-most unplaced token showing `text` into the first empty
/// slot accepted by `slot_filter`
pub(crate) fn drag_text_into(
    board: &Board,
    text: &str,
    slot_filter: impl Fn(&super::board::Slot) -> bool,
) -> Vec<InputEvent> {
    let token = board
        .tokens()
        .iter()
        .rev()
        .find(|t| !t.placed && !t.dragging && t.text == text);
    let slot = board
        .slots()
        .iter()
        .find(|s| !s.is_occupied() && slot_filter(s));
    match (token, slot) {
        (Some(token), Some(slot)) => {
            InputEvent::drag(token.rect.center(), slot.rect.center()).to_vec()
        }
        _ => Vec::new(),
    }
}
