//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (countdowns are measured in ticks)
//! - Seeded RNG only
//! - Stable iteration order (tokens and slots keep insertion order)
//! - No rendering or platform dependencies beyond the elapsed-time reader

pub mod board;
pub mod events;
pub mod geom;
pub mod input;
pub mod level;
pub mod session;
pub mod syllables;
pub mod validator;
pub mod view;

pub use board::{Board, DropOutcome, Slot, Token};
pub use events::{EventLog, GameEvent, Notifier, Observer, ObserverError};
pub use geom::Rect;
pub use input::{InputEvent, KeyCommand, PointerButton};
pub use level::{
    AnagramLevel, Level, LevelError, LevelKind, LevelOutcome, LevelPhase, OrderedLevel,
    TimedLevel, build_level,
};
pub use session::{GameSession, LevelResult, SessionPhase};
pub use syllables::segment;
pub use validator::{Rejection, WordValidator, is_feasible};
pub use view::{LevelStatus, LevelView, SessionView, SlotMark, SlotView, TokenView};
