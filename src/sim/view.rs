//! Read-only snapshots handed to the rendering layer
//!
//! The simulation never draws; a renderer (or the headless binary)
//! consumes these values each frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::level::{LevelKind, LevelOutcome, LevelPhase};
use super::session::{LevelResult, SessionPhase};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenView {
    pub id: u32,
    pub text: String,
    pub center: Vec2,
    pub size: Vec2,
    pub placed: bool,
    pub dragging: bool,
}

/// How a slot should be colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotMark {
    Empty,
    /// Occupant matches the expected text
    Correct,
    /// Occupant differs from the expected text
    Wrong,
    /// Occupied free-form slot
    Filled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: u32,
    pub center: Vec2,
    pub size: Vec2,
    pub occupant: Option<String>,
    pub mark: SlotMark,
}

/// Variant-specific HUD values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LevelStatus {
    Attempts {
        remaining: u32,
        limit: u32,
    },
    Countdown {
        remaining_secs: f32,
        errors: u32,
        /// Word pattern with one underscore per letter, grouped by syllable
        pattern: String,
    },
    Search {
        current: String,
        found: Vec<String>,
        required: usize,
        errors: u32,
        max_errors: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelView {
    pub kind: LevelKind,
    pub phase: LevelPhase,
    pub title: String,
    pub hints: Vec<String>,
    /// Render order (last on top); the dragged token is last
    pub tokens: Vec<TokenView>,
    pub slots: Vec<SlotView>,
    pub status: LevelStatus,
    pub message: Option<String>,
    pub completed: bool,
    pub outcome: Option<LevelOutcome>,
}

/// Whole-session snapshot: HUD values plus the active level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub level_index: usize,
    pub level_count: usize,
    pub score: u64,
    pub elapsed_secs: f64,
    /// `MM:SS`
    pub elapsed_label: String,
    /// None at the summary
    pub level: Option<LevelView>,
    pub results: Vec<LevelResult>,
}

/// Token and slot snapshots for a board
pub fn board_views(board: &Board) -> (Vec<TokenView>, Vec<SlotView>) {
    let tokens = board
        .tokens()
        .iter()
        .map(|t| TokenView {
            id: t.id,
            text: t.text.clone(),
            center: t.rect.center(),
            size: t.rect.size,
            placed: t.placed,
            dragging: t.dragging,
        })
        .collect();

    let slots = board
        .slots()
        .iter()
        .map(|s| {
            let occupant = board.occupant_text(s).map(str::to_string);
            let mark = match (&occupant, &s.expected) {
                (None, _) => SlotMark::Empty,
                (Some(_), None) => SlotMark::Filled,
                (Some(text), Some(expected)) if text == expected => SlotMark::Correct,
                (Some(_), Some(_)) => SlotMark::Wrong,
            };
            SlotView {
                id: s.id,
                center: s.rect.center(),
                size: s.rect.size,
                occupant,
                mark,
            }
        })
        .collect();

    (tokens, slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geom::Rect;

    #[test]
    fn test_slot_marks() {
        let mut board = Board::new();
        board.add_slot(Rect::new(0.0, 0.0, 100.0, 50.0), Some("pa".into()));
        board.add_slot(Rect::new(110.0, 0.0, 100.0, 50.0), Some("to".into()));
        board.add_slot(Rect::new(220.0, 0.0, 100.0, 50.0), None);
        board.add_token("pa", Vec2::new(0.0, 100.0), Vec2::new(100.0, 50.0));
        board.add_token("pa", Vec2::new(110.0, 100.0), Vec2::new(100.0, 50.0));
        board.add_token("x", Vec2::new(220.0, 100.0), Vec2::new(100.0, 50.0));
        for (from, to) in [(50.0, 50.0), (160.0, 160.0), (270.0, 270.0)] {
            board.pointer_down(Vec2::new(from, 125.0));
            board.pointer_up(Vec2::new(to, 25.0));
        }
        let (tokens, slots) = board_views(&board);
        assert!(tokens.iter().all(|t| t.placed));
        let marks: Vec<_> = slots.iter().map(|s| s.mark).collect();
        assert_eq!(marks, [SlotMark::Correct, SlotMark::Wrong, SlotMark::Filled]);
    }
}
