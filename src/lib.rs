//! Silabario - a word-building literacy game
//!
//! Core modules:
//! - `sim`: Deterministic level engine (tokens, slots, validation, level rules)
//! - `speech`: Background narration queue fed by `speak` events
//! - `platform`: Native services (elapsed-time ticker)
//! - `settings`: Data-driven rules and word banks

pub mod platform;
pub mod settings;
pub mod sim;
pub mod speech;

pub use settings::{Difficulty, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Logical play-field dimensions
    pub const WIDTH: f32 = 1024.0;
    pub const HEIGHT: f32 = 768.0;

    /// Syllable token/slot size
    pub const TOKEN_WIDTH: f32 = 100.0;
    pub const TOKEN_HEIGHT: f32 = 50.0;
    /// Letter token/slot size (anagram level)
    pub const LETTER_SIZE: f32 = 40.0;

    /// Horizontal pitch between syllable slots
    pub const SLOT_PITCH: f32 = 110.0;
    /// Top edge of the syllable slot row
    pub const SLOT_ROW_Y: f32 = 200.0;
    /// Top edge of the first token row
    pub const POOL_ROW_Y: f32 = 350.0;
    /// Left edge of the token pool
    pub const POOL_LEFT_X: f32 = 150.0;

    /// Ticks an error message stays on screen (3 seconds)
    pub const ERROR_DISPLAY_TICKS: u32 = 180;
    /// Ticks between budget exhaustion and forced completion (2 seconds)
    pub const REVEAL_TICKS: u32 = 120;
    /// Points awarded per finished level
    pub const SCORE_PER_LEVEL: u64 = 100;
}

/// Top-left corner that centers a row of `count` cells of `pitch` width
#[inline]
pub fn centered_row_start(count: usize, pitch: f32) -> f32 {
    consts::WIDTH / 2.0 - (count as f32 * pitch) / 2.0
}

/// Grid position for the `index`-th item of a pool laid out in rows
#[inline]
pub fn pool_position(index: usize, per_row: usize, pitch: Vec2) -> Vec2 {
    Vec2::new(
        consts::POOL_LEFT_X + (index % per_row) as f32 * pitch.x,
        consts::POOL_ROW_Y + (index / per_row) as f32 * pitch.y,
    )
}

/// Format seconds as `MM:SS`
pub fn format_mm_ss(total_secs: f64) -> String {
    let secs = total_secs.max(0.0) as u64;
    format!("{:02}:{:02}", (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mm_ss() {
        assert_eq!(format_mm_ss(0.0), "00:00");
        assert_eq!(format_mm_ss(65.7), "01:05");
        assert_eq!(format_mm_ss(-3.0), "00:00");
    }

    #[test]
    fn test_pool_position_wraps_rows() {
        let pitch = Vec2::new(180.0, 80.0);
        assert_eq!(pool_position(0, 4, pitch), Vec2::new(150.0, 350.0));
        assert_eq!(pool_position(5, 4, pitch), Vec2::new(330.0, 430.0));
    }
}
