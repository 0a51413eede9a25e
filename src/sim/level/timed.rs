//! Timed fill: drop each syllable on its own slot before time runs out
//!
//! Remaining time is `max(0, limit - elapsed - penalty * errors)`. A wrong
//! full fill costs one penalty and sends back only the mismatched
//! syllables. When the clock hits zero the level regenerates with a new
//! word instead of failing.

use glam::Vec2;
use rand::seq::{IndexedRandom, SliceRandom};
use rand_pcg::Pcg32;

use super::stage::{PointerAction, Stage, Timing};
use super::{
    Level, LevelError, LevelKind, LevelOutcome, LevelPhase, check_words, dismiss_point,
    drag_text_into,
};
use crate::consts::*;
use crate::settings::{CluedWord, TimedRules};
use crate::sim::board::{Board, DropOutcome};
use crate::sim::events::Notifier;
use crate::sim::geom::Rect;
use crate::sim::input::InputEvent;
use crate::sim::syllables::segment;
use crate::sim::view::{LevelStatus, LevelView, board_views};
use crate::{centered_row_start, pool_position};

const POOL_COLUMNS: usize = 5;
const POOL_PITCH: Vec2 = Vec2::new(150.0, 80.0);

pub struct TimedLevel {
    rules: TimedRules,
    rng: Pcg32,
    stage: Stage,
    target: CluedWord,
    syllables: Vec<String>,
    /// Seconds since this round started
    elapsed: f32,
    errors: u32,
    /// Rounds thrown away because time ran out
    regenerations: u32,
    /// Clock frozen at the moment of completion
    finished_with: Option<f32>,
}

impl TimedLevel {
    pub fn new(
        rules: TimedRules,
        timing: Timing,
        rng: Pcg32,
        notifier: &mut Notifier,
    ) -> Result<Self, LevelError> {
        check_words(LevelKind::TimedFill, &rules.words)?;
        if rules.time_limit.is_nan() || rules.time_limit <= 0.0 {
            return Err(LevelError::ZeroBudget {
                level: LevelKind::TimedFill,
                budget: "time limit",
            });
        }
        if rules.time_penalty.is_nan() || rules.time_penalty < 0.0 {
            return Err(LevelError::InvalidBudget {
                level: LevelKind::TimedFill,
                budget: "time penalty",
            });
        }
        let target = rules.words[0].clone();
        let mut level = Self {
            rules,
            rng,
            stage: Stage::new(timing),
            target,
            syllables: Vec::new(),
            elapsed: 0.0,
            errors: 0,
            regenerations: 0,
            finished_with: None,
        };
        level.setup(notifier);
        Ok(level)
    }

    pub fn word(&self) -> &str {
        &self.target.word
    }

    pub fn syllables(&self) -> &[String] {
        &self.syllables
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn regenerations(&self) -> u32 {
        self.regenerations
    }

    /// Seconds left on the clock (never negative, frozen once complete)
    pub fn remaining_time(&self) -> f32 {
        if let Some(frozen) = self.finished_with {
            return frozen;
        }
        let penalty = self.rules.time_penalty * self.errors as f32;
        (self.rules.time_limit - self.elapsed - penalty).max(0.0)
    }

    fn build_board(&mut self) -> Board {
        let mut board = Board::new();
        let size = Vec2::new(TOKEN_WIDTH, TOKEN_HEIGHT);

        let start_x = centered_row_start(self.syllables.len(), SLOT_PITCH);
        for (i, syllable) in self.syllables.iter().enumerate() {
            let min = Vec2::new(start_x + i as f32 * SLOT_PITCH, SLOT_ROW_Y);
            board.add_slot(Rect::at(min, size), Some(syllable.clone()));
        }

        let mut pool = self.syllables.clone();
        pool.extend(self.rules.fillers.iter().cloned());
        pool.shuffle(&mut self.rng);
        for (i, text) in pool.into_iter().enumerate() {
            board.add_token(text, pool_position(i, POOL_COLUMNS, POOL_PITCH), size);
        }
        board
    }

    fn judge(&mut self, notifier: &mut Notifier) {
        if self.stage.board.all_slots_match() {
            let remaining = self.remaining_time();
            self.finished_with = Some(remaining);
            log::info!(
                "Timed level solved: {} with {:.1}s left",
                self.target.word,
                remaining
            );
            self.stage.complete(LevelOutcome::Solved);
            notifier.speak(format!("¡Correcto! La palabra es {}", self.target.word));
            return;
        }
        if !self.stage.board.is_filled() {
            return;
        }

        self.errors += 1;
        let sent_back = self
            .stage
            .board
            .clear_where(|slot, text| slot.expected.as_deref() != Some(text));
        log::info!(
            "Wrong fill #{} ({} syllables sent back), {:.1}s left",
            self.errors,
            sent_back,
            self.remaining_time()
        );
        let penalty = self.rules.time_penalty;
        self.stage
            .show_error(format!("¡Palabra incorrecta! Pierdes {penalty:.0} segundos"));
        notifier.speak(format!(
            "Palabra incorrecta. Pierdes {penalty:.0} segundos. Intenta de nuevo."
        ));
    }

    /// Underscore pattern, one group per syllable
    fn pattern(&self) -> String {
        self.syllables
            .iter()
            .map(|s| "_".repeat(s.chars().count()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Level for TimedLevel {
    fn kind(&self) -> LevelKind {
        LevelKind::TimedFill
    }

    fn setup(&mut self, notifier: &mut Notifier) {
        if self.is_complete() {
            log::warn!("Timed level already complete; setup ignored");
            return;
        }
        if let Some(word) = self.rules.words.choose(&mut self.rng) {
            self.target = word.clone();
        }
        self.syllables = segment(&self.target.word);
        self.elapsed = 0.0;
        self.errors = 0;
        self.finished_with = None;
        let board = self.build_board();
        self.stage.reset(board);

        log::info!("Timed level: '{}' -> {:?}", self.target.word, self.syllables);
        notifier.speak(format!(
            "Nivel 2: Completa la palabra con sílabas. Es un o una {}. \
             La palabra tiene {} letras. Arrastra las sílabas correctas a los espacios.",
            self.target.category,
            self.target.word.chars().count()
        ));
    }

    fn update(&mut self, dt: f32, notifier: &mut Notifier) {
        self.stage.tick();
        if self.is_complete() {
            return;
        }
        self.elapsed += dt;
        if self.remaining_time() <= 0.0 {
            self.regenerations += 1;
            log::info!(
                "Time up on '{}', regenerating (#{})",
                self.target.word,
                self.regenerations
            );
            notifier.speak("Tiempo agotado. Inténtalo de nuevo.");
            self.setup(notifier);
        }
    }

    fn handle_input(&mut self, event: &InputEvent, notifier: &mut Notifier) -> bool {
        if let PointerAction::Dropped(DropOutcome::Placed { .. }) =
            self.stage.route_pointer(event, notifier)
        {
            if self.stage.board.is_filled() {
                self.judge(notifier);
            }
        }
        self.is_complete()
    }

    fn is_complete(&self) -> bool {
        self.stage.is_complete()
    }

    fn phase(&self) -> LevelPhase {
        self.stage.phase()
    }

    fn outcome(&self) -> Option<LevelOutcome> {
        self.stage.outcome()
    }

    fn board(&self) -> &Board {
        &self.stage.board
    }

    fn view(&self) -> LevelView {
        let (tokens, slots) = board_views(&self.stage.board);
        LevelView {
            kind: self.kind(),
            phase: self.phase(),
            title: "Nivel 2: Completa la palabra".to_string(),
            hints: vec![format!("Pista: Es un o una {}", self.target.category)],
            tokens,
            slots,
            status: LevelStatus::Countdown {
                remaining_secs: self.remaining_time(),
                errors: self.errors,
                pattern: self.pattern(),
            },
            message: self.stage.message().map(str::to_string),
            completed: self.is_complete(),
            outcome: self.outcome(),
        }
    }

    fn autoplay_step(&self) -> Vec<InputEvent> {
        match self.phase() {
            LevelPhase::ErrorDisplay => InputEvent::click(dismiss_point()).to_vec(),
            LevelPhase::Active => {
                let board = &self.stage.board;
                let Some(next) = board
                    .slots()
                    .iter()
                    .find(|s| !s.is_occupied())
                    .and_then(|s| s.expected.clone())
                else {
                    return Vec::new();
                };
                drag_text_into(board, &next, |s| s.expected.as_deref() == Some(next.as_str()))
            }
            _ => Vec::new(),
        }
    }
}
