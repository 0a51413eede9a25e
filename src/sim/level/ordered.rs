//! Ordered assembly: rebuild a word from its shuffled syllables
//!
//! Slots follow the word's syllable order. Decoy fragments are mixed into
//! the pool. Each wrong full fill costs an attempt; running out reveals
//! the word and forces completion.

use glam::Vec2;
use rand::seq::{IndexedRandom, SliceRandom};
use rand_pcg::Pcg32;

use super::stage::{PointerAction, Stage, Timing};
use super::{
    Level, LevelError, LevelKind, LevelOutcome, LevelPhase, check_words, dismiss_point,
    drag_text_into,
};
use crate::consts::*;
use crate::settings::{CluedWord, OrderedRules};
use crate::sim::board::{Board, DropOutcome};
use crate::sim::events::Notifier;
use crate::sim::geom::Rect;
use crate::sim::input::InputEvent;
use crate::sim::syllables::segment;
use crate::sim::view::{LevelStatus, LevelView, board_views};
use crate::{centered_row_start, pool_position};

/// Tokens per pool row
const POOL_COLUMNS: usize = 4;
const POOL_PITCH: Vec2 = Vec2::new(180.0, 80.0);

pub struct OrderedLevel {
    rules: OrderedRules,
    rng: Pcg32,
    stage: Stage,
    target: CluedWord,
    /// Syllables in word order
    syllables: Vec<String>,
    attempts_used: u32,
}

impl OrderedLevel {
    pub fn new(
        rules: OrderedRules,
        timing: Timing,
        rng: Pcg32,
        notifier: &mut Notifier,
    ) -> Result<Self, LevelError> {
        check_words(LevelKind::OrderedAssembly, &rules.words)?;
        if rules.attempts == 0 {
            return Err(LevelError::ZeroBudget {
                level: LevelKind::OrderedAssembly,
                budget: "attempt limit",
            });
        }
        let target = rules.words[0].clone();
        let mut level = Self {
            rules,
            rng,
            stage: Stage::new(timing),
            target,
            syllables: Vec::new(),
            attempts_used: 0,
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

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.rules.attempts.saturating_sub(self.attempts_used)
    }

    fn build_board(&mut self) -> Board {
        let mut board = Board::new();
        let slot_size = Vec2::new(TOKEN_WIDTH, TOKEN_HEIGHT);

        let start_x = centered_row_start(self.syllables.len(), SLOT_PITCH);
        for (i, syllable) in self.syllables.iter().enumerate() {
            let min = Vec2::new(start_x + i as f32 * SLOT_PITCH, SLOT_ROW_Y);
            board.add_slot(Rect::at(min, slot_size), Some(syllable.clone()));
        }

        let mut pool = self.syllables.clone();
        let decoys = self.rules.distractor_count.min(self.rules.distractors.len());
        pool.extend(
            rand::seq::index::sample(&mut self.rng, self.rules.distractors.len(), decoys)
                .into_iter()
                .map(|i| self.rules.distractors[i].clone()),
        );
        pool.shuffle(&mut self.rng);

        for (i, text) in pool.into_iter().enumerate() {
            board.add_token(text, pool_position(i, POOL_COLUMNS, POOL_PITCH), slot_size);
        }
        board
    }

    /// Judge a completely filled row
    fn judge(&mut self, notifier: &mut Notifier) {
        let Some(formed) = self.stage.board.formed_word() else {
            return;
        };

        if formed == self.target.word {
            log::info!("Ordered level solved: {}", formed);
            self.stage.complete(LevelOutcome::Solved);
            notifier.speak(format!("¡Excelente! La palabra es {}", self.target.word));
            return;
        }

        self.attempts_used += 1;
        log::info!(
            "Wrong assembly '{}' ({}/{})",
            formed,
            self.attempts_used,
            self.rules.attempts
        );

        if self.attempts_used >= self.rules.attempts {
            self.stage.begin_reveal(format!(
                "¡Se acabaron los intentos! La palabra era: {}",
                self.target.word
            ));
            notifier.speak(format!(
                "Se acabaron los intentos. La palabra era {}",
                self.target.word
            ));
        } else {
            let remaining = self.attempts_remaining();
            self.stage.board.clear_all();
            self.stage.show_error(format!(
                "¡Palabra incorrecta! Intentos restantes: {remaining}"
            ));
            notifier.speak(format!("Palabra incorrecta. Te quedan {remaining} intentos"));
        }
    }
}

impl Level for OrderedLevel {
    fn kind(&self) -> LevelKind {
        LevelKind::OrderedAssembly
    }

    fn setup(&mut self, notifier: &mut Notifier) {
        if self.is_complete() {
            log::warn!("Ordered level already complete; setup ignored");
            return;
        }
        if let Some(word) = self.rules.words.choose(&mut self.rng) {
            self.target = word.clone();
        }
        self.syllables = segment(&self.target.word);
        self.attempts_used = 0;
        let board = self.build_board();
        self.stage.reset(board);

        log::info!(
            "Ordered level: '{}' -> {:?}",
            self.target.word,
            self.syllables
        );
        notifier.speak(format!(
            "Nivel 1: Ordena las sílabas para formar {}. La palabra tiene {} sílabas. \
             Tienes {} intentos para completarla.",
            self.target.category,
            self.syllables.len(),
            self.rules.attempts
        ));
    }

    fn update(&mut self, _dt: f32, _notifier: &mut Notifier) {
        if self.stage.tick() {
            log::info!("Ordered level force-completed");
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
            title: "Nivel 1: Ordena las sílabas".to_string(),
            hints: vec![
                format!("Pista: La palabra es un o una {}", self.target.category),
                format!(
                    "Tiene {} letras y {} sílabas",
                    self.target.word.chars().count(),
                    self.syllables.len()
                ),
            ],
            tokens,
            slots,
            status: LevelStatus::Attempts {
                remaining: self.attempts_remaining(),
                limit: self.rules.attempts,
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
