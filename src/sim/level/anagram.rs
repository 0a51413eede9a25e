//! Anagram search: spell short words with the letters of a long one
//!
//! Letters drop into free-form slots. Nothing is judged until the player
//! presses "verify"; "clear" empties the slots at no cost. The level ends
//! when the quota of found words is met, or is forced to end once the
//! error budget is spent.

use glam::Vec2;
use rand::seq::{IndexedRandom, SliceRandom};
use rand_pcg::Pcg32;

use super::stage::{Stage, Timing};
use super::{Level, LevelError, LevelKind, LevelOutcome, LevelPhase, dismiss_point, drag_text_into};
use crate::consts::*;
use crate::settings::{AnagramRules, WordGroup};
use crate::sim::board::Board;
use crate::sim::events::Notifier;
use crate::sim::geom::Rect;
use crate::sim::input::{InputEvent, PointerButton};
use crate::sim::validator::{Rejection, WordValidator};
use crate::sim::view::{LevelStatus, LevelView, board_views};
use crate::pool_position;

/// "Verificar" button
pub const VERIFY_BUTTON: Rect = Rect {
    min: Vec2::new(300.0, 300.0),
    size: Vec2::new(120.0, 50.0),
};
/// "Borrar" button
pub const CLEAR_BUTTON: Rect = Rect {
    min: Vec2::new(450.0, 300.0),
    size: Vec2::new(120.0, 50.0),
};

const SLOT_PITCH_X: f32 = 50.0;
const SLOT_ROW_Y: f32 = 250.0;
const POOL_COLUMNS: usize = 8;
const POOL_PITCH: Vec2 = Vec2::new(80.0, 60.0);

/// What pressing verify did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Candidate too short to judge; nothing happened
    Skipped,
    Accepted(String),
    Rejected(Rejection),
}

pub struct AnagramLevel {
    rules: AnagramRules,
    rng: Pcg32,
    stage: Stage,
    group: WordGroup,
    validator: WordValidator,
    found: Vec<String>,
    errors: u32,
}

impl AnagramLevel {
    pub fn new(
        rules: AnagramRules,
        timing: Timing,
        rng: Pcg32,
        notifier: &mut Notifier,
    ) -> Result<Self, LevelError> {
        let Some(first) = rules.groups.first() else {
            return Err(LevelError::EmptyWordList(LevelKind::AnagramSearch));
        };
        if let Some(group) = rules.groups.iter().find(|g| g.base.trim().is_empty()) {
            return Err(LevelError::EmptyGroup(group.base.clone()));
        }
        if let Some(group) = rules.groups.iter().find(|g| g.words.is_empty()) {
            return Err(LevelError::EmptyGroup(group.base.clone()));
        }
        if rules.required_words == 0 {
            return Err(LevelError::ZeroBudget {
                level: LevelKind::AnagramSearch,
                budget: "word quota",
            });
        }
        if rules.max_errors == 0 {
            return Err(LevelError::ZeroBudget {
                level: LevelKind::AnagramSearch,
                budget: "error limit",
            });
        }
        let group = first.clone();
        let validator = WordValidator::new(&group.base, &group.words);
        let mut level = Self {
            rules,
            rng,
            stage: Stage::new(timing),
            group,
            validator,
            found: Vec::new(),
            errors: 0,
        };
        level.setup(notifier);
        Ok(level)
    }

    pub fn base_word(&self) -> &str {
        &self.group.base
    }

    pub fn found_words(&self) -> &[String] {
        &self.found
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Word currently spelled by the occupied slots
    pub fn current_word(&self) -> String {
        self.stage.board.occupied_text()
    }

    /// Judge `candidate` without side effects
    pub fn check_candidate(&self, candidate: &str) -> Result<String, Rejection> {
        self.validator.validate(candidate, &self.found)
    }

    /// Judge the spelled word; success records it, failure costs an error.
    /// Slots are emptied either way.
    pub fn verify(&mut self, notifier: &mut Notifier) -> Verdict {
        if !matches!(self.phase(), LevelPhase::Active | LevelPhase::ErrorDisplay) {
            return Verdict::Skipped;
        }
        let candidate = self.current_word();
        if candidate.chars().count() < self.rules.min_candidate_len {
            return Verdict::Skipped;
        }

        match self.check_candidate(&candidate) {
            Ok(word) => {
                log::info!("Found '{}' in {}", word, self.group.base);
                self.found.push(word.clone());
                notifier.speak(format!("¡Correcto! Palabra: {word}"));
                self.stage.board.clear_all();
                if self.found.len() >= self.rules.required_words {
                    self.stage.complete(LevelOutcome::Solved);
                    notifier.speak(format!(
                        "¡Nivel completado! Has encontrado {} palabras",
                        self.found.len()
                    ));
                }
                Verdict::Accepted(word)
            }
            Err(rejection) => {
                self.errors += 1;
                log::info!("Rejected candidate: {} ({} errors)", rejection, self.errors);
                notifier.speak("Palabra no válida. Intenta otra combinación");
                self.stage.board.clear_all();
                if self.errors >= self.rules.max_errors {
                    let found = self.found.len();
                    let required = self.rules.required_words;
                    self.stage.begin_reveal(format!(
                        "¡Demasiados errores! Encontradas: {found}/{required}"
                    ));
                    notifier.speak(format!(
                        "Demasiados errores. Encontradas {found} palabras de {required}"
                    ));
                } else {
                    self.stage.show_error("Palabra no válida o ya encontrada");
                }
                Verdict::Rejected(rejection)
            }
        }
    }

    /// Empty every slot at no cost
    pub fn clear(&mut self) {
        self.stage.board.clear_all();
    }

    fn build_board(&mut self) -> Board {
        let mut board = Board::new();
        let size = Vec2::splat(LETTER_SIZE);
        let letters: Vec<String> = self.group.base.chars().map(String::from).collect();

        let start_x = WIDTH / 2.0 - 200.0;
        for i in 0..letters.len() {
            let min = Vec2::new(start_x + i as f32 * SLOT_PITCH_X, SLOT_ROW_Y);
            board.add_slot(Rect::at(min, size), None);
        }

        let mut pool = letters;
        pool.shuffle(&mut self.rng);
        for (i, letter) in pool.into_iter().enumerate() {
            board.add_token(letter, pool_position(i, POOL_COLUMNS, POOL_PITCH), size);
        }
        board
    }

    /// First whitelisted word not yet found that can be spelled
    fn next_target(&self) -> Option<&String> {
        self.validator.whitelist().iter().find(|w| {
            w.chars().count() >= self.rules.min_candidate_len
                && w.chars().count() <= self.stage.board.slots().len()
                && self.check_candidate(w).is_ok()
        })
    }
}

impl Level for AnagramLevel {
    fn kind(&self) -> LevelKind {
        LevelKind::AnagramSearch
    }

    fn setup(&mut self, notifier: &mut Notifier) {
        if self.is_complete() {
            log::warn!("Anagram level already complete; setup ignored");
            return;
        }
        if let Some(group) = self.rules.groups.choose(&mut self.rng) {
            self.group = group.clone();
        }
        self.validator = WordValidator::new(&self.group.base, &self.group.words);
        self.found.clear();
        self.errors = 0;
        let board = self.build_board();
        self.stage.reset(board);

        log::info!("Anagram level: '{}'", self.group.base);
        notifier.speak(format!(
            "Nivel 3: Forma {} palabras con letras de {}. Máximo {} errores permitidos.",
            self.rules.required_words, self.group.base, self.rules.max_errors
        ));
    }

    fn update(&mut self, _dt: f32, _notifier: &mut Notifier) {
        if self.stage.tick() {
            log::info!(
                "Anagram level force-completed with {}/{} words",
                self.found.len(),
                self.rules.required_words
            );
        }
    }

    fn handle_input(&mut self, event: &InputEvent, notifier: &mut Notifier) -> bool {
        if let InputEvent::PointerDown {
            pos,
            button: PointerButton::Primary,
        } = *event
        {
            let idle = self.phase() == LevelPhase::Active && self.stage.board.dragging().is_none();
            if idle && VERIFY_BUTTON.contains_point(pos) {
                self.verify(notifier);
                return self.is_complete();
            }
            if idle && CLEAR_BUTTON.contains_point(pos) {
                self.clear();
                return self.is_complete();
            }
        }
        self.stage.route_pointer(event, notifier);
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
            title: "Nivel 3: Forma palabras cortas".to_string(),
            hints: vec![
                format!("Palabra base: {}", self.group.base.to_uppercase()),
                format!(
                    "Encuentra {} palabras usando estas letras",
                    self.rules.required_words
                ),
            ],
            tokens,
            slots,
            status: LevelStatus::Search {
                current: self.current_word(),
                found: self.found.clone(),
                required: self.rules.required_words,
                errors: self.errors,
                max_errors: self.rules.max_errors,
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
                let Some(target) = self.next_target() else {
                    return Vec::new();
                };
                let current = self.current_word();
                if current == *target {
                    return InputEvent::click(VERIFY_BUTTON.center()).to_vec();
                }
                if !target.starts_with(current.as_str()) {
                    return InputEvent::click(CLEAR_BUTTON.center()).to_vec();
                }
                match target.chars().nth(current.chars().count()) {
                    Some(letter) => drag_text_into(&self.stage.board, &letter.to_string(), |_| true),
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::EventLog;
    use crate::sim::level::test_support::{autoplay, dismiss, place};
    use rand::SeedableRng;

    fn mariposa(max_errors: u32, notifier: &mut Notifier) -> AnagramLevel {
        let rules = AnagramRules {
            groups: vec![WordGroup::new(
                "mariposa",
                &["mar", "piso", "rosa", "sopa", "ramo", "pasa"],
            )],
            max_errors,
            ..AnagramRules::default()
        };
        let timing = Timing {
            error_ticks: 30,
            reveal_ticks: 4,
        };
        AnagramLevel::new(rules, timing, Pcg32::seed_from_u64(3), notifier).unwrap()
    }

    fn spell(level: &mut AnagramLevel, word: &str, notifier: &mut Notifier) {
        for (slot, letter) in word.chars().enumerate() {
            place(level, &letter.to_string(), slot, notifier);
        }
        assert_eq!(level.current_word(), word);
    }

    fn press(level: &mut AnagramLevel, button: Rect, notifier: &mut Notifier) -> bool {
        let mut done = false;
        for event in InputEvent::click(button.center()) {
            done = level.handle_input(&event, notifier);
        }
        done
    }

    #[test]
    fn test_setup_one_slot_and_token_per_letter() {
        let mut notifier = Notifier::new();
        let level = mariposa(5, &mut notifier);
        assert_eq!(level.board().slots().len(), 8);
        assert_eq!(level.board().tokens().len(), 8);
        assert!(level.board().slots().iter().all(|s| s.expected.is_none()));
    }

    #[test]
    fn test_three_words_complete_the_level() {
        let log = EventLog::new();
        let mut notifier = Notifier::new();
        notifier.subscribe(Box::new(log.clone()));
        let mut level = mariposa(5, &mut notifier);

        for word in ["mar", "rosa"] {
            spell(&mut level, word, &mut notifier);
            assert!(!press(&mut level, VERIFY_BUTTON, &mut notifier));
            assert_eq!(level.current_word(), "");
        }
        spell(&mut level, "sopa", &mut notifier);
        assert!(press(&mut level, VERIFY_BUTTON, &mut notifier));

        assert_eq!(level.found_words(), ["mar", "rosa", "sopa"]);
        assert_eq!(level.outcome(), Some(LevelOutcome::Solved));
        assert_eq!(level.errors(), 0);
        assert_eq!(
            level.check_candidate("mar"),
            Err(Rejection::AlreadyFound("mar".into()))
        );
        assert!(log.spoken().iter().any(|s| s.starts_with("¡Nivel completado!")));
    }

    #[test]
    fn test_duplicate_counts_as_error() {
        let mut notifier = Notifier::new();
        let mut level = mariposa(5, &mut notifier);
        spell(&mut level, "mar", &mut notifier);
        assert_eq!(level.verify(&mut notifier), Verdict::Accepted("mar".into()));
        spell(&mut level, "mar", &mut notifier);
        assert_eq!(
            level.verify(&mut notifier),
            Verdict::Rejected(Rejection::AlreadyFound("mar".into()))
        );
        assert_eq!(level.errors(), 1);
        assert_eq!(level.phase(), LevelPhase::ErrorDisplay);
        assert_eq!(level.current_word(), "");
    }

    #[test]
    fn test_clear_button_is_free() {
        let mut notifier = Notifier::new();
        let mut level = mariposa(5, &mut notifier);
        spell(&mut level, "ri", &mut notifier);
        press(&mut level, CLEAR_BUTTON, &mut notifier);
        assert_eq!(level.current_word(), "");
        assert_eq!(level.errors(), 0);
        assert!(level.board().tokens().iter().all(|t| !t.placed));
    }

    #[test]
    fn test_short_candidate_is_skipped() {
        let mut notifier = Notifier::new();
        let mut level = mariposa(5, &mut notifier);
        spell(&mut level, "m", &mut notifier);
        assert_eq!(level.verify(&mut notifier), Verdict::Skipped);
        assert_eq!(level.errors(), 0);
        assert_eq!(level.current_word(), "m");
    }

    #[test]
    fn test_error_budget_forces_completion() {
        let mut notifier = Notifier::new();
        let mut level = mariposa(2, &mut notifier);
        spell(&mut level, "mar", &mut notifier);
        press(&mut level, VERIFY_BUTTON, &mut notifier);

        spell(&mut level, "pa", &mut notifier);
        press(&mut level, VERIFY_BUTTON, &mut notifier);
        dismiss(&mut level, &mut notifier);
        spell(&mut level, "po", &mut notifier);
        assert!(!press(&mut level, VERIFY_BUTTON, &mut notifier));
        assert_eq!(level.phase(), LevelPhase::Revealing);
        assert_eq!(
            level.view().message.as_deref(),
            Some("¡Demasiados errores! Encontradas: 1/3")
        );

        for _ in 0..4 {
            level.update(SIM_DT, &mut notifier);
        }
        assert!(level.is_complete());
        assert_eq!(level.outcome(), Some(LevelOutcome::Forced));
        assert_eq!(level.found_words(), ["mar"]);
    }

    #[test]
    fn test_verify_click_during_error_only_dismisses() {
        let mut notifier = Notifier::new();
        let mut level = mariposa(5, &mut notifier);
        spell(&mut level, "pa", &mut notifier);
        press(&mut level, VERIFY_BUTTON, &mut notifier);
        assert_eq!(level.phase(), LevelPhase::ErrorDisplay);
        press(&mut level, VERIFY_BUTTON, &mut notifier);
        assert_eq!(level.phase(), LevelPhase::Active);
        assert_eq!(level.errors(), 1);
    }

    #[test]
    fn test_autoplay_finds_quota() {
        let mut notifier = Notifier::new();
        let mut level = mariposa(5, &mut notifier);
        assert!(autoplay(&mut level, &mut notifier, 100));
        assert_eq!(level.found_words().len(), 3);
        assert_eq!(level.outcome(), Some(LevelOutcome::Solved));
    }

    #[test]
    fn test_group_without_words_rejected() {
        let mut notifier = Notifier::new();
        let rules = AnagramRules {
            groups: vec![WordGroup::new("sol", &[])],
            ..AnagramRules::default()
        };
        let result = AnagramLevel::new(rules, Timing::default(), Pcg32::seed_from_u64(1), &mut notifier);
        assert!(matches!(result, Err(LevelError::EmptyGroup(base)) if base == "sol"));
    }

    #[test]
    fn test_setup_after_forced_completion_keeps_level_complete() {
        let mut notifier = Notifier::new();
        let mut level = mariposa(1, &mut notifier);
        spell(&mut level, "pa", &mut notifier);
        press(&mut level, VERIFY_BUTTON, &mut notifier);
        for _ in 0..4 {
            level.update(SIM_DT, &mut notifier);
        }
        assert_eq!(level.outcome(), Some(LevelOutcome::Forced));

        level.setup(&mut notifier);
        assert!(level.is_complete());
        assert_eq!(level.outcome(), Some(LevelOutcome::Forced));
        assert_eq!(level.errors(), 1);
    }
}
