//! Game session: the level sequence, score and summary screen
//!
//! A session plays each level kind in order, building a fresh instance
//! when the previous one completes. Every completion (solved or forced)
//! earns the same score increment. After the last level the session
//! sits on a summary until the player restarts or quits.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{GameEvent, Notifier};
use super::input::{InputEvent, KeyCommand};
use super::level::{Level, LevelError, LevelKind, LevelOutcome, build_level};
use super::view::SessionView;
use crate::format_mm_ss;
use crate::platform::ClockReader;
use crate::settings::Settings;

/// Top-level session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// A level is active
    Playing,
    /// All levels finished; waiting for restart or quit
    Summary,
    /// Terminal
    Quit,
}

/// How one level of the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    pub kind: LevelKind,
    pub outcome: LevelOutcome,
}

pub struct GameSession {
    settings: Settings,
    levels: Vec<LevelKind>,
    index: usize,
    score: u64,
    phase: SessionPhase,
    active: Option<Box<dyn Level>>,
    notifier: Notifier,
    rng: Pcg32,
    clock: ClockReader,
    started_at: Duration,
    finished_at: Option<Duration>,
    results: Vec<LevelResult>,
    /// Consecutive ticks in which autoplay had no input to offer
    autoplay_idle: u32,
}

impl GameSession {
    /// Session over the reference level sequence
    pub fn new(
        settings: Settings,
        seed: u64,
        notifier: Notifier,
        clock: ClockReader,
    ) -> Result<Self, LevelError> {
        Self::with_levels(settings, LevelKind::SEQUENCE.to_vec(), seed, notifier, clock)
    }

    /// Session over an arbitrary level sequence. Every level is validated
    /// against `settings` up front so later transitions cannot fail.
    pub fn with_levels(
        settings: Settings,
        levels: Vec<LevelKind>,
        seed: u64,
        notifier: Notifier,
        clock: ClockReader,
    ) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::NoLevels);
        }
        for &kind in &levels {
            build_level(kind, &settings, seed, &mut Notifier::new())?;
        }

        let started_at = clock.elapsed();
        let mut session = Self {
            settings,
            levels,
            index: 0,
            score: 0,
            phase: SessionPhase::Playing,
            active: None,
            notifier,
            rng: Pcg32::seed_from_u64(seed),
            clock,
            started_at,
            finished_at: None,
            results: Vec::new(),
            autoplay_idle: 0,
        };
        session.enter_level(0);
        Ok(session)
    }

    /// Advance one tick: route `events`, then let the level's timers run
    pub fn tick(&mut self, events: &[InputEvent], dt: f32) {
        for event in events {
            if matches!(event, InputEvent::CloseRequested) {
                self.quit();
                return;
            }
            match self.phase {
                SessionPhase::Playing => {
                    if let Some(level) = self.active.as_mut() {
                        level.handle_input(event, &mut self.notifier);
                    }
                    if self.finish_level_if_complete() {
                        // The rest of this batch was aimed at the finished level
                        break;
                    }
                }
                SessionPhase::Summary => match event {
                    InputEvent::Key(KeyCommand::Restart) => self.restart(),
                    InputEvent::Key(KeyCommand::Quit) => {
                        self.quit();
                        return;
                    }
                    _ => {}
                },
                SessionPhase::Quit => return,
            }
        }

        if self.phase == SessionPhase::Playing {
            if let Some(level) = self.active.as_mut() {
                level.update(dt, &mut self.notifier);
            }
            self.finish_level_if_complete();
        }
    }

    /// Start over from the first level with a zero score
    pub fn restart(&mut self) {
        log::info!("Session restart");
        self.index = 0;
        self.score = 0;
        self.results.clear();
        self.started_at = self.clock.elapsed();
        self.finished_at = None;
        self.phase = SessionPhase::Playing;
        self.enter_level(0);
    }

    pub fn quit(&mut self) {
        if self.phase != SessionPhase::Quit {
            log::info!("Session quit with score {}", self.score);
            self.phase = SessionPhase::Quit;
            self.active = None;
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Zero-based index of the current level
    pub fn level_index(&self) -> usize {
        self.index
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Time since the session (re)started, frozen at the summary
    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .unwrap_or_else(|| self.clock.elapsed().saturating_sub(self.started_at))
    }

    /// [`GameSession::elapsed`] as `MM:SS`
    pub fn elapsed_label(&self) -> String {
        format_mm_ss(self.elapsed().as_secs_f64())
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The active level, if any
    pub fn level(&self) -> Option<&dyn Level> {
        self.active.as_deref()
    }

    pub fn results(&self) -> &[LevelResult] {
        &self.results
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Demo input for the active level
    pub fn autoplay_step(&self) -> Vec<InputEvent> {
        match (&self.active, self.phase) {
            (Some(level), SessionPhase::Playing) => level.autoplay_step(),
            _ => Vec::new(),
        }
    }

    /// Demo tick: feed autoplay input to the active level. Quits once
    /// autoplay has had nothing to offer for more than `stall_limit`
    /// consecutive ticks, so a level it cannot solve never hangs the run.
    pub fn autoplay_tick(&mut self, dt: f32, stall_limit: u32) {
        let input = self.autoplay_step();
        if input.is_empty() {
            self.autoplay_idle += 1;
        } else {
            self.autoplay_idle = 0;
        }
        if self.autoplay_idle > stall_limit {
            log::warn!(
                "Autoplay stalled for {} ticks on level {}, closing",
                self.autoplay_idle,
                self.index + 1
            );
            self.tick(&[InputEvent::CloseRequested], dt);
            return;
        }
        self.tick(&input, dt);
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            level_index: self.index,
            level_count: self.levels.len(),
            score: self.score,
            elapsed_secs: self.elapsed().as_secs_f64(),
            elapsed_label: self.elapsed_label(),
            level: self.active.as_ref().map(|l| l.view()),
            results: self.results.clone(),
        }
    }

    fn enter_level(&mut self, index: usize) {
        self.index = index;
        self.autoplay_idle = 0;
        let kind = self.levels[index];
        let seed = self.rng.random::<u64>();
        match build_level(kind, &self.settings, seed, &mut self.notifier) {
            Ok(level) => {
                log::info!("Level {}/{}: {}", index + 1, self.levels.len(), kind);
                self.active = Some(level);
            }
            Err(e) => {
                log::error!("Failed to build {} level: {}", kind, e);
                self.active = None;
                self.enter_summary();
            }
        }
    }

    /// Score and advance past a completed level. Returns true on transition.
    fn finish_level_if_complete(&mut self) -> bool {
        let Some(level) = self.active.as_ref() else {
            return false;
        };
        if !level.is_complete() {
            return false;
        }
        let kind = level.kind();
        let outcome = level.outcome().unwrap_or(LevelOutcome::Forced);

        self.score += self.settings.score_per_level;
        self.results.push(LevelResult { kind, outcome });
        self.notifier
            .publish(&GameEvent::LevelFinished { kind, outcome });
        log::info!("{} level finished ({:?}), score {}", kind, outcome, self.score);

        if self.index + 1 < self.levels.len() {
            self.enter_level(self.index + 1);
        } else {
            self.active = None;
            self.enter_summary();
        }
        true
    }

    fn enter_summary(&mut self) {
        self.finished_at = Some(self.clock.elapsed().saturating_sub(self.started_at));
        self.phase = SessionPhase::Summary;
        self.notifier
            .speak("¡Felicidades! Has completado todos los niveles");
        self.notifier
            .publish(&GameEvent::SessionFinished { score: self.score });
        log::info!(
            "Session complete: score {} in {}",
            self.score,
            self.elapsed_label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::WordGroup;
    use crate::sim::events::EventLog;

    fn session_with_log(seed: u64) -> (GameSession, EventLog, ClockReader) {
        let log = EventLog::new();
        let mut notifier = Notifier::new();
        notifier.subscribe(Box::new(log.clone()));
        let clock = ClockReader::manual();
        let session = GameSession::new(Settings::default(), seed, notifier, clock.clone()).unwrap();
        (session, log, clock)
    }

    fn autoplay_to_summary(session: &mut GameSession, max_ticks: usize) {
        for _ in 0..max_ticks {
            if session.phase() != SessionPhase::Playing {
                return;
            }
            let events = session.autoplay_step();
            session.tick(&events, SIM_DT);
        }
    }

    #[test]
    fn test_new_session_starts_on_first_level() {
        let (session, log, _) = session_with_log(1);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.level_index(), 0);
        assert_eq!(session.level_count(), 3);
        assert_eq!(session.score(), 0);
        assert_eq!(session.level().map(|l| l.kind()), Some(LevelKind::OrderedAssembly));
        assert!(log.spoken()[0].starts_with("Nivel 1"));
    }

    #[test]
    fn test_full_run_reaches_summary() {
        let (mut session, log, clock) = session_with_log(7);
        clock.advance(Duration::from_secs(75));
        autoplay_to_summary(&mut session, 5_000);

        assert_eq!(session.phase(), SessionPhase::Summary);
        assert_eq!(session.score(), 300);
        assert!(session.level().is_none());
        let kinds: Vec<_> = session.results().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, LevelKind::SEQUENCE);
        assert!(session.results().iter().all(|r| r.outcome == LevelOutcome::Solved));

        assert_eq!(session.elapsed_label(), "01:15");
        clock.advance(Duration::from_secs(30));
        assert_eq!(session.elapsed_label(), "01:15");

        let events = log.events();
        assert_eq!(
            events.last(),
            Some(&GameEvent::SessionFinished { score: 300 })
        );
        assert!(
            log.spoken()
                .iter()
                .any(|s| s == "¡Felicidades! Has completado todos los niveles")
        );
    }

    #[test]
    fn test_forced_level_scores_the_same() {
        let mut settings = Settings::default();
        settings.reveal_ticks = 2;
        let mut session = GameSession::with_levels(
            settings,
            vec![LevelKind::OrderedAssembly],
            3,
            Notifier::new(),
            ClockReader::manual(),
        )
        .unwrap();

        // Fill every slot back to front so the word is always wrong
        for _ in 0..2_000 {
            if session.phase() != SessionPhase::Playing {
                break;
            }
            let level = session.level().unwrap();
            let events = if level.phase() == crate::sim::level::LevelPhase::ErrorDisplay {
                InputEvent::click(crate::sim::level::dismiss_point()).to_vec()
            } else {
                wrong_drag(level.board())
            };
            session.tick(&events, SIM_DT);
        }

        assert_eq!(session.phase(), SessionPhase::Summary);
        assert_eq!(session.score(), 100);
        assert_eq!(session.results()[0].outcome, LevelOutcome::Forced);
    }

    /// Drag a token whose text differs from the last empty slot's
    fn wrong_drag(board: &crate::sim::board::Board) -> Vec<InputEvent> {
        let Some(slot) = board.slots().iter().rev().find(|s| !s.is_occupied()) else {
            return Vec::new();
        };
        let token = board
            .tokens()
            .iter()
            .find(|t| !t.placed && Some(&t.text) != slot.expected.as_ref());
        match token {
            Some(token) => InputEvent::drag(token.rect.center(), slot.rect.center()).to_vec(),
            None => Vec::new(),
        }
    }

    #[test]
    fn test_restart_from_summary() {
        let (mut session, _, clock) = session_with_log(11);
        autoplay_to_summary(&mut session, 5_000);
        assert_eq!(session.phase(), SessionPhase::Summary);

        clock.advance(Duration::from_secs(5));
        session.tick(&[InputEvent::Key(KeyCommand::Restart)], SIM_DT);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.level_index(), 0);
        assert!(session.results().is_empty());
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_quit_from_summary() {
        let (mut session, _, _) = session_with_log(5);
        autoplay_to_summary(&mut session, 5_000);
        session.tick(&[InputEvent::Key(KeyCommand::Quit)], SIM_DT);
        assert_eq!(session.phase(), SessionPhase::Quit);
        session.tick(&[InputEvent::Key(KeyCommand::Restart)], SIM_DT);
        assert_eq!(session.phase(), SessionPhase::Quit);
    }

    #[test]
    fn test_keys_ignored_while_playing() {
        let (mut session, _, _) = session_with_log(2);
        session.tick(&[InputEvent::Key(KeyCommand::Quit)], SIM_DT);
        session.tick(&[InputEvent::Key(KeyCommand::Restart)], SIM_DT);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.level_index(), 0);
    }

    #[test]
    fn test_close_requested_quits_any_time() {
        let (mut session, _, _) = session_with_log(2);
        session.tick(&[InputEvent::CloseRequested], SIM_DT);
        assert_eq!(session.phase(), SessionPhase::Quit);
        assert!(session.level().is_none());
        assert!(session.view().level.is_none());
    }

    #[test]
    fn test_same_seed_same_words() {
        let (a, _, _) = session_with_log(99);
        let (b, _, _) = session_with_log(99);
        assert_eq!(a.view(), b.view());
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let result = GameSession::with_levels(
            Settings::default(),
            Vec::new(),
            1,
            Notifier::new(),
            ClockReader::manual(),
        );
        assert!(matches!(result, Err(LevelError::NoLevels)));
    }

    #[test]
    fn test_bad_settings_rejected_up_front() {
        let mut settings = Settings::default();
        settings.anagram.groups.clear();
        let result = GameSession::new(settings, 1, Notifier::new(), ClockReader::manual());
        assert!(matches!(
            result,
            Err(LevelError::EmptyWordList(LevelKind::AnagramSearch))
        ));
    }

    #[test]
    fn test_autoplay_tick_finishes_a_normal_run() {
        let (mut session, _, _) = session_with_log(13);
        for _ in 0..5_000 {
            if session.phase() != SessionPhase::Playing {
                break;
            }
            session.autoplay_tick(SIM_DT, 600);
        }
        assert_eq!(session.phase(), SessionPhase::Summary);
        assert_eq!(session.score(), 300);
    }

    #[test]
    fn test_autoplay_tick_quits_when_stuck() {
        let mut settings = Settings::default();
        // Nothing in the list can be spelled with "sol"
        settings.anagram.groups = vec![WordGroup::new("sol", &["luz", "mar"])];
        let mut session = GameSession::with_levels(
            settings,
            vec![LevelKind::AnagramSearch],
            4,
            Notifier::new(),
            ClockReader::manual(),
        )
        .unwrap();

        for _ in 0..30 {
            session.autoplay_tick(SIM_DT, 20);
        }
        assert_eq!(session.phase(), SessionPhase::Quit);
        assert_eq!(session.score(), 0);
    }
}
