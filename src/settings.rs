//! Game settings, level rules and word banks
//!
//! Loaded from a JSON file named by `SILABARIO_SETTINGS`; any field the
//! file leaves out keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{ERROR_DISPLAY_TICKS, REVEAL_TICKS, SCORE_PER_LEVEL};

/// Environment variable naming the settings file
pub const SETTINGS_ENV: &str = "SILABARIO_SETTINGS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Attempts allowed in the ordered-assembly level
    pub fn attempts(&self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => 3,
            Difficulty::Hard => 2,
        }
    }

    /// Countdown for the timed-fill level (seconds)
    pub fn time_limit(&self) -> f32 {
        match self {
            Difficulty::Easy => 180.0,
            Difficulty::Normal => 120.0,
            Difficulty::Hard => 90.0,
        }
    }

    /// Wrong anagram candidates tolerated before forced completion
    pub fn max_errors(&self) -> u32 {
        match self {
            Difficulty::Easy => 8,
            Difficulty::Normal => 5,
            Difficulty::Hard => 3,
        }
    }
}

/// A target word with the hint spoken/shown for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CluedWord {
    pub word: String,
    pub category: String,
}

impl CluedWord {
    pub fn new(word: &str, category: &str) -> Self {
        Self {
            word: word.to_string(),
            category: category.to_string(),
        }
    }
}

/// A base word and the short words hidden in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordGroup {
    pub base: String,
    pub words: Vec<String>,
}

impl WordGroup {
    pub fn new(base: &str, words: &[&str]) -> Self {
        Self {
            base: base.to_string(),
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Ordered-assembly rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderedRules {
    pub words: Vec<CluedWord>,
    pub attempts: u32,
    /// Decoy fragments sampled into the pool
    pub distractors: Vec<String>,
    pub distractor_count: usize,
}

impl Default for OrderedRules {
    fn default() -> Self {
        Self {
            words: vec![
                CluedWord::new("computadora", "dispositivo electrónico"),
                CluedWord::new("telefono", "aparato de comunicación"),
                CluedWord::new("elefante", "animal grande"),
                CluedWord::new("mariposa", "insecto volador"),
                CluedWord::new("biblioteca", "lugar con libros"),
                CluedWord::new("universidad", "institución educativa"),
            ],
            attempts: 3,
            distractors: strings(&["ción", "mente", "ando", "iendo", "mente", "ción", "ando"]),
            distractor_count: 3,
        }
    }
}

/// Timed-fill rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimedRules {
    pub words: Vec<CluedWord>,
    /// Countdown start (seconds)
    pub time_limit: f32,
    /// Seconds lost per wrong full fill
    pub time_penalty: f32,
    /// Filler syllables mixed into the pool
    pub fillers: Vec<String>,
}

impl Default for TimedRules {
    fn default() -> Self {
        let common = "acción o objeto común";
        let place = "parte de una casa o lugar";
        let nature = "elemento de la naturaleza u objeto educativo";
        Self {
            words: vec![
                CluedWord::new("caminar", common),
                CluedWord::new("pelota", common),
                CluedWord::new("ventana", place),
                CluedWord::new("caballo", "palabra común"),
                CluedWord::new("escuela", place),
                CluedWord::new("jardín", place),
                CluedWord::new("montaña", nature),
                CluedWord::new("libro", nature),
            ],
            time_limit: 120.0,
            time_penalty: 10.0,
            fillers: strings(&["la", "lo", "pa", "sa", "ti", "ma", "no", "que", "de", "en"]),
        }
    }
}

/// Anagram-search rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnagramRules {
    pub groups: Vec<WordGroup>,
    /// Words to find before the level completes
    pub required_words: usize,
    /// Wrong candidates before forced completion
    pub max_errors: u32,
    /// Shortest candidate the verify button will judge
    pub min_candidate_len: usize,
}

impl Default for AnagramRules {
    fn default() -> Self {
        Self {
            groups: vec![
                WordGroup::new("mariposa", &["mar", "piso", "rosa", "sopa", "ramo", "pasa"]),
                WordGroup::new("elefante", &["ele", "fante", "tela", "lefa", "flan", "ante"]),
                WordGroup::new("biblioteca", &["libro", "teca", "bota", "beca", "lote", "biblia"]),
            ],
            required_words: 3,
            max_errors: 5,
            min_candidate_len: 2,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Level rules ===
    pub ordered: OrderedRules,
    pub timed: TimedRules,
    pub anagram: AnagramRules,

    // === Timing (ticks at 60 Hz) ===
    /// How long an error message stays up
    pub error_display_ticks: u32,
    /// Pause between budget exhaustion and forced completion
    pub reveal_ticks: u32,

    // === Session ===
    pub score_per_level: u64,
    /// Fixed RNG seed (None = seed from the system clock)
    pub seed: Option<u64>,

    // === Services ===
    /// Pending narration requests kept before new ones are dropped
    pub speech_queue_capacity: usize,
    /// Elapsed-time refresh period (milliseconds)
    pub clock_period_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            ordered: OrderedRules::default(),
            timed: TimedRules::default(),
            anagram: AnagramRules::default(),
            error_display_ticks: ERROR_DISPLAY_TICKS,
            reveal_ticks: REVEAL_TICKS,
            score_per_level: SCORE_PER_LEVEL,
            seed: None,
            speech_queue_capacity: 32,
            clock_period_ms: 100,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset (applies preset budgets)
    pub fn from_preset(difficulty: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(difficulty);
        settings
    }

    /// Apply a difficulty preset (updates budget-dependent rules)
    pub fn apply_preset(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.ordered.attempts = difficulty.attempts();
        self.timed.time_limit = difficulty.time_limit();
        self.anagram.max_errors = difficulty.max_errors();
    }

    /// Parse settings JSON. Budgets the file leaves out follow its
    /// `difficulty` preset; budgets it names win over the preset.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let named = |block: &str, field: &str| {
            value.get(block).and_then(|b| b.get(field)).is_some()
        };
        let keep_attempts = named("ordered", "attempts");
        let keep_time_limit = named("timed", "time_limit");
        let keep_max_errors = named("anagram", "max_errors");

        let mut settings: Self = serde_json::from_value(value)?;
        let difficulty = settings.difficulty;
        if !keep_attempts {
            settings.ordered.attempts = difficulty.attempts();
        }
        if !keep_time_limit {
            settings.timed.time_limit = difficulty.time_limit();
        }
        if !keep_max_errors {
            settings.anagram.max_errors = difficulty.max_errors();
        }
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `SILABARIO_SETTINGS`, falling back to defaults
    pub fn load() -> Self {
        let Ok(path) = std::env::var(SETTINGS_ENV) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::load_from(Path::new(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("medium"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("nightmare"), None);
        assert_eq!(Difficulty::Easy.as_str(), "Easy");
    }

    #[test]
    fn test_defaults_match_reference_rules() {
        let s = Settings::default();
        assert_eq!(s.ordered.attempts, 3);
        assert_eq!(s.timed.time_limit, 120.0);
        assert_eq!(s.timed.time_penalty, 10.0);
        assert_eq!(s.anagram.required_words, 3);
        assert_eq!(s.anagram.max_errors, 5);
        assert_eq!(s.score_per_level, 100);
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let s = Settings::from_json(r#"{"seed": 7, "timed": {"time_limit": 60.0}}"#).unwrap();
        assert_eq!(s.seed, Some(7));
        assert_eq!(s.timed.time_limit, 60.0);
        assert_eq!(s.timed.time_penalty, 10.0);
        assert_eq!(s.ordered, OrderedRules::default());
    }

    #[test]
    fn test_json_roundtrip_and_bad_json() {
        let s = Settings::from_preset(Difficulty::Hard);
        assert_eq!(s.ordered.attempts, 2);
        let back = Settings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Settings::load_from(Path::new("/nonexistent/silabario.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_difficulty_in_json_sets_budgets() {
        let s = Settings::from_json(r#"{"difficulty": "Hard"}"#).unwrap();
        assert_eq!(s.difficulty, Difficulty::Hard);
        assert_eq!(s.ordered.attempts, 2);
        assert_eq!(s.timed.time_limit, 90.0);
        assert_eq!(s.anagram.max_errors, 3);
        assert_eq!(s, Settings::from_preset(Difficulty::Hard));
    }

    #[test]
    fn test_named_budget_beats_difficulty() {
        let s = Settings::from_json(r#"{"difficulty": "Easy", "ordered": {"attempts": 4}}"#)
            .unwrap();
        assert_eq!(s.ordered.attempts, 4);
        assert_eq!(s.timed.time_limit, 180.0);
        assert_eq!(s.anagram.max_errors, 8);
    }
}
