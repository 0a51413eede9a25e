//! Drag-and-drop board: draggable tokens and the slots they drop into
//!
//! Invariants maintained by every mutation path:
//! - a slot holds at most one token, a token occupies at most one slot
//! - `token.placed` is true iff some slot's occupant is that token
//! - at most one token is `dragging` at a time
//!
//! Tokens are stored in render order: the last token is drawn on top and
//! is hit-tested first.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// A draggable unit of text (syllable or letter)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: u32,
    pub text: String,
    /// Top-left corner the token returns to when released off a slot
    pub origin: Vec2,
    /// Current bounds
    pub rect: Rect,
    pub dragging: bool,
    pub placed: bool,
}

impl Token {
    pub fn new(id: u32, text: impl Into<String>, origin: Vec2, size: Vec2) -> Self {
        Self {
            id,
            text: text.into(),
            origin,
            rect: Rect::at(origin, size),
            dragging: false,
            placed: false,
        }
    }

    /// Send the token back to its origin, unplaced and idle
    pub fn reset_position(&mut self) {
        self.rect.min = self.origin;
        self.placed = false;
        self.dragging = false;
    }
}

/// A fixed drop target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: u32,
    pub rect: Rect,
    /// Expected text, or None for free-form slots
    pub expected: Option<String>,
    /// Token currently held (by id)
    pub occupant: Option<u32>,
}

impl Slot {
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Result of releasing the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Token landed in a slot
    Placed { token: u32, slot: u32, text: String },
    /// No eligible slot under the pointer; token went home
    Reverted { token: u32 },
    /// Nothing was being dragged
    Idle,
}

/// Tokens, slots, and the pointer interaction between them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    /// Render order (last = top-most)
    tokens: Vec<Token>,
    /// Declaration order (first matching slot wins on drop)
    slots: Vec<Slot>,
    next_id: u32,
}

impl Board {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            slots: Vec::new(),
            next_id: 1,
        }
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a token at `origin` (top-left). Returns its id.
    pub fn add_token(&mut self, text: impl Into<String>, origin: Vec2, size: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.tokens.push(Token::new(id, text, origin, size));
        id
    }

    /// Add a slot. Returns its id.
    pub fn add_slot(&mut self, rect: Rect, expected: Option<String>) -> u32 {
        let id = self.next_entity_id();
        self.slots.push(Slot {
            id,
            rect,
            expected,
            occupant: None,
        });
        id
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn token(&self, id: u32) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    fn token_mut(&mut self, id: u32) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id == id)
    }

    /// Id of the token currently being dragged
    pub fn dragging(&self) -> Option<u32> {
        self.tokens.iter().find(|t| t.dragging).map(|t| t.id)
    }

    /// Text held by a slot, if occupied
    pub fn occupant_text(&self, slot: &Slot) -> Option<&str> {
        slot.occupant
            .and_then(|id| self.token(id))
            .map(|t| t.text.as_str())
    }

    /// Pick up the top-most unplaced token under `pos`.
    ///
    /// The picked token moves to the top of the render order.
    pub fn pointer_down(&mut self, pos: Vec2) -> Option<u32> {
        if self.dragging().is_some() {
            return None;
        }
        let idx = self
            .tokens
            .iter()
            .rposition(|t| !t.placed && t.rect.contains_point(pos))?;
        let mut token = self.tokens.remove(idx);
        token.dragging = true;
        let id = token.id;
        self.tokens.push(token);
        Some(id)
    }

    /// Re-center the dragged token on `pos` (no-op when idle)
    pub fn pointer_move(&mut self, pos: Vec2) {
        if let Some(token) = self.tokens.iter_mut().find(|t| t.dragging) {
            token.rect.set_center(pos);
        }
    }

    /// Release the dragged token at `pos`.
    ///
    /// The first unoccupied slot (declaration order) containing `pos`
    /// receives it; otherwise it reverts to its origin.
    pub fn pointer_up(&mut self, pos: Vec2) -> DropOutcome {
        let Some(token_id) = self.dragging() else {
            return DropOutcome::Idle;
        };

        let target = self
            .slots
            .iter_mut()
            .find(|s| !s.is_occupied() && s.rect.contains_point(pos));
        let token = self.tokens.iter_mut().find(|t| t.id == token_id);

        match (target, token) {
            (Some(slot), Some(token)) => {
                slot.occupant = Some(token_id);
                token.rect.set_center(slot.rect.center());
                token.dragging = false;
                token.placed = true;
                log::debug!("Token '{}' placed in slot {}", token.text, slot.id);
                DropOutcome::Placed {
                    token: token_id,
                    slot: slot.id,
                    text: token.text.clone(),
                }
            }
            (_, token) => {
                if let Some(token) = token {
                    token.reset_position();
                }
                DropOutcome::Reverted { token: token_id }
            }
        }
    }

    /// Empty every slot, sending occupants home
    pub fn clear_all(&mut self) {
        self.clear_where(|_, _| true);
    }

    /// Empty the slots for which `pred(slot, occupant_text)` holds.
    /// Returns the number of slots cleared.
    pub fn clear_where(&mut self, mut pred: impl FnMut(&Slot, &str) -> bool) -> usize {
        let mut released = Vec::new();
        for slot in &mut self.slots {
            let Some(id) = slot.occupant else { continue };
            let text = self
                .tokens
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.text.as_str())
                .unwrap_or("");
            if pred(slot, text) {
                slot.occupant = None;
                released.push(id);
            }
        }
        for id in &released {
            if let Some(token) = self.token_mut(*id) {
                token.reset_position();
            }
        }
        released.len()
    }

    /// True when every slot holds a token
    pub fn is_filled(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(Slot::is_occupied)
    }

    /// Concatenation of occupant texts in slot order (empty slots contribute nothing)
    pub fn occupied_text(&self) -> String {
        self.slots
            .iter()
            .filter_map(|s| self.occupant_text(s))
            .collect()
    }

    /// The formed word, only once every slot is filled
    pub fn formed_word(&self) -> Option<String> {
        self.is_filled().then(|| self.occupied_text())
    }

    /// True when every slot holds exactly its expected text
    pub fn all_slots_match(&self) -> bool {
        self.is_filled()
            && self
                .slots
                .iter()
                .all(|s| s.expected.as_deref() == self.occupant_text(s))
    }

    /// Check the occupancy invariants
    pub fn is_consistent(&self) -> bool {
        let mut seen = Vec::new();
        for slot in &self.slots {
            if let Some(id) = slot.occupant {
                if seen.contains(&id) {
                    return false;
                }
                match self.token(id) {
                    Some(t) if t.placed && !t.dragging => {}
                    _ => return false,
                }
                seen.push(id);
            }
        }
        let placed = self.tokens.iter().filter(|t| t.placed).count();
        let dragging = self.tokens.iter().filter(|t| t.dragging).count();
        placed == seen.len() && dragging <= 1
    }
}
