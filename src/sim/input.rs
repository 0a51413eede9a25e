//! Input events fed into the simulation

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(u16),
}

impl PointerButton {
    /// Map a 1-based platform button number (1 = left)
    pub fn from_index(index: u16) -> Self {
        match index {
            1 => PointerButton::Primary,
            2 => PointerButton::Middle,
            3 => PointerButton::Secondary,
            n => PointerButton::Other(n),
        }
    }
}

/// Keys recognized on the summary screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCommand {
    Restart,
    Quit,
}

/// One input event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown { pos: Vec2, button: PointerButton },
    PointerUp { pos: Vec2, button: PointerButton },
    PointerMove { pos: Vec2 },
    Key(KeyCommand),
    /// Window closed / process asked to stop
    CloseRequested,
}

impl InputEvent {
    pub fn down(pos: Vec2) -> Self {
        InputEvent::PointerDown {
            pos,
            button: PointerButton::Primary,
        }
    }

    pub fn up(pos: Vec2) -> Self {
        InputEvent::PointerUp {
            pos,
            button: PointerButton::Primary,
        }
    }

    pub fn moved(pos: Vec2) -> Self {
        InputEvent::PointerMove { pos }
    }

    /// Press at `from`, drag to `to`, release there
    pub fn drag(from: Vec2, to: Vec2) -> [InputEvent; 3] {
        [Self::down(from), Self::moved(to), Self::up(to)]
    }

    /// Primary press-and-release at `pos`
    pub fn click(pos: Vec2) -> [InputEvent; 2] {
        [Self::down(pos), Self::up(pos)]
    }
}
