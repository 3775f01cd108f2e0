//! # Input State
//!
//! Per-scene cursor position and display toggles.
//!
//! Window callbacks feed raw key and cursor events into an [`InputState`];
//! key handling returns an [`InputCommand`] for the windowing layer to apply
//! (close the window, switch polygon mode, ...). Nothing here is global.
//!
//! ## Key bindings
//!
//! | Key | Action | Effect |
//! |-----|--------|--------|
//! | Escape | release | request close |
//! | F1 | press | toggle cursor lock |
//! | F3 | press | toggle wireframe |
//! | F4 | press | toggle back-face culling |
//! | F11 | press | toggle fullscreen |

use tracing::debug;

/// Keys the input state reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape.
    Escape,
    /// F1.
    F1,
    /// F3.
    F3,
    /// F4.
    F4,
    /// F11.
    F11,
    /// Any other key, by platform key code.
    Other(i32),
}

/// What happened to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Key went down.
    Press,
    /// Key went up.
    Release,
    /// Key held down and auto-repeating.
    Repeat,
}

/// Side effect requested by a key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCommand {
    /// Close the window.
    Close,
    /// Lock (hide) or release the cursor.
    CursorLocked(bool),
    /// Render in wireframe (`true`) or filled (`false`).
    Wireframe(bool),
    /// Enable or disable back-face culling.
    Culling(bool),
    /// Enter or leave fullscreen.
    Fullscreen(bool),
}

/// Cursor position and display toggles of one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct InputState {
    cursor: (f64, f64),
    cursor_locked: bool,
    wireframe: bool,
    culling: bool,
    fullscreen: bool,
    close_requested: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            cursor: (0.0, 0.0),
            cursor_locked: false,
            wireframe: false,
            culling: true,
            fullscreen: true,
            close_requested: false,
        }
    }
}

impl InputState {
    /// Creates the initial state: cursor at the origin, culling on,
    /// fullscreen on, everything else off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a key event.
    ///
    /// Returns the command the windowing layer should carry out, if any.
    pub fn handle_key(&mut self, key: Key, action: KeyAction) -> Option<InputCommand> {
        let command = match (key, action) {
            (Key::Escape, KeyAction::Release) => {
                self.close_requested = true;
                InputCommand::Close
            }
            (Key::F1, KeyAction::Press) => {
                self.cursor_locked = !self.cursor_locked;
                InputCommand::CursorLocked(self.cursor_locked)
            }
            (Key::F3, KeyAction::Press) => {
                self.wireframe = !self.wireframe;
                InputCommand::Wireframe(self.wireframe)
            }
            (Key::F4, KeyAction::Press) => {
                self.culling = !self.culling;
                InputCommand::Culling(self.culling)
            }
            (Key::F11, KeyAction::Press) => {
                self.fullscreen = !self.fullscreen;
                InputCommand::Fullscreen(self.fullscreen)
            }
            _ => return None,
        };

        debug!(?key, ?command, "input command");
        Some(command)
    }

    /// Records a new cursor position and returns the movement since the
    /// previous one.
    pub fn move_cursor(&mut self, x: f64, y: f64) -> (f64, f64) {
        let (old_x, old_y) = self.cursor;
        self.cursor = (x, y);
        (x - old_x, y - old_y)
    }

    /// Returns the last cursor position.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    /// Returns `true` if the cursor is locked.
    #[inline]
    #[must_use]
    pub const fn cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    /// Returns `true` in wireframe mode.
    #[inline]
    #[must_use]
    pub const fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Returns `true` if back-face culling is on.
    #[inline]
    #[must_use]
    pub const fn culling(&self) -> bool {
        self.culling
    }

    /// Returns `true` in fullscreen.
    #[inline]
    #[must_use]
    pub const fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Returns `true` once Escape has been released.
    #[inline]
    #[must_use]
    pub const fn close_requested(&self) -> bool {
        self.close_requested
    }
}
