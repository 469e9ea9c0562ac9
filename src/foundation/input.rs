//! Canvas input events. Positions are in canvas space (CSS pixels of the drawing surface).

use crate::foundation::core::{Point, Vec2};

/// Which device produced a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerKind {
    /// Mouse or pen.
    #[default]
    Mouse,
    /// Finger on a touch surface.
    Touch,
}

/// Mouse button associated with a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerButton {
    /// Left / primary button, or a touch contact.
    #[default]
    Primary,
    /// Middle button.
    Auxiliary,
    /// Right button.
    Secondary,
}

/// Keyboard modifier state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift held.
    pub shift: bool,
    /// Control held.
    pub ctrl: bool,
    /// Alt / option held.
    pub alt: bool,
    /// Meta / command held.
    pub meta: bool,
}

/// Pointer down/move/up in canvas space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Position in canvas space.
    pub position: Point,
    /// Device kind.
    pub kind: PointerKind,
    /// Button involved.
    pub button: PointerButton,
    /// Modifier state.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// A primary-button mouse event at `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            kind: PointerKind::Mouse,
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    /// Same event with a different button.
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Same event with different modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Return `true` for the primary mouse button or any touch contact.
    pub fn is_primary(&self) -> bool {
        self.kind == PointerKind::Touch || self.button == PointerButton::Primary
    }
}

/// Wheel / trackpad scroll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelEvent {
    /// Cursor position in canvas space.
    pub position: Point,
    /// Scroll delta in canvas pixels.
    pub delta: Vec2,
    /// Modifier state; ctrl turns scrolling into zooming.
    pub modifiers: Modifiers,
}

/// Key press or release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Lowercased key name (`"a"`, `"escape"`, `"enter"`, ...).
    pub key: String,
    /// Modifier state.
    pub modifiers: Modifiers,
    /// Milliseconds since an arbitrary epoch, used by hold-to-activate handlers.
    pub timestamp_ms: u64,
    /// Auto-repeat from a held key.
    pub repeat: bool,
}

impl KeyEvent {
    /// A key event without modifiers at time zero.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into().to_lowercase(),
            modifiers: Modifiers::default(),
            timestamp_ms: 0,
            repeat: false,
        }
    }

    /// Same event at a different timestamp.
    pub fn at_ms(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Same event flagged as auto-repeat.
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Keybinding string: modifiers in fixed order then key, e.g. `"ctrl+shift+z"`.
    pub fn binding(&self) -> String {
        let mut out = String::new();
        let m = self.modifiers;
        for (on, name) in [(m.ctrl, "ctrl"), (m.alt, "alt"), (m.shift, "shift"), (m.meta, "meta")] {
            if on {
                out.push_str(name);
                out.push('+');
            }
        }
        out.push_str(&self.key);
        out
    }
}
