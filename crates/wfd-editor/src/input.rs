//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and pen events into a unified `InputEvent` enum
//! consumed by the drag controller. Coordinates are always screen space;
//! the engine converts to canvas space with the current transform.

use wfd_core::model::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Platform "command" key: ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event from any pointing device or the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown { x: f32, y: f32, modifiers: Modifiers },

    PointerMove { x: f32, y: f32, modifiers: Modifiers },

    PointerUp { x: f32, y: f32, modifiers: Modifiers },

    /// Pointer left the whole surface. Force-cancels any gesture.
    PointerLeave,

    /// Wheel or pinch. Negative `delta_y` zooms in around `(x, y)`.
    Wheel { x: f32, y: f32, delta_y: f32 },

    /// `key` is the DOM `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
        }
    }

    /// Screen position, if this is a positioned event.
    pub fn position(&self) -> Option<Point> {
        match *self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. } => Some(Point::new(x, y)),
            Self::PointerLeave | Self::Key { .. } => None,
        }
    }

    /// Short name used in log lines and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PointerDown { .. } => "pointer-down",
            Self::PointerMove { .. } => "pointer-move",
            Self::PointerUp { .. } => "pointer-up",
            Self::PointerLeave => "pointer-leave",
            Self::Wheel { .. } => "wheel",
            Self::Key { .. } => "key",
        }
    }
}
