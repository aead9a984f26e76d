//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s.
//! The shortcut map lives in Rust so it's shared across WASM and native.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    /// Delete the selected node (with its connections) or connection.
    Delete,
    /// Abort the active gesture and clear the selection.
    Cancel,
    AutoLayout,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

impl ShortcutAction {
    /// Stable name handed to the host page.
    pub fn as_str(self) -> &'static str {
        match self {
            ShortcutAction::Undo => "undo",
            ShortcutAction::Redo => "redo",
            ShortcutAction::Delete => "delete",
            ShortcutAction::Cancel => "cancel",
            ShortcutAction::AutoLayout => "auto_layout",
            ShortcutAction::ZoomIn => "zoom_in",
            ShortcutAction::ZoomOut => "zoom_out",
            ShortcutAction::ZoomReset => "zoom_reset",
        }
    }

    /// Inverse of [`as_str`](Self::as_str), for toolbar buttons.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "undo" => ShortcutAction::Undo,
            "redo" => ShortcutAction::Redo,
            "delete" => ShortcutAction::Delete,
            "cancel" => ShortcutAction::Cancel,
            "auto_layout" => ShortcutAction::AutoLayout,
            "zoom_in" => ShortcutAction::ZoomIn,
            "zoom_out" => ShortcutAction::ZoomOut,
            "zoom_reset" => ShortcutAction::ZoomReset,
            _ => return None,
        })
    }
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: &Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                _ => None,
            };
        }

        if modifiers.alt {
            return None;
        }

        // ── Single keys ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Cancel),
            "l" | "L" => Some(ShortcutAction::AutoLayout),
            "=" | "+" => Some(ShortcutAction::ZoomIn),
            "-" => Some(ShortcutAction::ZoomOut),
            "0" => Some(ShortcutAction::ZoomReset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const META_SHIFT: Modifiers = Modifiers {
        meta: true,
        shift: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(ShortcutMap::resolve("z", &META), Some(ShortcutAction::Undo));
        // Ctrl+Z → Undo
        assert_eq!(ShortcutMap::resolve("z", &CTRL), Some(ShortcutAction::Undo));
        // Cmd+Shift+Z → Redo (browsers report an upper-case key)
        assert_eq!(ShortcutMap::resolve("Z", &META_SHIFT), Some(ShortcutAction::Redo));
        // Ctrl+Y → Redo
        assert_eq!(ShortcutMap::resolve("y", &CTRL), Some(ShortcutAction::Redo));
    }

    #[test]
    fn resolve_delete() {
        assert_eq!(
            ShortcutMap::resolve("Delete", &Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", &Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
    }

    #[test]
    fn resolve_layout_and_escape() {
        assert_eq!(
            ShortcutMap::resolve("l", &Modifiers::NONE),
            Some(ShortcutAction::AutoLayout)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", &Modifiers::NONE),
            Some(ShortcutAction::Cancel)
        );
    }

    #[test]
    fn resolve_zoom_with_or_without_command() {
        for mods in [Modifiers::NONE, META] {
            assert_eq!(ShortcutMap::resolve("=", &mods), Some(ShortcutAction::ZoomIn));
            assert_eq!(ShortcutMap::resolve("-", &mods), Some(ShortcutAction::ZoomOut));
            assert_eq!(ShortcutMap::resolve("0", &mods), Some(ShortcutAction::ZoomReset));
        }
    }

    #[test]
    fn resolve_modifier_precedence() {
        assert_eq!(ShortcutMap::resolve("z", &Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("l", &CTRL), None);
        assert_eq!(ShortcutMap::resolve("Delete", &META), None);
    }

    #[test]
    fn action_names_roundtrip() {
        for action in [
            ShortcutAction::Undo,
            ShortcutAction::Redo,
            ShortcutAction::Delete,
            ShortcutAction::Cancel,
            ShortcutAction::AutoLayout,
            ShortcutAction::ZoomIn,
            ShortcutAction::ZoomOut,
            ShortcutAction::ZoomReset,
        ] {
            assert_eq!(ShortcutAction::from_name(action.as_str()), Some(action));
        }
        assert_eq!(ShortcutAction::from_name("paste"), None);
    }
}
