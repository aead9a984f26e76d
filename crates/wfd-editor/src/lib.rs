pub mod commands;
pub mod drag;
pub mod engine;
pub mod error;
pub mod input;
pub mod shortcuts;

pub use drag::{DragState, Selection};
pub use engine::{DesignerEngine, EventOutcome, PendingIo};
pub use error::DesignerError;
pub use input::{InputEvent, Modifiers};
pub use shortcuts::{ShortcutAction, ShortcutMap};
