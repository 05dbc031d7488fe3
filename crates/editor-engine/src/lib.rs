//! # flipbook-editor-engine
//!
//! The editing session for Flipbook.
//!
//! - [`editor::Editor`] owns one session's frames, undo history, playback
//!   state and export guard; every change goes through `Editor::dispatch`.
//! - [`playback`] holds the stopped/playing state machine and its rate gate.
//! - [`session`] runs an editor inside a tokio task, with a tick task
//!   driving playback and exports rendered off the actor.

pub mod action;
pub mod editor;
pub mod error;
pub mod playback;
pub mod session;

pub use action::Action;
pub use editor::{Editor, EditorView};
pub use error::{EditorError, EditorResult};
pub use playback::{Playback, PlaybackPhase};
pub use session::{EditorHandle, EditorSession, SessionEvent};
