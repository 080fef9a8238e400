//! Undo/redo history for admin CMS mutations.
//!
//! [`History`] is the in-memory log and only moves a cursor.
//! [`HistoryController`] pairs it with an [`ActionHandler`] that performs the
//! backend reversal or replay for each action handed back.

pub mod action;
pub mod log;
#[cfg(feature = "async")]
pub mod replay;

pub use action::{Action, ActionKind, NewAction};
pub use log::History;
#[cfg(feature = "async")]
pub use replay::{ActionHandler, HistoryController};
