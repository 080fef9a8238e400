pub mod config;
pub mod error;
pub mod history;
#[cfg(feature = "async")]
pub mod store;

pub use config::{AppConfig, HistoryConfig, LogConfig};
pub use error::{AgriportalError, ExitCode, Result};
pub use history::{Action, ActionKind, History, NewAction};

#[cfg(feature = "async")]
pub use history::{ActionHandler, HistoryController};
#[cfg(feature = "async")]
pub use store::{MemoryStore, RowChange};
