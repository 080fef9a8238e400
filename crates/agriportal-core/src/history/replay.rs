use tracing::{debug, warn};

use super::action::{Action, NewAction};
use super::log::History;
use crate::error::{AgriportalError, Result};

/// Performs the backend side of undo and redo for recorded actions.
#[async_trait::async_trait]
pub trait ActionHandler<P = serde_json::Value>: Send + Sync
where
    P: Send + Sync,
{
    /// Reverse the effect of `action`.
    async fn on_undo(&self, action: &Action<P>) -> Result<()>;

    /// Re-apply the effect of `action`.
    async fn on_redo(&self, action: &Action<P>) -> Result<()>;
}

/// A [`History`] paired with the handler that makes undo/redo real.
///
/// The cursor moves before the handler runs and is not rolled back when the
/// handler fails, so a failed reversal can leave the log ahead of the backend.
pub struct HistoryController<H, P = serde_json::Value> {
    history: History<P>,
    handler: H,
}

impl<H, P> HistoryController<H, P>
where
    H: ActionHandler<P>,
    P: Clone + Send + Sync,
{
    pub fn new(handler: H) -> Self {
        Self::with_history(History::new(), handler)
    }

    pub fn with_history(history: History<P>, handler: H) -> Self {
        Self { history, handler }
    }

    pub fn history(&self) -> &History<P> {
        &self.history
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Record a mutation the caller has already performed successfully.
    pub fn record(&mut self, new: NewAction<P>) -> &Action<P> {
        self.history.record(new)
    }

    /// Undo the most recent applied action.
    ///
    /// `Ok(None)` when there was nothing to undo; the handler is not called.
    pub async fn undo(&mut self) -> Result<Option<Action<P>>> {
        let Some(action) = self.history.undo().cloned() else {
            debug!("nothing to undo");
            return Ok(None);
        };
        match self.handler.on_undo(&action).await {
            Ok(()) => Ok(Some(action)),
            Err(e) => {
                warn!(id = %action.id, label = %action.label, error = %e, "undo failed, history cursor kept");
                Err(AgriportalError::Reversal {
                    action_id: action.id,
                    direction: "undo",
                    source: Box::new(e),
                })
            }
        }
    }

    /// Redo the oldest undone action.
    ///
    /// `Ok(None)` when there was nothing to redo; the handler is not called.
    pub async fn redo(&mut self) -> Result<Option<Action<P>>> {
        let Some(action) = self.history.redo().cloned() else {
            debug!("nothing to redo");
            return Ok(None);
        };
        match self.handler.on_redo(&action).await {
            Ok(()) => Ok(Some(action)),
            Err(e) => {
                warn!(id = %action.id, label = %action.label, error = %e, "redo failed, history cursor kept");
                Err(AgriportalError::Reversal {
                    action_id: action.id,
                    direction: "redo",
                    source: Box::new(e),
                })
            }
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
