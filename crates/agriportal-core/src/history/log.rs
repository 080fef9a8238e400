use tracing::debug;

use super::action::{Action, NewAction};

/// Linear undo/redo log for admin mutations.
///
/// Entries up to and including the cursor are applied; anything after it has
/// been undone and can be redone. The log only moves its cursor. Reversing or
/// replaying a returned [`Action`] is the caller's job.
#[derive(Debug, Clone)]
pub struct History<P = serde_json::Value> {
    entries: Vec<Action<P>>,
    /// Number of applied entries, i.e. `cursor + 1`.
    applied: usize,
    max_entries: Option<usize>,
}

impl<P> Default for History<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> History<P> {
    /// Empty, unbounded history.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            applied: 0,
            max_entries: None,
        }
    }

    /// Empty history that keeps at most `max_entries` actions (at least one).
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries.max(1)),
            ..Self::new()
        }
    }

    /// Change the entry limit. Oldest entries are dropped right away if the
    /// log is already over it.
    pub fn set_capacity(&mut self, max_entries: Option<usize>) {
        self.max_entries = max_entries.map(|n| n.max(1));
        self.enforce_capacity();
    }

    pub fn capacity_limit(&self) -> Option<usize> {
        self.max_entries
    }

    /// Stamp and append an action, discarding everything that was undone.
    pub fn record(&mut self, new: NewAction<P>) -> &Action<P> {
        let discarded = self.entries.len() - self.applied;
        self.entries.truncate(self.applied);
        self.entries.push(Action::stamp(new));
        self.applied = self.entries.len();
        self.enforce_capacity();

        let action = &self.entries[self.applied - 1];
        debug!(
            id = %action.id,
            kind = %action.kind,
            resource = %action.resource,
            discarded,
            "recorded action"
        );
        action
    }

    /// Step the cursor back and return the action that should be reversed.
    /// `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<&Action<P>> {
        let index = self.applied.checked_sub(1)?;
        self.applied = index;
        let action = &self.entries[index];
        debug!(id = %action.id, cursor = ?self.cursor(), "undo");
        Some(action)
    }

    /// Step the cursor forward and return the action that should be replayed.
    /// `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<&Action<P>> {
        if !self.can_redo() {
            return None;
        }
        let index = self.applied;
        self.applied += 1;
        let action = &self.entries[index];
        debug!(id = %action.id, cursor = ?self.cursor(), "redo");
        Some(action)
    }

    /// Forget every action. Cannot be undone.
    pub fn clear(&mut self) {
        debug!(dropped = self.entries.len(), "history cleared");
        self.entries.clear();
        self.applied = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// Index of the last applied entry, `None` when nothing is applied.
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in chronological order, including undone ones.
    pub fn entries(&self) -> &[Action<P>] {
        &self.entries
    }

    pub fn applied(&self) -> &[Action<P>] {
        &self.entries[..self.applied]
    }

    pub fn pending_redo(&self) -> &[Action<P>] {
        &self.entries[self.applied..]
    }

    /// What the next [`undo`](Self::undo) would return, without moving.
    pub fn peek_undo(&self) -> Option<&Action<P>> {
        self.applied().last()
    }

    /// What the next [`redo`](Self::redo) would return, without moving.
    pub fn peek_redo(&self) -> Option<&Action<P>> {
        self.pending_redo().first()
    }

    fn enforce_capacity(&mut self) {
        let Some(limit) = self.max_entries else {
            return;
        };
        if self.entries.len() <= limit {
            return;
        }
        // Oldest applied entries go first; undone entries are only cut from
        // the end so redo still replays them in order.
        let excess = self.entries.len() - limit;
        let from_front = excess.min(self.applied);
        self.entries.drain(..from_front);
        self.applied -= from_front;
        self.entries.truncate(limit);
        debug!(excess, from_front, limit, "dropped history entries over limit");
    }
}
