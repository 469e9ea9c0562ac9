//! Undo/redo history of reversible actions.

use futures::future::LocalBoxFuture;

use crate::managers::annotation::AnnotationManager;

/// Reversible mutation of the annotation store.
///
/// An action owns the snapshots it needs to invert itself. Both directions report whether the
/// mutation (including persistence) went through; a `false` leaves the store as it was.
pub trait Action {
    /// Short description used in logs.
    fn label(&self) -> &str;

    /// Perform the mutation.
    fn apply<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool>;

    /// Reverse a previously successful [`Action::apply`].
    fn undo<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool>;
}

/// Bounded history of applied actions plus the redo stack.
pub struct ActionManager {
    /// Most recent last.
    undo_stack: Vec<Box<dyn Action>>,
    /// Most recent last.
    redo_stack: Vec<Box<dyn Action>>,
    limit: usize,
}

impl std::fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionManager")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl ActionManager {
    /// Empty history keeping at most `limit` actions (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    fn push(&mut self, action: Box<dyn Action>) {
        self.redo_stack.clear();
        self.undo_stack.push(action);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Apply `action`; it enters the history only when it succeeds.
    #[tracing::instrument(skip_all, fields(action = action.label()))]
    pub async fn commit(
        &mut self,
        mut action: Box<dyn Action>,
        annotations: &mut AnnotationManager,
    ) -> bool {
        if !action.apply(annotations).await {
            tracing::debug!("action failed, not recorded");
            return false;
        }
        self.push(action);
        true
    }

    /// Undo the most recent action. A failed undo keeps the action on the undo stack.
    pub async fn undo(&mut self, annotations: &mut AnnotationManager) -> bool {
        let Some(mut action) = self.undo_stack.pop() else {
            return false;
        };
        if action.undo(annotations).await {
            tracing::debug!(action = action.label(), "undone");
            self.redo_stack.push(action);
            true
        } else {
            tracing::warn!(action = action.label(), "undo failed");
            self.undo_stack.push(action);
            false
        }
    }

    /// Re-apply the most recently undone action.
    pub async fn redo(&mut self, annotations: &mut AnnotationManager) -> bool {
        let Some(mut action) = self.redo_stack.pop() else {
            return false;
        };
        if action.apply(annotations).await {
            tracing::debug!(action = action.label(), "redone");
            self.undo_stack.push(action);
            true
        } else {
            tracing::warn!(action = action.label(), "redo failed");
            self.redo_stack.push(action);
            false
        }
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Return `true` when there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Return `true` when there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable actions.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable actions.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/actions/manager.rs"]
mod tests;
