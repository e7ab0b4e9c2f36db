use crate::document::{Document, Snapshot};
use crate::error::EditorResult;

/// Snapshot-based undo/redo.
///
/// Every content-changing action calls [`History::record_before_action`]
/// before it touches the document, so each entry is one discrete user action.
#[derive(Debug, Default)]
pub struct History {
    /// States to go back to
    undo_stack: Vec<Snapshot>,
    /// States undone and available again
    redo_stack: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the document's current state and drop the redo branch.
    ///
    /// On error neither stack changes and the caller must not go on with
    /// the action.
    pub fn record_before_action(&mut self, document: &Document) -> EditorResult<()> {
        let snapshot = document.serialize()?;
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        log::debug!("History recorded, undo depth {}", self.undo_stack.len());
        Ok(())
    }

    /// Step back one action. Returns `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self, document: &mut Document) -> EditorResult<bool> {
        Self::step(&mut self.undo_stack, &mut self.redo_stack, document, "undo")
    }

    /// Re-apply one undone action. Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, document: &mut Document) -> EditorResult<bool> {
        Self::step(&mut self.redo_stack, &mut self.undo_stack, document, "redo")
    }

    fn step(
        from: &mut Vec<Snapshot>,
        to: &mut Vec<Snapshot>,
        document: &mut Document,
        label: &str,
    ) -> EditorResult<bool> {
        let Some(target) = from.last() else {
            log::debug!("Nothing to {label}");
            return Ok(false);
        };

        // Stacks only change once both the save and the restore succeeded.
        let current = document.serialize()?;
        document
            .restore(target)
            .inspect_err(|err| log::error!("Failed to {label}: {err}"))?;
        from.pop();
        to.push(current);
        log::info!("{label} applied, {} more available", from.len());
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
