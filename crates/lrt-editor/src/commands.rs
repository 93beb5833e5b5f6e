//! Undo/Redo command stack.
//!
//! Every command records value snapshots of the session taken before and
//! after it ran, so undo and redo simply restore one or the other.
//!
//! Drag gestures are batched: `begin_batch` captures the state once, every
//! mutation until `end_batch` is applied live, and the whole gesture lands
//! on the stack as a single step.

use crate::sync::{Change, EditError, Mutation, Session, Snapshot};

/// Default undo depth.
pub const DEFAULT_DEPTH: usize = 100;

#[derive(Debug, Clone)]
struct Command {
    before: Snapshot,
    after: Snapshot,
    description: String,
}

/// Manages undo/redo stacks with batch grouping for drag gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Snapshot captured at the start of a batch.
    batch_snapshot: Option<Snapshot>,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(DEFAULT_DEPTH)),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// Start a batch group.
    pub fn begin_batch(&mut self, session: &Session) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(session.snapshot());
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and the state
    /// actually changed, push one command covering the whole batch.
    pub fn end_batch(&mut self, session: &Session, description: &str) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        let Some(before) = self.batch_snapshot.take() else {
            return;
        };
        let after = session.snapshot();
        if before != after {
            self.push(Command {
                before,
                after,
                description: description.to_string(),
            });
        }
    }

    /// Apply `mutation` to the session and record it. A failed mutation is
    /// not recorded.
    pub fn execute(
        &mut self,
        session: &mut Session,
        mutation: Mutation,
        description: &str,
    ) -> Result<Change, EditError> {
        if self.batch_depth > 0 {
            return session.apply(mutation);
        }

        let before = session.snapshot();
        let change = session.apply(mutation)?;
        self.push(Command {
            before,
            after: session.snapshot(),
            description: description.to_string(),
        });
        Ok(change)
    }

    /// Undo the last command, returning its description.
    pub fn undo(&mut self, session: &mut Session) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        session.restore(cmd.before.clone());
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command, returning its description.
    pub fn redo(&mut self, session: &mut Session) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        session.restore(cmd.after.clone());
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.description.as_str())
    }

    fn push(&mut self, cmd: Command) {
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }
}
