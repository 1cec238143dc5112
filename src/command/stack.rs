//! Undo/redo history with macro grouping and merging.
//!
//! ```text
//!   history: [c0, c1, c2]   <- cursor ->   redo_tail: [c4, c3]
//! ```
//!
//! `push` applies the command, then either folds it into the newest history
//! entry (see [`UndoCommand::try_merge`]) or appends it. Any push clears the
//! redo tail.

use crate::command::kind::{Command, MacroCommand, UndoCommand};
use crate::graph::{GraphError, GraphModel, GraphResult};
use std::time::Duration;

/// Default window within which parameter edits coalesce.
pub const DEFAULT_MERGE_WINDOW: Duration = Duration::from_millis(200);

#[derive(Debug)]
pub struct CommandStack {
    history: Vec<Command>,
    redo_tail: Vec<Command>,
    open_macro: Option<MacroCommand>,
    merge_window: Duration,
    /// 0 means unlimited.
    max_depth: usize,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStack {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            redo_tail: Vec::new(),
            open_macro: None,
            merge_window: DEFAULT_MERGE_WINDOW,
            max_depth: 0,
        }
    }

    pub fn with_merge_window(mut self, window: Duration) -> Self {
        self.merge_window = window;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn merge_window(&self) -> Duration {
        self.merge_window
    }

    /// Apply `cmd` and record it.
    ///
    /// If `forward` fails nothing is recorded and the error propagates.
    /// Inside a macro the command is buffered instead of recorded.
    pub fn push(&mut self, model: &mut GraphModel, cmd: impl Into<Command>) -> GraphResult<()> {
        let cmd = cmd.into();
        cmd.forward(model)?;

        if let Some(open) = self.open_macro.as_mut() {
            open.push(cmd);
            return Ok(());
        }

        self.redo_tail.clear();
        if let Some(top) = self.history.last_mut() {
            if !top.is_macro() && top.try_merge(&cmd, self.merge_window) {
                tracing::trace!("Merged {} into previous entry", cmd.label());
                return Ok(());
            }
        }
        self.history.push(cmd);
        self.trim();
        Ok(())
    }

    /// Reverse the newest entry. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self, model: &mut GraphModel) -> GraphResult<bool> {
        self.ensure_no_macro("undo")?;
        let Some(cmd) = self.history.pop() else {
            return Ok(false);
        };
        if let Err(e) = cmd.reverse(model) {
            self.history.push(cmd);
            return Err(e);
        }
        self.redo_tail.push(cmd);
        Ok(true)
    }

    /// Re-apply the most recently undone entry.
    pub fn redo(&mut self, model: &mut GraphModel) -> GraphResult<bool> {
        self.ensure_no_macro("redo")?;
        let Some(cmd) = self.redo_tail.pop() else {
            return Ok(false);
        };
        if let Err(e) = cmd.forward(model) {
            self.redo_tail.push(cmd);
            return Err(e);
        }
        self.history.push(cmd);
        Ok(true)
    }

    fn ensure_no_macro(&self, action: &str) -> GraphResult<()> {
        match &self.open_macro {
            Some(m) => Err(GraphError::Macro(format!(
                "cannot {} while macro {:?} is open",
                action,
                m.label()
            ))),
            None => Ok(()),
        }
    }

    /// Start buffering pushes into one compound entry.
    pub fn begin_macro(&mut self, label: &str) -> GraphResult<()> {
        if let Some(open) = &self.open_macro {
            return Err(GraphError::Macro(format!(
                "cannot begin {:?} inside {:?}",
                label,
                open.label()
            )));
        }
        tracing::trace!("Begin macro {}", label);
        self.open_macro = Some(MacroCommand::new(label));
        Ok(())
    }

    /// Close the open macro and record it. An empty macro records nothing
    /// and returns `false`.
    pub fn end_macro(&mut self) -> GraphResult<bool> {
        let open = self
            .open_macro
            .take()
            .ok_or_else(|| GraphError::Macro("no macro is open".to_string()))?;
        if open.is_empty() {
            tracing::trace!("Discarding empty macro {}", open.label());
            return Ok(false);
        }
        self.redo_tail.clear();
        self.history.push(Command::Macro(open));
        self.trim();
        Ok(true)
    }

    /// Close the open macro, reversing everything it applied.
    pub fn abort_macro(&mut self, model: &mut GraphModel) -> GraphResult<()> {
        let Some(open) = self.open_macro.take() else {
            return Ok(());
        };
        tracing::warn!(
            "Aborting macro {} ({} applied edits rolled back)",
            open.label(),
            open.len()
        );
        open.unwind(model)
    }

    /// Run `f` inside a macro.
    ///
    /// If `f` fails, every edit it pushed is reversed before the error is
    /// returned, so the model is left as it was. When a macro is already
    /// open, `f` joins it and the outermost call owns the rollback.
    pub fn with_macro<T, F>(&mut self, model: &mut GraphModel, label: &str, f: F) -> GraphResult<T>
    where
        F: FnOnce(&mut Self, &mut GraphModel) -> GraphResult<T>,
    {
        if self.in_macro() {
            return f(self, model);
        }
        self.begin_macro(label)?;
        match f(self, model) {
            Ok(value) => {
                self.end_macro()?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", label, e);
                if let Err(rollback) = self.abort_macro(model) {
                    tracing::warn!("Rollback of {} incomplete: {}", label, rollback);
                }
                Err(e)
            }
        }
    }

    /// Drop all history. Used when a new script is loaded.
    pub fn clear(&mut self) {
        self.history.clear();
        self.redo_tail.clear();
        self.open_macro = None;
        tracing::info!("Undo history cleared");
    }

    fn trim(&mut self) {
        if self.max_depth > 0 && self.history.len() > self.max_depth {
            let excess = self.history.len() - self.max_depth;
            self.history.drain(..excess);
            tracing::trace!("Dropped {} oldest history entries", excess);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_tail.is_empty()
    }

    pub fn undo_label(&self) -> Option<String> {
        self.history.last().map(UndoCommand::label)
    }

    pub fn redo_label(&self) -> Option<String> {
        self.redo_tail.last().map(UndoCommand::label)
    }

    /// Number of undoable entries.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_tail.len()
    }

    pub fn in_macro(&self) -> bool {
        self.open_macro.is_some()
    }

    /// The entry `undo` would reverse next.
    pub fn peek_undo(&self) -> Option<&Command> {
        self.history.last()
    }

    /// The entry `redo` would re-apply next.
    pub fn peek_redo(&self) -> Option<&Command> {
        self.redo_tail.last()
    }

    /// Recorded entries, oldest first.
    pub fn history(&self) -> &[Command] {
        &self.history
    }
}
