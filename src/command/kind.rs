//! Command abstraction.
//!
//! Two layers, mirroring each other:
//! - **`UndoCommand` trait**: the uniform `forward` / `reverse` / `try_merge`
//!   interface every edit implements.
//! - **`Command` enum**: closed set of edits the stack stores. Matching on it
//!   keeps dispatch static and lets merge logic inspect the candidate's kind.

use crate::command::edits::{
    AddNode, ConnectPlugs, DeleteNode, DetachPlug, MoveNodes, RenameNode, SetIgnored,
    SetMultipleNodeParameters, SetNodeParameter, SetViewing,
};
use crate::graph::{GraphModel, GraphResult};
use std::time::Duration;

/// A reversible edit over the graph model.
pub trait UndoCommand {
    /// Human-readable name shown in undo/redo menus.
    fn label(&self) -> String;

    /// Apply the edit.
    fn forward(&self, model: &mut GraphModel) -> GraphResult<()>;

    /// Undo the edit. Must restore the state `forward` started from.
    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()>;

    /// Absorb `candidate` into `self`. Only called on the newest history
    /// entry, after `candidate` has already been applied.
    fn try_merge(&mut self, _candidate: &Command, _window: Duration) -> bool {
        false
    }
}

/// Every edit the stack can record.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode(AddNode),
    DeleteNode(DeleteNode),
    ConnectPlugs(ConnectPlugs),
    DetachPlug(DetachPlug),
    SetIgnored(SetIgnored),
    SetViewing(SetViewing),
    SetNodeParameter(SetNodeParameter),
    SetMultipleNodeParameters(SetMultipleNodeParameters),
    MoveNodes(MoveNodes),
    RenameNode(RenameNode),
    Macro(MacroCommand),
}

macro_rules! dispatch {
    ($self:expr, $cmd:ident => $body:expr) => {
        match $self {
            Command::AddNode($cmd) => $body,
            Command::DeleteNode($cmd) => $body,
            Command::ConnectPlugs($cmd) => $body,
            Command::DetachPlug($cmd) => $body,
            Command::SetIgnored($cmd) => $body,
            Command::SetViewing($cmd) => $body,
            Command::SetNodeParameter($cmd) => $body,
            Command::SetMultipleNodeParameters($cmd) => $body,
            Command::MoveNodes($cmd) => $body,
            Command::RenameNode($cmd) => $body,
            Command::Macro($cmd) => $body,
        }
    };
}

impl Command {
    /// Whether the edit changes what the pipeline computes. Moves only
    /// change layout.
    pub fn changes_script(&self) -> bool {
        match self {
            Command::MoveNodes(_) => false,
            Command::Macro(m) => m.commands().iter().any(Command::changes_script),
            _ => true,
        }
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Command::Macro(_))
    }
}

impl UndoCommand for Command {
    fn label(&self) -> String {
        dispatch!(self, c => c.label())
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        tracing::debug!("Forward: {}", self.label());
        dispatch!(self, c => c.forward(model))
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        tracing::debug!("Reverse: {}", self.label());
        dispatch!(self, c => c.reverse(model))
    }

    fn try_merge(&mut self, candidate: &Command, window: Duration) -> bool {
        dispatch!(self, c => c.try_merge(candidate, window))
    }
}

macro_rules! impl_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Command {
                fn from(cmd: $variant) -> Self {
                    Command::$variant(cmd)
                }
            }
        )*
    };
}

impl_from!(
    AddNode,
    DeleteNode,
    ConnectPlugs,
    DetachPlug,
    SetIgnored,
    SetViewing,
    SetNodeParameter,
    SetMultipleNodeParameters,
    MoveNodes,
    RenameNode,
);

impl From<MacroCommand> for Command {
    fn from(cmd: MacroCommand) -> Self {
        Command::Macro(cmd)
    }
}

/// A group of edits undone and redone as one step.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCommand {
    label: String,
    commands: Vec<Command>,
}

impl MacroCommand {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Reverse every recorded sub-edit, newest first, consuming the macro.
    ///
    /// Keeps going past failures so as much state as possible is restored;
    /// the first error is returned.
    pub(crate) fn unwind(self, model: &mut GraphModel) -> GraphResult<()> {
        let mut first_err = None;
        for cmd in self.commands.iter().rev() {
            if let Err(e) = cmd.reverse(model) {
                tracing::warn!("Failed to reverse {} during rollback: {}", cmd.label(), e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl UndoCommand for MacroCommand {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        for (i, cmd) in self.commands.iter().enumerate() {
            if let Err(e) = cmd.forward(model) {
                for applied in self.commands[..i].iter().rev() {
                    if let Err(rollback) = applied.reverse(model) {
                        tracing::warn!(
                            "Failed to reverse {} during rollback: {}",
                            applied.label(),
                            rollback
                        );
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        for (i, cmd) in self.commands.iter().enumerate().rev() {
            if let Err(e) = cmd.reverse(model) {
                for reversed in &self.commands[i + 1..] {
                    if let Err(rollback) = reversed.forward(model) {
                        tracing::warn!(
                            "Failed to reapply {} during rollback: {}",
                            reversed.label(),
                            rollback
                        );
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }
}
