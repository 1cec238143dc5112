//! Undoable edits and the history that records them.
//!
//! UI actions build a [`Command`] against the current model and hand it to
//! [`CommandStack::push`], which applies it and records it. The
//! [`composite`] builders group primitives into single undo steps.

pub mod clock;
pub mod composite;
pub mod edits;
pub mod kind;
pub mod stack;

pub use clock::{Clock, ManualClock, SystemClock};
pub use edits::{
    AddNode, ConnectPlugs, DeleteNode, DetachPlug, MoveNodes, ParamChange, RenameNode, SetIgnored,
    SetMultipleNodeParameters, SetNodeParameter, SetViewing,
};
pub use kind::{Command, MacroCommand, UndoCommand};
pub use stack::{CommandStack, DEFAULT_MERGE_WINDOW};
