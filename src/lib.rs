//! # nodetree-rs: undoable node-graph editing
//!
//! The model and command engine behind a visual pipeline editor. Users
//! assemble typed processing nodes connected by cables; every edit is
//! undoable, rapid repeated edits coalesce into one undo step, and compound
//! edits are grouped into macros.
//!
//! ## Architecture
//!
//! - **Graph**: [`graph::GraphModel`] owns nodes, plugs and cables and
//!   enforces the graph invariants. Rendering is delegated through
//!   [`graph::RenderHooks`]; UI notifications go out over a crossbeam channel.
//! - **Commands**: [`command::Command`] variants are reversible edits,
//!   recorded by [`command::CommandStack`] with merge and macro support.
//! - **Editor**: [`editor::Editor`] ties a model, a stack and a clock together
//!   behind the `cmd_*` entry points a UI calls.
//! - **Scripts**: the JSON script format is loaded and rebuilt by
//!   [`graph::GraphModel::load_script`] and [`graph::GraphModel::build_script`].
//!
//! ## Configuration
//!
//! Editor settings are read from `editor.toml` in the platform data directory
//! under `dev.nodetree.nodetree-rs` (see [`config`]).
//!
//! ## Example
//!
//! ```ignore
//! use nodetree_rs::{config::EditorConfig, graph::{Point, TypeRegistry}, Editor};
//!
//! let types = TypeRegistry::from_json(&std::fs::read_to_string("types.json")?)?;
//! let mut editor = Editor::new(types, EditorConfig::load_or_default());
//! editor.load_script_file("script.json")?;
//!
//! let name = editor.cmd_create_node("ocropus.Binarize", Point::new(200.0, 120.0))?;
//! editor.cmd_toggle_viewing(&name)?;
//! editor.undo()?;
//! ```

pub mod command;
pub mod config;
pub mod editor;
pub mod error;
pub mod graph;

// Re-export commonly used types
pub use command::{Command, CommandStack, UndoCommand};
pub use config::EditorConfig;
pub use editor::{Editor, Nudge};
pub use error::{NodeTreeError, Result, ResultExt};
pub use graph::{GraphError, GraphModel, PlugRef, Script, TypeRegistry};
