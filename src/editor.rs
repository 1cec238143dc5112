//! Editor facade.
//!
//! `Editor` owns one [`GraphModel`] and its [`CommandStack`] and exposes the
//! entry points a UI calls: `cmd_*` methods build an undoable edit and push
//! it, while focus and error marks go straight to the model because they are
//! not part of the undo history.

use crate::command::composite;
use crate::command::{
    AddNode, Clock, Command, CommandStack, ConnectPlugs, DetachPlug, MoveNodes, RenameNode,
    SetIgnored, SetMultipleNodeParameters, SetNodeParameter, SetViewing, SystemClock,
};
use crate::config::EditorConfig;
use crate::error::{Result, ResultExt};
use crate::graph::{
    EventBridge, GraphEvent, GraphModel, GraphResult, ParamValue, PlugRef, Point, RenderHooks,
    Script, TypeRegistry,
};
use std::path::Path;

/// Keyboard nudge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Up,
    Down,
    Left,
    Right,
}

impl Nudge {
    fn unit(self) -> (f64, f64) {
        match self {
            Nudge::Up => (0.0, -1.0),
            Nudge::Down => (0.0, 1.0),
            Nudge::Left => (-1.0, 0.0),
            Nudge::Right => (1.0, 0.0),
        }
    }
}

pub struct Editor {
    model: GraphModel,
    stack: CommandStack,
    clock: Box<dyn Clock>,
    config: EditorConfig,
}

impl Editor {
    pub fn new(types: TypeRegistry, config: EditorConfig) -> Self {
        let model = GraphModel::new(types).with_node_extent(config.node_extent());
        let stack = CommandStack::new()
            .with_merge_window(config.merge_window())
            .with_max_depth(config.history.max_depth);
        Self {
            model,
            stack,
            clock: Box::new(SystemClock::new()),
            config,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_renderer(mut self, renderer: impl RenderHooks + 'static) -> Self {
        self.model.set_renderer(renderer);
        self
    }

    /// Route model events to a new bridge and return it.
    pub fn subscribe(&mut self) -> EventBridge {
        let (tx, bridge) = EventBridge::new();
        self.model.set_events(tx);
        bridge
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn stack(&self) -> &CommandStack {
        &self.stack
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Tell listeners the editor is set up.
    pub fn announce_ready(&self) {
        tracing::debug!("Editor ready");
        self.model.emit(GraphEvent::Ready);
    }

    fn push(&mut self, cmd: impl Into<Command>) -> Result<()> {
        let cmd = cmd.into();
        let changes_script = cmd.changes_script();
        self.stack.push(&mut self.model, cmd)?;
        if changes_script {
            self.model.emit(GraphEvent::ScriptChanged);
        }
        Ok(())
    }

    /// Run a composite builder and announce the structural change.
    fn composite<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut CommandStack, &mut GraphModel) -> GraphResult<T>,
    {
        let value = f(&mut self.stack, &mut self.model)?;
        self.model.emit(GraphEvent::ScriptChanged);
        Ok(value)
    }

    // ── Undoable edits ──

    pub fn cmd_add_node(&mut self, name: &str, type_name: &str, at: Point) -> Result<()> {
        let cmd = AddNode::new(&self.model, name, type_name, at)?;
        self.push(cmd)
    }

    /// Add a node with a generated name and return the name.
    pub fn cmd_create_node(&mut self, type_name: &str, at: Point) -> Result<String> {
        self.composite(|stack, model| composite::create_node(stack, model, type_name, at))
    }

    pub fn cmd_create_node_connected(
        &mut self,
        type_name: &str,
        at: Point,
        context: &PlugRef,
    ) -> Result<String> {
        self.composite(|stack, model| {
            composite::create_node_connected(stack, model, type_name, at, context)
        })
    }

    pub fn cmd_create_replacement_node(
        &mut self,
        type_name: &str,
        replace: &str,
        at: Point,
    ) -> Result<String> {
        self.composite(|stack, model| {
            composite::create_replacement_node(stack, model, type_name, replace, at)
        })
    }

    pub fn cmd_delete_node(&mut self, name: &str) -> Result<()> {
        self.composite(|stack, model| composite::delete_node(stack, model, name))
    }

    pub fn cmd_delete_selected(&mut self) -> Result<usize> {
        self.composite(composite::delete_selected)
    }

    pub fn cmd_disconnect_node(&mut self, name: &str, splice: bool) -> Result<()> {
        self.composite(|stack, model| composite::disconnect_node(stack, model, name, splice))
    }

    pub fn cmd_replace_node(&mut self, src: &str, dst: &str) -> Result<()> {
        self.composite(|stack, model| composite::replace_node(stack, model, src, dst))
    }

    pub fn cmd_connect_plugs(&mut self, src: PlugRef, dst: PlugRef) -> Result<()> {
        let cmd = ConnectPlugs::new(&self.model, src, dst)?;
        self.push(cmd)
    }

    /// Finish a cable drag between two plugs, in either order.
    pub fn cmd_drop_cable(&mut self, from: PlugRef, to: PlugRef) -> Result<()> {
        self.composite(|stack, model| composite::connect_with_detach(stack, model, from, to))
    }

    pub fn cmd_detach_plug(&mut self, plug: PlugRef) -> Result<()> {
        let cmd = DetachPlug::new(&self.model, plug)?;
        self.push(cmd)
    }

    pub fn cmd_toggle_ignored(&mut self, name: &str) -> Result<()> {
        let cmd = SetIgnored::toggle(&self.model, name)?;
        self.push(cmd)
    }

    pub fn cmd_toggle_viewing(&mut self, name: &str) -> Result<()> {
        let cmd = SetViewing::toggle(&self.model, name)?;
        self.push(cmd)
    }

    pub fn cmd_set_parameter(&mut self, node: &str, param: &str, value: ParamValue) -> Result<()> {
        let now = self.clock.now();
        let cmd = SetNodeParameter::new(&self.model, node, param, value, now)?;
        self.push(cmd)
    }

    pub fn cmd_set_multiple_parameters<I>(&mut self, node: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, ParamValue)>,
    {
        let now = self.clock.now();
        let cmd = SetMultipleNodeParameters::new(&self.model, node, values, now)?;
        self.push(cmd)
    }

    pub fn cmd_move_nodes_by(&mut self, names: Vec<String>, dx: f64, dy: f64) -> Result<()> {
        let cmd = MoveNodes::new(&self.model, names, dx, dy)?;
        self.push(cmd)
    }

    /// Move the focussed nodes one keyboard step. No-op without a selection.
    pub fn cmd_nudge_selected(&mut self, direction: Nudge, fine: bool) -> Result<()> {
        let selected = self.model.selected_nodes();
        if selected.is_empty() {
            return Ok(());
        }
        let step = self.config.nudge_step(fine);
        let (ux, uy) = direction.unit();
        self.cmd_move_nodes_by(selected, ux * step, uy * step)
    }

    pub fn cmd_rename_node(&mut self, old: &str, new: &str) -> Result<()> {
        let cmd = RenameNode::new(&self.model, old, new)?;
        self.push(cmd)
    }

    pub fn cmd_layout_nodes<I>(&mut self, positions: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, Point)>,
    {
        composite::layout_nodes(&mut self.stack, &mut self.model, positions)?;
        Ok(())
    }

    // ── History ──

    pub fn undo(&mut self) -> Result<bool> {
        let changes_script = self.stack.peek_undo().is_some_and(Command::changes_script);
        let undone = self.stack.undo(&mut self.model)?;
        if undone && changes_script {
            self.model.emit(GraphEvent::ScriptChanged);
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let changes_script = self.stack.peek_redo().is_some_and(Command::changes_script);
        let redone = self.stack.redo(&mut self.model)?;
        if redone && changes_script {
            self.model.emit(GraphEvent::ScriptChanged);
        }
        Ok(redone)
    }

    // ── Scripts ──

    /// Replace the graph with `script` and reset the history.
    pub fn load_script(&mut self, script: &Script) -> Result<()> {
        self.model
            .load_script(script)
            .context("Failed to load script")?;
        self.stack.clear();
        Ok(())
    }

    pub fn load_script_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let script = read_script(path).with_context(|| format!("Reading {}", path.display()))?;
        self.load_script(&script)
    }

    pub fn build_script(&self) -> Script {
        self.model.build_script()
    }

    pub fn save_script_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.build_script().to_json_pretty()?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn clear_script(&mut self) {
        self.model.clear_script();
        self.stack.clear();
    }

    // ── Selection and transient state ──

    pub fn focus_node(&mut self, name: &str) -> Result<()> {
        Ok(self.model.focus_exclusive(name)?)
    }

    pub fn toggle_focus(&mut self, name: &str) -> Result<()> {
        Ok(self.model.toggle_focussed(name)?)
    }

    pub fn select_all(&mut self) {
        self.model.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.model.deselect_all();
    }

    pub fn eval_node(&self) -> Option<&str> {
        self.model.eval_node()
    }

    pub fn set_node_errored(&mut self, name: &str, message: Option<String>) {
        self.model.set_node_errored(name, message);
    }

    pub fn clear_errors(&mut self) {
        self.model.clear_errors();
    }
}

fn read_script(path: &Path) -> Result<Script> {
    let content = std::fs::read_to_string(path)?;
    Ok(Script::from_json(&content)?)
}
