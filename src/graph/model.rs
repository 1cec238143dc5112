//! The graph model: single source of truth for nodes and cables.
//!
//! `GraphModel` owns the type registry, the node registry (name index and
//! registration order in one `IndexMap`) and every cable. It never initiates
//! edits on its own; commands drive it, and every mutation validates its
//! preconditions before touching any state.
//!
//! # Invariants
//!
//! - Node names are unique.
//! - An input holds at most one cable.
//! - At most one node is `viewing`.

use crate::graph::error::{GraphError, GraphResult};
use crate::graph::events::{EventSender, GraphEvent};
use crate::graph::id::PlugRef;
use crate::graph::namer::NodeNamer;
use crate::graph::node::{Node, Point};
use crate::graph::node_type::TypeRegistry;
use crate::graph::plug::{Cable, InputPlug, PlugDirection};
use crate::graph::render::{NullRenderer, RenderHooks};
use crate::graph::value::ParamValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Stage whose nodes are preferred for evaluation when nothing is viewed or focussed.
pub const RECOGNIZE_STAGE: &str = "recognize";

/// Minimum viewport zoom accepted from scripts.
pub const MIN_VIEWPORT_SCALE: f64 = 0.1;

/// A resolved plug.
#[derive(Debug, Clone, Copy)]
pub enum Plug<'a> {
    Input { node: &'a Node, plug: &'a InputPlug },
    Output { node: &'a Node },
}

impl<'a> Plug<'a> {
    pub fn node(&self) -> &'a Node {
        match self {
            Plug::Input { node, .. } | Plug::Output { node } => node,
        }
    }

    pub fn direction(&self) -> PlugDirection {
        match self {
            Plug::Input { .. } => PlugDirection::Input,
            Plug::Output { .. } => PlugDirection::Output,
        }
    }
}

/// Nominal node size, used to centre nodes on a drop point and for bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeExtent {
    pub width: f64,
    pub height: f64,
}

impl Default for NodeExtent {
    fn default() -> Self {
        Self {
            width: 150.0,
            height: 30.0,
        }
    }
}

/// Canvas pan/zoom, persisted in the script's metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Replace non-finite values with defaults and clamp the zoom.
    pub fn sanitized(self) -> Self {
        let finite_or = |v: f64, d: f64| if v.is_finite() { v } else { d };
        Self {
            x: finite_or(self.x, 0.0),
            y: finite_or(self.y, 0.0),
            scale: finite_or(self.scale, 1.0).max(MIN_VIEWPORT_SCALE),
        }
    }
}

/// Axis-aligned bounds of all nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// The node graph.
pub struct GraphModel {
    types: TypeRegistry,
    nodes: IndexMap<String, Node>,
    extent: NodeExtent,
    viewport: Viewport,
    renderer: Box<dyn RenderHooks>,
    events: Option<EventSender>,
}

impl GraphModel {
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types,
            nodes: IndexMap::new(),
            extent: NodeExtent::default(),
            viewport: Viewport::default(),
            renderer: Box::new(NullRenderer),
            events: None,
        }
    }

    pub fn with_renderer(mut self, renderer: impl RenderHooks + 'static) -> Self {
        self.set_renderer(renderer);
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.set_events(events);
        self
    }

    pub fn set_renderer(&mut self, renderer: impl RenderHooks + 'static) {
        self.renderer = Box::new(renderer);
    }

    pub fn set_events(&mut self, events: EventSender) {
        self.events = Some(events);
    }

    pub fn with_node_extent(mut self, extent: NodeExtent) -> Self {
        self.extent = extent;
        self
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn extent(&self) -> NodeExtent {
        self.extent
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn load_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport.sanitized();
    }

    pub(crate) fn emit(&self, event: GraphEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    // ── Node registry ──

    /// Build an unregistered node of `type_name` at the origin.
    ///
    /// Fails before allocating anything if the name is taken.
    pub fn create_node(&self, name: &str, type_name: &str) -> GraphResult<Node> {
        if self.nodes.contains_key(name) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        let node_type = self.types.get(type_name)?;
        Ok(Node::new(name, node_type))
    }

    /// Add a node to the name index and the ordered node list.
    pub fn register_node(&mut self, node: Node) -> GraphResult<()> {
        if self.nodes.contains_key(node.name()) {
            return Err(GraphError::DuplicateName(node.name().to_string()));
        }
        if node.is_viewing() {
            self.clear_viewing_except(node.name());
        }
        self.renderer.node_created(&node);
        for input in node.inputs() {
            if let Some(source) = input.source() {
                self.renderer
                    .cable_attached(source, &PlugRef::input(node.name(), input.index()));
            }
        }
        tracing::trace!("Registered node {}", node.name());
        self.nodes.insert(node.name().to_string(), node);
        Ok(())
    }

    /// Remove a node from the registry and hand it back.
    ///
    /// Cables on other nodes that originate here are left in place; callers
    /// that want a clean removal detach them first.
    pub fn unregister_node(&mut self, name: &str) -> GraphResult<Node> {
        let node = self
            .nodes
            .shift_remove(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))?;
        for input in node.inputs().iter().filter(|p| p.is_attached()) {
            self.renderer
                .cable_detached(&PlugRef::input(name, input.index()));
        }
        self.renderer.node_removed(name);
        tracing::trace!("Unregistered node {}", name);
        Ok(node)
    }

    pub fn node(&self, name: &str) -> GraphResult<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
    }

    fn node_mut(&mut self, name: &str) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Remove every node.
    pub fn clear_script(&mut self) {
        for name in self.nodes.keys() {
            self.renderer.node_removed(name);
        }
        let count = self.nodes.len();
        self.nodes.clear();
        tracing::info!("Cleared script ({} nodes)", count);
        self.emit(GraphEvent::ScriptCleared);
    }

    /// Swap in a fully built node set. Used by script loading.
    pub(crate) fn replace_nodes(&mut self, nodes: IndexMap<String, Node>) {
        self.nodes = nodes;
        for node in self.nodes.values() {
            self.renderer.node_created(node);
        }
        for node in self.nodes.values() {
            for input in node.inputs() {
                if let Some(source) = input.source() {
                    self.renderer
                        .cable_attached(source, &PlugRef::input(node.name(), input.index()));
                }
            }
        }
    }

    // ── Plugs and cables ──

    /// Resolve a plug reference against the current nodes.
    pub fn get_plug(&self, plug: &PlugRef) -> GraphResult<Plug<'_>> {
        let node = self.node(&plug.node)?;
        match (plug.direction, plug.index) {
            (PlugDirection::Output, None) => Ok(Plug::Output { node }),
            (PlugDirection::Input, Some(index)) => node
                .input(index)
                .map(|input| Plug::Input { node, plug: input })
                .ok_or_else(|| GraphError::UnknownPlug(plug.to_string())),
            _ => Err(GraphError::InvalidPlugReference(plug.to_string())),
        }
    }

    /// Check that a cable from `src` to `dst` could be run right now.
    pub fn validate_connection(&self, src: &PlugRef, dst: &PlugRef) -> GraphResult<()> {
        if !matches!(self.get_plug(src)?, Plug::Output { .. }) {
            return Err(GraphError::InvalidConnection(format!(
                "{} is not an output",
                src
            )));
        }
        match self.get_plug(dst)? {
            Plug::Input { plug, .. } if plug.is_attached() => {
                return Err(GraphError::InvalidConnection(format!(
                    "{} is already attached",
                    dst
                )));
            }
            Plug::Input { .. } => {}
            Plug::Output { .. } => {
                return Err(GraphError::InvalidConnection(format!(
                    "{} is not an input",
                    dst
                )));
            }
        }
        if src.node == dst.node {
            return Err(GraphError::InvalidConnection(format!(
                "cannot connect {} to its own input",
                src.node
            )));
        }
        Ok(())
    }

    /// Run a cable from the output `src` to the input `dst`.
    ///
    /// `dst` must be unattached; replacing a cable means detaching first.
    pub fn connect_plugs(&mut self, src: &PlugRef, dst: &PlugRef) -> GraphResult<()> {
        self.validate_connection(src, dst)?;

        let index = dst.index.unwrap_or_default();
        let input = self
            .node_mut(&dst.node)?
            .input_mut(index)
            .ok_or_else(|| GraphError::UnknownPlug(dst.to_string()))?;
        input.attach(Cable::new(src.node.clone()));
        self.renderer.cable_attached(&src.node, dst);
        tracing::trace!("Connected {} -> {}", src, dst);
        Ok(())
    }

    /// Remove the cable into `dst`, returning it.
    pub fn detach_plug(&mut self, dst: &PlugRef) -> GraphResult<Cable> {
        match self.get_plug(dst)? {
            Plug::Input { plug, .. } if !plug.is_attached() => {
                return Err(GraphError::MissingAttachment(dst.to_string()));
            }
            Plug::Input { .. } => {}
            Plug::Output { .. } => {
                return Err(GraphError::InvalidConnection(format!(
                    "cannot detach output {}",
                    dst
                )));
            }
        }

        let index = dst.index.unwrap_or_default();
        let cable = self
            .node_mut(&dst.node)?
            .input_mut(index)
            .and_then(InputPlug::detach)
            .ok_or_else(|| GraphError::MissingAttachment(dst.to_string()))?;
        self.renderer.cable_detached(dst);
        tracing::trace!("Detached {} (was fed by {})", dst, cable.source);
        Ok(cable)
    }

    /// Every input fed by `output`, found by scanning all nodes.
    pub fn attached_inputs(&self, output: &PlugRef) -> GraphResult<Vec<PlugRef>> {
        if !matches!(self.get_plug(output)?, Plug::Output { .. }) {
            return Err(GraphError::InvalidPlugReference(output.to_string()));
        }
        Ok(self
            .nodes
            .values()
            .flat_map(|node| {
                node.inputs()
                    .iter()
                    .filter(|input| input.source() == Some(output.node.as_str()))
                    .map(move |input| PlugRef::input(node.name(), input.index()))
            })
            .collect())
    }

    /// Every cable as `(source node, destination input)`, in node order.
    pub fn cables(&self) -> Vec<(String, PlugRef)> {
        self.nodes
            .values()
            .flat_map(|node| {
                node.inputs().iter().filter_map(move |input| {
                    input
                        .source()
                        .map(|src| (src.to_string(), PlugRef::input(node.name(), input.index())))
                })
            })
            .collect()
    }

    // ── Naming ──

    pub fn new_node_name(&self, type_name: &str) -> String {
        NodeNamer::new_node_name(type_name, |n| self.nodes.contains_key(n))
    }

    pub fn is_valid_node_name(&self, candidate: &str, original: Option<&str>) -> bool {
        NodeNamer::is_valid_node_name(candidate, original, |n| self.nodes.contains_key(n))
    }

    /// Check a rename without applying it.
    pub fn validate_rename(&self, old: &str, new: &str) -> GraphResult<()> {
        self.node(old)?;
        if old != new && self.nodes.contains_key(new) {
            return Err(GraphError::DuplicateName(new.to_string()));
        }
        if !self.is_valid_node_name(new, Some(old)) {
            return Err(GraphError::InvalidNodeName(new.to_string()));
        }
        Ok(())
    }

    /// Rename a node in place, keeping its registration slot and rewiring
    /// every cable that originates from it.
    pub fn rename_node(&mut self, old: &str, new: &str) -> GraphResult<()> {
        self.validate_rename(old, new)?;
        if old == new {
            return Ok(());
        }
        let (index, _, mut node) = self
            .nodes
            .shift_remove_full(old)
            .ok_or_else(|| GraphError::UnknownNode(old.to_string()))?;
        node.set_name(new);
        self.nodes.shift_insert(index, new.to_string(), node);
        for node in self.nodes.values_mut() {
            for input in node.inputs_mut() {
                input.retarget(old, new);
            }
        }
        self.renderer.node_renamed(old, new);
        tracing::debug!("Renamed node {} -> {}", old, new);
        Ok(())
    }

    // ── Node state ──

    /// Set an existing parameter, returning the previous value.
    pub fn set_parameter(
        &mut self,
        node: &str,
        param: &str,
        value: ParamValue,
    ) -> GraphResult<ParamValue> {
        self.node_mut(node)?.set_parameter(param, value)
    }

    pub fn move_node_to(&mut self, name: &str, position: Point) -> GraphResult<()> {
        self.node_mut(name)?.move_to(position);
        self.node_moved(name, position);
        Ok(())
    }

    pub fn move_node_by(&mut self, name: &str, dx: f64, dy: f64) -> GraphResult<()> {
        let node = self.node_mut(name)?;
        node.move_by(dx, dy);
        let position = node.position();
        self.node_moved(name, position);
        Ok(())
    }

    fn node_moved(&mut self, name: &str, position: Point) {
        self.renderer.node_moved(name, position);
        self.emit(GraphEvent::NodeMoved {
            name: name.to_string(),
            x: position.x,
            y: position.y,
        });
    }

    pub fn set_ignored(&mut self, name: &str, ignored: bool) -> GraphResult<()> {
        self.node_mut(name)?.set_ignored(ignored);
        self.state_changed(name);
        Ok(())
    }

    /// Set the viewing flag. Turning it on clears it everywhere else and
    /// returns the node that lost it.
    pub fn set_viewing(&mut self, name: &str, viewing: bool) -> GraphResult<Option<String>> {
        self.node(name)?;
        let previous = if viewing {
            self.clear_viewing_except(name)
        } else {
            None
        };
        self.node_mut(name)?.set_viewing(viewing);
        self.state_changed(name);
        if viewing {
            self.emit(GraphEvent::NodeViewing(name.to_string()));
        }
        Ok(previous)
    }

    fn clear_viewing_except(&mut self, keep: &str) -> Option<String> {
        let previous = self
            .nodes
            .values()
            .find(|n| n.is_viewing() && n.name() != keep)
            .map(|n| n.name().to_string());
        if let Some(prev) = &previous {
            if let Some(node) = self.nodes.get_mut(prev) {
                node.set_viewing(false);
            }
            self.state_changed(prev);
        }
        previous
    }

    pub fn viewing_node(&self) -> Option<&Node> {
        self.nodes.values().find(|n| n.is_viewing())
    }

    pub fn set_focussed(&mut self, name: &str, focussed: bool) -> GraphResult<()> {
        self.node_mut(name)?.set_focussed(focussed);
        self.state_changed(name);
        Ok(())
    }

    /// Single-select: focus `name` and unfocus everything else.
    pub fn focus_exclusive(&mut self, name: &str) -> GraphResult<()> {
        self.node(name)?;
        let others: Vec<String> = self
            .nodes
            .values()
            .filter(|n| n.is_focussed() && n.name() != name)
            .map(|n| n.name().to_string())
            .collect();
        for other in &others {
            self.set_focussed(other, false)?;
        }
        self.set_focussed(name, true)?;
        self.emit(GraphEvent::NodeFocussed(Some(name.to_string())));
        Ok(())
    }

    /// Multi-select: flip `name`'s focus, leaving the rest alone.
    pub fn toggle_focussed(&mut self, name: &str) -> GraphResult<()> {
        let focussed = self.node(name)?.is_focussed();
        self.set_focussed(name, !focussed)
    }

    pub fn select_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.set_focussed(true);
        }
    }

    pub fn deselect_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.set_focussed(false);
        }
        self.emit(GraphEvent::NodeFocussed(None));
    }

    /// Names of focussed nodes, in registration order.
    pub fn selected_nodes(&self) -> Vec<String> {
        self.nodes
            .values()
            .filter(|n| n.is_focussed())
            .map(|n| n.name().to_string())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_focussed()).count()
    }

    pub fn focussed_node(&self) -> Option<&Node> {
        self.nodes.values().find(|n| n.is_focussed())
    }

    /// The node whose output should be evaluated: the viewer, else the first
    /// focussed node, else the first recognizer, else the last node.
    pub fn eval_node(&self) -> Option<&str> {
        self.viewing_node()
            .or_else(|| self.focussed_node())
            .or_else(|| self.nodes.values().find(|n| n.stage() == RECOGNIZE_STAGE))
            .or_else(|| self.nodes.values().last())
            .map(Node::name)
    }

    /// Mark a node as failed. Unknown names are ignored: errors usually
    /// arrive asynchronously from the backend after the node may be gone.
    pub fn set_node_errored(&mut self, name: &str, message: Option<String>) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.set_error(message);
            self.state_changed(name);
        }
    }

    pub fn clear_errors(&mut self) {
        let errored: Vec<String> = self
            .nodes
            .values()
            .filter(|n| n.error().is_some())
            .map(|n| n.name().to_string())
            .collect();
        for name in errored {
            self.set_node_errored(&name, None);
        }
    }

    fn state_changed(&mut self, name: &str) {
        if let Some(node) = self.nodes.get(name) {
            self.renderer.node_state_changed(node);
        }
    }

    /// Bounding box over every node, or `None` for an empty graph.
    pub fn tree_bounds(&self) -> Option<Bounds> {
        let NodeExtent { width, height } = self.extent;
        self.nodes.values().map(Node::position).fold(None, |acc, p| {
            let b = acc.unwrap_or(Bounds {
                left: p.x,
                top: p.y,
                right: p.x + width,
                bottom: p.y + height,
            });
            Some(Bounds {
                left: b.left.min(p.x),
                top: b.top.min(p.y),
                right: b.right.max(p.x + width),
                bottom: b.bottom.max(p.y + height),
            })
        })
    }
}

impl std::fmt::Debug for GraphModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphModel")
            .field("nodes", &self.nodes)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::events::EventBridge;
    use crate::graph::node_type::NodeType;
    use crate::graph::render::MockRenderHooks;

    fn registry() -> TypeRegistry {
        [
            NodeType::new("source", 0).with_stage("input"),
            NodeType::new("filter", 1)
                .with_stage("filter")
                .with_parameter("p", 5i64),
            NodeType::new("merge", 2).with_stage("filter"),
            NodeType::new("ocr", 1).with_stage(RECOGNIZE_STAGE),
        ]
        .into_iter()
        .collect()
    }

    fn add(model: &mut GraphModel, name: &str, ty: &str) {
        let node = model.create_node(name, ty).unwrap();
        model.register_node(node).unwrap();
    }

    fn chain() -> GraphModel {
        let mut model = GraphModel::new(registry());
        add(&mut model, "a", "source");
        add(&mut model, "b", "filter");
        add(&mut model, "c", "filter");
        model
            .connect_plugs(&PlugRef::output("a"), &PlugRef::input("b", 0))
            .unwrap();
        model
            .connect_plugs(&PlugRef::output("b"), &PlugRef::input("c", 0))
            .unwrap();
        model
    }

    #[test]
    fn test_duplicate_name_leaves_index_unchanged() {
        let mut model = GraphModel::new(registry());
        add(&mut model, "a", "source");
        assert_eq!(
            model.create_node("a", "filter").unwrap_err(),
            GraphError::DuplicateName("a".into())
        );

        let mut other = GraphModel::new(registry());
        let clash = other.create_node("a", "filter").unwrap();
        assert_eq!(
            model.register_node(clash).unwrap_err(),
            GraphError::DuplicateName("a".into())
        );
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.node("a").unwrap().type_name(), "source");
    }

    #[test]
    fn test_unregister_unknown() {
        let mut model = GraphModel::new(registry());
        assert_eq!(
            model.unregister_node("ghost").unwrap_err(),
            GraphError::UnknownNode("ghost".into())
        );
    }

    #[test]
    fn test_get_plug_errors() {
        let model = chain();
        assert!(matches!(
            model.get_plug(&PlugRef::input("zz", 0)),
            Err(GraphError::UnknownNode(_))
        ));
        assert!(matches!(
            model.get_plug(&PlugRef::input("b", 1)),
            Err(GraphError::UnknownPlug(_))
        ));
        let malformed = PlugRef {
            node: "b".into(),
            direction: PlugDirection::Output,
            index: Some(0),
        };
        assert!(matches!(
            model.get_plug(&malformed),
            Err(GraphError::InvalidPlugReference(_))
        ));
        assert!(matches!(
            model.get_plug(&PlugRef::input("a", 0)),
            Err(GraphError::UnknownPlug(_))
        ));
    }

    #[test]
    fn test_connect_twice_keeps_original_cable() {
        let mut model = chain();
        add(&mut model, "d", "source");
        let err = model
            .connect_plugs(&PlugRef::output("d"), &PlugRef::input("b", 0))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidConnection(_)));
        assert_eq!(model.node("b").unwrap().input(0).unwrap().source(), Some("a"));
    }

    #[test]
    fn test_connect_direction_checks() {
        let mut model = chain();
        assert!(matches!(
            model.connect_plugs(&PlugRef::input("b", 0), &PlugRef::input("c", 0)),
            Err(GraphError::InvalidConnection(_))
        ));
        assert!(matches!(
            model.connect_plugs(&PlugRef::output("a"), &PlugRef::output("c")),
            Err(GraphError::InvalidConnection(_))
        ));
        add(&mut model, "m", "merge");
        assert!(matches!(
            model.connect_plugs(&PlugRef::output("m"), &PlugRef::input("m", 0)),
            Err(GraphError::InvalidConnection(_))
        ));
    }

    #[test]
    fn test_detach() {
        let mut model = chain();
        let cable = model.detach_plug(&PlugRef::input("c", 0)).unwrap();
        assert_eq!(cable.source, "b");
        assert_eq!(
            model.detach_plug(&PlugRef::input("c", 0)).unwrap_err(),
            GraphError::MissingAttachment("c_input0".into())
        );
    }

    #[test]
    fn test_attached_inputs_scans_all_nodes() {
        let mut model = chain();
        add(&mut model, "m", "merge");
        model
            .connect_plugs(&PlugRef::output("a"), &PlugRef::input("m", 1))
            .unwrap();
        let consumers = model.attached_inputs(&PlugRef::output("a")).unwrap();
        assert_eq!(consumers, vec![PlugRef::input("b", 0), PlugRef::input("m", 1)]);
        assert!(model.attached_inputs(&PlugRef::output("c")).unwrap().is_empty());
    }

    #[test]
    fn test_rename_rewires_cables_and_keeps_order() {
        let mut model = chain();
        model.rename_node("b", "blur").unwrap();
        assert_eq!(model.node_names(), vec!["a", "blur", "c"]);
        assert_eq!(model.node("c").unwrap().input(0).unwrap().source(), Some("blur"));
        assert_eq!(model.node("blur").unwrap().input(0).unwrap().source(), Some("a"));

        assert_eq!(
            model.rename_node("blur", "c").unwrap_err(),
            GraphError::DuplicateName("c".into())
        );
        assert_eq!(
            model.rename_node("blur", "bad name").unwrap_err(),
            GraphError::InvalidNodeName("bad name".into())
        );
        model.rename_node("blur", "blur").unwrap();
    }

    #[test]
    fn test_viewing_is_exclusive() {
        let mut model = chain();
        assert_eq!(model.set_viewing("a", true).unwrap(), None);
        assert_eq!(model.set_viewing("b", true).unwrap(), Some("a".into()));
        let viewers: Vec<_> = model.nodes().filter(|n| n.is_viewing()).collect();
        assert_eq!(viewers.len(), 1);
        assert_eq!(viewers[0].name(), "b");

        let mut restored = model.node("a").unwrap().snapshot();
        restored.name = "a2".into();
        restored.viewing = true;
        let mut node = model.create_node("a2", "source").unwrap();
        node.restore(&restored);
        model.register_node(node).unwrap();
        assert_eq!(model.viewing_node().unwrap().name(), "a2");
        assert!(!model.node("b").unwrap().is_viewing());
    }

    #[test]
    fn test_focus_has_no_cardinality_limit() {
        let mut model = chain();
        model.select_all();
        assert_eq!(model.selected_count(), 3);
        model.focus_exclusive("c").unwrap();
        assert_eq!(model.selected_nodes(), vec!["c"]);
        model.toggle_focussed("a").unwrap();
        assert_eq!(model.selected_nodes(), vec!["a", "c"]);
        model.deselect_all();
        assert_eq!(model.selected_count(), 0);
    }

    #[test]
    fn test_eval_node_preference() {
        let mut model = chain();
        assert_eq!(model.eval_node(), Some("c"));
        add(&mut model, "ocr1", "ocr");
        add(&mut model, "tail", "filter");
        assert_eq!(model.eval_node(), Some("ocr1"));
        model.set_focussed("b", true).unwrap();
        assert_eq!(model.eval_node(), Some("b"));
        model.set_viewing("a", true).unwrap();
        assert_eq!(model.eval_node(), Some("a"));
    }

    #[test]
    fn test_errors_are_transient() {
        let mut model = chain();
        model.set_node_errored("b", Some("bad input".into()));
        model.set_node_errored("ghost", Some("ignored".into()));
        assert_eq!(model.node("b").unwrap().error(), Some("bad input"));
        model.clear_errors();
        assert_eq!(model.node("b").unwrap().error(), None);
    }

    #[test]
    fn test_tree_bounds() {
        let mut model = GraphModel::new(registry()).with_node_extent(NodeExtent {
            width: 10.0,
            height: 5.0,
        });
        assert_eq!(model.tree_bounds(), None);
        add(&mut model, "a", "source");
        add(&mut model, "b", "filter");
        model.move_node_to("a", Point::new(-5.0, 0.0)).unwrap();
        model.move_node_to("b", Point::new(20.0, 30.0)).unwrap();
        assert_eq!(
            model.tree_bounds(),
            Some(Bounds {
                left: -5.0,
                top: 0.0,
                right: 30.0,
                bottom: 35.0
            })
        );
    }

    #[test]
    fn test_viewport_sanitized() {
        let mut model = GraphModel::new(registry());
        model.load_viewport(Viewport {
            x: f64::NAN,
            y: 4.0,
            scale: 0.01,
        });
        assert_eq!(
            model.viewport(),
            Viewport {
                x: 0.0,
                y: 4.0,
                scale: MIN_VIEWPORT_SCALE
            }
        );
    }

    #[test]
    fn test_events_emitted() {
        let (tx, bridge) = EventBridge::new();
        let mut model = GraphModel::new(registry()).with_events(tx);
        add(&mut model, "a", "source");
        model.move_node_by("a", 3.0, 4.0).unwrap();
        model.set_viewing("a", true).unwrap();
        model.clear_script();
        assert_eq!(
            bridge.drain(),
            vec![
                GraphEvent::NodeMoved {
                    name: "a".into(),
                    x: 3.0,
                    y: 4.0
                },
                GraphEvent::NodeViewing("a".into()),
                GraphEvent::ScriptCleared,
            ]
        );
    }

    #[test]
    fn test_render_hooks_called() {
        let mut renderer = MockRenderHooks::new();
        renderer.expect_node_created().times(2).return_const(());
        renderer
            .expect_cable_attached()
            .withf(|source, target| source == "a" && *target == PlugRef::input("b", 0))
            .times(1)
            .return_const(());
        renderer
            .expect_cable_detached()
            .withf(|target| *target == PlugRef::input("b", 0))
            .times(1)
            .return_const(());

        let mut model = GraphModel::new(registry()).with_renderer(renderer);
        add(&mut model, "a", "source");
        add(&mut model, "b", "filter");
        model
            .connect_plugs(&PlugRef::output("a"), &PlugRef::input("b", 0))
            .unwrap();
        model.detach_plug(&PlugRef::input("b", 0)).unwrap();
    }
}
