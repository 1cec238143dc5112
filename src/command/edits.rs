//! Primitive undoable edits.
//!
//! Each edit validates against the model when constructed and stores only
//! the data needed to replay it in both directions. Construction never
//! mutates the model; the stack runs `forward` on push.

use crate::command::kind::{Command, UndoCommand};
use crate::graph::{
    GraphError, GraphModel, GraphResult, NodeSnapshot, ParamValue, Plug, PlugRef, Point,
};
use indexmap::IndexMap;
use std::time::Duration;

/// Create and register a node centred on a drop point.
#[derive(Debug, Clone, PartialEq)]
pub struct AddNode {
    name: String,
    type_name: String,
    /// Top-left corner, already offset by half the node extent.
    position: Point,
}

impl AddNode {
    pub fn new(model: &GraphModel, name: &str, type_name: &str, at: Point) -> GraphResult<Self> {
        if model.contains(name) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        if !model.is_valid_node_name(name, None) {
            return Err(GraphError::InvalidNodeName(name.to_string()));
        }
        model.types().get(type_name)?;
        let extent = model.extent();
        Ok(Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            position: at.offset(-extent.width / 2.0, -extent.height / 2.0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Point {
        self.position
    }
}

impl UndoCommand for AddNode {
    fn label(&self) -> String {
        "Add Node".to_string()
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        let mut node = model.create_node(&self.name, &self.type_name)?;
        node.move_to(self.position);
        model.register_node(node)
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.unregister_node(&self.name).map(drop)
    }
}

/// Unregister a node. Undo rebuilds it from a snapshot but does not restore
/// cables; pair with detach edits in a macro for that.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteNode {
    snapshot: NodeSnapshot,
}

impl DeleteNode {
    pub fn new(model: &GraphModel, name: &str) -> GraphResult<Self> {
        Ok(Self {
            snapshot: model.node(name)?.snapshot(),
        })
    }

    pub fn snapshot(&self) -> &NodeSnapshot {
        &self.snapshot
    }
}

impl UndoCommand for DeleteNode {
    fn label(&self) -> String {
        format!("Delete Node: {}", self.snapshot.name)
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.unregister_node(&self.snapshot.name).map(drop)
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        let mut node = model.create_node(&self.snapshot.name, &self.snapshot.type_name)?;
        node.restore(&self.snapshot);
        model.register_node(node)
    }
}

/// Run a cable from an output to an unattached input.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectPlugs {
    src: PlugRef,
    dst: PlugRef,
}

impl ConnectPlugs {
    pub fn new(model: &GraphModel, src: PlugRef, dst: PlugRef) -> GraphResult<Self> {
        model.validate_connection(&src, &dst)?;
        Ok(Self { src, dst })
    }

    pub fn src(&self) -> &PlugRef {
        &self.src
    }

    pub fn dst(&self) -> &PlugRef {
        &self.dst
    }
}

impl UndoCommand for ConnectPlugs {
    fn label(&self) -> String {
        "Connect Plugs".to_string()
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.connect_plugs(&self.src, &self.dst)
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.detach_plug(&self.dst).map(drop)
    }
}

/// Remove the cable into an input, remembering where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachPlug {
    plug: PlugRef,
    origin: String,
}

impl DetachPlug {
    pub fn new(model: &GraphModel, plug: PlugRef) -> GraphResult<Self> {
        let origin = match model.get_plug(&plug)? {
            Plug::Input { plug: input, .. } => input
                .source()
                .map(str::to_string)
                .ok_or_else(|| GraphError::MissingAttachment(plug.to_string()))?,
            Plug::Output { .. } => {
                return Err(GraphError::InvalidConnection(format!(
                    "cannot detach output {}",
                    plug
                )));
            }
        };
        Ok(Self { plug, origin })
    }

    pub fn plug(&self) -> &PlugRef {
        &self.plug
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl UndoCommand for DetachPlug {
    fn label(&self) -> String {
        "Detach Plug".to_string()
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.detach_plug(&self.plug).map(drop)
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.connect_plugs(&PlugRef::output(self.origin.as_str()), &self.plug)
    }
}

/// Set a node's `ignored` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct SetIgnored {
    node: String,
    ignored: bool,
    was_ignored: bool,
}

impl SetIgnored {
    pub fn new(model: &GraphModel, node: &str, ignored: bool) -> GraphResult<Self> {
        let was_ignored = model.node(node)?.is_ignored();
        Ok(Self {
            node: node.to_string(),
            ignored,
            was_ignored,
        })
    }

    /// Flip the current state.
    pub fn toggle(model: &GraphModel, node: &str) -> GraphResult<Self> {
        let current = model.node(node)?.is_ignored();
        Self::new(model, node, !current)
    }
}

impl UndoCommand for SetIgnored {
    fn label(&self) -> String {
        format!("Ignore Node: {}", self.node)
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.set_ignored(&self.node, self.ignored)
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.set_ignored(&self.node, self.was_ignored)
    }
}

/// Set a node's `viewing` flag. Turning it on takes it away from the
/// current viewer; undo hands it back.
#[derive(Debug, Clone, PartialEq)]
pub struct SetViewing {
    node: String,
    viewing: bool,
    was_viewing: bool,
    previous_viewer: Option<String>,
}

impl SetViewing {
    pub fn new(model: &GraphModel, node: &str, viewing: bool) -> GraphResult<Self> {
        let was_viewing = model.node(node)?.is_viewing();
        let previous_viewer = if viewing {
            model
                .viewing_node()
                .filter(|n| n.name() != node)
                .map(|n| n.name().to_string())
        } else {
            None
        };
        Ok(Self {
            node: node.to_string(),
            viewing,
            was_viewing,
            previous_viewer,
        })
    }

    pub fn toggle(model: &GraphModel, node: &str) -> GraphResult<Self> {
        let current = model.node(node)?.is_viewing();
        Self::new(model, node, !current)
    }
}

impl UndoCommand for SetViewing {
    fn label(&self) -> String {
        format!("View Output for Node: {}", self.node)
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.set_viewing(&self.node, self.viewing).map(drop)
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.set_viewing(&self.node, self.was_viewing)?;
        if let Some(previous) = &self.previous_viewer {
            model.set_viewing(previous, true)?;
        }
        Ok(())
    }
}

/// Change one parameter. Rapid edits to the same parameter coalesce.
#[derive(Debug, Clone, PartialEq)]
pub struct SetNodeParameter {
    node: String,
    param: String,
    old: ParamValue,
    new: ParamValue,
    timestamp: Duration,
}

impl SetNodeParameter {
    /// Build the edit, reading the current value from the model as the
    /// value to restore on undo.
    pub fn new(
        model: &GraphModel,
        node: &str,
        param: &str,
        value: ParamValue,
        timestamp: Duration,
    ) -> GraphResult<Self> {
        let old = current_parameter(model, node, param)?;
        Ok(Self {
            node: node.to_string(),
            param: param.to_string(),
            old,
            new: value,
            timestamp,
        })
    }

    pub fn old_value(&self) -> &ParamValue {
        &self.old
    }

    pub fn new_value(&self) -> &ParamValue {
        &self.new
    }
}

impl UndoCommand for SetNodeParameter {
    fn label(&self) -> String {
        format!("Set Parameter: {}.{}", self.node, self.param)
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        model
            .set_parameter(&self.node, &self.param, self.new.clone())
            .map(drop)
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        model
            .set_parameter(&self.node, &self.param, self.old.clone())
            .map(drop)
    }

    fn try_merge(&mut self, candidate: &Command, window: Duration) -> bool {
        let Command::SetNodeParameter(other) = candidate else {
            return false;
        };
        if other.node != self.node || other.param != self.param {
            return false;
        }
        if elapsed_between(self.timestamp, other.timestamp) > window {
            tracing::trace!(
                "Not merging {}.{}: {:?} apart",
                self.node,
                self.param,
                elapsed_between(self.timestamp, other.timestamp)
            );
            return false;
        }
        self.new = other.new.clone();
        self.timestamp = other.timestamp;
        true
    }
}

/// Before/after pair for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamChange {
    pub new: ParamValue,
    pub old: ParamValue,
}

/// Change several parameters on one node as a single edit.
#[derive(Debug, Clone, PartialEq)]
pub struct SetMultipleNodeParameters {
    node: String,
    changes: IndexMap<String, ParamChange>,
    timestamp: Duration,
}

impl SetMultipleNodeParameters {
    pub fn new<I>(model: &GraphModel, node: &str, values: I, timestamp: Duration) -> GraphResult<Self>
    where
        I: IntoIterator<Item = (String, ParamValue)>,
    {
        let mut changes = IndexMap::new();
        for (param, new) in values {
            let old = current_parameter(model, node, &param)?;
            changes.insert(param, ParamChange { new, old });
        }
        Ok(Self {
            node: node.to_string(),
            changes,
            timestamp,
        })
    }

    pub fn changes(&self) -> &IndexMap<String, ParamChange> {
        &self.changes
    }
}

impl UndoCommand for SetMultipleNodeParameters {
    fn label(&self) -> String {
        format!("Set Multiple Parameters: {}", self.node)
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        for (param, change) in &self.changes {
            model.set_parameter(&self.node, param, change.new.clone())?;
        }
        Ok(())
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        for (param, change) in self.changes.iter().rev() {
            model.set_parameter(&self.node, param, change.old.clone())?;
        }
        Ok(())
    }

    fn try_merge(&mut self, candidate: &Command, window: Duration) -> bool {
        let Command::SetMultipleNodeParameters(other) = candidate else {
            return false;
        };
        if other.node != self.node || elapsed_between(self.timestamp, other.timestamp) > window {
            return false;
        }
        for (param, change) in &other.changes {
            self.changes
                .entry(param.clone())
                .and_modify(|existing| existing.new = change.new.clone())
                .or_insert_with(|| change.clone());
        }
        self.timestamp = other.timestamp;
        true
    }
}

/// Shift a set of nodes. Consecutive moves of the same ordered set coalesce.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveNodes {
    names: Vec<String>,
    dx: f64,
    dy: f64,
}

impl MoveNodes {
    pub fn new(model: &GraphModel, names: Vec<String>, dx: f64, dy: f64) -> GraphResult<Self> {
        for name in &names {
            model.node(name)?;
        }
        Ok(Self { names, dx, dy })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn delta(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }
}

impl UndoCommand for MoveNodes {
    fn label(&self) -> String {
        if self.names.len() > 1 {
            "Move Nodes".to_string()
        } else {
            "Move Node".to_string()
        }
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        for name in &self.names {
            model.move_node_by(name, self.dx, self.dy)?;
        }
        Ok(())
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        for name in &self.names {
            model.move_node_by(name, -self.dx, -self.dy)?;
        }
        Ok(())
    }

    fn try_merge(&mut self, candidate: &Command, _window: Duration) -> bool {
        let Command::MoveNodes(other) = candidate else {
            return false;
        };
        if other.names != self.names {
            return false;
        }
        self.dx += other.dx;
        self.dy += other.dy;
        true
    }
}

/// Rename a node, rewiring the cables that reference it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameNode {
    old: String,
    new: String,
}

impl RenameNode {
    pub fn new(model: &GraphModel, old: &str, new: &str) -> GraphResult<Self> {
        model.validate_rename(old, new)?;
        Ok(Self {
            old: old.to_string(),
            new: new.to_string(),
        })
    }
}

impl UndoCommand for RenameNode {
    fn label(&self) -> String {
        format!("Rename Node: {} -> {}", self.old, self.new)
    }

    fn forward(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.rename_node(&self.old, &self.new)
    }

    fn reverse(&self, model: &mut GraphModel) -> GraphResult<()> {
        model.rename_node(&self.new, &self.old)
    }
}

fn elapsed_between(a: Duration, b: Duration) -> Duration {
    if a > b {
        a - b
    } else {
        b - a
    }
}

fn current_parameter(model: &GraphModel, node: &str, param: &str) -> GraphResult<ParamValue> {
    model
        .node(node)?
        .parameter(param)
        .cloned()
        .ok_or_else(|| GraphError::UnknownParameter {
            node: node.to_string(),
            param: param.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeExtent, NodeType, TypeRegistry};

    fn model() -> GraphModel {
        let types: TypeRegistry = [
            NodeType::new("source", 0),
            NodeType::new("filter", 1)
                .with_parameter("p", 5i64)
                .with_parameter("q", 0.5),
        ]
        .into_iter()
        .collect();
        let mut model = GraphModel::new(types).with_node_extent(NodeExtent {
            width: 100.0,
            height: 20.0,
        });
        for (name, ty) in [("a", "source"), ("b", "filter"), ("c", "filter")] {
            let node = model.create_node(name, ty).unwrap();
            model.register_node(node).unwrap();
        }
        model
            .connect_plugs(&PlugRef::output("a"), &PlugRef::input("b", 0))
            .unwrap();
        model
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_add_node_centres_on_point() {
        let mut model = model();
        let cmd = AddNode::new(&model, "d", "filter", Point::new(200.0, 100.0)).unwrap();
        cmd.forward(&mut model).unwrap();
        assert_eq!(model.node("d").unwrap().position(), Point::new(150.0, 90.0));
        cmd.reverse(&mut model).unwrap();
        assert!(!model.contains("d"));
    }

    #[test]
    fn test_add_node_rejects_collision_without_mutation() {
        let model = model();
        assert_eq!(
            AddNode::new(&model, "a", "filter", Point::ZERO).unwrap_err(),
            GraphError::DuplicateName("a".into())
        );
        assert!(matches!(
            AddNode::new(&model, "x", "missing", Point::ZERO),
            Err(GraphError::UnknownNodeType(_))
        ));
        assert_eq!(model.node_count(), 3);
    }

    #[test]
    fn test_delete_restores_snapshot_without_cables() {
        let mut model = model();
        model.set_parameter("b", "p", ParamValue::Int(7)).unwrap();
        model.set_viewing("b", true).unwrap();
        let cmd = DeleteNode::new(&model, "b").unwrap();
        cmd.forward(&mut model).unwrap();
        assert!(!model.contains("b"));
        cmd.reverse(&mut model).unwrap();

        let b = model.node("b").unwrap();
        assert_eq!(b.parameter("p"), Some(&ParamValue::Int(7)));
        assert!(b.is_viewing());
        assert!(!b.input(0).unwrap().is_attached());
    }

    #[test]
    fn test_connect_validates_at_construction() {
        let model = model();
        assert!(matches!(
            ConnectPlugs::new(&model, PlugRef::output("c"), PlugRef::input("b", 0)),
            Err(GraphError::InvalidConnection(_))
        ));
        assert!(matches!(
            ConnectPlugs::new(&model, PlugRef::output("a"), PlugRef::output("c")),
            Err(GraphError::InvalidConnection(_))
        ));
        assert!(ConnectPlugs::new(&model, PlugRef::output("b"), PlugRef::input("c", 0)).is_ok());
    }

    #[test]
    fn test_detach_captures_origin() {
        let mut model = model();
        assert_eq!(
            DetachPlug::new(&model, PlugRef::input("c", 0)).unwrap_err(),
            GraphError::MissingAttachment("c_input0".into())
        );
        let cmd = DetachPlug::new(&model, PlugRef::input("b", 0)).unwrap();
        assert_eq!(cmd.origin(), "a");
        cmd.forward(&mut model).unwrap();
        assert!(!model.node("b").unwrap().input(0).unwrap().is_attached());
        cmd.reverse(&mut model).unwrap();
        assert_eq!(model.node("b").unwrap().input(0).unwrap().source(), Some("a"));
    }

    #[test]
    fn test_set_viewing_hands_back_previous_viewer() {
        let mut model = model();
        model.set_viewing("a", true).unwrap();
        let cmd = SetViewing::new(&model, "c", true).unwrap();
        cmd.forward(&mut model).unwrap();
        assert_eq!(model.viewing_node().unwrap().name(), "c");
        cmd.reverse(&mut model).unwrap();
        assert_eq!(model.viewing_node().unwrap().name(), "a");
        assert!(!model.node("c").unwrap().is_viewing());
    }

    #[test]
    fn test_toggle_ignored_is_self_inverse() {
        let mut model = model();
        let cmd = SetIgnored::toggle(&model, "b").unwrap();
        cmd.forward(&mut model).unwrap();
        assert!(model.node("b").unwrap().is_ignored());
        cmd.reverse(&mut model).unwrap();
        assert!(!model.node("b").unwrap().is_ignored());
    }

    #[test]
    fn test_parameter_merge_window() {
        let model = model();
        let mut first =
            SetNodeParameter::new(&model, "b", "p", ParamValue::Int(6), ms(0)).unwrap();
        let close = Command::from(
            SetNodeParameter::new(&model, "b", "p", ParamValue::Int(8), ms(150)).unwrap(),
        );
        let far = Command::from(
            SetNodeParameter::new(&model, "b", "p", ParamValue::Int(9), ms(500)).unwrap(),
        );
        let other_param = Command::from(
            SetNodeParameter::new(&model, "c", "p", ParamValue::Int(1), ms(160)).unwrap(),
        );

        assert!(!first.try_merge(&other_param, ms(200)));
        assert!(first.try_merge(&close, ms(200)));
        assert_eq!(first.old_value(), &ParamValue::Int(5));
        assert_eq!(first.new_value(), &ParamValue::Int(8));
        assert!(!first.try_merge(&far, ms(200)));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let model = model();
        assert!(matches!(
            SetNodeParameter::new(&model, "b", "zz", ParamValue::Int(1), ms(0)),
            Err(GraphError::UnknownParameter { .. })
        ));
        assert!(matches!(
            SetMultipleNodeParameters::new(
                &model,
                "b",
                [("p".to_string(), ParamValue::Int(1)), ("zz".to_string(), ParamValue::Int(1))],
                ms(0)
            ),
            Err(GraphError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_multiple_parameters_merge_keeps_first_old() {
        let mut model = model();
        let mut first = SetMultipleNodeParameters::new(
            &model,
            "b",
            [("p".to_string(), ParamValue::Int(1))],
            ms(0),
        )
        .unwrap();
        first.forward(&mut model).unwrap();
        let second = SetMultipleNodeParameters::new(
            &model,
            "b",
            [
                ("p".to_string(), ParamValue::Int(2)),
                ("q".to_string(), ParamValue::Float(0.9)),
            ],
            ms(100),
        )
        .unwrap();
        second.forward(&mut model).unwrap();
        assert!(first.try_merge(&Command::from(second), ms(200)));

        first.reverse(&mut model).unwrap();
        let b = model.node("b").unwrap();
        assert_eq!(b.parameter("p"), Some(&ParamValue::Int(5)));
        assert_eq!(b.parameter("q"), Some(&ParamValue::Float(0.5)));
    }

    #[test]
    fn test_move_merge_is_order_sensitive() {
        let model = model();
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut first = MoveNodes::new(&model, names(&["a", "b"]), 10.0, 0.0).unwrap();
        let same = Command::from(MoveNodes::new(&model, names(&["a", "b"]), 5.0, 1.0).unwrap());
        let swapped = Command::from(MoveNodes::new(&model, names(&["b", "a"]), 5.0, 0.0).unwrap());
        assert!(!first.try_merge(&swapped, ms(200)));
        assert!(first.try_merge(&same, ms(200)));
        assert_eq!(first.delta(), (15.0, 1.0));
        assert_eq!(first.label(), "Move Nodes");
    }

    #[test]
    fn test_rename_round_trip() {
        let mut model = model();
        let cmd = RenameNode::new(&model, "a", "input").unwrap();
        cmd.forward(&mut model).unwrap();
        assert_eq!(model.node("b").unwrap().input(0).unwrap().source(), Some("input"));
        cmd.reverse(&mut model).unwrap();
        assert_eq!(model.node_names(), vec!["a", "b", "c"]);
        assert_eq!(model.node("b").unwrap().input(0).unwrap().source(), Some("a"));
    }
}
