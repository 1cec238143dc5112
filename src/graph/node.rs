//! Node instances.
//!
//! A `Node` is a typed processing stage with a unique name, ordered
//! parameters, a canvas position and three independent state flags
//! (`ignored`, `viewing`, `focussed`). Nodes are only created and destroyed
//! through [`GraphModel`](crate::graph::GraphModel); most setters are
//! crate-private so the model can keep its invariants.

use crate::graph::error::{GraphError, GraphResult};
use crate::graph::node_type::NodeType;
use crate::graph::plug::InputPlug;
use crate::graph::value::ParamValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canvas position (top-left corner of the node).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A node registered in (or about to be registered in) the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    type_name: String,
    stage: String,
    params: IndexMap<String, ParamValue>,
    position: Point,
    inputs: Vec<InputPlug>,
    ignored: bool,
    viewing: bool,
    focussed: bool,
    /// Transient evaluation error, never serialized.
    error: Option<String>,
}

impl Node {
    /// A fresh node with the type's default parameters, at the origin.
    pub(crate) fn new(name: impl Into<String>, node_type: &NodeType) -> Self {
        Self {
            name: name.into(),
            type_name: node_type.name.clone(),
            stage: node_type.stage.clone(),
            params: node_type
                .parameters
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
            position: Point::ZERO,
            inputs: (0..node_type.arity).map(InputPlug::new).collect(),
            ignored: false,
            viewing: false,
            focussed: false,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    pub fn params(&self) -> &IndexMap<String, ParamValue> {
        &self.params
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn inputs(&self) -> &[InputPlug] {
        &self.inputs
    }

    pub fn input(&self, index: usize) -> Option<&InputPlug> {
        self.inputs.get(index)
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn is_viewing(&self) -> bool {
        self.viewing
    }

    pub fn is_focussed(&self) -> bool {
        self.focussed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set an existing parameter, returning its previous value.
    pub(crate) fn set_parameter(&mut self, name: &str, value: ParamValue) -> GraphResult<ParamValue> {
        match self.params.get_mut(name) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(GraphError::UnknownParameter {
                node: self.name.clone(),
                param: name.to_string(),
            }),
        }
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn move_to(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position.offset(dx, dy);
    }

    pub(crate) fn input_mut(&mut self, index: usize) -> Option<&mut InputPlug> {
        self.inputs.get_mut(index)
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut [InputPlug] {
        &mut self.inputs
    }

    pub(crate) fn set_ignored(&mut self, ignored: bool) {
        self.ignored = ignored;
    }

    pub(crate) fn set_viewing(&mut self, viewing: bool) {
        self.viewing = viewing;
    }

    pub(crate) fn set_focussed(&mut self, focussed: bool) {
        self.focussed = focussed;
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Capture everything needed to rebuild this node except its cables.
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            params: self
                .params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            position: self.position,
            ignored: self.ignored,
            viewing: self.viewing,
            focussed: self.focussed,
        }
    }

    /// Apply a snapshot's state. Parameters the type no longer declares are skipped.
    pub(crate) fn restore(&mut self, snapshot: &NodeSnapshot) {
        for (name, value) in &snapshot.params {
            if let Some(slot) = self.params.get_mut(name) {
                *slot = value.clone();
            } else {
                tracing::warn!("Dropping unknown parameter {}.{} on restore", self.name, name);
            }
        }
        self.position = snapshot.position;
        self.ignored = snapshot.ignored;
        self.viewing = snapshot.viewing;
        self.focussed = snapshot.focussed;
    }
}

/// Full state of a node, minus cables. Used to undo deletions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub type_name: String,
    pub params: Vec<(String, ParamValue)>,
    pub position: Point,
    pub ignored: bool,
    pub viewing: bool,
    pub focussed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binarize() -> NodeType {
        NodeType::new("ocropus.Binarize", 1)
            .with_stage("binarize")
            .with_parameter("k", 0.3)
            .with_parameter("w", 40i64)
    }

    #[test]
    fn test_new_node_uses_type_defaults() {
        let node = Node::new("binarize1", &binarize());
        assert_eq!(node.arity(), 1);
        assert_eq!(node.stage(), "binarize");
        let names: Vec<&str> = node.params().keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["k", "w"]);
        assert_eq!(node.position(), Point::ZERO);
        assert!(!node.is_ignored() && !node.is_viewing() && !node.is_focussed());
    }

    #[test]
    fn test_set_parameter_returns_old_value() {
        let mut node = Node::new("b", &binarize());
        let old = node.set_parameter("w", ParamValue::Int(10)).unwrap();
        assert_eq!(old, ParamValue::Int(40));
        assert_eq!(node.parameter("w"), Some(&ParamValue::Int(10)));

        let err = node.set_parameter("missing", ParamValue::Int(1)).unwrap_err();
        assert!(matches!(err, GraphError::UnknownParameter { .. }));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut node = Node::new("b", &binarize());
        node.set_parameter("k", ParamValue::Float(0.5)).unwrap();
        node.move_to(Point::new(10.0, 20.0));
        node.set_ignored(true);
        node.set_viewing(true);
        let snapshot = node.snapshot();

        let mut fresh = Node::new("b", &binarize());
        fresh.restore(&snapshot);
        assert_eq!(fresh, node);
    }
}
