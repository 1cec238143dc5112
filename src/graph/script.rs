//! The persisted script format.
//!
//! A script is a JSON object keyed by node name. The reserved `__meta` key
//! carries the viewport and is never treated as a node; each node record has
//! its own `__meta` block for canvas position and UI flags.
//!
//! ```json
//! {
//!   "__meta": {"x": 0, "y": 0, "scale": 1},
//!   "bin1": {"type": "ocropus.Binarize", "stage": "binarize", "ignored": false,
//!            "params": [["k", 0.3]], "inputs": ["file1"],
//!            "__meta": {"x": 100, "y": 40, "viewing": true, "focussed": false}}
//! }
//! ```

use crate::graph::error::{GraphError, GraphResult};
use crate::graph::events::GraphEvent;
use crate::graph::id::PlugRef;
use crate::graph::model::{GraphModel, Viewport};
use crate::graph::namer::NodeNamer;
use crate::graph::node::{Node, Point};
use crate::graph::plug::Cable;
use crate::graph::value::ParamValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved key for editor metadata.
pub const META_KEY: &str = "__meta";

/// Per-node editor state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub viewing: bool,
    #[serde(default)]
    pub focussed: bool,
}

/// One node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptNode {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub params: Vec<(String, ParamValue)>,
    /// Source node per input index; `None` marks an unattached gap.
    #[serde(default)]
    pub inputs: Vec<Option<String>>,
    #[serde(rename = "__meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<NodeMeta>,
}

impl ScriptNode {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            stage: String::new(),
            ignored: false,
            params: Vec::new(),
            inputs: Vec::new(),
            meta: None,
        }
    }

    pub fn with_input(mut self, source: impl Into<String>) -> Self {
        self.inputs.push(Some(source.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// A whole script: viewport metadata plus node records in file order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "__meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Viewport>,
    #[serde(flatten)]
    pub nodes: IndexMap<String, ScriptNode>,
}

impl Script {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ScriptNode> {
        self.nodes.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, node: ScriptNode) {
        self.nodes.insert(name.into(), node);
    }

    pub fn with_node(mut self, name: impl Into<String>, node: ScriptNode) -> Self {
        self.insert(name, node);
        self
    }
}

impl GraphModel {
    /// Replace the whole graph with the contents of `script`.
    ///
    /// All nodes are built first and cables wired second, so a record may
    /// name a source that appears later in the file. The current graph is
    /// only replaced once everything has resolved; on error it is untouched.
    pub fn load_script(&mut self, script: &Script) -> GraphResult<()> {
        let mut staged: IndexMap<String, Node> = IndexMap::with_capacity(script.len());
        let mut has_viewer = false;

        for (name, record) in &script.nodes {
            if name == META_KEY
                || !NodeNamer::is_valid_node_name(name, None, |n| staged.contains_key(n))
            {
                return Err(GraphError::InvalidNodeName(name.clone()));
            }
            let mut node = Node::new(name.as_str(), self.types().get(&record.type_name)?);
            for (param, value) in &record.params {
                node.set_parameter(param, value.clone())?;
            }
            node.set_ignored(record.ignored);
            if let Some(meta) = record.meta {
                node.move_to(Point::new(meta.x, meta.y));
                node.set_focussed(meta.focussed);
                if meta.viewing && !has_viewer {
                    node.set_viewing(true);
                    has_viewer = true;
                } else if meta.viewing {
                    tracing::warn!("Ignoring second viewer {} in script", name);
                }
            }
            staged.insert(name.clone(), node);
        }

        for (name, record) in &script.nodes {
            for (index, source) in record.inputs.iter().enumerate() {
                let Some(source) = source else { continue };
                if !staged.contains_key(source) {
                    return Err(GraphError::UnknownNode(source.clone()));
                }
                if source == name {
                    return Err(GraphError::InvalidConnection(format!(
                        "{} feeds its own input",
                        name
                    )));
                }
                let target = PlugRef::input(name.as_str(), index);
                let input = staged
                    .get_mut(name)
                    .and_then(|n| n.input_mut(index))
                    .ok_or_else(|| GraphError::UnknownPlug(target.to_string()))?;
                input.attach(Cable::new(source.as_str()));
            }
        }

        self.clear_script();
        self.load_viewport(script.meta.unwrap_or_default());
        let count = staged.len();
        self.replace_nodes(staged);
        tracing::info!("Loaded script with {} nodes", count);
        self.emit(GraphEvent::ScriptLoaded);
        Ok(())
    }

    /// Serialize the current graph, nodes in registration order.
    pub fn build_script(&self) -> Script {
        let nodes = self
            .nodes()
            .map(|node| {
                let mut inputs: Vec<Option<String>> = node
                    .inputs()
                    .iter()
                    .map(|input| input.source().map(str::to_string))
                    .collect();
                while matches!(inputs.last(), Some(None)) {
                    inputs.pop();
                }
                let position = node.position();
                let record = ScriptNode {
                    type_name: node.type_name().to_string(),
                    stage: node.stage().to_string(),
                    ignored: node.is_ignored(),
                    params: node
                        .params()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    inputs,
                    meta: Some(NodeMeta {
                        x: position.x,
                        y: position.y,
                        viewing: node.is_viewing(),
                        focussed: node.is_focussed(),
                    }),
                };
                (node.name().to_string(), record)
            })
            .collect();

        Script {
            meta: Some(self.viewport()),
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node_type::{NodeType, TypeRegistry};

    fn registry() -> TypeRegistry {
        [
            NodeType::new("source", 0).with_stage("input"),
            NodeType::new("sink", 1)
                .with_stage("filter")
                .with_parameter("p", 5i64),
            NodeType::new("merge", 2).with_stage("filter"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_load_minimal_script() {
        let script =
            Script::from_json(r#"{"A":{"type":"source","inputs":[]},"B":{"type":"sink","inputs":["A"]}}"#)
                .unwrap();
        let mut model = GraphModel::new(registry());
        model.load_script(&script).unwrap();

        assert_eq!(model.node_names(), vec!["A", "B"]);
        assert_eq!(model.cables(), vec![("A".to_string(), PlugRef::input("B", 0))]);

        let rebuilt = model.build_script();
        assert_eq!(rebuilt.get("A").unwrap().inputs, Vec::<Option<String>>::new());
        assert_eq!(rebuilt.get("B").unwrap().inputs, vec![Some("A".to_string())]);
        assert_eq!(
            rebuilt.get("B").unwrap().params,
            vec![("p".to_string(), ParamValue::Int(5))]
        );
    }

    #[test]
    fn test_forward_references_resolve() {
        let script =
            Script::from_json(r#"{"B":{"type":"sink","inputs":["A"]},"A":{"type":"source"}}"#)
                .unwrap();
        let mut model = GraphModel::new(registry());
        model.load_script(&script).unwrap();
        assert_eq!(model.node("B").unwrap().input(0).unwrap().source(), Some("A"));
    }

    #[test]
    fn test_meta_key_is_not_a_node() {
        let json = r#"{
            "__meta": {"x": 12.0, "y": -3.0, "scale": 2.0},
            "A": {"type": "source", "__meta": {"x": 40, "y": 50, "viewing": true, "focussed": true}}
        }"#;
        let script = Script::from_json(json).unwrap();
        assert_eq!(script.len(), 1);

        let mut model = GraphModel::new(registry());
        model.load_script(&script).unwrap();
        assert_eq!(model.viewport().scale, 2.0);
        let a = model.node("A").unwrap();
        assert_eq!(a.position(), Point::new(40.0, 50.0));
        assert!(a.is_viewing() && a.is_focussed());
    }

    #[test]
    fn test_gaps_written_as_null_and_trailing_trimmed() {
        let mut model = GraphModel::new(registry());
        let script = Script::from_json(
            r#"{"A":{"type":"source"},"M":{"type":"merge","inputs":[null,"A"]},"N":{"type":"merge","inputs":["A"]}}"#,
        )
        .unwrap();
        model.load_script(&script).unwrap();
        let rebuilt = model.build_script();
        assert_eq!(rebuilt.get("M").unwrap().inputs, vec![None, Some("A".to_string())]);
        assert_eq!(rebuilt.get("N").unwrap().inputs, vec![Some("A".to_string())]);

        let json = rebuilt.to_json_pretty().unwrap();
        assert!(json.contains("null"));
    }

    #[test]
    fn test_failed_load_leaves_model_untouched() {
        let mut model = GraphModel::new(registry());
        model
            .load_script(&Script::from_json(r#"{"keep":{"type":"source"}}"#).unwrap())
            .unwrap();

        let dangling = Script::from_json(r#"{"B":{"type":"sink","inputs":["nowhere"]}}"#).unwrap();
        assert_eq!(
            model.load_script(&dangling).unwrap_err(),
            GraphError::UnknownNode("nowhere".into())
        );
        let bad_param =
            Script::from_json(r#"{"B":{"type":"sink","params":[["zz", 1]]}}"#).unwrap();
        assert!(matches!(
            model.load_script(&bad_param),
            Err(GraphError::UnknownParameter { .. })
        ));
        let bad_type = Script::from_json(r#"{"B":{"type":"nope"}}"#).unwrap();
        assert!(matches!(
            model.load_script(&bad_type),
            Err(GraphError::UnknownNodeType(_))
        ));
        assert_eq!(model.node_names(), vec!["keep"]);
    }

    #[test]
    fn test_only_first_viewer_kept() {
        let json = r#"{
            "A": {"type": "source", "__meta": {"viewing": true}},
            "B": {"type": "source", "__meta": {"viewing": true}}
        }"#;
        let mut model = GraphModel::new(registry());
        model.load_script(&Script::from_json(json).unwrap()).unwrap();
        assert_eq!(model.viewing_node().unwrap().name(), "A");
        assert!(!model.node("B").unwrap().is_viewing());
    }

    #[test]
    fn test_build_then_load_is_stable() {
        let mut model = GraphModel::new(registry());
        let script = Script::default()
            .with_node("src", ScriptNode::new("source"))
            .with_node("out", ScriptNode::new("sink").with_input("src").with_param("p", 9i64));
        model.load_script(&script).unwrap();
        let first = model.build_script();

        let mut reloaded = GraphModel::new(registry());
        reloaded
            .load_script(&Script::from_json(&first.to_json_pretty().unwrap()).unwrap())
            .unwrap();
        assert_eq!(reloaded.build_script(), first);
    }
}
