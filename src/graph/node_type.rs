//! Node type descriptors and the type registry.
//!
//! The registry is supplied once at startup (usually as JSON from the
//! processing backend) and is read-only afterwards. Node types fix the input
//! arity and the ordered default parameters of every node created from them.

use crate::graph::error::{GraphError, GraphResult};
use crate::graph::value::ParamValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One default parameter of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub value: ParamValue,
}

/// Static description of a kind of node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    /// Fully qualified name, e.g. `"ocropus.Binarize"` or `"image.Rotate"`.
    pub name: String,
    /// Pipeline stage this type belongs to (`"input"`, `"filter"`, `"recognize"`...).
    #[serde(default)]
    pub stage: String,
    /// Number of inputs.
    #[serde(default)]
    pub arity: usize,
    /// Default parameters, in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub description: String,
}

impl NodeType {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            stage: String::new(),
            arity,
            parameters: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this type has no inputs.
    pub fn is_source(&self) -> bool {
        self.arity == 0
    }
}

/// Lookup table of every node type known to the editor.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, NodeType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the startup type list: a JSON array of [`NodeType`] objects.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let types: Vec<NodeType> = serde_json::from_str(json)?;
        Ok(types.into_iter().collect())
    }

    /// Add a type, replacing any previous type of the same name.
    pub fn register(&mut self, node_type: NodeType) {
        if let Some(old) = self.types.insert(node_type.name.clone(), node_type) {
            tracing::debug!("Replaced node type {}", old.name);
        }
    }

    pub fn get(&self, name: &str) -> GraphResult<&NodeType> {
        self.types
            .get(name)
            .ok_or_else(|| GraphError::UnknownNodeType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Types grouped by stage, stages in first-seen order. Used to build menus.
    pub fn by_stage(&self) -> IndexMap<&str, Vec<&NodeType>> {
        let mut stages: IndexMap<&str, Vec<&NodeType>> = IndexMap::new();
        for ty in self.types.values() {
            stages.entry(ty.stage.as_str()).or_default().push(ty);
        }
        stages
    }
}

impl FromIterator<NodeType> for TypeRegistry {
    fn from_iter<I: IntoIterator<Item = NodeType>>(iter: I) -> Self {
        let mut registry = TypeRegistry::new();
        for ty in iter {
            registry.register(ty);
        }
        registry
    }
}
