//! Structured plug references.
//!
//! Internally a plug is always addressed by `{node, direction, index}`. The
//! legacy string form (`"blur1_input0"`, `"blur1_output"`) is accepted only at
//! the boundary through [`FromStr`] and rendered back with [`Display`].

use crate::graph::error::GraphError;
use crate::graph::plug::PlugDirection;
use std::fmt;
use std::str::FromStr;

/// Address of a plug on a named node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PlugRef {
    pub node: String,
    pub direction: PlugDirection,
    /// Input index. Always `None` for outputs.
    pub index: Option<usize>,
}

impl PlugRef {
    pub fn input(node: impl Into<String>, index: usize) -> Self {
        Self {
            node: node.into(),
            direction: PlugDirection::Input,
            index: Some(index),
        }
    }

    pub fn output(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            direction: PlugDirection::Output,
            index: None,
        }
    }

    #[inline]
    pub fn is_input(&self) -> bool {
        self.direction == PlugDirection::Input
    }

    #[inline]
    pub fn is_output(&self) -> bool {
        self.direction == PlugDirection::Output
    }

    /// The same reference attached to a different node name.
    pub fn with_node(&self, node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            direction: self.direction,
            index: self.index,
        }
    }
}

impl fmt::Debug for PlugRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlugRef({})", self)
    }
}

impl fmt::Display for PlugRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.direction, self.index) {
            (PlugDirection::Input, Some(i)) => write!(f, "{}_input{}", self.node, i),
            (PlugDirection::Input, None) => write!(f, "{}_input", self.node),
            (PlugDirection::Output, _) => write!(f, "{}_output", self.node),
        }
    }
}

impl FromStr for PlugRef {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GraphError::InvalidPlugReference(s.to_string());

        if let Some(node) = s.strip_suffix("_output") {
            if node.is_empty() {
                return Err(invalid());
            }
            return Ok(PlugRef::output(node));
        }

        let pos = s.rfind("_input").ok_or_else(invalid)?;
        let (node, rest) = (&s[..pos], &s[pos + "_input".len()..]);
        if node.is_empty() || rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let index = rest.parse::<usize>().map_err(|_| invalid())?;
        Ok(PlugRef::input(node, index))
    }
}
