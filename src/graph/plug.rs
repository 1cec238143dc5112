//! Plug and cable primitives.
//!
//! A node owns a fixed number of indexed inputs and exactly one output. A
//! cable is recorded only on the input it terminates at: the output keeps no
//! list of its consumers, so finding them means scanning every node's inputs
//! (see [`GraphModel::attached_inputs`](crate::graph::GraphModel::attached_inputs)).

use serde::{Deserialize, Serialize};

/// Whether a plug is an input or the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlugDirection {
    Input,
    Output,
}

impl PlugDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlugDirection::Input => "input",
            PlugDirection::Output => "output",
        }
    }
}

/// A directed edge from a node's output to some input.
///
/// Only the name of the originating node is stored; the destination is
/// implied by the input plug that owns the cable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cable {
    pub source: String,
}

impl Cable {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// An indexed input on a node. Holds at most one inbound cable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPlug {
    index: usize,
    cable: Option<Cable>,
}

impl InputPlug {
    pub fn new(index: usize) -> Self {
        Self { index, cable: None }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.cable.is_some()
    }

    pub fn cable(&self) -> Option<&Cable> {
        self.cable.as_ref()
    }

    /// Name of the node feeding this input, if any.
    pub fn source(&self) -> Option<&str> {
        self.cable.as_ref().map(|c| c.source.as_str())
    }

    pub(crate) fn attach(&mut self, cable: Cable) {
        debug_assert!(self.cable.is_none(), "input {} already attached", self.index);
        self.cable = Some(cable);
    }

    pub(crate) fn detach(&mut self) -> Option<Cable> {
        self.cable.take()
    }

    /// Point the cable at a renamed source node.
    pub(crate) fn retarget(&mut self, from: &str, to: &str) -> bool {
        match self.cable.as_mut() {
            Some(cable) if cable.source == from => {
                cable.source = to.to_string();
                true
            }
            _ => false,
        }
    }
}
