//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use nodetree_rs::graph::{ParamValue, Script};
use std::collections::BTreeMap;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// The parts of a node that undo/redo must reproduce exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub type_name: String,
    pub ignored: bool,
    pub params: Vec<(String, ParamValue)>,
    pub inputs: Vec<Option<String>>,
    pub x: f64,
    pub y: f64,
    pub viewing: bool,
}

/// Script contents keyed by name, ignoring registration order and focus
/// (neither is recorded by the history).
pub fn normalized(script: &Script) -> BTreeMap<String, NodeView> {
    script
        .nodes
        .iter()
        .map(|(name, node)| {
            let meta = node.meta.unwrap_or_default();
            (
                name.clone(),
                NodeView {
                    type_name: node.type_name.clone(),
                    ignored: node.ignored,
                    params: node.params.clone(),
                    inputs: node.inputs.clone(),
                    x: meta.x,
                    y: meta.y,
                    viewing: meta.viewing,
                },
            )
        })
        .collect()
}
