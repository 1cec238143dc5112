//! Hooks into the rendering collaborator.
//!
//! The model reports structural changes here; drawing, hit testing and
//! screen geometry all live on the other side of this trait.

use crate::graph::id::PlugRef;
use crate::graph::node::{Node, Point};

/// Receives notifications whenever the visual representation must change.
#[cfg_attr(test, mockall::automock)]
pub trait RenderHooks {
    /// A node was registered and needs a visual.
    fn node_created(&mut self, _node: &Node) {}

    /// A node's position changed.
    fn node_moved(&mut self, _name: &str, _position: Point) {}

    /// A node was unregistered; its visual should go.
    fn node_removed(&mut self, _name: &str) {}

    /// A node was renamed.
    fn node_renamed(&mut self, _old: &str, _new: &str) {}

    /// A flag (`ignored`, `viewing`, `focussed`, error) changed.
    fn node_state_changed(&mut self, _node: &Node) {}

    /// A cable now runs from `source`'s output to `target`.
    fn cable_attached(&mut self, _source: &str, _target: &PlugRef) {}

    /// The cable into `target` was removed.
    fn cable_detached(&mut self, _target: &PlugRef) {}
}

/// Renderer that ignores everything. Used headless and in most tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderHooks for NullRenderer {}
