//! The node graph: nodes, plugs, cables and the model that owns them.
//!
//! Everything here is synchronous and single-threaded. The model is a passive
//! mutation target; undoable edits go through [`crate::command`].

pub mod error;
pub mod events;
pub mod id;
pub mod model;
pub mod namer;
pub mod node;
pub mod node_type;
pub mod plug;
pub mod render;
pub mod script;
pub mod value;

pub use error::{GraphError, GraphResult};
pub use events::{EventBridge, EventSender, GraphEvent};
pub use id::PlugRef;
pub use model::{Bounds, GraphModel, NodeExtent, Plug, Viewport};
pub use namer::NodeNamer;
pub use node::{Node, NodeSnapshot, Point};
pub use node_type::{NodeType, ParameterSpec, TypeRegistry};
pub use plug::{Cable, InputPlug, PlugDirection};
pub use render::{NullRenderer, RenderHooks};
pub use script::{NodeMeta, Script, ScriptNode};
pub use value::ParamValue;
