//! Test data builders for registries, scripts and editors

use nodetree_rs::command::ManualClock;
use nodetree_rs::config::EditorConfig;
use nodetree_rs::graph::{NodeType, Script, ScriptNode, TypeRegistry};
use nodetree_rs::Editor;

/// A small OCR-flavoured registry: one source, filters of arity 1 and 2, and
/// a recognizer.
pub fn ocr_registry() -> TypeRegistry {
    [
        NodeType::new("ocropus.FileIn", 0)
            .with_stage("input")
            .with_parameter("path", "page.png"),
        NodeType::new("ocropus.Binarize", 1)
            .with_stage("binarize")
            .with_parameter("k", 0.3)
            .with_parameter("w", 40i64),
        NodeType::new("ocropus.Deskew", 1)
            .with_stage("filter")
            .with_parameter("max_angle", 5i64),
        NodeType::new("utils.Switch", 2)
            .with_stage("utils")
            .with_parameter("input", 0i64),
        NodeType::new("ocropus.Recognize", 1)
            .with_stage("recognize")
            .with_parameter("model", "default"),
    ]
    .into_iter()
    .collect()
}

/// `filein -> binarize -> deskew -> recognize`, with `binarize` viewing.
pub fn chain_script() -> Script {
    let mut binarize = ScriptNode::new("ocropus.Binarize").with_input("filein");
    binarize.meta = Some(nodetree_rs::graph::NodeMeta {
        x: 0.0,
        y: 60.0,
        viewing: true,
        focussed: false,
    });
    Script::default()
        .with_node("filein", ScriptNode::new("ocropus.FileIn"))
        .with_node("binarize", binarize)
        .with_node(
            "deskew",
            ScriptNode::new("ocropus.Deskew").with_input("binarize"),
        )
        .with_node(
            "recognize",
            ScriptNode::new("ocropus.Recognize")
                .with_input("deskew")
                .with_param("model", "fraktur"),
        )
}

/// Builder for an [`Editor`] driven by a manual clock
pub struct EditorBuilder {
    config: EditorConfig,
    script: Option<Script>,
}

impl EditorBuilder {
    pub fn new() -> Self {
        Self {
            config: EditorConfig::default(),
            script: None,
        }
    }

    pub fn merge_window_ms(mut self, ms: u64) -> Self {
        self.config.history.merge_window_ms = ms;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.history.max_depth = depth;
        self
    }

    pub fn script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn build(self) -> (Editor, ManualClock) {
        let clock = ManualClock::new();
        let mut editor = Editor::new(ocr_registry(), self.config).with_clock(clock.clone());
        if let Some(script) = self.script {
            editor.load_script(&script).unwrap();
        }
        (editor, clock)
    }
}

impl Default for EditorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_script_loads() {
        let (editor, _) = EditorBuilder::new().script(chain_script()).build();
        assert_eq!(editor.model().node_count(), 4);
        assert_eq!(editor.eval_node(), Some("binarize"));
    }
}
