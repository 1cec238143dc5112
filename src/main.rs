//! nodetree - Command Line Entry Point
//!
//! Loads a node type registry and a script, optionally replays a session of
//! edits against it, and prints the rebuilt script.
//!
//! ```text
//! nodetree <types.json> <script.json> [--edits <edits.json>] [--config <editor.toml>]
//! ```
//!
//! An edit session is a JSON array of operations, for example
//! `[{"op": "create", "type": "ocropus.Binarize", "x": 100, "y": 40}, {"op": "undo"}]`.

use anyhow::Context;
use clap::Parser;
use nodetree_rs::config::{EditorConfig, LoggingSettings};
use nodetree_rs::graph::{ParamValue, PlugRef, Point, TypeRegistry};
use nodetree_rs::Editor;
use serde::Deserialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// One step of a replayed edit session.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum EditOp {
    Add {
        name: String,
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Create {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Delete {
        name: String,
    },
    Connect {
        src: String,
        dst: String,
    },
    Detach {
        plug: String,
    },
    Ignore {
        name: String,
    },
    View {
        name: String,
    },
    Set {
        node: String,
        param: String,
        value: ParamValue,
    },
    Move {
        names: Vec<String>,
        dx: f64,
        dy: f64,
    },
    Rename {
        old: String,
        new: String,
    },
    Undo,
    Redo,
}

/// Replay an edit session against a pipeline script.
#[derive(Debug, Parser)]
#[command(name = "nodetree")]
#[command(version)]
#[command(about = "Load a node-graph script, replay edits against it and print the result")]
struct Cli {
    /// Node type registry (JSON array of type descriptors)
    types: PathBuf,

    /// Script to load
    script: PathBuf,

    /// Edit session to replay (JSON array of operations)
    #[arg(long)]
    edits: Option<PathBuf>,

    /// Editor settings; defaults to the app data directory
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging(settings: &LoggingSettings) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    let (file_layer, guard) = match &settings.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "nodetree.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn parse_plug(text: &str) -> anyhow::Result<PlugRef> {
    text.parse::<PlugRef>()
        .with_context(|| format!("bad plug reference {:?}", text))
}

fn apply(editor: &mut Editor, op: EditOp) -> anyhow::Result<()> {
    match op {
        EditOp::Add {
            name,
            type_name,
            x,
            y,
        } => editor.cmd_add_node(&name, &type_name, Point::new(x, y))?,
        EditOp::Create { type_name, x, y } => {
            let name = editor.cmd_create_node(&type_name, Point::new(x, y))?;
            tracing::info!("Created {}", name);
        }
        EditOp::Delete { name } => editor.cmd_delete_node(&name)?,
        EditOp::Connect { src, dst } => editor.cmd_drop_cable(parse_plug(&src)?, parse_plug(&dst)?)?,
        EditOp::Detach { plug } => editor.cmd_detach_plug(parse_plug(&plug)?)?,
        EditOp::Ignore { name } => editor.cmd_toggle_ignored(&name)?,
        EditOp::View { name } => editor.cmd_toggle_viewing(&name)?,
        EditOp::Set { node, param, value } => editor.cmd_set_parameter(&node, &param, value)?,
        EditOp::Move { names, dx, dy } => editor.cmd_move_nodes_by(names, dx, dy)?,
        EditOp::Rename { old, new } => editor.cmd_rename_node(&old, &new)?,
        EditOp::Undo => {
            if !editor.undo()? {
                tracing::warn!("Nothing to undo");
            }
        }
        EditOp::Redo => {
            if !editor.redo()? {
                tracing::warn!("Nothing to redo");
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::load_or_default(),
    };
    let _log_guard = init_logging(&config.logging);

    tracing::info!("Starting nodetree");

    let types_json = std::fs::read_to_string(&args.types)
        .with_context(|| format!("reading {}", args.types.display()))?;
    let types = TypeRegistry::from_json(&types_json)
        .with_context(|| format!("parsing {}", args.types.display()))?;
    tracing::debug!("Loaded {} node types", types.len());

    let mut editor = Editor::new(types, config);
    editor.load_script_file(&args.script)?;
    editor.announce_ready();

    if let Some(path) = &args.edits {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let ops: Vec<EditOp> = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        for (i, op) in ops.into_iter().enumerate() {
            apply(&mut editor, op).with_context(|| format!("edit #{}", i))?;
        }
        tracing::info!(
            "Applied edit session; {} undoable steps",
            editor.stack().len()
        );
    }

    println!("{}", editor.build_script().to_json_pretty()?);
    Ok(())
}
