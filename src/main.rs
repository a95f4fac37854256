mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use gantry_config::{EditorConfig, NodeKind, PersistenceMode, Position, StoreConfig};
use gantry_editor::{EditorEvent, EditorNotifier, FlowEditor};
use gantry_export::FlowFormat;
use gantry_registry::NodeKindRegistry;
use gantry_store::{FlowPersistence, FsKvStore, SwitchableStore};

use crate::logging::{LogFormat, init_logging};

type Store = Arc<SwitchableStore>;

/// Gantry - build API flows from typed pipeline nodes
#[derive(Parser)]
#[command(name = "gantry")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.gantry)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Keep everything in memory for this run; nothing is written to disk
  #[arg(long, global = true)]
  ephemeral: bool,

  /// Document format for export/import (json or yaml)
  #[arg(long, global = true, default_value = "json")]
  format: FlowFormat,

  /// Editor settings file (JSON); missing fields take their defaults
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Reject connections that would close a cycle
  #[arg(long, global = true)]
  forbid_cycles: bool,

  /// Log filter, e.g. `debug` or `gantry_store=debug` (default: $GANTRY_LOG, $RUST_LOG, info)
  #[arg(long, global = true)]
  log_level: Option<String>,

  /// Log format (compact or pretty)
  #[arg(long, global = true, default_value = "compact")]
  log_format: LogFormat,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Create a flow with a trigger connected to an output
  New {
    name: String,

    #[arg(long, default_value = "cli")]
    created_by: String,
  },

  /// List stored flows
  List,

  /// Show a flow's nodes and edges
  Show { flow_id: String },

  /// Print the gateway definition derived from a flow
  Definition { flow_id: String },

  /// Add a node with its kind's defaults
  Add {
    flow_id: String,
    kind: NodeKind,

    #[arg(long, default_value_t = 0.0)]
    x: f64,

    #[arg(long, default_value_t = 0.0)]
    y: f64,

    #[arg(long)]
    label: Option<String>,

    /// Publish instead of saving
    #[arg(long)]
    publish: bool,
  },

  /// Copy a node next to the original
  DuplicateNode {
    flow_id: String,
    node_id: String,

    #[arg(long)]
    publish: bool,
  },

  /// Delete a node and its edges
  DeleteNode {
    flow_id: String,
    node_id: String,

    #[arg(long)]
    publish: bool,
  },

  /// Connect two nodes
  Connect {
    flow_id: String,
    source: String,
    target: String,

    #[arg(long)]
    publish: bool,
  },

  /// Remove an edge
  Disconnect {
    flow_id: String,
    edge_id: String,

    #[arg(long)]
    publish: bool,
  },

  /// Set a node configuration field. The value is parsed as JSON, falling back to a string
  Set {
    flow_id: String,
    node_id: String,
    field: String,
    value: String,

    #[arg(long)]
    publish: bool,
  },

  /// Re-publish a published flow
  Publish { flow_id: String },

  /// Show a flow's saved versions, most recent first
  History { flow_id: String },

  /// Write a flow document to stdout
  Export { flow_id: String },

  /// Store a flow document read from a file
  Import { file: PathBuf },

  /// Delete a flow (its history is kept)
  Delete { flow_id: String },

  /// Store an unpublished copy of a flow
  Duplicate { flow_id: String, name: String },

}

/// Prints editor toasts to stderr.
struct ConsoleNotifier;

impl EditorNotifier for ConsoleNotifier {
  fn notify(&self, event: EditorEvent) {
    match event {
      EditorEvent::ConnectionRejected { reason } => eprintln!("Rejected: {reason}"),
      EditorEvent::Saved { flow_id } => eprintln!("Saved {flow_id}"),
      EditorEvent::SaveFailed { flow_id, error } => eprintln!("Save of {flow_id} failed: {error}"),
      EditorEvent::PublishProgress { progress, .. } => eprintln!("Publishing... {progress}%"),
      EditorEvent::Published { flow_id } => eprintln!("Published {flow_id}"),
      EditorEvent::ImportFailed { error } => eprintln!("Import failed: {error}"),
      _ => {}
    }
  }
}

/// Everything a command needs: persistence, the registry and editor settings.
struct Session {
  persistence: Arc<FlowPersistence<Store>>,
  registry: Arc<NodeKindRegistry>,
  config: EditorConfig,
}

impl Session {
  async fn open_editor(&self, flow_id: &str) -> Result<FlowEditor<Store>> {
    let editor = FlowEditor::open(
      flow_id,
      self.registry.clone(),
      self.persistence.clone(),
      self.config.clone(),
    )
    .await
    .with_context(|| format!("failed to load flow: {flow_id}"))?
    .ok_or_else(|| anyhow!("flow not found: {flow_id}"))?;

    Ok(editor.with_notifier(Arc::new(ConsoleNotifier)))
  }

  fn new_editor(&self, name: &str, created_by: &str) -> Result<FlowEditor<Store>> {
    let editor = FlowEditor::create(
      name,
      created_by,
      self.registry.clone(),
      self.persistence.clone(),
      self.config.clone(),
    )
    .context("failed to create flow")?;

    Ok(editor.with_notifier(Arc::new(ConsoleNotifier)))
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.log_level.as_deref(), cli.log_format)?;

  let Some(command) = cli.command else {
    println!("gantry - use --help to see available commands");
    return Ok(());
  };

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".gantry"),
  };

  let mut store_config = StoreConfig::new(data_dir);
  if cli.ephemeral {
    store_config.mode = PersistenceMode::Ephemeral;
  }

  let mut config = match &cli.config {
    Some(path) => load_editor_config(path)?,
    None => EditorConfig::default(),
  };
  if cli.forbid_cycles {
    config.connection_policy.forbid_cycles = true;
  }

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run(command, store_config, config, cli.format).await })
}

fn load_editor_config(path: &Path) -> Result<EditorConfig> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read config file: {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))
}

async fn run(
  command: Commands,
  store_config: StoreConfig,
  config: EditorConfig,
  format: FlowFormat,
) -> Result<()> {
  debug!(
    data_dir = %store_config.data_dir.display(),
    mode = ?store_config.mode,
    "opening flow store"
  );
  let durable = Arc::new(FsKvStore::new(store_config.flows_dir()));
  let store: Store = Arc::new(SwitchableStore::new(durable, store_config.mode));
  let session = Session {
    persistence: Arc::new(FlowPersistence::with_history_limit(
      store,
      config.history_limit,
    )),
    registry: Arc::new(NodeKindRegistry::standard()),
    config,
  };

  match command {
    Commands::New { name, created_by } => {
      let mut editor = session.new_editor(&name, &created_by)?;
      editor.save().await.context("failed to save flow")?;
      println!("{}", editor.flow().id);
    }

    Commands::List => {
      let flows = session
        .persistence
        .list_flows()
        .await
        .context("failed to list flows")?;
      for flow in flows {
        println!(
          "{}\t{}\t{} nodes\t{}\t{}",
          flow.id,
          flow.name,
          flow.node_count,
          if flow.published { "published" } else { "draft" },
          flow.last_updated.to_rfc3339()
        );
      }
    }

    Commands::Show { flow_id } => {
      let editor = session.open_editor(&flow_id).await?;
      let flow = editor.flow();
      println!("{} ({})", flow.name, flow.id);
      println!("published: {}", flow.published);
      println!("nodes:");
      for node in &flow.nodes {
        println!(
          "  {}\t{}\t{}\t({}, {})",
          node.id,
          node.kind,
          node.label(),
          node.position.x,
          node.position.y
        );
      }
      println!("edges:");
      for edge in &flow.edges {
        println!("  {}\t{} -> {}", edge.id, edge.source, edge.target);
      }
    }

    Commands::Definition { flow_id } => {
      let editor = session.open_editor(&flow_id).await?;
      println!("{}", serde_json::to_string_pretty(&editor.api_definition())?);
    }

    Commands::Add {
      flow_id,
      kind,
      x,
      y,
      label,
      publish,
    } => {
      let mut editor = session.open_editor(&flow_id).await?;
      let node_id = editor
        .add_node(kind, Position::new(x, y), label.as_deref())
        .context("failed to add node")?;
      commit(&mut editor, publish).await?;
      println!("{node_id}");
    }

    Commands::DuplicateNode {
      flow_id,
      node_id,
      publish,
    } => {
      let mut editor = session.open_editor(&flow_id).await?;
      let copy_id = editor
        .duplicate_node(&node_id)
        .ok_or_else(|| anyhow!("node not found: {node_id}"))?;
      commit(&mut editor, publish).await?;
      println!("{copy_id}");
    }

    Commands::DeleteNode {
      flow_id,
      node_id,
      publish,
    } => {
      let mut editor = session.open_editor(&flow_id).await?;
      if !editor.delete_node(&node_id) {
        bail!("node not found: {node_id}");
      }
      commit(&mut editor, publish).await?;
    }

    Commands::Connect {
      flow_id,
      source,
      target,
      publish,
    } => {
      let mut editor = session.open_editor(&flow_id).await?;
      match editor.connect(&source, &target)? {
        Some(edge_id) => {
          commit(&mut editor, publish).await?;
          println!("{edge_id}");
        }
        None => eprintln!("Nothing to connect: unknown node or edge already present"),
      }
    }

    Commands::Disconnect {
      flow_id,
      edge_id,
      publish,
    } => {
      let mut editor = session.open_editor(&flow_id).await?;
      if !editor.disconnect(&edge_id) {
        bail!("edge not found: {edge_id}");
      }
      commit(&mut editor, publish).await?;
    }

    Commands::Set {
      flow_id,
      node_id,
      field,
      value,
      publish,
    } => {
      let mut editor = session.open_editor(&flow_id).await?;
      let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
      if !editor.set_node_field(&node_id, &field, value) {
        bail!("node not found: {node_id}");
      }
      commit(&mut editor, publish).await?;
    }

    Commands::Publish { flow_id } => {
      let mut editor = session.open_editor(&flow_id).await?;
      editor.publish().await.context("publish failed")?;
    }

    Commands::History { flow_id } => {
      let history = session
        .persistence
        .load_history(&flow_id)
        .await
        .with_context(|| format!("failed to load history: {flow_id}"))?;
      for (i, entry) in history.iter().enumerate() {
        println!(
          "{}\t{}\t{} nodes\t{}",
          i,
          entry.saved_at().to_rfc3339(),
          entry.flow().nodes.len(),
          if entry.published() { "published" } else { "saved" }
        );
      }
    }

    Commands::Export { flow_id } => {
      let editor = session.open_editor(&flow_id).await?;
      println!("{}", editor.export(format)?);
    }

    Commands::Import { file } => {
      let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read file: {}", file.display()))?;
      let format = format_for(&file, format);

      let mut editor = session.new_editor("imported", "cli")?;
      editor
        .import(&text, format)
        .with_context(|| format!("failed to import: {}", file.display()))?;
      editor.save().await.context("failed to save imported flow")?;
      println!("{}", editor.flow().id);
    }

    Commands::Delete { flow_id } => {
      session
        .persistence
        .delete_flow(&flow_id)
        .await
        .with_context(|| format!("failed to delete flow: {flow_id}"))?;
    }

    Commands::Duplicate { flow_id, name } => {
      let copy = session
        .persistence
        .duplicate_flow(&flow_id, name)
        .await
        .with_context(|| format!("failed to duplicate flow: {flow_id}"))?
        .ok_or_else(|| anyhow!("flow not found: {flow_id}"))?;
      println!("{}", copy.id);
    }

  }

  Ok(())
}

/// Persist an edit: publish when asked, save otherwise.
async fn commit(editor: &mut FlowEditor<Store>, publish: bool) -> Result<()> {
  if publish {
    editor.publish().await.context("publish failed")
  } else {
    editor.save().await.context("failed to save flow")
  }
}

/// The file extension wins over `--format` when it names a known format.
fn format_for(path: &Path, fallback: FlowFormat) -> FlowFormat {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .and_then(|ext| ext.parse().ok())
    .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cli_parses_global_flags() {
    let cli = Cli::try_parse_from([
      "gantry",
      "--ephemeral",
      "--format",
      "yaml",
      "add",
      "flow-1",
      "rate-limit",
      "--x",
      "10",
      "--publish",
    ])
    .unwrap();

    assert!(cli.ephemeral);
    assert_eq!(cli.format, FlowFormat::Yaml);
    let Some(Commands::Add {
      kind, x, publish, ..
    }) = cli.command
    else {
      panic!("expected add");
    };
    assert_eq!(kind, NodeKind::RateLimit);
    assert_eq!(x, 10.0);
    assert!(publish);
  }

  #[test]
  fn test_unknown_kind_is_rejected() {
    assert!(Cli::try_parse_from(["gantry", "add", "flow-1", "webhook"]).is_err());
  }

  #[test]
  fn test_format_from_extension() {
    assert_eq!(
      format_for(Path::new("flow.yml"), FlowFormat::Json),
      FlowFormat::Yaml
    );
    assert_eq!(
      format_for(Path::new("flow.txt"), FlowFormat::Yaml),
      FlowFormat::Yaml
    );
    assert_eq!(format_for(Path::new("flow"), FlowFormat::Json), FlowFormat::Json);
  }
}
