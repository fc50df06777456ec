//! Designer Replay
//!
//! Replays a recorded editing session against an in-memory document and
//! prints the resulting template JSON. Useful for reproducing drag/drop
//! bugs reported from the designer without a browser.
//!
//! Usage:
//!   designer-replay <script.json> [config.json]
//!
//! A script looks like:
//!
//! ```json
//! {
//!   "document": { "type": "doc", "content": [] },
//!   "layout": { "items": [], "columns": [] },
//!   "actions": [
//!     { "action": "insertBlock", "blockType": "heading" },
//!     { "action": "paletteDrag", "blockType": "image" },
//!     { "action": "move", "x": 10.0, "y": 40.0 },
//!     { "action": "drop", "target": { "kind": "pointer" } },
//!     { "action": "settle" }
//!   ]
//! }
//! ```

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use template_designer_core::drag::{ColumnRect, GeometryError, ItemRect, LayoutProbe};
use template_designer_core::{
    DesignerConfig, DropTarget, MemoryDocument, TemplateDesigner, VisibleItem,
};

#[derive(Debug, Default, Deserialize)]
struct Layout {
    #[serde(default)]
    items: Vec<ItemRect>,
    #[serde(default)]
    columns: Vec<ColumnRect>,
}

impl LayoutProbe for Layout {
    fn item_rects(&self) -> Result<Vec<ItemRect>, GeometryError> {
        Ok(self.items.clone())
    }

    fn column_rects(&self) -> Result<Vec<ColumnRect>, GeometryError> {
        Ok(self.columns.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum Action {
    #[serde(rename_all = "camelCase")]
    InsertBlock {
        block_type: String,
        #[serde(default)]
        preset_key: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Duplicate { node_id: String },
    #[serde(rename_all = "camelCase")]
    Remove { node_id: String },
    #[serde(rename_all = "camelCase")]
    PaletteDrag {
        block_type: String,
        #[serde(default)]
        preset_key: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ItemDrag { node_id: String },
    Move { x: f64, y: f64 },
    Drop { target: DropTarget },
    Cancel,
    /// Replace the layout used by later drags
    Layout(Layout),
    Settle,
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    document: Option<Value>,
    #[serde(default)]
    layout: Layout,
    actions: Vec<Action>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(script_path) = args.next() else {
        bail!("usage: designer-replay <script.json> [config.json]");
    };

    let config = match args.next() {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {path}"))?;
            DesignerConfig::from_json_str(&raw)?
        }
        None => DesignerConfig::default(),
    };

    let raw = std::fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read script {script_path}"))?;
    let script: Script = serde_json::from_str(&raw).context("Invalid replay script")?;

    let document = match script.document {
        Some(value) => MemoryDocument::from_json(value).context("Invalid initial document")?,
        None => MemoryDocument::empty(),
    };
    let mut designer = TemplateDesigner::new(document, config)?;
    let mut layout = script.layout;

    tracing::info!("Replaying {} actions from {}", script.actions.len(), script_path);

    for (step, action) in script.actions.into_iter().enumerate() {
        tracing::debug!("step {}: {:?}", step, action);
        match action {
            Action::InsertBlock {
                block_type,
                preset_key,
            } => {
                let id = designer.insert_block(&block_type, preset_key.as_deref())?;
                tracing::info!("step {}: inserted {} ({})", step, block_type, id);
            }
            Action::Duplicate { node_id } => {
                let id = designer.duplicate_block(&node_id)?;
                tracing::info!("step {}: duplicated {} as {}", step, node_id, id);
            }
            Action::Remove { node_id } => {
                designer.remove_block(&node_id)?;
                tracing::info!("step {}: removed {}", step, node_id);
            }
            Action::PaletteDrag {
                block_type,
                preset_key,
            } => {
                let item = match preset_key {
                    Some(key) => VisibleItem::preset(block_type, key),
                    None => VisibleItem::block(block_type),
                };
                designer.start_palette_drag(&item, Some(&layout))?;
            }
            Action::ItemDrag { node_id } => designer.start_item_drag(&node_id)?,
            Action::Move { x, y } => {
                let update = designer.drag_move(x, y);
                tracing::debug!("step {}: {:?}", step, update);
            }
            Action::Drop { target } => {
                let outcome = designer.drop(target);
                tracing::info!("step {}: drop -> {:?}", step, outcome);
            }
            Action::Cancel => designer.cancel_drag(),
            Action::Layout(next) => layout = next,
            Action::Settle => settle(&mut designer),
        }
    }

    settle(&mut designer);

    let output = serde_json::to_string_pretty(&designer.document().to_json())?;
    println!("{output}");
    Ok(())
}

/// Run every pending resync and focus task
fn settle(designer: &mut TemplateDesigner<MemoryDocument>) {
    let start = designer.host_now().max(Instant::now());
    designer.tick(start);
    let later = start + Duration::from_secs(1);
    designer.tick(later);
    designer.animation_frame(later);
}
