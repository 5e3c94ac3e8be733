use crate::cmd::{block_on, Workspace};
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use launchpad_core::checklist::{self, ChecklistItem};
use launchpad_core::types::ChecklistCategory;
use std::path::Path;

#[derive(Subcommand)]
pub enum ChecklistSubcommand {
    /// List checklist items, optionally for one category
    List {
        /// store_listing, pre_launch, launch_day or post_launch
        #[arg(long)]
        category: Option<String>,
    },
    /// Check or uncheck an item by key
    Toggle {
        item_key: String,
        #[arg(long, default_value = "store_listing")]
        category: String,
        /// Mark the item complete
        #[arg(long, conflicts_with = "undo")]
        done: bool,
        /// Mark the item incomplete
        #[arg(long)]
        undo: bool,
    },
}

pub fn run(root: &Path, subcmd: ChecklistSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        ChecklistSubcommand::List { category } => list(&ws, category.as_deref(), json),
        ChecklistSubcommand::Toggle {
            item_key,
            category,
            done,
            undo,
        } => toggle(&ws, &item_key, &category, done, undo, json),
    }
}

fn list(ws: &Workspace, category: Option<&str>, json: bool) -> anyhow::Result<()> {
    let categories = match category {
        Some(c) => vec![c.parse::<ChecklistCategory>()?],
        None => ChecklistCategory::all().to_vec(),
    };

    let items: Vec<ChecklistItem> = block_on(async {
        let project = ws.launchpad.project(ws.slug()).await?;
        let mut items = Vec::new();
        for category in categories {
            items.extend(ws.launchpad.checklist(&project.id, category).await?);
        }
        Ok::<_, launchpad_core::LaunchpadError>(items)
    })??;

    if json {
        return print_json(&serde_json::json!({
            "progress": checklist::progress(&items),
            "items": items,
        }));
    }

    if items.is_empty() {
        println!("No checklist items.");
        return Ok(());
    }
    let rows = items
        .iter()
        .map(|i| {
            vec![
                if i.is_completed { "[x]" } else { "[ ]" }.to_string(),
                i.category.to_string(),
                i.item_key.clone(),
                i.title.clone(),
            ]
        })
        .collect();
    print_table(&["", "CATEGORY", "KEY", "TITLE"], rows);
    println!();
    println!("{}", checklist::summarize(&items));
    Ok(())
}

fn toggle(
    ws: &Workspace,
    item_key: &str,
    category: &str,
    done: bool,
    undo: bool,
    json: bool,
) -> anyhow::Result<()> {
    let category: ChecklistCategory = category.parse()?;
    let item = block_on(async {
        let project = ws.launchpad.project(ws.slug()).await?;
        let items = ws.launchpad.checklist(&project.id, category).await?;
        let item = checklist::find_by_key(&items, item_key)
            .cloned()
            .with_context(|| format!("no '{item_key}' item in the {category} checklist"))?;
        // without a flag, flip the current state
        let completed = if done || undo { done } else { !item.is_completed };
        Ok::<_, anyhow::Error>(ws.launchpad.toggle_item(&item.id, completed).await?)
    })??;

    if json {
        print_json(&item)?;
    } else {
        let mark = if item.is_completed { "[x]" } else { "[ ]" };
        println!("{mark} {}", item.title);
    }
    Ok(())
}
