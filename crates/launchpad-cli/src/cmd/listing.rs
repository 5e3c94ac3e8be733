use crate::cmd::{block_on, Workspace};
use crate::output::{print_json, print_table, truncate};
use clap::Subcommand;
use launchpad_core::ListingField;
use std::path::Path;

#[derive(Subcommand)]
pub enum ListingSubcommand {
    /// Show every listing field with its value and checklist status
    Show,
    /// Save a field and update its checklist item to match
    Set {
        /// Field name, e.g. name, subtitle, keywords
        field: String,
        /// New value; an empty string clears the field
        value: String,
    },
    /// Show the checklist status of every field
    Status,
}

pub fn run(root: &Path, subcmd: ListingSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        ListingSubcommand::Show => show(&ws, json),
        ListingSubcommand::Set { field, value } => set(&ws, &field, &value, json),
        ListingSubcommand::Status => status(&ws, json),
    }
}

fn show(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let session = block_on(ws.launchpad.edit_session(ws.slug()))??;

    if json {
        let fields: Vec<serde_json::Value> = ListingField::all()
            .iter()
            .map(|f| {
                serde_json::json!({
                    "field": f,
                    "value": session.value(*f),
                    "status": session.status(*f),
                })
            })
            .collect();
        return print_json(&fields);
    }

    let rows = ListingField::all()
        .iter()
        .map(|f| {
            vec![
                f.to_string(),
                truncate(session.value(*f), 48),
                session.status(*f).to_string(),
            ]
        })
        .collect();
    print_table(&["FIELD", "VALUE", "STATUS"], rows);
    Ok(())
}

fn set(ws: &Workspace, field: &str, value: &str, json: bool) -> anyhow::Result<()> {
    let field: ListingField = field.parse()?;
    let (outcome, status) = block_on(async {
        let mut session = ws.launchpad.edit_session(ws.slug()).await?;
        session.set(field, value);
        let outcome = session.save(field).await?;
        Ok::<_, launchpad_core::LaunchpadError>((outcome, session.status(field)))
    })??;

    if json {
        print_json(&serde_json::json!({
            "field": outcome.field,
            "item_key": outcome.item_key,
            "toggled": outcome.toggled,
            "status": status,
        }))?;
    } else {
        match outcome.toggled {
            Some(true) => println!("Saved {field}; checked '{}'", outcome.item_key),
            Some(false) => println!("Saved {field}; unchecked '{}'", outcome.item_key),
            None => println!("Saved {field}"),
        }
    }
    Ok(())
}

fn status(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let session = block_on(ws.launchpad.edit_session(ws.slug()))??;
    let statuses = session.synchronizer().statuses();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = statuses
            .iter()
            .map(|(f, s)| (f.to_string(), s.as_str().into()))
            .collect();
        return print_json(&map);
    }

    let rows = statuses
        .iter()
        .map(|(f, s)| vec![f.label().to_string(), s.to_string()])
        .collect();
    print_table(&["FIELD", "STATUS"], rows);
    Ok(())
}
