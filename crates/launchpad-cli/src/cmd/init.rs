use crate::cmd::block_on;
use crate::output::print_json;
use anyhow::bail;
use launchpad_core::paths::validate_slug;
use launchpad_core::{AnyStore, Config, Launchpad, LaunchpadError};
use std::path::Path;

pub fn run(root: &Path, slug: &str, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    validate_slug(slug)?;
    let name = name.map(str::to_string).unwrap_or_else(|| display_name(slug));

    let config = match Config::load(root) {
        Ok(existing) if existing.project.slug == slug => existing,
        Ok(existing) => bail!(
            "{} already tracks project '{}'",
            root.display(),
            existing.project.slug
        ),
        Err(LaunchpadError::NotInitialized) => {
            let config = Config::new(slug, &name);
            config.save(root)?;
            config
        }
        Err(e) => return Err(e.into()),
    };

    let launchpad = Launchpad::new(AnyStore::from_config(root, &config)?);
    let created = block_on(async {
        match launchpad.init_project(slug, &config.project.name).await {
            Ok(project) => Ok(Some(project)),
            Err(e) if matches!(e.root(), LaunchpadError::ProjectExists(_)) => Ok(None),
            Err(e) => Err(e),
        }
    })??;

    if json {
        print_json(&serde_json::json!({
            "slug": slug,
            "name": config.project.name,
            "created": created.is_some(),
            "project_id": created.as_ref().map(|p| p.id.clone()),
        }))?;
    } else if let Some(project) = created {
        println!("Initialized project '{}' ({})", project.slug, project.name);
    } else {
        println!("Project '{slug}' is already initialized");
    }
    Ok(())
}

/// "fitness-coach" -> "Fitness Coach"
fn display_name(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
