//! `shootclock tags`: the tag catalog over the booted store.

use clap::Subcommand;
use shoot_core::config::ShootConfig;
use shoot_core::storage::StorageConfig;
use shoot_core::tags::{Tag, TagCatalog};

use crate::boot;

#[derive(Subcommand)]
pub enum TagCommand {
    /// List tags grouped by group name
    List {
        /// Print groups as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a tag at the end of its group
    Add {
        name: String,

        #[arg(long)]
        group: Option<String>,
    },

    /// Rename a tag, optionally moving it to another group
    Rename {
        id: String,
        name: String,

        #[arg(long)]
        group: Option<String>,
    },

    Activate { id: String },

    Deactivate { id: String },

    /// Move a tag to a position within its group
    Move { id: String, index: u32 },

    Remove { id: String },
}

pub fn run(storage: &StorageConfig, config: &ShootConfig, command: TagCommand) -> Result<(), String> {
    let arbiter = boot::arbiter(storage, config);
    let store = boot::runtime()?.block_on(boot::ready_store(&arbiter));
    boot::marker(storage).mark_clean_exit();
    let catalog = TagCatalog::with_default_group(store?, &config.default_tag_group);

    match command {
        TagCommand::List { json } => {
            let groups = catalog.list_by_group()?;
            if json {
                let out = serde_json::to_string_pretty(&groups)
                    .map_err(|e| format!("Failed to serialize tags: {}", e))?;
                println!("{}", out);
            } else {
                for group in groups {
                    println!("{}", group.name);
                    for tag in &group.tags {
                        println!("  {}", describe(tag));
                    }
                }
            }
        }
        TagCommand::Add { name, group } => {
            let tag = catalog.add(&name, group.as_deref())?;
            println!("{}", describe(&tag));
        }
        TagCommand::Rename { id, name, group } => {
            let tag = catalog.update(&id, &name, group.as_deref())?;
            println!("{}", describe(&tag));
        }
        TagCommand::Activate { id } => {
            catalog.set_active(&id, true)?;
        }
        TagCommand::Deactivate { id } => {
            catalog.set_active(&id, false)?;
        }
        TagCommand::Move { id, index } => {
            let tag = catalog.move_tag(&id, index)?;
            println!("{}", describe(&tag));
        }
        TagCommand::Remove { id } => {
            catalog.remove(&id)?;
        }
    }
    Ok(())
}

fn describe(tag: &Tag) -> String {
    let marker = if tag.is_active { ' ' } else { '-' };
    format!(
        "{}{:>2}  {}  {} [{}]",
        marker, tag.sort_index, tag.id, tag.name, tag.group
    )
}
