//! `tiles inspect`: resolve a source and show its manifest metadata.

use anyhow::{Context, Result};
use colored::Colorize;
use tiles_loader::Manifest;

use super::default_registry;

/// What the registry made of a source.
#[derive(Debug)]
pub(crate) enum Inspection {
    /// A loader claimed the source.
    Claimed(Manifest),
    /// Every loader declined it.
    Unclaimed,
}

pub(crate) async fn inspect(source: &str) -> Result<Inspection> {
    let registry = default_registry();
    let tile = registry
        .resolve(source)
        .await
        .with_context(|| format!("failed to load {source}"))?;
    Ok(match tile {
        Some(tile) => Inspection::Claimed(tile.manifest),
        None => Inspection::Unclaimed,
    })
}

pub(crate) async fn run_inspect(source: &str) -> Result<()> {
    match inspect(source).await? {
        Inspection::Claimed(manifest) => {
            println!("{} {source}", "Tile".cyan().bold());
            println!(
                "  title: {}",
                manifest.title().unwrap_or("(none)")
            );
            match manifest.primary_icon() {
                Some(icon) => println!("  icon:  {}", icon.src),
                None => println!("  icon:  (none)"),
            }
            if manifest.icons.len() > 1 {
                println!("  {} more icon(s) listed", manifest.icons.len().saturating_sub(1));
            }
        },
        Inspection::Unclaimed => {
            println!("{} no loader claimed {source}", "WARN".yellow());
        },
    }
    Ok(())
}
