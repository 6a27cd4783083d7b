//! Cache command - inspect or clear the explode cache

use crate::cache::{ExplodeCache, ExplodeEntry};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::commands::ProjectContext;
use crate::error::AarsyncResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the cache command
pub async fn execute(args: CacheArgs, project: &ProjectContext) -> AarsyncResult<()> {
    let cache_file = project.layout.cache_file();

    match args.action {
        CacheAction::List { format } => {
            let cache = ExplodeCache::load(&cache_file);
            let entries: Vec<&ExplodeEntry> = cache.entries().collect();
            if entries.is_empty() && !matches!(format, OutputFormat::Json) {
                println!("No cached artifacts.");
                return Ok(());
            }
            match format {
                OutputFormat::Table => print_cache_table(&entries),
                OutputFormat::Json => print_cache_json(&entries)?,
                OutputFormat::Plain => print_cache_plain(&entries),
            }
            Ok(())
        }
        CacheAction::Path => {
            println!("{}", cache_file.display());
            Ok(())
        }
        CacheAction::Clear { yes } => clear_cache(ExplodeCache::load(&cache_file), yes).await,
    }
}

fn print_cache_table(entries: &[&ExplodeEntry]) {
    println!(
        "{:<45} {:<8} {:<24} {:<20}",
        "ARTIFACT", "EXPLODE", "ABIS", "MODIFIED"
    );
    println!("{}", "-".repeat(100));

    for entry in entries {
        let explode = if entry.explode {
            style("yes").green().to_string()
        } else {
            style("no").dim().to_string()
        };
        let abis = if entry.available_abis.is_universal() {
            "-".to_string()
        } else {
            entry.available_abis.iter().collect::<Vec<_>>().join(",")
        };
        let modified = entry.last_modified.format("%Y-%m-%d %H:%M").to_string();

        println!(
            "{:<45} {:<8} {:<24} {:<20}",
            entry.name, explode, abis, modified
        );
    }

    println!();
    println!("Total: {} artifact(s)", entries.len());
}

fn print_cache_json(entries: &[&ExplodeEntry]) -> AarsyncResult<()> {
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}

fn print_cache_plain(entries: &[&ExplodeEntry]) {
    for entry in entries {
        println!("{}", entry.name);
    }
}

/// Drop every cached decision; the next resolve re-inspects all artifacts
async fn clear_cache(mut cache: ExplodeCache, skip_confirm: bool) -> AarsyncResult<()> {
    let ctx = UiContext::detect().with_auto_yes(skip_confirm);

    if cache.is_empty() && !cache.path().exists() {
        println!("No explode cache to clear.");
        return Ok(());
    }

    let message = format!("Forget {} cached explode decision(s)?", cache.len());
    if !ui::confirm(&ctx, &message, false).await? {
        println!("Aborted.");
        return Ok(());
    }

    cache.clear()?;
    ui::step_ok(&ctx, "Explode cache cleared");
    Ok(())
}
