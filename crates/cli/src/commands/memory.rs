//! `quartermaster learn` and `quartermaster memory`: memory management commands.

use std::path::Path;
use quartermaster_core::memory::TIMESTAMP_KEY;

pub async fn learn(config_path: Option<&Path>, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let router = super::build_router(&config)?;
    let memory = super::build_memory(&config, &router)?;

    let fact = memory.add(text, None).await?;
    println!("Learned: {fact}");
    Ok(())
}

pub async fn list(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let router = super::build_router(&config)?;
    let memory = super::build_memory(&config, &router)?;

    let facts = memory.get_all().await?;
    println!("Memory: {} ({} facts)", config.memory.collection_path().display(), facts.len());
    println!();

    if facts.is_empty() {
        println!("  Nothing remembered yet. Teach a rule with `quartermaster learn \"...\"`.");
        return Ok(());
    }
    for (i, view) in facts.iter().enumerate() {
        let learned_at = view
            .metadata
            .get(TIMESTAMP_KEY)
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "unknown".into());
        println!("  {:>2}. {}", i + 1, view.fact);
        println!("      learned: {learned_at}");
    }
    Ok(())
}

pub async fn search(
    config_path: Option<&Path>,
    query: &str,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let router = super::build_router(&config)?;
    let memory = super::build_memory(&config, &router)?;

    println!("Searching memories for: \"{query}\"");
    println!();

    let hits = memory.search(query, limit).await?;
    if hits.is_empty() {
        println!("  No memories found.");
        return Ok(());
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("  {:>2}. [distance: {:.3}] {}", i + 1, hit.score, hit.fact);
    }
    Ok(())
}
