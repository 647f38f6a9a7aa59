//! `quartermaster doctor`: Diagnose configuration, memory store and catalog.

use std::path::Path;
use quartermaster_config::AppConfig;
use quartermaster_tools::{JsonVendorCatalog, VendorCatalog};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Quartermaster Doctor: System Diagnostics");
    println!("=========================================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if path.exists() {
        println!("  [ok]   Config file found at {}", path.display());
    } else {
        println!("  [info] No config file at {}, using defaults", path.display());
    }

    let config = match AppConfig::load_with_env(&path) {
        Ok(config) => {
            println!("  [ok]   Configuration valid");
            config
        }
        Err(e) => {
            println!("  [fail] Configuration invalid: {e}");
            println!("\n  1 issue found. Fix the configuration and run doctor again.");
            return Ok(());
        }
    };

    println!("         LLM:        {}", config.llm.model_string());
    println!("         Embeddings: {}", config.embedding.model_string());

    for warning in config.validate_keys() {
        println!("  [warn] {warning}");
        issues += 1;
    }

    let router = match super::build_router(&config) {
        Ok(router) => {
            println!("  [ok]   Providers: {}", router.list().join(", "));
            Some(router)
        }
        Err(e) => {
            println!("  [fail] Providers could not be built: {e}");
            issues += 1;
            None
        }
    };

    if let Some(router) = &router {
        match super::build_memory(&config, router) {
            Ok(memory) => match memory.count().await {
                Ok(count) => println!(
                    "  [ok]   Memory store {} ({count} facts)",
                    config.memory.collection_path().display()
                ),
                Err(e) => {
                    println!("  [fail] Memory store unreadable: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  [fail] Memory store could not be opened: {e}");
                issues += 1;
            }
        }
    }

    let catalog = JsonVendorCatalog::new(&config.vendors.catalog_path);
    match catalog.all().await {
        Ok(offers) => println!(
            "  [ok]   Vendor catalog {} ({} offers)",
            catalog.path().display(),
            offers.len()
        ),
        Err(e) => {
            println!("  [fail] {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
