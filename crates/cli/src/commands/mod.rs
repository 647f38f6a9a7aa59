//! CLI subcommands and the wiring they share.

pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod memory;
pub mod vendors;

use std::path::Path;
use std::sync::Arc;
use quartermaster_agent::{build_memory_layer, AgentOrchestrator};
use quartermaster_config::AppConfig;
use quartermaster_core::event::EventBus;
use quartermaster_memory::MemoryLayer;
use quartermaster_providers::ProviderRouter;
use quartermaster_tools::JsonVendorCatalog;

/// Load `path`, or the default config file, with environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    config.validate_keys();
    Ok(config)
}

pub fn build_router(config: &AppConfig) -> Result<ProviderRouter, Box<dyn std::error::Error>> {
    let router = quartermaster_providers::build_from_config(config)?;
    Ok(router)
}

/// The configured memory layer over the on-disk collection.
pub fn build_memory(
    config: &AppConfig,
    router: &ProviderRouter,
) -> Result<Arc<MemoryLayer>, Box<dyn std::error::Error>> {
    let chat = router.chat().ok_or("No chat provider configured")?;
    let memory = build_memory_layer(config, chat, router.embedding())?;
    Ok(memory)
}

/// Everything a conversation needs, wired from configuration.
pub fn build_orchestrator(
    config: &AppConfig,
    event_bus: Arc<EventBus>,
) -> Result<Arc<AgentOrchestrator>, Box<dyn std::error::Error>> {
    let router = build_router(config)?;
    let memory = build_memory(config, &router)?;
    let chat = router.chat().ok_or("No chat provider configured")?;
    let catalog = Arc::new(JsonVendorCatalog::new(&config.vendors.catalog_path));

    Ok(Arc::new(AgentOrchestrator::from_config(
        config, chat, memory, catalog, event_bus,
    )))
}
