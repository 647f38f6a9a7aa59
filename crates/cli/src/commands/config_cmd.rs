//! `quartermaster config`: print the default configuration.

use std::path::Path;
use quartermaster_config::AppConfig;

pub fn run(config_path: Option<&Path>) {
    let target = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    println!("# Save as {}", target.display());
    println!("{}", AppConfig::default_toml());
}
