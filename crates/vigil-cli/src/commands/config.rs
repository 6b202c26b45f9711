//! Configuration command handlers
use anyhow::Result;
use vigil_core::config::{default_config_path, API_URL_ENV};
use vigil_core::MonitorConfig;

pub fn handle_config_show(config: &MonitorConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    if std::env::var(API_URL_ENV).is_ok() {
        println!("# service.api_url taken from {API_URL_ENV}");
    }
    Ok(())
}

pub fn handle_config_path() -> Result<()> {
    println!("{}", default_config_path()?.display());
    Ok(())
}
