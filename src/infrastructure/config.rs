use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub grid: GridSettings,
    pub snapshot: SnapshotSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GridSettings {
    pub columns: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotSettings {
    pub enabled: bool,
    pub cell_width: u32,
    pub cell_height: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("store.backend", "file")?
        .set_default("store.path", "data")?
        .set_default("grid.columns", 2)?
        .set_default("snapshot.enabled", true)?
        .set_default("snapshot.cell_width", 96)?
        .set_default("snapshot.cell_height", 64)?
        .set_default("log.level", "info")?)
}

/// Defaults, then `config/registry.*` if present, then `DASHBOARDS__*` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/registry").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARDS")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
