//! Server configuration loaded from the process environment.
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

use game_content::{ConfigLoader, MapCatalog, MapLoader};
use game_core::GameConfig;
use runtime::RuntimeConfig;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// TOML file overriding the default game rules.
    pub game_config: Option<PathBuf>,
    /// Directory of authored `.ron` maps added to the map vote.
    pub map_dir: Option<PathBuf>,
    /// Directory for the log file; stderr only when unset.
    pub log_dir: Option<PathBuf>,
    pub command_buffer: usize,
    pub event_buffer: usize,
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 7878)),
            game_config: None,
            map_dir: None,
            log_dir: None,
            command_buffer: runtime.command_buffer_size,
            event_buffer: runtime.event_buffer_size,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `POLYGEN_ADDR` - Listen address (default: 127.0.0.1:7878)
    /// - `POLYGEN_GAME_CONFIG` - Game rules TOML file (default: built-in rules)
    /// - `POLYGEN_MAP_DIR` - Directory of authored maps (default: none)
    /// - `POLYGEN_LOG_DIR` - Log file directory (default: stderr only)
    /// - `POLYGEN_COMMAND_BUFFER` - Room mailbox size (default: 32)
    /// - `POLYGEN_EVENT_BUFFER` - Event bus capacity per topic (default: 100)
    /// - `POLYGEN_SEED` - Fixed map seed, for reproducible sessions (default: random)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(addr) = read_env::<SocketAddr>("POLYGEN_ADDR") {
            config.addr = addr;
        }
        config.game_config = env::var_os("POLYGEN_GAME_CONFIG").map(PathBuf::from);
        config.map_dir = env::var_os("POLYGEN_MAP_DIR").map(PathBuf::from);
        config.log_dir = env::var_os("POLYGEN_LOG_DIR").map(PathBuf::from);

        if let Some(capacity) = read_env::<usize>("POLYGEN_COMMAND_BUFFER") {
            config.command_buffer = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("POLYGEN_EVENT_BUFFER") {
            config.event_buffer = capacity.max(1);
        }
        config.seed = read_env::<u64>("POLYGEN_SEED");

        config
    }

    /// Loads the referenced files into a runtime configuration.
    pub fn runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        let game_config = match &self.game_config {
            Some(path) => ConfigLoader::load(path)
                .with_context(|| format!("loading game config {}", path.display()))?,
            None => GameConfig::default(),
        };

        let mut maps = MapCatalog::with_defaults();
        if let Some(dir) = &self.map_dir {
            let loaded = MapLoader::load_dir(dir, &mut maps)
                .with_context(|| format!("loading maps from {}", dir.display()))?;
            tracing::info!(count = loaded.len(), maps = ?loaded, "authored maps loaded");
        }

        Ok(RuntimeConfig {
            game_config,
            maps,
            event_buffer_size: self.event_buffer,
            command_buffer_size: self.command_buffer,
            seed: self.seed,
        })
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
