// Configuration module entry point
// Manages application configuration and runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Prefix for environment overrides, e.g. `LIVROS_SERVER__PORT=8080`
const ENV_PREFIX: &str = "LIVROS";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config" (config.toml etc.) when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Whether lookup diagnostics should be logged
    pub fn debug_enabled(&self) -> bool {
        self.logging.level.eq_ignore_ascii_case("debug")
    }
}
