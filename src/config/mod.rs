use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4320;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_role() -> String {
    "admin".to_string()
}

// ─── TomlConfig ───────────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// REST server port (default: 4320).
    port: Option<u16>,
    /// Log level filter string, e.g. "debug", "info,numad=trace" (default: "info").
    log: Option<String>,
    /// Bind address for the REST server (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Role assumed for requests without an x-auth-role header (default: "admin").
    default_role: Option<String>,
    /// Slow-query log threshold in milliseconds (default: 0 = disabled).
    slow_query_ms: Option<u64>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── DaemonConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// Bind address for the REST server (NUMAD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// Role assumed when a request carries no x-auth-role header.
    /// Authentication itself belongs to the deployment's gateway.
    pub default_role: String,
    /// Queries slower than this many milliseconds are logged at WARN (0 = off).
    pub slow_query_ms: u64,
}

impl DaemonConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("NUMAD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let default_role = std::env::var("NUMAD_DEFAULT_ROLE")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.default_role)
            .unwrap_or_else(default_role);

        let slow_query_ms = toml.slow_query_ms.unwrap_or(0);

        Self {
            port,
            data_dir,
            log,
            bind_address,
            default_role,
            slow_query_ms,
        }
    }
}

fn default_data_dir() -> PathBuf {
    // $XDG_DATA_HOME/numad or ~/.local/share/numad
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join("numad");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("numad");
        }
    }
    std::env::temp_dir().join("numad")
}

// ─── Tests ────────────────────────────────────────────────────────────────────
