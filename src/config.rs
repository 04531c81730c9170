//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default stroke width for SVG previews, in drawing units.
pub const DEFAULT_SVG_STROKE_WIDTH: f64 = 0.01;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// Directory holding the browser client, served at `/`.
    pub static_dir: PathBuf,

    /// Capacity of each connection's outbound queue.
    pub outbox_capacity: usize,

    /// Stroke width written into SVG previews.
    pub svg_stroke_width: f64,

    /// Whether to attach a permissive CORS layer.
    pub cors_permissive: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            static_dir: PathBuf::from("./client"),
            outbox_capacity: 1024,
            svg_stroke_width: DEFAULT_SVG_STROKE_WIDTH,
            cors_permissive: true,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the [`Default`] values when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        // A zero-capacity mpsc channel panics on creation.
        let outbox_capacity = parse_env("OUTBOX_CAPACITY", defaults.outbox_capacity).max(1);
        let svg_stroke_width = parse_env("SVG_STROKE_WIDTH", defaults.svg_stroke_width);
        let cors_permissive = parse_env_bool("CORS_PERMISSIVE", defaults.cors_permissive);

        Ok(Self {
            listen_addr,
            static_dir,
            outbox_capacity,
            svg_stroke_width,
            cors_permissive,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
