use std::env;

use anyhow::{Context, Result};

/// Grist table holding one row per tracked tool.
pub const EQUIPMENT_TABLE: &str = "Equipment";

/// Grist table holding one row per inbound delivery.
pub const DELIVERIES_TABLE: &str = "Deliveries";

/// Maximum accepted length for the free-text location field.
pub const MAX_LOCATION_LEN: usize = 200;

/// Grist server used when GRIST_SERVER is not set.
pub const DEFAULT_GRIST_SERVER: &str = "https://grist.orga.emfcamp.org";

/// Socket address used when LISTEN is not set.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8000";

/// Top-level configuration, resolved once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Grist document identifier.
    pub document: String,
    /// Base URL of the Grist server.
    pub server: String,
    /// Bearer token for the Grist API.
    pub api_key: String,
    /// Socket address the web server binds.
    pub listen: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let document = env::var("GRIST_DOCUMENT").context("GRIST_DOCUMENT must be set")?;
        let api_key = env::var("GRIST_API_KEY").context("GRIST_API_KEY must be set")?;
        let server =
            env::var("GRIST_SERVER").unwrap_or_else(|_| DEFAULT_GRIST_SERVER.to_string());
        let listen = env::var("LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_string());

        Ok(Self {
            document,
            server,
            api_key,
            listen,
        })
    }
}
