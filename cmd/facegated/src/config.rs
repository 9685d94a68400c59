//! Environment-driven service configuration.

use std::time::Duration;

use anyhow::{bail, Context, Result};

use facegate_descriptor::KEY_LEN;

const DEFAULT_SYNC_INTERVAL_SECONDS: u64 = 60;
const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;
const DEFAULT_DESCRIPTOR_DIM: usize = 128;
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Service configuration, read once at startup. Nothing here is mutated at
/// runtime; the encryption key in particular is process-wide read-only.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared service key for the internal routes and the upstream fetch.
    pub api_key: String,

    /// Base URL of the main API serving the enrollment catalog.
    pub upstream_url: String,

    /// Base URL of the face embedding service.
    pub embedder_url: String,

    pub sync_interval: Duration,
    pub match_threshold: f32,
    pub descriptor_dim: usize,

    /// AES-256-GCM key for descriptor envelopes.
    pub descriptor_key: [u8; KEY_LEN],

    pub listen_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = require("FACEGATE_API_KEY")?;
        let upstream_url = require("FACEGATE_UPSTREAM_URL")?;
        let embedder_url = require("FACEGATE_EMBEDDER_URL")?;
        let descriptor_key = parse_hex_key(&require("FACEGATE_DESCRIPTOR_KEY")?)?;

        let sync_interval = Duration::from_secs(match optional("FACEGATE_SYNC_INTERVAL_SECONDS") {
            Some(v) => v.parse().context("FACEGATE_SYNC_INTERVAL_SECONDS must be an integer")?,
            None => DEFAULT_SYNC_INTERVAL_SECONDS,
        });
        let match_threshold = match optional("FACEGATE_MATCH_THRESHOLD") {
            Some(v) => v.parse().context("FACEGATE_MATCH_THRESHOLD must be a number")?,
            None => DEFAULT_MATCH_THRESHOLD,
        };
        let descriptor_dim = match optional("FACEGATE_DESCRIPTOR_DIM") {
            Some(v) => v.parse().context("FACEGATE_DESCRIPTOR_DIM must be an integer")?,
            None => DEFAULT_DESCRIPTOR_DIM,
        };
        let listen_addr =
            optional("FACEGATE_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        Ok(Self {
            api_key,
            upstream_url,
            embedder_url,
            sync_interval,
            match_threshold,
            descriptor_dim,
            descriptor_key,
            listen_addr,
        })
    }
}

fn require(name: &str) -> Result<String> {
    match optional(name) {
        Some(v) => Ok(v),
        None => bail!("{name} must be set"),
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parses a 64-character hex string into the 32-byte envelope key.
fn parse_hex_key(text: &str) -> Result<[u8; KEY_LEN]> {
    let bytes = hex::decode(text).context("FACEGATE_DESCRIPTOR_KEY must be hex")?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("FACEGATE_DESCRIPTOR_KEY must be {KEY_LEN} bytes of hex, got {len}"))
}
