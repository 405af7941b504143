use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Runtime settings for the upload service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Directory uploads are written to; created on first upload.
    pub upload_dir: PathBuf,
    /// The single origin allowed by CORS.
    pub allowed_origin: String,
    pub max_upload_bytes: usize,
    /// Keep uploaded files on disk after the response is built.
    pub retain_uploads: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            retain_uploads: false,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `KML_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("KML_SERVER_ADDR") {
            config.addr = addr
                .parse::<SocketAddr>()
                .with_context(|| format!("KML_SERVER_ADDR is not a socket address: {addr}"))?;
        }
        if let Some(dir) = lookup("KML_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(origin) = lookup("KML_ALLOWED_ORIGIN") {
            config.allowed_origin = origin;
        }
        if let Some(limit) = lookup("KML_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit
                .parse::<usize>()
                .with_context(|| format!("KML_MAX_UPLOAD_BYTES is not a byte count: {limit}"))?;
        }
        if let Some(retain) = lookup("KML_RETAIN_UPLOADS") {
            config.retain_uploads = parse_flag(&retain)
                .with_context(|| format!("KML_RETAIN_UPLOADS is not a boolean: {retain}"))?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
