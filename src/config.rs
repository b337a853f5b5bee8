//! Runtime configuration for the tubecast binaries.
//!
//! Configuration lives in a shell-style env file (`KEY="value"` lines) so the
//! same file can be sourced by systemd units and read here. Environment
//! variables override the file; everything falls back to sane defaults except
//! the API key, which has no default.

use anyhow::{Context, Result, anyhow};
use std::{fs, path::Path};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/tubecast-env";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Raw values read from the env file; everything optional so partially
/// written files still load.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub youtube_api_key: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved configuration the binaries run with.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub youtube_api_key: String,
    pub host: String,
    pub port: u16,
}

/// Reads the env file at `path`, returning `None` when it does not exist.
/// Blank lines and `#` comments are skipped; values may be double-quoted.
pub fn read_env_config(path: &Path) -> Result<Option<EnvConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;

    let mut cfg = EnvConfig::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value_raw)) = trimmed.split_once('=') {
            let value = value_raw.trim().trim_matches('"');
            match key {
                "YOUTUBE_API_KEY" => {
                    if !value.is_empty() {
                        cfg.youtube_api_key = Some(value.to_string());
                    }
                }
                "TUBECAST_HOST" => {
                    if !value.is_empty() {
                        cfg.host = Some(value.to_string());
                    }
                }
                "TUBECAST_PORT" => {
                    let port: u16 = value.parse().with_context(|| {
                        format!("Parsing TUBECAST_PORT from {}", path.display())
                    })?;
                    cfg.port = Some(port);
                }
                _ => {}
            }
        }
    }
    Ok(Some(cfg))
}

/// Merges environment-variable overrides with file values and defaults. The
/// API key is the one value that must come from somewhere.
pub fn resolve_runtime_config(
    file_config: Option<EnvConfig>,
    env_api_key: Option<String>,
    env_host: Option<String>,
    env_port: Option<u16>,
) -> Result<RuntimeConfig> {
    let file_config = file_config.unwrap_or_default();

    let youtube_api_key = env_api_key
        .filter(|key| !key.is_empty())
        .or(file_config.youtube_api_key)
        .ok_or_else(|| {
            anyhow!("YOUTUBE_API_KEY not set (environment or {DEFAULT_CONFIG_PATH})")
        })?;

    Ok(RuntimeConfig {
        youtube_api_key,
        host: env_host
            .or(file_config.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env_port.or(file_config.port).unwrap_or(DEFAULT_PORT),
    })
}
