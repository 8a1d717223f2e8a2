//! Mentor configuration stored in `mentor.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Cycle counts above this are rejected at the CLI boundary.
pub const MAX_CYCLES_CAP: u32 = 5;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Mentor configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MentorConfig {
    /// Review cycles to run when `--cycles` is not given.
    pub max_cycles: u32,

    /// Extra attempts per stage call after the first one fails.
    pub stage_retries: u32,

    /// Per-call timeout for the generation backend, in seconds.
    pub stage_timeout_secs: u64,

    /// Model name passed to the generation backend.
    pub model: String,

    /// Base URL of the generation backend (model and method are appended).
    pub endpoint: String,
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            max_cycles: 3,
            stage_retries: 2,
            stage_timeout_secs: 30,
            model: "gemini-pro".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl MentorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_cycles < 1 || self.max_cycles > MAX_CYCLES_CAP {
            return Err(anyhow!("max_cycles must be in [1, {MAX_CYCLES_CAP}]"));
        }
        if self.stage_timeout_secs == 0 {
            return Err(anyhow!("stage_timeout_secs must be > 0"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must not be empty"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("endpoint must not be empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MentorConfig::default()`.
pub fn load_config(path: &Path) -> Result<MentorConfig> {
    if !path.exists() {
        let cfg = MentorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MentorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MentorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
