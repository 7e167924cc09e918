use anyhow::{anyhow, bail, Context, Result};
use directories::ProjectDirs;
use nidam_proto::{KdfParams, TranscriptLabels};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_QUALIFIER: &str = "com";
pub const APP_ORG: &str = "nidam";
pub const APP_NAME: &str = "share";

pub fn config_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .ok_or_else(|| anyhow!("cannot determine config directory"))?;
    Ok(dirs.config_dir().to_path_buf())
}

pub fn default_settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("settings.json"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShareSettings {
    /// PBKDF2 iterations; must match whoever opens the export.
    pub kdf_iterations: u32,
    pub transcript: TranscriptLabels,
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self {
            kdf_iterations: KdfParams::default().iterations,
            transcript: TranscriptLabels::default(),
        }
    }
}

impl ShareSettings {
    /// Load from an explicit file (must exist) or from the per-user default
    /// location (falls back to defaults when absent).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_settings_path() {
                Ok(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        let settings: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing settings {}", path.display()))?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            iterations: self.kdf_iterations,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.kdf_iterations == 0 {
            bail!("kdf_iterations must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"kdf_iterations": 5000}"#).unwrap();

        let settings = ShareSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.kdf_iterations, 5000);
        assert_eq!(settings.transcript, TranscriptLabels::default());
    }

    #[test]
    fn zero_iterations_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"kdf_iterations": 0}"#).unwrap();
        assert!(ShareSettings::load(Some(&path)).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ShareSettings::load(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn defaults_match_export_format() {
        assert_eq!(ShareSettings::default().kdf_params(), KdfParams::default());
    }
}
