//! Index build configuration
//!
//! Mirrors the `indexConfig.json` / `hashes.json` pair used to drive a build:
//!
//! ```json
//! {
//!     "VERSION": "5.1",
//!     "GAME": "hk4e",
//!     "DOWNLOAD_BLOCKS": false,
//!     "BLOCKS_DIR": "blk",
//!     "BLK_CLEANUP": false,
//!     "REBUILD_MAP": false,
//!     "MAP_FILE": "hk4e5.1-map.json",
//!     "MAP_CLEANUP": false,
//!     "EXPORT_META": true
//! }
//! ```
//!
//! A `.toml` file with the same keys is accepted as well.

use crate::encoder::EncoderConfig;
use crate::error::{IndexError, Result};
use crate::header::SUPPORTED_GAME;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use validator::Validate;

fn default_game() -> String {
    SUPPORTED_GAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct IndexConfig {
    /// Game version, e.g. "5.1"
    #[validate(length(min = 1, max = 4))]
    pub version: String,

    /// Game code written to the header
    #[serde(default = "default_game")]
    #[validate(length(min = 1, max = 4))]
    pub game: String,

    /// Fetch blocks through a downloader instead of reading `blocks_dir`
    #[serde(default)]
    pub download_blocks: bool,

    /// Existing blocks directory (required unless downloading)
    #[serde(default)]
    pub blocks_dir: Option<PathBuf>,

    /// Delete the blocks directory after a successful build
    #[serde(default)]
    pub blk_cleanup: bool,

    /// Regenerate the asset map through a map builder instead of reading `map_file`
    #[serde(default)]
    pub rebuild_map: bool,

    /// Existing asset map (required unless rebuilding)
    #[serde(default)]
    pub map_file: Option<PathBuf>,

    /// Delete the asset map after a successful build
    #[serde(default)]
    pub map_cleanup: bool,

    /// Also write the id lookup artifact
    #[serde(default)]
    pub export_meta: bool,

    /// Where artifacts are written; defaults to the working directory
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl IndexConfig {
    pub fn new(version: impl Into<String>) -> Self {
        IndexConfig {
            version: version.into(),
            game: default_game(),
            download_blocks: false,
            blocks_dir: None,
            blk_cleanup: false,
            rebuild_map: false,
            map_file: None,
            map_cleanup: false,
            export_meta: false,
            output_dir: None,
        }
    }

    /// Load a JSON config, or TOML when the extension is `.toml`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;

        let config: IndexConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&raw)?,
            _ => serde_json::from_str(&raw)?,
        };

        config.check()?;
        Ok(config)
    }

    /// Field validation plus the rules that span several fields
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if !self.download_blocks && self.blocks_dir.is_none() {
            return Err(IndexError::InvalidConfig(
                "BLOCKS_DIR is required when DOWNLOAD_BLOCKS is false".to_string(),
            ));
        }

        if !self.rebuild_map && self.map_file.is_none() {
            return Err(IndexError::InvalidConfig(
                "MAP_FILE is required when REBUILD_MAP is false".to_string(),
            ));
        }

        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Encoder settings for this config and the build `hash`
    pub fn encoder_config(&self, hash: impl Into<String>) -> EncoderConfig {
        EncoderConfig {
            game: self.game.clone(),
            version: self.version.clone(),
            hash: hash.into(),
            export_meta: self.export_meta,
        }
    }
}

/// Version -> build hash, as kept in `hashes.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionHashes(HashMap<String, String>);

impl VersionHashes {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn insert(&mut self, version: impl Into<String>, hash: impl Into<String>) {
        self.0.insert(version.into(), hash.into());
    }

    pub fn hash_for(&self, version: &str) -> Result<&str> {
        self.0.get(version).map(String::as_str).ok_or_else(|| {
            IndexError::InvalidConfig(format!("no hash recorded for version {}", version))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_json_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("indexConfig.json");
        fs::write(
            &path,
            r#"{
                "VERSION": "5.1",
                "GAME": "hk4e",
                "DOWNLOAD_BLOCKS": false,
                "BLOCKS_DIR": "blk",
                "BLK_CLEANUP": false,
                "REBUILD_MAP": false,
                "MAP_FILE": "hk4e5.1-map.json",
                "MAP_CLEANUP": true,
                "EXPORT_META": true
            }"#,
        )?;

        let config = IndexConfig::load(&path)?;
        assert_eq!(config.version, "5.1");
        assert_eq!(config.blocks_dir, Some(PathBuf::from("blk")));
        assert!(config.map_cleanup);
        assert!(config.encoder_config("abc").export_meta);
        Ok(())
    }

    #[test]
    fn test_load_toml_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("index.toml");
        fs::write(
            &path,
            "VERSION = \"4.8\"\nBLOCKS_DIR = \"blk\"\nMAP_FILE = \"map.json\"\n",
        )?;

        let config = IndexConfig::load(&path)?;
        assert_eq!(config.version, "4.8");
        assert_eq!(config.game, "hk4e");
        assert!(!config.export_meta);
        Ok(())
    }

    #[test]
    fn test_version_too_long() {
        let mut config = IndexConfig::new("10.10");
        config.blocks_dir = Some(PathBuf::from("blk"));
        config.map_file = Some(PathBuf::from("map.json"));
        assert!(matches!(config.check(), Err(IndexError::Validation(_))));
    }

    #[test]
    fn test_missing_blocks_dir() {
        let mut config = IndexConfig::new("5.1");
        config.map_file = Some(PathBuf::from("map.json"));
        assert!(matches!(config.check(), Err(IndexError::InvalidConfig(_))));

        config.download_blocks = true;
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_missing_map_file() {
        let mut config = IndexConfig::new("5.1");
        config.blocks_dir = Some(PathBuf::from("blk"));
        assert!(matches!(config.check(), Err(IndexError::InvalidConfig(_))));

        config.rebuild_map = true;
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_version_hashes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("hashes.json");
        fs::write(&path, r#"{"4.8": "20240301203033_RZSIny3hwJ5nq959"}"#)?;

        let hashes = VersionHashes::load(&path)?;
        assert_eq!(hashes.hash_for("4.8")?, "20240301203033_RZSIny3hwJ5nq959");
        assert!(matches!(
            hashes.hash_for("5.1"),
            Err(IndexError::InvalidConfig(_))
        ));
        Ok(())
    }
}
