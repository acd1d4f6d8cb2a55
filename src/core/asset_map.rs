//! Encoder inputs produced by the external map-building step
//!
//! The extraction tool emits a JSON array of asset records. Only four keys
//! matter here (`Name`, `Type`, `Source`, `Container`); everything else in a
//! record is ignored.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Byte size of every source block, keyed by block name without extension
pub type SourceSizes = HashMap<String, u64>;

/// One asset as listed by the asset map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Type")]
    pub asset_type: String,

    /// Path of the block holding the asset, e.g. `.../blocks/00/00012345.blk`
    #[serde(rename = "Source")]
    pub source: String,

    #[serde(rename = "Container")]
    pub container: String,
}

impl AssetDescriptor {
    pub fn new(
        name: impl Into<String>,
        asset_type: impl Into<String>,
        source: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        AssetDescriptor {
            name: name.into(),
            asset_type: asset_type.into(),
            source: source.into(),
            container: container.into(),
        }
    }

    /// Block name and shard folder of this asset's source
    pub fn source_ref(&self) -> Result<SourceRef> {
        SourceRef::parse(&self.source)
    }
}

/// A source path reduced to what the index stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// File name up to its first `.`
    pub block: String,
    /// Numeric shard folder the block lives under
    pub folder: u8,
}

impl SourceRef {
    /// Split `.../<folder>/<block>.blk` into its block name and shard folder
    ///
    /// A bare block name has folder 0. The folder is read as a decimal
    /// number, which is how readers print it back.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parts = source.rsplit(&['/', '\\'][..]);
        let file = parts.next().unwrap_or_default();
        let block = file.split('.').next().unwrap_or_default();

        if block.is_empty() {
            return Err(IndexError::InvalidDescriptor(format!(
                "source {:?} has no block name",
                source
            )));
        }

        let folder = match parts.next() {
            None | Some("") => 0,
            Some(dir) => dir.parse::<u8>().map_err(|_| {
                IndexError::InvalidDescriptor(format!(
                    "source {:?} has non-numeric shard folder {:?}",
                    source, dir
                ))
            })?,
        };

        Ok(SourceRef {
            block: block.to_string(),
            folder,
        })
    }
}

/// Load an asset map JSON file
pub fn load_asset_map<P: AsRef<Path>>(path: P) -> Result<Vec<AssetDescriptor>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let assets: Vec<AssetDescriptor> = serde_json::from_str(&raw)?;
    info!("Loaded {} assets from {:?}", assets.len(), path);
    Ok(assets)
}

/// Walk a blocks directory and record each file's size under its block name
///
/// Symlinked shard folders are followed.
pub fn scan_block_sizes<P: AsRef<Path>>(dir: P) -> Result<SourceSizes> {
    let dir = dir.as_ref();
    let mut sizes = SourceSizes::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        let block = file_name.split('.').next().unwrap_or_default();
        if block.is_empty() {
            continue;
        }

        let size = entry.metadata()?.len();
        debug!("block {} = {} bytes", block, size);
        sizes.insert(block.to_string(), size);
    }

    info!("Scanned {} block files under {:?}", sizes.len(), dir);
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_path() {
        let source =
            SourceRef::parse("GenshinImpact_Data/StreamingAssets/AssetBundles/blocks/07/00277271.blk")
                .unwrap();
        assert_eq!(source.block, "00277271");
        assert_eq!(source.folder, 7);
    }

    #[test]
    fn test_parse_windows_path() {
        let source = SourceRef::parse(r"C:\game\blocks\12\00012345.blk").unwrap();
        assert_eq!(source.block, "00012345");
        assert_eq!(source.folder, 12);
    }

    #[test]
    fn test_parse_bare_block_name() {
        let source = SourceRef::parse("00012345").unwrap();
        assert_eq!(source.block, "00012345");
        assert_eq!(source.folder, 0);
    }

    #[test]
    fn test_parse_hex_folder_rejected() {
        assert!(matches!(
            SourceRef::parse("blocks/0a/00012345.blk"),
            Err(IndexError::InvalidDescriptor(_))
        ));
        assert!(matches!(
            SourceRef::parse("blocks/300/00012345.blk"),
            Err(IndexError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_parse_empty_block_rejected() {
        assert!(SourceRef::parse("blocks/00/").is_err());
        assert!(SourceRef::parse(".blk").is_err());
    }

    #[test]
    fn test_descriptor_json_keys() {
        let json = r#"[{
            "Name": "Tree_01",
            "Container": "env/tree.ab",
            "Source": "blocks/00/00012345.blk",
            "PathID": 123456789,
            "Type": "Texture2D"
        }]"#;
        let assets: Vec<AssetDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(
            assets[0],
            AssetDescriptor::new("Tree_01", "Texture2D", "blocks/00/00012345.blk", "env/tree.ab")
        );
    }

    #[test]
    fn test_scan_block_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let shard = dir.path().join("00");
        fs::create_dir_all(&shard).unwrap();
        fs::write(shard.join("00012345.blk"), vec![0u8; 4096]).unwrap();
        fs::create_dir_all(dir.path().join("31")).unwrap();
        fs::write(dir.path().join("31").join("31000001.blk"), b"abc").unwrap();

        let sizes = scan_block_sizes(dir.path()).unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes["00012345"], 4096);
        assert_eq!(sizes["31000001"], 3);
    }

    #[test]
    fn test_scan_nested_shards() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let deep = dir.path().join("blocks").join("00").join("extra");
        fs::create_dir_all(&deep)?;
        fs::write(deep.join("00012345.blk"), vec![0u8; 10])?;

        let sizes = scan_block_sizes(dir.path())?;
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes["00012345"], 10);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follows_symlinked_shard() -> Result<()> {
        let store = tempfile::tempdir()?;
        fs::write(store.path().join("00012345.blk"), vec![0u8; 4096])?;

        let blocks = tempfile::tempdir()?;
        std::os::unix::fs::symlink(store.path(), blocks.path().join("00"))?;

        let sizes = scan_block_sizes(blocks.path())?;
        assert_eq!(sizes.get("00012345"), Some(&4096));
        assert!(!sizes.contains_key("00"));
        Ok(())
    }

    #[test]
    fn test_load_asset_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hk4e5.1-map.json");
        fs::write(
            &path,
            r#"[{"Name":"a","Type":"Mesh","Source":"00/1.blk","Container":"c"}]"#,
        )
        .unwrap();

        let assets = load_asset_map(&path).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].source_ref().unwrap().block, "1");
    }
}
