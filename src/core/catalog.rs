//! Decoded asset catalog
//!
//! An [`AssetIndex`] is built once by the decoder and never mutated; every
//! accessor here is a read-only view, so a loaded index can be shared behind
//! an `Arc` across threads without locking.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Where an asset's bytes live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub block: String,
    pub size: u32,
    /// Two-character shard folder, e.g. `"07"`
    pub folder: String,
}

/// Catalog entry for one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub source: SourceInfo,
    pub container: String,
}

/// Download facts about one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub size: u32,
    pub folder: String,
}

/// Block name -> size and shard folder
///
/// Projected from the Sources table at decode time. When two sources share
/// a block name the later one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockCatalog {
    blocks: HashMap<String, BlockInfo>,
}

impl BlockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, block: String, info: BlockInfo) {
        self.blocks.insert(block, info);
    }

    /// Size and folder of `block`
    pub fn lookup(&self, block: &str) -> Result<&BlockInfo> {
        self.blocks
            .get(block)
            .ok_or_else(|| IndexError::UnknownBlock(block.to_string()))
    }

    pub fn contains(&self, block: &str) -> bool {
        self.blocks.contains_key(block)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Combined download size of every block in the catalog
    pub fn total_size(&self) -> u64 {
        self.blocks.values().map(|b| b.size as u64).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlockInfo)> {
        self.blocks.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Fully decoded index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetIndex {
    pub game: String,
    pub version: String,
    pub hash: String,
    /// Asset name -> entry. Duplicate names in the file collapse to the last record.
    pub assets: BTreeMap<String, AssetInfo>,
    pub blocks: BlockCatalog,
}

impl AssetIndex {
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn asset(&self, name: &str) -> Result<&AssetInfo> {
        self.assets
            .get(name)
            .ok_or_else(|| IndexError::UnknownAsset(name.to_string()))
    }

    pub fn block(&self, block: &str) -> Result<&BlockInfo> {
        self.blocks.lookup(block)
    }

    /// Assets whose name and type contain the given filters, ignoring case
    ///
    /// An empty filter matches everything. Results are in name order.
    pub fn search(&self, name: &str, asset_type: &str) -> Vec<(&str, &AssetInfo)> {
        let name = name.to_lowercase();
        let asset_type = asset_type.to_lowercase();

        self.assets
            .iter()
            .filter(|(asset_name, info)| {
                asset_name.to_lowercase().contains(&name)
                    && info.asset_type.to_lowercase().contains(&asset_type)
            })
            .map(|(asset_name, info)| (asset_name.as_str(), info))
            .collect()
    }

    /// Distinct asset types in the index, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.assets.values().map(|a| a.asset_type.as_str()).collect();
        types.sort_unstable();
        types.dedup();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(asset_type: &str, block: &str, size: u32) -> AssetInfo {
        AssetInfo {
            asset_type: asset_type.to_string(),
            source: SourceInfo {
                block: block.to_string(),
                size,
                folder: "00".to_string(),
            },
            container: format!("assets/{}.ab", block),
        }
    }

    fn sample() -> AssetIndex {
        let mut assets = BTreeMap::new();
        assets.insert("Tree_01".to_string(), info("Texture2D", "00012345", 4096));
        assets.insert("tree_bark".to_string(), info("Material", "00012345", 4096));
        assets.insert("Rock_02".to_string(), info("Mesh", "00054321", 100));

        let mut blocks = BlockCatalog::new();
        blocks.insert(
            "00012345".to_string(),
            BlockInfo {
                size: 4096,
                folder: "00".to_string(),
            },
        );
        blocks.insert(
            "00054321".to_string(),
            BlockInfo {
                size: 100,
                folder: "00".to_string(),
            },
        );

        AssetIndex {
            game: "hk4e".to_string(),
            version: "5.1".to_string(),
            hash: "abcd1234".to_string(),
            assets,
            blocks,
        }
    }

    #[test]
    fn test_block_lookup() {
        let index = sample();
        assert_eq!(index.block("00054321").unwrap().size, 100);
        assert!(matches!(
            index.block("99999999"),
            Err(IndexError::UnknownBlock(_))
        ));
        assert_eq!(index.blocks.total_size(), 4196);
    }

    #[test]
    fn test_asset_lookup() {
        let index = sample();
        assert_eq!(index.asset("Rock_02").unwrap().asset_type, "Mesh");
        assert!(matches!(
            index.asset("rock_02"),
            Err(IndexError::UnknownAsset(_))
        ));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let index = sample();
        let names: Vec<&str> = index.search("TREE", "").iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["Tree_01", "tree_bark"]);

        let names: Vec<&str> = index.search("tree", "texture").iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["Tree_01"]);
    }

    #[test]
    fn test_search_empty_filters_match_all() {
        let index = sample();
        assert_eq!(index.search("", "").len(), 3);
    }

    #[test]
    fn test_types() {
        assert_eq!(sample().types(), vec!["Material", "Mesh", "Texture2D"]);
    }

    #[test]
    fn test_asset_info_json_shape() {
        let json = serde_json::to_value(info("Mesh", "1", 2)).unwrap();
        assert_eq!(json["type"], "Mesh");
        assert_eq!(json["source"]["folder"], "00");
    }
}
