//! Turning a set of selected assets into download and extraction work
//!
//! Downloading blocks and running the extraction tool both happen outside
//! this crate. This module produces exactly what those collaborators
//! consume: the blocks to fetch (with sizes and shard folders, from the
//! block catalog) and one extraction job per asset.

use crate::catalog::AssetIndex;
use crate::error::Result;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Directory of block files inside a game install and on the patch CDN
pub const BLOCKS_ROOT: &str = "GenshinImpact_Data/StreamingAssets/AssetBundles/blocks";

/// File extension of block files
pub const BLOCK_EXTENSION: &str = "blk";

/// Game switch passed to the extraction tool
pub const TOOL_GAME: &str = "GI";

/// A block that must be present before extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTarget {
    pub block: String,
    pub folder: String,
    pub size: u32,
}

impl BlockTarget {
    /// `{block}.blk`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.block, BLOCK_EXTENSION)
    }

    /// Path of the block relative to the patch root
    pub fn remote_path(&self) -> String {
        format!("{}/{}/{}", BLOCKS_ROOT, self.folder, self.file_name())
    }
}

/// Everything the extraction tool needs to pull one asset out of its block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    pub block: String,
    pub asset_type: String,
    pub name: String,
    pub container: String,
}

impl ExtractionJob {
    /// Arguments for one extraction tool run over `block_path`
    pub fn tool_args(&self, block_path: &Path, output_dir: &Path) -> Vec<String> {
        vec![
            block_path.to_string_lossy().into_owned(),
            output_dir.to_string_lossy().into_owned(),
            "--game".to_string(),
            TOOL_GAME.to_string(),
            "--types".to_string(),
            self.asset_type.clone(),
            "--names".to_string(),
            self.name.clone(),
            "--containers".to_string(),
            self.container.clone(),
            "--group_assets".to_string(),
            "None".to_string(),
        ]
    }
}

/// Download and extraction work for a selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionPlan {
    /// Distinct blocks, sorted by name
    pub blocks: Vec<BlockTarget>,
    /// One job per selected asset, in selection order
    pub jobs: Vec<ExtractionJob>,
    /// Bytes to download across all blocks
    pub total_size: u64,
}

impl ExtractionPlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl AssetIndex {
    /// Plan the blocks and extraction jobs for `names`
    ///
    /// Fails with `UnknownAsset` for a name not in the index and with
    /// `UnknownBlock` if an asset's block is missing from the block catalog.
    pub fn plan<S: AsRef<str>>(&self, names: &[S]) -> Result<ExtractionPlan> {
        let mut plan = ExtractionPlan::default();
        let mut blocks = BTreeSet::new();

        for name in names {
            let name = name.as_ref();
            let asset = self.asset(name)?;
            blocks.insert(asset.source.block.as_str());
            plan.jobs.push(ExtractionJob {
                block: asset.source.block.clone(),
                asset_type: asset.asset_type.clone(),
                name: name.to_string(),
                container: asset.container.clone(),
            });
        }

        for block in blocks {
            let info = self.blocks.lookup(block)?;
            plan.total_size += info.size as u64;
            plan.blocks.push(BlockTarget {
                block: block.to_string(),
                folder: info.folder.clone(),
                size: info.size,
            });
        }

        debug!(
            "Planned {} jobs over {} blocks ({})",
            plan.jobs.len(),
            plan.blocks.len(),
            format_size(plan.total_size)
        );

        Ok(plan)
    }
}

/// Human-readable byte count rounded to two decimals, e.g. `"1.5 MB"`
///
/// At least one decimal is always shown, so 4096 bytes reads `"4.0 KB"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0 {}", trimmed, UNITS[unit])
    } else {
        format!("{} {}", trimmed, UNITS[unit])
    }
}
