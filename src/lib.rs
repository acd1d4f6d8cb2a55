//! # GIAL - Game Asset Index Library
//!
//! `gial-rs` catalogs the assets packed into a game's patch blocks so a user
//! can pick a handful of assets and fetch only the blocks that hold them.
//!
//! The heart of the crate is the `.index` codec: a compact binary catalog of
//! asset names, types, source blocks and containers with the repeated strings
//! stored once in dictionary tables.
//!
//! - **Encoder**: asset map + per-block sizes → `.index` bytes
//! - **Decoder**: `.index` bytes → [`AssetIndex`] with a [`BlockCatalog`]
//! - **Selection**: chosen assets → blocks to download and extraction jobs
//!
//! ## Quick Start
//!
//! ```rust
//! use gial_rs::{AssetDescriptor, AssetIndex, IndexBuilder, Result, SourceSizes};
//!
//! # fn main() -> Result<()> {
//! let assets = vec![AssetDescriptor::new(
//!     "Tree_01",
//!     "Texture2D",
//!     "blocks/00/00012345.blk",
//!     "env/tree.ab",
//! )];
//! let mut sizes = SourceSizes::new();
//! sizes.insert("00012345".to_string(), 4096);
//!
//! let encoded = IndexBuilder::new()
//!     .version("5.1")
//!     .hash("abcd1234")
//!     .build(&assets, &sizes)?;
//!
//! let index = AssetIndex::from_bytes(&encoded.bytes)?;
//! let plan = index.plan(&["Tree_01"])?;
//! assert_eq!(plan.total_size, 4096);
//! # Ok(())
//! # }
//! ```
//!
//! ## File Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Header                                       │
//! │  "GIAL" | 00 00 | "10" | 00 00               │
//! │  game (4) | version (4) | hash len | hash    │
//! ├──────────────────────────────────────────────┤
//! │ Types       count(1) maxLen(1) [id name]     │
//! │ Sources     count(3) maxLen(1)               │
//! │             [id folder name size]            │
//! │ Containers  count(3) maxLen(1) [id name]     │
//! ├──────────────────────────────────────────────┤
//! │ Assets      count(3)                         │
//! │             [nameLen name typeId srcId ctrId]│
//! └──────────────────────────────────────────────┘
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
pub(crate) use core::{
    asset_map, catalog, config, decoder, dictionary, encoder, error, header, io, meta, pipeline,
    selection,
};

pub use crate::core::{
    asset_map::{load_asset_map, scan_block_sizes, AssetDescriptor, SourceRef, SourceSizes},
    catalog::{AssetIndex, AssetInfo, BlockCatalog, BlockInfo, SourceInfo},
    config::{IndexConfig, VersionHashes},
    decoder::decode_index,
    dictionary::{TableKind, FIRST_ID, TABLE_GAP},
    encoder::{EncodedIndex, EncoderConfig, IndexEncoder},
    error::{IndexError, Result},
    header::{IndexHeader, FORMAT_TAG, MAGIC, SUPPORTED_GAME},
    io::{index_file_name, meta_file_name, read_index_file, write_index_file},
    meta::IndexMeta,
    pipeline::{BlockDownloader, DownloadReport, IndexPipeline, MapBuilder, PipelineOutput},
    selection::{format_size, BlockTarget, ExtractionJob, ExtractionPlan},
};

use tracing::debug;

/// Builder for one-off index encodes
///
/// Defaults the game code to [`SUPPORTED_GAME`]; version and hash must be set.
///
/// # Examples
///
/// ```rust
/// use gial_rs::IndexBuilder;
///
/// let builder = IndexBuilder::new().version("5.1").hash("abcd1234").with_meta();
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    game: Option<String>,
    version: Option<String>,
    hash: Option<String>,
    export_meta: bool,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the game code (defaults to `hk4e`)
    pub fn game<S: Into<String>>(mut self, game: S) -> Self {
        self.game = Some(game.into());
        self
    }

    pub fn version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Also produce the id lookup artifact
    pub fn with_meta(mut self) -> Self {
        self.export_meta = true;
        self
    }

    /// Encoder settings, failing if version or hash is missing
    pub fn config(&self) -> Result<EncoderConfig> {
        let version = self
            .version
            .clone()
            .ok_or_else(|| IndexError::InvalidConfig("version must be set".to_string()))?;
        let hash = self
            .hash
            .clone()
            .ok_or_else(|| IndexError::InvalidConfig("hash must be set".to_string()))?;
        let game = self
            .game
            .clone()
            .unwrap_or_else(|| SUPPORTED_GAME.to_string());

        Ok(EncoderConfig {
            game,
            version,
            hash,
            export_meta: self.export_meta,
        })
    }

    /// Encode `assets` into index bytes
    pub fn build(&self, assets: &[AssetDescriptor], sizes: &SourceSizes) -> Result<EncodedIndex> {
        let config = self.config()?;
        debug!("Building index for {} {}", config.game, config.version);
        IndexEncoder::new(config).encode(assets, sizes)
    }
}
