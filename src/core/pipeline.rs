//! End-to-end index build
//!
//! Gathers blocks and an asset map, measures every block, encodes the index
//! and writes the artifacts. Fetching blocks and generating the asset map are
//! done by external collaborators plugged in through [`BlockDownloader`] and
//! [`MapBuilder`]; without them the pipeline works from files already on disk.

use crate::asset_map::{load_asset_map, scan_block_sizes};
use crate::config::IndexConfig;
use crate::encoder::IndexEncoder;
use crate::error::{IndexError, Result};
use crate::io::{index_file_name, meta_file_name, write_index_file};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-block outcome of a download batch
///
/// Failures are reported here individually; a failed block never aborts the
/// rest of the batch, and the pipeline does not retry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: Vec<String>,
    /// Blocks already present with a matching checksum
    pub skipped: Vec<String>,
    /// Block and reason
    pub failed: Vec<(String, String)>,
}

/// Fetches every block of a build into a directory
pub trait BlockDownloader {
    fn download_blocks(&self, hash: &str, out_dir: &Path) -> Result<DownloadReport>;
}

/// Produces an asset map JSON file for a blocks directory
pub trait MapBuilder {
    /// Build the map named `map_name` and return its path
    fn build_map(&self, blocks_dir: &Path, map_name: &str) -> Result<PathBuf>;
}

/// Artifacts of a finished build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub index_path: PathBuf,
    pub meta_path: Option<PathBuf>,
    pub asset_count: usize,
    pub byte_len: usize,
}

pub struct IndexPipeline<'a> {
    config: IndexConfig,
    hash: String,
    downloader: Option<&'a dyn BlockDownloader>,
    map_builder: Option<&'a dyn MapBuilder>,
}

impl<'a> IndexPipeline<'a> {
    pub fn new(config: IndexConfig, hash: impl Into<String>) -> Self {
        IndexPipeline {
            config,
            hash: hash.into(),
            downloader: None,
            map_builder: None,
        }
    }

    pub fn with_downloader(mut self, downloader: &'a dyn BlockDownloader) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn with_map_builder(mut self, map_builder: &'a dyn MapBuilder) -> Self {
        self.map_builder = Some(map_builder);
        self
    }

    pub fn run(&self) -> Result<PipelineOutput> {
        self.config.check()?;
        let output_dir = self.config.output_dir();
        fs::create_dir_all(&output_dir)?;

        let blocks_dir = self.obtain_blocks(&output_dir)?;
        let map_file = self.obtain_map(&blocks_dir)?;

        let sizes = scan_block_sizes(&blocks_dir)?;
        let assets = load_asset_map(&map_file)?;

        let encoder = IndexEncoder::new(self.config.encoder_config(self.hash.as_str()));
        let encoded = encoder.encode(&assets, &sizes)?;

        let index_path =
            output_dir.join(index_file_name(&self.config.game, &self.config.version));
        write_index_file(&index_path, &encoded.bytes)?;
        info!("Wrote {:?} ({} bytes)", index_path, encoded.bytes.len());

        let meta_path = match &encoded.meta {
            Some(meta) => {
                let path = output_dir.join(meta_file_name(&self.config.game, &self.config.version));
                meta.write(&path)?;
                info!("Wrote {:?}", path);
                Some(path)
            }
            None => None,
        };

        if self.config.blk_cleanup {
            info!("Removing blocks directory {:?}", blocks_dir);
            fs::remove_dir_all(&blocks_dir)?;
        }
        if self.config.map_cleanup {
            info!("Removing asset map {:?}", map_file);
            fs::remove_file(&map_file)?;
        }

        Ok(PipelineOutput {
            index_path,
            meta_path,
            asset_count: assets.len(),
            byte_len: encoded.bytes.len(),
        })
    }

    fn obtain_blocks(&self, output_dir: &Path) -> Result<PathBuf> {
        if !self.config.download_blocks {
            return self
                .config
                .blocks_dir
                .clone()
                .ok_or_else(|| IndexError::InvalidConfig("BLOCKS_DIR is not set".to_string()));
        }

        let downloader = self.downloader.ok_or_else(|| {
            IndexError::InvalidConfig(
                "DOWNLOAD_BLOCKS is set but no block downloader is attached".to_string(),
            )
        })?;

        let blocks_dir = output_dir.join("blk");
        fs::create_dir_all(&blocks_dir)?;

        let report = downloader.download_blocks(&self.hash, &blocks_dir)?;
        info!(
            "Blocks: {} downloaded, {} skipped, {} failed",
            report.downloaded.len(),
            report.skipped.len(),
            report.failed.len()
        );
        for (block, reason) in &report.failed {
            warn!("Block {} failed to download: {}", block, reason);
        }

        Ok(blocks_dir)
    }

    fn obtain_map(&self, blocks_dir: &Path) -> Result<PathBuf> {
        if !self.config.rebuild_map {
            return self
                .config
                .map_file
                .clone()
                .ok_or_else(|| IndexError::InvalidConfig("MAP_FILE is not set".to_string()));
        }

        let builder = self.map_builder.ok_or_else(|| {
            IndexError::InvalidConfig(
                "REBUILD_MAP is set but no map builder is attached".to_string(),
            )
        })?;

        let map_name = format!("{}{}-map", self.config.game, self.config.version);
        let path = builder.build_map(blocks_dir, &map_name)?;
        if !path.exists() {
            return Err(IndexError::External(format!(
                "map builder reported {:?} but the file does not exist",
                path
            )));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetIndex;

    const MAP: &str = r#"[
        {"Name": "Tree_01", "Type": "Texture2D", "Source": "blocks/00/00012345.blk", "Container": "env/tree.ab"},
        {"Name": "Rock", "Type": "Mesh", "Source": "blocks/02/00020000.blk", "Container": "env/rock.ab"}
    ]"#;

    fn write_blocks(dir: &Path) {
        fs::create_dir_all(dir.join("00")).unwrap();
        fs::create_dir_all(dir.join("02")).unwrap();
        fs::write(dir.join("00").join("00012345.blk"), vec![1u8; 4096]).unwrap();
        fs::write(dir.join("02").join("00020000.blk"), vec![2u8; 10]).unwrap();
    }

    #[test]
    fn test_build_from_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let blocks = dir.path().join("blk");
        write_blocks(&blocks);
        let map = dir.path().join("map.json");
        fs::write(&map, MAP)?;

        let mut config = IndexConfig::new("5.1");
        config.blocks_dir = Some(blocks.clone());
        config.map_file = Some(map.clone());
        config.export_meta = true;
        config.map_cleanup = true;
        config.output_dir = Some(dir.path().join("out"));

        let output = IndexPipeline::new(config, "abcd1234").run()?;
        assert_eq!(output.asset_count, 2);
        assert!(output.index_path.ends_with("hk4e51.index"));
        assert!(output.meta_path.as_ref().map_or(false, |p| p.exists()));
        assert!(!map.exists());
        assert!(blocks.exists());

        let index = AssetIndex::open(&output.index_path)?;
        assert_eq!(index.hash, "abcd1234");
        assert_eq!(index.block("00020000")?.size, 10);
        assert_eq!(index.asset("Rock")?.source.folder, "02");
        Ok(())
    }

    struct FakeDownloader;

    impl BlockDownloader for FakeDownloader {
        fn download_blocks(&self, hash: &str, out_dir: &Path) -> Result<DownloadReport> {
            assert_eq!(hash, "abcd1234");
            write_blocks(out_dir);
            Ok(DownloadReport {
                downloaded: vec!["00012345".into()],
                skipped: vec!["00020000".into()],
                failed: vec![("00099999".into(), "404".into())],
            })
        }
    }

    struct FakeMapBuilder;

    impl MapBuilder for FakeMapBuilder {
        fn build_map(&self, blocks_dir: &Path, map_name: &str) -> Result<PathBuf> {
            assert_eq!(map_name, "hk4e5.1-map");
            let path = blocks_dir
                .parent()
                .expect("blocks dir has a parent")
                .join(format!("{}.json", map_name));
            fs::write(&path, MAP)?;
            Ok(path)
        }
    }

    #[test]
    fn test_build_with_collaborators() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let mut config = IndexConfig::new("5.1");
        config.download_blocks = true;
        config.rebuild_map = true;
        config.blk_cleanup = true;
        config.output_dir = Some(dir.path().to_path_buf());

        let downloader = FakeDownloader;
        let builder = FakeMapBuilder;
        let output = IndexPipeline::new(config, "abcd1234")
            .with_downloader(&downloader)
            .with_map_builder(&builder)
            .run()?;

        assert_eq!(output.asset_count, 2);
        assert!(output.meta_path.is_none());
        assert!(!dir.path().join("blk").exists());
        assert!(dir.path().join("hk4e5.1-map.json").exists());
        Ok(())
    }

    #[test]
    fn test_download_requested_without_downloader() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = IndexConfig::new("5.1");
        config.download_blocks = true;
        config.map_file = Some(dir.path().join("map.json"));
        config.output_dir = Some(dir.path().to_path_buf());

        let result = IndexPipeline::new(config, "h").run();
        assert!(matches!(result, Err(IndexError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_block_size_fails_build() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let blocks = dir.path().join("blk");
        fs::create_dir_all(&blocks)?;
        let map = dir.path().join("map.json");
        fs::write(&map, MAP)?;

        let mut config = IndexConfig::new("5.1");
        config.blocks_dir = Some(blocks);
        config.map_file = Some(map);
        config.output_dir = Some(dir.path().to_path_buf());

        let result = IndexPipeline::new(config, "h").run();
        assert!(matches!(result, Err(IndexError::MissingSourceSize(_))));
        assert!(!dir.path().join("hk4e51.index").exists());
        Ok(())
    }
}
