//! Index writer
//!
//! Turns an asset map plus per-block sizes into a single `.index` buffer:
//! header, Types, Sources and Containers dictionaries, then one
//! variable-length record per asset referencing those dictionaries by id.

use crate::asset_map::{AssetDescriptor, SourceSizes};
use crate::dictionary::{DictionaryTable, IdAllocator, SourceBlock, TableEntry, TableKind};
use crate::error::{IndexError, Result};
use crate::header::IndexHeader;
use crate::io::ByteWriter;
use crate::meta::IndexMeta;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Everything the writer needs besides the assets themselves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub game: String,
    pub version: String,
    pub hash: String,
    /// Also produce the id lookup artifact
    pub export_meta: bool,
}

impl EncoderConfig {
    pub fn new(
        game: impl Into<String>,
        version: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        EncoderConfig {
            game: game.into(),
            version: version.into(),
            hash: hash.into(),
            export_meta: false,
        }
    }

    pub fn with_meta(mut self) -> Self {
        self.export_meta = true;
        self
    }
}

/// Writer output
#[derive(Debug, Clone)]
pub struct EncodedIndex {
    pub bytes: Vec<u8>,
    pub meta: Option<IndexMeta>,
}

pub struct IndexEncoder {
    config: EncoderConfig,
}

impl IndexEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        IndexEncoder { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode `assets` into an index buffer
    ///
    /// # Errors
    ///
    /// - `EmptyIndex` when `assets` is empty
    /// - `InvalidDescriptor` for empty or over-long names and unparsable sources
    /// - `MissingSourceSize` when a block has no entry in `sizes`
    /// - `FieldOverflow` when a count, id, width or size exceeds its field
    pub fn encode(&self, assets: &[AssetDescriptor], sizes: &SourceSizes) -> Result<EncodedIndex> {
        if assets.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        let header = IndexHeader::new(
            self.config.game.as_str(),
            self.config.version.as_str(),
            self.config.hash.as_str(),
        );
        header.validate()?;

        let sources = collect_sources(assets, sizes)?;

        info!(
            "Encoding {} assets for {} {}",
            assets.len(),
            self.config.game,
            self.config.version
        );

        let mut ids = IdAllocator::new();
        let types = DictionaryTable::build(
            TableKind::Types,
            assets.iter().map(|a| a.asset_type.clone()),
            &mut ids,
        )?;
        let sources = DictionaryTable::build(TableKind::Sources, sources, &mut ids)?;
        let containers = DictionaryTable::build(
            TableKind::Containers,
            assets.iter().map(|a| a.container.clone()),
            &mut ids,
        )?;

        info!(
            "{} types, {} sources, {} containers",
            types.len(),
            sources.len(),
            containers.len()
        );

        let mut writer = ByteWriter::with_capacity(header.encoded_len() + assets.len() * 32);

        header.write(&mut writer)?;
        debug!("header: {} bytes", writer.len());

        let types_at = encode_table(&types, &mut writer)?;
        let sources_at = encode_table(&sources, &mut writer)?;
        let containers_at = encode_table(&containers, &mut writer)?;
        debug!(
            "table offsets: types {}, sources {}, containers {}",
            types_at, sources_at, containers_at
        );

        let start = writer.len();
        writer.write_sized("asset count", 3, assets.len())?;
        for asset in assets {
            write_record(&mut writer, asset, &types, &sources, &containers)?;
        }
        debug!("assets: {} bytes", writer.len() - start);

        let meta = self.config.export_meta.then(|| {
            IndexMeta::from_tables(
                &self.config.game,
                &self.config.version,
                &types,
                &sources,
                &containers,
            )
        });

        let bytes = writer.into_inner();
        info!("Encoded index: {} bytes", bytes.len());

        Ok(EncodedIndex { bytes, meta })
    }
}

/// Encode `table`, returning the offset it starts at
fn encode_table<E: TableEntry>(
    table: &DictionaryTable<E>,
    writer: &mut ByteWriter,
) -> Result<usize> {
    let start = writer.len();
    table.encode(writer)?;
    Ok(start)
}

/// Source entries in first-occurrence order, one per block name
fn collect_sources(assets: &[AssetDescriptor], sizes: &SourceSizes) -> Result<Vec<SourceBlock>> {
    let mut seen: HashMap<String, u8> = HashMap::new();
    let mut sources = Vec::new();

    for asset in assets {
        let source = asset.source_ref()?;

        if let Some(&folder) = seen.get(&source.block) {
            if folder != source.folder {
                warn!(
                    "Block {} listed under shard folders {} and {}; keeping {}",
                    source.block, folder, source.folder, folder
                );
            }
            continue;
        }

        let size = *sizes
            .get(&source.block)
            .ok_or_else(|| IndexError::MissingSourceSize(source.block.clone()))?;
        let size = u32::try_from(size).map_err(|_| IndexError::FieldOverflow {
            field: "block size",
            value: size,
            max: u32::MAX as u64,
        })?;

        seen.insert(source.block.clone(), source.folder);
        sources.push(SourceBlock {
            block: source.block,
            folder: source.folder,
            size,
        });
    }

    Ok(sources)
}

fn write_record(
    writer: &mut ByteWriter,
    asset: &AssetDescriptor,
    types: &DictionaryTable<String>,
    sources: &DictionaryTable<SourceBlock>,
    containers: &DictionaryTable<String>,
) -> Result<()> {
    if asset.name.is_empty() {
        return Err(IndexError::InvalidDescriptor(
            "asset name must not be empty".to_string(),
        ));
    }

    let name = asset.name.as_bytes();
    writer.write_sized("asset name length", 1, name.len())?;
    writer.write_bytes(name);

    let block = asset.source_ref()?.block;
    writer.write_u24("type id", types.resolve(&asset.asset_type)?)?;
    writer.write_u24("source id", sources.resolve(&block)?)?;
    writer.write_u24("container id", containers.resolve(&asset.container)?)?;

    Ok(())
}
