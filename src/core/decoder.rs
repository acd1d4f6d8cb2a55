//! Index reader
//!
//! Parses a complete `.index` buffer into an [`AssetIndex`]. Decoding is
//! all-or-nothing: any structural problem aborts with a typed error and no
//! partial catalog is returned.

use crate::catalog::{AssetIndex, AssetInfo, BlockCatalog, BlockInfo, SourceInfo};
use crate::dictionary::{DictionaryTable, SourceBlock, TableEntry, TableKind};
use crate::error::{IndexError, Result};
use crate::header::IndexHeader;
use crate::io::{read_index_file, ByteReader};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Render a stored shard folder the way the catalog exposes it
///
/// Folders are written as a single byte and printed back as zero-padded
/// decimal, so folder 7 reads as `"07"` and folder 10 as `"10"`.
pub fn format_folder(folder: u8) -> String {
    format!("{:02}", folder)
}

/// Decode an index buffer
///
/// # Errors
///
/// `InvalidMagic`, `UnsupportedFormatVersion` and `UnknownGame` for header
/// mismatches, `TruncatedIndex` for any short read, `DanglingReference` for
/// an asset pointing at a missing table entry and `MalformedIndex` for other
/// structural problems (bad UTF-8, duplicate ids, trailing bytes).
pub fn decode_index(bytes: &[u8]) -> Result<AssetIndex> {
    let mut reader = ByteReader::new(bytes);

    let header = IndexHeader::read(&mut reader)?;
    debug!("header: {} {} ({} bytes)", header.game, header.version, reader.position());

    let types: DictionaryTable<String> = DictionaryTable::decode(TableKind::Types, &mut reader)?;
    let sources: DictionaryTable<SourceBlock> =
        DictionaryTable::decode(TableKind::Sources, &mut reader)?;
    let containers: DictionaryTable<String> =
        DictionaryTable::decode(TableKind::Containers, &mut reader)?;

    debug!(
        "{} types, {} sources, {} containers",
        types.len(),
        sources.len(),
        containers.len()
    );

    let mut blocks = BlockCatalog::new();
    for row in sources.iter() {
        blocks.insert(
            row.entry.block.clone(),
            BlockInfo {
                size: row.entry.size,
                folder: format_folder(row.entry.folder),
            },
        );
    }

    let count = reader.read_u24()? as usize;
    let mut assets = BTreeMap::new();

    for _ in 0..count {
        let name_len = reader.read_u8()? as usize;
        let name = reader.read_str("asset name", name_len)?;
        let type_id = reader.read_u24()?;
        let source_id = reader.read_u24()?;
        let container_id = reader.read_u24()?;

        let asset_type = resolve(&types, type_id, &name)?.clone();
        let source = resolve(&sources, source_id, &name)?;
        let container = resolve(&containers, container_id, &name)?.clone();

        assets.insert(
            name,
            AssetInfo {
                asset_type,
                source: SourceInfo {
                    block: source.block.clone(),
                    size: source.size,
                    folder: format_folder(source.folder),
                },
                container,
            },
        );
    }

    if !reader.is_empty() {
        return Err(IndexError::MalformedIndex(format!(
            "{} unexpected bytes after the asset table",
            reader.remaining()
        )));
    }

    if assets.len() < count {
        debug!("{} duplicate asset names collapsed", count - assets.len());
    }

    info!(
        "Decoded index {} {}: {} assets in {} blocks",
        header.game,
        header.version,
        assets.len(),
        blocks.len()
    );

    Ok(AssetIndex {
        game: header.game,
        version: header.version,
        hash: header.hash,
        assets,
        blocks,
    })
}

fn resolve<'t, E: TableEntry>(
    table: &'t DictionaryTable<E>,
    id: u32,
    asset: &str,
) -> Result<&'t E> {
    table.get(id).ok_or_else(|| IndexError::DanglingReference {
        table: table.kind(),
        id,
        asset: asset.to_string(),
    })
}

impl AssetIndex {
    /// Read and decode an index file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening index at {:?}", path.as_ref());
        let bytes = read_index_file(path)?;
        decode_index(&bytes)
    }

    /// Decode an index buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_index(bytes)
    }
}
