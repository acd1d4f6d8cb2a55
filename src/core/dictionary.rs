//! Deduplicated, identifier-indexed string tables
//!
//! Types, sources and containers are each stored once in their own table and
//! referenced from asset records by a 3-byte identifier. A table serializes as:
//!
//! ```text
//! count     (1 or 3 bytes, per table kind)
//! maxLength (1 byte)  = byte length of the longest value in this table
//! entries   count × [ id (3 bytes) | fixed fields | value padded to maxLength ]
//! ```
//!
//! Values are padded with zero bytes, so a value that itself ends in a zero
//! byte cannot round-trip. The writer rejects such values.

use crate::error::{IndexError, Result};
use crate::io::{ByteReader, ByteWriter, U24_MAX};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// First identifier handed out; `0x000..=0x0FF` are reserved
pub const FIRST_ID: u32 = 0x100;

/// Identifiers skipped between two consecutive tables
pub const TABLE_GAP: u32 = 0x100;

/// Hands out sequential identifiers while an index is being written
///
/// Ids start at [`FIRST_ID`] and every table after the first starts
/// [`TABLE_GAP`] past the last id of the previous one. This is a writer
/// convention only; readers treat ids as opaque per-table keys.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
    tables: usize,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator {
            next: FIRST_ID,
            tables: 0,
        }
    }

    /// Start a new table, leaving the gap after the previous one
    pub fn begin_table(&mut self) {
        if self.tables > 0 {
            self.next += TABLE_GAP;
        }
        self.tables += 1;
    }

    /// Next free identifier
    pub fn allocate(&mut self) -> Result<u32> {
        if self.next > U24_MAX {
            return Err(IndexError::FieldOverflow {
                field: "identifier",
                value: self.next as u64,
                max: U24_MAX as u64,
            });
        }
        let id = self.next;
        self.next += 1;
        Ok(id)
    }

    /// Identifier the next call to [`allocate`](Self::allocate) would return
    pub fn peek(&self) -> u32 {
        self.next
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Which dictionary a table holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Types,
    Sources,
    Containers,
}

impl TableKind {
    /// Width in bytes of the table's leading entry count
    pub fn count_width(self) -> usize {
        match self {
            TableKind::Types => 1,
            TableKind::Sources | TableKind::Containers => 3,
        }
    }

    fn count_field(self) -> &'static str {
        match self {
            TableKind::Types => "type count",
            TableKind::Sources => "source count",
            TableKind::Containers => "container count",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Types => "type",
            TableKind::Sources => "source",
            TableKind::Containers => "container",
        };
        f.write_str(name)
    }
}

/// A value stored in a dictionary table
///
/// The table writes the id; implementors write everything after it, using
/// `width` as the padded length of their string value.
pub trait TableEntry: Sized {
    /// Bytes per entry besides the id and the padded value
    const FIXED_WIDTH: usize;

    /// Deduplication key and padded string payload
    fn value(&self) -> &str;

    fn write(&self, writer: &mut ByteWriter, width: usize) -> Result<()>;

    fn read(reader: &mut ByteReader<'_>, width: usize) -> Result<Self>;
}

impl TableEntry for String {
    const FIXED_WIDTH: usize = 0;

    fn value(&self) -> &str {
        self
    }

    fn write(&self, writer: &mut ByteWriter, width: usize) -> Result<()> {
        writer.write_padded("table value", self, width)
    }

    fn read(reader: &mut ByteReader<'_>, width: usize) -> Result<Self> {
        reader.read_padded("table value", width)
    }
}

/// Source table entry: a storage block with its shard folder and size
///
/// On disk: `folder (1 byte) | block (padded) | size (4 bytes)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlock {
    pub block: String,
    pub folder: u8,
    pub size: u32,
}

impl TableEntry for SourceBlock {
    const FIXED_WIDTH: usize = 1 + 4;

    fn value(&self) -> &str {
        &self.block
    }

    fn write(&self, writer: &mut ByteWriter, width: usize) -> Result<()> {
        writer.write_u8(self.folder);
        writer.write_padded("source block", &self.block, width)?;
        writer.write_u32(self.size);
        Ok(())
    }

    fn read(reader: &mut ByteReader<'_>, width: usize) -> Result<Self> {
        let folder = reader.read_u8()?;
        let block = reader.read_padded("source block", width)?;
        let size = reader.read_u32()?;
        Ok(SourceBlock {
            block,
            folder,
            size,
        })
    }
}

/// One table row: an identifier and its entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry<E> {
    pub id: u32,
    pub entry: E,
}

/// Arena of entries with id and value indexes into it
#[derive(Debug, Clone)]
pub struct DictionaryTable<E> {
    kind: TableKind,
    entries: Vec<DictionaryEntry<E>>,
    by_id: HashMap<u32, usize>,
    by_value: HashMap<String, usize>,
}

impl<E: TableEntry> DictionaryTable<E> {
    fn empty(kind: TableKind) -> Self {
        DictionaryTable {
            kind,
            entries: Vec::new(),
            by_id: HashMap::new(),
            by_value: HashMap::new(),
        }
    }

    /// Build a table from values in first-occurrence order, dropping repeats
    ///
    /// Identifiers come from `ids`, which is advanced past this table.
    pub fn build<I>(kind: TableKind, values: I, ids: &mut IdAllocator) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
    {
        let mut table = Self::empty(kind);
        ids.begin_table();

        for entry in values {
            if table.by_value.contains_key(entry.value()) {
                continue;
            }
            if entry.value().as_bytes().last() == Some(&0) {
                return Err(IndexError::InvalidDescriptor(format!(
                    "{} value {:?} ends in a zero byte and cannot be padded",
                    kind,
                    entry.value()
                )));
            }
            let id = ids.allocate()?;
            table.insert(id, entry);
        }

        if let (Some(first), Some(last)) = (table.entries.first(), table.entries.last()) {
            debug!(
                "{} table: {} entries, ids {:#x}..={:#x}",
                kind,
                table.entries.len(),
                first.id,
                last.id
            );
        }

        Ok(table)
    }

    fn insert(&mut self, id: u32, entry: E) {
        let index = self.entries.len();
        self.by_id.insert(id, index);
        self.by_value.insert(entry.value().to_string(), index);
        self.entries.push(DictionaryEntry { id, entry });
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Padded width of the value field: the longest value in this table
    pub fn max_len(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.entry.value().len())
            .max()
            .unwrap_or(0)
    }

    pub fn get(&self, id: u32) -> Option<&E> {
        self.by_id.get(&id).map(|&index| &self.entries[index].entry)
    }

    pub fn id_of(&self, value: &str) -> Option<u32> {
        self.by_value.get(value).map(|&index| self.entries[index].id)
    }

    /// Resolve a value to its id, failing when the writer never saw it
    pub fn resolve(&self, value: &str) -> Result<u32> {
        self.id_of(value)
            .ok_or_else(|| IndexError::UnresolvedReference {
                table: self.kind,
                value: value.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictionaryEntry<E>> {
        self.entries.iter()
    }

    /// Serialize the table
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        if self.entries.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        let width = self.max_len();
        writer.write_sized(self.kind.count_field(), self.kind.count_width(), self.len())?;
        writer.write_sized("value width", 1, width)?;

        for row in &self.entries {
            writer.write_u24("identifier", row.id)?;
            row.entry.write(writer, width)?;
        }

        Ok(())
    }

    /// Parse a table written by [`encode`](Self::encode)
    pub fn decode(kind: TableKind, reader: &mut ByteReader<'_>) -> Result<Self> {
        let count = reader.read_sized(kind.count_width())?;
        let width = reader.read_u8()? as usize;

        // Rows are fixed-stride, so a lying count is caught before allocating
        let stride = 3 + E::FIXED_WIDTH + width;
        reader.ensure(count.saturating_mul(stride))?;

        let mut table = Self::empty(kind);
        table.entries.reserve(count);

        for _ in 0..count {
            let id = reader.read_u24()?;
            let entry = E::read(reader, width)?;
            if table.by_id.contains_key(&id) {
                return Err(IndexError::MalformedIndex(format!(
                    "duplicate {} id {:#x}",
                    kind, id
                )));
            }
            table.insert(id, entry);
        }

        Ok(table)
    }
}
