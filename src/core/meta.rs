//! Debug lookup artifact written alongside an index
//!
//! Lists the identifier assigned to every table value so a raw `.index` dump
//! can be read by hand. Readers never consume it.

use crate::dictionary::{DictionaryTable, SourceBlock};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexMeta {
    pub game: String,

    pub version: String,

    /// Creation timestamp (RFC 3339)
    pub generated_at: String,

    /// Type name -> id
    pub types: BTreeMap<String, u32>,

    /// Block name -> id
    pub sources: BTreeMap<String, u32>,

    /// Block name -> shard folder
    pub folders: BTreeMap<String, u8>,

    /// Container -> id
    pub containers: BTreeMap<String, u32>,
}

impl IndexMeta {
    pub(crate) fn from_tables(
        game: &str,
        version: &str,
        types: &DictionaryTable<String>,
        sources: &DictionaryTable<SourceBlock>,
        containers: &DictionaryTable<String>,
    ) -> Self {
        IndexMeta {
            game: game.to_string(),
            version: version.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            types: types.iter().map(|e| (e.entry.clone(), e.id)).collect(),
            sources: sources
                .iter()
                .map(|e| (e.entry.block.clone(), e.id))
                .collect(),
            folders: sources
                .iter()
                .map(|e| (e.entry.block.clone(), e.entry.folder))
                .collect(),
            containers: containers.iter().map(|e| (e.entry.clone(), e.id)).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{IdAllocator, TableKind};

    #[test]
    fn test_meta_lists_assigned_ids() -> Result<()> {
        let mut ids = IdAllocator::new();
        let types = DictionaryTable::build(
            TableKind::Types,
            vec!["Mesh".to_string(), "Texture2D".to_string()],
            &mut ids,
        )?;
        let sources = DictionaryTable::build(
            TableKind::Sources,
            vec![SourceBlock {
                block: "00012345".into(),
                folder: 4,
                size: 10,
            }],
            &mut ids,
        )?;
        let containers = DictionaryTable::build(
            TableKind::Containers,
            vec!["env/tree.ab".to_string()],
            &mut ids,
        )?;

        let meta = IndexMeta::from_tables("hk4e", "5.1", &types, &sources, &containers);
        assert_eq!(meta.types["Texture2D"], 0x101);
        assert_eq!(meta.sources["00012345"], 0x202);
        assert_eq!(meta.folders["00012345"], 4);
        assert_eq!(meta.containers["env/tree.ab"], 0x303);

        let json = meta.to_json()?;
        let parsed: IndexMeta = serde_json::from_str(&json)?;
        assert_eq!(parsed, meta);

        Ok(())
    }
}
