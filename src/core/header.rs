use crate::error::{IndexError, Result};
use crate::io::{trim_padding, ByteReader, ByteWriter};

pub const MAGIC: [u8; 4] = *b"GIAL";

/// Format tag, compared byte-for-byte. Not a semantic version.
pub const FORMAT_TAG: [u8; 2] = *b"10";

/// The only game code readers accept
pub const SUPPORTED_GAME: &str = "hk4e";

/// Width of the zero-padded game and version fields
pub const FIELD_WIDTH: usize = 4;

const RESERVED: [u8; 2] = [0, 0];

/// Index file header
///
/// ```text
/// magic "GIAL"      4 bytes
/// reserved          2 bytes
/// format tag "10"   2 bytes
/// reserved          2 bytes
/// game              4 bytes, zero-padded
/// version           4 bytes, zero-padded
/// hash length       1 byte
/// hash              hash length bytes
/// ```
///
/// The version and hash are carried verbatim; neither is checked against a
/// list of known releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    pub game: String,
    pub version: String,
    pub hash: String,
}

impl IndexHeader {
    pub fn new(
        game: impl Into<String>,
        version: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        IndexHeader {
            game: game.into(),
            version: version.into(),
            hash: hash.into(),
        }
    }

    /// Check that every field fits its on-disk width
    pub fn validate(&self) -> Result<()> {
        check_padded("game", &self.game)?;
        check_padded("version", &self.version)?;
        check_width("hash", &self.hash, u8::MAX as usize)?;
        Ok(())
    }

    /// Size of the serialized header in bytes
    pub fn encoded_len(&self) -> usize {
        MAGIC.len() + 2 + FORMAT_TAG.len() + 2 + 2 * FIELD_WIDTH + 1 + self.hash.len()
    }

    /// Serialize the header
    pub fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        self.validate()?;

        writer.write_bytes(&MAGIC);
        writer.write_bytes(&RESERVED);
        writer.write_bytes(&FORMAT_TAG);
        writer.write_bytes(&RESERVED);
        writer.write_padded("game", &self.game, FIELD_WIDTH)?;
        writer.write_padded("version", &self.version, FIELD_WIDTH)?;
        writer.write_sized("hash length", 1, self.hash.len())?;
        writer.write_bytes(self.hash.as_bytes());

        Ok(())
    }

    /// Parse and validate the header at the start of an index
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        if reader.take(MAGIC.len())? != MAGIC {
            return Err(IndexError::InvalidMagic);
        }
        reader.skip(RESERVED.len())?;

        let tag = reader.take(FORMAT_TAG.len())?;
        if tag != FORMAT_TAG {
            return Err(IndexError::UnsupportedFormatVersion([tag[0], tag[1]]));
        }
        reader.skip(RESERVED.len())?;

        let game = trim_padding(reader.take(FIELD_WIDTH)?);
        if game != SUPPORTED_GAME.as_bytes() {
            return Err(IndexError::UnknownGame(
                String::from_utf8_lossy(game).into_owned(),
            ));
        }
        let game = SUPPORTED_GAME.to_string();

        let version = reader.read_padded("version", FIELD_WIDTH)?;

        let hash_len = reader.read_u8()? as usize;
        let hash = reader.read_str("hash", hash_len)?;

        Ok(IndexHeader {
            game,
            version,
            hash,
        })
    }
}

fn check_width(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(IndexError::FieldOverflow {
            field,
            value: value.len() as u64,
            max: max as u64,
        });
    }
    Ok(())
}

/// Width check for the zero-padded header fields
fn check_padded(field: &'static str, value: &str) -> Result<()> {
    check_width(field, value, FIELD_WIDTH)?;
    if value.as_bytes().last() == Some(&0) {
        return Err(IndexError::InvalidDescriptor(format!(
            "{} {:?} ends in a zero byte",
            field, value
        )));
    }
    Ok(())
}
