//! Four-character chunk identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Size of an identifier on the wire
pub const IDENTIFIER_SIZE: usize = 4;

/// A validated 4-byte ASCII chunk tag such as `RIFF` or `fmt `.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkIdentifier([u8; IDENTIFIER_SIZE]);

const fn is_identifier_byte(byte: u8) -> bool {
    byte >= 0x20 && byte <= 0x7E
}

impl ChunkIdentifier {
    /// Validate and wrap an identifier.
    ///
    /// # Errors
    /// Returns [`Error::InvalidIdentifier`] unless `bytes` is exactly four
    /// printable ASCII characters (`0x20..=0x7E`).
    ///
    /// [`Error::InvalidIdentifier`]: crate::Error::InvalidIdentifier
    pub fn new(bytes: &[u8]) -> Result<Self> {
        let Ok(tag) = <[u8; IDENTIFIER_SIZE]>::try_from(bytes) else {
            return Err(Error::InvalidIdentifier {
                found: bytes.to_vec(),
                reason: "identifiers are exactly 4 bytes",
            });
        };
        Self::from_bytes(tag)
    }

    /// Validate a fixed-size tag.
    pub fn from_bytes(bytes: [u8; IDENTIFIER_SIZE]) -> Result<Self> {
        if bytes.iter().all(|&b| is_identifier_byte(b)) {
            Ok(Self(bytes))
        } else {
            Err(Error::InvalidIdentifier {
                found: bytes.to_vec(),
                reason: "identifiers are printable ASCII",
            })
        }
    }

    /// Compile-time constructor for well-known tags.
    ///
    /// # Panics
    /// Panics if a byte is not printable ASCII; in a `const` item this is a
    /// compile error.
    pub const fn from_const(bytes: [u8; IDENTIFIER_SIZE]) -> Self {
        let mut i = 0;
        while i < IDENTIFIER_SIZE {
            assert!(is_identifier_byte(bytes[i]), "chunk identifiers are printable ASCII");
            i += 1;
        }
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; IDENTIFIER_SIZE] {
        &self.0
    }

    /// The tag as text. Always valid since every byte is printable ASCII.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for ChunkIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ChunkIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkIdentifier({:?})", self.as_str())
    }
}

impl FromStr for ChunkIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.as_bytes())
    }
}

impl TryFrom<&[u8]> for ChunkIdentifier {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes)
    }
}

impl From<ChunkIdentifier> for [u8; IDENTIFIER_SIZE] {
    fn from(id: ChunkIdentifier) -> Self {
        id.0
    }
}

impl Serialize for ChunkIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        let id = ChunkIdentifier::new(b"fmt ").unwrap();
        assert_eq!(id.as_str(), "fmt ");
        assert_eq!(id.to_string(), "fmt ");
        assert_eq!("WAVE".parse::<ChunkIdentifier>().unwrap(), ChunkIdentifier::from_const(*b"WAVE"));
        assert!(ChunkIdentifier::new(b"~~~~").is_ok());
        assert!(ChunkIdentifier::new(b"    ").is_ok());
    }

    #[test]
    fn test_wrong_lengths_fail() {
        for input in [&b""[..], b"a", b"abc", b"abcde", b"RIFFWAVE"] {
            assert!(matches!(
                ChunkIdentifier::new(input),
                Err(Error::InvalidIdentifier { .. })
            ));
        }
    }

    #[test]
    fn test_every_single_byte_position() {
        // Sweep each byte value through each position of an otherwise valid tag.
        for position in 0..IDENTIFIER_SIZE {
            for byte in 0..=u8::MAX {
                let mut tag = *b"data";
                tag[position] = byte;
                let printable = (0x20..=0x7E).contains(&byte);
                assert_eq!(ChunkIdentifier::from_bytes(tag).is_ok(), printable, "byte {byte:#04x}");
            }
        }
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&ChunkIdentifier::from_const(*b"data")).unwrap();
        assert_eq!(json, "\"data\"");
    }
}
