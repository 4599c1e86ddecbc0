//! Back-references between chunks of one sequence

use std::fmt;

use serde::Serialize;

use super::{DefinitionInfo, InterchangeChunk};
use crate::error::{Error, Result};

/// Position of a chunk relative to the chunk it was laid out after.
///
/// Chunks live in ordered sequences: the top-level list returned by the
/// parser, or a type chunk's children. Indices address those sequences, so
/// relations never own or borrow anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Relation {
    /// First chunk of the top-level sequence.
    Root,
    /// First child of the type chunk at this index in the enclosing sequence.
    ChildOf(usize),
    /// Follows the chunk at this index in the same sequence.
    SiblingOf(usize),
}

impl Relation {
    /// Relation of the chunk at `index` within a sequence whose owner sits at
    /// `parent` in its own sequence (`None` at top level).
    pub const fn for_position(index: usize, parent: Option<usize>) -> Self {
        match (index, parent) {
            (0, None) => Relation::Root,
            (0, Some(parent)) => Relation::ChildOf(parent),
            (i, _) => Relation::SiblingOf(i - 1),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Root => f.write_str("root"),
            Relation::ChildOf(i) => write!(f, "child of #{i}"),
            Relation::SiblingOf(i) => write!(f, "sibling of #{i}"),
        }
    }
}

/// Resolve the sibling a relation points at.
///
/// `sequence` is the sequence holding the chunk. `ChildOf` targets live one
/// level up and `Root` has no target, so both return `None`.
pub fn sibling_target(sequence: &[InterchangeChunk], relation: Relation) -> Option<&InterchangeChunk> {
    match relation {
        Relation::SiblingOf(i) => sequence.get(i),
        Relation::Root | Relation::ChildOf(_) => None,
    }
}

/// Verify every relation in a sequence and, recursively, in all children.
///
/// # Errors
/// Returns [`Error::InvalidRelation`] for the first chunk whose relation does
/// not match its position.
///
/// [`Error::InvalidRelation`]: crate::Error::InvalidRelation
pub fn validate_relations(sequence: &[InterchangeChunk], parent: Option<usize>) -> Result<()> {
    for (index, chunk) in sequence.iter().enumerate() {
        let expected = Relation::for_position(index, parent);
        if chunk.relation() != expected {
            return Err(Error::InvalidRelation {
                identifier: chunk.identifier(),
                offset: chunk.offset(),
                reason: format!("expected {expected}, found {}", chunk.relation()),
            });
        }
        if let InterchangeChunk::Type(type_chunk) = chunk {
            validate_relations(type_chunk.children(), Some(index))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        assert_eq!(Relation::for_position(0, None), Relation::Root);
        assert_eq!(Relation::for_position(3, None), Relation::SiblingOf(2));
        assert_eq!(Relation::for_position(0, Some(4)), Relation::ChildOf(4));
        assert_eq!(Relation::for_position(1, Some(4)), Relation::SiblingOf(0));
    }

    #[test]
    fn test_sibling_target() {
        let data = b"RIFF\x18\x00\x00\x00WAVEJUNK\x02\x00\x00\x00abPAD \x02\x00\x00\x00cd";
        let chunks = crate::parse::parse_chunks_bytes(data, &crate::riff::wave_resolver(), &Default::default())
            .unwrap();
        assert!(sibling_target(&chunks, chunks[0].relation()).is_none());

        let children = chunks[0].as_type().unwrap().children();
        assert_eq!(children[0].relation(), Relation::ChildOf(0));
        assert!(sibling_target(children, children[0].relation()).is_none());
        let previous = sibling_target(children, children[1].relation()).unwrap();
        assert_eq!(previous.identifier().to_string(), "JUNK");
        assert_eq!(previous.offset(), 12);
        assert!(sibling_target(children, Relation::SiblingOf(5)).is_none());
    }

    #[test]
    fn test_sibling_chain_terminates() {
        // Every SiblingOf index is strictly smaller than the chunk's own index.
        for index in 0..64 {
            let mut current = Relation::for_position(index, None);
            let mut steps = 0;
            while let Relation::SiblingOf(prev) = current {
                current = Relation::for_position(prev, None);
                steps += 1;
            }
            assert_eq!(steps, index);
            assert_eq!(current, Relation::Root);
        }
    }
}
