//! RIFF / RIFX / WAVE chunk tables
//!
//! The WAVE support is configuration plugged into the generic chunk engine:
//! fixed identifiers, definitions and the resolver tables that let
//! [`read_chunks`](crate::parse::read_chunks) materialize a WAVE file.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::{AudioFormat, FormatTag, SampleFormat, select_codec};
pub use reader::WaveReader;
pub use writer::{WaveWriter, create_wave, write_wave};

use serde::Serialize;

use crate::chunk::{ChunkDefinition, ChunkIdentifier, Endian};
use crate::parse::{ContentBuilderFactory, ContentResolver, TypeBuilderFactory, TypeResolver};

pub const RIFF: ChunkIdentifier = ChunkIdentifier::from_const(*b"RIFF");
pub const RIFX: ChunkIdentifier = ChunkIdentifier::from_const(*b"RIFX");
pub const LIST: ChunkIdentifier = ChunkIdentifier::from_const(*b"LIST");
pub const WAVE: ChunkIdentifier = ChunkIdentifier::from_const(*b"WAVE");
pub const FMT: ChunkIdentifier = ChunkIdentifier::from_const(*b"fmt ");
pub const FACT: ChunkIdentifier = ChunkIdentifier::from_const(*b"fact");
pub const DATA: ChunkIdentifier = ChunkIdentifier::from_const(*b"data");

pub const RIFF_DEFINITION: ChunkDefinition = ChunkDefinition::type_chunk(RIFF, Some(Endian::Little));
pub const RIFX_DEFINITION: ChunkDefinition = ChunkDefinition::type_chunk(RIFX, Some(Endian::Big));
/// Nested list; takes the byte order of its container.
pub const LIST_DEFINITION: ChunkDefinition = ChunkDefinition::type_chunk(LIST, None);
pub const FMT_DEFINITION: ChunkDefinition = ChunkDefinition::content(FMT);
pub const FACT_DEFINITION: ChunkDefinition = ChunkDefinition::content(FACT);
pub const DATA_DEFINITION: ChunkDefinition = ChunkDefinition::content(DATA);

/// Container families known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFamily {
    /// Little-endian RIFF.
    Riff,
    /// Big-endian RIFF.
    Rifx,
    /// `LIST` chunks nested inside either of the above.
    List,
}

impl ContainerFamily {
    pub const ALL: [ContainerFamily; 3] = [ContainerFamily::Riff, ContainerFamily::Rifx, ContainerFamily::List];

    pub const fn definition(self) -> ChunkDefinition {
        match self {
            ContainerFamily::Riff => RIFF_DEFINITION,
            ContainerFamily::Rifx => RIFX_DEFINITION,
            ContainerFamily::List => LIST_DEFINITION,
        }
    }

    /// Family whose root chunk uses the given byte order.
    pub const fn for_endian(endian: Endian) -> Self {
        match endian {
            Endian::Little => ContainerFamily::Riff,
            Endian::Big => ContainerFamily::Rifx,
        }
    }

    pub fn type_factory(self) -> TypeBuilderFactory {
        let resolver = match self {
            ContainerFamily::Riff | ContainerFamily::Rifx => ContentResolver::new().with(WAVE, wave_content_factory()),
            // INFO, adtl and vendor lists are all kept as opaque children.
            ContainerFamily::List => ContentResolver::new()
                .with_default(ContentBuilderFactory::default().with_opaque_fallback(true)),
        };
        TypeBuilderFactory::new(self.definition(), resolver)
    }
}

/// Content table of a `WAVE` form: fixed definitions for "fmt ", "fact" and
/// "data", opaque chunks for everything else.
pub fn wave_content_factory() -> ContentBuilderFactory {
    ContentBuilderFactory::new([FMT_DEFINITION, FACT_DEFINITION, DATA_DEFINITION]).with_opaque_fallback(true)
}

/// Resolver with every [`ContainerFamily`] registered.
pub fn wave_resolver() -> TypeResolver {
    ContainerFamily::ALL
        .into_iter()
        .fold(TypeResolver::new(), |resolver, family| resolver.with(family.type_factory()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::DefinitionInfo;

    #[test]
    fn test_resolver_registers_families() {
        let resolver = wave_resolver();
        assert_eq!(resolver.identifiers().collect::<Vec<_>>(), vec![RIFF, RIFX, LIST]);
        assert_eq!(resolver.get(RIFX).unwrap().definition().endian(), Some(Endian::Big));
        assert_eq!(resolver.get(LIST).unwrap().definition().endian(), None);
    }

    #[test]
    fn test_wave_table() {
        let factory = wave_content_factory();
        assert!(factory.create_known(FMT, false).is_some());
        assert!(factory.create_known(DATA, false).is_some());
        let junk = ChunkIdentifier::from_const(*b"JUNK");
        assert!(factory.create_known(junk, false).is_none());
        assert!(factory.create(junk, false).is_some());
    }

    #[test]
    fn test_riff_rejects_other_forms() {
        let riff = ContainerFamily::Riff.type_factory();
        assert!(riff.content_resolver().resolve(WAVE).is_some());
        assert!(riff.content_resolver().resolve(ChunkIdentifier::from_const(*b"AVI ")).is_none());
        let list = ContainerFamily::List.type_factory();
        assert!(list.content_resolver().resolve(ChunkIdentifier::from_const(*b"INFO")).is_some());
    }
}
