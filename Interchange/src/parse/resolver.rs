//! Identifier → builder lookup tables
//!
//! Resolution is data-driven: every factory is a table of definitions, and a
//! [`TypeResolver`] is the registry of container families active for a parse.

use crate::chunk::{
    ChunkDefinition, ChunkIdentifier, ContentBuilder, DefinitionInfo, TypeBuilder,
};

/// Maps content identifiers inside one content type to their definitions.
#[derive(Debug, Clone, Default)]
pub struct ContentBuilderFactory {
    definitions: Vec<ChunkDefinition>,
    opaque_fallback: bool,
}

impl ContentBuilderFactory {
    pub fn new(definitions: impl IntoIterator<Item = ChunkDefinition>) -> Self {
        Self {
            definitions: definitions.into_iter().collect(),
            opaque_fallback: false,
        }
    }

    /// Accept identifiers without a fixed definition as opaque content chunks.
    #[must_use]
    pub fn with_opaque_fallback(mut self, enabled: bool) -> Self {
        self.opaque_fallback = enabled;
        self
    }

    pub fn has_opaque_fallback(&self) -> bool {
        self.opaque_fallback
    }

    pub fn definitions(&self) -> &[ChunkDefinition] {
        &self.definitions
    }

    /// The fixed definition for an identifier, if any.
    pub fn definition(&self, identifier: ChunkIdentifier) -> Option<&ChunkDefinition> {
        self.definitions.iter().find(|d| d.identifier() == identifier)
    }

    /// Builder for `identifier`, falling back to an opaque definition when enabled.
    pub fn create(&self, identifier: ChunkIdentifier, read_only: bool) -> Option<ContentBuilder> {
        self.create_known(identifier, read_only)
            .or_else(|| self.create_opaque(identifier, read_only))
    }

    /// Builder for `identifier` only if it has a fixed definition.
    pub fn create_known(&self, identifier: ChunkIdentifier, read_only: bool) -> Option<ContentBuilder> {
        self.definition(identifier)
            .map(|d| ContentBuilder::new(*d).read_only(read_only))
    }

    /// Opaque builder for `identifier`, if the fallback is enabled.
    pub fn create_opaque(&self, identifier: ChunkIdentifier, read_only: bool) -> Option<ContentBuilder> {
        self.opaque_fallback
            .then(|| ContentBuilder::new(ChunkDefinition::content(identifier)).read_only(read_only))
    }
}

/// Maps the content type of a type chunk to the factory for its children.
#[derive(Debug, Clone, Default)]
pub struct ContentResolver {
    entries: Vec<(ChunkIdentifier, ContentBuilderFactory)>,
    default: Option<ContentBuilderFactory>,
}

impl ContentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, content_type: ChunkIdentifier, factory: ContentBuilderFactory) -> Self {
        self.entries.push((content_type, factory));
        self
    }

    /// Factory used for content types without an entry of their own.
    #[must_use]
    pub fn with_default(mut self, factory: ContentBuilderFactory) -> Self {
        self.default = Some(factory);
        self
    }

    pub fn content_types(&self) -> impl Iterator<Item = ChunkIdentifier> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn resolve(&self, content_type: ChunkIdentifier) -> Option<&ContentBuilderFactory> {
        self.entries
            .iter()
            .find(|(id, _)| *id == content_type)
            .map(|(_, factory)| factory)
            .or(self.default.as_ref())
    }
}

/// Produces type builders for one container identifier and knows which
/// content types it can hold.
#[derive(Debug, Clone)]
pub struct TypeBuilderFactory {
    definition: ChunkDefinition,
    content_resolver: ContentResolver,
}

impl TypeBuilderFactory {
    pub fn new(definition: ChunkDefinition, content_resolver: ContentResolver) -> Self {
        Self {
            definition,
            content_resolver,
        }
    }

    pub fn identifier(&self) -> ChunkIdentifier {
        self.definition.identifier()
    }

    pub fn definition(&self) -> &ChunkDefinition {
        &self.definition
    }

    pub fn create_builder(&self, read_only: bool) -> TypeBuilder {
        TypeBuilder::new(self.definition).read_only(read_only)
    }

    pub fn content_resolver(&self) -> &ContentResolver {
        &self.content_resolver
    }
}

/// Registry of type factories, keyed by container identifier.
///
/// Built once and passed by reference to every parse; lookups never allocate.
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    factories: Vec<TypeBuilderFactory>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. The first factory for an identifier wins; returns
    /// `false` if one was already registered.
    pub fn register(&mut self, factory: TypeBuilderFactory) -> bool {
        if self.get(factory.identifier()).is_some() {
            tracing::warn!(
                identifier = %factory.identifier(),
                "type resolver already registered, keeping the first"
            );
            return false;
        }
        self.factories.push(factory);
        true
    }

    #[must_use]
    pub fn with(mut self, factory: TypeBuilderFactory) -> Self {
        self.register(factory);
        self
    }

    pub fn get(&self, identifier: ChunkIdentifier) -> Option<&TypeBuilderFactory> {
        self.factories.iter().find(|f| f.identifier() == identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = ChunkIdentifier> + '_ {
        self.factories.iter().map(TypeBuilderFactory::identifier)
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Endian;

    const FORM: ChunkIdentifier = ChunkIdentifier::from_const(*b"FORM");
    const AIFF: ChunkIdentifier = ChunkIdentifier::from_const(*b"AIFF");
    const COMM: ChunkIdentifier = ChunkIdentifier::from_const(*b"COMM");
    const SSND: ChunkIdentifier = ChunkIdentifier::from_const(*b"SSND");

    fn form_factory() -> TypeBuilderFactory {
        let aiff = ContentBuilderFactory::new([
            ChunkDefinition::content(COMM),
            ChunkDefinition::content(SSND).with_child_relative_offset(8),
        ]);
        TypeBuilderFactory::new(
            ChunkDefinition::type_chunk(FORM, Some(Endian::Big)),
            ContentResolver::new().with(AIFF, aiff),
        )
    }

    #[test]
    fn test_content_lookup() {
        let factory = form_factory();
        let content = factory.content_resolver().resolve(AIFF).unwrap();
        assert!(content.create(COMM, false).is_some());
        assert_eq!(content.definition(SSND).unwrap().child_relative_offset(), 8);
        assert!(content.create(ChunkIdentifier::from_const(*b"MARK"), false).is_none());
        assert!(factory.content_resolver().resolve(ChunkIdentifier::from_const(*b"AIFC")).is_none());
    }

    #[test]
    fn test_opaque_fallback() {
        let factory = ContentBuilderFactory::new([]).with_opaque_fallback(true);
        let junk = ChunkIdentifier::from_const(*b"JUNK");
        let builder = factory.create(junk, true).unwrap();
        assert_eq!(builder.definition().identifier(), junk);
        assert!(factory.create_known(junk, true).is_none());
    }

    #[test]
    fn test_default_content_resolver() {
        let resolver = ContentResolver::new().with_default(ContentBuilderFactory::default());
        assert!(resolver.resolve(AIFF).is_some());
    }

    #[test]
    fn test_first_registration_wins() {
        let mut resolver = TypeResolver::new();
        assert!(resolver.is_empty());
        assert!(resolver.register(form_factory()));
        let other = TypeBuilderFactory::new(
            ChunkDefinition::type_chunk(FORM, Some(Endian::Little)),
            ContentResolver::new(),
        );
        assert!(!resolver.register(other));
        assert_eq!(resolver.get(FORM).unwrap().definition().endian(), Some(Endian::Big));
        assert!(resolver.get(ChunkIdentifier::from_const(*b"RIFF")).is_none());
        assert_eq!(resolver.identifiers().collect::<Vec<_>>(), vec![FORM]);
    }
}
