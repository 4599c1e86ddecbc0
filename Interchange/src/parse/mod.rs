//! Reading and writing chunk streams
//!
//! The read path resolves each header through a [`TypeResolver`] and builds
//! the tree with the chunk builders; the write path emits headers, content
//! and IFF pad bytes in order.

mod io;
pub mod reader;
pub mod resolver;
pub mod writer;

pub use io::{CountingReader, CountingWriter};
pub use reader::{parse_chunks_bytes, read_chunks, read_chunks_from_path};
pub use resolver::{ContentBuilderFactory, ContentResolver, TypeBuilderFactory, TypeResolver};
pub use writer::{serialize_chunks, write_chunk, write_chunks, write_chunks_to_path};
