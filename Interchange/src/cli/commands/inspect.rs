//! CLI command for printing chunk trees

use std::path::Path;

use serde::Serialize;

use crate::chunk::{ChunkIdentifier, DefinitionInfo, Endian, InterchangeChunk, Relation, sibling_target};
use crate::options::ParseOptions;
use crate::parse::read_chunks_from_path;
use crate::riff::wave_resolver;

/// JSON view of one chunk and its children.
#[derive(Debug, Serialize)]
struct ChunkReport {
    identifier: ChunkIdentifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<ChunkIdentifier>,
    endianness: Endian,
    offset: u64,
    content_length: u64,
    relation: Relation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<ChunkReport>,
}

impl From<&InterchangeChunk> for ChunkReport {
    fn from(chunk: &InterchangeChunk) -> Self {
        let (content_type, children) = match chunk {
            InterchangeChunk::Type(t) => (Some(t.content_type()), t.children().iter().map(Self::from).collect()),
            InterchangeChunk::Content(_) => (None, Vec::new()),
        };
        Self {
            identifier: chunk.identifier(),
            content_type,
            endianness: chunk.resolved_endian(),
            offset: chunk.offset(),
            content_length: chunk.content_length(),
            relation: chunk.relation(),
            children,
        }
    }
}

/// Print the chunk tree of a file
pub fn execute(path: &Path, json: bool, strict: bool) -> anyhow::Result<()> {
    let options = ParseOptions::new().with_read_only(true).with_strict(strict);
    let chunks = read_chunks_from_path(path, &wave_resolver(), &options)?;

    if json {
        let report: Vec<ChunkReport> = chunks.iter().map(ChunkReport::from).collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Chunks: {}", path.display());
    println!();
    print_sequence(&chunks, 0);
    Ok(())
}

fn print_sequence(sequence: &[InterchangeChunk], depth: usize) {
    for chunk in sequence {
        println!("{}{chunk} ({})", "  ".repeat(depth), relation_label(sequence, chunk));
        if let InterchangeChunk::Type(t) = chunk {
            print_sequence(t.children(), depth + 1);
        }
    }
}

/// Describe a chunk's relation, naming the sibling it follows.
fn relation_label(sequence: &[InterchangeChunk], chunk: &InterchangeChunk) -> String {
    match sibling_target(sequence, chunk.relation()) {
        Some(previous) => format!("after {} at offset {}", previous.identifier(), previous.offset()),
        None => chunk.relation().to_string(),
    }
}
