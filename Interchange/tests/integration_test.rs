use interchange::chunk::{ChunkIdentifier, MAX_CONTENT_LENGTH};
use interchange::codec::{BIG_ENDIAN_CODECS, LITTLE_ENDIAN_CODECS};
use interchange::parse::parse_chunks_bytes;
use interchange::prelude::*;
use interchange::riff::{DATA, DATA_DEFINITION, FMT_DEFINITION, LIST, LIST_DEFINITION, RIFF_DEFINITION, WAVE};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const INFO: ChunkIdentifier = ChunkIdentifier::from_const(*b"INFO");
const INAM: ChunkIdentifier = ChunkIdentifier::from_const(*b"INAM");
const JUNK: ChunkIdentifier = ChunkIdentifier::from_const(*b"JUNK");

fn test_signal(frames: usize, channels: usize) -> Vec<f64> {
    (0..frames * channels)
        .map(|i| ((i as f64) * 0.37).sin() * 0.9)
        .collect()
}

fn annotated_wave() -> TypeChunk {
    let format = AudioFormat::pcm(1, 8_000, 16);
    TypeBuilder::new(RIFF_DEFINITION)
        .content_type(WAVE)
        .child(ContentBuilder::new(FMT_DEFINITION).content(format.to_chunk_bytes(Endian::Little)))
        .child(ContentBuilder::new(ChunkDefinition::content(JUNK)).content(vec![0xAA; 3]))
        .child(
            TypeBuilder::new(LIST_DEFINITION)
                .content_type(INFO)
                .child(ContentBuilder::new(ChunkDefinition::content(INAM)).content(b"tone\0".to_vec())),
        )
        .child(ContentBuilder::new(DATA_DEFINITION).content(vec![0x00, 0x40, 0x00, 0xC0]))
        .build()
        .unwrap()
}

#[test]
fn test_wave_roundtrip_every_wave_codec() {
    let dir = tempdir().unwrap();
    let samples = test_signal(257, 2);

    for codec in LITTLE_ENDIAN_CODECS {
        let Ok(format) = AudioFormat::for_codec(codec, 2, 44_100) else {
            continue;
        };
        let path = dir.path().join(format!("{}.wav", codec.name()));
        write_wave(&path, format, &samples).unwrap();

        let mut reader = WaveReader::open(&path).unwrap();
        assert_eq!(reader.codec(), codec);
        assert_eq!(reader.frame_count(), 257);
        let decoded = reader.read_all_f64().unwrap();
        assert_eq!(decoded.len(), samples.len());
        for (expected, actual) in samples.iter().zip(&decoded) {
            assert!(
                (expected - actual).abs() <= codec.epsilon(),
                "{codec}: {expected} vs {actual}"
            );
        }
    }
}

#[test]
fn test_rifx_roundtrip_big_endian_codecs() {
    let samples = test_signal(31, 1);
    for codec in BIG_ENDIAN_CODECS {
        let Ok(format) = AudioFormat::for_codec(codec, 1, 22_050) else {
            continue;
        };
        let mut bytes = Vec::new();
        let mut writer = WaveWriter::with_endian(&mut bytes, format, Endian::Big).unwrap();
        writer.write_frames_f64(&samples).unwrap();
        writer.finish().unwrap();

        assert_eq!(&bytes[0..4], b"RIFX");
        let mut reader = WaveReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.codec(), codec);
        let decoded = reader.read_all_f64().unwrap();
        for (expected, actual) in samples.iter().zip(&decoded) {
            assert!((expected - actual).abs() <= codec.epsilon(), "{codec}");
        }
    }
}

#[test]
fn test_chunk_tree_roundtrip_with_nested_list() {
    let built: InterchangeChunk = annotated_wave().into();
    let bytes = serialize_chunks(std::slice::from_ref(&built)).unwrap();
    assert_eq!(bytes.len() as u64, built.serialized_size());

    let parsed = parse_chunks_bytes(&bytes, &wave_resolver(), &ParseOptions::default()).unwrap();
    assert_eq!(parsed, vec![built]);

    let form = parsed[0].as_type().unwrap();
    let list = form.find(LIST).and_then(InterchangeChunk::as_type).unwrap();
    assert_eq!(list.content_type(), INFO);
    assert_eq!(list.relation(), Relation::SiblingOf(1));
    assert_eq!(list.resolved_endian(), Endian::Little);
    assert_eq!(list.find_content(INAM).unwrap().bytes(), b"tone\0");

    let mut reader = WaveReader::from_chunks(parsed).unwrap();
    assert_eq!(reader.read_all_f64().unwrap(), vec![0.5, -0.5]);
}

#[test]
fn test_strict_parsing_rejects_unknown_chunks() {
    let bytes = serialize_chunks(&[annotated_wave().into()]).unwrap();
    let strict = ParseOptions::new().with_strict(true);
    let err = parse_chunks_bytes(&bytes, &wave_resolver(), &strict).unwrap_err();
    assert!(err.is_resolution());
    assert!(matches!(err, Error::UnrecognizedChunk { identifier, .. } if identifier == JUNK));
}

#[test]
fn test_read_only_parse_blocks_mutation() {
    let bytes = serialize_chunks(&[annotated_wave().into()]).unwrap();
    let options = ParseOptions::new().with_read_only(true);
    let mut parsed = parse_chunks_bytes(&bytes, &wave_resolver(), &options).unwrap();
    assert!(parsed[0].is_read_only());

    let InterchangeChunk::Type(form) = &mut parsed[0] else {
        panic!("expected a type chunk");
    };
    assert!(matches!(form.child_mut(0), Err(Error::ReadOnly { .. })));
}

#[test]
fn test_mutation_survives_rewrite() {
    let bytes = serialize_chunks(&[annotated_wave().into()]).unwrap();
    let mut parsed = parse_chunks_bytes(&bytes, &wave_resolver(), &ParseOptions::default()).unwrap();
    let InterchangeChunk::Type(form) = &mut parsed[0] else {
        panic!("expected a type chunk");
    };
    let data_index = form.position(DATA).unwrap();
    let data = form.child_mut(data_index).unwrap().unwrap().as_content_mut().unwrap();
    data.set_word_at(0, 0x2000).unwrap();

    let rewritten = serialize_chunks(&parsed).unwrap();
    assert_eq!(rewritten.len(), bytes.len());
    let mut reader = WaveReader::from_bytes(&rewritten).unwrap();
    assert_eq!(reader.read_all_f64().unwrap(), vec![0.25, -0.5]);
}

#[test]
fn test_truncated_and_foreign_streams() {
    let bytes = serialize_chunks(&[annotated_wave().into()]).unwrap();
    let truncated = &bytes[..bytes.len() - 3];
    let err = parse_chunks_bytes(truncated, &wave_resolver(), &ParseOptions::default()).unwrap_err();
    assert!(err.is_structural(), "{err}");

    let mut aiff = bytes.clone();
    aiff[0..4].copy_from_slice(b"FORM");
    let err = parse_chunks_bytes(&aiff, &wave_resolver(), &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnrecognizedType { offset: 0, .. }));

    let mut avi = bytes;
    avi[8..12].copy_from_slice(b"AVI ");
    let err = parse_chunks_bytes(&avi, &wave_resolver(), &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnrecognizedContentType { .. }));
}

#[test]
fn test_oversized_content_rejected() {
    let err = ContentBuilder::new(DATA_DEFINITION.with_max_content_length(4))
        .content(vec![0; 5])
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidContentLength { length: 5, max: 4, .. }));
    assert_eq!(DATA_DEFINITION.max_content_length(), MAX_CONTENT_LENGTH);
}

#[test]
fn test_provider_registry_conversion_path() {
    let dir = tempdir().unwrap();
    let source_path = dir.path().join("source.wav");
    let samples = test_signal(100, 2);
    write_wave(&source_path, AudioFormat::pcm(2, 48_000, 24), &samples).unwrap();

    let registry = ProviderRegistry::standard();
    let options = WaveOptions::default().with_buffer_size(0);
    let mut source = registry
        .create_source(&format!("file:{}", source_path.display()), &options)
        .unwrap();

    let target_path = dir.path().join("target.wave");
    let target = AudioFormat::float(2, 48_000, 64);
    let mut sink = registry.create_sink(target_path.to_str().unwrap(), &target).unwrap();

    let mut block = vec![0f64; 2 * 30];
    loop {
        let frames = source.read_frames_f64(&mut block).unwrap();
        if frames == 0 {
            break;
        }
        sink.write_frames_f64(&block[..frames * 2]).unwrap();
    }
    sink.finish().unwrap();

    let mut reader = WaveReader::open(&target_path).unwrap();
    assert_eq!(reader.format(), &target);
    assert_eq!(reader.frame_count(), 100);
    let epsilon = interchange::codec::PACKED_24.epsilon();
    for (expected, actual) in samples.iter().zip(reader.read_all_f64().unwrap()) {
        assert!((expected - actual).abs() <= epsilon);
    }

    assert!(matches!(
        registry.create_source("ftp://example.com/a.wav", &options),
        Err(Error::UnsupportedUri(_))
    ));
}
