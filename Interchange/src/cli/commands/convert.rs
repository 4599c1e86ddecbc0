//! CLI interface for sample format conversion

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{DISK, GEAR, LOOKING_GLASS, frame_bar, print_done, print_step};
use crate::options::WaveOptions;
use crate::provider::ProviderRegistry;
use crate::riff::AudioFormat;

/// Re-encode `source` into `destination` with `bits` bits per sample.
///
/// The output is written to a temporary file next to `destination` and moved
/// into place only once complete.
pub fn execute(source: &str, destination: &Path, bits: u16, float: bool, quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();
    let registry = ProviderRegistry::standard();
    let options = WaveOptions::default();

    if !quiet {
        print_step(1, 3, LOOKING_GLASS, &format!("Reading {source}..."));
    }
    let mut input = registry.create_source(source, &options)?;
    let source_format = *input.format();

    let target = target_format(&source_format, bits, float)?;
    tracing::info!("Converting {source_format} -> {target}");

    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(".interchange-")
        .suffix(".wav")
        .tempfile_in(directory)?;
    let staging_uri = staging
        .path()
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Non UTF-8 temporary path in {}", directory.display()))?
        .to_string();
    let mut output = registry.create_sink(&staging_uri, &target)?;

    if !quiet {
        print_step(2, 3, GEAR, &format!("Converting to {target}..."));
    }
    let channels = usize::from(source_format.channels);
    let mut block = vec![0f64; options.frames_per_block(source_format.bytes_per_frame()) * channels];
    let pb = frame_bar(input.frame_count(), "Converting", quiet);
    loop {
        let frames = input.read_frames_f64(&mut block)?;
        if frames == 0 {
            break;
        }
        output.write_frames_f64(&block[..frames * channels])?;
        pb.inc(frames as u64);
    }
    pb.finish_and_clear();

    if !quiet {
        print_step(3, 3, DISK, &format!("Writing {}...", destination.display()));
    }
    let written = output.finish()?;
    staging.persist(destination)?;

    if !quiet {
        println!("Wrote {written} bytes to {}", destination.display());
        print_done(started.elapsed());
    }
    Ok(())
}

/// Output layout: same channels, rate and speaker mask as the input.
fn target_format(source: &AudioFormat, bits: u16, float: bool) -> anyhow::Result<AudioFormat> {
    let format = if float {
        if bits != 32 && bits != 64 {
            anyhow::bail!("Float output needs 32 or 64 bits, got {bits}");
        }
        AudioFormat::float(source.channels, source.sample_rate, bits)
    } else {
        AudioFormat::pcm(source.channels, source.sample_rate, bits)
    };
    Ok(format.with_channel_mask(source.channel_mask))
}
