//! CLI command for WAVE format information

use std::path::Path;

use crate::riff::WaveReader;

/// Show the audio format of a WAVE file
pub fn execute(path: &Path, json: bool) -> anyhow::Result<()> {
    let reader = WaveReader::open(path)?;
    let format = reader.format();
    let codec = reader.codec();

    if json {
        let output = serde_json::json!({
            "file": path.display().to_string(),
            "format": format,
            "codec": codec.name(),
            "endianness": reader.endian(),
            "frames": reader.frame_count(),
            "duration_secs": reader.duration_secs(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("WAVE Information: {}", path.display());
    println!();
    println!("Format: {format}");
    println!("Codec: {codec}");
    println!("Block align: {} bytes", format.block_align());
    println!("Byte rate: {} bytes/s", format.byte_rate());
    if format.channel_mask != 0 {
        println!("Channel mask: {:#x}", format.channel_mask);
    }
    println!("Frames: {}", reader.frame_count());
    println!("Duration: {:.3}s", reader.duration_secs());
    Ok(())
}
