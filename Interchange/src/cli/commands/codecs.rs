//! CLI command listing the codec table

use crate::codec::LITTLE_ENDIAN_CODECS;

/// List every codec with its widths and round-trip tolerance
pub fn execute(json: bool) -> anyhow::Result<()> {
    if json {
        let rows: Vec<_> = LITTLE_ENDIAN_CODECS
            .iter()
            .map(|codec| {
                serde_json::json!({
                    "name": codec.name(),
                    "scheme": codec.scheme(),
                    "bytes_per_sample": codec.bytes_per_sample(),
                    "slot_bytes": codec.slot_bytes(),
                    "precision_bits": codec.precision_bits(),
                    "epsilon": codec.epsilon(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<16} {:<15} {:>5} {:>5} {:>9} {:>12}",
        "Codec", "Scheme", "Bytes", "Slot", "Precision", "Epsilon"
    );
    for codec in LITTLE_ENDIAN_CODECS {
        println!(
            "{:<16} {:<15} {:>5} {:>5} {:>9} {:>12.3e}",
            codec.name(),
            format!("{:?}", codec.scheme()),
            codec.bytes_per_sample(),
            codec.slot_bytes(),
            codec.precision_bits(),
            codec.epsilon()
        );
    }
    println!();
    println!("Every codec is also available big-endian for RIFX files.");
    Ok(())
}
