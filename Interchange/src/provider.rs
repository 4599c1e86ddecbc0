//! Sound sources and sinks addressed by URI
//!
//! A [`ProviderRegistry`] is an explicit value the caller builds and passes
//! around; providers are asked in registration order and the first one that
//! accepts a URI wins.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::chunk::Endian;
use crate::error::{Error, Result};
use crate::options::WaveOptions;
use crate::parse::TypeResolver;
use crate::riff::{AudioFormat, WaveReader, WaveWriter, wave_resolver};

/// Decoded frames from some container.
pub trait SoundSource: Send {
    fn format(&self) -> &AudioFormat;

    /// Playable frames in total.
    fn frame_count(&self) -> u64;

    /// Fill `out` with interleaved frames; returns the frames read, zero at the end.
    fn read_frames_f64(&mut self, out: &mut [f64]) -> Result<usize>;

    fn read_frames_f32(&mut self, out: &mut [f32]) -> Result<usize>;
}

/// Encoded destination for frames.
pub trait SoundSink: Send {
    fn format(&self) -> &AudioFormat;

    fn write_frames_f64(&mut self, samples: &[f64]) -> Result<usize>;

    fn write_frames_f32(&mut self, samples: &[f32]) -> Result<usize>;

    /// Complete the container; returns the bytes written.
    fn finish(self: Box<Self>) -> Result<u64>;
}

/// Opens sources and sinks for the URIs it understands.
pub trait SoundProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    /// [`Error::UnsupportedUri`] if the provider does not handle `uri`.
    ///
    /// [`Error::UnsupportedUri`]: crate::Error::UnsupportedUri
    fn create_source(&self, uri: &str, options: &WaveOptions) -> Result<Box<dyn SoundSource>>;

    /// # Errors
    /// [`Error::UnsupportedUri`] if the provider does not handle `uri`,
    /// [`Error::UnsupportedFormat`] if it cannot write `format`.
    ///
    /// [`Error::UnsupportedUri`]: crate::Error::UnsupportedUri
    /// [`Error::UnsupportedFormat`]: crate::Error::UnsupportedFormat
    fn create_sink(&self, uri: &str, format: &AudioFormat) -> Result<Box<dyn SoundSink>>;
}

impl SoundSource for WaveReader {
    fn format(&self) -> &AudioFormat {
        WaveReader::format(self)
    }

    fn frame_count(&self) -> u64 {
        WaveReader::frame_count(self)
    }

    fn read_frames_f64(&mut self, out: &mut [f64]) -> Result<usize> {
        WaveReader::read_frames_f64(self, out)
    }

    fn read_frames_f32(&mut self, out: &mut [f32]) -> Result<usize> {
        WaveReader::read_frames_f32(self, out)
    }
}

impl<W: Write + Send> SoundSink for WaveWriter<W> {
    fn format(&self) -> &AudioFormat {
        WaveWriter::format(self)
    }

    fn write_frames_f64(&mut self, samples: &[f64]) -> Result<usize> {
        WaveWriter::write_frames_f64(self, samples)
    }

    fn write_frames_f32(&mut self, samples: &[f32]) -> Result<usize> {
        WaveWriter::write_frames_f32(self, samples)
    }

    fn finish(self: Box<Self>) -> Result<u64> {
        WaveWriter::finish(*self)
    }
}

/// Split a URI into a local path.
///
/// Accepts `file://` and `file:` URIs and bare paths.
///
/// # Errors
/// Returns [`Error::UnsupportedUri`] for any other scheme.
///
/// [`Error::UnsupportedUri`]: crate::Error::UnsupportedUri
pub fn file_path_from_uri(uri: &str) -> Result<PathBuf> {
    if let Some(rest) = uri.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if let Some(rest) = uri.strip_prefix("file:") {
        return Ok(PathBuf::from(rest));
    }
    if has_scheme(uri) || uri.is_empty() {
        return Err(Error::UnsupportedUri(uri.to_string()));
    }
    Ok(PathBuf::from(uri))
}

/// RFC 3986 scheme prefix; single letters are drive names, not schemes.
fn has_scheme(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn has_wave_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav") || e.eq_ignore_ascii_case("wave"))
}

/// RIFF/RIFX WAVE files on the local file system.
pub struct WaveFileProvider {
    resolver: TypeResolver,
}

impl Default for WaveFileProvider {
    fn default() -> Self {
        Self {
            resolver: wave_resolver(),
        }
    }
}

impl WaveFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom resolver, e.g. one with extra nested list types.
    #[must_use]
    pub fn with_resolver(mut self, resolver: TypeResolver) -> Self {
        self.resolver = resolver;
        self
    }
}

impl SoundProvider for WaveFileProvider {
    fn name(&self) -> &'static str {
        "wave-file"
    }

    fn create_source(&self, uri: &str, options: &WaveOptions) -> Result<Box<dyn SoundSource>> {
        let path = file_path_from_uri(uri)?;
        let file = File::open(&path)?;
        let reader = BufReader::with_capacity(options.buffer_size(), file);
        match WaveReader::from_reader(reader, &self.resolver, &options.parse) {
            Ok(reader) => Ok(Box::new(reader)),
            // A bad first tag means the file is not a chunk stream at all.
            Err(err) if err.is_resolution() || matches!(err, Error::MalformedIdentifier { offset: 0, .. }) => {
                tracing::debug!("{uri} is not a WAVE file: {err}");
                Err(Error::UnsupportedUri(uri.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    fn create_sink(&self, uri: &str, format: &AudioFormat) -> Result<Box<dyn SoundSink>> {
        let path = file_path_from_uri(uri)?;
        if !has_wave_extension(&path) {
            return Err(Error::UnsupportedUri(uri.to_string()));
        }
        format.validate().map_err(|err| Error::UnsupportedFormat(err.to_string()))?;
        format
            .codec(Endian::Little)
            .map_err(|err| Error::UnsupportedFormat(err.to_string()))?;

        let file = File::create(&path)?;
        let writer = WaveWriter::new(BufWriter::new(file), *format)?;
        Ok(Box::new(writer))
    }
}

/// Ordered set of providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn SoundProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the [`WaveFileProvider`].
    pub fn standard() -> Self {
        Self::new().with(WaveFileProvider::new())
    }

    #[must_use]
    pub fn with(mut self, provider: impl SoundProvider + 'static) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: impl SoundProvider + 'static) {
        tracing::debug!("Registered sound provider {}", provider.name());
        self.providers.push(Box::new(provider));
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.providers.iter().map(|p| p.name())
    }

    /// Open a source with the first provider that accepts `uri`.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedUri`] if no provider accepts it, or the
    /// accepting provider's error.
    ///
    /// [`Error::UnsupportedUri`]: crate::Error::UnsupportedUri
    pub fn create_source(&self, uri: &str, options: &WaveOptions) -> Result<Box<dyn SoundSource>> {
        for provider in &self.providers {
            let result = provider.create_source(uri, options);
            if !matches!(result, Err(Error::UnsupportedUri(_))) {
                return result;
            }
        }
        Err(Error::UnsupportedUri(uri.to_string()))
    }

    /// Open a sink with the first provider that accepts `uri`.
    pub fn create_sink(&self, uri: &str, format: &AudioFormat) -> Result<Box<dyn SoundSink>> {
        for provider in &self.providers {
            let result = provider.create_sink(uri, format);
            if !matches!(result, Err(Error::UnsupportedUri(_))) {
                return result;
            }
        }
        Err(Error::UnsupportedUri(uri.to_string()))
    }
}
