//! Options for parsing containers and streaming samples

/// Options for [`read_chunks`](crate::parse::read_chunks).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Mark every parsed chunk read-only.
    pub read_only: bool,
    /// Fail on content identifiers without a fixed definition instead of
    /// keeping them as opaque chunks.
    pub strict: bool,
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Smallest buffer used for block-wise frame conversion (100 KiB)
pub const MINIMUM_BUFFER_SIZE: usize = 100 * 1024;

/// Buffer size used when none is requested (1 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Largest buffer used for block-wise frame conversion (100 MiB)
pub const MAXIMUM_BUFFER_SIZE: usize = 100 * 1024 * 1024;

/// Options for opening WAVE sources and sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveOptions {
    pub parse: ParseOptions,
    buffer_size: usize,
}

impl Default for WaveOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl WaveOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parse(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    /// Request a conversion buffer size in bytes.
    ///
    /// Zero selects [`DEFAULT_BUFFER_SIZE`]; anything else is clamped into
    /// `[MINIMUM_BUFFER_SIZE, MAXIMUM_BUFFER_SIZE]`.
    #[must_use]
    pub fn with_buffer_size(mut self, hint: usize) -> Self {
        self.buffer_size = if hint == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            hint.clamp(MINIMUM_BUFFER_SIZE, MAXIMUM_BUFFER_SIZE)
        };
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Whole frames that fit in the buffer, never less than one.
    pub fn frames_per_block(&self, bytes_per_frame: usize) -> usize {
        (self.buffer_size / bytes_per_frame.max(1)).max(1)
    }
}
