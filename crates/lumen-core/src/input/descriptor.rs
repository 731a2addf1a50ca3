//! Input descriptor construction and resolution.

use bytes::Bytes;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::config::LimitsConfig;
use crate::error::InputError;

use super::options::{InputOptions, RawOptions};
use super::source::{Lifecycle, SharedSource};

/// Largest accepted density hint, in pixels per inch.
pub const MAX_DENSITY: i64 = 2400;

/// A raw input as handed to a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Filesystem path to an encoded image
    File(PathBuf),
    /// Encoded image (or raw pixels) already in memory
    Buffer(Bytes),
    /// Bytes will be pushed later, frame by frame
    Stream,
}

impl From<&str> for Input {
    fn from(path: &str) -> Self {
        Input::File(PathBuf::from(path))
    }
}

impl From<String> for Input {
    fn from(path: String) -> Self {
        Input::File(PathBuf::from(path))
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::File(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::File(path.to_path_buf())
    }
}

impl From<Bytes> for Input {
    fn from(bytes: Bytes) -> Self {
        Input::Buffer(bytes)
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Input::Buffer(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Input {
    fn from(bytes: &'static [u8]) -> Self {
        Input::Buffer(Bytes::from_static(bytes))
    }
}

/// What the calling constructor permits.
///
/// Pipelines opened through [`Lumen`](crate::Lumen) accept stream input.
/// Embedders building descriptors for inputs that must be readable up front
/// use [`InputContext::secondary`] to reject streams at build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputContext {
    pub allow_stream: bool,
}

impl InputContext {
    /// Context for a pipeline's primary input.
    pub fn primary() -> Self {
        Self { allow_stream: true }
    }

    /// Context that rejects stream input with `UnsupportedInput`.
    pub fn secondary() -> Self {
        Self {
            allow_stream: false,
        }
    }
}

/// Discriminant of [`Source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    FilePath,
    ByteSequence,
    IncrementalSource,
}

/// Where the pixel bytes come from.
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Buffer(Bytes),
    Stream(SharedSource),
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::File(_) => SourceKind::FilePath,
            Source::Buffer(_) => SourceKind::ByteSequence,
            Source::Stream(_) => SourceKind::IncrementalSource,
        }
    }

    /// Whether `other` names the same underlying input without comparing bytes.
    pub fn same_identity(&self, other: &Source) -> bool {
        match (self, other) {
            (Source::File(a), Source::File(b)) => a == b,
            (Source::Buffer(a), Source::Buffer(b)) => {
                a.as_ptr() == b.as_ptr() && a.len() == b.len()
            }
            (Source::Stream(a), Source::Stream(b)) => a.same_group(b),
            _ => false,
        }
    }
}

/// Validated dimensions of uninterpreted pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSpec {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl RawSpec {
    /// Byte length a buffer with these dimensions must have, or `None` if
    /// it does not fit in `usize`.
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.channels as usize)
    }
}

/// Canonical description of an input plus its interpretation hints.
#[derive(Debug, Clone)]
pub struct InputDescriptor {
    pub(crate) source: Source,
    pub(crate) density: Option<u32>,
    pub(crate) raw: Option<RawSpec>,
    pub(crate) sequential_read: bool,
    pub(crate) limit_input_pixels: u64,
}

impl InputDescriptor {
    /// Validate `input` and `options` into a descriptor.
    ///
    /// Pure: nothing is read from disk. The pixel limit starts at
    /// `limits.max_pixels` and sequential reading starts off.
    pub fn build(
        input: Input,
        options: Option<&InputOptions>,
        context: InputContext,
        limits: &LimitsConfig,
    ) -> Result<Self, InputError> {
        let source = match input {
            Input::File(path) if !path.as_os_str().is_empty() => Source::File(path),
            Input::File(_) => {
                return Err(InputError::UnsupportedInput {
                    received: "empty file path".to_string(),
                })
            }
            Input::Buffer(bytes) => Source::Buffer(bytes),
            Input::Stream if context.allow_stream => Source::Stream(SharedSource::new()),
            Input::Stream => {
                return Err(InputError::UnsupportedInput {
                    received: "stream, which is not allowed here".to_string(),
                })
            }
        };

        let mut descriptor = Self {
            source,
            density: None,
            raw: None,
            sequential_read: false,
            limit_input_pixels: limits.max_pixels,
        };

        if let Some(options) = options {
            if let Some(density) = options.density {
                descriptor.density = Some(validate_density(density)?);
            }
            if let Some(raw) = &options.raw {
                if descriptor.source.kind() == SourceKind::FilePath {
                    return Err(InputError::InvalidRawSpec {
                        problem: "raw pixel input cannot come from a file path".to_string(),
                    });
                }
                descriptor.raw = Some(validate_raw(raw, limits)?);
            }
        }

        Ok(descriptor)
    }

    /// A descriptor for a fresh stream input with no options.
    pub fn stream_input(limits: &LimitsConfig) -> Self {
        Self {
            source: Source::Stream(SharedSource::new()),
            density: None,
            raw: None,
            sequential_read: false,
            limit_input_pixels: limits.max_pixels,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn density(&self) -> Option<u32> {
        self.density
    }

    pub fn raw(&self) -> Option<RawSpec> {
        self.raw
    }

    pub fn sequential_read(&self) -> bool {
        self.sequential_read
    }

    pub fn limit_input_pixels(&self) -> u64 {
        self.limit_input_pixels
    }

    /// The incremental source, if this descriptor has one.
    pub fn stream(&self) -> Option<&SharedSource> {
        match &self.source {
            Source::Stream(source) => Some(source),
            _ => None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match &self.source {
            Source::Stream(source) => source.lifecycle(),
            Source::File(_) | Source::Buffer(_) => Lifecycle::Finalized,
        }
    }

    /// The finished form, if the input is already fully available.
    pub fn try_finish(&self) -> Option<FinishedInput> {
        let resolved = match &self.source {
            Source::File(path) => ResolvedSource::File(path.clone()),
            Source::Buffer(bytes) => ResolvedSource::Buffer(bytes.clone()),
            Source::Stream(source) => ResolvedSource::Buffer(source.flattened()?),
        };
        Some(self.finished_with(resolved))
    }

    /// Wait until the input is fully available, then snapshot it.
    ///
    /// The returned future owns everything it needs, so it can outlive `self`.
    pub fn finish(&self) -> impl Future<Output = FinishedInput> + Send + 'static {
        let snapshot = self.clone();
        async move {
            if let Some(finished) = snapshot.try_finish() {
                return finished;
            }
            let bytes = match &snapshot.source {
                Source::Stream(source) => {
                    tracing::debug!("Deferring until stream input completes");
                    source.wait().await
                }
                // Non-stream sources always finish synchronously above.
                Source::File(_) | Source::Buffer(_) => Bytes::new(),
            };
            snapshot.finished_with(ResolvedSource::Buffer(bytes))
        }
    }

    fn finished_with(&self, source: ResolvedSource) -> FinishedInput {
        FinishedInput {
            source,
            density: self.density,
            raw: self.raw,
            sequential_read: self.sequential_read,
            limit_input_pixels: self.limit_input_pixels,
        }
    }
}

/// A fully available source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    File(PathBuf),
    Buffer(Bytes),
}

/// What an engine is handed: a descriptor whose bytes are all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedInput {
    pub source: ResolvedSource,
    pub density: Option<u32>,
    pub raw: Option<RawSpec>,
    pub sequential_read: bool,
    pub limit_input_pixels: u64,
}

impl FinishedInput {
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            ResolvedSource::File(path) => Some(path),
            ResolvedSource::Buffer(_) => None,
        }
    }

    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.source {
            ResolvedSource::Buffer(bytes) => Some(bytes),
            ResolvedSource::File(_) => None,
        }
    }
}

fn validate_density(density: i64) -> Result<u32, InputError> {
    if (1..=MAX_DENSITY).contains(&density) {
        Ok(density as u32)
    } else {
        Err(InputError::InvalidDensity {
            received: format!("integer {density}"),
        })
    }
}

fn validate_raw(raw: &RawOptions, limits: &LimitsConfig) -> Result<RawSpec, InputError> {
    let width = raw_dimension("width", raw.width, limits.max_width as i64)?;
    let height = raw_dimension("height", raw.height, limits.max_height as i64)?;
    let channels = raw_dimension("channels", raw.channels, 4)?;
    let spec = RawSpec {
        width: width as u32,
        height: height as u32,
        channels: channels as u8,
    };
    if spec.expected_len().is_none() {
        return Err(InputError::InvalidRawSpec {
            problem: format!("{width}x{height}x{channels} bytes do not fit in memory"),
        });
    }
    Ok(spec)
}

fn raw_dimension(name: &str, value: Option<i64>, max: i64) -> Result<i64, InputError> {
    match value {
        None => Err(InputError::InvalidRawSpec {
            problem: format!("{name} is missing"),
        }),
        Some(v) if (1..=max).contains(&v) => Ok(v),
        Some(v) => Err(InputError::InvalidRawSpec {
            problem: format!("{name} {v} is outside 1 to {max}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(input: impl Into<Input>, options: Option<&InputOptions>) -> Result<InputDescriptor, InputError> {
        InputDescriptor::build(
            input.into(),
            options,
            InputContext::primary(),
            &LimitsConfig::default(),
        )
    }

    #[test]
    fn test_path_input() {
        for path in ["in.jpg", "/tmp/photos/a b.png", "relative/dir/x.webp"] {
            let d = build(path, None).unwrap();
            assert_eq!(d.kind(), SourceKind::FilePath);
            assert!(matches!(d.source(), Source::File(p) if p == Path::new(path)));
            assert!(d.stream().is_none());
            assert_eq!(d.lifecycle(), Lifecycle::Finalized);
        }
    }

    #[test]
    fn test_empty_path_unsupported() {
        let err = build("", None).unwrap_err();
        assert!(matches!(err, InputError::UnsupportedInput { .. }));
        assert!(err.to_string().contains("empty file path"));
    }

    #[test]
    fn test_buffer_input_keeps_bytes() {
        for data in [vec![], vec![0u8], vec![1, 2, 3, 4, 5]] {
            let d = build(data.clone(), None).unwrap();
            assert_eq!(d.kind(), SourceKind::ByteSequence);
            match d.source() {
                Source::Buffer(bytes) => assert_eq!(&bytes[..], &data[..]),
                other => panic!("expected buffer, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_stream_requires_permission() {
        let d = build(Input::Stream, None).unwrap();
        assert_eq!(d.kind(), SourceKind::IncrementalSource);
        assert_eq!(d.lifecycle(), Lifecycle::Open);
        assert_eq!(d.stream().unwrap().pending_chunks(), 0);

        let err = InputDescriptor::build(
            Input::Stream,
            None,
            InputContext::secondary(),
            &LimitsConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, InputError::UnsupportedInput { .. }));
    }

    #[test]
    fn test_density_range() {
        for ok in [1, 72, 300, 2400] {
            let d = build("a.svg", Some(&InputOptions::with_density(ok))).unwrap();
            assert_eq!(d.density(), Some(ok as u32));
        }
        for bad in [0, -1, 2401, i64::MAX] {
            let err = build("a.svg", Some(&InputOptions::with_density(bad))).unwrap_err();
            assert!(matches!(err, InputError::InvalidDensity { .. }), "{bad}");
        }
    }

    #[test]
    fn test_raw_spec() {
        let d = build(vec![0u8; 15_000], Some(&InputOptions::raw(100, 50, 3))).unwrap();
        assert_eq!(
            d.raw(),
            Some(RawSpec {
                width: 100,
                height: 50,
                channels: 3
            })
        );

        let err = build(vec![0u8; 4], Some(&InputOptions::raw(100, 50, 5))).unwrap_err();
        assert!(matches!(err, InputError::InvalidRawSpec { .. }));
        assert!(err.to_string().contains("channels 5"));

        let err = build(vec![0u8; 4], Some(&InputOptions::raw(0, 50, 3))).unwrap_err();
        assert!(err.to_string().contains("width 0"));

        let err = build(vec![0u8; 4], Some(&InputOptions::raw(100, 0x4000, 3))).unwrap_err();
        assert!(err.to_string().contains("height 16384"));
    }

    #[test]
    fn test_partial_raw_spec_rejected() {
        let options = InputOptions {
            density: None,
            raw: Some(RawOptions {
                width: Some(100),
                height: None,
                channels: None,
            }),
        };
        let err = build(vec![0u8; 4], Some(&options)).unwrap_err();
        assert_eq!(
            err,
            InputError::InvalidRawSpec {
                problem: "height is missing".into()
            }
        );
    }

    #[test]
    fn test_raw_spec_needs_non_file_source() {
        let err = build("pixels.bin", Some(&InputOptions::raw(2, 2, 1))).unwrap_err();
        assert!(matches!(err, InputError::InvalidRawSpec { .. }));

        let d = build(Input::Stream, Some(&InputOptions::raw(2, 2, 1))).unwrap();
        assert_eq!(d.raw().unwrap().expected_len(), Some(4));
    }

    #[test]
    fn test_raw_bounds_follow_limits() {
        let limits = LimitsConfig {
            max_width: 10,
            max_height: 10,
            ..LimitsConfig::default()
        };
        let err = InputDescriptor::build(
            Input::from(vec![0u8; 1]),
            Some(&InputOptions::raw(11, 1, 1)),
            InputContext::primary(),
            &limits,
        )
        .unwrap_err();
        assert!(err.to_string().contains("outside 1 to 10"));
    }

    #[test]
    fn test_expected_len_overflow() {
        let huge = RawSpec {
            width: u32::MAX,
            height: u32::MAX,
            channels: 4,
        };
        assert_eq!(huge.expected_len(), None);
        assert_eq!(
            RawSpec {
                width: 100,
                height: 50,
                channels: 3
            }
            .expected_len(),
            Some(15_000)
        );
    }

    #[test]
    fn test_raw_spec_rejects_unaddressable_size() {
        let limits = LimitsConfig {
            max_width: u32::MAX,
            max_height: u32::MAX,
            ..LimitsConfig::default()
        };
        let err = InputDescriptor::build(
            Input::from(vec![0u8; 1]),
            Some(&InputOptions::raw(u32::MAX as i64, u32::MAX as i64, 4)),
            InputContext::primary(),
            &limits,
        )
        .unwrap_err();
        assert!(err.to_string().contains("do not fit in memory"));
    }

    #[test]
    fn test_defaults() {
        let d = build("in.png", None).unwrap();
        assert_eq!(d.limit_input_pixels(), 268_402_689);
        assert!(!d.sequential_read());
        assert_eq!(d.density(), None);
        assert_eq!(d.raw(), None);
    }

    #[test]
    fn test_try_finish() {
        let d = build(vec![9u8, 8, 7], None).unwrap();
        let finished = d.try_finish().unwrap();
        assert_eq!(finished.bytes().map(|b| &b[..]), Some(&[9u8, 8, 7][..]));
        assert!(finished.path().is_none());

        let s = build(Input::Stream, None).unwrap();
        assert!(s.try_finish().is_none());
        s.stream().unwrap().complete();
        assert!(s.try_finish().is_some());
    }

    #[tokio::test]
    async fn test_finish_waits_for_stream() {
        let d = build(Input::Stream, Some(&InputOptions::with_density(150))).unwrap();
        let pending = tokio::spawn(d.finish());

        let stream = d.stream().unwrap();
        stream.accept(b"AB".into()).unwrap();
        stream.accept(b"CD".into()).unwrap();
        stream.complete();

        let finished = pending.await.unwrap();
        assert_eq!(finished.source, ResolvedSource::Buffer(Bytes::from_static(b"ABCD")));
        assert_eq!(finished.density, Some(150));
    }

    #[test]
    fn test_same_identity() {
        let a = build(vec![1u8, 2], None).unwrap();
        let b = a.clone();
        let c = build(vec![1u8, 2], None).unwrap();
        assert!(a.source().same_identity(b.source()));
        assert!(!a.source().same_identity(c.source()));
    }
}
