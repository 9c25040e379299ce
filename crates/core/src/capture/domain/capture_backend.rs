use crate::capture::domain::source::Source;
use crate::shared::frame::Frame;

/// Scalar properties a capture handle exposes through `get`/`set`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureProperty {
    FrameWidth,
    FrameHeight,
    Fps,
}

/// Opens capture handles for sources.
///
/// Implementations own the I/O details (containers, codecs, devices); the
/// reader only sees the [`CaptureHandle`] contract.
pub trait CaptureBackend {
    /// Opens `source`, routing device indices and paths as appropriate.
    fn open(&self, source: &Source) -> Result<Box<dyn CaptureHandle>, Box<dyn std::error::Error>>;
}

/// An open stream owned by exactly one reader.
pub trait CaptureHandle: Send {
    fn is_opened(&self) -> bool;

    /// Current value of `property`; 0 when unknown.
    fn get(&self, property: CaptureProperty) -> f64;

    /// Best-effort property change. Returns whether the handle accepted it.
    fn set(&mut self, property: CaptureProperty, value: f64) -> bool;

    /// Blocks for the next frame. `Ok(None)` signals end of stream.
    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    fn release(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
