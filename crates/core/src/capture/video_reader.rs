use std::fmt;
use std::iter::FusedIterator;

use crate::capture::domain::capture_backend::{CaptureBackend, CaptureHandle, CaptureProperty};
use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::reader_config::ReaderConfig;
use crate::capture::domain::source::Source;
use crate::display::domain::frame_sink::{FrameSink, SinkEvent};
use crate::shared::frame::Frame;
use crate::shared::frame_batch::FrameBatch;
use crate::shared::read_output::ReadOutput;
use crate::shared::stream_info::StreamInfo;

/// Reads frames, one at a time or in fixed-size batches, from a capture
/// handle it owns exclusively.
///
/// The stream is forward-only: the first read that yields no frame closes
/// the reader for good. The handle is released on [`VideoReader::release`]
/// or when the reader is dropped, whichever comes first.
pub struct VideoReader {
    source: Source,
    title: String,
    handle: Option<Box<dyn CaptureHandle>>,
    config: ReaderConfig,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: usize,
    open: bool,
    info: StreamInfo,
    shape_mismatch_reported: bool,
}

impl VideoReader {
    /// Validates `source` and `config`, opens the source through `backend`,
    /// and mirrors the stream properties.
    ///
    /// Requested width/height are applied to the handle and then reported as
    /// the reader's size even if the backend settles on something else.
    pub fn open(
        backend: &dyn CaptureBackend,
        source: impl Into<Source>,
        config: ReaderConfig,
    ) -> Result<Self, CaptureError> {
        let source = source.into();
        config.validate()?;
        source.validate()?;

        let handle = backend
            .open(&source)
            .map_err(|e| CaptureError::SourceUnavailable {
                descriptor: source.name(),
                reason: e.to_string(),
            })?;

        let mut reader = Self {
            title: source.title(),
            source,
            handle: Some(handle),
            config,
            width: 0,
            height: 0,
            fps: 0.0,
            frame_count: 0,
            open: true,
            info: StreamInfo::default(),
            shape_mismatch_reported: false,
        };
        // On error the reader is dropped here, which releases the handle.
        reader.post_init()?;
        Ok(reader)
    }

    fn post_init(&mut self) -> Result<(), CaptureError> {
        let descriptor = self.source.name();
        let Some(handle) = self.handle.as_mut() else {
            return Err(CaptureError::SourceUnavailable {
                descriptor,
                reason: "capture handle already released".to_string(),
            });
        };
        if !handle.is_opened() {
            return Err(CaptureError::SourceUnavailable {
                descriptor,
                reason: "backend reported the source as not opened".to_string(),
            });
        }

        self.width = mirror_dimension(&mut **handle, CaptureProperty::FrameWidth, self.config.width);
        self.height =
            mirror_dimension(&mut **handle, CaptureProperty::FrameHeight, self.config.height);
        self.fps = handle.get(CaptureProperty::Fps);
        self.open = handle.is_opened();

        self.info = StreamInfo {
            name: descriptor,
            width: self.width,
            height: self.height,
            fps: self.fps,
        };
        log::info!("Opened {}", self.info);
        Ok(())
    }

    /// The descriptor the reader was opened with.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Window title: the path for files, a fixed label for devices.
    pub fn video_title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Properties as mirrored at open time; not refreshed while reading.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.config.batch_size
    }

    pub fn is_dynamic_batch(&self) -> bool {
        self.config.dynamic_batch
    }

    /// Frames successfully read so far. Padding never counts.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Stream time covered by the frames read, or 0 when fps is unknown.
    pub fn seconds(&self) -> f64 {
        if self.fps > 0.0 {
            self.frame_count as f64 / self.fps
        } else {
            0.0
        }
    }

    pub fn minutes(&self) -> f64 {
        self.seconds() / 60.0
    }

    /// True while the handle is held and open and the last read produced a
    /// frame.
    pub fn is_open(&self) -> bool {
        self.open && self.handle.as_ref().is_some_and(|h| h.is_opened())
    }

    /// Reads the next frame, or `None` once the stream has ended.
    ///
    /// Backend read errors and malformed frames end the stream the same way
    /// end-of-file does.
    pub fn read_frame(&mut self) -> Option<Frame> {
        if !self.is_open() {
            self.open = false;
            return None;
        }
        let handle = self.handle.as_mut()?;

        match handle.read() {
            Ok(Some(frame)) if !frame.is_well_formed() => {
                log::warn!(
                    "{} returned a {}x{} frame with {} bytes, ending stream",
                    self.title,
                    frame.width(),
                    frame.height(),
                    frame.data().len()
                );
                self.open = false;
                None
            }
            Ok(Some(frame)) => {
                self.frame_count += 1;
                self.open = true;
                Some(frame)
            }
            Ok(None) => {
                log::debug!(
                    "End of stream for {} after {} frames",
                    self.title,
                    self.frame_count
                );
                self.open = false;
                None
            }
            Err(e) => {
                log::warn!("Reading from {} failed, ending stream: {e}", self.title);
                self.open = false;
                None
            }
        }
    }

    /// Reads up to `batch_size` frames into a `[n, height, width, 3]` batch.
    ///
    /// Returns `None` only when the reader was already closed. A stream that
    /// ends mid-batch yields a zero-padded full batch, or with dynamic
    /// batching just the frames collected (possibly none). Without a
    /// configured batch size this reads batches of one.
    pub fn read_batch(&mut self) -> Option<FrameBatch> {
        if !self.is_open() {
            return None;
        }

        let batch_size = self.config.batch_size.unwrap_or(1);
        let mut batch = FrameBatch::zeros(batch_size, self.height as usize, self.width as usize);

        let mut collected = 0;
        while collected < batch_size {
            let Some(frame) = self.read_frame() else {
                break;
            };
            if !batch.write_slot(collected, &frame) && !self.shape_mismatch_reported {
                log::warn!(
                    "{} produced {}x{} frames but the reader is sized {}x{}; copying the overlap",
                    self.title,
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                );
                self.shape_mismatch_reported = true;
            }
            collected += 1;
        }

        if self.config.dynamic_batch {
            Some(batch.truncated(collected))
        } else {
            Some(batch)
        }
    }

    /// Reads a frame, or a batch when a batch size is configured.
    pub fn read(&mut self) -> Option<ReadOutput> {
        match self.config.batch_size {
            None => self.read_frame().map(ReadOutput::Frame),
            Some(_) => self.read_batch().map(ReadOutput::Batch),
        }
    }

    /// Releases the capture handle. Safe to call any number of times; backend
    /// release failures are logged and otherwise ignored.
    pub fn release(&mut self) {
        self.open = false;
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        match handle.release() {
            Ok(()) => log::debug!("Released {}", self.title),
            Err(e) => log::warn!("Failed to release {}: {e}", self.title),
        }
    }

    /// Shows `frame` through `sink` under the reader's title.
    ///
    /// When the viewer quits, the reader is released and the sink's windows
    /// are closed.
    pub fn show(
        &mut self,
        sink: &mut dyn FrameSink,
        frame: &Frame,
    ) -> Result<SinkEvent, Box<dyn std::error::Error>> {
        let event = sink.show(&self.title, frame)?;
        if event == SinkEvent::Quit {
            self.release();
            sink.close_all();
            log::info!("Exiting...");
        }
        Ok(event)
    }
}

/// Applies a requested dimension (and trusts it) or reads back the
/// backend's value.
fn mirror_dimension(
    handle: &mut dyn CaptureHandle,
    property: CaptureProperty,
    requested: Option<u32>,
) -> u32 {
    match requested {
        Some(value) => {
            if !handle.set(property, value as f64) {
                log::debug!("Backend did not accept {property:?}={value}");
            }
            value
        }
        None => {
            let reported = handle.get(property);
            if reported.is_finite() && reported > 0.0 {
                reported as u32
            } else {
                0
            }
        }
    }
}

impl Iterator for VideoReader {
    type Item = ReadOutput;

    fn next(&mut self) -> Option<ReadOutput> {
        self.read()
    }
}

impl FusedIterator for VideoReader {}

impl Drop for VideoReader {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Display for VideoReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.info, f)
    }
}

impl fmt::Debug for VideoReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoReader")
            .field("info", &self.info)
            .field("config", &self.config)
            .field("frame_count", &self.frame_count)
            .field("open", &self.is_open())
            .finish()
    }
}
