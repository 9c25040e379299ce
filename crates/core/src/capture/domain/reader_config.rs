use crate::capture::domain::capture_error::CaptureError;

/// Construction options for a [`VideoReader`](crate::capture::video_reader::VideoReader).
///
/// Without a batch size every read returns one frame. With one, reads return
/// batches; `dynamic_batch` decides whether a short final batch is truncated
/// (`true`) or zero-padded to full size (`false`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReaderConfig {
    pub batch_size: Option<usize>,
    pub dynamic_batch: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_dynamic_batch(mut self, dynamic_batch: bool) -> Self {
        self.dynamic_batch = dynamic_batch;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_size(self, width: u32, height: u32) -> Self {
        self.with_width(width).with_height(height)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.batch_size == Some(0) {
            return Err(CaptureError::InvalidConfig("batch_size must be >= 1"));
        }
        if self.width == Some(0) {
            return Err(CaptureError::InvalidConfig("width must be >= 1"));
        }
        if self.height == Some(0) {
            return Err(CaptureError::InvalidConfig("height must be >= 1"));
        }
        Ok(())
    }
}
