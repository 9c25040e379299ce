use crate::shared::frame::Frame;
use crate::shared::frame_batch::FrameBatch;

/// One result of [`VideoReader::read`](crate::capture::video_reader::VideoReader::read):
/// a single frame when no batch size is configured, otherwise a batch.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadOutput {
    Frame(Frame),
    Batch(FrameBatch),
}

impl ReadOutput {
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            ReadOutput::Frame(frame) => Some(frame),
            ReadOutput::Batch(_) => None,
        }
    }

    pub fn into_batch(self) -> Option<FrameBatch> {
        match self {
            ReadOutput::Batch(batch) => Some(batch),
            ReadOutput::Frame(_) => None,
        }
    }

    /// Number of frame slots carried (1 for a single frame).
    pub fn len(&self) -> usize {
        match self {
            ReadOutput::Frame(_) => 1,
            ReadOutput::Batch(batch) => batch.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
