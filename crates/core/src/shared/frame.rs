use ndarray::{ArrayView3, ArrayViewMut3};

use crate::shared::constants::FRAME_CHANNELS;

/// A single captured frame: contiguous 3-channel bytes in row-major order.
///
/// The channel order is whatever the backend produces (RGB for ffmpeg).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * FRAME_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// Skips the length check so malformed frames can be built in tests.
    #[cfg(test)]
    pub(crate) fn new_unchecked(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A frame with every sample set to `value`.
    pub fn filled(width: u32, height: u32, value: u8, index: usize) -> Self {
        let len = (width as usize) * (height as usize) * FRAME_CHANNELS;
        Self::new(vec![value; len], width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of the frame in the backend's decode order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the buffer length matches `width * height * 3`.
    pub fn is_well_formed(&self) -> bool {
        let (height, width, channels) = self.shape();
        self.data.len() == height * width * channels
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// `(height, width, channels)`, the layout of [`Frame::as_ndarray`].
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, FRAME_CHANNELS)
    }
}
