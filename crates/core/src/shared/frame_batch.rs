use ndarray::{s, Array4, ArrayView3, ArrayView4, Axis, Slice};

use crate::shared::constants::FRAME_CHANNELS;
use crate::shared::frame::Frame;

/// A group of consecutive frames stacked along a leading batch axis.
///
/// Layout is `[len, height, width, 3]`. Slots that were never filled stay
/// zeroed.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBatch {
    data: Array4<u8>,
}

impl FrameBatch {
    pub fn zeros(len: usize, height: usize, width: usize) -> Self {
        Self {
            data: Array4::zeros((len, height, width, FRAME_CHANNELS)),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn frame(&self, slot: usize) -> Option<ArrayView3<'_, u8>> {
        (slot < self.len()).then(|| self.data.index_axis(Axis(0), slot))
    }

    pub fn as_ndarray(&self) -> ArrayView4<'_, u8> {
        self.data.view()
    }

    pub fn into_ndarray(self) -> Array4<u8> {
        self.data
    }

    /// Copies `frame` into `slot`.
    ///
    /// Returns `false` when the frame's shape differs from the slot; only the
    /// overlapping top-left region is copied in that case and the rest of the
    /// slot keeps its previous contents.
    pub(crate) fn write_slot(&mut self, slot: usize, frame: &Frame) -> bool {
        let src = frame.as_ndarray();
        let mut dst = self.data.index_axis_mut(Axis(0), slot);
        if src.shape() == dst.shape() {
            dst.assign(&src);
            return true;
        }
        let rows = src.shape()[0].min(dst.shape()[0]);
        let cols = src.shape()[1].min(dst.shape()[1]);
        dst.slice_mut(s![..rows, ..cols, ..])
            .assign(&src.slice(s![..rows, ..cols, ..]));
        false
    }

    /// Keeps only the first `len` slots.
    pub(crate) fn truncated(mut self, len: usize) -> Self {
        let len = len.min(self.len());
        self.data.slice_axis_inplace(Axis(0), Slice::from(0..len));
        self
    }
}
