use crate::shared::frame::Frame;

/// What the viewer asked for after a frame was shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    Continue,
    Quit,
}

/// An on-screen surface that shows frames in windows keyed by title.
pub trait FrameSink {
    /// Shows `frame` in the window named `title`, creating it if needed, and
    /// polls for the quit key.
    fn show(&mut self, title: &str, frame: &Frame) -> Result<SinkEvent, Box<dyn std::error::Error>>;

    /// Closes every window this sink opened.
    fn close_all(&mut self);
}
