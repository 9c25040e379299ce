use std::fmt;

/// Snapshot of the properties mirrored from a capture handle when it opens.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{name: {}, width: {}, height: {}, fps: {}}}",
            self.name, self.width, self.height, self.fps
        )
    }
}
