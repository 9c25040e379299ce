/// File extensions (lowercase, without the dot) accepted for path sources.
pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mkv", "mp4", "mov", "wmv", "webm", "flv", "mpg"];

/// Device index of the default capture device.
pub const WEBCAM: u32 = 0;

/// Display title used for device sources.
pub const WEBCAM_TITLE: &str = "Webcam";

/// Every frame is interleaved 3-channel, 8 bits per sample.
pub const FRAME_CHANNELS: usize = 3;
