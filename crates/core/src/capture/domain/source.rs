use std::fmt;
use std::path::{Path, PathBuf};

use crate::capture::domain::capture_error::CaptureError;
use crate::shared::constants::{VIDEO_EXTENSIONS, WEBCAM_TITLE};

/// Where frames come from: a video file or a capture device index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Path(PathBuf),
    Device(u32),
}

impl Source {
    /// Interprets a textual descriptor: all-digit strings name a device
    /// index, everything else is a path.
    pub fn parse(descriptor: &str) -> Self {
        if !descriptor.is_empty() && descriptor.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = descriptor.parse() {
                return Source::Device(index);
            }
        }
        Source::Path(PathBuf::from(descriptor))
    }

    /// Extension of a path source: the text after the last `.` of the file
    /// name, lowercased.
    pub fn extension(&self) -> Option<String> {
        let Source::Path(path) = self else {
            return None;
        };
        let file_name = path.file_name()?.to_str()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }

    /// Checks a path source against [`VIDEO_EXTENSIONS`]. Devices always pass.
    pub fn validate(&self) -> Result<(), CaptureError> {
        match self {
            Source::Device(_) => Ok(()),
            Source::Path(_) => match self.extension() {
                Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
                _ => Err(CaptureError::InvalidSource {
                    descriptor: self.name(),
                }),
            },
        }
    }

    /// The descriptor as the caller gave it.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Window/display title: the path itself, or a fixed label for devices.
    pub fn title(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Device(_) => WEBCAM_TITLE.to_string(),
        }
    }

    pub fn is_device(&self) -> bool {
        matches!(self, Source::Device(_))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Device(index) => write!(f, "{index}"),
        }
    }
}

impl From<u32> for Source {
    fn from(index: u32) -> Self {
        Source::Device(index)
    }
}

impl From<&str> for Source {
    fn from(descriptor: &str) -> Self {
        Source::parse(descriptor)
    }
}

impl From<String> for Source {
    fn from(descriptor: String) -> Self {
        Source::parse(&descriptor)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}
