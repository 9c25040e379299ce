use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::capture::domain::capture_backend::{CaptureBackend, CaptureHandle, CaptureProperty};
use crate::capture::domain::source::Source;
use crate::shared::frame::Frame;

/// Deterministic backend that plays back a fixed list of frames.
///
/// Every open hands out a fresh copy of the frames. Like a file source, the
/// handle ignores resize requests and keeps reporting its native size.
pub struct MemoryBackend {
    frames: Vec<Frame>,
    width: u32,
    height: u32,
    fps: f64,
    fail_open: bool,
    report_closed: bool,
    fail_release: bool,
    fail_read_after: Option<usize>,
    opens: Cell<usize>,
    releases: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            frames: Vec::new(),
            width,
            height,
            fps,
            fail_open: false,
            report_closed: false,
            fail_release: false,
            fail_read_after: None,
            opens: Cell::new(0),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    /// Appends `count` native-size frames; frame `i` is filled with `i + 1`
    /// so each one is distinguishable from zero padding.
    pub fn with_numbered_frames(mut self, count: usize) -> Self {
        let start = self.frames.len();
        for i in start..start + count {
            let value = ((i % 255) + 1) as u8;
            self.frames
                .push(Frame::filled(self.width, self.height, value, i));
        }
        self
    }

    /// `open` itself returns an error.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// `open` succeeds but the handle reports itself closed.
    pub fn reporting_closed(mut self) -> Self {
        self.report_closed = true;
        self
    }

    /// The handle's `release` returns an error.
    pub fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// The handle's `read` returns an error once `frames` frames were read.
    pub fn failing_read_after(mut self, frames: usize) -> Self {
        self.fail_read_after = Some(frames);
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.get()
    }

    /// Number of `release` calls received by handles from this backend.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl CaptureBackend for MemoryBackend {
    fn open(&self, source: &Source) -> Result<Box<dyn CaptureHandle>, Box<dyn std::error::Error>> {
        self.opens.set(self.opens.get() + 1);
        if self.fail_open {
            return Err(format!("MemoryBackend: cannot open {source}").into());
        }
        Ok(Box::new(MemoryHandle {
            frames: self.frames.iter().cloned().collect(),
            width: self.width,
            height: self.height,
            fps: self.fps,
            opened: !self.report_closed,
            fail_release: self.fail_release,
            reads_left: self.fail_read_after,
            releases: Arc::clone(&self.releases),
        }))
    }
}

struct MemoryHandle {
    frames: VecDeque<Frame>,
    width: u32,
    height: u32,
    fps: f64,
    opened: bool,
    fail_release: bool,
    reads_left: Option<usize>,
    releases: Arc<AtomicUsize>,
}

impl CaptureHandle for MemoryHandle {
    fn is_opened(&self) -> bool {
        self.opened
    }

    fn get(&self, property: CaptureProperty) -> f64 {
        match property {
            CaptureProperty::FrameWidth => self.width as f64,
            CaptureProperty::FrameHeight => self.height as f64,
            CaptureProperty::Fps => self.fps,
        }
    }

    fn set(&mut self, _property: CaptureProperty, _value: f64) -> bool {
        false
    }

    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if !self.opened {
            return Ok(None);
        }
        match self.reads_left {
            Some(0) => return Err("MemoryBackend: read failed".into()),
            Some(ref mut left) => *left -= 1,
            None => {}
        }
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.opened = false;
        self.frames.clear();
        if self.fail_release {
            return Err("MemoryBackend: release failed".into());
        }
        Ok(())
    }
}
