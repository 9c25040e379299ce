use std::collections::HashMap;

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::display::domain::frame_sink::{FrameSink, SinkEvent};
use crate::shared::frame::Frame;

/// Shows frames in native windows through minifb.
///
/// Closing a window or pressing `q` in it reports [`SinkEvent::Quit`].
#[derive(Default)]
pub struct MinifbSink {
    windows: HashMap<String, Window>,
    buffer: Vec<u32>,
}

impl MinifbSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }
}

impl FrameSink for MinifbSink {
    fn show(&mut self, title: &str, frame: &Frame) -> Result<SinkEvent, Box<dyn std::error::Error>> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;

        if !self.windows.contains_key(title) {
            let window = Window::new(title, width, height, WindowOptions::default())?;
            self.windows.insert(title.to_string(), window);
        }
        let Some(window) = self.windows.get_mut(title) else {
            return Err(format!("no window for {title}").into());
        };

        pack_rgb(frame.data(), &mut self.buffer);
        window.update_with_buffer(&self.buffer, width, height)?;

        if !window.is_open() || window.is_key_pressed(Key::Q, KeyRepeat::No) {
            return Ok(SinkEvent::Quit);
        }
        Ok(SinkEvent::Continue)
    }

    fn close_all(&mut self) {
        self.windows.clear();
    }
}

/// Packs interleaved RGB bytes into minifb's `0RGB` words.
fn pack_rgb(rgb: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        rgb.chunks_exact(3)
            .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32),
    );
}
