use ffmpeg_next::format::context::{Context, Input};
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::capture::domain::capture_backend::{CaptureBackend, CaptureHandle, CaptureProperty};
use crate::capture::domain::source::Source;
use crate::shared::frame::Frame;

/// Opens files through libavformat/libavcodec and devices through ffmpeg's
/// platform capture inputs.
///
/// Decoded frames are converted to RGB24. Width/height set on the handle
/// before reading make it scale its output to that size.
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for FfmpegBackend {
    fn open(&self, source: &Source) -> Result<Box<dyn CaptureHandle>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let input = match source {
            Source::Path(path) => ffmpeg_next::format::input(path)?,
            Source::Device(index) => open_device(*index)?,
        };
        let handle = FfmpegHandle::new(input)?;
        log::debug!(
            "ffmpeg opened {source}: {}x{} @ {:.2} fps",
            handle.target_width,
            handle.target_height,
            handle.fps
        );
        Ok(Box::new(handle))
    }
}

/// Platform input format and URL for a capture device index.
fn device_locator(index: u32) -> Option<(&'static str, String)> {
    if cfg!(target_os = "linux") {
        Some(("video4linux2", format!("/dev/video{index}")))
    } else if cfg!(target_os = "macos") {
        Some(("avfoundation", index.to_string()))
    } else {
        None
    }
}

fn open_device(index: u32) -> Result<Input, Box<dyn std::error::Error>> {
    let (format_name, url) = device_locator(index)
        .ok_or("capture by device index is not supported on this platform")?;

    // Input device names are comma-separated aliases, e.g. "video4linux2,v4l2".
    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name().split(',').any(|name| name == format_name))
        .ok_or_else(|| format!("ffmpeg has no {format_name} input device"))?;

    match ffmpeg_next::format::open_with(
        &url,
        &ffmpeg_next::format::Format::Input(format),
        ffmpeg_next::Dictionary::new(),
    )? {
        Context::Input(input) => Ok(input),
        Context::Output(_) => Err(format!("{url} did not open as an input").into()),
    }
}

struct FfmpegHandle {
    input_ctx: Option<Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<(ScalerInput, scaling::Context)>,
    video_stream_index: usize,
    fps: f64,
    target_width: u32,
    target_height: u32,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

/// Decoded-frame layout a scaler was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScalerInput {
    format: ffmpeg_next::format::Pixel,
    width: u32,
    height: u32,
}

impl ScalerInput {
    fn of(frame: &Video) -> Self {
        Self {
            format: frame.format(),
            width: frame.width(),
            height: frame.height(),
        }
    }
}

// Safety: a handle is owned by one reader and only used from one thread at a
// time. The raw pointers inside ffmpeg types are never shared.
unsafe impl Send for FfmpegHandle {}

impl FfmpegHandle {
    fn new(input: Input) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let fps = rational_to_fps(stream.rate())
            .or_else(|| rational_to_fps(stream.avg_frame_rate()))
            .unwrap_or(0.0);
        let width = decoder.width();
        let height = decoder.height();

        Ok(Self {
            input_ctx: Some(input),
            decoder: Some(decoder),
            scaler: None,
            video_stream_index,
            fps,
            target_width: width,
            target_height: height,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    /// Pulls packets until the decoder yields a frame or the input is drained.
    fn next_decoded(&mut self) -> Option<Video> {
        let (Some(ictx), Some(decoder)) = (self.input_ctx.as_mut(), self.decoder.as_mut()) else {
            return None;
        };

        loop {
            let mut decoded = Video::empty();
            if decoder.receive_frame(&mut decoded).is_ok() {
                return Some(decoded);
            }
            if self.flushing {
                return None;
            }

            match ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.video_stream_index {
                        continue;
                    }
                    if let Err(e) = decoder.send_packet(&packet) {
                        log::debug!("ffmpeg dropped a packet: {e}");
                    }
                }
                None => {
                    let _ = decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }

    /// Scales a decoded frame to the target size as packed RGB24.
    ///
    /// The scaler is rebuilt whenever the decoded format or size changes,
    /// so streams that switch resolution keep reading.
    fn convert(&mut self, decoded: &Video) -> Result<Frame, Box<dyn std::error::Error>> {
        let input = ScalerInput::of(decoded);
        let (width, height) = (self.target_width, self.target_height);

        if self.scaler.as_ref().map(|(built_for, _)| *built_for) != Some(input) {
            log::debug!(
                "Building scaler {:?} {}x{} -> RGB24 {width}x{height}",
                input.format,
                input.width,
                input.height
            );
            let scaler = scaling::Context::get(
                input.format,
                input.width,
                input.height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )?;
            self.scaler = Some((input, scaler));
        }
        let Some((_, scaler)) = self.scaler.as_mut() else {
            return Err("ffmpeg scaler unavailable".into());
        };

        let mut rgb_frame = Video::empty();
        scaler.run(decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, self.frame_index);
        self.frame_index += 1;
        Ok(frame)
    }
}

impl CaptureHandle for FfmpegHandle {
    fn is_opened(&self) -> bool {
        self.input_ctx.is_some()
    }

    fn get(&self, property: CaptureProperty) -> f64 {
        match property {
            CaptureProperty::FrameWidth => self.target_width as f64,
            CaptureProperty::FrameHeight => self.target_height as f64,
            CaptureProperty::Fps => self.fps,
        }
    }

    fn set(&mut self, property: CaptureProperty, value: f64) -> bool {
        if !value.is_finite() || value < 1.0 {
            return false;
        }
        match property {
            CaptureProperty::FrameWidth => self.target_width = value as u32,
            CaptureProperty::FrameHeight => self.target_height = value as u32,
            CaptureProperty::Fps => return false,
        }
        // Rebuilt with the new output size on the next read.
        self.scaler = None;
        true
    }

    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }
        let Some(decoded) = self.next_decoded() else {
            self.done = true;
            return Ok(None);
        };

        self.convert(&decoded).map(Some)
    }

    fn release(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.scaler = None;
        self.decoder = None;
        self.input_ctx = None;
        self.done = true;
        Ok(())
    }
}

fn rational_to_fps(rate: ffmpeg_next::Rational) -> Option<f64> {
    if rate.numerator() > 0 && rate.denominator() > 0 {
        Some(rate.numerator() as f64 / rate.denominator() as f64)
    } else {
        None
    }
}

/// Copies the RGB plane of an ffmpeg frame into a tightly-packed buffer,
/// dropping any per-row stride padding.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_len]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::capture_error::CaptureError;
    use crate::capture::domain::reader_config::ReaderConfig;
    use crate::capture::video_reader::VideoReader;
    use ffmpeg_next::format::Pixel;
    use std::path::{Path, PathBuf};

    const WIDTH: u32 = 160;
    const HEIGHT: u32 = 120;
    const FPS: i32 = 30;

    /// Writes `num_frames` flat grey MPEG-4 frames of `WIDTH`x`HEIGHT`.
    fn test_video(dir: &Path, num_frames: usize) -> PathBuf {
        ffmpeg_next::init().unwrap();
        let path = dir.join("test.mp4");
        let time_base = ffmpeg_next::Rational(1, FPS);

        let mut octx = ffmpeg_next::format::output(&path).unwrap();
        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(WIDTH);
        encoder_ctx.set_height(HEIGHT);
        encoder_ctx.set_format(Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(FPS, 1)));
        if octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER)
        {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        octx.add_stream(Some(codec))
            .unwrap()
            .set_parameters(&encoder);
        octx.write_header().unwrap();
        let stream_time_base = octx.stream(0).unwrap().time_base();

        // One pass per frame, then a final pass that flushes the encoder.
        for i in (0..num_frames).map(Some).chain([None]) {
            match i {
                Some(i) => {
                    let mut frame = Video::new(Pixel::YUV420P, WIDTH, HEIGHT);
                    frame.data_mut(0).fill((i * 40 % 256) as u8);
                    frame.data_mut(1).fill(128);
                    frame.data_mut(2).fill(128);
                    frame.set_pts(Some(i as i64));
                    encoder.send_frame(&frame).unwrap();
                }
                None => encoder.send_eof().unwrap(),
            }
            let mut packet = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut packet).is_ok() {
                packet.set_stream(0);
                packet.rescale_ts(time_base, stream_time_base);
                packet.write_interleaved(&mut octx).unwrap();
            }
        }
        octx.write_trailer().unwrap();
        path
    }

    fn open_handle(path: &Path) -> FfmpegHandle {
        ffmpeg_next::init().unwrap();
        FfmpegHandle::new(ffmpeg_next::format::input(path).unwrap()).unwrap()
    }

    #[test]
    fn test_reader_mirrors_file_properties() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let reader = VideoReader::open(&FfmpegBackend::new(), path.as_path(), ReaderConfig::new())
            .unwrap();
        assert_eq!(reader.width(), WIDTH);
        assert_eq!(reader.height(), HEIGHT);
        assert!(reader.fps() > 0.0);
        assert_eq!(reader.video_title(), path.display().to_string());
    }

    #[test]
    fn test_reads_every_frame_then_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut reader =
            VideoReader::open(&FfmpegBackend::new(), path.as_path(), ReaderConfig::new()).unwrap();
        let frames: Vec<_> = reader.by_ref().filter_map(|out| out.into_frame()).collect();

        assert_eq!(frames.len(), 5);
        assert_eq!(reader.frame_count(), 5);
        assert!(!reader.is_open());
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.data().len(), (WIDTH * HEIGHT * 3) as usize);
        }
    }

    #[test]
    fn test_requested_size_scales_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 2);

        let config = ReaderConfig::new().with_size(80, 60);
        let mut reader = VideoReader::open(&FfmpegBackend::new(), path.as_path(), config).unwrap();
        assert_eq!((reader.width(), reader.height()), (80, 60));

        let frame = reader.read_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (80, 60));
    }

    #[test]
    fn test_dynamic_batch_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let config = ReaderConfig::new().with_batch_size(2).with_dynamic_batch(true);
        let reader = VideoReader::open(&FfmpegBackend::new(), path.as_path(), config).unwrap();
        let lengths: Vec<_> = reader.map(|out| out.len()).collect();
        assert_eq!(lengths, vec![2, 2, 1]);
    }

    #[test]
    fn test_nonexistent_file_is_unavailable() {
        let result = VideoReader::open(
            &FfmpegBackend::new(),
            Path::new("/nonexistent/test.mp4"),
            ReaderConfig::new(),
        );
        assert!(matches!(
            result,
            Err(CaptureError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);
        let mut handle = FfmpegBackend::new().open(&Source::Path(path)).unwrap();

        assert!(!handle.set(CaptureProperty::FrameWidth, 0.0));
        assert!(!handle.set(CaptureProperty::FrameHeight, f64::NAN));
        assert!(!handle.set(CaptureProperty::Fps, 60.0));
        assert!(handle.set(CaptureProperty::FrameWidth, 64.0));
        assert_eq!(handle.get(CaptureProperty::FrameWidth), 64.0);
    }

    #[test]
    fn test_release_is_idempotent_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);
        let mut handle = FfmpegBackend::new().open(&Source::Path(path)).unwrap();

        handle.release().unwrap();
        handle.release().unwrap();
        assert!(!handle.is_opened());
        assert!(handle.read().unwrap().is_none());
    }

    #[test]
    fn test_convert_rebuilds_scaler_when_input_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = open_handle(&test_video(dir.path(), 1));

        let inputs = [
            Video::new(Pixel::YUV420P, WIDTH, HEIGHT),
            Video::new(Pixel::YUV420P, 64, 48),
            Video::new(Pixel::RGB24, 64, 48),
        ];
        for (i, decoded) in inputs.iter().enumerate() {
            let frame = handle.convert(decoded).unwrap();
            assert_eq!((frame.width(), frame.height()), (WIDTH, HEIGHT));
            assert_eq!(frame.index(), i);
            assert_eq!(handle.scaler.as_ref().unwrap().0, ScalerInput::of(decoded));
        }
    }

    #[test]
    fn test_convert_after_set_uses_new_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = open_handle(&test_video(dir.path(), 1));
        let decoded = Video::new(Pixel::YUV420P, WIDTH, HEIGHT);

        handle.convert(&decoded).unwrap();
        assert!(handle.set(CaptureProperty::FrameWidth, 32.0));
        assert!(handle.set(CaptureProperty::FrameHeight, 24.0));
        let frame = handle.convert(&decoded).unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 24));
    }

    #[test]
    fn test_rational_to_fps() {
        assert_eq!(rational_to_fps(ffmpeg_next::Rational(30, 1)), Some(30.0));
        assert_eq!(rational_to_fps(ffmpeg_next::Rational(0, 1)), None);
        assert_eq!(rational_to_fps(ffmpeg_next::Rational(30, 0)), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_device_locator_uses_v4l2() {
        assert_eq!(
            device_locator(2),
            Some(("video4linux2", "/dev/video2".to_string()))
        );
    }
}
