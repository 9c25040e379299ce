use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use framecap_core::capture::domain::reader_config::ReaderConfig;
use framecap_core::capture::domain::source::Source;
use framecap_core::capture::infrastructure::ffmpeg_backend::FfmpegBackend;
use framecap_core::capture::video_reader::VideoReader;
use framecap_core::shared::frame::Frame;
use framecap_core::shared::read_output::ReadOutput;

/// Read frames or batches of frames from a video file or camera.
#[derive(Parser)]
#[command(name = "framecap")]
struct Cli {
    /// Video file, or a device index such as 0 for the default camera.
    source: String,

    /// Frames per read; omit to read single frames.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Let the last batch come up short instead of zero-padding it.
    #[arg(long)]
    dynamic_batch: bool,

    /// Requested frame width.
    #[arg(long)]
    width: Option<u32>,

    /// Requested frame height.
    #[arg(long)]
    height: Option<u32>,

    /// Stop after this many reads.
    #[arg(long)]
    max_reads: Option<usize>,

    /// Save the first frame read as an image (format from the extension).
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Show frames in a window; press q to quit.
    #[cfg(feature = "display")]
    #[arg(long)]
    show: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = reader_config(&cli);

    let mut reader = VideoReader::open(&FfmpegBackend::new(), Source::parse(&cli.source), config)?;
    log::info!("Reading {reader}");

    #[cfg(feature = "display")]
    let mut sink = cli
        .show
        .then(framecap_core::display::infrastructure::minifb_sink::MinifbSink::new);

    #[cfg(feature = "display")]
    let showing = sink.is_some();
    #[cfg(not(feature = "display"))]
    let showing = false;

    let mut snapshot = cli.snapshot.clone();
    let mut reads = 0;
    while cli.max_reads.map_or(true, |max| reads < max) {
        let Some(output) = reader.read() else {
            break;
        };
        reads += 1;

        let frame = if snapshot.is_some() || showing {
            first_frame(&output, reader.width(), reader.height())
        } else {
            None
        };
        if let (Some(path), Some(frame)) = (snapshot.as_deref(), frame.as_ref()) {
            save_snapshot(path, frame)?;
            log::info!("Saved snapshot to {}", path.display());
            snapshot = None;
        }

        #[cfg(feature = "display")]
        if let (Some(sink), Some(frame)) = (sink.as_mut(), frame.as_ref()) {
            if reader.show(sink, frame)?
                == framecap_core::display::domain::frame_sink::SinkEvent::Quit
            {
                break;
            }
        }

        log::debug!("Read {} frame(s) in read {reads}", output.len());
    }

    println!(
        "{}: {} reads, {} frames, {:.2}s ({:.2} min)",
        reader.video_title(),
        reads,
        reader.frame_count(),
        reader.seconds(),
        reader.minutes()
    );
    reader.release();
    Ok(())
}

fn reader_config(cli: &Cli) -> ReaderConfig {
    let mut config = ReaderConfig::new().with_dynamic_batch(cli.dynamic_batch);
    if let Some(batch_size) = cli.batch_size {
        config = config.with_batch_size(batch_size);
    }
    if let Some(width) = cli.width {
        config = config.with_width(width);
    }
    if let Some(height) = cli.height {
        config = config.with_height(height);
    }
    config
}

/// The leading frame of a read, copied out of a batch when needed.
fn first_frame(output: &ReadOutput, width: u32, height: u32) -> Option<Frame> {
    match output {
        ReadOutput::Frame(frame) => Some(frame.clone()),
        ReadOutput::Batch(batch) => {
            let slot = batch.frame(0)?;
            let data = slot.iter().copied().collect();
            Some(Frame::new(data, width, height, 0))
        }
    }
}

fn save_snapshot(path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or("frame buffer does not match its dimensions")?;
    image.save(path)?;
    Ok(())
}
