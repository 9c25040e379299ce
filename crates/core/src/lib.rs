//! Uniform frame and batch reading over video files and capture devices.
//!
//! A [`VideoReader`](capture::video_reader::VideoReader) owns one capture
//! handle from a [`CaptureBackend`](capture::domain::capture_backend::CaptureBackend)
//! and hands out frames one at a time or stacked into fixed-size batches.

pub mod capture {
    pub mod domain {
        pub mod capture_backend;
        pub mod capture_error;
        pub mod reader_config;
        pub mod source;
    }
    pub mod infrastructure {
        pub mod ffmpeg_backend;
        pub mod memory_backend;
    }
    pub mod video_reader;
}

pub mod display {
    pub mod domain {
        pub mod frame_sink;
    }
    #[cfg(feature = "display")]
    pub mod infrastructure {
        pub mod minifb_sink;
    }
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod frame_batch;
    pub mod read_output;
    pub mod stream_info;
}
