use framecap_core::capture::domain::reader_config::ReaderConfig;
use framecap_core::capture::infrastructure::memory_backend::MemoryBackend;
use framecap_core::capture::video_reader::VideoReader;
use framecap_core::shared::frame_batch::FrameBatch;

/// First sample of every slot: 1..=5 for real frames, 0 for padding.
fn slot_values(batch: &FrameBatch) -> Vec<u8> {
    (0..batch.len())
        .map(|slot| batch.frame(slot).unwrap()[[0, 0, 0]])
        .collect()
}

fn playback(dynamic_batch: bool) -> (Vec<Vec<u8>>, usize) {
    let backend = MemoryBackend::new(6, 4, 25.0).with_numbered_frames(5);
    let config = ReaderConfig::new()
        .with_batch_size(2)
        .with_dynamic_batch(dynamic_batch);
    let mut reader = VideoReader::open(&backend, "playback.mkv", config).unwrap();

    let batches = reader
        .by_ref()
        .map(|out| slot_values(&out.into_batch().unwrap()))
        .collect();
    (batches, reader.frame_count())
}

#[test]
fn test_padded_playback_of_five_frames() {
    let (batches, frame_count) = playback(false);
    assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5, 0]]);
    assert_eq!(frame_count, 5);
}

#[test]
fn test_dynamic_playback_of_five_frames() {
    let (batches, frame_count) = playback(true);
    assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);
    assert_eq!(frame_count, 5);
}

#[test]
fn test_single_frame_playback_and_metrics() {
    let backend = MemoryBackend::new(6, 4, 25.0).with_numbered_frames(5);
    let mut reader = VideoReader::open(&backend, "0", ReaderConfig::new()).unwrap();

    let frames: Vec<_> = reader.by_ref().filter_map(|out| out.into_frame()).collect();
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0].shape(), (4, 6, 3));
    assert!((reader.seconds() - 0.2).abs() < 1e-9);

    reader.release();
    assert_eq!(backend.release_count(), 1);
}
