use super::*;
use crate::camera::model::CameraModel;

fn cfg(frame_count: u64) -> SinkConfig {
    SinkConfig {
        frame_rate: FrameRate::new(6, 5).unwrap(),
        frame_count,
        camera_model: CameraModel::Perspective,
    }
}

fn solid(w: u32, h: u32, v: u8) -> CompositeFrame {
    CompositeFrame::new(w, h, vec![v; (w * h * 3) as usize]).unwrap()
}

fn ffprobe_frame_count(path: &Path) -> Option<u64> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_frames",
            "-show_entries",
            "stream=nb_read_frames",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .ok()?;
    String::from_utf8_lossy(&out.stdout).trim().parse().ok()
}

#[test]
fn invalid_crf_is_rejected_before_spawning() {
    let tmp = tempfile::tempdir().unwrap();
    let mut opts = VideoSinkOpts::new(tmp.path().join("out.mp4"));
    opts.crf = 60;
    let err = VideoSink::new(opts).prepare(&cfg(1)).unwrap_err();
    assert!(matches!(err, CampathError::MalformedInput(_)));
}

#[test]
fn existing_output_without_overwrite_is_a_resource_error() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out.mp4");
    std::fs::write(&out, b"old").unwrap();
    let mut opts = VideoSinkOpts::new(&out);
    opts.overwrite = false;
    let err = VideoSink::new(opts).prepare(&cfg(1)).unwrap_err();
    assert!(matches!(err, CampathError::Resource(_)));
}

#[test]
fn push_before_prepare_fails() {
    let mut sink = VideoSink::new(VideoSinkOpts::new("unused.mp4"));
    assert!(sink.push_frame(FrameIndex(0), solid(4, 4, 0)).is_err());
    assert!(!sink.is_bound());
}

#[test]
fn parent_dir_is_created() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("a").join("b").join("out.mp4");
    ensure_parent_dir(&out).unwrap();
    assert!(out.parent().unwrap().is_dir());
    ensure_parent_dir(Path::new("bare.mp4")).unwrap();
}

#[test]
fn writer_binds_lazily_and_writes_every_frame() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("nested").join("out.mp4");
    let mut sink = VideoSink::new(VideoSinkOpts::new(&out));
    sink.prepare(&cfg(6)).unwrap();
    assert!(!sink.is_bound());
    assert!(out.parent().unwrap().is_dir());

    for i in 0..6u64 {
        sink.push_frame(FrameIndex(i), solid(64, 48, (i * 40) as u8))
            .unwrap();
        assert!(sink.is_bound());
    }
    assert_eq!(sink.geometry(), Some((64, 48)));

    let report = sink.finish().unwrap();
    assert!(sink.is_closed());
    assert_eq!(report.frames_written, 6);
    assert_eq!(report.geometry, Some((64, 48)));
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    if let Some(n) = ffprobe_frame_count(&out) {
        assert_eq!(n, 6);
    }

    assert!(sink.finish().is_err());
}

#[test]
fn mismatched_frame_size_is_rejected_and_prior_frames_survive() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out.mp4");
    let mut sink = VideoSink::new(VideoSinkOpts::new(&out));
    sink.prepare(&cfg(3)).unwrap();
    sink.push_frame(FrameIndex(0), solid(32, 32, 10)).unwrap();
    sink.push_frame(FrameIndex(1), solid(32, 32, 20)).unwrap();

    let err = sink
        .push_frame(FrameIndex(2), solid(16, 32, 30))
        .unwrap_err();
    assert!(matches!(err, CampathError::ShapeMismatch(_)));

    let report = sink.finish().unwrap();
    assert_eq!(report.frames_written, 2);
    if let Some(n) = ffprobe_frame_count(&out) {
        assert_eq!(n, 2);
    }
}

#[test]
fn out_of_order_indices_are_rejected() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let mut sink = VideoSink::new(VideoSinkOpts::new(tmp.path().join("out.mp4")));
    sink.prepare(&cfg(2)).unwrap();
    sink.push_frame(FrameIndex(1), solid(8, 8, 0)).unwrap();
    assert!(sink.push_frame(FrameIndex(1), solid(8, 8, 0)).is_err());
    assert!(sink.push_frame(FrameIndex(0), solid(8, 8, 0)).is_err());
    sink.finish().unwrap();
}

#[test]
fn odd_geometry_is_padded_for_yuv420p() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("odd.mp4");
    let mut sink = VideoSink::new(VideoSinkOpts::new(&out));
    sink.prepare(&cfg(2)).unwrap();
    sink.push_frame(FrameIndex(0), solid(15, 9, 100)).unwrap();
    sink.push_frame(FrameIndex(1), solid(15, 9, 200)).unwrap();
    let report = sink.finish().unwrap();
    assert_eq!(report.geometry, Some((15, 9)));
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn finish_without_frames_writes_nothing() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("empty.mp4");
    let mut sink = VideoSink::new(VideoSinkOpts::new(&out));
    sink.prepare(&cfg(0)).unwrap();
    let report = sink.finish().unwrap();
    assert_eq!(report.frames_written, 0);
    assert_eq!(report.geometry, None);
    assert!(!out.exists());
}

#[test]
fn dropping_a_bound_sink_finalizes_the_file() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("dropped.mp4");
    {
        let mut sink = VideoSink::new(VideoSinkOpts::new(&out));
        sink.prepare(&cfg(3)).unwrap();
        for i in 0..3u64 {
            sink.push_frame(FrameIndex(i), solid(16, 16, 50)).unwrap();
        }
    }
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    if let Some(n) = ffprobe_frame_count(&out) {
        assert_eq!(n, 3);
    }
}
