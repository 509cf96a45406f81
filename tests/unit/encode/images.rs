use super::*;
use crate::camera::model::CameraModel;
use crate::foundation::core::FrameRate;

fn cfg() -> SinkConfig {
    SinkConfig {
        frame_rate: FrameRate::new(24, 1).unwrap(),
        frame_count: 2,
        camera_model: CameraModel::Perspective,
    }
}

fn gradient(w: u32, h: u32) -> CompositeFrame {
    let data = (0..w * h * 3).map(|i| (i * 7 % 256) as u8).collect();
    CompositeFrame::new(w, h, data).unwrap()
}

#[test]
fn file_names_are_zero_padded() {
    assert_eq!(frame_file_name(FrameIndex(7), ImageEncoding::Png), "00007.png");
    assert_eq!(
        frame_file_name(FrameIndex(12345), ImageEncoding::Jpeg { quality: 90 }),
        "12345.jpg"
    );
}

#[test]
fn png_frames_round_trip_losslessly() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("nested").join("frames");
    let mut sink = ImageSequenceSink::new(&dir, ImageEncoding::Png);
    sink.prepare(&cfg()).unwrap();
    assert!(dir.is_dir());

    let frame = gradient(5, 3);
    sink.push_frame(FrameIndex(0), frame.clone()).unwrap();
    sink.push_frame(FrameIndex(1), gradient(5, 3)).unwrap();
    let report = sink.finish().unwrap();
    assert_eq!(report.frames_written, 2);
    assert_eq!(report.geometry, Some((5, 3)));
    assert_eq!(report.location, dir);

    let decoded = image::open(dir.join("00000.png")).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (5, 3));
    assert_eq!(decoded.as_raw().as_slice(), frame.data());
    assert!(dir.join("00001.png").is_file());
}

#[test]
fn jpeg_frames_are_written() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sink = ImageSequenceSink::new(tmp.path(), ImageEncoding::Jpeg { quality: 80 });
    sink.prepare(&cfg()).unwrap();
    sink.push_frame(FrameIndex(3), gradient(8, 8)).unwrap();
    sink.finish().unwrap();
    let decoded = image::open(tmp.path().join("00003.jpg")).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (8, 8));
}

#[test]
fn invalid_quality_fails_in_prepare() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sink = ImageSequenceSink::new(tmp.path(), ImageEncoding::Jpeg { quality: 0 });
    assert!(matches!(
        sink.prepare(&cfg()),
        Err(CampathError::MalformedInput(_))
    ));
}

#[test]
fn uncreatable_directory_is_resource_error() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let mut sink = ImageSequenceSink::new(blocker.join("frames"), ImageEncoding::Png);
    assert!(matches!(sink.prepare(&cfg()), Err(CampathError::Resource(_))));
}

#[test]
fn finish_is_single_shot() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sink = ImageSequenceSink::new(tmp.path(), ImageEncoding::Png);
    sink.prepare(&cfg()).unwrap();
    sink.finish().unwrap();
    assert!(sink.finish().is_err());
    assert!(sink.push_frame(FrameIndex(0), gradient(1, 1)).is_err());
}

#[test]
fn later_frames_must_match_first_frame_size() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sink = ImageSequenceSink::new(tmp.path(), ImageEncoding::Png);
    sink.prepare(&cfg()).unwrap();
    sink.push_frame(FrameIndex(0), gradient(8, 4)).unwrap();

    let err = sink.push_frame(FrameIndex(1), gradient(3, 9)).unwrap_err();
    assert!(matches!(err, CampathError::ShapeMismatch(_)));
    assert!(!tmp.path().join("00001.png").exists());

    let report = sink.finish().unwrap();
    assert_eq!(report.frames_written, 1);
    assert_eq!(report.geometry, Some((8, 4)));
}

#[test]
fn vanished_directory_is_resource_error_for_both_encodings() {
    for encoding in [ImageEncoding::Png, ImageEncoding::Jpeg { quality: 90 }] {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("frames");
        let mut sink = ImageSequenceSink::new(&dir, encoding);
        sink.prepare(&cfg()).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let err = sink.push_frame(FrameIndex(0), gradient(4, 4)).unwrap_err();
        assert!(
            matches!(err, CampathError::Resource(_)),
            "{encoding:?}: {err}"
        );
    }
}
