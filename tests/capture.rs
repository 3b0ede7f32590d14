//! Capture source and file sink tests
//!
//! Exercise the on-disk collaborators without camera or audio hardware

use hearsee::{AudioSink, Error, FileSink, FileSource, ImageSource, decode_audio};

/// Smallest byte sequence that looks like a JPEG (SOI + EOI markers)
const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];

#[tokio::test]
async fn test_file_source_encodes_current_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.jpg");
    std::fs::write(&path, FAKE_JPEG).unwrap();

    let source = FileSource::new(&path);
    let encoded = source.capture().await.unwrap();
    assert_eq!(decode_audio(&encoded).unwrap(), FAKE_JPEG);

    // The file is re-read on every capture
    std::fs::write(&path, b"second frame").unwrap();
    let encoded = source.capture().await.unwrap();
    assert_eq!(decode_audio(&encoded).unwrap(), b"second frame");
}

#[tokio::test]
async fn test_file_source_missing_file_is_capture_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileSource::new(dir.path().join("absent.jpg"));

    let err = source.capture().await.unwrap_err();
    assert!(matches!(err, Error::Capture(_)));
    assert!(err.to_string().contains("absent.jpg"));
}

#[tokio::test]
async fn test_file_source_archives_timestamped_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.jpg");
    let archive = dir.path().join("Pictures").join("HearSee");
    std::fs::write(&path, FAKE_JPEG).unwrap();

    let source = FileSource::new(&path).with_archive_dir(&archive);
    source.capture().await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(&archive)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);

    let name = entries[0].file_name().unwrap().to_string_lossy().into_owned();
    // yyyy-MM-dd-HH-mm-ss-SSS.jpg
    assert_eq!(name.len(), "2024-03-09-14-05-33-042.jpg".len());
    assert!(name.ends_with(".jpg"));
    assert_eq!(std::fs::read(&entries[0]).unwrap(), FAKE_JPEG);
}

#[tokio::test]
async fn test_file_sink_writes_fresh_file_per_response() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let sink = FileSink::in_dir(&out);

    let first = sink.write(b"one".to_vec()).await.unwrap();
    let second = sink.write(b"two".to_vec()).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(std::fs::read(&first).unwrap(), b"one");
    assert_eq!(std::fs::read(&second).unwrap(), b"two");

    // audio-YYYY-MM-DD-HH-MM-SS-mmm.mp3
    let name = first.file_name().unwrap().to_string_lossy().into_owned();
    let stamp = name
        .strip_prefix("audio-")
        .and_then(|rest| rest.strip_suffix(".mp3"))
        .unwrap();
    let fields: Vec<&str> = stamp.split('-').take(7).collect();
    assert_eq!(fields.len(), 7, "unexpected name {name}");
    assert!(fields.iter().all(|f| f.chars().all(|c| c.is_ascii_digit())));
    assert_eq!(fields[0].len(), 4);
    assert_eq!(fields[6].len(), 3);
}

#[tokio::test]
async fn test_file_sink_burst_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileSink::in_dir(dir.path());

    let mut paths = Vec::new();
    for i in 0..5u8 {
        paths.push(sink.write(vec![i]).await.unwrap());
    }

    for (i, path) in paths.iter().enumerate() {
        assert_eq!(std::fs::read(path).unwrap(), vec![u8::try_from(i).unwrap()]);
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 5);
}

#[tokio::test]
async fn test_file_sink_at_path_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("reply.mp3");
    let sink = FileSink::at_path(&path);

    sink.play(b"first".to_vec()).await.unwrap();
    sink.play(b"second".to_vec()).await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"second");
    assert_eq!(sink.name(), "file");
}
