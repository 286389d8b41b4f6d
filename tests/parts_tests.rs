//! Tests for encoding exam pages into inline parts.

use std::{fs, path::PathBuf};

use examgrader::{
    GradeError,
    parts::{encode_all, encode_bytes, encode_file, encode_file_as, mime_type_for},
};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("examgrader-parts-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[test]
fn empty_buffer_round_trips() {
    let part = encode_bytes(&[], "image/png");
    assert_eq!(part.mime_type(), "image/png");
    assert_eq!(part.data(), "");
    assert_eq!(part.decode().expect("decode"), Vec::<u8>::new());
}

#[test]
fn multi_megabyte_buffer_round_trips() {
    let bytes = pattern(5 * 1024 * 1024 + 7);
    let part = encode_bytes(&bytes, "image/jpeg");
    assert_eq!(part.decode().expect("decode"), bytes);
}

#[test]
fn payload_is_standard_padded_base64() {
    assert_eq!(encode_bytes(b"exam", "text/plain").data(), "ZXhhbQ==");
}

#[test]
fn mime_types_follow_extensions() {
    assert_eq!(mime_type_for("page.png".as_ref()), "image/png");
    assert_eq!(mime_type_for("page.JPG".as_ref()), "image/jpeg");
    assert_eq!(mime_type_for("key.pdf".as_ref()), "application/pdf");
    assert_eq!(mime_type_for("mystery".as_ref()), "application/octet-stream");
}

#[tokio::test]
async fn files_round_trip_from_disk() {
    let root = temp_root();
    let empty = root.join("empty.png");
    let large = root.join("large.jpg");
    let bytes = pattern(3 * 1024 * 1024);
    fs::write(&empty, []).expect("write empty");
    fs::write(&large, &bytes).expect("write large");

    let part = encode_file(&empty).await.expect("encode empty");
    assert!(part.decode().expect("decode").is_empty());
    assert_eq!(part.mime_type(), "image/png");

    let part = encode_file(&large).await.expect("encode large");
    assert_eq!(part.decode().expect("decode"), bytes);
    assert_eq!(part.mime_type(), "image/jpeg");

    let part = encode_file_as(&large, "image/heic").await.expect("encode as");
    assert_eq!(part.mime_type(), "image/heic");

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn missing_file_is_an_encode_error() {
    let root = temp_root();
    let missing = root.join("nope.png");

    match encode_file(&missing).await {
        Err(GradeError::Encode { path, source }) => {
            assert_eq!(path, missing);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected encode error, got {other:?}"),
    }

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn encode_all_preserves_input_order() {
    let root = temp_root();
    // Largest first so it is the most likely to finish last.
    let fixtures = [
        ("p1.png", pattern(4 * 1024 * 1024)),
        ("p2.pdf", pattern(10)),
        ("p3.jpg", pattern(1024)),
        ("p4.webp", Vec::new()),
    ];
    let paths: Vec<PathBuf> = fixtures
        .iter()
        .map(|(name, bytes)| {
            let path = root.join(name);
            fs::write(&path, bytes).expect("write page");
            path
        })
        .collect();

    let parts = encode_all(&paths).await.expect("encode all");

    assert_eq!(parts.len(), fixtures.len());
    let mimes: Vec<_> = parts.iter().map(|p| p.mime_type()).collect();
    assert_eq!(mimes, ["image/png", "application/pdf", "image/jpeg", "image/webp"]);
    for (part, (_, bytes)) in parts.iter().zip(fixtures.iter()) {
        assert_eq!(&part.decode().expect("decode"), bytes);
    }

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn encode_all_fails_if_any_file_is_missing() {
    let root = temp_root();
    let present = root.join("present.png");
    fs::write(&present, b"png").expect("write page");
    let paths = [present, root.join("missing.png")];

    let err = encode_all(&paths).await.expect_err("should fail");
    assert!(matches!(err, GradeError::Encode { ref path, .. } if path.ends_with("missing.png")));

    let _ = fs::remove_dir_all(root);
}
