//! Integration tests for the `snapimg` binary.

use assert_cmd::Command;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use predicates::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_png(dir: &Path, name: &str) -> PathBuf {
    let mut img = RgbaImage::from_pixel(16, 12, Rgba([30, 120, 200, 255]));
    img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
    let mut data = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut data, ImageOutputFormat::Png)
        .unwrap();

    let path = dir.join(name);
    std::fs::write(&path, data.into_inner()).unwrap();
    path
}

/// Command running in `dir` with no ambient configuration
fn snapimg(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("snapimg").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("SNAPIMG_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_single_file_saved_as_is() {
    let dir = TempDir::new().unwrap();
    let input = write_png(dir.path(), "photo.png");

    snapimg(&dir)
        .args(["-o", "out", "jpg"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("photo_converted.jpg"));

    let saved = std::fs::read(dir.path().join("out/photo_converted.jpg")).unwrap();
    assert!(saved.starts_with(&[0xFF, 0xD8, 0xFF]));
}

#[test]
fn test_several_files_are_zipped() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("pics")).unwrap();
    write_png(&dir.path().join("pics"), "a.png");
    write_png(&dir.path().join("pics"), "b.png");

    snapimg(&dir).args(["-o", "out", "webp", "pics"]).assert().success();

    let file = std::fs::File::open(dir.path().join("out/processed-images.zip")).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<_> = archive.file_names().map(String::from).collect();
    names.sort();
    assert_eq!(names, vec!["a_converted.webp", "b_converted.webp"]);
}

#[test]
fn test_pdf_combined_by_default() {
    let dir = TempDir::new().unwrap();
    let a = write_png(dir.path(), "a.png");
    let b = write_png(dir.path(), "b.png");

    snapimg(&dir).args(["-o", "out", "pdf"]).arg(&a).arg(&b).assert().success();

    let saved = std::fs::read(dir.path().join("out/combined-images.pdf")).unwrap();
    assert!(saved.starts_with(b"%PDF"));
}

#[test]
fn test_pdf_separate_is_zipped() {
    let dir = TempDir::new().unwrap();
    let a = write_png(dir.path(), "a.png");
    let b = write_png(dir.path(), "b.png");

    snapimg(&dir)
        .args(["-o", "out", "pdf", "--separate"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    assert!(dir.path().join("out/snapimg-processed-pdfs.zip").is_file());
}

#[test]
fn test_unsupported_files_only() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

    snapimg(&dir)
        .args(["compress", "notes.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("notes.txt"))
        .stderr(predicate::str::contains("No valid images were processed."));
}

#[test]
fn test_partial_failure_still_saves() {
    let dir = TempDir::new().unwrap();
    write_png(dir.path(), "good.png");
    std::fs::write(dir.path().join("bad.png"), b"not a png").unwrap();

    snapimg(&dir)
        .args(["-o", "out", "png", "good.png", "bad.png"])
        .assert()
        .success()
        .stderr(predicate::str::contains("bad.png"));

    assert!(dir.path().join("out/good_converted.png").is_file());
}

#[test]
fn test_json_summary() {
    let dir = TempDir::new().unwrap();
    write_png(dir.path(), "shot.png");
    std::fs::write(dir.path().join("readme.txt"), "text").unwrap();

    let assert = snapimg(&dir)
        .args(["--json", "-o", "out", "compress", "--quality", "40", "shot.png", "readme.txt"])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["mode"], "compress");
    assert_eq!(json["total"], 2);
    assert_eq!(json["succeeded"], 1);
    assert_eq!(json["failures"][0]["name"], "readme.txt");
    assert_eq!(json["artifact"]["kind"], "single");
    assert_eq!(json["artifact"]["name"], "compressed_shot.png");
}

#[test]
fn test_config_file_applies() {
    let dir = TempDir::new().unwrap();
    let a = write_png(dir.path(), "a.png");
    let b = write_png(dir.path(), "b.png");
    std::fs::write(
        dir.path().join(".snapimg.toml"),
        "[general]\noutput_dir = \"from-config\"\n\n[pdf]\ncombine = false\n",
    )
    .unwrap();

    snapimg(&dir).arg("pdf").arg(&a).arg(&b).assert().success();

    assert!(dir.path().join("from-config/snapimg-processed-pdfs.zip").is_file());
}

#[test]
fn test_invalid_config_exit_code() {
    let dir = TempDir::new().unwrap();
    let input = write_png(dir.path(), "a.png");
    std::fs::write(dir.path().join("snapimg.toml"), "[compress]\nquality = \"max\"\n").unwrap();

    snapimg(&dir)
        .arg("compress")
        .arg(&input)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_existing_output_needs_overwrite() {
    let dir = TempDir::new().unwrap();
    let input = write_png(dir.path(), "a.png");

    snapimg(&dir).args(["-o", "out", "jpg"]).arg(&input).assert().success();
    snapimg(&dir).args(["-o", "out", "jpg"]).arg(&input).assert().code(1);
    snapimg(&dir)
        .args(["-o", "out", "--overwrite", "jpg"])
        .arg(&input)
        .assert()
        .success();
}

#[test]
fn test_quality_out_of_range_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_png(dir.path(), "a.png");

    snapimg(&dir)
        .args(["compress", "--quality", "5"])
        .arg(&input)
        .assert()
        .failure();
}
