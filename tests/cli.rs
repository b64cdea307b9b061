use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Cursor;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_sand_color(root: &Path) {
    let dir = root.join("textures/beach");
    std::fs::create_dir_all(&dir).expect("texture dir");
    let image = image::RgbaImage::from_pixel(4, 4, image::Rgba([194, 178, 128, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    std::fs::write(dir.join("sand_Color.png"), bytes).expect("write png");
}

#[test]
fn summary_lists_props_and_initial_beam_state() {
    let assets = TempDir::new().expect("temp assets");
    write_sand_color(assets.path());

    let mut cmd = Command::cargo_bin("lighthouse-beach").expect("binary exists");
    cmd.arg("--summary-only")
        .arg("--seed")
        .arg("42")
        .arg("--assets")
        .arg(assets.path());
    cmd.assert()
        .success()
        .stdout(contains("Built scene with"))
        .stdout(contains(" - rocks: 20"))
        .stdout(contains(" - logs: 5"))
        .stdout(contains(" - boulders: 2"))
        .stdout(contains(" - palms: 5"))
        .stdout(contains(" - shells: 10"))
        .stdout(contains(" - bushes: 8"))
        .stdout(contains(" - sand_Color.png: 4x4"))
        .stdout(contains(" - sand_NormalGL.png: missing"))
        .stdout(contains("Final state after 1 frame(s):"))
        .stdout(contains(" - light target pos=(0.00, 0.00, 10.00)"))
        .stdout(contains(" - beam pivot yaw=0.00"))
        .stdout(contains("1 transparent"));
}

#[test]
fn beam_sweeps_with_elapsed_time() {
    let assets = TempDir::new().expect("temp assets");

    // Frame 3 runs at t = 3s, so the beam angle is 1.5 rad.
    let mut cmd = Command::cargo_bin("lighthouse-beach").expect("binary exists");
    cmd.args(["--summary-only", "--seed", "7", "--frames", "4", "--time-step", "1"])
        .arg("--assets")
        .arg(assets.path());
    cmd.assert()
        .success()
        .stdout(contains("Final state after 4 frame(s):"))
        .stdout(contains(" - light target pos=(9.97, 0.00, 0.71)"))
        .stdout(contains(" - beam pivot yaw=1.50"));
}

#[test]
fn rejects_unknown_arguments() {
    let mut cmd = Command::cargo_bin("lighthouse-beach").expect("binary exists");
    cmd.arg("--fullscreen");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"));
}
