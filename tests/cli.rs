use std::fs;

use clap::Parser;
use drawanywhere::cli::{CliArgs, run_job};
use drawanywhere::{AppSettings, CanvasError};
use image::Rgba;

fn args(list: &[&str]) -> CliArgs {
    let mut full = vec!["drawanywhere"];
    full.extend_from_slice(list);
    CliArgs::try_parse_from(full).unwrap()
}

#[test]
fn script_renders_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("scene.draw");
    fs::write(
        &script,
        "# background\n\
         canvas 120 80\n\
         fill color #336699\n\
         fill 0,0\n\
         layer add\n\
         brush color #ffffff\n\
         brush size 8\n\
         stroke brush 10,40 110,40\n",
    )
    .unwrap();
    let out = dir.path().join("nested").join("scene.png");
    let settings = dir.path().join("missing.cfg");

    let report = run_job(&args(&[
        "--script",
        script.to_str().unwrap(),
        "--settings",
        settings.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ]))
    .unwrap();

    assert_eq!(report.format, "png");
    assert_eq!(report.canvas.layers.len(), 2);
    assert_eq!((report.canvas.width, report.canvas.height), (120, 80));

    let img = image::open(&out).unwrap().into_rgba8();
    assert_eq!(img.dimensions(), (120, 80));
    assert_eq!(img.get_pixel(60, 40), &Rgba([255, 255, 255, 255]));
    assert_eq!(img.get_pixel(60, 5), &Rgba([0x33, 0x66, 0x99, 255]));
}

#[test]
fn settings_file_seeds_the_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("drawanywhere_settings.cfg");
    let mut settings = AppSettings::default();
    settings.canvas_width = 90;
    settings.canvas_height = 70;
    settings.save_to(&cfg).unwrap();

    let out = dir.path().join("blank.jpg");
    let report = run_job(&args(&[
        "--settings",
        cfg.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--height",
        "100",
    ]))
    .unwrap();
    assert_eq!(report.format, "jpeg");
    assert_eq!((report.canvas.width, report.canvas.height), (90, 100));

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn bad_script_line_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("bad.draw");
    fs::write(&script, "layer add\nbrush shape star\n").unwrap();
    let out = dir.path().join("never.png");

    let err = run_job(&args(&[
        "-s",
        script.to_str().unwrap(),
        "--settings",
        dir.path().join("none.cfg").to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CanvasError::Script { line: 2, .. }));
    assert!(!out.exists());
}

#[test]
fn out_of_range_canvas_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("x.png");
    let err = run_job(&args(&[
        "--settings",
        dir.path().join("none.cfg").to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--width",
        "20",
    ]))
    .unwrap_err();
    assert!(matches!(err, CanvasError::InvalidDimension { width: 20, .. }));
}

#[test]
fn unknown_format_falls_back_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.bin");
    let report = run_job(&args(&[
        "--settings",
        dir.path().join("none.cfg").to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--format",
        "tiff",
        "--width",
        "60",
        "--height",
        "60",
    ]))
    .unwrap();
    assert_eq!(report.format, "png");
    assert!(fs::read(&out).unwrap().starts_with(&[0x89, b'P', b'N', b'G']));
}
