// ============================================================================
// DrawAnywhere CLI — headless drawing via command-line arguments
// ============================================================================
//
// Usage examples:
//   drawanywhere --script logo.draw --output logo.png
//   drawanywhere -s sketch.draw -o sketch.jpg --quality 0.6   (format from extension)
//   drawanywhere --width 1024 --height 768 -o blank.webp --report
//
// Everything runs synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use serde::Serialize;

use crate::app::{CanvasSummary, DrawingApp};
use crate::error::CanvasResult;
use crate::io::{ExportFormat, export_to_file};
use crate::ops::script::{parse_script, run_script};
use crate::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// DrawAnywhere headless renderer.
///
/// Build a layered drawing from a script and export the composite.
#[derive(Parser, Debug)]
#[command(
    name = "drawanywhere",
    about = "DrawAnywhere headless layered-canvas renderer",
    long_about = "Replay a drawing script against a layered canvas and export the\n\
                  flattened result as PNG, JPEG or WEBP.\n\n\
                  Example:\n  \
                  drawanywhere --script logo.draw --output logo.png\n  \
                  drawanywhere -o blank.jpg --width 640 --height 480 --quality 0.9"
)]
pub struct CliArgs {
    /// Output image path.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Canvas width (50–4000). Overrides the settings file.
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Canvas height (50–4000). Overrides the settings file.
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Drawing script to replay before exporting.
    #[arg(short, long, value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Settings file to seed canvas size and tool defaults.
    /// When omitted, the per-user settings file is used if present.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Output format: png, jpeg, webp.
    /// When omitted, the format is inferred from --output's extension.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG / WebP quality, 0.0–1.0 (values outside are clamped). PNG ignores it.
    #[arg(short, long, value_name = "0.0-1.0")]
    pub quality: Option<f32>,

    /// Print a JSON summary of the canvas and layers to stdout.
    #[arg(long)]
    pub report: bool,

    /// Print timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a finished job produced.
#[derive(Debug, Serialize)]
pub struct JobReport {
    pub output: String,
    pub format: &'static str,
    pub bytes: usize,
    pub canvas: CanvasSummary,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the job and return an OS exit code (`0` success, `1` failure).
pub fn run(args: CliArgs) -> ExitCode {
    let start = Instant::now();
    match run_job(&args) {
        Ok(report) => {
            if args.report {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => crate::log_err!("Could not serialise report: {}", e),
                }
            }
            if args.verbose {
                eprintln!(
                    "  ✓ {} ({} bytes, {:.1}ms)",
                    report.output,
                    report.bytes,
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            crate::log_info!(
                "CLI job finished: {} ({} layers, {} bytes)",
                report.output,
                report.canvas.layers.len(),
                report.bytes
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            crate::log_err!("CLI job failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Build the canvas, replay the script and write the export.
pub fn run_job(args: &CliArgs) -> CanvasResult<JobReport> {
    let mut settings = match &args.settings {
        Some(path) => AppSettings::load_from(path),
        None => AppSettings::load(),
    };
    if let Some(w) = args.width {
        settings.canvas_width = w;
    }
    if let Some(h) = args.height {
        settings.canvas_height = h;
    }

    let format = parse_format(args.format.as_deref(), &args.output, settings.export_format);
    if args.quality.is_some() && !format.supports_quality() {
        crate::log_warn!("--quality has no effect on {} output", format.name());
        if args.verbose {
            eprintln!("  ! --quality ignored for {}", format.name());
        }
    }
    let quality = args.quality.unwrap_or(settings.export_quality);
    let mut app = DrawingApp::with_settings(settings)?;

    if let Some(script_path) = &args.script {
        let source = std::fs::read_to_string(script_path)?;
        let script = parse_script(&source)?;
        run_script(&mut app, &script, script_path.parent())?;
    }

    if let Some(parent) = args.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = export_to_file(app.composite(), &args.output, format, quality)?;

    Ok(JobReport {
        output: args.output.display().to_string(),
        format: format.name(),
        bytes,
        canvas: app.summary(),
    })
}

/// `--format` wins; otherwise the output extension; otherwise `fallback`.
pub fn parse_format(format: Option<&str>, output: &Path, fallback: ExportFormat) -> ExportFormat {
    match format {
        Some(name) => ExportFormat::from_name(name),
        None => ExportFormat::from_extension(output).unwrap_or(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_resolution_order() {
        let out = Path::new("pic.jpg");
        assert_eq!(parse_format(Some("webp"), out, ExportFormat::Png), ExportFormat::Webp);
        assert_eq!(parse_format(None, out, ExportFormat::Png), ExportFormat::Jpeg);
        assert_eq!(parse_format(None, Path::new("pic"), ExportFormat::Webp), ExportFormat::Webp);
        assert_eq!(parse_format(Some("gif"), out, ExportFormat::Webp), ExportFormat::Png);
    }

    #[test]
    fn args_parse() {
        let args = CliArgs::try_parse_from([
            "drawanywhere",
            "-o",
            "out.png",
            "--width",
            "300",
            "--quality",
            "0.5",
            "--report",
        ])
        .unwrap();
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.width, Some(300));
        assert_eq!(args.quality, Some(0.5));
        assert!(args.report);
        assert!(CliArgs::try_parse_from(["drawanywhere"]).is_err());
    }
}
