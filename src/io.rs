// ============================================================================
// EXPORT ENCODER — composite → PNG / JPEG / WebP bytes, custom brush decoding
// ============================================================================

use crate::canvas::RasterSurface;
use crate::error::{CanvasError, CanvasResult};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::fs;
use std::path::Path;

/// Quality used when the caller gives none (or garbage).
pub const DEFAULT_EXPORT_QUALITY: f32 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Webp]
    }

    /// Strict lookup: `png`, `jpeg`/`jpg`, `webp` (any case).
    pub fn parse(name: &str) -> CanvasResult<ExportFormat> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "webp" => Ok(ExportFormat::Webp),
            _ => Err(CanvasError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Permissive lookup used by the export path: unknown names fall back
    /// to PNG so the user always gets a file.
    pub fn from_name(name: &str) -> ExportFormat {
        match ExportFormat::parse(name) {
            Ok(format) => format,
            Err(e) => {
                crate::log_warn!("{}; exporting as PNG", e);
                ExportFormat::Png
            }
        }
    }

    pub fn from_extension(path: &Path) -> Option<ExportFormat> {
        let ext = path.extension()?.to_str()?;
        ExportFormat::parse(ext).ok()
    }

    /// Canonical name, as accepted by [`ExportFormat::parse`].
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Webp => "webp",
        }
    }

    /// Lossy formats read the quality setting; PNG ignores it.
    pub fn supports_quality(&self) -> bool {
        matches!(self, ExportFormat::Jpeg | ExportFormat::Webp)
    }

    /// Suggested file name for a download, e.g. `drawing.jpeg`.
    pub fn download_name(&self) -> String {
        format!("drawing.{}", self.name())
    }
}

/// Clamp a quality value into `0.0..=1.0`; NaN becomes the default.
pub fn clamp_quality(quality: f32) -> f32 {
    if quality.is_nan() {
        return DEFAULT_EXPORT_QUALITY;
    }
    quality.clamp(0.0, 1.0)
}

/// Map `0.0..=1.0` onto the JPEG encoder's `1..=100` scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (clamp_quality(quality) * 100.0).round().clamp(1.0, 100.0) as u8
}

/// JPEG has no alpha channel: composite over black, like a browser canvas does.
fn flatten_over_black(surface: &RasterSurface) -> Vec<u8> {
    let raw = surface.as_raw();
    let mut rgb = Vec::with_capacity(raw.len() / 4 * 3);
    for px in raw.chunks_exact(4) {
        let a = px[3] as u32;
        for &c in &px[..3] {
            rgb.push(((c as u32 * a + 127) / 255) as u8);
        }
    }
    rgb
}

/// Map `0.0..=1.0` onto libwebp's `0..=100` quality factor.
pub fn webp_quality(quality: f32) -> f32 {
    clamp_quality(quality) * 100.0
}

/// Encode a surface. `quality` is clamped into range; JPEG and WebP use it,
/// PNG is always lossless.
pub fn encode_image(
    surface: &RasterSurface,
    format: ExportFormat,
    quality: f32,
) -> CanvasResult<Vec<u8>> {
    let (w, h) = (surface.width(), surface.height());
    let mut buf = Vec::new();

    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut buf).write_image(
                surface.as_raw(),
                w,
                h,
                ExtendedColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg => {
            let rgb = flatten_over_black(surface);
            JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality)).write_image(
                &rgb,
                w,
                h,
                ExtendedColorType::Rgb8,
            )?;
        }
        ExportFormat::Webp => {
            let encoded = webp::Encoder::from_rgba(surface.as_raw(), w, h)
                .encode_simple(false, webp_quality(quality))
                .map_err(|e| CanvasError::WebpEncode(format!("{e:?}")))?;
            buf.extend_from_slice(&encoded);
        }
    }

    Ok(buf)
}

/// Encode and write to `path`. Returns the number of bytes written.
pub fn export_to_file(
    surface: &RasterSurface,
    path: &Path,
    format: ExportFormat,
    quality: f32,
) -> CanvasResult<usize> {
    let bytes = encode_image(surface, format, quality)?;
    fs::write(path, &bytes)?;
    crate::log_info!(
        "Exported {}×{} {} ({} bytes) to {}",
        surface.width(),
        surface.height(),
        format.name(),
        bytes.len(),
        path.display()
    );
    Ok(bytes.len())
}

/// Decode an encoded image (PNG / JPEG / WebP) into a custom brush tip.
pub fn decode_brush_image(bytes: &[u8]) -> CanvasResult<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.into_rgba8())
}

pub fn load_brush_image(path: &Path) -> CanvasResult<RgbaImage> {
    let bytes = fs::read(path)?;
    let tip = decode_brush_image(&bytes)?;
    crate::log_info!(
        "Loaded brush tip {}×{} from {}",
        tip.width(),
        tip.height(),
        path.display()
    );
    Ok(tip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sample() -> RasterSurface {
        let mut s = RasterSurface::new(16, 12).unwrap();
        for y in 0..12 {
            for x in 0..16 {
                s.put_pixel(x, y, Rgba([x as u8 * 15, y as u8 * 20, 90, 255]));
            }
        }
        s
    }

    #[test]
    fn format_names() {
        assert_eq!(ExportFormat::parse("JPG").unwrap(), ExportFormat::Jpeg);
        assert!(matches!(
            ExportFormat::parse("gif"),
            Err(CanvasError::UnsupportedFormat(f)) if f == "gif"
        ));
        assert_eq!(ExportFormat::from_name("bmp"), ExportFormat::Png);
        assert_eq!(
            ExportFormat::from_extension(Path::new("out/pic.WEBP")),
            Some(ExportFormat::Webp)
        );
        assert_eq!(ExportFormat::from_extension(Path::new("noext")), None);
        assert_eq!(ExportFormat::Jpeg.download_name(), "drawing.jpeg");
        for f in ExportFormat::all() {
            assert_eq!(ExportFormat::parse(f.name()).unwrap(), *f);
        }
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(clamp_quality(1.5), 1.0);
        assert_eq!(clamp_quality(-2.0), 0.0);
        assert_eq!(clamp_quality(f32::NAN), DEFAULT_EXPORT_QUALITY);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(0.8), 80);
        assert_eq!(jpeg_quality(7.0), 100);
    }

    #[test]
    fn png_is_lossless() {
        let s = sample();
        let bytes = encode_image(&s, ExportFormat::Png, 0.1).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
        let back = decode_brush_image(&bytes).unwrap();
        assert_eq!(&back, s.as_image());
    }

    #[test]
    fn webp_is_lossy_and_decodes() {
        let s = sample();
        let bytes = encode_image(&s, ExportFormat::Webp, 0.9).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
        let back = decode_brush_image(&bytes).unwrap();
        assert_eq!(back.dimensions(), (16, 12));
    }

    #[test]
    fn jpeg_flattens_alpha_over_black() {
        let mut s = RasterSurface::new(16, 16).unwrap();
        s.fill(Rgba([255, 0, 0, 128]));
        let bytes = encode_image(&s, ExportFormat::Jpeg, 1.0).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let back = decode_brush_image(&bytes).unwrap();
        assert_eq!(back.dimensions(), (16, 16));
        let px = back.get_pixel(8, 8);
        assert_eq!(px[3], 255);
        assert!((px[0] as i32 - 128).abs() <= 8, "{px:?}");
        assert!(px[1] <= 8 && px[2] <= 8, "{px:?}");
    }

    #[test]
    fn lower_quality_jpeg_is_smaller() {
        let s = sample();
        let high = encode_image(&s, ExportFormat::Jpeg, 1.0).unwrap();
        let low = encode_image(&s, ExportFormat::Jpeg, 0.05).unwrap();
        assert!(low.len() < high.len());
    }

    fn noisy(width: u32, height: u32) -> RasterSurface {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = RasterSurface::new(width, height).unwrap();
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                s.put_pixel(x, y, Rgba([rng.gen_range(0..=255), rng.gen_range(0..=255), 90, 255]));
            }
        }
        s
    }

    #[test]
    fn lower_quality_webp_is_smaller() {
        let s = noisy(64, 64);
        let high = encode_image(&s, ExportFormat::Webp, 1.0).unwrap();
        let low = encode_image(&s, ExportFormat::Webp, 0.05).unwrap();
        assert!(low.len() < high.len(), "{} vs {}", low.len(), high.len());
    }

    #[test]
    fn only_png_ignores_quality() {
        assert!(!ExportFormat::Png.supports_quality());
        assert!(ExportFormat::Jpeg.supports_quality());
        assert!(ExportFormat::Webp.supports_quality());
        assert_eq!(webp_quality(0.8), 80.0);
        assert_eq!(webp_quality(3.0), 100.0);
    }

    #[test]
    fn file_export_reloads_as_brush_tip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tip.png");
        let written = export_to_file(&sample(), &path, ExportFormat::Png, 0.5).unwrap();
        assert_eq!(written as u64, fs::metadata(&path).unwrap().len());

        let tip = load_brush_image(&path).unwrap();
        assert_eq!(&tip, sample().as_image());
    }

    #[test]
    fn garbage_brush_bytes_fail() {
        assert!(matches!(
            decode_brush_image(b"not an image"),
            Err(CanvasError::Encode(_))
        ));
    }
}
