use crate::canvas::{MAX_DIMENSION, MIN_CANVAS_DIMENSION};
use crate::components::colors::{parse_hex_color, to_hex};
use crate::components::tools::{
    BrushConfig, BrushShape, EraserConfig, FillConfig, MAX_TOOL_SIZE, MIN_TOOL_SIZE,
};
use crate::error::CanvasResult;
use crate::io::{DEFAULT_EXPORT_QUALITY, ExportFormat, clamp_quality};
use image::Rgb;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "drawanywhere_settings.cfg";

/// Persisted defaults for a new drawing session.
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,

    pub brush_color: Rgb<u8>,
    pub brush_size: f32,
    pub brush_opacity: f32,
    pub brush_shape: BrushShape,

    pub eraser_size: f32,
    pub eraser_hardness: u8,
    pub eraser_opacity: f32,

    pub fill_color: Rgb<u8>,
    pub fill_tolerance: u8,

    pub export_format: ExportFormat,
    pub export_quality: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        let brush = BrushConfig::default();
        let eraser = EraserConfig::default();
        let fill = FillConfig::default();
        Self {
            canvas_width: 800,
            canvas_height: 600,
            brush_color: brush.color,
            brush_size: brush.size,
            brush_opacity: brush.opacity,
            brush_shape: brush.shape,
            eraser_size: eraser.size,
            eraser_hardness: eraser.hardness,
            eraser_opacity: eraser.opacity,
            fill_color: fill.color,
            fill_tolerance: fill.tolerance,
            export_format: ExportFormat::Png,
            export_quality: DEFAULT_EXPORT_QUALITY,
        }
    }
}

impl AppSettings {
    /// Platform config location of the settings file.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("DrawAnywhere").join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("DrawAnywhere")
                    .join(SETTINGS_FILE),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("drawanywhere").join(SETTINGS_FILE))
        }
    }

    /// Load from the platform location (defaults if missing or corrupt).
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`; a missing or unreadable file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        Self::parse(&content)
    }

    /// Parse `key=value` lines. Unknown keys and unparsable values are
    /// skipped (the field keeps its default); numbers are clamped into range.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "canvas_width" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.canvas_width = v.clamp(MIN_CANVAS_DIMENSION, MAX_DIMENSION);
                    }
                }
                "canvas_height" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.canvas_height = v.clamp(MIN_CANVAS_DIMENSION, MAX_DIMENSION);
                    }
                }
                "brush_color" => {
                    if let Some(c) = parse_hex_color(val) {
                        s.brush_color = c;
                    }
                }
                "brush_size" => {
                    if let Some(v) = parse_finite(val) {
                        s.brush_size = v.clamp(MIN_TOOL_SIZE, MAX_TOOL_SIZE);
                    }
                }
                "brush_opacity" => {
                    if let Some(v) = parse_finite(val) {
                        s.brush_opacity = v.clamp(0.0, 1.0);
                    }
                }
                "brush_shape" => {
                    if let Some(shape) = BrushShape::from_name(val) {
                        s.brush_shape = shape;
                    }
                }
                "eraser_size" => {
                    if let Some(v) = parse_finite(val) {
                        s.eraser_size = v.clamp(MIN_TOOL_SIZE, MAX_TOOL_SIZE);
                    }
                }
                "eraser_hardness" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.eraser_hardness = v.min(100) as u8;
                    }
                }
                "eraser_opacity" => {
                    if let Some(v) = parse_finite(val) {
                        s.eraser_opacity = v.clamp(0.0, 1.0);
                    }
                }
                "fill_color" => {
                    if let Some(c) = parse_hex_color(val) {
                        s.fill_color = c;
                    }
                }
                "fill_tolerance" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.fill_tolerance = v.min(255) as u8;
                    }
                }
                "export_format" => {
                    if let Ok(f) = ExportFormat::parse(val) {
                        s.export_format = f;
                    }
                }
                "export_quality" => {
                    if let Some(v) = parse_finite(val) {
                        s.export_quality = clamp_quality(v);
                    }
                }
                _ => {}
            }
        }
        s
    }

    /// Serialise as `key=value` lines. A custom brush tip has no textual
    /// form, so `brush_shape` is left out and loads back as the default.
    pub fn to_cfg_string(&self) -> String {
        let mut out = format!(
            "canvas_width={}\n\
             canvas_height={}\n\
             brush_color={}\n\
             brush_size={}\n\
             brush_opacity={}\n",
            self.canvas_width,
            self.canvas_height,
            to_hex(self.brush_color),
            self.brush_size,
            self.brush_opacity,
        );
        if !matches!(self.brush_shape, BrushShape::Custom(_)) {
            out.push_str(&format!("brush_shape={}\n", self.brush_shape.label()));
        }
        out.push_str(&format!(
            "eraser_size={}\n\
             eraser_hardness={}\n\
             eraser_opacity={}\n\
             fill_color={}\n\
             fill_tolerance={}\n\
             export_format={}\n\
             export_quality={}\n",
            self.eraser_size,
            self.eraser_hardness,
            self.eraser_opacity,
            to_hex(self.fill_color),
            self.fill_tolerance,
            self.export_format.name(),
            self.export_quality,
        ));
        out
    }

    /// Write every key to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> CanvasResult<()> {
        if matches!(self.brush_shape, BrushShape::Custom(_)) {
            crate::log_warn!("Custom brush tip is not saved; brush_shape omitted from settings");
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_cfg_string())?;
        Ok(())
    }

    /// Save to the platform location. Failures are logged, not returned.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            crate::log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    pub fn brush_config(&self) -> BrushConfig {
        BrushConfig {
            color: self.brush_color,
            size: self.brush_size,
            opacity: self.brush_opacity,
            shape: self.brush_shape.clone(),
        }
    }

    pub fn eraser_config(&self) -> EraserConfig {
        EraserConfig {
            size: self.eraser_size,
            opacity: self.eraser_opacity,
            hardness: self.eraser_hardness,
        }
    }

    pub fn fill_config(&self) -> FillConfig {
        FillConfig {
            color: self.fill_color,
            tolerance: self.fill_tolerance,
        }
    }
}

fn parse_finite(val: &str) -> Option<f32> {
    val.parse::<f32>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tools::CustomBrush;

    #[test]
    fn defaults_match_a_fresh_session() {
        let s = AppSettings::default();
        assert_eq!((s.canvas_width, s.canvas_height), (800, 600));
        assert_eq!(s.brush_size, 10.0);
        assert_eq!(s.eraser_size, 20.0);
        assert_eq!(s.eraser_hardness, 100);
        assert_eq!(s.fill_tolerance, 32);
        assert_eq!(s.export_quality, 0.8);
        assert_eq!(s.brush_shape, BrushShape::Round);
    }

    #[test]
    fn unknown_and_bad_values_are_ignored() {
        let s = AppSettings::parse(
            "# comment\n\
             theme=dark\n\
             brush_size=banana\n\
             brush_color=#00ff00\n\
             fill_tolerance=7\n\
             garbage line\n",
        );
        assert_eq!(s.brush_size, 10.0);
        assert_eq!(s.brush_color, Rgb([0, 255, 0]));
        assert_eq!(s.fill_tolerance, 7);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s = AppSettings::parse(
            "canvas_width=10\ncanvas_height=99999\nbrush_opacity=3\n\
             eraser_hardness=400\nexport_quality=-1\n",
        );
        assert_eq!(s.canvas_width, 50);
        assert_eq!(s.canvas_height, 4000);
        assert_eq!(s.brush_opacity, 1.0);
        assert_eq!(s.eraser_hardness, 100);
        assert_eq!(s.export_quality, 0.0);
    }

    #[test]
    fn written_file_reads_back() {
        let mut s = AppSettings::default();
        s.canvas_width = 1024;
        s.brush_shape = BrushShape::Textured;
        s.eraser_hardness = 40;
        s.export_format = ExportFormat::Webp;
        s.fill_color = Rgb([12, 200, 7]);
        assert_eq!(AppSettings::parse(&s.to_cfg_string()), s);
    }

    #[test]
    fn custom_brush_shape_is_not_written() {
        let mut s = AppSettings::default();
        s.brush_shape = BrushShape::Custom(CustomBrush::new(image::RgbaImage::new(4, 4)));
        s.brush_size = 42.0;
        let cfg = s.to_cfg_string();
        assert!(!cfg.contains("brush_shape"));
        assert!(!cfg.contains("custom"));

        let back = AppSettings::parse(&cfg);
        assert_eq!(back.brush_shape, BrushShape::Round);
        assert_eq!(back.brush_size, 42.0);
    }

    #[test]
    fn configs_follow_settings() {
        let mut s = AppSettings::default();
        s.brush_size = 33.0;
        s.eraser_opacity = 0.25;
        s.fill_tolerance = 0;
        assert_eq!(s.brush_config().size, 33.0);
        assert_eq!(s.eraser_config().opacity, 0.25);
        assert_eq!(s.fill_config().tolerance, 0);
    }
}
