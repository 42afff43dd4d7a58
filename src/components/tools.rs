use crate::canvas::{Point, RasterSurface};
use crate::ops::{fill, paint};
use image::{Rgb, RgbaImage};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Smallest / largest brush and eraser diameter in pixels.
pub const MIN_TOOL_SIZE: f32 = 1.0;
pub const MAX_TOOL_SIZE: f32 = 500.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Fill,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "brush",
            Tool::Eraser => "eraser",
            Tool::Fill => "fill",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Brush, Tool::Eraser, Tool::Fill]
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        let name = name.trim();
        Tool::all()
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// BRUSH SHAPES
// ============================================================================

/// A user-supplied bitmap tip. Cloning shares the pixels.
#[derive(Clone)]
pub struct CustomBrush {
    image: Arc<RgbaImage>,
}

impl CustomBrush {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl PartialEq for CustomBrush {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for CustomBrush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CustomBrush({}×{})",
            self.image.width(),
            self.image.height()
        )
    }
}

/// How a single brush stamp looks. A custom tip always carries its bitmap,
/// so there is no "custom without an image" state.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum BrushShape {
    #[default]
    Round,
    Square,
    Soft,
    Textured,
    Custom(CustomBrush),
}

impl BrushShape {
    pub fn label(&self) -> &'static str {
        match self {
            BrushShape::Round => "round",
            BrushShape::Square => "square",
            BrushShape::Soft => "soft",
            BrushShape::Textured => "textured",
            BrushShape::Custom(_) => "custom",
        }
    }

    /// Built-in shapes by name. `texture` is accepted as an alias.
    pub fn from_name(name: &str) -> Option<BrushShape> {
        match name.trim().to_ascii_lowercase().as_str() {
            "round" => Some(BrushShape::Round),
            "square" => Some(BrushShape::Square),
            "soft" => Some(BrushShape::Soft),
            "textured" | "texture" => Some(BrushShape::Textured),
            _ => None,
        }
    }
}

// ============================================================================
// TOOL CONFIGURATION
// ============================================================================

fn clamp_size(size: f32) -> f32 {
    if size.is_nan() {
        return MIN_TOOL_SIZE;
    }
    size.clamp(MIN_TOOL_SIZE, MAX_TOOL_SIZE)
}

fn clamp_unit(value: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        return fallback;
    }
    value.clamp(0.0, 1.0)
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrushConfig {
    pub color: Rgb<u8>,
    /// Diameter in pixels.
    pub size: f32,
    /// 0.0..=1.0 multiplier on source alpha.
    pub opacity: f32,
    pub shape: BrushShape,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: Rgb([0, 0, 0]),
            size: 10.0,
            opacity: 1.0,
            shape: BrushShape::Round,
        }
    }
}

impl BrushConfig {
    pub fn set_color(&mut self, color: Rgb<u8>) {
        self.color = color;
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = clamp_size(size);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp_unit(opacity, self.opacity);
    }

    /// Switching to a built-in shape drops any custom tip.
    pub fn set_shape(&mut self, shape: BrushShape) {
        self.shape = shape;
    }

    pub fn set_custom_image(&mut self, image: RgbaImage) {
        self.shape = BrushShape::Custom(CustomBrush::new(image));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EraserConfig {
    pub size: f32,
    pub opacity: f32,
    /// 100 = hard edge, 0 = softest gradient.
    pub hardness: u8,
}

impl Default for EraserConfig {
    fn default() -> Self {
        Self {
            size: 20.0,
            opacity: 1.0,
            hardness: 100,
        }
    }
}

impl EraserConfig {
    pub fn set_size(&mut self, size: f32) {
        self.size = clamp_size(size);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp_unit(opacity, self.opacity);
    }

    pub fn set_hardness(&mut self, hardness: u32) {
        self.hardness = hardness.min(100) as u8;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FillConfig {
    pub color: Rgb<u8>,
    /// Per-channel tolerance; matched against the summed RGBA difference × 4.
    pub tolerance: u8,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            color: Rgb([0, 0, 0]),
            tolerance: 32,
        }
    }
}

// ============================================================================
// TOOL BEHAVIOUR
// ============================================================================

/// In-progress pointer gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeState {
    pub tool: Tool,
    pub last_point: Point,
}

/// Fixed capability set every paint tool provides.
pub trait PaintTool {
    fn is_active(&self) -> bool;

    fn activate(&mut self);

    fn deactivate(&mut self);

    /// Pointer pressed at `point`.
    fn press(&mut self, surface: &mut RasterSurface, point: Point);

    /// Pointer dragged from `from` to `to` while pressed.
    fn drag(&mut self, surface: &mut RasterSurface, from: Point, to: Point);

    /// Whether drags after the press keep painting.
    fn continues_stroke(&self) -> bool {
        true
    }
}

#[derive(Clone, Debug, Default)]
pub struct BrushTool {
    pub config: BrushConfig,
    active: bool,
}

impl PaintTool for BrushTool {
    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self) {
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn press(&mut self, surface: &mut RasterSurface, point: Point) {
        paint::stamp_at(surface, point, &self.config);
    }

    fn drag(&mut self, surface: &mut RasterSurface, from: Point, to: Point) {
        paint::stamp_line(surface, from, to, &self.config);
    }
}

#[derive(Clone, Debug, Default)]
pub struct EraserTool {
    pub config: EraserConfig,
    active: bool,
}

impl PaintTool for EraserTool {
    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self) {
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn press(&mut self, surface: &mut RasterSurface, point: Point) {
        paint::erase_at(surface, point, &self.config);
    }

    fn drag(&mut self, surface: &mut RasterSurface, from: Point, to: Point) {
        paint::erase_between(surface, from, to, &self.config);
    }
}

#[derive(Clone, Debug, Default)]
pub struct FillTool {
    pub config: FillConfig,
    active: bool,
}

impl PaintTool for FillTool {
    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self) {
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn press(&mut self, surface: &mut RasterSurface, point: Point) {
        fill::flood_fill(surface, point, &self.config);
    }

    // A fill happens once per click; dragging does nothing.
    fn drag(&mut self, _surface: &mut RasterSurface, _from: Point, _to: Point) {}

    fn continues_stroke(&self) -> bool {
        false
    }
}

/// Owns one instance of every tool and tracks which one is selected.
#[derive(Clone, Debug)]
pub struct ToolBox {
    pub brush: BrushTool,
    pub eraser: EraserTool,
    pub fill: FillTool,
    active: Tool,
}

impl Default for ToolBox {
    fn default() -> Self {
        let mut tools = Self {
            brush: BrushTool::default(),
            eraser: EraserTool::default(),
            fill: FillTool::default(),
            active: Tool::Brush,
        };
        tools.brush.activate();
        tools
    }
}

impl ToolBox {
    pub fn active(&self) -> Tool {
        self.active
    }

    /// Deactivate the current tool and activate `tool`.
    /// Returns false when `tool` was already selected.
    pub fn set_active(&mut self, tool: Tool) -> bool {
        if tool == self.active {
            return false;
        }
        self.tool_mut(self.active).deactivate();
        self.active = tool;
        self.tool_mut(tool).activate();
        true
    }

    pub fn tool(&self, tool: Tool) -> &dyn PaintTool {
        match tool {
            Tool::Brush => &self.brush,
            Tool::Eraser => &self.eraser,
            Tool::Fill => &self.fill,
        }
    }

    pub fn tool_mut(&mut self, tool: Tool) -> &mut dyn PaintTool {
        match tool {
            Tool::Brush => &mut self.brush,
            Tool::Eraser => &mut self.eraser,
            Tool::Fill => &mut self.fill,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_round_trip() {
        for tool in Tool::all() {
            assert_eq!(Tool::from_name(tool.label()), Some(*tool));
        }
        assert_eq!(Tool::from_name(" Eraser "), Some(Tool::Eraser));
        assert_eq!(Tool::from_name("lasso"), None);
    }

    #[test]
    fn shape_names() {
        assert_eq!(BrushShape::from_name("texture"), Some(BrushShape::Textured));
        assert_eq!(BrushShape::from_name("SOFT"), Some(BrushShape::Soft));
        assert_eq!(BrushShape::from_name("custom"), None);
    }

    #[test]
    fn config_setters_clamp() {
        let mut brush = BrushConfig::default();
        brush.set_size(0.0);
        assert_eq!(brush.size, MIN_TOOL_SIZE);
        brush.set_size(10_000.0);
        assert_eq!(brush.size, MAX_TOOL_SIZE);
        brush.set_opacity(1.7);
        assert_eq!(brush.opacity, 1.0);
        brush.set_opacity(f32::NAN);
        assert_eq!(brush.opacity, 1.0);

        let mut eraser = EraserConfig::default();
        eraser.set_hardness(250);
        assert_eq!(eraser.hardness, 100);
        eraser.set_opacity(-0.5);
        assert_eq!(eraser.opacity, 0.0);
    }

    #[test]
    fn custom_tip_replaces_and_is_replaced() {
        let mut brush = BrushConfig::default();
        brush.set_custom_image(RgbaImage::new(4, 4));
        assert_eq!(brush.shape.label(), "custom");
        brush.set_shape(BrushShape::Square);
        assert_eq!(brush.shape, BrushShape::Square);
    }

    #[test]
    fn switching_tools_toggles_activation() {
        let mut tools = ToolBox::default();
        assert!(tools.brush.is_active());
        assert!(tools.set_active(Tool::Eraser));
        assert!(!tools.brush.is_active());
        assert!(tools.eraser.is_active());
        assert!(!tools.set_active(Tool::Eraser));
        assert_eq!(tools.active(), Tool::Eraser);
        assert!(!tools.tool(Tool::Fill).continues_stroke());
        assert!(tools.tool(Tool::Brush).continues_stroke());
    }
}
