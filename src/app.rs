// ============================================================================
// DRAWING APP — application state and the operation surface UI glue calls
// ============================================================================

use crate::canvas::{LayerInfo, LayerStack, Point, RasterSurface};
use crate::components::colors::parse_hex_color;
use crate::components::tools::{
    BrushConfig, BrushShape, EraserConfig, FillConfig, StrokeState, Tool, ToolBox,
};
use crate::error::CanvasResult;
use crate::io::{ExportFormat, encode_image};
use crate::ops::canvas_ops;
use crate::ops::fill::{self, FillOutcome};
use crate::settings::AppSettings;
use image::{Rgb, RgbaImage};
use serde::Serialize;

/// Snapshot of the document for reports.
#[derive(Clone, Debug, Serialize)]
pub struct CanvasSummary {
    pub width: u32,
    pub height: u32,
    pub active_layer: usize,
    pub active_tool: Tool,
    pub layers: Vec<LayerInfo>,
}

/// Owns the layer stack, the tools and the on-screen composite.
/// Every mutating call recomposites before returning.
pub struct DrawingApp {
    stack: LayerStack,
    tools: ToolBox,
    stroke: Option<StrokeState>,
    composite: RasterSurface,
    settings: AppSettings,
}

impl DrawingApp {
    pub fn new() -> CanvasResult<Self> {
        Self::with_settings(AppSettings::default())
    }

    /// Canvas size and every tool config are taken from `settings`.
    pub fn with_settings(settings: AppSettings) -> CanvasResult<Self> {
        let stack = LayerStack::new(settings.canvas_width, settings.canvas_height)?;
        let mut tools = ToolBox::default();
        tools.brush.config = settings.brush_config();
        tools.eraser.config = settings.eraser_config();
        tools.fill.config = settings.fill_config();
        let composite = stack.composite();
        crate::log_info!(
            "Canvas initialised at {}×{}",
            stack.width(),
            stack.height()
        );
        Ok(Self {
            stack,
            tools,
            stroke: None,
            composite,
            settings,
        })
    }

    fn refresh(&mut self) {
        self.stack.composite_into(&mut self.composite);
    }

    // ------------------------------------------------------------------
    // Canvas
    // ------------------------------------------------------------------

    /// Start over with a single empty layer at the given size.
    pub fn initialize_canvas(&mut self, width: u32, height: u32) -> CanvasResult<()> {
        let stack = match LayerStack::new(width, height) {
            Ok(stack) => stack,
            Err(e) => {
                crate::log_warn!("Rejected new canvas {}×{}", width, height);
                return Err(e);
            }
        };
        self.stack = stack;
        self.stroke = None;
        self.refresh();
        crate::log_info!("Canvas initialised at {}×{}", width, height);
        Ok(())
    }

    pub fn resize_canvas(&mut self, width: u32, height: u32) -> CanvasResult<()> {
        canvas_ops::resize_canvas(&mut self.stack, width, height)?;
        self.refresh();
        Ok(())
    }

    pub fn clear_active_layer(&mut self) {
        canvas_ops::clear_active_layer(&mut self.stack);
        self.refresh();
    }

    pub fn clear_all_layers(&mut self) {
        canvas_ops::clear_all_layers(&mut self.stack);
        self.refresh();
    }

    pub fn width(&self) -> u32 {
        self.stack.width()
    }

    pub fn height(&self) -> u32 {
        self.stack.height()
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    pub fn add_layer(&mut self) -> CanvasResult<usize> {
        let index = canvas_ops::add_layer(&mut self.stack)?;
        self.refresh();
        Ok(index)
    }

    pub fn duplicate_active_layer(&mut self) -> usize {
        let index = canvas_ops::duplicate_active_layer(&mut self.stack);
        self.refresh();
        index
    }

    pub fn delete_active_layer(&mut self) -> CanvasResult<()> {
        canvas_ops::delete_active_layer(&mut self.stack)?;
        self.refresh();
        Ok(())
    }

    pub fn set_active_layer(&mut self, index: usize) -> CanvasResult<()> {
        self.stack.set_active(index)
    }

    /// Returns the layer's new visibility.
    pub fn toggle_layer_visibility(&mut self, index: usize) -> CanvasResult<bool> {
        let visible = self.stack.toggle_visibility(index)?;
        self.refresh();
        Ok(visible)
    }

    pub fn layers(&self) -> Vec<LayerInfo> {
        self.stack.layer_infos()
    }

    pub fn active_layer_index(&self) -> usize {
        self.stack.active_layer_index()
    }

    pub fn layer_stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn layer_thumbnail(&self, index: usize) -> Option<RgbaImage> {
        self.stack.layer(index).map(|layer| layer.thumbnail())
    }

    // ------------------------------------------------------------------
    // Tools & strokes
    // ------------------------------------------------------------------

    pub fn active_tool(&self) -> Tool {
        self.tools.active()
    }

    /// Switch tools; any stroke in progress is ended first.
    pub fn select_tool(&mut self, tool: Tool) {
        if self.stroke.is_some_and(|s| s.tool != tool) {
            self.stroke = None;
        }
        self.tools.set_active(tool);
    }

    pub fn stroke_in_progress(&self) -> Option<StrokeState> {
        self.stroke
    }

    /// Pointer down. Brush and eraser stamp a dot and start a stroke; fill
    /// floods the region once. A hidden active layer is left untouched.
    pub fn stroke_begin(&mut self, tool: Tool, point: Point) {
        self.select_tool(tool);
        let handler = self.tools.tool_mut(tool);
        if let Some(surface) = self.stack.paintable_surface_mut() {
            handler.press(surface, point);
        }
        self.stroke = handler.continues_stroke().then_some(StrokeState {
            tool,
            last_point: point,
        });
        self.refresh();
    }

    /// Pointer moved. Ignored unless a stroke of `tool` is in progress.
    pub fn stroke_move(&mut self, tool: Tool, point: Point) {
        let Some(stroke) = self.stroke.as_mut().filter(|s| s.tool == tool) else {
            return;
        };
        let from = stroke.last_point;
        stroke.last_point = point;

        let handler = self.tools.tool_mut(tool);
        if let Some(surface) = self.stack.paintable_surface_mut() {
            handler.drag(surface, from, point);
        }
        self.refresh();
    }

    /// Pointer released. Everything stamped so far stays.
    pub fn stroke_end(&mut self, tool: Tool) {
        if self.stroke.is_some_and(|s| s.tool == tool) {
            self.stroke = None;
        }
    }

    /// Flood fill on the active layer with an explicit config.
    pub fn fill_at(&mut self, point: Point, config: &FillConfig) -> FillOutcome {
        let outcome = match self.stack.paintable_surface_mut() {
            Some(surface) => fill::flood_fill(surface, point, config),
            None => FillOutcome::default(),
        };
        if outcome.filled > 0 {
            self.refresh();
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn composite(&self) -> &RasterSurface {
        &self.composite
    }

    /// Encode a fresh composite. Unknown format names fall back to PNG.
    pub fn export_image(&self, format: &str, quality: f32) -> CanvasResult<Vec<u8>> {
        let format = ExportFormat::from_name(format);
        let snapshot = self.stack.composite();
        let bytes = encode_image(&snapshot, format, quality)?;
        crate::log_info!(
            "Encoded {}×{} composite as {} ({} bytes)",
            snapshot.width(),
            snapshot.height(),
            format.name(),
            bytes.len()
        );
        Ok(bytes)
    }

    pub fn summary(&self) -> CanvasSummary {
        CanvasSummary {
            width: self.stack.width(),
            height: self.stack.height(),
            active_layer: self.stack.active_layer_index(),
            active_tool: self.tools.active(),
            layers: self.stack.layer_infos(),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn brush_config(&self) -> &BrushConfig {
        &self.tools.brush.config
    }

    pub fn eraser_config(&self) -> &EraserConfig {
        &self.tools.eraser.config
    }

    pub fn fill_config(&self) -> &FillConfig {
        &self.tools.fill.config
    }

    pub fn set_brush_color(&mut self, color: Rgb<u8>) {
        self.tools.brush.config.set_color(color);
    }

    /// Returns false (keeping the old colour) for an invalid hex string.
    pub fn set_brush_color_hex(&mut self, hex: &str) -> bool {
        match parse_hex_color(hex) {
            Some(color) => {
                self.set_brush_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.tools.brush.config.set_size(size);
    }

    pub fn set_brush_opacity(&mut self, opacity: f32) {
        self.tools.brush.config.set_opacity(opacity);
    }

    pub fn set_brush_shape(&mut self, shape: BrushShape) {
        self.tools.brush.config.set_shape(shape);
    }

    pub fn set_custom_brush(&mut self, image: RgbaImage) {
        self.tools.brush.config.set_custom_image(image);
    }

    pub fn set_eraser_size(&mut self, size: f32) {
        self.tools.eraser.config.set_size(size);
    }

    pub fn set_eraser_opacity(&mut self, opacity: f32) {
        self.tools.eraser.config.set_opacity(opacity);
    }

    pub fn set_eraser_hardness(&mut self, hardness: u32) {
        self.tools.eraser.config.set_hardness(hardness);
    }

    pub fn set_fill_color(&mut self, color: Rgb<u8>) {
        self.tools.fill.config.color = color;
    }

    /// Returns false (keeping the old colour) for an invalid hex string.
    pub fn set_fill_color_hex(&mut self, hex: &str) -> bool {
        match parse_hex_color(hex) {
            Some(color) => {
                self.set_fill_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_fill_tolerance(&mut self, tolerance: u8) {
        self.tools.fill.config.tolerance = tolerance;
    }
}
