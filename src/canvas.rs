use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CanvasError, CanvasResult};

/// Largest width or height any surface may have.
pub const MAX_DIMENSION: u32 = 4000;

/// Smallest width or height accepted for the canvas itself.
pub const MIN_CANVAS_DIMENSION: u32 = 50;

/// Default size of a layer-panel preview.
pub const THUMBNAIL_SIZE: (u32, u32) = (40, 30);

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Validate raw surface dimensions (1..=MAX_DIMENSION on both axes).
pub fn check_surface_dimensions(width: u32, height: u32) -> CanvasResult<()> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CanvasError::invalid_dimension(width, height));
    }
    Ok(())
}

/// Validate canvas dimensions (MIN_CANVAS_DIMENSION..=MAX_DIMENSION on both axes).
pub fn check_canvas_dimensions(width: u32, height: u32) -> CanvasResult<()> {
    let range = MIN_CANVAS_DIMENSION..=MAX_DIMENSION;
    if !range.contains(&width) || !range.contains(&height) {
        return Err(CanvasError::invalid_dimension(width, height));
    }
    Ok(())
}

// ============================================================================
// POINT
// ============================================================================

/// A position in surface-pixel coordinates. Pixel (x, y) covers the square
/// `[x, x+1) × [y, y+1)`, so its centre is at `(x + 0.5, y + 0.5)`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation towards `other` (`t = 0` → self, `t = 1` → other).
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Integer pixel containing this point.
    pub fn pixel(self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x, y)
    }
}

// ============================================================================
// COMPOSITING PRIMITIVES
// ============================================================================

/// Straight-alpha "source-over": draws `top` over `base`, with `opacity`
/// scaling the source alpha.
pub fn blend_over(base: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let opacity = opacity.clamp(0.0, 1.0);
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }
    // Fully opaque source at full strength replaces the destination.
    if top[3] == 255 && opacity >= 1.0 {
        return top;
    }

    let src_a = (top[3] as f32 / 255.0) * opacity;
    let dst_a = base[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }

    let channel = |s: u8, d: u8| -> u8 {
        let c = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(top[0], base[0]),
        channel(top[1], base[1]),
        channel(top[2], base[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// "Destination-out": removes `strength` (0..1) of the pixel's alpha.
/// Colour channels are left as they are.
pub fn erase_alpha(base: Rgba<u8>, strength: f32) -> Rgba<u8> {
    let strength = strength.clamp(0.0, 1.0);
    if strength <= 0.0 || base[3] == 0 {
        return base;
    }
    let alpha = (base[3] as f32 * (1.0 - strength)).round().clamp(0.0, 255.0) as u8;
    Rgba([base[0], base[1], base[2], alpha])
}

// ============================================================================
// RASTER SURFACE – flat row-major RGBA8 buffer
// ============================================================================

/// A single pixel sheet. The backing buffer always holds exactly
/// `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        check_surface_dimensions(width, height)?;
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    /// Wrap an existing image (e.g. a decoded brush tip or test fixture).
    pub fn from_rgba_image(image: RgbaImage) -> CanvasResult<Self> {
        check_surface_dimensions(image.width(), image.height())?;
        Ok(Self { pixels: image })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Mutable raw bytes. The length is fixed, so the size invariant holds.
    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    /// Bounds-checked read; `None` outside the surface.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if !self.contains(x, y) {
            return None;
        }
        Some(*self.pixels.get_pixel(x as u32, y as u32))
    }

    /// Bounds-checked write; out-of-bounds writes are dropped.
    pub fn put_pixel(&mut self, x: i32, y: i32, pixel: Rgba<u8>) {
        if self.contains(x, y) {
            self.pixels.put_pixel(x as u32, y as u32, pixel);
        }
    }

    /// Source-over a colour onto one pixel. Out-of-bounds is a no-op.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>, opacity: f32) {
        if self.contains(x, y) {
            let px = self.pixels.get_pixel_mut(x as u32, y as u32);
            *px = blend_over(*px, color, opacity);
        }
    }

    /// Destination-out on one pixel. Out-of-bounds is a no-op.
    pub fn erase_pixel(&mut self, x: i32, y: i32, strength: f32) {
        if self.contains(x, y) {
            let px = self.pixels.get_pixel_mut(x as u32, y as u32);
            *px = erase_alpha(*px, strength);
        }
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.pixels.pixels_mut() {
            *px = color;
        }
    }

    /// Make every pixel fully transparent.
    pub fn clear(&mut self) {
        let raw: &mut [u8] = &mut self.pixels;
        raw.fill(0);
    }

    pub fn is_transparent(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    /// Crop/extend to new dimensions, anchored at the top-left corner.
    /// The overlapping rectangle is copied verbatim; newly exposed pixels are
    /// transparent. Content is never scaled.
    pub fn resize(&mut self, width: u32, height: u32) -> CanvasResult<()> {
        check_surface_dimensions(width, height)?;
        if width == self.width() && height == self.height() {
            return Ok(());
        }

        let mut resized = RgbaImage::new(width, height);
        let copy_w = self.width().min(width) as usize * 4;
        let copy_h = self.height().min(height) as usize;
        let old_stride = self.width() as usize * 4;
        let new_stride = width as usize * 4;
        {
            let src = self.pixels.as_raw();
            let dst: &mut [u8] = &mut resized;
            for y in 0..copy_h {
                let s = y * old_stride;
                let d = y * new_stride;
                dst[d..d + copy_w].copy_from_slice(&src[s..s + copy_w]);
            }
        }
        self.pixels = resized;
        Ok(())
    }

    /// Deep copy of another surface's pixels (dimensions included).
    pub fn copy_from(&mut self, other: &RasterSurface) {
        self.pixels.clone_from(&other.pixels);
    }

    /// Downscaled preview of the whole surface.
    pub fn thumbnail(&self, width: u32, height: u32) -> RgbaImage {
        image::imageops::resize(
            &self.pixels,
            width.max(1),
            height.max(1),
            image::imageops::FilterType::Triangle,
        )
    }
}

// ============================================================================
// LAYERS
// ============================================================================

#[derive(Clone, Debug)]
pub struct Layer {
    pub id: Uuid,
    pub name: String,
    pub visible: bool,
    pub surface: RasterSurface,
}

impl Layer {
    pub fn new(name: String, width: u32, height: u32) -> CanvasResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            visible: true,
            surface: RasterSurface::new(width, height)?,
        })
    }

    /// Deep copy under a fresh id, named "<name> copy". Pixels are never
    /// shared, and the copy starts visible like any new layer.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: format!("{} copy", self.name),
            visible: true,
            surface: self.surface.clone(),
        }
    }

    pub fn thumbnail(&self) -> RgbaImage {
        self.surface.thumbnail(THUMBNAIL_SIZE.0, THUMBNAIL_SIZE.1)
    }
}

/// Read-only description of a layer for panel collaborators.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerInfo {
    pub index: usize,
    pub id: Uuid,
    pub name: String,
    pub visible: bool,
    pub active: bool,
}

// ============================================================================
// LAYER STACK
// ============================================================================

/// Ordered layers, bottom to top. Never empty; `active_layer_index` always
/// addresses an existing layer.
#[derive(Clone, Debug)]
pub struct LayerStack {
    pub(crate) layers: Vec<Layer>,
    pub(crate) active_layer_index: usize,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl LayerStack {
    /// A stack with one empty, visible "Layer 1".
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        check_canvas_dimensions(width, height)?;
        let first = Layer::new("Layer 1".to_string(), width, height)?;
        Ok(Self {
            layers: vec![first],
            active_layer_index: 0,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Never true: a stack always holds at least one layer.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn active_layer_index(&self) -> usize {
        self.active_layer_index
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active_layer_index]
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        &mut self.layers[self.active_layer_index]
    }

    /// The active layer's surface, or `None` when that layer is hidden.
    /// Painting tools go through this so hidden layers are never touched.
    pub fn paintable_surface_mut(&mut self) -> Option<&mut RasterSurface> {
        let layer = &mut self.layers[self.active_layer_index];
        if layer.visible {
            Some(&mut layer.surface)
        } else {
            None
        }
    }

    pub fn set_active(&mut self, index: usize) -> CanvasResult<()> {
        if index >= self.layers.len() {
            return Err(CanvasError::InvalidIndex {
                index,
                len: self.layers.len(),
            });
        }
        self.active_layer_index = index;
        Ok(())
    }

    /// Flip a layer's visibility. Returns the new visibility.
    pub fn toggle_visibility(&mut self, index: usize) -> CanvasResult<bool> {
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(CanvasError::InvalidIndex { index, len })?;
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }

    pub fn layer_infos(&self) -> Vec<LayerInfo> {
        self.layers
            .iter()
            .enumerate()
            .map(|(index, layer)| LayerInfo {
                index,
                id: layer.id,
                name: layer.name.clone(),
                visible: layer.visible,
                active: index == self.active_layer_index,
            })
            .collect()
    }

    /// Flatten all visible layers into a fresh surface.
    pub fn composite(&self) -> RasterSurface {
        let mut out = RasterSurface {
            pixels: RgbaImage::new(self.width, self.height),
        };
        self.composite_into(&mut out);
        out
    }

    /// Flatten all visible layers into `out`, bottom to top, with source-over.
    /// Hidden layers, and layers whose surface no longer matches the canvas
    /// size, are skipped entirely. `out` is reallocated if its size differs
    /// from the canvas.
    pub fn composite_into(&self, out: &mut RasterSurface) {
        if out.width() != self.width || out.height() != self.height {
            out.pixels = RgbaImage::new(self.width, self.height);
        }

        let stride = self.width as usize * 4;
        let expected = stride * self.height as usize;
        let visible: Vec<&[u8]> = self
            .layers
            .iter()
            .filter(|l| l.visible)
            .map(|l| l.surface.as_raw())
            .filter(|raw| raw.len() == expected)
            .collect();

        out.pixels
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                row.fill(0);
                let start = y * stride;
                for src in &visible {
                    let src_row = &src[start..start + stride];
                    for (dst, s) in row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                        if s[3] == 0 {
                            continue;
                        }
                        let base = Rgba([dst[0], dst[1], dst[2], dst[3]]);
                        let top = Rgba([s[0], s[1], s[2], s[3]]);
                        dst.copy_from_slice(&blend_over(base, top, 1.0).0);
                    }
                }
            });
    }
}
