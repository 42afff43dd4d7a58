// ============================================================================
// PAINT ENGINE — brush stamping and eraser stamping on a RasterSurface
// ============================================================================
//
// Geometry is evaluated at pixel centres `(x + 0.5, y + 0.5)`. Edges get a
// one-pixel linear coverage ramp so strokes come out anti-aliased.

use crate::canvas::{Point, RasterSurface};
use crate::components::colors;
use crate::components::tools::{BrushConfig, BrushShape, CustomBrush, EraserConfig, MIN_TOOL_SIZE};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rand::Rng;
use std::f32::consts::TAU;

/// Sub-dots scattered by one textured stamp.
pub const TEXTURE_DABS_PER_STAMP: usize = 8;
/// Sub-dots scattered at every interpolation step of a textured line.
pub const TEXTURE_DABS_PER_STEP: usize = 3;
/// Overlaid passes of a soft line; pass `i` runs at `opacity / (i + 1) / 2`.
pub const SOFT_LINE_PASSES: usize = 2;

/// One circular sub-dot of a textured stamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dab {
    pub center: Point,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Falloff {
    Hard,
    /// Alpha falls linearly from full at the centre to zero at the radius.
    Linear,
}

#[inline]
fn edge_coverage(radius: f32, dist: f32) -> f32 {
    (radius - dist + 0.5).clamp(0.0, 1.0)
}

#[inline]
fn pixel_center(x: i32, y: i32) -> Point {
    Point::new(x as f32 + 0.5, y as f32 + 0.5)
}

/// Inclusive pixel range covering `[lo, hi]`, clipped to `0..limit`.
fn pixel_span(lo: f32, hi: f32, limit: u32) -> Option<(i32, i32)> {
    let start = (lo.floor() as i32).max(0);
    let end = (hi.ceil() as i32).min(limit as i32 - 1);
    (start <= end).then_some((start, end))
}

/// Distance from `p` to the segment `a`–`b`.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance(a.lerp(b, t))
}

/// Number of interpolation intervals for a segment of length `distance`.
/// Never less than one.
pub fn step_count(distance: f32, spacing: f32) -> usize {
    if !distance.is_finite() || !spacing.is_finite() || spacing <= 0.0 {
        return 1;
    }
    ((distance / spacing).floor() as usize).max(1)
}

/// Evenly spaced points from `from` to `to`, both endpoints included.
fn step_points(from: Point, to: Point, spacing: f32) -> impl Iterator<Item = Point> {
    let steps = step_count(from.distance(to), spacing);
    (0..=steps).map(move |i| from.lerp(to, i as f32 / steps as f32))
}

// ----------------------------------------------------------------------------
// Primitive fills
// ----------------------------------------------------------------------------

fn fill_disk(
    surface: &mut RasterSurface,
    center: Point,
    radius: f32,
    color: Rgba<u8>,
    opacity: f32,
    falloff: Falloff,
) {
    if radius <= 0.0 || opacity <= 0.0 {
        return;
    }
    let reach = radius + 1.0;
    let Some((x0, x1)) = pixel_span(center.x - reach, center.x + reach, surface.width()) else {
        return;
    };
    let Some((y0, y1)) = pixel_span(center.y - reach, center.y + reach, surface.height()) else {
        return;
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = pixel_center(x, y).distance(center);
            let coverage = edge_coverage(radius, d);
            if coverage <= 0.0 {
                continue;
            }
            let strength = match falloff {
                Falloff::Hard => coverage,
                Falloff::Linear => coverage * (1.0 - d / radius).max(0.0),
            };
            if strength > 0.0 {
                surface.blend_pixel(x, y, color, opacity * strength);
            }
        }
    }
}

/// Axis-aligned square of side `size` centred on `center`, with per-axis
/// area coverage on the edges.
fn fill_square(
    surface: &mut RasterSurface,
    center: Point,
    size: f32,
    color: Rgba<u8>,
    opacity: f32,
) {
    let half = size / 2.0;
    let (left, right) = (center.x - half, center.x + half);
    let (top, bottom) = (center.y - half, center.y + half);
    let Some((x0, x1)) = pixel_span(left, right, surface.width()) else {
        return;
    };
    let Some((y0, y1)) = pixel_span(top, bottom, surface.height()) else {
        return;
    };

    let overlap = |p: i32, lo: f32, hi: f32| -> f32 {
        let p = p as f32;
        ((p + 1.0).min(hi) - p.max(lo)).clamp(0.0, 1.0)
    };

    for y in y0..=y1 {
        let cy = overlap(y, top, bottom);
        if cy <= 0.0 {
            continue;
        }
        for x in x0..=x1 {
            let coverage = overlap(x, left, right) * cy;
            if coverage > 0.0 {
                surface.blend_pixel(x, y, color, opacity * coverage);
            }
        }
    }
}

/// Round-capped line of width `2 * radius` from `a` to `b`, drawn once.
fn stroke_capsule(
    surface: &mut RasterSurface,
    a: Point,
    b: Point,
    radius: f32,
    color: Rgba<u8>,
    opacity: f32,
) {
    if opacity <= 0.0 {
        return;
    }
    let pad = radius + 1.0;
    let Some((x0, x1)) = pixel_span(a.x.min(b.x) - pad, a.x.max(b.x) + pad, surface.width()) else {
        return;
    };
    let Some((y0, y1)) = pixel_span(a.y.min(b.y) - pad, a.y.max(b.y) + pad, surface.height()) else {
        return;
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let coverage = edge_coverage(radius, segment_distance(pixel_center(x, y), a, b));
            if coverage > 0.0 {
                surface.blend_pixel(x, y, color, opacity * coverage);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Textured & custom tips
// ----------------------------------------------------------------------------

#[inline]
fn unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..1.0)
}

/// Random sub-dots for a textured stamp: each centre lies within `size / 2`
/// of `center`, each radius is in `[1, size / 4 + 1)`.
pub fn texture_dabs<R: Rng + ?Sized>(
    rng: &mut R,
    center: Point,
    size: f32,
    count: usize,
) -> Vec<Dab> {
    (0..count)
        .map(|_| {
            let angle = unit(rng) * TAU;
            let dist = unit(rng) * (size / 2.0);
            let radius = unit(rng) * (size / 4.0) + 1.0;
            Dab {
                center: Point::new(center.x + angle.cos() * dist, center.y + angle.sin() * dist),
                radius,
            }
        })
        .collect()
}

/// The custom tip resampled to `size × size`.
fn scale_tip(tip: &CustomBrush, size: f32) -> Option<RgbaImage> {
    let src = tip.image();
    if src.width() == 0 || src.height() == 0 {
        return None;
    }
    let side = size.round().max(1.0) as u32;
    Some(imageops::resize(src, side, side, FilterType::Triangle))
}

fn blit_tip(surface: &mut RasterSurface, tip: &RgbaImage, center: Point, opacity: f32) {
    let left = (center.x - tip.width() as f32 / 2.0).round() as i32;
    let top = (center.y - tip.height() as f32 / 2.0).round() as i32;
    for (tx, ty, px) in tip.enumerate_pixels() {
        if px[3] > 0 {
            surface.blend_pixel(left + tx as i32, top + ty as i32, *px, opacity);
        }
    }
}

// ----------------------------------------------------------------------------
// Brush
// ----------------------------------------------------------------------------

/// Stamp one brush dot at `point`. Textured stamps draw from the thread RNG.
pub fn stamp_at(surface: &mut RasterSurface, point: Point, config: &BrushConfig) {
    stamp_at_with_rng(surface, point, config, &mut rand::thread_rng());
}

pub fn stamp_at_with_rng<R: Rng + ?Sized>(
    surface: &mut RasterSurface,
    point: Point,
    config: &BrushConfig,
    rng: &mut R,
) {
    let color = colors::opaque(config.color);
    let size = config.size.max(MIN_TOOL_SIZE);
    let opacity = config.opacity.clamp(0.0, 1.0);
    let radius = size / 2.0;

    match &config.shape {
        BrushShape::Round => fill_disk(surface, point, radius, color, opacity, Falloff::Hard),
        BrushShape::Square => fill_square(surface, point, size, color, opacity),
        BrushShape::Soft => fill_disk(surface, point, radius, color, opacity, Falloff::Linear),
        BrushShape::Textured => {
            for dab in texture_dabs(rng, point, size, TEXTURE_DABS_PER_STAMP) {
                fill_disk(surface, dab.center, dab.radius, color, opacity, Falloff::Hard);
            }
        }
        BrushShape::Custom(tip) => {
            if let Some(scaled) = scale_tip(tip, size) {
                blit_tip(surface, &scaled, point, opacity);
            }
        }
    }
}

/// Paint the segment `from`→`to`. Textured strokes draw from the thread RNG.
pub fn stamp_line(surface: &mut RasterSurface, from: Point, to: Point, config: &BrushConfig) {
    stamp_line_with_rng(surface, from, to, config, &mut rand::thread_rng());
}

pub fn stamp_line_with_rng<R: Rng + ?Sized>(
    surface: &mut RasterSurface,
    from: Point,
    to: Point,
    config: &BrushConfig,
    rng: &mut R,
) {
    let color = colors::opaque(config.color);
    let size = config.size.max(MIN_TOOL_SIZE);
    let opacity = config.opacity.clamp(0.0, 1.0);
    let radius = size / 2.0;

    match &config.shape {
        // Stroked once with round caps, like a canvas lineTo.
        BrushShape::Round | BrushShape::Square => {
            stroke_capsule(surface, from, to, radius, color, opacity)
        }
        BrushShape::Soft => {
            for pass in 0..SOFT_LINE_PASSES {
                let alpha = opacity / (pass + 1) as f32 * 0.5;
                for p in step_points(from, to, size / 4.0) {
                    fill_disk(surface, p, radius, color, alpha, Falloff::Linear);
                }
            }
        }
        BrushShape::Textured => {
            for p in step_points(from, to, size / 8.0) {
                for dab in texture_dabs(rng, p, size, TEXTURE_DABS_PER_STEP) {
                    fill_disk(surface, dab.center, dab.radius, color, opacity, Falloff::Hard);
                }
            }
        }
        BrushShape::Custom(tip) => {
            let Some(scaled) = scale_tip(tip, size) else {
                return;
            };
            for p in step_points(from, to, size / 4.0) {
                blit_tip(surface, &scaled, p, opacity);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Eraser
// ----------------------------------------------------------------------------

/// Erase strength at normalised radius `t` (0 = centre, 1 = edge).
///
/// Hardness 100 is uniform. Otherwise the profile runs through the stops
/// `(0, 1)`, `(h, h)`, `(1, 0)` with `h = hardness / 100`; hardness 0 is a
/// plain linear falloff.
pub fn eraser_profile(t: f32, hardness: u8) -> f32 {
    if hardness >= 100 {
        return 1.0;
    }
    let t = t.clamp(0.0, 1.0);
    if hardness == 0 {
        return 1.0 - t;
    }
    let h = hardness as f32 / 100.0;
    if t <= h {
        1.0 - (1.0 - h) * (t / h)
    } else {
        h * (1.0 - (t - h) / (1.0 - h))
    }
}

fn erase_disk(surface: &mut RasterSurface, center: Point, radius: f32, opacity: f32, hardness: u8) {
    if radius <= 0.0 || opacity <= 0.0 {
        return;
    }
    let reach = radius + 1.0;
    let Some((x0, x1)) = pixel_span(center.x - reach, center.x + reach, surface.width()) else {
        return;
    };
    let Some((y0, y1)) = pixel_span(center.y - reach, center.y + reach, surface.height()) else {
        return;
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = pixel_center(x, y).distance(center);
            let coverage = edge_coverage(radius, d);
            if coverage <= 0.0 {
                continue;
            }
            let strength = opacity * coverage * eraser_profile(d / radius, hardness);
            if strength > 0.0 {
                surface.erase_pixel(x, y, strength);
            }
        }
    }
}

/// Erase one dab at `point`: alpha goes down, colour channels stay.
pub fn erase_at(surface: &mut RasterSurface, point: Point, config: &EraserConfig) {
    let size = config.size.max(MIN_TOOL_SIZE);
    erase_disk(
        surface,
        point,
        size / 2.0,
        config.opacity.clamp(0.0, 1.0),
        config.hardness,
    );
}

/// Erase along `from`→`to` with dabs every `size / 8` pixels.
pub fn erase_between(surface: &mut RasterSurface, from: Point, to: Point, config: &EraserConfig) {
    let size = config.size.max(MIN_TOOL_SIZE);
    for p in step_points(from, to, size / 8.0) {
        erase_at(surface, p, config);
    }
}
