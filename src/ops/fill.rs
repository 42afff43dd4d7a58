// ============================================================================
// FLOOD FILL — 8-connected region recolouring
// ============================================================================

use crate::canvas::{Point, RasterSurface};
use crate::components::tools::FillConfig;

/// Pixels with alpha below this count as "fully transparent" for matching.
pub const TRANSPARENT_ALPHA_THRESHOLD: u8 = 10;

/// What a fill touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FillOutcome {
    pub filled: usize,
    /// Inclusive `(min_x, min_y, max_x, max_y)` of the filled region.
    pub bounds: Option<(u32, u32, u32, u32)>,
}

/// Colour-similarity predicate.
///
/// * both nearly transparent → match
/// * exactly one nearly transparent → no match
/// * otherwise the summed absolute RGBA difference must be `≤ tolerance × 4`
pub fn colors_match(a: [u8; 4], b: [u8; 4], tolerance: u8) -> bool {
    let a_clear = a[3] < TRANSPARENT_ALPHA_THRESHOLD;
    let b_clear = b[3] < TRANSPARENT_ALPHA_THRESHOLD;
    if a_clear && b_clear {
        return true;
    }
    if a_clear != b_clear {
        return false;
    }
    let diff: u32 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs())
        .sum();
    diff <= tolerance as u32 * 4
}

/// Recolour the 8-connected region around `point` whose pixels match the
/// seed colour. Filled pixels take the fill colour at full alpha.
/// Seeds outside the surface do nothing.
pub fn flood_fill(surface: &mut RasterSurface, point: Point, config: &FillConfig) -> FillOutcome {
    let (sx, sy) = point.pixel();
    let Some(target) = surface.get_pixel(sx, sy) else {
        return FillOutcome::default();
    };

    let w = surface.width() as usize;
    let h = surface.height() as usize;
    let target = target.0;
    let tol = config.tolerance;
    let fill = [config.color[0], config.color[1], config.color[2], 255];

    let (mask, outcome) = {
        let flat = surface.as_raw();
        region_mask(flat, w, h, sx as usize, sy as usize, target, tol)
    };

    if outcome.filled > 0 {
        let raw = surface.as_raw_mut();
        for (px, &m) in raw.chunks_exact_mut(4).zip(mask.iter()) {
            if m != 0 {
                px.copy_from_slice(&fill);
            }
        }
    }
    outcome
}

/// DFS over packed flat indices; the mask doubles as the visited set.
fn region_mask(
    flat: &[u8],
    w: usize,
    h: usize,
    sx: usize,
    sy: usize,
    target: [u8; 4],
    tol: u8,
) -> (Vec<u8>, FillOutcome) {
    #[inline(always)]
    fn pix(flat: &[u8], idx: usize) -> [u8; 4] {
        let o = idx * 4;
        [flat[o], flat[o + 1], flat[o + 2], flat[o + 3]]
    }

    let mut mask = vec![0u8; w * h];
    let seed = sy * w + sx;
    if !colors_match(pix(flat, seed), target, tol) {
        return (mask, FillOutcome::default());
    }

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (sx, sy, sx, sy);
    let mut filled = 0usize;

    // Flat index = y * w + x; canvas is capped at 4000×4000 so it fits in u32.
    let mut stack: Vec<u32> = Vec::with_capacity(4096);
    mask[seed] = 255;
    stack.push(seed as u32);

    while let Some(idx) = stack.pop() {
        let idx = idx as usize;
        let x = idx % w;
        let y = idx / w;
        filled += 1;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if mask[n] == 0 && colors_match(pix(flat, n), target, tol) {
                    mask[n] = 255;
                    stack.push(n as u32);
                }
            }
        }
    }

    let outcome = FillOutcome {
        filled,
        bounds: Some((min_x as u32, min_y as u32, max_x as u32, max_y as u32)),
    };
    (mask, outcome)
}
