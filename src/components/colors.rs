use image::{Rgb, Rgba};

/// Parse `#rrggbb` or the short `#rgb` form (leading `#` optional).
/// Returns `None` for anything else so callers can keep their previous colour.
pub fn parse_hex_color(s: &str) -> Option<Rgb<u8>> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb([r, g, b]))
        }
        3 => {
            // #abc → #aabbcc
            let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Rgb([nibble(0)?, nibble(1)?, nibble(2)?]))
        }
        _ => None,
    }
}

/// Lower-case `#rrggbb`.
pub fn to_hex(color: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Opaque RGBA version of an RGB colour.
pub fn opaque(color: Rgb<u8>) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}
