//! Text layout and glyph rasterization with rusttype.

use inkboard_core::shapes::Text;
use rusttype::{Font, Scale, point as rt_point};
use tiny_skia::{Color, Paint, Pixmap, PremultipliedColorU8, Rect, Transform};

/// Horizontal shear applied to italic glyphs, per pixel above the baseline.
const ITALIC_SHEAR: f32 = 0.2;

/// Width of `line` when laid out at `scale`.
pub(crate) fn advance(font: &Font<'_>, scale: Scale, line: &str) -> f32 {
    font.layout(line, scale, rt_point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Split text into rows, breaking at spaces when a row would exceed `max_width`.
pub(crate) fn wrap_lines(font: &Font<'_>, scale: Scale, text: &str, max_width: Option<f32>) -> Vec<String> {
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let Some(max_width) = max_width.filter(|w| *w > 0.0) else {
            rows.push(line.to_string());
            continue;
        };
        let mut current = String::new();
        for word in line.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if current.is_empty() || advance(font, scale, &candidate) <= max_width {
                current = candidate;
            } else {
                rows.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        rows.push(current);
    }
    rows
}

/// Source-over blend of `color` at `coverage` into one premultiplied pixel.
fn blend(dst: PremultipliedColorU8, color: [u8; 4], coverage: f32) -> PremultipliedColorU8 {
    let sa = f32::from(color[3]) / 255.0 * coverage.clamp(0.0, 1.0);
    let inv = 1.0 - sa;
    let mix = |src: u8, dst: u8| (f32::from(src) * sa + f32::from(dst) * inv).round() as u8;
    let alpha = (sa * 255.0 + f32::from(dst.alpha()) * inv).round() as u8;
    PremultipliedColorU8::from_rgba(
        mix(color[0], dst.red()),
        mix(color[1], dst.green()),
        mix(color[2], dst.blue()),
        alpha,
    )
    .unwrap_or(dst)
}

/// Rasterize a text node into a pixmap in node-local coordinates.
///
/// Returns `None` for text that covers no pixels.
pub(crate) fn rasterize_text(font: &Font<'_>, text: &Text, color: [u8; 4]) -> Option<Pixmap> {
    let size = text.font_size as f32;
    let scale = Scale::uniform(size);
    let line_height = text.line_height() as f32;
    let rows = wrap_lines(font, scale, &text.text, text.width.map(|w| w as f32));

    let widest = rows.iter().map(|r| advance(font, scale, r)).fold(0.0, f32::max);
    let width = text.width.map_or(widest, |w| (w as f32).max(widest));
    let height = rows.len() as f32 * line_height;
    // Room for the italic lean and the bold offset.
    let mut pixmap = Pixmap::new((width + size * 0.5).ceil() as u32, height.ceil() as u32)?;

    let ascent = font.v_metrics(scale).ascent;
    let bold_offset = if text.font_style.is_bold() { (size / 20.0).max(1.0) } else { 0.0 };
    let shear = if text.font_style.is_italic() { ITALIC_SHEAR } else { 0.0 };
    let (pw, ph) = (pixmap.width() as i32, pixmap.height() as i32);

    for (row, line) in rows.iter().enumerate() {
        let baseline = row as f32 * line_height + ascent;
        let passes: &[f32] = if bold_offset > 0.0 { &[0.0, bold_offset] } else { &[0.0] };
        for &pass in passes {
            for glyph in font.layout(line, scale, rt_point(pass, baseline)) {
                let Some(bb) = glyph.pixel_bounding_box() else {
                    continue;
                };
                let pixels = pixmap.pixels_mut();
                glyph.draw(|gx, gy, v| {
                    let py = gy as i32 + bb.min.y;
                    let lean = ((baseline - py as f32) * shear).round() as i32;
                    let px = gx as i32 + bb.min.x + lean;
                    if px >= 0 && py >= 0 && px < pw && py < ph {
                        let idx = (py * pw + px) as usize;
                        pixels[idx] = blend(pixels[idx], color, v);
                    }
                });
            }
        }

        let decoration = text.text_decoration;
        if decoration.has_underline() || decoration.has_line_through() {
            let mut paint = Paint::default();
            paint.set_color(Color::from_rgba8(color[0], color[1], color[2], color[3]));
            let thickness = (size / 15.0).max(1.0);
            let line_width = advance(font, scale, line) + bold_offset;
            let mut offsets = Vec::new();
            if decoration.has_underline() {
                offsets.push(baseline + size * 0.1);
            }
            if decoration.has_line_through() {
                offsets.push(baseline - ascent * 0.35);
            }
            for y in offsets {
                if let Some(rect) = Rect::from_xywh(0.0, y, line_width, thickness) {
                    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
        }
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_full_coverage_replaces() {
        let dst = PremultipliedColorU8::from_rgba(0, 0, 0, 0).unwrap();
        let out = blend(dst, [255, 0, 0, 255], 1.0);
        assert_eq!((out.red(), out.green(), out.alpha()), (255, 0, 255));
    }

    #[test]
    fn test_blend_partial_coverage() {
        let dst = PremultipliedColorU8::from_rgba(0, 0, 255, 255).unwrap();
        let out = blend(dst, [255, 0, 0, 255], 0.5);
        assert_eq!(out.alpha(), 255);
        assert!(out.red() > 100 && out.blue() > 100);
    }

    #[test]
    fn test_blend_zero_coverage_keeps_destination() {
        let dst = PremultipliedColorU8::from_rgba(10, 20, 30, 40).unwrap();
        assert_eq!(blend(dst, [255, 255, 255, 255], 0.0), dst);
    }
}
