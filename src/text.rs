use ab_glyph::{Font, FontArc, ScaleFont};

use crate::{color::Rgba8, model::Alignment, surface::Surface};

/// Measured pixel width of a single line at the given size.
pub fn measure_width(font: &FontArc, size: f32, text: &str) -> f64 {
    let scaled = font.as_scaled(size);
    let mut width = 0.0f32;
    for ch in text.chars() {
        width += scaled.h_advance(font.glyph_id(ch));
    }
    f64::from(width)
}

/// Line height (ascent to descent) at the given size.
pub fn line_height(font: &FontArc, size: f32) -> f64 {
    let scaled = font.as_scaled(size);
    f64::from(scaled.ascent() - scaled.descent())
}

/// Shifts the draw origin so the measured text honors the alignment within
/// the available width.
pub fn aligned_x(alignment: Alignment, x: f64, available_width: f64, text_width: f64) -> f64 {
    match alignment {
        Alignment::Left => x,
        Alignment::Center => x + (available_width - text_width) / 2.0,
        Alignment::Right => x + available_width - text_width,
    }
}

/// Greedy word wrap: whitespace-delimited words packed into lines whose
/// measured width stays within `available_width`. A word that alone exceeds
/// the width still gets its own (overflowing) line.
pub fn wrap_words(text: &str, available_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) <= available_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(current);
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Rasterizes one line with its top-left corner at (x, y).
///
/// Glyph coverage is blended straight onto the surface, so edges stay
/// anti-aliased against whatever is already drawn.
pub fn draw_text(
    surface: &mut Surface,
    font: &FontArc,
    size: f32,
    x: f64,
    y: f64,
    text: &str,
    color: Rgba8,
) {
    let scaled = font.as_scaled(size);
    let baseline = y as f32 + scaled.ascent();
    let mut caret = x as f32;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(size, ab_glyph::point(caret, baseline));
        caret += scaled.h_advance(glyph_id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                surface.blend_coverage(
                    i64::from(gx) + bounds.min.x as i64,
                    i64::from(gy) + bounds.min.y as i64,
                    color,
                    coverage,
                );
            });
        }
    }
}

/// Rasterizes one line centered on (cx, cy), for graph point labels.
pub fn draw_text_centered(
    surface: &mut Surface,
    font: &FontArc,
    size: f32,
    cx: f64,
    cy: f64,
    text: &str,
    color: Rgba8,
) {
    let width = measure_width(font, size, text);
    let height = line_height(font, size);
    draw_text(
        surface,
        font,
        size,
        cx - width / 2.0,
        cy - height / 2.0,
        text,
        color,
    );
}
