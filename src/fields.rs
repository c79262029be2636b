use serde_json::Value;

use crate::{
    axis::GraphFrame,
    error::{FormfillError, FormfillResult},
    fonts::{DEFAULT_FAMILY, FontLibrary},
    model::{Axis, Field, FieldKind, MarkType},
    resolve::{display_value, truthy},
    surface::Surface,
    text,
};

/// Renders one field's resolved value onto the surface.
///
/// Renderers only draw; data fetch happens upstream. An error from any
/// renderer is captured at the dispatch boundary by the compositor and never
/// aborts the remaining fields.
pub fn render_field(
    field: &Field,
    value: &Value,
    surface: &mut Surface,
    fonts: &FontLibrary,
) -> FormfillResult<()> {
    match field.kind {
        FieldKind::Text => render_text(field, value, surface, fonts),
        FieldKind::MultilineText => render_multiline_text(field, value, surface, fonts),
        FieldKind::Checkbox => render_checkbox(field, value, surface),
        FieldKind::LineGraph => render_line_graph(field, value, surface),
        FieldKind::BarGraph => render_bar_graph(field, value, surface),
        FieldKind::DotSeries => render_dot_series(field, value, surface, fonts),
        FieldKind::BpLadder => render_bp_ladder(field, value, surface),
        // Skipped with a warning by the compositor before dispatch.
        FieldKind::Unknown => Ok(()),
    }
}

fn render_text(
    field: &Field,
    value: &Value,
    surface: &mut Surface,
    fonts: &FontLibrary,
) -> FormfillResult<()> {
    let style = &field.style;
    let pad = style.padding;
    let x = field.bounds.x + pad.left;
    let y = field.bounds.y + pad.top;
    let available_width = field.bounds.width_or(100.0) - pad.left - pad.right;

    let font = fonts.get(&style.font_family, style.bold).ok_or_else(|| {
        FormfillError::field(format!("no usable font for family '{}'", style.font_family))
    })?;

    let line = display_value(value);
    let text_width = text::measure_width(font, style.font_size, &line);
    let x = text::aligned_x(style.alignment, x, available_width, text_width);

    text::draw_text(
        surface,
        font,
        style.font_size,
        x,
        y,
        &line,
        style.color_or("#000000"),
    );
    tracing::debug!(field = %field.id, x, y, "rendered text");
    Ok(())
}

fn render_multiline_text(
    field: &Field,
    value: &Value,
    surface: &mut Surface,
    fonts: &FontLibrary,
) -> FormfillResult<()> {
    let style = &field.style;
    let pad = style.padding;
    let x = field.bounds.x + pad.left;
    let y = field.bounds.y + pad.top;
    let available_width = field.bounds.width_or(200.0) - pad.left - pad.right;
    let available_height = field.bounds.height_or(60.0) - pad.top - pad.bottom;

    // A zero-row box truncates everything away.
    let rows = style.text_rows;
    if rows == 0 {
        return Ok(());
    }
    let row_height = available_height / f64::from(rows);
    // Font size tracks the row budget, independent of any style override.
    let font_size = ((row_height * 0.8) as f32).clamp(6.0, 72.0);

    let font = fonts.get(&style.font_family, style.bold).ok_or_else(|| {
        FormfillError::field(format!("no usable font for family '{}'", style.font_family))
    })?;

    let body = display_value(value);
    let mut lines = text::wrap_words(&body, available_width, |s| {
        text::measure_width(font, font_size, s)
    });
    lines.truncate(rows as usize);

    let color = style.color_or("#000000");
    for (i, line) in lines.iter().enumerate() {
        let line_width = text::measure_width(font, font_size, line);
        let line_x = text::aligned_x(style.alignment, x, available_width, line_width);
        let line_y = y + i as f64 * row_height;
        text::draw_text(surface, font, font_size, line_x, line_y, line, color);
    }
    tracing::debug!(field = %field.id, lines = lines.len(), "rendered multiline text");
    Ok(())
}

fn render_checkbox(field: &Field, value: &Value, surface: &mut Surface) -> FormfillResult<()> {
    // Unchecked boxes are invisible, not drawn-empty.
    if !truthy(value) {
        return Ok(());
    }

    let style = &field.style;
    let pad = style.padding;
    let x = field.bounds.x + pad.left;
    let y = field.bounds.y + pad.top;
    let w = field.bounds.width_or(20.0) - pad.left - pad.right;
    let h = field.bounds.height_or(20.0) - pad.top - pad.bottom;

    let color = style.color_or("#000000");
    let stroke = (w.min(h) / 6.0).floor().max(1.0);

    match style.mark_type {
        MarkType::X => {
            surface.line(x, y, x + w, y + h, stroke, color);
            surface.line(x, y + h, x + w, y, stroke, color);
        }
        MarkType::Check => {
            surface.line(x, y + h * 0.5, x + w * 0.3, y + h, stroke, color);
            surface.line(x + w * 0.3, y + h, x + w, y, stroke, color);
        }
        MarkType::Fill => {
            surface.fill_rect(x, y, x + w, y + h, color);
        }
    }
    tracing::debug!(field = %field.id, x, y, w, h, "rendered checkbox");
    Ok(())
}

fn render_line_graph(field: &Field, value: &Value, surface: &mut Surface) -> FormfillResult<()> {
    let Some(points) = value.as_array() else {
        return Ok(());
    };
    let style = &field.style;
    let frame = GraphFrame::new(&field.bounds, field.x_axis, field.y_axis, Axis::default());
    let color = style.color_or("#FF0000");

    // Null-valued points drop out of both segments and dots, without
    // breaking the polyline between their non-null neighbors.
    let mut pixels: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for point in points {
        let t = member_or(point, "time", 0.0);
        let Some(v) = member(point, "value") else {
            continue;
        };
        pixels.push((frame.x(t), frame.y(v)));
    }

    if style.connect_points {
        for pair in pixels.windows(2) {
            surface.line(
                pair[0].0,
                pair[0].1,
                pair[1].0,
                pair[1].1,
                style.line_width,
                color,
            );
        }
    }
    if style.show_dots {
        for &(px, py) in &pixels {
            surface.fill_circle(px, py, style.dot_radius, color);
        }
    }
    tracing::debug!(field = %field.id, points = pixels.len(), "rendered line graph");
    Ok(())
}

fn render_bar_graph(field: &Field, value: &Value, surface: &mut Surface) -> FormfillResult<()> {
    let Some(points) = value.as_array() else {
        return Ok(());
    };
    let style = &field.style;
    let frame = GraphFrame::new(&field.bounds, field.x_axis, field.y_axis, Axis::default());
    let color = style.color_or("#0000FF");
    let half = style.bar_width / 2.0;

    for point in points {
        let t = member_or(point, "time", 0.0);
        let Some(v) = member(point, "value") else {
            continue;
        };
        let px = frame.x(t);
        let bar_height = frame.bar_height(v);
        surface.fill_rect(
            px - half,
            frame.bottom() - bar_height,
            px + half,
            frame.bottom(),
            color,
        );
    }
    tracing::debug!(field = %field.id, bars = points.len(), "rendered bar graph");
    Ok(())
}

fn render_dot_series(
    field: &Field,
    value: &Value,
    surface: &mut Surface,
    fonts: &FontLibrary,
) -> FormfillResult<()> {
    let Some(points) = value.as_array() else {
        return Ok(());
    };
    let style = &field.style;
    let frame = GraphFrame::new(&field.bounds, field.x_axis, field.y_axis, Axis::default());
    let row_y = field.bounds.y;
    let color = style.color_or("#000000");

    for point in points {
        let t = member_or(point, "time", 0.0);
        let px = frame.x(t);
        surface.fill_circle(px, row_y, style.dot_radius, color);

        // Any truthy label renders; non-strings are formatted like text
        // field values.
        if let Some(label) = dot_label(point) {
            match fonts.get(DEFAULT_FAMILY, false) {
                Some(font) => text::draw_text_centered(
                    surface,
                    font,
                    8.0,
                    px,
                    row_y - style.dot_radius - 12.0,
                    &label,
                    color,
                ),
                None => tracing::debug!(field = %field.id, "no font for dot label, skipped"),
            }
        }
    }
    tracing::debug!(field = %field.id, dots = points.len(), "rendered dot series");
    Ok(())
}

fn render_bp_ladder(field: &Field, value: &Value, surface: &mut Surface) -> FormfillResult<()> {
    let Some(points) = value.as_array() else {
        return Ok(());
    };
    let style = &field.style;
    let frame = GraphFrame::new(
        &field.bounds,
        field.x_axis,
        field.y_axis,
        Axis::new(40.0, 200.0),
    );
    let color = style.color_or("#FF0000");
    let m = style.marker_size;

    for point in points {
        // Both readings required; a half-populated point draws nothing.
        let (Some(systolic), Some(diastolic)) =
            (member(point, "systolic"), member(point, "diastolic"))
        else {
            continue;
        };
        let t = member_or(point, "time", 0.0);

        let px = frame.x(t);
        let py_sys = frame.y(systolic);
        let py_dia = frame.y(diastolic);

        surface.line(px, py_sys, px, py_dia, style.line_width, color);
        // Systolic points down at the reading, diastolic points up.
        surface.fill_triangle(
            (px, py_sys + m),
            (px - m, py_sys - m),
            (px + m, py_sys - m),
            color,
        );
        surface.fill_triangle(
            (px, py_dia - m),
            (px - m, py_dia + m),
            (px + m, py_dia + m),
            color,
        );
    }
    tracing::debug!(field = %field.id, readings = points.len(), "rendered bp ladder");
    Ok(())
}

fn dot_label(point: &Value) -> Option<String> {
    let label = point.get("label")?;
    truthy(label).then(|| display_value(label))
}

fn member(point: &Value, key: &str) -> Option<f64> {
    point.get(key).and_then(Value::as_f64)
}

fn member_or(point: &Value, key: &str, default: f64) -> f64 {
    member(point, key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontConfig;
    use crate::model::{Bounds, Style};
    use serde_json::json;

    fn field(kind: FieldKind, bounds: Bounds) -> Field {
        Field {
            id: "f".to_string(),
            kind,
            bounds,
            style: Style::default(),
            data_path: None,
            mandatory: false,
            x_axis: None,
            y_axis: None,
        }
    }

    fn bounds(x: f64, y: f64, w: f64, h: f64) -> Bounds {
        Bounds {
            x,
            y,
            width: Some(w),
            height: Some(h),
        }
    }

    fn empty_fonts() -> FontLibrary {
        FontLibrary::load(&FontConfig {
            families: Default::default(),
        })
    }

    fn marked(surface_img: &image::RgbaImage) -> usize {
        surface_img.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn unchecked_checkbox_draws_nothing() {
        let mut s = Surface::new(32, 32);
        let f = field(FieldKind::Checkbox, bounds(4.0, 4.0, 20.0, 20.0));
        render_checkbox(&f, &json!(false), &mut s).unwrap();
        render_checkbox(&f, &json!(null), &mut s).unwrap();
        render_checkbox(&f, &json!(0), &mut s).unwrap();
        assert_eq!(marked(&s.into_image()), 0);
    }

    #[test]
    fn fill_mark_covers_padded_bounds() {
        let mut s = Surface::new(32, 32);
        let mut f = field(FieldKind::Checkbox, bounds(4.0, 4.0, 20.0, 20.0));
        f.style.mark_type = MarkType::Fill;
        f.style.padding.left = 2.0;
        f.style.padding.top = 2.0;
        render_checkbox(&f, &json!(true), &mut s).unwrap();
        let img = s.into_image();
        assert!(img.get_pixel(10, 10).0[3] > 0);
        assert_eq!(img.get_pixel(1, 1).0[3], 0);
        // Left of the padding-shifted origin stays clear.
        assert_eq!(img.get_pixel(5, 1).0[3], 0);
    }

    #[test]
    fn x_mark_touches_corners() {
        let mut s = Surface::new(32, 32);
        let f = field(FieldKind::Checkbox, bounds(4.0, 4.0, 20.0, 20.0));
        render_checkbox(&f, &json!(true), &mut s).unwrap();
        let img = s.into_image();
        assert!(img.get_pixel(4, 4).0[3] > 0);
        assert!(img.get_pixel(24, 4).0[3] > 0);
    }

    #[test]
    fn line_graph_connects_across_null_gap() {
        let mut s = Surface::new(120, 120);
        let mut f = field(FieldKind::LineGraph, bounds(0.0, 0.0, 100.0, 100.0));
        f.x_axis = Some(Axis::new(0.0, 100.0));
        f.y_axis = Some(Axis::new(0.0, 100.0));
        f.style.show_dots = false;
        f.style.line_width = 1.0;
        let data = json!([
            {"time": 0, "value": 50},
            {"time": 50, "value": null},
            {"time": 100, "value": 50}
        ]);
        render_line_graph(&f, &data, &mut s).unwrap();
        // With the null point dropped, the polyline runs straight across y=50.
        assert!(s.into_image().get_pixel(50, 50).0[3] > 0);
    }

    #[test]
    fn line_graph_non_array_is_silent() {
        let mut s = Surface::new(16, 16);
        let f = field(FieldKind::LineGraph, bounds(0.0, 0.0, 10.0, 10.0));
        render_line_graph(&f, &json!("nope"), &mut s).unwrap();
        assert_eq!(marked(&s.into_image()), 0);
    }

    #[test]
    fn bar_graph_anchors_at_bottom_edge() {
        let mut s = Surface::new(120, 120);
        let mut f = field(FieldKind::BarGraph, bounds(0.0, 0.0, 100.0, 100.0));
        f.x_axis = Some(Axis::new(0.0, 100.0));
        f.y_axis = Some(Axis::new(0.0, 100.0));
        render_bar_graph(&f, &json!([{"time": 50, "value": 40}]), &mut s).unwrap();
        let img = s.into_image();
        assert!(img.get_pixel(50, 99).0[3] > 0);
        assert!(img.get_pixel(50, 80).0[3] > 0);
        // Above the bar top (y = 100 - 40) stays clear.
        assert_eq!(img.get_pixel(50, 40).0[3], 0);
    }

    #[test]
    fn dot_series_sits_on_fixed_row() {
        let mut s = Surface::new(120, 60);
        let mut f = field(FieldKind::DotSeries, bounds(0.0, 30.0, 100.0, 10.0));
        f.x_axis = Some(Axis::new(0.0, 100.0));
        render_dot_series(
            &f,
            &json!([{"time": 0}, {"time": 100}]),
            &mut s,
            &empty_fonts(),
        )
        .unwrap();
        let img = s.into_image();
        assert!(img.get_pixel(0, 30).0[3] > 0);
        assert!(img.get_pixel(100, 30).0[3] > 0);
    }

    #[test]
    fn line_graph_tolerates_wildly_out_of_range_values() {
        let mut s = Surface::new(100, 100);
        let mut f = field(FieldKind::LineGraph, bounds(0.0, 0.0, 100.0, 100.0));
        f.x_axis = Some(Axis::new(0.0, 100.0));
        f.y_axis = Some(Axis::new(0.0, 100.0));
        let data = json!([
            {"time": 0, "value": 50},
            {"time": 50, "value": 2.0e8}
        ]);
        render_line_graph(&f, &data, &mut s).unwrap();
        // The in-range point keeps its dot; the runaway segment clips at
        // the canvas edge instead of walking to the mapped coordinate.
        assert!(s.into_image().get_pixel(0, 50).0[3] > 0);
    }

    #[test]
    fn dot_labels_accept_any_truthy_value() {
        assert_eq!(dot_label(&json!({"label": "seen"})).as_deref(), Some("seen"));
        assert_eq!(dot_label(&json!({"label": 5})).as_deref(), Some("5"));
        assert_eq!(dot_label(&json!({"label": 0})), None);
        assert_eq!(dot_label(&json!({"label": ""})), None);
        assert_eq!(dot_label(&json!({"label": null})), None);
        assert_eq!(dot_label(&json!({"time": 1})), None);
    }

    #[test]
    fn zero_text_rows_renders_nothing() {
        let mut s = Surface::new(64, 64);
        let mut f = field(FieldKind::MultilineText, bounds(0.0, 0.0, 60.0, 40.0));
        f.style.text_rows = 0;
        render_multiline_text(&f, &json!("should vanish"), &mut s, &empty_fonts()).unwrap();
        assert_eq!(marked(&s.into_image()), 0);
    }

    #[test]
    fn bp_ladder_skips_half_populated_points() {
        let mut s = Surface::new(120, 120);
        let mut f = field(FieldKind::BpLadder, bounds(0.0, 0.0, 100.0, 100.0));
        f.x_axis = Some(Axis::new(0.0, 100.0));
        f.y_axis = Some(Axis::new(0.0, 100.0));
        let data = json!([
            {"time": 10, "systolic": 80, "diastolic": 20},
            {"time": 50, "systolic": 80, "diastolic": null},
            {"time": 90, "systolic": 80, "diastolic": 20}
        ]);
        render_bp_ladder(&f, &data, &mut s).unwrap();
        let img = s.into_image();
        // Connector runs through mid-range y at the populated columns only.
        assert!(img.get_pixel(10, 50).0[3] > 0);
        assert!(img.get_pixel(90, 50).0[3] > 0);
        for y in 0..120 {
            assert_eq!(img.get_pixel(50, y).0[3], 0, "column 50 must stay clear");
        }
    }

    #[test]
    fn text_without_fonts_is_a_field_error() {
        let mut s = Surface::new(32, 32);
        let f = field(FieldKind::Text, bounds(0.0, 0.0, 30.0, 20.0));
        let err = render_field(&f, &json!("hello"), &mut s, &empty_fonts()).unwrap_err();
        assert!(matches!(err, FormfillError::Field(_)));
    }

    #[test]
    fn unknown_kind_is_a_noop() {
        let mut s = Surface::new(16, 16);
        let f = field(FieldKind::Unknown, bounds(0.0, 0.0, 10.0, 10.0));
        render_field(&f, &json!("x"), &mut s, &empty_fonts()).unwrap();
        assert_eq!(marked(&s.into_image()), 0);
    }
}
