use crate::model::{Axis, Bounds};

/// Linear data-space to pixel-space interpolation.
///
/// `invert` flips the extent direction for vertical axes, where `origin` is
/// the bottom edge of the bounds and larger data values map to smaller
/// pixel y. A degenerate axis (`max == min`) collapses to `origin` for the
/// horizontal case and to the vertical midpoint (`origin - extent/2`) for
/// the inverted case instead of dividing by zero.
pub fn to_pixel(value: f64, min: f64, max: f64, origin: f64, extent: f64, invert: bool) -> f64 {
    if max == min {
        return if invert { origin - extent / 2.0 } else { origin };
    }
    let frac = (value - min) / (max - min);
    if invert {
        origin - frac * extent
    } else {
        origin + frac * extent
    }
}

/// Pixel frame for one graph-type field: resolved bounds plus both axes.
///
/// Every graph renderer maps through this so the degenerate-axis policy is
/// applied identically across encodings. Out-of-range values map linearly
/// past the bounds; the surface clips at pixel level.
#[derive(Clone, Copy, Debug)]
pub struct GraphFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub x_axis: Axis,
    pub y_axis: Axis,
}

impl GraphFrame {
    pub fn new(
        bounds: &Bounds,
        x_axis: Option<Axis>,
        y_axis: Option<Axis>,
        y_axis_default: Axis,
    ) -> Self {
        Self {
            left: bounds.x,
            top: bounds.y,
            width: bounds.width_or(100.0),
            height: bounds.height_or(100.0),
            x_axis: x_axis.unwrap_or_default(),
            y_axis: y_axis.unwrap_or(y_axis_default),
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Time to pixel x.
    pub fn x(&self, time: f64) -> f64 {
        to_pixel(
            time,
            self.x_axis.min,
            self.x_axis.max,
            self.left,
            self.width,
            false,
        )
    }

    /// Value to pixel y (inverted: larger values sit higher on the form).
    pub fn y(&self, value: f64) -> f64 {
        to_pixel(
            value,
            self.y_axis.min,
            self.y_axis.max,
            self.bottom(),
            self.height,
            true,
        )
    }

    /// Bar height in pixels for a value, anchored at the bottom edge.
    /// A degenerate y axis yields a zero-height bar.
    pub fn bar_height(&self, value: f64) -> f64 {
        if self.y_axis.max == self.y_axis.min {
            return 0.0;
        }
        (value - self.y_axis.min) / (self.y_axis.max - self.y_axis.min) * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> GraphFrame {
        GraphFrame {
            left: 10.0,
            top: 20.0,
            width: 100.0,
            height: 50.0,
            x_axis: Axis::new(0.0, 24.0),
            y_axis: Axis::new(40.0, 180.0),
        }
    }

    #[test]
    fn linear_mapping_endpoints() {
        let f = frame();
        assert_eq!(f.x(0.0), 10.0);
        assert_eq!(f.x(24.0), 110.0);
        assert_eq!(f.y(40.0), 70.0);
        assert_eq!(f.y(180.0), 20.0);
    }

    #[test]
    fn degenerate_x_collapses_to_left_edge() {
        let mut f = frame();
        f.x_axis = Axis::new(5.0, 5.0);
        assert_eq!(f.x(0.0), 10.0);
        assert_eq!(f.x(5.0), 10.0);
        assert_eq!(f.x(1000.0), 10.0);
    }

    #[test]
    fn degenerate_y_collapses_to_vertical_midpoint() {
        let mut f = frame();
        f.y_axis = Axis::new(80.0, 80.0);
        // top + height/2
        assert_eq!(f.y(80.0), 45.0);
        assert_eq!(f.y(-10.0), 45.0);
    }

    #[test]
    fn out_of_range_values_map_linearly_past_bounds() {
        let f = frame();
        assert!(f.x(48.0) > f.left + f.width);
        assert!(f.y(320.0) < f.top);
    }

    #[test]
    fn degenerate_bar_height_is_zero() {
        let mut f = frame();
        f.y_axis = Axis::new(1.0, 1.0);
        assert_eq!(f.bar_height(1.0), 0.0);
    }

    #[test]
    fn to_pixel_degenerate_without_invert_is_origin() {
        assert_eq!(to_pixel(7.0, 3.0, 3.0, 42.0, 90.0, false), 42.0);
    }
}
