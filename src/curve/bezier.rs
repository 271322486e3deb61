#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Edge curvature after clamping, plus the absolute control point it implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedCurve {
    pub curve_x: f32,
    pub curve_y: f32,
    pub control_x: f32,
    pub control_y: f32,
}

impl BoundedCurve {
    pub fn control(&self) -> Point {
        Point::new(self.control_x, self.control_y)
    }
}

/// Clamp a control-point offset so the control point stays inside the box
/// spanned by `source` and `target`.
///
/// The offset is measured from the segment midpoint. Each axis is clamped on
/// its own, so dragging far past a corner pins the point to that corner.
pub fn bounded_curve(source: Point, target: Point, raw_x: f32, raw_y: f32) -> BoundedCurve {
    let mid_x = source.x + (target.x - source.x) / 2.0;
    let mid_y = source.y + (target.y - source.y) / 2.0;

    let (min_x, max_x) = (source.x.min(target.x), source.x.max(target.x));
    let (min_y, max_y) = (source.y.min(target.y), source.y.max(target.y));

    // NaN offsets collapse to the midpoint
    let raw_x = if raw_x.is_nan() { 0.0 } else { raw_x };
    let raw_y = if raw_y.is_nan() { 0.0 } else { raw_y };

    let control_x = (mid_x + raw_x).clamp(min_x, max_x);
    let control_y = (mid_y + raw_y).clamp(min_y, max_y);

    BoundedCurve {
        curve_x: control_x - mid_x,
        curve_y: control_y - mid_y,
        control_x,
        control_y,
    }
}
