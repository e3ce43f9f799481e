use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

const PARALLEL_EPSILON: f32 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    fn edges(&self) -> [(Point, Point); 4] {
        let tl = Point::new(self.x, self.y);
        let tr = Point::new(self.right(), self.y);
        let br = Point::new(self.right(), self.bottom());
        let bl = Point::new(self.x, self.bottom());
        [(tl, tr), (tr, br), (br, bl), (bl, tl)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

pub fn distance(p1: Point, p2: Point) -> f32 {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    (dx * dx + dy * dy).sqrt()
}

/// Angle of the vector `p1 -> p2` in radians, within `-PI..=PI`.
pub fn angle(p1: Point, p2: Point) -> f32 {
    (p2.y - p1.y).atan2(p2.x - p1.x)
}

pub fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let det = (a2.x - a1.x) * (b2.y - b1.y) - (a2.y - a1.y) * (b2.x - b1.x);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = ((b1.x - a1.x) * (b2.y - b1.y) - (b1.y - a1.y) * (b2.x - b1.x)) / det;
    let u = ((b1.x - a1.x) * (a2.y - a1.y) - (b1.y - a1.y) * (a2.x - a1.x)) / det;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some(Point::new(
        a1.x + t * (a2.x - a1.x),
        a1.y + t * (a2.y - a1.y),
    ))
}

/// Where the segment `line_start -> line_end` crosses the border of `rect`,
/// choosing the crossing nearest to `line_start`.
pub fn rect_boundary_intersection(line_start: Point, line_end: Point, rect: &Rect) -> Option<Point> {
    rect.edges()
        .iter()
        .filter_map(|(e1, e2)| segment_intersection(line_start, line_end, *e1, *e2))
        .min_by(|a, b| {
            distance(line_start, *a)
                .partial_cmp(&distance(line_start, *b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

pub fn regular_polygon_points(center: Point, radius: f32, sides: usize) -> Vec<Point> {
    if sides == 0 {
        return Vec::new();
    }
    let step = 2.0 * PI / sides as f32;
    (0..sides)
        .map(|i| {
            let theta = step * i as f32 - FRAC_PI_2;
            Point::new(center.x + radius * theta.cos(), center.y + radius * theta.sin())
        })
        .collect()
}

pub fn bounding_box(points: &[Point]) -> BoundingBox {
    let Some(first) = points.first() else {
        return BoundingBox::default();
    };
    let mut bbox = BoundingBox {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    for point in &points[1..] {
        bbox.min_x = bbox.min_x.min(point.x);
        bbox.min_y = bbox.min_y.min(point.y);
        bbox.max_x = bbox.max_x.max(point.x);
        bbox.max_y = bbox.max_y.max(point.y);
    }
    bbox
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}
