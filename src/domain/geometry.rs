//! Geometric types for detected code locations

use serde::{Deserialize, Serialize};

/// A point in pixel coordinates of the decoded buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The four boundary points of a located QR symbol, clockwise from top-left
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Corners {
    /// Build from points ordered top-left, top-right, bottom-right, bottom-left
    pub fn from_clockwise(points: [Point; 4]) -> Self {
        Self {
            top_left: points[0],
            top_right: points[1],
            bottom_right: points[2],
            bottom_left: points[3],
        }
    }

    /// Corners in drawing order (TL, TR, BR, BL)
    pub fn points(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Shape checks used to validate decoder output in tests
#[cfg(test)]
impl Corners {
    /// Average of the four corners
    pub fn center(&self) -> (f32, f32) {
        let pts = self.points();
        let cx = pts.iter().map(|p| p.x as f32).sum::<f32>() / 4.0;
        let cy = pts.iter().map(|p| p.y as f32).sum::<f32>() / 4.0;
        (cx, cy)
    }

    /// Whether the quadrilateral's edges only meet at shared corners
    pub fn is_simple(&self) -> bool {
        let [a, b, c, d] = self.points();
        // Only opposite edges can cross in a four-sided polygon
        !segments_intersect(a, b, c, d) && !segments_intersect(b, c, d, a)
    }

    /// Whether `(x, y)` lies inside the quadrilateral (convex outline assumed)
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let pts = self.points();
        let mut sign = 0.0f32;
        for i in 0..4 {
            let p = pts[i];
            let q = pts[(i + 1) % 4];
            let cross = (q.x - p.x) as f32 * (y - p.y as f32) - (q.y - p.y) as f32 * (x - p.x as f32);
            if cross == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
fn orientation(p: Point, q: Point, r: Point) -> i64 {
    let v = (q.x as i64 - p.x as i64) * (r.y as i64 - p.y as i64)
        - (q.y as i64 - p.y as i64) * (r.x as i64 - p.x as i64);
    v.signum()
}

#[cfg(test)]
fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x >= p.x.min(r.x) && q.x <= p.x.max(r.x) && q.y >= p.y.min(r.y) && q.y <= p.y.max(r.y)
}

#[cfg(test)]
fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let o1 = orientation(p1, p2, p3);
    let o2 = orientation(p1, p2, p4);
    let o3 = orientation(p3, p4, p1);
    let o4 = orientation(p3, p4, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(p1, p3, p2))
        || (o2 == 0 && on_segment(p1, p4, p2))
        || (o3 == 0 && on_segment(p3, p1, p4))
        || (o4 == 0 && on_segment(p3, p2, p4))
}
