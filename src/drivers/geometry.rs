//! Pure geometry for line drawing.
//!
//! All functions here are pure and testable without any pixels or images.

use super::params::{LineParams, Point};

/// Integer points of a 1-pixel line from `from` to `to`, both ends included.
///
/// Classic all-octant Bresenham; the sequence always starts at `from`. The
/// error terms run in `i64`. Callers clip to the canvas first with
/// [`clip_to_canvas`], since the result holds every point of the segment.
pub fn bresenham(from: Point, to: Point) -> Vec<Point> {
    let (x1, y1) = (i64::from(to.x), i64::from(to.y));
    let dx = (x1 - i64::from(from.x)).abs();
    let dy = -(y1 - i64::from(from.y)).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };

    let mut points = Vec::new();
    let (mut x, mut y) = (i64::from(from.x), i64::from(from.y));
    let mut err = dx + dy;

    loop {
        points.push(Point::new(x as i32, y as i32));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    points
}

/// Part of the segment inside the closed rectangle `min..=max`, or `None`
/// when the segment misses it.
///
/// Liang-Barsky in `f64`. An endpoint already inside comes back unchanged.
pub fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, from.0 - min.0),
        (dx, max.0 - from.0),
        (-dy, from.1 - min.1),
        (dy, max.1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| {
        if t == 0.0 {
            from
        } else if t == 1.0 {
            to
        } else {
            (from.0 + t * dx, from.1 + t * dy)
        }
    };
    Some((at(t0), at(t1)))
}

/// Clip an integer segment to the pixels of a `width`x`height` canvas.
///
/// Clipped endpoints are rounded to the nearest pixel and always lie on the
/// canvas. `None` when nothing of the segment is visible.
pub fn clip_to_canvas(from: Point, to: Point, width: u32, height: u32) -> Option<(Point, Point)> {
    if width == 0 || height == 0 {
        return None;
    }
    let max = (f64::from(width) - 1.0, f64::from(height) - 1.0);
    let (a, b) = clip_segment(
        (f64::from(from.x), f64::from(from.y)),
        (f64::from(to.x), f64::from(to.y)),
        (0.0, 0.0),
        max,
    )?;
    let snap = |(x, y): (f64, f64)| {
        Point::new(
            x.round().clamp(0.0, max.0) as i32,
            y.round().clamp(0.0, max.1) as i32,
        )
    };
    Some((snap(a), snap(b)))
}

/// Unit vector perpendicular to the line, `(-dy/len, dx/len)`.
///
/// `len` is floored at 1.0, so a zero-length line yields `(0.0, 0.0)` instead
/// of dividing by zero.
pub fn perpendicular_unit(line: &LineParams) -> (f64, f64) {
    let dx = f64::from(line.to.x) - f64::from(line.from.x);
    let dy = f64::from(line.to.y) - f64::from(line.from.y);
    let len = (dx * dx + dy * dy).sqrt().max(1.0);
    (-dy / len, dx / len)
}

/// Endpoint displacements for the parallel-stroke approximation of a thick line.
///
/// Thickness 1 (or 0) gives the single undisplaced line. Otherwise
/// `half = (thickness - 1) / 2` and one displacement
/// `(round(ux*i), round(uy*i))` is produced per `i` in `-half..=half`, so the
/// result always has `2*half + 1` entries. Even thicknesses therefore round
/// down to the next odd count of strokes.
pub fn parallel_offsets(line: &LineParams) -> Vec<(i32, i32)> {
    if line.thickness <= 1 {
        return vec![(0, 0)];
    }

    let (ux, uy) = perpendicular_unit(line);
    let half = ((line.thickness - 1) / 2) as i32;

    (-half..=half)
        .map(|i| {
            let i = i as f64;
            ((ux * i).round() as i32, (uy * i).round() as i32)
        })
        .collect()
}

/// Footprint of a solid stroke of `thickness` pixels around the segment.
///
/// A pixel is covered when its perpendicular distance `d` from the segment
/// satisfies `-t/2 <= d <= (t-1)/2` and its projection falls between the two
/// endpoints (butt caps). The asymmetric bounds keep even thicknesses at
/// exactly `t` rows on axis-aligned lines. A zero-length segment covers a
/// `t`×`t` square.
#[derive(Debug, Clone, Copy)]
pub struct StrokeFootprint {
    origin: (f64, f64),
    dir: (f64, f64),
    normal: (f64, f64),
    length: f64,
    near: f64,
    far: f64,
}

const EPSILON: f64 = 1e-9;

impl StrokeFootprint {
    pub fn new(line: &LineParams) -> Self {
        let t = line.effective_thickness() as f64;
        let dx = f64::from(line.to.x) - f64::from(line.from.x);
        let dy = f64::from(line.to.y) - f64::from(line.from.y);
        let len = (dx * dx + dy * dy).sqrt();

        let near = -(t / 2.0).floor();
        let far = ((t - 1.0) / 2.0).floor();

        if len < EPSILON {
            return Self {
                origin: (line.from.x as f64, line.from.y as f64),
                dir: (1.0, 0.0),
                normal: (0.0, 1.0),
                length: 0.0,
                near,
                far,
            };
        }

        Self {
            origin: (line.from.x as f64, line.from.y as f64),
            dir: (dx / len, dy / len),
            normal: (-dy / len, dx / len),
            length: len,
            near,
            far,
        }
    }

    /// Inclusive pixel bounding box `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        let reach = self.near.abs().max(self.far.abs()).ceil() + 1.0;
        let end = (
            self.origin.0 + self.dir.0 * self.length,
            self.origin.1 + self.dir.1 * self.length,
        );
        let min_x = self.origin.0.min(end.0) - reach;
        let max_x = self.origin.0.max(end.0) + reach;
        let min_y = self.origin.1.min(end.1) - reach;
        let max_y = self.origin.1.max(end.1) + reach;
        (
            min_x.floor() as i32,
            min_y.floor() as i32,
            max_x.ceil() as i32,
            max_y.ceil() as i32,
        )
    }

    pub fn covers(&self, x: i32, y: i32) -> bool {
        let px = x as f64 - self.origin.0;
        let py = y as f64 - self.origin.1;
        let along = px * self.dir.0 + py * self.dir.1;
        let across = px * self.normal.0 + py * self.normal.1;

        let (along_min, along_max) = if self.length == 0.0 {
            (self.near, self.far)
        } else {
            (0.0, self.length)
        };

        along >= along_min - EPSILON
            && along <= along_max + EPSILON
            && across >= self.near - EPSILON
            && across <= self.far + EPSILON
    }
}
