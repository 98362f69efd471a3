//! Pressure-sensitive stroke outlining.
//!
//! Turns a sampled polyline into a closed, variable-width polygon that the
//! renderer fills. The pipeline has two stages:
//!
//! 1. [`stroke_points`] smooths the raw samples (streamline), drops duplicate
//!    samples and records per-point direction and running length.
//! 2. [`outline`] offsets each smoothed point to both sides by a radius
//!    derived from (simulated) pressure, rounds sharp corners and adds round
//!    start and end caps. A stroke that collapses to one point becomes a dot.
//!
//! [`svg_path`] converts the polygon into a path of quadratic segments that
//! wraps from the last outline point back to the first.
//!
//! All inputs are expected in screen space: project through the camera and
//! scale `size` by zoom before calling.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use frames::Point as InkPoint;

use crate::camera::Point;
use crate::consts::{
    CAP_STEPS, END_CAP_STEPS, END_NOISE_THRESHOLD, FIXED_PI, MIN_RADIUS, PRESSURE_SEED_POINTS,
    RATE_OF_PRESSURE_CHANGE, SMOOTHING, STREAMLINE, THINNING,
};

/// Outline parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineOptions {
    /// Base diameter in screen pixels.
    pub size: f64,
    /// How strongly pressure narrows the stroke, `[0, 1]`.
    pub thinning: f64,
    /// Minimum spacing between outline points, as a fraction of `size`.
    pub smoothing: f64,
    /// How far each smoothed point trails its raw sample, `[0, 1]`.
    pub streamline: f64,
    /// Derive pressure from speed instead of trusting the samples.
    pub simulate_pressure: bool,
    /// Pin the final smoothed point to the final sample.
    pub complete: bool,
}

impl OutlineOptions {
    /// Session defaults at the given size.
    #[must_use]
    pub fn with_size(size: f64) -> Self {
        Self {
            size,
            thinning: THINNING,
            smoothing: SMOOTHING,
            streamline: STREAMLINE,
            simulate_pressure: true,
            complete: false,
        }
    }
}

/// A smoothed sample with its derived geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePoint {
    pub point: Point,
    pub pressure: f64,
    /// Unit vector pointing back toward the previous point.
    pub vector: Point,
    /// Distance from the previous point.
    pub distance: f64,
    /// Cumulative length up to and including this point.
    pub running_length: f64,
}

// =============================================================
// Vector helpers
// =============================================================

fn add(a: Point, b: Point) -> Point {
    Point::new(a.x + b.x, a.y + b.y)
}

fn sub(a: Point, b: Point) -> Point {
    Point::new(a.x - b.x, a.y - b.y)
}

fn mul(a: Point, n: f64) -> Point {
    Point::new(a.x * n, a.y * n)
}

fn neg(a: Point) -> Point {
    Point::new(-a.x, -a.y)
}

/// Perpendicular, rotated a quarter turn clockwise.
fn per(a: Point) -> Point {
    Point::new(a.y, -a.x)
}

fn dot(a: Point, b: Point) -> f64 {
    a.x * b.x + a.y * b.y
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    add(a, mul(sub(b, a), t))
}

fn unit(a: Point) -> Point {
    let len = a.x.hypot(a.y);
    if len > 0.0 { mul(a, 1.0 / len) } else { a }
}

fn dist2(a: Point, b: Point) -> f64 {
    let d = sub(a, b);
    d.x * d.x + d.y * d.y
}

fn rotate_around(p: Point, center: Point, radians: f64) -> Point {
    let (s, c) = radians.sin_cos();
    let d = sub(p, center);
    Point::new(d.x * c - d.y * s + center.x, d.x * s + d.y * c + center.y)
}

fn project(origin: Point, direction: Point, distance: f64) -> Point {
    add(origin, mul(direction, distance))
}

fn radius_for(size: f64, thinning: f64, pressure: f64) -> f64 {
    size * (0.5 - thinning * (0.5 - pressure))
}

fn simulated_pressure(prev: f64, distance: f64, size: f64) -> f64 {
    let speed = (distance / size).min(1.0);
    let rest = (1.0 - speed).min(1.0);
    (prev + (rest - prev) * (speed * RATE_OF_PRESSURE_CHANGE)).min(1.0)
}

// =============================================================
// Stage 1: smoothed points
// =============================================================

/// Smooth raw samples into [`StrokePoint`]s.
///
/// Two samples are interpolated into five so short strokes still get a
/// body; a single sample gets a synthetic neighbor one pixel away.
#[must_use]
pub fn stroke_points(samples: &[InkPoint], opts: &OutlineOptions) -> Vec<StrokePoint> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };
    let t = 0.15 + (1.0 - opts.streamline) * 0.85;

    let mut raw: Vec<(Point, f64)> = samples.iter().map(|p| (Point::new(p.x, p.y), p.pressure)).collect();
    if let &[(a, pa), (b, pb)] = raw.as_slice() {
        raw = (0..5)
            .map(|i| {
                let f = f64::from(i) / 4.0;
                (lerp(a, b, f), pa + (pb - pa) * f)
            })
            .collect();
    }
    if raw.len() == 1 {
        raw.push((add(raw[0].0, Point::new(1.0, 1.0)), first.pressure));
    }

    let mut out = vec![StrokePoint {
        point: raw[0].0,
        pressure: raw[0].1,
        vector: Point::new(1.0, 1.0),
        distance: 0.0,
        running_length: 0.0,
    }];
    let max = raw.len() - 1;
    let mut reached_min_length = false;
    let mut running_length = 0.0;
    let mut prev = out[0];

    for (i, &(target, pressure)) in raw.iter().enumerate().skip(1) {
        let point = if opts.complete && i == max { target } else { lerp(prev.point, target, t) };
        if point == prev.point {
            continue;
        }
        let distance = point.dist(prev.point);
        running_length += distance;
        if i < max && !reached_min_length {
            if running_length < opts.size {
                continue;
            }
            reached_min_length = true;
        }
        prev = StrokePoint { point, pressure, vector: unit(sub(prev.point, point)), distance, running_length };
        out.push(prev);
    }

    out[0].vector = out.get(1).map_or(Point::new(0.0, 0.0), |p| p.vector);
    out
}

// =============================================================
// Stage 2: outline polygon
// =============================================================

/// Closed outline polygon for `samples`. Empty for an empty stroke or a
/// non-positive size.
#[must_use]
pub fn outline(samples: &[InkPoint], opts: &OutlineOptions) -> Vec<Point> {
    if samples.is_empty() || opts.size.is_nan() || opts.size <= 0.0 {
        return Vec::new();
    }
    outline_from_points(&stroke_points(samples, opts), opts)
}

#[allow(clippy::too_many_lines)]
fn outline_from_points(points: &[StrokePoint], opts: &OutlineOptions) -> Vec<Point> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let size = opts.size;
    let total_length = last.running_length;
    let min_distance = (size * opts.smoothing).powi(2);

    let mut prev_pressure = points.iter().take(PRESSURE_SEED_POINTS).fold(first.pressure, |acc, p| {
        let pressure = if opts.simulate_pressure { simulated_pressure(acc, p.distance, size) } else { p.pressure };
        (acc + pressure) / 2.0
    });

    let mut left: Vec<Point> = Vec::new();
    let mut right: Vec<Point> = Vec::new();
    let mut radius = radius_for(size, opts.thinning, last.pressure);
    let mut first_radius: Option<f64> = None;
    let mut prev_vector = first.vector;
    let mut pl = first.point;
    let mut pr = first.point;
    let mut prev_was_sharp = false;

    for (i, sp) in points.iter().enumerate() {
        let is_last = i == points.len() - 1;
        if !is_last && total_length - sp.running_length < END_NOISE_THRESHOLD {
            continue;
        }

        let mut pressure = sp.pressure;
        if opts.thinning > 0.0 {
            if opts.simulate_pressure {
                pressure = simulated_pressure(prev_pressure, sp.distance, size);
            }
            radius = radius_for(size, opts.thinning, pressure);
        } else {
            radius = size / 2.0;
        }
        if first_radius.is_none() {
            first_radius = Some(radius);
        }
        radius = radius.max(MIN_RADIUS);

        let next_vector = points.get(i + 1).map_or(sp.vector, |p| p.vector);
        let next_dpr = if is_last { 1.0 } else { dot(sp.vector, next_vector) };
        let prev_dpr = dot(sp.vector, prev_vector);
        let sharp_here = prev_dpr < 0.0 && !prev_was_sharp;
        let sharp_next = next_dpr < 0.0;

        if sharp_here || sharp_next {
            let offset = mul(per(prev_vector), radius);
            let mut tl = pl;
            let mut tr = pr;
            for step in 0..=CAP_STEPS {
                let t = f64::from(step) / f64::from(CAP_STEPS);
                tl = rotate_around(sub(sp.point, offset), sp.point, FIXED_PI * t);
                tr = rotate_around(add(sp.point, offset), sp.point, -FIXED_PI * t);
                left.push(tl);
                right.push(tr);
            }
            pl = tl;
            pr = tr;
            if sharp_next {
                prev_was_sharp = true;
            }
            continue;
        }
        prev_was_sharp = false;

        if is_last {
            let offset = mul(per(sp.vector), radius);
            left.push(sub(sp.point, offset));
            right.push(add(sp.point, offset));
            continue;
        }

        let offset = mul(per(lerp(next_vector, sp.vector, next_dpr)), radius);
        let tl = sub(sp.point, offset);
        if i <= 1 || dist2(pl, tl) > min_distance {
            left.push(tl);
            pl = tl;
        }
        let tr = add(sp.point, offset);
        if i <= 1 || dist2(pr, tr) > min_distance {
            right.push(tr);
            pr = tr;
        }
        prev_pressure = pressure;
        prev_vector = sp.vector;
    }

    let first_point = first.point;

    if points.len() == 1 {
        let last_point = add(first_point, Point::new(1.0, 1.0));
        let r = first_radius.unwrap_or(radius);
        let start = project(first_point, unit(per(sub(first_point, last_point))), -r);
        return (1..=CAP_STEPS)
            .map(|step| rotate_around(start, first_point, FIXED_PI * 2.0 * f64::from(step) / f64::from(CAP_STEPS)))
            .collect();
    }

    let last_point = last.point;
    let start_cap: Vec<Point> = right.first().map_or_else(Vec::new, |&r0| {
        (1..=CAP_STEPS)
            .map(|step| rotate_around(r0, first_point, FIXED_PI * f64::from(step) / f64::from(CAP_STEPS)))
            .collect()
    });

    let direction = per(neg(last.vector));
    let end_start = project(last_point, direction, radius);
    let end_cap = (1..END_CAP_STEPS).map(|step| {
        rotate_around(end_start, last_point, FIXED_PI * 3.0 * f64::from(step) / f64::from(END_CAP_STEPS))
    });

    right.reverse();
    left.extend(end_cap);
    left.extend(right);
    left.extend(start_cap);
    left
}

// =============================================================
// Path data
// =============================================================

/// SVG path data for a closed outline: quadratic segments through the
/// midpoints of consecutive outline points, closed with `Z`.
#[must_use]
pub fn svg_path(outline: &[Point]) -> String {
    let Some(first) = outline.first() else {
        return String::new();
    };
    let mut d = format!("M {} {} Q", first.x, first.y);
    for (i, p) in outline.iter().enumerate() {
        let next = outline[(i + 1) % outline.len()];
        let mid = p.midpoint(next);
        d.push_str(&format!(" {} {} {} {}", p.x, p.y, mid.x, mid.y));
    }
    d.push_str(" Z");
    d
}

/// Outline and path data in one step. `None` for an empty stroke.
#[must_use]
pub fn stroke_path(samples: &[InkPoint], size: f64) -> Option<String> {
    let polygon = outline(samples, &OutlineOptions::with_size(size));
    if polygon.is_empty() { None } else { Some(svg_path(&polygon)) }
}
