//! Finder- and alignment-pattern location on a binarized image.
//!
//! One row-major scan collects candidate runs matching the 1:1:3:1:1
//! (finder) and 1:1:1 (alignment) ratios, aggregates vertically
//! overlapping runs into quads, scores quad centres by ray-tracing the
//! expected ratio through them in four directions, and picks the
//! best-scoring triple of similarly-sized finder patterns. From the
//! triple follow the module size, the symbol dimension and the expected
//! alignment-pattern position.

use serde::{Deserialize, Serialize};

use crate::bit_matrix::BitMatrix;

const MAX_FINDER_PATTERNS_TO_SEARCH: usize = 4;
const MIN_QUAD_RATIO: f64 = 0.5;
const MAX_QUAD_RATIO: f64 = 1.5;

/// An image-space position, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub(crate) fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// The located geometry of a symbol candidate.
#[derive(Debug, Clone)]
pub struct SymbolLocation {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub alignment_pattern: Point,
    pub dimension: usize,
}

#[derive(Clone, Copy)]
struct QuadLine {
    start_x: f64,
    end_x: f64,
    y: i32,
}

#[derive(Clone)]
struct Quad {
    top: QuadLine,
    bottom: QuadLine,
}

#[derive(Clone, Copy)]
struct Candidate {
    x: f64,
    y: f64,
    size: f64,
    score: f64,
}

/// Locates the three finder patterns, the alignment anchor and the symbol
/// dimension, or reports `None` when no plausible triple exists.
pub fn locate(matrix: &BitMatrix) -> Option<SymbolLocation> {
    let mut finder_quads: Vec<Quad> = Vec::new();
    let mut active_finder_quads: Vec<Quad> = Vec::new();
    let mut alignment_quads: Vec<Quad> = Vec::new();
    let mut active_alignment_quads: Vec<Quad> = Vec::new();

    for y in 0..=matrix.height() {
        let mut scans = [0f64; 5];
        let mut length = 0f64;
        let mut last_bit = false;
        // One virtual light pixel on each side flushes edge runs.
        for x in -1..=matrix.width() {
            let v = matrix.get(x, y);
            if v == last_bit {
                length += 1.0;
                continue;
            }
            scans = [scans[1], scans[2], scans[3], scans[4], length];
            length = 1.0;
            last_bit = v;

            // Do the last 5 runs match the 1:1:3:1:1 finder ratio? The
            // just-started run must be light: the pattern ends dark.
            let finder_avg = scans.iter().sum::<f64>() / 7.0;
            let valid_finder = !v
                && (scans[0] - finder_avg).abs() < finder_avg
                && (scans[1] - finder_avg).abs() < finder_avg
                && (scans[2] - 3.0 * finder_avg).abs() < 3.0 * finder_avg
                && (scans[3] - finder_avg).abs() < finder_avg
                && (scans[4] - finder_avg).abs() < finder_avg;
            if valid_finder {
                let end_x = f64::from(x) - scans[3] - scans[4];
                let line = QuadLine { start_x: end_x - scans[2], end_x, y };
                extend_or_start_quad(&mut active_finder_quads, line, scans[2]);
            }

            // And the last 3 the 1:1:1 alignment ratio, ending light (the
            // just-started run is dark, the ring's far side).
            let align_avg = (scans[2] + scans[3] + scans[4]) / 3.0;
            let valid_alignment = v
                && (scans[2] - align_avg).abs() < align_avg
                && (scans[3] - align_avg).abs() < align_avg
                && (scans[4] - align_avg).abs() < align_avg;
            if valid_alignment {
                let end_x = f64::from(x) - scans[4];
                let line = QuadLine { start_x: end_x - scans[3], end_x, y };
                extend_or_start_quad(&mut active_alignment_quads, line, scans[3]);
            }
        }
        retire_stale_quads(&mut active_finder_quads, &mut finder_quads, y);
        retire_stale_quads(&mut active_alignment_quads, &mut alignment_quads, y);
    }
    finder_quads.append(&mut active_finder_quads);
    alignment_quads.append(&mut active_alignment_quads);

    // Score finder candidates by the ratio rays through their centres.
    let mut finder_candidates: Vec<Candidate> = finder_quads
        .iter()
        .filter(|q| q.bottom.y - q.top.y >= 2) // the core is taller than one scan line
        .filter_map(|q| {
            let x = (q.top.start_x + q.top.end_x + q.bottom.start_x + q.bottom.end_x) / 4.0;
            let y = f64::from(q.top.y + q.bottom.y + 1) / 2.0;
            if !matrix.get(x.round() as i32, y.round() as i32) {
                return None;
            }
            let lengths = [
                q.top.end_x - q.top.start_x,
                q.bottom.end_x - q.bottom.start_x,
                f64::from(q.bottom.y - q.top.y + 1),
            ];
            let size = lengths.iter().sum::<f64>() / 3.0;
            let score = score_pattern(
                Point { x: x.round(), y: y.round() },
                &[1.0, 1.0, 3.0, 1.0, 1.0],
                matrix,
            );
            Some(Candidate { x, y, size, score })
        })
        .collect();
    finder_candidates.sort_by(|a, b| a.score.total_cmp(&b.score));

    // For each of the best few candidates, find the two companions that
    // minimise score plus size mismatch; keep the cheapest triple.
    let mut best_group: Option<(f64, [Candidate; 3])> = None;
    for (i, point) in finder_candidates.iter().enumerate().take(MAX_FINDER_PATTERNS_TO_SEARCH) {
        let mut others: Vec<Candidate> = finder_candidates
            .iter()
            .enumerate()
            .filter(|&(ii, _)| ii != i)
            .map(|(_, p)| Candidate {
                score: p.score + (p.size - point.size).powi(2) / point.size,
                ..*p
            })
            .collect();
        others.sort_by(|a, b| a.score.total_cmp(&b.score));
        if others.len() < 2 {
            continue;
        }
        let group_score = point.score + others[0].score + others[1].score;
        if best_group.as_ref().map_or(true, |&(s, _)| group_score < s) {
            best_group = Some((group_score, [*point, others[0], others[1]]));
        }
    }
    let (_, triple) = best_group?;

    let as_point = |c: &Candidate| Point { x: c.x, y: c.y };
    let (top_left, top_right, bottom_left) =
        reorder_finder_patterns(as_point(&triple[0]), as_point(&triple[1]), as_point(&triple[2]));

    let (dimension, module_size) = compute_dimension(top_left, top_right, bottom_left, matrix)?;

    // Expected alignment position: inset 3 modules from the imaginary
    // bottom-right finder.
    let bottom_right_guess = Point {
        x: top_right.x - top_left.x + bottom_left.x,
        y: top_right.y - top_left.y + bottom_left.y,
    };
    let modules_between =
        (top_left.distance(bottom_left) + top_left.distance(top_right)) / 2.0 / module_size;
    let correction = 1.0 - 3.0 / modules_between;
    let expected_alignment = Point {
        x: top_left.x + correction * (bottom_right_guess.x - top_left.x),
        y: top_left.y + correction * (bottom_right_guess.y - top_left.y),
    };

    let mut scored_alignments: Vec<(f64, Point)> = alignment_quads
        .iter()
        .filter_map(|q| {
            let x = (q.top.start_x + q.top.end_x + q.bottom.start_x + q.bottom.end_x) / 4.0;
            let y = f64::from(q.top.y + q.bottom.y + 1) / 2.0;
            if !matrix.get(x.floor() as i32, y.floor() as i32) {
                return None;
            }
            let ratio_score =
                score_pattern(Point { x: x.floor(), y: y.floor() }, &[1.0, 1.0, 1.0], matrix);
            let point = Point { x, y };
            Some((ratio_score + point.distance(expected_alignment), point))
        })
        .collect();
    scored_alignments.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Version 1 (under 15 modules between finders) has no alignment
    // pattern; fall back to the expectation.
    let alignment_pattern = if modules_between >= 15.0 && !scored_alignments.is_empty() {
        scored_alignments[0].1
    } else {
        expected_alignment
    };

    Some(SymbolLocation { top_left, top_right, bottom_left, alignment_pattern, dimension })
}

// Extends the quad whose bottom line overlaps the new line in x (with a
// sane width ratio for full containment), or starts a fresh quad.
fn extend_or_start_quad(active: &mut Vec<Quad>, line: QuadLine, run_width: f64) {
    for quad in active.iter_mut() {
        let b = quad.bottom;
        let overlaps = (line.start_x >= b.start_x && line.start_x <= b.end_x)
            || (line.end_x >= b.start_x && line.end_x <= b.end_x)
            || (line.start_x <= b.start_x
                && line.end_x >= b.end_x
                && ((run_width / (b.end_x - b.start_x)) < MAX_QUAD_RATIO
                    && (run_width / (b.end_x - b.start_x)) > MIN_QUAD_RATIO));
        if overlaps {
            quad.bottom = line;
            return;
        }
    }
    active.push(Quad { top: line, bottom: line });
}

// Quads not extended on the current row are finished.
fn retire_stale_quads(active: &mut Vec<Quad>, finished: &mut Vec<Quad>, y: i32) {
    finished.extend(active.iter().filter(|q| q.bottom.y != y).cloned());
    active.retain(|q| q.bottom.y == y);
}

// The pattern nearest the other two is the corner of the right angle
// (top-left); the cross product orients the remaining pair.
fn reorder_finder_patterns(p1: Point, p2: Point, p3: Point) -> (Point, Point, Point) {
    let d12 = p1.distance(p2);
    let d23 = p2.distance(p3);
    let d13 = p1.distance(p3);

    let (mut bottom_left, top_left, mut top_right) = if d23 >= d12 && d23 >= d13 {
        (p2, p1, p3)
    } else if d13 >= d23 && d13 >= d12 {
        (p1, p2, p3)
    } else {
        (p1, p3, p2)
    };

    // A negative z component of (TR-TL) x (BL-TL) means the candidates
    // are swapped relative to the canonical arrangement.
    if (top_right.x - top_left.x) * (bottom_left.y - top_left.y)
        - (top_right.y - top_left.y) * (bottom_left.x - top_left.x)
        < 0.0
    {
        std::mem::swap(&mut bottom_left, &mut top_right);
    }

    (top_left, top_right, bottom_left)
}

// Module size from edge-traced rays between finder centres; dimension
// from centre distances, snapped to 1 mod 4.
fn compute_dimension(
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    matrix: &BitMatrix,
) -> Option<(usize, f64)> {
    let ray = |from: Point, to: Point| -> f64 {
        count_black_white_run(from, to, matrix, 5).iter().sum::<f64>() / 7.0
    };
    let module_size = (ray(top_left, bottom_left)
        + ray(top_left, top_right)
        + ray(bottom_left, top_left)
        + ray(top_right, top_left))
        / 4.0;
    if module_size < 1.0 {
        return None;
    }

    let top_dimension = (top_left.distance(top_right) / module_size).round();
    let side_dimension = (top_left.distance(bottom_left) / module_size).round();
    let mut dimension = ((top_dimension + side_dimension) / 2.0).floor() as i64 + 7;
    match dimension % 4 {
        0 => dimension += 1,
        2 => dimension -= 1,
        3 => dimension += 2,
        _ => {}
    }
    if dimension < 21 {
        return None;
    }
    Some((dimension as usize, module_size))
}

// Measures the lengths of `length` alternating runs centred on `origin`
// along the origin->end direction, walking both ways from the centre.
fn count_black_white_run(origin: Point, end: Point, matrix: &BitMatrix, length: usize) -> Vec<f64> {
    let rise = end.y - origin.y;
    let run = end.x - origin.x;
    let half = (length + 1) / 2;

    let mut towards = count_run_towards(origin, end, matrix, half);
    let opposite = Point { x: origin.x - run, y: origin.y - rise };
    let mut away = count_run_towards(origin, opposite, matrix, half);

    // The centre run was walked from its middle twice; the origin pixel
    // itself is counted in both halves.
    let middle = towards.remove(0) + away.remove(0) - 1.0;
    let mut result = away;
    result.push(middle);
    result.append(&mut towards);
    result
}

// Bresenham from origin toward end, recording colour switch points until
// `length` runs are measured or the target is reached. Missing runs
// report a length of zero.
fn count_run_towards(origin: Point, end: Point, matrix: &BitMatrix, length: usize) -> Vec<f64> {
    let mut switch_points = vec![(origin.x.floor(), origin.y.floor())];
    let steep = (end.y - origin.y).abs() > (end.x - origin.x).abs();
    let (from_x, from_y, to_x, to_y) = if steep {
        (
            origin.y.floor() as i32,
            origin.x.floor() as i32,
            end.y.floor() as i32,
            end.x.floor() as i32,
        )
    } else {
        (
            origin.x.floor() as i32,
            origin.y.floor() as i32,
            end.x.floor() as i32,
            end.y.floor() as i32,
        )
    };

    let dx = (to_x - from_x).abs();
    let dy = (to_y - from_y).abs();
    let mut error = -dx / 2;
    let x_step = if from_x < to_x { 1 } else { -1 };
    let y_step = if from_y < to_y { 1 } else { -1 };

    let mut current_pixel = true;
    let mut x = from_x;
    let mut y = from_y;
    while x != to_x + x_step {
        let (real_x, real_y) = if steep { (y, x) } else { (x, y) };
        if matrix.get(real_x, real_y) != current_pixel {
            current_pixel = !current_pixel;
            switch_points.push((f64::from(real_x), f64::from(real_y)));
            if switch_points.len() == length + 1 {
                break;
            }
        }
        error += dy;
        if error > 0 {
            if y == to_y {
                break;
            }
            y += y_step;
            error -= dx;
        }
        x += x_step;
    }

    (0..length)
        .map(|i| {
            if i + 1 < switch_points.len() {
                let (ax, ay) = switch_points[i];
                let (bx, by) = switch_points[i + 1];
                ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
            } else {
                0.0
            }
        })
        .collect()
}

// Sums squared deviations of measured runs from the expected ratio; also
// reports the per-module size implied by the ray.
fn score_run(sequence: &[f64], ratio: &[f64]) -> (f64, f64) {
    let average_size = sequence.iter().sum::<f64>() / ratio.iter().sum::<f64>();
    let error = sequence
        .iter()
        .zip(ratio)
        .map(|(&s, &r)| (s - r * average_size).powi(2))
        .sum::<f64>();
    (average_size, error)
}

// Rates how well the 4 rays (horizontal, vertical, both diagonals)
// through a candidate centre match the expected ratio: root of the summed
// squared ratio errors plus the size variance across rays. Lower is
// better; an unmeasurable ray scores infinity.
fn score_pattern(point: Point, ratio: &[f64], matrix: &BitMatrix) -> f64 {
    let width = f64::from(matrix.width());

    let horizontal = count_black_white_run(point, Point { x: -1.0, y: point.y }, matrix, ratio.len());
    let vertical = count_black_white_run(point, Point { x: point.x, y: -1.0 }, matrix, ratio.len());
    let main_diag_steps = point.x.min(point.y) + 1.0;
    let main_diagonal = count_black_white_run(
        point,
        Point { x: point.x - main_diag_steps, y: point.y - main_diag_steps },
        matrix,
        ratio.len(),
    );
    let anti_diag_steps = (width - 1.0 - point.x).min(point.y) + 1.0;
    let anti_diagonal = count_black_white_run(
        point,
        Point { x: point.x + anti_diag_steps, y: point.y - anti_diag_steps },
        matrix,
        ratio.len(),
    );

    let runs = [horizontal, vertical, main_diagonal, anti_diagonal];
    if runs.iter().any(|r| r.iter().sum::<f64>() == 0.0) {
        return f64::INFINITY;
    }
    let scored: Vec<(f64, f64)> = runs.iter().map(|r| score_run(r, ratio)).collect();
    let ratio_error = scored.iter().map(|&(_, e)| e).sum::<f64>().sqrt();
    let average_size = scored.iter().map(|&(s, _)| s).sum::<f64>() / 4.0;
    if average_size == 0.0 {
        return f64::INFINITY;
    }
    let size_error =
        scored.iter().map(|&(s, _)| (s - average_size).powi(2)).sum::<f64>() / average_size;
    ratio_error + size_error
}
