//! Sampling the located symbol out of the binarized image.
//!
//! A 3x3 projective transform maps module-space sample points onto the
//! image. It is composed from two closed-form pieces: module space to the
//! unit square (via the adjugate, which inverts a projective map up to
//! scale) and unit square to the located image quadrilateral. When the
//! destination is a parallelogram the projective terms degenerate and the
//! map is affine.

use crate::bit_matrix::BitMatrix;
use crate::locate::{Point, SymbolLocation};

#[derive(Debug, Clone, Copy)]
pub struct PerspectiveTransform {
    a11: f64,
    a12: f64,
    a13: f64,
    a21: f64,
    a22: f64,
    a23: f64,
    a31: f64,
    a32: f64,
    a33: f64,
}

impl PerspectiveTransform {
    // Maps the unit square (0,0) (1,0) (1,1) (0,1) onto p1 p2 p3 p4.
    fn square_to_quadrilateral(p1: Point, p2: Point, p3: Point, p4: Point) -> Self {
        if p4.x == p1.x - p2.x + p3.x && p4.y == p1.y - p2.y + p3.y {
            // The destination is a parallelogram: affine suffices.
            Self {
                a11: p2.x - p1.x,
                a12: p2.y - p1.y,
                a13: 0.0,
                a21: p3.x - p2.x,
                a22: p3.y - p2.y,
                a23: 0.0,
                a31: p1.x,
                a32: p1.y,
                a33: 1.0,
            }
        } else {
            let dx1 = p2.x - p3.x;
            let dx2 = p4.x - p3.x;
            let dy1 = p2.y - p3.y;
            let dy2 = p4.y - p3.y;
            let dx3 = p1.x - p2.x + p3.x - p4.x;
            let dy3 = p1.y - p2.y + p3.y - p4.y;
            let denominator = dx1 * dy2 - dx2 * dy1;
            let a13 = (dx3 * dy2 - dx2 * dy3) / denominator;
            let a23 = (dx1 * dy3 - dx3 * dy1) / denominator;
            Self {
                a11: p2.x - p1.x + a13 * p2.x,
                a12: p2.y - p1.y + a13 * p2.y,
                a13,
                a21: p4.x - p1.x + a23 * p4.x,
                a22: p4.y - p1.y + a23 * p4.y,
                a23,
                a31: p1.x,
                a32: p1.y,
                a33: 1.0,
            }
        }
    }

    // The inverse map up to scale: the adjugate of the forward matrix,
    // which is all a homogeneous transform needs.
    fn quadrilateral_to_square(p1: Point, p2: Point, p3: Point, p4: Point) -> Self {
        let f = Self::square_to_quadrilateral(p1, p2, p3, p4);
        Self {
            a11: f.a22 * f.a33 - f.a23 * f.a32,
            a12: f.a13 * f.a32 - f.a12 * f.a33,
            a13: f.a12 * f.a23 - f.a13 * f.a22,
            a21: f.a23 * f.a31 - f.a21 * f.a33,
            a22: f.a11 * f.a33 - f.a13 * f.a31,
            a23: f.a13 * f.a21 - f.a11 * f.a23,
            a31: f.a21 * f.a32 - f.a22 * f.a31,
            a32: f.a12 * f.a31 - f.a11 * f.a32,
            a33: f.a11 * f.a22 - f.a12 * f.a21,
        }
    }

    fn times(&self, other: &Self) -> Self {
        Self {
            a11: self.a11 * other.a11 + self.a21 * other.a12 + self.a31 * other.a13,
            a12: self.a12 * other.a11 + self.a22 * other.a12 + self.a32 * other.a13,
            a13: self.a13 * other.a11 + self.a23 * other.a12 + self.a33 * other.a13,
            a21: self.a11 * other.a21 + self.a21 * other.a22 + self.a31 * other.a23,
            a22: self.a12 * other.a21 + self.a22 * other.a22 + self.a32 * other.a23,
            a23: self.a13 * other.a21 + self.a23 * other.a22 + self.a33 * other.a23,
            a31: self.a11 * other.a31 + self.a21 * other.a32 + self.a31 * other.a33,
            a32: self.a12 * other.a31 + self.a22 * other.a32 + self.a32 * other.a33,
            a33: self.a13 * other.a31 + self.a23 * other.a32 + self.a33 * other.a33,
        }
    }

    /// Maps a module-space point into image space.
    pub fn apply(&self, x: f64, y: f64) -> Point {
        let denominator = self.a13 * x + self.a23 * y + self.a33;
        Point {
            x: (self.a11 * x + self.a21 * y + self.a31) / denominator,
            y: (self.a12 * x + self.a22 * y + self.a32) / denominator,
        }
    }
}

/// The sampled symbol plus the module-to-image mapping that produced it
/// (kept for reporting corner locations).
pub struct Extracted {
    pub matrix: BitMatrix,
    pub transform: PerspectiveTransform,
}

/// Samples a dimension x dimension module grid from the image, nearest
/// neighbour at each module centre.
pub fn extract(image: &BitMatrix, location: &SymbolLocation) -> Extracted {
    let d = location.dimension as f64;
    // The finder centres sit 3.5 modules in from their corners; the
    // alignment pattern sits 6.5 in from the bottom-right.
    let q_to_s = PerspectiveTransform::quadrilateral_to_square(
        Point { x: 3.5, y: 3.5 },
        Point { x: d - 3.5, y: 3.5 },
        Point { x: d - 6.5, y: d - 6.5 },
        Point { x: 3.5, y: d - 3.5 },
    );
    let s_to_q = PerspectiveTransform::square_to_quadrilateral(
        location.top_left,
        location.top_right,
        location.alignment_pattern,
        location.bottom_left,
    );
    let transform = s_to_q.times(&q_to_s);

    let mut matrix = BitMatrix::square(location.dimension);
    for y in 0..location.dimension as i32 {
        for x in 0..location.dimension as i32 {
            let source = transform.apply(f64::from(x) + 0.5, f64::from(y) + 0.5);
            matrix.set(x, y, image.get(source.x.floor() as i32, source.y.floor() as i32));
        }
    }
    Extracted { matrix, transform }
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::code_ecc::CodeEcc;
    use crate::locate::locate;
    use crate::qr_code::QrCode;
    use crate::test_util::rasterize;

    #[test]
    fn map_the_square_corners_onto_the_quadrilateral() {
        let p = |x: f64, y: f64| Point { x, y };
        let t = PerspectiveTransform::square_to_quadrilateral(
            p(10.0, 20.0),
            p(110.0, 24.0),
            p(104.0, 130.0),
            p(8.0, 120.0),
        );
        for (sx, sy, ex, ey) in
            [(0.0, 0.0, 10.0, 20.0), (1.0, 0.0, 110.0, 24.0), (1.0, 1.0, 104.0, 130.0), (0.0, 1.0, 8.0, 120.0)]
        {
            let q = t.apply(sx, sy);
            assert!((q.x - ex).abs() < 1e-9 && (q.y - ey).abs() < 1e-9, "({sx},{sy})");
        }
    }

    #[test]
    fn compose_with_the_adjugate_as_identity() {
        let p = |x: f64, y: f64| Point { x, y };
        let corners = [p(3.0, 7.0), p(97.0, 5.0), p(101.0, 99.0), p(2.0, 95.0)];
        let forward =
            PerspectiveTransform::square_to_quadrilateral(corners[0], corners[1], corners[2], corners[3]);
        let inverse =
            PerspectiveTransform::quadrilateral_to_square(corners[0], corners[1], corners[2], corners[3]);
        // The adjugate inverts up to homogeneous scale: applying both
        // gives the input back.
        for (x, y) in [(0.3, 0.4), (0.9, 0.1), (0.5, 0.5)] {
            let there = forward.apply(x, y);
            let back = inverse.apply(there.x, there.y);
            assert!((back.x - x).abs() < 1e-9 && (back.y - y).abs() < 1e-9);
        }
    }

    #[test]
    fn recover_every_module_from_a_clean_raster() {
        let qr = QrCode::encode_text("EXTRACT 1234", CodeEcc::Quartile).unwrap();
        let image = rasterize(&qr, 4, 4);
        let location = locate(&image).unwrap();
        assert_eq!(location.dimension as i32, qr.size());
        let extracted = extract(&image, &location);
        for y in 0..qr.size() {
            for x in 0..qr.size() {
                assert_eq!(
                    extracted.matrix.get(x, y),
                    qr.get_module(x, y),
                    "module ({x},{y})"
                );
            }
        }
    }
}
