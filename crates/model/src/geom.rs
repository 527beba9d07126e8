//! Integer rectangles, quads and the 3×3 perspective transform used by
//! region moves.

/// Axis-aligned rectangle with inclusive corner coordinates, stored as
/// origin plus extent. A degenerate single point has width and height 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(self) -> i32 {
        self.x + self.width - 1
    }

    pub const fn bottom(self) -> i32 {
        self.y + self.height - 1
    }

    pub const fn size(self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn intersected(self, other: Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if x > right || y > bottom {
            None
        } else {
            Some(Rect::new(x, y, right - x + 1, bottom - y + 1))
        }
    }
}

/// Four corner points, in order. Not necessarily convex or axis-aligned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quad {
    pub points: [(i32, i32); 4],
}

impl Quad {
    pub const fn new(
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        x3: i32,
        y3: i32,
        x4: i32,
        y4: i32,
    ) -> Self {
        Self {
            points: [(x1, y1), (x2, y2), (x3, y3), (x4, y4)],
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(
            rect.x,
            rect.y,
            rect.x + rect.width,
            rect.y,
            rect.x + rect.width,
            rect.y + rect.height,
            rect.x,
            rect.y + rect.height,
        )
    }

    pub fn bounds(self) -> Rect {
        let mut min_x = self.points[0].0;
        let mut max_x = self.points[0].0;
        let mut min_y = self.points[0].1;
        let mut max_y = self.points[0].1;
        for &(x, y) in &self.points[1..] {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    pub fn translated(self, dx: i32, dy: i32) -> Self {
        let mut points = self.points;
        for point in &mut points {
            point.0 += dx;
            point.1 += dy;
        }
        Self { points }
    }
}

/// 3×3 perspective transform. The matrix is stored column-major:
/// `x' = m0·x + m3·y + m6`, `y' = m1·x + m4·y + m7`, `w = m2·x + m5·y + m8`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub matrix: [f64; 9],
}

const DETERMINANT_EPSILON: f64 = 1e-12;

impl Transform {
    pub const IDENTITY: Self = Self {
        matrix: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub fn apply(self, x: f64, y: f64) -> (f64, f64) {
        let m = self.matrix;
        let w = m[2] * x + m[5] * y + m[8];
        let inverse_w = if w == 0.0 { 1.0 } else { 1.0 / w };
        (
            (m[0] * x + m[3] * y + m[6]) * inverse_w,
            (m[1] * x + m[4] * y + m[7]) * inverse_w,
        )
    }

    pub fn multiplied(self, other: Transform) -> Transform {
        let a = self.matrix;
        let b = other.matrix;
        let mut matrix = [0.0; 9];
        for column in 0..3 {
            for row in 0..3 {
                matrix[column * 3 + row] = a[row] * b[column * 3]
                    + a[3 + row] * b[column * 3 + 1]
                    + a[6 + row] * b[column * 3 + 2];
            }
        }
        Transform { matrix }
    }

    pub fn inverted(self) -> Option<Transform> {
        let m = self.matrix;
        let (a, b, c) = (m[0], m[3], m[6]);
        let (d, e, f) = (m[1], m[4], m[7]);
        let (g, h, i) = (m[2], m[5], m[8]);
        let determinant = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
        if determinant.abs() < DETERMINANT_EPSILON {
            return None;
        }
        let s = 1.0 / determinant;
        Some(Transform {
            matrix: [
                (e * i - f * h) * s,
                (f * g - d * i) * s,
                (d * h - e * g) * s,
                (c * h - b * i) * s,
                (a * i - c * g) * s,
                (b * g - a * h) * s,
                (b * f - c * e) * s,
                (c * d - a * f) * s,
                (a * e - b * d) * s,
            ],
        })
    }

    /// Projective map taking the unit square's corners to `quad`'s corners
    /// in order.
    pub fn unit_square_to_quad(quad: Quad) -> Transform {
        let [(x0, y0), (x1, y1), (x2, y2), (x3, y3)] = quad.points;
        let (x0, y0) = (x0 as f64, y0 as f64);
        let (x1, y1) = (x1 as f64, y1 as f64);
        let (x2, y2) = (x2 as f64, y2 as f64);
        let (x3, y3) = (x3 as f64, y3 as f64);

        let sum_x = x0 - x1 + x2 - x3;
        let sum_y = y0 - y1 + y2 - y3;
        if sum_x == 0.0 && sum_y == 0.0 {
            // Affine case.
            return Transform {
                matrix: [x1 - x0, y1 - y0, 0.0, x2 - x1, y2 - y1, 0.0, x0, y0, 1.0],
            };
        }
        let dx1 = x1 - x2;
        let dx2 = x3 - x2;
        let dy1 = y1 - y2;
        let dy2 = y3 - y2;
        let denominator = dx1 * dy2 - dx2 * dy1;
        if denominator == 0.0 {
            // Degenerate quad; fall back to the affine frame so the caller
            // fails on inversion instead of dividing by zero here.
            return Transform {
                matrix: [x1 - x0, y1 - y0, 0.0, x3 - x0, y3 - y0, 0.0, x0, y0, 1.0],
            };
        }
        let g = (sum_x * dy2 - dx2 * sum_y) / denominator;
        let h = (dx1 * sum_y - sum_x * dy1) / denominator;
        Transform {
            matrix: [
                x1 - x0 + g * x1,
                y1 - y0 + g * y1,
                g,
                x3 - x0 + h * x3,
                y3 - y0 + h * y3,
                h,
                x0,
                y0,
                1.0,
            ],
        }
    }

    /// Transform mapping `src`'s corners onto `dst`'s corners in order, or
    /// `None` when either quad is degenerate.
    pub fn quad_to_quad(src: Quad, dst: Quad) -> Option<Transform> {
        let src_to_square = Self::unit_square_to_quad(src).inverted()?;
        Some(Self::unit_square_to_quad(dst).multiplied(src_to_square))
    }
}
