// ============================================
// Quadric Matrix - Квадрика ошибки
// ============================================
// Симметричная 4x4 матрица, храним 10 независимых членов:
// [aa, ab, ac, ad, bb, bc, bd, cc, cd, dd]
// Ошибка точки v = (x, y, z, 1): v^T Q v
// Вся математика в f32.

use std::ops::{Add, AddAssign};

use ultraviolet::Vec3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuadricMatrix {
    pub m: [f32; 10],
}

impl QuadricMatrix {
    pub const ZERO: QuadricMatrix = QuadricMatrix { m: [0.0; 10] };

    /// Квадрика плоскости ax + by + cz + d = 0
    pub fn from_plane(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            m: [
                a * a, a * b, a * c, a * d,
                b * b, b * c, b * d,
                c * c, c * d,
                d * d,
            ],
        }
    }

    /// Квадрика плоскости треугольника (None для вырожденного)
    pub fn from_triangle(p0: Vec3, p1: Vec3, p2: Vec3) -> Option<Self> {
        let n = (p1 - p0).cross(p2 - p0);
        let len = n.mag();
        if len <= 0.0 || !len.is_finite() {
            return None;
        }
        let n = n / len;
        let d = -n.dot(p0);
        Some(Self::from_plane(n.x, n.y, n.z, d))
    }

    /// v^T Q v
    #[inline]
    pub fn error(&self, v: Vec3) -> f32 {
        let m = &self.m;
        let (x, y, z) = (v.x, v.y, v.z);
        m[0] * x * x + 2.0 * m[1] * x * y + 2.0 * m[2] * x * z + 2.0 * m[3] * x
            + m[4] * y * y + 2.0 * m[5] * y * z + 2.0 * m[6] * y
            + m[7] * z * z + 2.0 * m[8] * z
            + m[9]
    }
}

impl Add for QuadricMatrix {
    type Output = QuadricMatrix;

    fn add(mut self, rhs: QuadricMatrix) -> QuadricMatrix {
        self += rhs;
        self
    }
}

impl AddAssign for QuadricMatrix {
    fn add_assign(&mut self, rhs: QuadricMatrix) {
        for (a, b) in self.m.iter_mut().zip(rhs.m.iter()) {
            *a += *b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_on_plane_has_zero_error() {
        let q = QuadricMatrix::from_triangle(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 1.0),
            Vec3::new(1.0, 2.0, 0.0),
        )
        .unwrap();
        assert!(q.error(Vec3::new(5.0, 2.0, -3.0)).abs() < 1e-5);
        // Расстояние 3 от плоскости y = 2 -> ошибка 9
        assert!((q.error(Vec3::new(0.0, 5.0, 0.0)) - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_triangle() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert!(QuadricMatrix::from_triangle(p, p, p).is_none());
    }

    #[test]
    fn test_sum_adds_errors() {
        let qa = QuadricMatrix::from_plane(0.0, 1.0, 0.0, 0.0);
        let qb = QuadricMatrix::from_plane(1.0, 0.0, 0.0, 0.0);
        let v = Vec3::new(2.0, 3.0, 0.0);
        assert!(((qa + qb).error(v) - 13.0).abs() < 1e-5);
    }
}
