//! 3x3 transformation matrix
//!
//! Row-vector convention: a point maps as `(x, y, 1) * M`, so
//!
//! ```text
//! x' = m11*x + m21*y + m31        | m11 m12 m13 |
//! y' = m12*x + m22*y + m32        | m21 m22 m23 |
//! w' = m13*x + m23*y + m33        | m31 m32 m33 |
//! ```
//!
//! with a perspective divide by `w'` when the third column is not
//! `(0, 0, 1)`. Composition `a * b` applies `a` first; the builder
//! methods (`translate`, `scale`, `rotate`, `shear`) prepend their
//! operation, so `t.rotate(90.0).translate(10.0, 0.0)` translates in
//! the rotated coordinate system.

use crate::error::{TransformError, TransformResult};
use rasterpix_core::Rect;
use std::ops::Mul;

#[inline]
fn fuzzy_null(v: f64) -> bool {
    v.abs() < 1e-12
}

/// Complexity class of a transform, coarsest property last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransformKind {
    /// The identity
    Identity,
    /// Pure translation
    Translate,
    /// Axis-aligned scaling (possibly negative) and translation
    Scale,
    /// Rotation (the 2x2 part is orthogonal)
    Rotate,
    /// General affine with shear
    Shear,
    /// True perspective
    Project,
}

/// A 2D affine or perspective transformation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub m11: f64,
    pub m12: f64,
    pub m13: f64,
    pub m21: f64,
    pub m22: f64,
    pub m23: f64,
    pub m31: f64,
    pub m32: f64,
    pub m33: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The identity transformation.
    pub const fn identity() -> Self {
        Self { m11: 1.0, m12: 0.0, m13: 0.0, m21: 0.0, m22: 1.0, m23: 0.0, m31: 0.0, m32: 0.0, m33: 1.0 }
    }

    /// Construct from the six affine coefficients.
    pub const fn from_affine(m11: f64, m12: f64, m21: f64, m22: f64, dx: f64, dy: f64) -> Self {
        Self { m11, m12, m13: 0.0, m21, m22, m23: 0.0, m31: dx, m32: dy, m33: 1.0 }
    }

    /// A pure translation.
    pub const fn from_translate(dx: f64, dy: f64) -> Self {
        Self::from_affine(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    /// A pure scale.
    pub const fn from_scale(sx: f64, sy: f64) -> Self {
        Self::from_affine(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A pure shear.
    pub const fn from_shear(sh: f64, sv: f64) -> Self {
        Self::from_affine(1.0, sv, sh, 1.0, 0.0, 0.0)
    }

    /// A rotation by `degrees`, counterclockwise in a y-down raster.
    ///
    /// Multiples of 90 produce exact coefficients, so quarter-turn
    /// rotations hit the dedicated fast paths.
    pub fn from_rotate(degrees: f64) -> Self {
        let deg = degrees.rem_euclid(360.0);
        let (sin, cos) = if deg == 90.0 {
            (1.0, 0.0)
        } else if deg == 180.0 {
            (0.0, -1.0)
        } else if deg == 270.0 {
            (-1.0, 0.0)
        } else {
            degrees.to_radians().sin_cos()
        };
        Self::from_affine(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Horizontal translation component.
    #[inline]
    pub fn dx(&self) -> f64 {
        self.m31
    }

    /// Vertical translation component.
    #[inline]
    pub fn dy(&self) -> f64 {
        self.m32
    }

    /// Classify the transform.
    pub fn kind(&self) -> TransformKind {
        if !fuzzy_null(self.m13) || !fuzzy_null(self.m23) || !fuzzy_null(self.m33 - 1.0) {
            TransformKind::Project
        } else if !fuzzy_null(self.m12) || !fuzzy_null(self.m21) {
            let dot = self.m11 * self.m12 + self.m21 * self.m22;
            if fuzzy_null(dot) { TransformKind::Rotate } else { TransformKind::Shear }
        } else if !fuzzy_null(self.m11 - 1.0) || !fuzzy_null(self.m22 - 1.0) {
            TransformKind::Scale
        } else if !fuzzy_null(self.m31) || !fuzzy_null(self.m32) {
            TransformKind::Translate
        } else {
            TransformKind::Identity
        }
    }

    /// Whether the third column is `(0, 0, 1)`.
    pub fn is_affine(&self) -> bool {
        self.kind() < TransformKind::Project
    }

    /// Whether this is the identity.
    pub fn is_identity(&self) -> bool {
        self.kind() == TransformKind::Identity
    }

    /// Prepend a translation.
    #[must_use]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::from_translate(dx, dy) * self
    }

    /// Prepend a scale.
    #[must_use]
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self::from_scale(sx, sy) * self
    }

    /// Prepend a rotation.
    #[must_use]
    pub fn rotate(self, degrees: f64) -> Self {
        Self::from_rotate(degrees) * self
    }

    /// Prepend a shear.
    #[must_use]
    pub fn shear(self, sh: f64, sv: f64) -> Self {
        Self::from_shear(sh, sv) * self
    }

    /// Map a point.
    pub fn map(&self, x: f64, y: f64) -> (f64, f64) {
        let fx = self.m11 * x + self.m21 * y + self.m31;
        let fy = self.m12 * x + self.m22 * y + self.m32;
        let mut w = self.m13 * x + self.m23 * y + self.m33;
        if fuzzy_null(w - 1.0) {
            (fx, fy)
        } else {
            if fuzzy_null(w) {
                w = 1.0 / f32::EPSILON as f64;
            } else {
                w = 1.0 / w;
            }
            (fx * w, fy * w)
        }
    }

    /// Integer-aligned bounding rectangle of the mapped corners of `r`.
    pub fn map_rect(&self, r: Rect) -> Rect {
        let corners = [
            self.map(r.x as f64, r.y as f64),
            self.map(r.right() as f64, r.y as f64),
            self.map(r.x as f64, r.bottom() as f64),
            self.map(r.right() as f64, r.bottom() as f64),
        ];
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let x1 = min_x.floor() as i32;
        let y1 = min_y.floor() as i32;
        let x2 = max_x.ceil() as i32;
        let y2 = max_y.ceil() as i32;
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Determinant of the upper-left 2x2 (the area scale factor for
    /// affine transforms).
    pub fn determinant(&self) -> f64 {
        self.m11 * (self.m33 * self.m22 - self.m32 * self.m23)
            - self.m21 * (self.m33 * self.m12 - self.m32 * self.m13)
            + self.m31 * (self.m23 * self.m12 - self.m22 * self.m13)
    }

    /// The inverse transformation, or `None` when singular.
    pub fn inverted(&self) -> Option<Transform> {
        match self.kind() {
            TransformKind::Identity => Some(*self),
            TransformKind::Translate => Some(Self::from_translate(-self.m31, -self.m32)),
            TransformKind::Scale => {
                if fuzzy_null(self.m11) || fuzzy_null(self.m22) {
                    return None;
                }
                Some(Self::from_affine(
                    1.0 / self.m11,
                    0.0,
                    0.0,
                    1.0 / self.m22,
                    -self.m31 / self.m11,
                    -self.m32 / self.m22,
                ))
            }
            TransformKind::Rotate | TransformKind::Shear => {
                let det = self.m11 * self.m22 - self.m12 * self.m21;
                if fuzzy_null(det) {
                    return None;
                }
                let inv = 1.0 / det;
                Some(Self::from_affine(
                    self.m22 * inv,
                    -self.m12 * inv,
                    -self.m21 * inv,
                    self.m11 * inv,
                    (self.m21 * self.m32 - self.m22 * self.m31) * inv,
                    (self.m12 * self.m31 - self.m11 * self.m32) * inv,
                ))
            }
            TransformKind::Project => {
                let det = self.determinant();
                if fuzzy_null(det) {
                    return None;
                }
                let inv = 1.0 / det;
                Some(Self {
                    m11: (self.m22 * self.m33 - self.m23 * self.m32) * inv,
                    m12: (self.m13 * self.m32 - self.m12 * self.m33) * inv,
                    m13: (self.m12 * self.m23 - self.m13 * self.m22) * inv,
                    m21: (self.m23 * self.m31 - self.m21 * self.m33) * inv,
                    m22: (self.m11 * self.m33 - self.m13 * self.m31) * inv,
                    m23: (self.m13 * self.m21 - self.m11 * self.m23) * inv,
                    m31: (self.m21 * self.m32 - self.m22 * self.m31) * inv,
                    m32: (self.m12 * self.m31 - self.m11 * self.m32) * inv,
                    m33: (self.m11 * self.m22 - self.m12 * self.m21) * inv,
                })
            }
        }
    }
}

impl Mul for Transform {
    type Output = Transform;

    /// `a * b` maps a point through `a`, then through `b`.
    fn mul(self, o: Transform) -> Transform {
        Transform {
            m11: self.m11 * o.m11 + self.m12 * o.m21 + self.m13 * o.m31,
            m12: self.m11 * o.m12 + self.m12 * o.m22 + self.m13 * o.m32,
            m13: self.m11 * o.m13 + self.m12 * o.m23 + self.m13 * o.m33,
            m21: self.m21 * o.m11 + self.m22 * o.m21 + self.m23 * o.m31,
            m22: self.m21 * o.m12 + self.m22 * o.m22 + self.m23 * o.m32,
            m23: self.m21 * o.m13 + self.m22 * o.m23 + self.m23 * o.m33,
            m31: self.m31 * o.m11 + self.m32 * o.m21 + self.m33 * o.m31,
            m32: self.m31 * o.m12 + self.m32 * o.m22 + self.m33 * o.m32,
            m33: self.m31 * o.m13 + self.m32 * o.m23 + self.m33 * o.m33,
        }
    }
}

/// The matrix actually applied by `transformed`: `matrix` adjusted so
/// the mapped bounding rect of a `w x h` source has its top-left at
/// the origin. The result is the minimal bounding image.
pub fn true_matrix(matrix: &Transform, w: i32, h: i32) -> TransformResult<Transform> {
    if w <= 0 || h <= 0 {
        return Err(TransformError::InvalidParameters(format!("source size {w}x{h}")));
    }
    let mapped = matrix.map_rect(Rect::new(0, 0, w, h));
    Ok(*matrix * Transform::from_translate(-f64::from(mapped.x), -f64::from(mapped.y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Transform::identity().kind(), TransformKind::Identity);
        assert_eq!(Transform::from_translate(1.0, 2.0).kind(), TransformKind::Translate);
        assert_eq!(Transform::from_scale(2.0, 3.0).kind(), TransformKind::Scale);
        assert_eq!(Transform::from_rotate(90.0).kind(), TransformKind::Rotate);
        assert_eq!(Transform::from_rotate(45.0).kind(), TransformKind::Rotate);
        assert_eq!(Transform::from_shear(0.5, 0.0).kind(), TransformKind::Shear);
        let mut p = Transform::identity();
        p.m13 = 0.001;
        assert_eq!(p.kind(), TransformKind::Project);
    }

    #[test]
    fn test_quarter_turns_are_exact() {
        let r90 = Transform::from_rotate(90.0);
        assert_eq!(r90.m11, 0.0);
        assert_eq!(r90.m12, 1.0);
        assert_eq!(r90.m21, -1.0);
        assert_eq!(r90.m22, 0.0);
        let r180 = Transform::from_rotate(180.0);
        assert_eq!((r180.m11, r180.m22), (-1.0, -1.0));
        let r270 = Transform::from_rotate(270.0);
        assert_eq!((r270.m12, r270.m21), (-1.0, 1.0));
    }

    #[test]
    fn test_map_rotation() {
        let r = Transform::from_rotate(90.0);
        let (x, y) = r.map(1.0, 0.0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 1.0);
    }

    #[test]
    fn test_compose_order() {
        // scale then translate: the translation is not scaled
        let m = Transform::from_scale(2.0, 2.0) * Transform::from_translate(5.0, 0.0);
        let (x, _) = m.map(1.0, 0.0);
        assert_relative_eq!(x, 7.0);
        // translate then scale: it is
        let m = Transform::from_translate(5.0, 0.0) * Transform::from_scale(2.0, 2.0);
        let (x, _) = m.map(1.0, 0.0);
        assert_relative_eq!(x, 12.0);
    }

    #[test]
    fn test_builder_prepends() {
        // rotate(90) then translate: translation happens in the
        // rotated system, i.e. before the rotation in point order
        let m = Transform::identity().rotate(90.0).translate(10.0, 0.0);
        let (x, y) = m.map(0.0, 0.0);
        assert_relative_eq!(x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_map_rect_rotation_bbox() {
        let r = Transform::from_rotate(90.0);
        let mapped = r.map_rect(Rect::new(0, 0, 10, 20));
        assert_eq!(mapped.width, 20);
        assert_eq!(mapped.height, 10);
    }

    #[test]
    fn test_inverted_roundtrip() {
        let m = Transform::from_rotate(30.0).scale(2.0, 0.5).translate(3.0, -7.0);
        let inv = m.inverted().unwrap();
        let (x, y) = m.map(12.0, -3.0);
        let (bx, by) = inv.map(x, y);
        assert_relative_eq!(bx, 12.0, epsilon = 1e-9);
        assert_relative_eq!(by, -3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_not_invertible() {
        assert!(Transform::from_scale(0.0, 1.0).inverted().is_none());
        let degenerate = Transform::from_affine(1.0, 2.0, 2.0, 4.0, 0.0, 0.0);
        assert!(degenerate.inverted().is_none());
    }

    #[test]
    fn test_perspective_inverse() {
        let mut p = Transform::identity();
        p.m13 = 0.001;
        p.m23 = 0.002;
        let inv = p.inverted().unwrap();
        let (x, y) = p.map(50.0, 80.0);
        let (bx, by) = inv.map(x, y);
        assert_relative_eq!(bx, 50.0, epsilon = 1e-6);
        assert_relative_eq!(by, 80.0, epsilon = 1e-6);
    }

    #[test]
    fn test_true_matrix_origin() {
        // rotating 10x20 by 90 degrees maps to x in [-20, 0]; the true
        // matrix shifts that to [0, 20]
        let t = true_matrix(&Transform::from_rotate(90.0), 10, 20).unwrap();
        let mapped = t.map_rect(Rect::new(0, 0, 10, 20));
        assert_eq!(mapped.x, 0);
        assert_eq!(mapped.y, 0);
        assert_eq!(mapped.width, 20);
        assert_eq!(mapped.height, 10);
    }
}
