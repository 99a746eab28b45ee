//! 4×4 transform matrices for the model-view-projection stack.
//!
//! [`Matrix`] stores its 16 floats column-major and transforms column vectors
//! (`v' = M · v`). Positions use `w = 1`, directions use `w = 0`.
//!
//! Every composing operation *right-multiplies* the transform onto the matrix it
//! is called on, so a chain reads in the order the transforms are applied to
//! the current coordinate frame:
//!
//! ```
//! use tessera::Matrix;
//!
//! let mut model = Matrix::identity();
//! model
//!     .rotate(30.0, 1.0, 1.0, 0.0)?
//!     .translate(0.0, 0.5, 0.0)
//!     .scale(2.0, 2.0, 2.0);
//!
//! let mut projection = Matrix::identity();
//! projection.perspective(45.0, 16.0 / 9.0, 0.1, 100.0)?;
//!
//! let mvp = projection * model;
//! assert_eq!(mvp.as_slice().len(), 16);
//! # Ok::<(), tessera::MatrixError>(())
//! ```
//!
//! # Preconditions
//!
//! Operations with a domain (`rotate`, `frustum`, `perspective`, `ortho`) check
//! their parameters first and return a [`MatrixError`] without touching the
//! matrix when a parameter is out of range. Nothing is clamped.

use glam::{Mat4, Vec3, Vec4};
use std::ops::{Mul, MulAssign};

/// Errors raised by matrix operations whose parameters are outside their domain.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MatrixError {
    /// The rotation axis has zero (or non-finite) length.
    #[error("rotate: axis ({x}, {y}, {z}) has no direction")]
    ZeroAxis { x: f32, y: f32, z: f32 },

    /// Left/right or bottom/top planes coincide, or a bound is not finite.
    #[error(
        "{operation}: degenerate bounds left={left} right={right} bottom={bottom} top={top}"
    )]
    DegenerateBounds {
        operation: &'static str,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
    },

    /// Near/far planes are out of order, non-positive where required, or not finite.
    #[error("{operation}: invalid depth range near={near} far={far}")]
    InvalidDepthRange {
        operation: &'static str,
        near: f32,
        far: f32,
    },

    /// Vertical field of view outside the open interval (0, 180) degrees.
    #[error("perspective: field of view {0} degrees is outside (0, 180)")]
    InvalidFieldOfView(f32),

    /// Aspect ratio is not a positive finite number.
    #[error("perspective: aspect ratio {0} must be positive")]
    InvalidAspect(f32),
}

/// A 4×4 column-major `f32` matrix.
///
/// `Matrix` is a plain value: copying it is cheap and nothing is shared. It is
/// `#[repr(transparent)]` over [`glam::Mat4`] and [`bytemuck::Pod`], so
/// [`bytemuck::bytes_of`] yields the 64-byte uniform payload a WGSL
/// `mat4x4f` expects.
///
/// The default value is the identity.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Matrix(Mat4);

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    /// The identity matrix.
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    /// Returns the identity matrix.
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Builds a matrix from 16 column-major floats.
    pub fn from_cols_array(cols: &[f32; 16]) -> Self {
        Self(Mat4::from_cols_array(cols))
    }

    /// Resets this matrix to the identity.
    pub fn load_identity(&mut self) -> &mut Self {
        self.0 = Mat4::IDENTITY;
        self
    }

    /// Right-composes a translation by `(tx, ty, tz)`.
    ///
    /// Only the fourth column changes: it gains `tx·c0 + ty·c1 + tz·c2`.
    pub fn translate(&mut self, tx: f32, ty: f32, tz: f32) -> &mut Self {
        let m = &mut self.0;
        m.w_axis += m.x_axis * tx + m.y_axis * ty + m.z_axis * tz;
        self
    }

    /// Right-composes a non-uniform scale.
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) -> &mut Self {
        let m = &mut self.0;
        m.x_axis *= sx;
        m.y_axis *= sy;
        m.z_axis *= sz;
        self
    }

    /// Right-composes a rotation of `angle_degrees` about the axis `(x, y, z)`.
    ///
    /// The axis is normalised internally, so its length does not matter as
    /// long as it is not zero. Positive angles rotate counter-clockwise when
    /// looking down the axis towards the origin.
    ///
    /// # Errors
    ///
    /// [`MatrixError::ZeroAxis`] if the axis has zero or non-finite length.
    pub fn rotate(
        &mut self,
        angle_degrees: f32,
        x: f32,
        y: f32,
        z: f32,
    ) -> Result<&mut Self, MatrixError> {
        let length = Vec3::new(x, y, z).length();
        if !length.is_finite() || length <= f32::EPSILON {
            return Err(MatrixError::ZeroAxis { x, y, z });
        }
        let axis = Vec3::new(x, y, z) / length;

        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let one_minus_cos = 1.0 - cos;
        let (xx, yy, zz) = (axis.x * axis.x, axis.y * axis.y, axis.z * axis.z);
        let (xy, yz, zx) = (axis.x * axis.y, axis.y * axis.z, axis.z * axis.x);
        let (xs, ys, zs) = (axis.x * sin, axis.y * sin, axis.z * sin);

        // R = cos·I + sin·[k]× + (1 - cos)·k·kᵀ, written column by column.
        let rotation = Mat4::from_cols(
            Vec4::new(
                one_minus_cos * xx + cos,
                one_minus_cos * xy + zs,
                one_minus_cos * zx - ys,
                0.0,
            ),
            Vec4::new(
                one_minus_cos * xy - zs,
                one_minus_cos * yy + cos,
                one_minus_cos * yz + xs,
                0.0,
            ),
            Vec4::new(
                one_minus_cos * zx + ys,
                one_minus_cos * yz - xs,
                one_minus_cos * zz + cos,
                0.0,
            ),
            Vec4::W,
        );

        self.0 *= rotation;
        Ok(self)
    }

    /// Right-composes an off-axis perspective projection.
    ///
    /// Maps the view volume bounded by the given planes to OpenGL clip space
    /// (`z ∈ [-w, w]`), looking down `-Z`.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::DegenerateBounds`] if `left == right`, `bottom == top`
    ///   or any bound is not finite.
    /// - [`MatrixError::InvalidDepthRange`] unless `0 < near < far`.
    pub fn frustum(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<&mut Self, MatrixError> {
        if !(near.is_finite() && far.is_finite() && near > 0.0 && far > near) {
            return Err(MatrixError::InvalidDepthRange {
                operation: "frustum",
                near,
                far,
            });
        }
        check_bounds("frustum", left, right, bottom, top)?;

        let dx = right - left;
        let dy = top - bottom;
        let dz = far - near;

        let projection = Mat4::from_cols(
            Vec4::new(2.0 * near / dx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * near / dy, 0.0, 0.0),
            Vec4::new((right + left) / dx, (top + bottom) / dy, -(near + far) / dz, -1.0),
            Vec4::new(0.0, 0.0, -2.0 * near * far / dz, 0.0),
        );

        self.0 *= projection;
        Ok(self)
    }

    /// Right-composes a symmetric perspective projection.
    ///
    /// The frustum's half height at the near plane is `tan(fovy / 2) · near`
    /// and its half width is that times `aspect`.
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidFieldOfView`], [`MatrixError::InvalidAspect`], or
    /// whatever [`Matrix::frustum`] reports for the depth range.
    pub fn perspective(
        &mut self,
        fovy_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<&mut Self, MatrixError> {
        if !(fovy_degrees > 0.0 && fovy_degrees < 180.0) {
            return Err(MatrixError::InvalidFieldOfView(fovy_degrees));
        }
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(MatrixError::InvalidAspect(aspect));
        }

        let half_height = (fovy_degrees.to_radians() * 0.5).tan() * near;
        let half_width = half_height * aspect;

        self.frustum(-half_width, half_width, -half_height, half_height, near, far)
    }

    /// Right-composes an orthographic (parallel) projection.
    ///
    /// Unlike [`Matrix::frustum`] the near plane may sit at or behind the eye,
    /// there is no division by it.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::DegenerateBounds`] if `left == right`, `bottom == top`
    ///   or any bound is not finite.
    /// - [`MatrixError::InvalidDepthRange`] unless `near < far`.
    pub fn ortho(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<&mut Self, MatrixError> {
        check_bounds("ortho", left, right, bottom, top)?;
        if !(near.is_finite() && far.is_finite() && far > near) {
            return Err(MatrixError::InvalidDepthRange {
                operation: "ortho",
                near,
                far,
            });
        }

        let dx = right - left;
        let dy = top - bottom;
        let dz = far - near;

        let projection = Mat4::from_cols(
            Vec4::new(2.0 / dx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / dy, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -2.0 / dz, 0.0),
            Vec4::new(
                -(right + left) / dx,
                -(top + bottom) / dy,
                -(near + far) / dz,
                1.0,
            ),
        );

        self.0 *= projection;
        Ok(self)
    }

    /// Returns `a · b`.
    ///
    /// The product is computed into a fresh value, so either operand may be
    /// the matrix the result is later stored into:
    ///
    /// ```
    /// use tessera::Matrix;
    ///
    /// let mut mvp = Matrix::identity();
    /// mvp.translate(1.0, 0.0, 0.0);
    /// mvp = Matrix::multiply(&mvp, &mvp);
    /// assert_eq!(mvp.to_cols_array()[12], 2.0);
    /// ```
    pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
        Matrix(a.0 * b.0)
    }

    /// Applies the matrix to a homogeneous vector.
    pub fn transform(&self, v: Vec4) -> Vec4 {
        self.0 * v
    }

    /// Returns the 16 floats in column-major order.
    pub fn to_cols_array(&self) -> [f32; 16] {
        self.0.to_cols_array()
    }

    /// Borrows the 16 floats in column-major order, ready for uniform upload.
    pub fn as_slice(&self) -> &[f32; 16] {
        self.0.as_ref()
    }

    /// Element at `row`, `column`.
    ///
    /// # Panics
    ///
    /// Panics if either index is greater than 3.
    pub fn get(&self, row: usize, column: usize) -> f32 {
        self.0.col(column)[row]
    }

    /// True when the last row is exactly `(0, 0, 0, 1)`.
    ///
    /// Compositions of translations, scales and rotations keep this property,
    /// projections do not.
    pub fn is_affine(&self) -> bool {
        self.0.row(3) == Vec4::W
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn abs_diff_eq(&self, other: &Matrix, tolerance: f32) -> bool {
        self.0.abs_diff_eq(other.0, tolerance)
    }
}

fn check_bounds(
    operation: &'static str,
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
) -> Result<(), MatrixError> {
    let finite = left.is_finite() && right.is_finite() && bottom.is_finite() && top.is_finite();
    if !finite || left == right || bottom == top {
        return Err(MatrixError::DegenerateBounds {
            operation,
            left,
            right,
            bottom,
            top,
        });
    }
    Ok(())
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        Matrix::multiply(&self, &rhs)
    }
}

impl MulAssign for Matrix {
    /// Right-composes `rhs`, same as the other composing operations.
    fn mul_assign(&mut self, rhs: Matrix) {
        *self = Matrix::multiply(self, &rhs);
    }
}

impl From<Mat4> for Matrix {
    fn from(m: Mat4) -> Self {
        Self(m)
    }
}

impl From<Matrix> for Mat4 {
    fn from(m: Matrix) -> Self {
        m.0
    }
}
