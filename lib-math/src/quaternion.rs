use core::ops::{Add, Div, Mul, Neg};
use crate::*;

/// Orientation of one body segment as reported by its sensor, components ordered (w, x, y, z).
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion
{
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<[f64; 4]> for Quaternion {
    fn from(values: [f64; 4]) -> Self {
        Self {
            w: values[0],
            x: values[1],
            y: values[2],
            z: values[3],
        }
    }
}

impl From<Quaternion> for [f64; 4] {
    fn from(q: Quaternion) -> Self {
        [q.w, q.x, q.y, q.z]
    }
}

impl Quaternion
{
    /// Create a new quaternion with the given values.
    ///
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Quaternion { w, x, y, z }
    }

    /// Returns the identity quaternion (no rotation)
    ///
    pub const fn identity() -> Self {
        Quaternion {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Components in (w, x, y, z) order.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Get the magnitude of the quaternion.
    ///
    #[inline]
    pub fn magnitude(&self) -> f64 {
        libm::sqrt(self.dot(self))
    }

    /// Four dimensional dot product of two quaternions.
    ///
    #[inline]
    pub fn dot(&self, other: &Quaternion) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Normalize the quaternion to make it a unit quaternion. Zero or non-finite magnitudes have
    /// no direction to keep, so they are rejected instead of silently passed through.
    ///
    pub fn normalize(&self) -> Result<Quaternion, MathError> {
        let magnitude = self.magnitude();
        if magnitude == 0.0 || !magnitude.is_finite() {
            return Err(MathError::DegenerateQuaternion);
        }
        Ok(*self / magnitude)
    }

    /// Compute the conjugate of the quaternion.
    ///
    pub fn conjugate(&self) -> Self {
        Quaternion {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Approximate equality check with a given tolerance.
    ///
    pub fn approx_eq(&self, other: &Quaternion, tol: f64) -> bool {
        libm::fabs(self.x - other.x) <= tol
            && libm::fabs(self.y - other.y) <= tol
            && libm::fabs(self.z - other.z) <= tol
            && libm::fabs(self.w - other.w) <= tol
    }

    /// Plain Hamilton product, the inputs are used as they are.
    ///
    pub fn hamilton(&self, other: &Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Quaternion multiplication of the normalized inputs. The product itself is not normalized
    /// again, callers that chain products get to decide when to renormalize.
    ///
    pub fn multiply(&self, other: &Quaternion) -> Result<Quaternion, MathError> {
        Ok(self.normalize()?.hamilton(&other.normalize()?))
    }

    /// Rotation angle in radians, `2 * acos(w)`. Assumes a unit quaternion; `w` is clamped so
    /// floating point drift just outside [-1, 1] cannot produce NaN.
    ///
    pub fn rotation_angle(&self) -> f64 {
        2.0 * libm::acos(clamp(self.w, -1.0, 1.0))
    }

    /// Unsigned shortest-arc angle in degrees between two orientations. Taking the absolute dot
    /// product makes `q` and `-q` (the same rotation) compare as equal.
    ///
    pub fn angular_separation(&self, other: &Quaternion) -> Result<f64, MathError> {
        let norms = libm::sqrt(self.dot(self) * other.dot(other));
        if norms == 0.0 || !norms.is_finite() {
            return Err(MathError::DegenerateQuaternion);
        }
        let cos_half = clamp(libm::fabs(self.dot(other)) / norms, -1.0, 1.0);
        Ok(degrees(2.0 * libm::acos(cos_half)))
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::identity()
    }
}

impl Mul<Quaternion> for &Quaternion {
    type Output = Quaternion;
    fn mul(self, other: Quaternion) -> Self::Output {
        self.hamilton(&other)
    }
}
impl Mul<&Quaternion> for &Quaternion {
    type Output = Quaternion;
    fn mul(self, other: &Quaternion) -> Self::Output {
        self.hamilton(other)
    }
}
impl Mul<Quaternion> for Quaternion {
    type Output = Quaternion;
    fn mul(self, other: Quaternion) -> Self::Output {
        self.hamilton(&other)
    }
}

impl Add for Quaternion
{
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Quaternion {
            w: self.w + other.w,
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Neg for Quaternion
{
    type Output = Self;

    fn neg(self) -> Self::Output {
        Quaternion {
            w: -self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Div<f64> for Quaternion
{
    type Output = Self;

    fn div(self, other: f64) -> Self::Output {
        Quaternion {
            w: self.w / other,
            x: self.x / other,
            y: self.y / other,
            z: self.z / other,
        }
    }
}

impl Mul<f64> for Quaternion
{
    type Output = Self;

    fn mul(self, other: f64) -> Self::Output {
        Quaternion {
            w: self.w * other,
            x: self.x * other,
            y: self.y * other,
            z: self.z * other,
        }
    }
}
