//! Fast Math: scalar and vec3 helpers shared by the planner and animator.
//!
//! ## FMA (Fused Multiply-Add)
//! `a * b + c` in one instruction and one rounding step. Every lerp in the
//! animator goes through [`lerp`], so interpolated transforms land exactly on
//! the endpoints at `t = 0` and `t = 1`.
//!
//! ## Wide accumulation
//! Embeddings are stored as `f32` but dot products over hundreds of components
//! drift. [`dot`] and [`norm_squared`] accumulate in `f64`.

/// A point or direction in world space.
pub type Vec3 = [f32; 3];

/// Rotation quaternion `[x, y, z, w]` (scalar last, matching the physics engine's readout).
pub type Quat = [f32; 4];

pub const QUAT_IDENTITY: Quat = [0.0, 0.0, 0.0, 1.0];

/// Golden angle in radians: π·(3 − √5).
///
/// Successive points rotated by this angle never line up, which spreads them
/// evenly over a sphere without clustering.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Fused Multiply-Add: a * b + c
#[inline(always)]
pub fn fma(a: f32, b: f32, c: f32) -> f32 {
    a.mul_add(b, c)
}

/// Linear interpolation using FMA for precision.
/// lerp(a, b, t) = a + t * (b - a) = fma(t, b-a, a)
#[inline(always)]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    fma(t, b - a, a)
}

/// Component-wise [`lerp`].
#[inline(always)]
pub fn lerp3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

/// Clamp to [0, 1]. NaN maps to 0.
#[inline(always)]
pub fn clamp01(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Cubic ease-out: `1 - (1 - t)³`. Fast start, gentle settle.
#[inline(always)]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - clamp01(t);
    1.0 - inv * inv * inv
}

/// Dot product accumulated in f64. Caller guarantees equal lengths.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .fold(0.0_f64, |acc, (&x, &y)| (x as f64).mul_add(y as f64, acc))
}

/// Squared Euclidean norm accumulated in f64.
#[inline]
pub fn norm_squared(a: &[f32]) -> f64 {
    a.iter().fold(0.0_f64, |acc, &x| (x as f64).mul_add(x as f64, acc))
}

#[inline(always)]
pub fn add3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline(always)]
pub fn sub3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline(always)]
pub fn scale3(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline(always)]
pub fn dot3(a: Vec3, b: Vec3) -> f32 {
    fma(a[0], b[0], fma(a[1], b[1], a[2] * b[2]))
}

#[inline(always)]
pub fn cross3(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline(always)]
pub fn length3(a: Vec3) -> f32 {
    dot3(a, a).sqrt()
}

/// Normalize, returning `fallback` for near-zero input.
#[inline]
pub fn normalize3_or(a: Vec3, fallback: Vec3) -> Vec3 {
    let len = length3(a);
    if len > 1e-6 {
        scale3(a, 1.0 / len)
    } else {
        fallback
    }
}

/// Hamilton product `a * b` for `[x, y, z, w]` quaternions.
#[inline]
pub fn quat_mul(a: Quat, b: Quat) -> Quat {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

/// Normalize a quaternion; degenerate input becomes identity.
#[inline]
pub fn quat_normalize(q: Quat) -> Quat {
    let n = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if n < 1e-9 {
        return QUAT_IDENTITY;
    }
    let inv = 1.0 / n;
    [q[0] * inv, q[1] * inv, q[2] * inv, q[3] * inv]
}

/// Quaternion from an orthonormal basis given as matrix columns.
pub fn quat_from_basis(x: Vec3, y: Vec3, z: Vec3) -> Quat {
    // Row-major element mRC = column C, component R.
    let (m00, m01, m02) = (x[0], y[0], z[0]);
    let (m10, m11, m12) = (x[1], y[1], z[1]);
    let (m20, m21, m22) = (x[2], y[2], z[2]);
    let trace = m00 + m11 + m22;

    let q = if trace > 0.0 {
        let s = 0.5 / (trace + 1.0).sqrt();
        [(m21 - m12) * s, (m02 - m20) * s, (m10 - m01) * s, 0.25 / s]
    } else if m00 > m11 && m00 > m22 {
        let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
        [0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s]
    } else if m11 > m22 {
        let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
        [(m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s]
    } else {
        let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
        [(m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s]
    };
    quat_normalize(q)
}

/// Rotate a vector by a unit quaternion.
pub fn quat_rotate(q: Quat, v: Vec3) -> Vec3 {
    let u = [q[0], q[1], q[2]];
    let w = q[3];
    // v' = v + 2w(u×v) + 2u×(u×v)
    let uv = cross3(u, v);
    let uuv = cross3(u, uv);
    add3(v, add3(scale3(uv, 2.0 * w), scale3(uuv, 2.0)))
}
