//! Rotation matrix plumbing for orientation conversion.
//!
//! Two Euler conventions meet here. Network orientations arrive as DIS
//! aerospace Euler angles (psi, theta, phi in radians, applied Z-Y-X in the
//! geocentric frame). Scene orientations are heading/pitch/roll in degrees
//! in the local tangent frame, with the axis layout inherited from plib's
//! `sgMakeCoordMat4`. All matrices are 4x4 with zero translation so they can
//! compose directly with scene transforms.

use std::f64::consts::PI;

use nalgebra::{Matrix4, Vector3};

const MAGIC_EPSILON: f64 = 0.00001;

/// asin that clamps its argument into [-1, 1] first.
fn safe_asin(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

fn clamp_unity(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

/// Build a rotation matrix from DIS Euler angles (radians).
pub fn eulers_to_matrix(psi: f64, theta: f64, phi: f64) -> Matrix4<f64> {
    let cos_psi = psi.cos();
    let sin_psi = psi.sin();
    let cos_theta = theta.cos();
    let sin_theta = theta.sin();
    let cos_phi = phi.cos();
    let sin_phi = phi.sin();

    let mut dst = Matrix4::identity();
    dst[(0, 0)] = cos_psi * cos_theta;
    dst[(0, 1)] = -sin_psi * cos_phi + cos_psi * sin_theta * sin_phi;
    dst[(0, 2)] = sin_psi * sin_phi + cos_psi * sin_theta * cos_phi;
    dst[(1, 0)] = sin_psi * cos_theta;
    dst[(1, 1)] = cos_psi * cos_phi + sin_psi * sin_theta * sin_phi;
    dst[(1, 2)] = -cos_psi * sin_phi + sin_psi * sin_theta * cos_phi;
    dst[(2, 0)] = -sin_theta;
    dst[(2, 1)] = cos_theta * sin_phi;
    dst[(2, 2)] = cos_theta * cos_phi;
    dst
}

/// Extract DIS Euler angles (radians) from a rotation matrix.
pub fn matrix_to_eulers(mat: &Matrix4<f64>) -> (f64, f64, f64) {
    let sq_cos_theta = 1.0 - mat[(2, 0)] * mat[(2, 0)];
    let mut cos_theta = if sq_cos_theta < 0.0 { 0.0 } else { sq_cos_theta.sqrt() };
    if cos_theta == 0.0 {
        // Gimbal singularity
        cos_theta = 0.000001;
    }

    let sin_psi = mat[(1, 0)] / cos_theta;
    let mut psi = safe_asin(sin_psi);
    if mat[(0, 0)] < 0.0 {
        psi = if psi < 0.0 { -PI - psi } else { PI - psi };
    }

    let theta = -safe_asin(mat[(2, 0)]);

    let sin_phi = mat[(2, 1)] / cos_theta;
    let mut phi = safe_asin(sin_phi);
    if mat[(2, 2)] < 0.0 {
        phi = if phi < 0.0 { -PI - phi } else { PI - phi };
    }

    (psi, theta, phi)
}

/// Build a rotation matrix from scene heading/pitch/roll (degrees).
pub fn hpr_to_matrix(hpr: Vector3<f64>) -> Matrix4<f64> {
    let ch = hpr.x.to_radians().cos();
    let sh = hpr.x.to_radians().sin();
    let cp = hpr.y.to_radians().cos();
    let sp = hpr.y.to_radians().sin();
    let cr = hpr.z.to_radians().cos();
    let sr = hpr.z.to_radians().sin();

    let srsp = sr * sp;
    let crsp = cr * sp;

    let mut m = Matrix4::identity();
    m[(0, 0)] = ch * cr - sh * srsp;
    m[(0, 1)] = sh * cr + ch * srsp;
    m[(0, 2)] = -sr * cp;

    m[(1, 0)] = -sh * cp;
    m[(1, 1)] = ch * cp;
    m[(1, 2)] = sp;

    m[(2, 0)] = sr * ch + sh * crsp;
    m[(2, 1)] = sr * sh - ch * crsp;
    m[(2, 2)] = cr * cp;
    m
}

/// Extract scene heading/pitch/roll (degrees) from a rotation matrix.
pub fn matrix_to_hpr(rotation: &Matrix4<f64>) -> Vector3<f64> {
    // Undo any uniform scale before reading angles off the elements.
    let mut s =
        (rotation[(0, 0)].powi(2) + rotation[(0, 1)].powi(2) + rotation[(0, 2)].powi(2)).sqrt();
    if s <= MAGIC_EPSILON {
        s = 1.0;
    }
    let mat = rotation.unscale(s);

    let sin_pitch = clamp_unity(mat[(1, 2)]);
    let pitch = sin_pitch.asin();
    let cp = pitch.cos();

    let (heading, roll) = if cp > -MAGIC_EPSILON && cp < MAGIC_EPSILON {
        // Pitch is straight up or down; heading and roll collapse into one
        // angle, reported as roll.
        let cr = clamp_unity(-mat[(2, 1)]);
        let sr = clamp_unity(mat[(0, 1)]);
        (0.0, sr.atan2(cr))
    } else {
        let sr = clamp_unity(-mat[(0, 2)] / cp);
        let cr = clamp_unity(mat[(2, 2)] / cp);
        let sh = clamp_unity(-mat[(1, 0)] / cp);
        let ch = clamp_unity(mat[(1, 1)] / cp);
        let heading = if (sh == 0.0 && ch == 0.0) || (sr == 0.0 && cr == 0.0) {
            0.0
        } else {
            sh.atan2(ch)
        };
        let roll = if sr == 0.0 && cr == 0.0 { 0.0 } else { sr.atan2(cr) };
        (heading, roll)
    };

    Vector3::new(heading.to_degrees(), pitch.to_degrees(), roll.to_degrees())
}

/// Swap the X and Y basis rows and negate Z, converting between the
/// geocentric axis convention and the scene convention. Translation is left
/// untouched.
pub fn zflop(m: &Matrix4<f64>) -> Matrix4<f64> {
    let mut out = *m;
    for c in 0..4 {
        out[(0, c)] = m[(1, c)];
        out[(1, c)] = m[(0, c)];
        out[(2, c)] = -m[(2, c)];
    }
    out[(2, 3)] = m[(2, 3)];
    out
}

/// Rotation from the geocentric frame to the local east-north-up tangent
/// frame at geodetic latitude `phi` / longitude `lambda` (radians).
pub fn local_rotation_at(phi: f64, lambda: f64) -> Matrix4<f64> {
    let sin_lat = phi.sin();
    let cos_lat = phi.cos();
    let sin_lon = lambda.sin();
    let cos_lon = lambda.cos();

    let mut m = Matrix4::identity();
    m[(0, 0)] = -sin_lon;
    m[(0, 1)] = -sin_lat * cos_lon;
    m[(0, 2)] = cos_lat * cos_lon;

    m[(1, 0)] = cos_lon;
    m[(1, 1)] = -sin_lat * sin_lon;
    m[(1, 2)] = cos_lat * sin_lon;

    m[(2, 0)] = 0.0;
    m[(2, 1)] = cos_lat;
    m[(2, 2)] = sin_lat;
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn assert_matrix_eq(a: &Matrix4<f64>, b: &Matrix4<f64>, eps: f64) {
        for r in 0..4 {
            for c in 0..4 {
                assert_abs_diff_eq!(a[(r, c)], b[(r, c)], epsilon = eps);
            }
        }
    }

    #[test]
    fn test_euler_matrix_is_orthonormal() {
        let m = eulers_to_matrix(1.11445, -0.970783, 3.1415926);
        let product = m * m.transpose();
        assert_matrix_eq(&product, &Matrix4::identity(), 1e-12);
    }

    #[test]
    fn test_euler_roundtrip() {
        let cases = [
            (0.5, 0.25, -0.75),
            (1.11445, -0.970783, 3.1415926),
            (-1.1564, 0.833645, -2.42036),
            (0.0, 0.0, 0.0),
        ];
        for (psi, theta, phi) in cases {
            let m = eulers_to_matrix(psi, theta, phi);
            let (p2, t2, f2) = matrix_to_eulers(&m);
            assert_relative_eq!(p2, psi, epsilon = 1e-6);
            assert_relative_eq!(t2, theta, epsilon = 1e-6);
            assert_relative_eq!(f2, phi, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_hpr_roundtrip() {
        let cases = [
            Vector3::new(30.0, 10.0, -20.0),
            Vector3::new(-148.9112, -3.42761, 1.894721),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(179.0, -89.0, 45.0),
        ];
        for hpr in cases {
            let m = hpr_to_matrix(hpr);
            let back = matrix_to_hpr(&m);
            assert_relative_eq!(back.x, hpr.x, epsilon = 1e-6);
            assert_relative_eq!(back.y, hpr.y, epsilon = 1e-6);
            assert_relative_eq!(back.z, hpr.z, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_hpr_vertical_pitch_collapses_heading() {
        let m = hpr_to_matrix(Vector3::new(25.0, 90.0, 10.0));
        let hpr = matrix_to_hpr(&m);
        assert_relative_eq!(hpr.x, 0.0);
        assert_relative_eq!(hpr.y, 90.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zflop_is_involutive_up_to_sign_layout() {
        let m = eulers_to_matrix(0.4, -0.2, 0.9);
        let flopped = zflop(&m);
        // Row swap with Z negation applied twice restores the original.
        assert_matrix_eq(&zflop(&flopped), &m, 1e-15);
        assert_relative_eq!(flopped[(0, 1)], m[(1, 1)]);
        assert_relative_eq!(flopped[(2, 2)], -m[(2, 2)]);
    }

    #[test]
    fn test_local_rotation_is_orthonormal() {
        let m = local_rotation_at(0.6, -2.0);
        let product = m * m.transpose();
        assert_matrix_eq(&product, &Matrix4::identity(), 1e-12);
    }

    #[test]
    fn test_local_rotation_at_equator_prime_meridian() {
        // At (0, 0) east is +Y, north is +Z, up is +X in the geocentric
        // frame; the rows read straight off the axis directions.
        let m = local_rotation_at(0.0, 0.0);
        assert_relative_eq!(m[(0, 2)], 1.0);
        assert_relative_eq!(m[(1, 0)], 1.0);
        assert_relative_eq!(m[(2, 1)], 1.0);
    }
}
