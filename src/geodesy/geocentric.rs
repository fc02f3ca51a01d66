//! Geodetic <-> geocentric (ECEF) conversion.
//!
//! The inverse uses the Toms (1996) non-iterative approximation, which is
//! accurate to well under a millimetre for terrestrial heights.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;

use super::ellipsoid::Ellipsoid;

/// Toms region 1 constant: relates the geocentric and geodetic latitude of
/// the first-guess parametric point.
const AD_C: f64 = 1.0026000;

/// cos(67.5 degrees) — boundary between the two height formulas.
const COS_67P5: f64 = 0.382_683_432_365_089_77;

/// Convert geodetic latitude, longitude (radians) and ellipsoidal height
/// (metres) to geocentric X/Y/Z (metres).
pub fn geodetic_to_geocentric(ellipsoid: &Ellipsoid, lat: f64, lon: f64, height: f64) -> Vector3<f64> {
    let mut lat = lat;
    let mut lon = lon;
    // Tolerate slight numerical overshoot past the poles.
    if lat < -FRAC_PI_2 && lat > -1.001 * FRAC_PI_2 {
        lat = -FRAC_PI_2;
    } else if lat > FRAC_PI_2 && lat < 1.001 * FRAC_PI_2 {
        lat = FRAC_PI_2;
    }
    if lon > PI {
        lon -= 2.0 * PI;
    }

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let rn = ellipsoid.a / (1.0 - ellipsoid.e2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (rn + height) * cos_lat * lon.cos(),
        (rn + height) * cos_lat * lon.sin(),
        (rn * (1.0 - ellipsoid.e2) + height) * sin_lat,
    )
}

/// Convert geocentric X/Y/Z (metres) to geodetic latitude, longitude
/// (radians) and ellipsoidal height (metres).
pub fn geocentric_to_geodetic(ellipsoid: &Ellipsoid, xyz: Vector3<f64>) -> (f64, f64, f64) {
    let (x, y, z) = (xyz.x, xyz.y, xyz.z);

    let mut at_pole = false;
    let lon;
    if x != 0.0 {
        lon = y.atan2(x);
    } else if y > 0.0 {
        lon = FRAC_PI_2;
    } else if y < 0.0 {
        lon = -FRAC_PI_2;
    } else {
        at_pole = true;
        lon = 0.0;
        if z == 0.0 {
            // Centre of the earth: pin to the north pole at depth -b.
            return (FRAC_PI_2, lon, -ellipsoid.b);
        }
    }

    let w2 = x * x + y * y;
    let w = w2.sqrt();

    // First-guess parametric latitude, then one corrected pass.
    let t0 = z * AD_C;
    let s0 = (t0 * t0 + w2).sqrt();
    let sin_b0 = t0 / s0;
    let cos_b0 = w / s0;
    let sin3_b0 = sin_b0 * sin_b0 * sin_b0;
    let t1 = z + ellipsoid.b * ellipsoid.ep2 * sin3_b0;
    let sum = w - ellipsoid.a * ellipsoid.e2 * cos_b0 * cos_b0 * cos_b0;
    let s1 = (t1 * t1 + sum * sum).sqrt();
    let sin_p1 = t1 / s1;
    let cos_p1 = sum / s1;

    let rn = ellipsoid.a / (1.0 - ellipsoid.e2 * sin_p1 * sin_p1).sqrt();

    let height = if cos_p1 >= COS_67P5 {
        w / cos_p1 - rn
    } else if cos_p1 <= -COS_67P5 {
        w / -cos_p1 - rn
    } else {
        z / sin_p1 + rn * (ellipsoid.e2 - 1.0)
    };

    let lat = if at_pole {
        if z > 0.0 {
            FRAC_PI_2
        } else {
            -FRAC_PI_2
        }
    } else {
        (sin_p1 / cos_p1).atan()
    };

    (lat, lon, height)
}
