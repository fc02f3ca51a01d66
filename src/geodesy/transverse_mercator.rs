//! Transverse Mercator projection — NGA GEOTRANS series formulation.
//!
//! Forward projection evaluates an 8th-order series in delta longitude;
//! inverse projection recovers the footpoint latitude by fixed-point
//! iteration on the true meridional distance, then applies an 8th-order
//! series in delta easting. This is the projection underlying every UTM
//! zone.

use std::f64::consts::PI;

use super::ellipsoid::Ellipsoid;

/// Extreme latitude used when computing the projection domain bounds
/// (84.5 degrees).
pub const MAX_LAT: f64 = 84.5 * PI / 180.0;

/// Extreme delta longitude used when computing the projection domain bounds
/// (90 degrees).
pub const MAX_DELTA_LON: f64 = 90.0 * PI / 180.0;

/// Fixed iteration count for the footpoint-latitude solve in the inverse
/// projection. There is no convergence check; five iterations are
/// sufficient for terrestrial easting/northing magnitudes.
pub const FOOTPOINT_ITERATIONS: usize = 5;

/// Precomputed constants for one transverse Mercator configuration.
///
/// Value type: built fresh per UTM zone/hemisphere computation. All derived
/// fields are pure functions of the constructor inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransverseMercatorParams {
    /// Semi-major axis of the ellipsoid (metres).
    pub a: f64,
    /// Flattening of the ellipsoid.
    pub f: f64,
    /// First eccentricity squared.
    pub es: f64,
    /// Second eccentricity squared.
    pub ebs: f64,
    /// Meridian-arc series coefficients (third-order expansion in the third
    /// flattening).
    pub ap: f64,
    pub bp: f64,
    pub cp: f64,
    pub dp: f64,
    pub ep: f64,
    /// Latitude of the projection origin (radians).
    pub origin_lat: f64,
    /// Central meridian (radians), normalized into (-pi, pi].
    pub origin_lon: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    pub scale_factor: f64,
    /// Maximum easting variance for the configured ellipsoid.
    pub delta_easting: f64,
    /// Maximum northing variance for the configured ellipsoid.
    pub delta_northing: f64,
}

impl TransverseMercatorParams {
    pub fn new(
        ellipsoid: &Ellipsoid,
        origin_lat: f64,
        central_meridian: f64,
        false_easting: f64,
        false_northing: f64,
        scale_factor: f64,
    ) -> Self {
        let tn = ellipsoid.n;
        let tn2 = tn * tn;
        let tn3 = tn2 * tn;
        let tn4 = tn3 * tn;
        let tn5 = tn4 * tn;

        let a = ellipsoid.a;
        let mut params = Self {
            a,
            f: ellipsoid.f,
            es: ellipsoid.e2,
            ebs: ellipsoid.ep2,
            ap: a * (1.0 - tn + 5.0 * (tn2 - tn3) / 4.0 + 81.0 * (tn4 - tn5) / 64.0),
            bp: 3.0 * a * (tn - tn2 + 7.0 * (tn3 - tn4) / 8.0 + 55.0 * tn5 / 64.0) / 2.0,
            cp: 15.0 * a * (tn2 - tn3 + 3.0 * (tn4 - tn5) / 4.0) / 16.0,
            dp: 35.0 * a * (tn3 - tn4 + 11.0 * tn5 / 16.0) / 48.0,
            ep: 315.0 * a * (tn4 - tn5) / 512.0,
            origin_lat: 0.0,
            origin_lon: 0.0,
            false_easting: 0.0,
            false_northing: 0.0,
            scale_factor: 1.0,
            delta_easting: 40_000_000.0,
            delta_northing: 40_000_000.0,
        };

        // Domain bounds come from projecting the extreme latitude and
        // longitude offset through the forward projection while the origin
        // parameters are still zeroed.
        let (de, dn) = params.forward(MAX_LAT, MAX_DELTA_LON);
        params.delta_easting = de;
        params.delta_northing = dn;
        let (de, _) = params.forward(0.0, MAX_DELTA_LON);
        params.delta_easting = de;

        params.origin_lat = origin_lat;
        let mut central = central_meridian;
        if central > PI {
            central -= 2.0 * PI;
        }
        params.origin_lon = central;
        params.false_easting = false_easting;
        params.false_northing = false_northing;
        params.scale_factor = scale_factor;
        params
    }

    /// True meridional distance from the equator to `lat` (SPHTMD).
    pub fn true_meridional_distance(&self, lat: f64) -> f64 {
        self.ap * lat - self.bp * (2.0 * lat).sin() + self.cp * (4.0 * lat).sin()
            - self.dp * (6.0 * lat).sin()
            + self.ep * (8.0 * lat).sin()
    }

    /// Radius of curvature in the prime vertical (SPHSN).
    pub fn prime_vertical_radius(&self, lat: f64) -> f64 {
        self.a / (1.0 - self.es * lat.sin().powi(2)).sqrt()
    }

    /// Radius of curvature in the meridian (SPHSR).
    pub fn meridian_radius(&self, lat: f64) -> f64 {
        let denom = (1.0 - self.es * lat.sin().powi(2)).sqrt();
        self.a * (1.0 - self.es) / denom.powi(3)
    }

    /// Forward projection: geodetic (radians) to easting/northing (metres).
    pub fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let mut lon = lon;
        if lon > PI {
            lon -= 2.0 * PI;
        }

        let mut dlam = lon - self.origin_lon;
        if dlam > PI {
            dlam -= 2.0 * PI;
        }
        if dlam < -PI {
            dlam += 2.0 * PI;
        }
        if dlam.abs() < 2e-10 {
            dlam = 0.0;
        }

        let s = lat.sin();
        let c = lat.cos();
        let c2 = c * c;
        let c3 = c2 * c;
        let c5 = c3 * c2;
        let c7 = c5 * c2;
        let t = lat.tan();
        let tan2 = t * t;
        let tan3 = tan2 * t;
        let tan4 = tan3 * t;
        let tan5 = tan4 * t;
        let tan6 = tan5 * t;
        let eta = self.ebs * c2;
        let eta2 = eta * eta;
        let eta3 = eta2 * eta;
        let eta4 = eta3 * eta;

        let sn = self.prime_vertical_radius(lat);
        let tmd = self.true_meridional_distance(lat);
        let tmdo = self.true_meridional_distance(self.origin_lat);
        let k = self.scale_factor;

        // Northing series
        let t1 = (tmd - tmdo) * k;
        let t2 = sn * s * c * k / 2.0;
        let t3 = sn * s * c3 * k * (5.0 - tan2 + 9.0 * eta + 4.0 * eta2) / 24.0;
        let t4 = sn
            * s
            * c5
            * k
            * (61.0 - 58.0 * tan2 + tan4 + 270.0 * eta - 330.0 * tan2 * eta + 445.0 * eta2
                + 324.0 * eta3
                - 680.0 * tan2 * eta2
                + 88.0 * eta4
                - 600.0 * tan2 * eta3
                - 192.0 * tan2 * eta4)
            / 720.0;
        let t5 = sn * s * c7 * k * (1385.0 - 3111.0 * tan2 + 543.0 * tan4 - tan6) / 40320.0;

        let northing = self.false_northing
            + t1
            + dlam.powi(2) * t2
            + dlam.powi(4) * t3
            + dlam.powi(6) * t4
            + dlam.powi(8) * t5;

        // Easting series
        let t6 = sn * c * k;
        let t7 = sn * c3 * k * (1.0 - tan2 + eta) / 6.0;
        let t8 = sn
            * c5
            * k
            * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta - 58.0 * tan2 * eta + 13.0 * eta2
                + 4.0 * eta3
                - 64.0 * tan2 * eta2
                - 24.0 * tan2 * eta3)
            / 120.0;
        let t9 = sn * c7 * k * (61.0 - 479.0 * tan2 + 179.0 * tan4 - tan6) / 5040.0;

        let easting = self.false_easting
            + dlam * t6
            + dlam.powi(3) * t7
            + dlam.powi(5) * t8
            + dlam.powi(7) * t9;

        (easting, northing)
    }

    /// Inverse projection: easting/northing (metres) to geodetic (radians).
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let tmdo = self.true_meridional_distance(self.origin_lat);
        let tmd = tmdo + (northing - self.false_northing) / self.scale_factor;

        // Footpoint latitude: fixed-point iteration on the meridional
        // distance, seeded from the equatorial meridian radius.
        let mut sr = self.meridian_radius(0.0);
        let mut ftphi = tmd / sr;
        for _ in 0..FOOTPOINT_ITERATIONS {
            let t10 = self.true_meridional_distance(ftphi);
            sr = self.meridian_radius(ftphi);
            ftphi += (tmd - t10) / sr;
        }

        let sr = self.meridian_radius(ftphi);
        let sn = self.prime_vertical_radius(ftphi);
        let c = ftphi.cos();
        let t = ftphi.tan();
        let tan2 = t * t;
        let tan4 = tan2 * tan2;
        let eta = self.ebs * c.powi(2);
        let eta2 = eta * eta;
        let eta3 = eta2 * eta;
        let eta4 = eta3 * eta;
        let k = self.scale_factor;

        let mut de = easting - self.false_easting;
        if de.abs() < 0.0001 {
            de = 0.0;
        }

        // Latitude series
        let t10 = t / (2.0 * sr * sn * k.powi(2));
        let t11 = t * (5.0 + 3.0 * tan2 + eta - 4.0 * eta.powi(2) - 9.0 * tan2 * eta)
            / (24.0 * sr * sn.powi(3) * k.powi(4));
        let t12 = t
            * (61.0 + 90.0 * tan2 + 46.0 * eta + 45.0 * tan4
                - 252.0 * tan2 * eta
                - 3.0 * eta2
                + 100.0 * eta3
                - 66.0 * tan2 * eta2
                - 90.0 * tan4 * eta
                + 88.0 * eta4
                + 225.0 * tan4 * eta2
                + 84.0 * tan2 * eta3
                - 192.0 * tan2 * eta4)
            / (720.0 * sr * sn.powi(5) * k.powi(6));
        let t13 = t * (1385.0 + 3633.0 * tan2 + 4095.0 * tan4 + 1575.0 * t.powi(6))
            / (40320.0 * sr * sn.powi(7) * k.powi(8));

        let lat = ftphi - de.powi(2) * t10 + de.powi(4) * t11 - de.powi(6) * t12
            + de.powi(8) * t13;

        // Longitude series
        let t14 = 1.0 / (sn * c * k);
        let t15 = (1.0 + 2.0 * tan2 + eta) / (6.0 * sn.powi(3) * c * k.powi(3));
        let t16 = (5.0 + 6.0 * eta + 28.0 * tan2 - 3.0 * eta2 + 8.0 * tan2 * eta + 24.0 * tan4
            - 4.0 * eta3
            + 4.0 * tan2 * eta2
            + 24.0 * tan2 * eta3)
            / (120.0 * sn.powi(5) * c * k.powi(5));
        let t17 = (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * t.powi(6))
            / (5040.0 * sn.powi(7) * c * k.powi(7));

        let dlam = de * t14 - de.powi(3) * t15 + de.powi(5) * t16 - de.powi(7) * t17;

        let mut lon = self.origin_lon + dlam;
        if lon > PI {
            lon -= 2.0 * PI;
        }

        (lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::ellipsoid::WGS84;
    use approx::assert_relative_eq;

    fn utm_params(central_meridian_deg: f64) -> TransverseMercatorParams {
        TransverseMercatorParams::new(
            &WGS84,
            0.0,
            central_meridian_deg.to_radians(),
            500_000.0,
            0.0,
            0.9996,
        )
    }

    #[test]
    fn test_wgs84_meridian_arc_coefficients() {
        let p = utm_params(15.0);
        assert_relative_eq!(p.ap, 6_367_449.145_800_8, max_relative = 1e-10);
        assert_relative_eq!(p.bp, 16_038.508_662_976, max_relative = 1e-10);
        assert_relative_eq!(p.cp, 16.832_613_334_334, max_relative = 1e-10);
        assert_relative_eq!(p.dp, 0.021_984_404_273_757, max_relative = 1e-9);
        assert_relative_eq!(p.ep, 3.114_837_131_928_3e-5, max_relative = 1e-9);
    }

    #[test]
    fn test_domain_bounds_are_finite_and_positive() {
        let p = utm_params(15.0);
        assert!(p.delta_easting.is_finite() && p.delta_easting > 0.0);
        assert!(p.delta_northing.is_finite() && p.delta_northing > 0.0);
    }

    #[test]
    fn test_central_meridian_easting() {
        let p = utm_params(15.0);
        let (e, _) = p.forward(45.0_f64.to_radians(), 15.0_f64.to_radians());
        assert_relative_eq!(e, 500_000.0, epsilon = 0.01);
    }

    #[test]
    fn test_known_point_zone_33() {
        // (52N, 15E) is on the zone 33 central meridian; northing ~5.76M.
        let p = utm_params(15.0);
        let (e, n) = p.forward(52.0_f64.to_radians(), 15.0_f64.to_radians());
        assert_relative_eq!(e, 500_000.0, epsilon = 1.0);
        assert!(n > 5_760_000.0 && n < 5_762_000.0, "northing = {n}");
    }

    #[test]
    fn test_roundtrip_converges_in_fixed_iterations() {
        // Footpoint solve has no convergence check; assert the fixed count
        // is sufficient across the supported latitude range.
        let p = utm_params(-93.0);
        for lat_deg in [-80.0, -60.0, -30.0, 0.0, 30.0, 45.0, 60.0, 80.0, 84.0] {
            for dlon_deg in [-3.0, -1.5, 0.0, 1.5, 3.0] {
                let lat = (lat_deg as f64).to_radians();
                let lon = (-93.0 + dlon_deg as f64).to_radians();
                let (e, n) = p.forward(lat, lon);
                let (lat2, lon2) = p.inverse(e, n);
                assert_relative_eq!(lat2, lat, epsilon = 1e-7);
                assert_relative_eq!(lon2, lon, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn test_longitude_wraps_into_range() {
        let p = utm_params(177.0);
        let lat = 10.0_f64.to_radians();
        // 182 degrees wraps to -178, a 1-degree offset west of zone 60's
        // central meridian.
        let (e1, n1) = p.forward(lat, 182.0_f64.to_radians());
        let (e2, n2) = p.forward(lat, (-178.0_f64).to_radians());
        assert_relative_eq!(e1, e2, epsilon = 1e-6);
        assert_relative_eq!(n1, n2, epsilon = 1e-6);
    }
}
