//! The coordinate frame façade.
//!
//! [`CoordinateFrame`] holds the configuration of one simulation exercise:
//! which representation positions arrive in from the network (the remote or
//! incoming type), which frame the local scene uses, the UTM zone and
//! hemisphere, the local origin offset, and the cached origin rotation. All
//! conversion entry points live here and dispatch to the pure math in
//! [`crate::geodesy`] and [`crate::mgrs`].
//!
//! Translation conversions never fail loudly: non-finite components in a
//! result are replaced with zero so one bad entity update cannot poison a
//! scene graph, and unsupported type combinations log an error and return
//! zero. The `try_` variants expose the error instead.

pub mod rotation;

use nalgebra::{Matrix4, Vector2, Vector3};
use tracing::{debug, error, warn};

use crate::angles;
use crate::error::CoordError;
use crate::geodesy::ellipsoid::WGS84;
use crate::geodesy::geocentric::{geocentric_to_geodetic, geodetic_to_geocentric};
use crate::geodesy::utm::{geodetic_to_utm, utm_to_geodetic, utm_zone_for, Hemisphere};
use crate::mgrs::{mgrs_to_utm, utm_to_mgrs};
use rotation::{
    eulers_to_matrix, hpr_to_matrix, local_rotation_at, matrix_to_eulers, matrix_to_hpr, zflop,
};

/// Metres per degree of latitude on the flat-earth plane (1852 m per
/// nautical mile times 60 minutes).
pub const METERS_PER_DEGREE: f64 = 1852.0 * 60.0;

/// Representation used by the remote side of the connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncomingCoordinateType {
    /// Earth-centered, earth-fixed X/Y/Z metres.
    Geocentric,
    /// Latitude/longitude in degrees, elevation in metres.
    Geodetic,
    /// Easting/northing metres in the configured zone.
    Utm,
}

/// Frame used by the local scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalCoordinateType {
    /// Whole-earth globe scaled to `globe_radius`.
    Globe,
    /// Tangent plane anchored to a UTM zone.
    CartesianUtm,
    /// Tangent plane with simple per-degree scaling around an origin.
    CartesianFlatEarth,
    /// Obsolete alias for [`LocalCoordinateType::CartesianUtm`]; the setter
    /// remaps it.
    Cartesian,
}

/// Cached origin rotation, tagged rather than flagged so a stale matrix can
/// never be read by accident.
#[derive(Clone, Copy, Debug)]
enum RotationCache {
    Dirty,
    Clean {
        offset: Matrix4<f64>,
        inverse: Matrix4<f64>,
    },
}

/// Replace non-finite vector components with zero.
pub fn sanitize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    v.map(|c| if c.is_finite() { c } else { 0.0 })
}

/// East-west compression factor for the flat-earth plane at the given
/// origin latitude (degrees).
pub fn convergence_for_latitude(latitude: f64) -> f64 {
    latitude.to_radians().cos()
}

/// Project lat/lon/elevation (degrees, metres) onto the flat-earth plane.
pub fn lat_lon_to_flat_earth(
    lle: Vector3<f64>,
    origin: Vector2<f64>,
    convergence: f64,
) -> Vector3<f64> {
    Vector3::new(
        (lle.y - origin.y) * METERS_PER_DEGREE * convergence,
        (lle.x - origin.x) * METERS_PER_DEGREE,
        lle.z,
    )
}

/// Unproject a flat-earth position back to lat/lon/elevation (degrees,
/// metres).
pub fn flat_earth_to_lat_lon(
    xyz: Vector3<f64>,
    origin: Vector2<f64>,
    convergence: f64,
) -> Vector3<f64> {
    Vector3::new(
        origin.x + xyz.y / METERS_PER_DEGREE,
        origin.y + xyz.x / convergence / METERS_PER_DEGREE,
        xyz.z,
    )
}

/// Conversion state for one simulation connection.
#[derive(Clone, Debug)]
pub struct CoordinateFrame {
    incoming_type: IncomingCoordinateType,
    local_type: LocalCoordinateType,
    utm_zone: u32,
    utm_hemisphere: Hemisphere,
    globe_radius: f64,
    magnetic_north_offset: f64,
    local_offset: Vector3<f64>,
    flat_earth_origin: Vector2<f64>,
    convergence: f64,
    apply_rotation_conversion: bool,
    rotation: RotationCache,
}

impl Default for CoordinateFrame {
    fn default() -> Self {
        Self {
            incoming_type: IncomingCoordinateType::Utm,
            local_type: LocalCoordinateType::CartesianUtm,
            utm_zone: 1,
            utm_hemisphere: Hemisphere::North,
            globe_radius: 0.0,
            magnetic_north_offset: 0.0,
            local_offset: Vector3::zeros(),
            flat_earth_origin: Vector2::zeros(),
            convergence: 0.0,
            apply_rotation_conversion: true,
            rotation: RotationCache::Dirty,
        }
    }
}

impl PartialEq for CoordinateFrame {
    fn eq(&self, other: &Self) -> bool {
        const EPS: f64 = 0.0001;
        let vec_eq = |a: &Vector3<f64>, b: &Vector3<f64>| (a - b).abs().max() <= EPS;
        let rotation_eq = match (&self.rotation, &other.rotation) {
            (RotationCache::Dirty, RotationCache::Dirty) => true,
            (
                RotationCache::Clean { offset: a, inverse: ai },
                RotationCache::Clean { offset: b, inverse: bi },
            ) => a == b && ai == bi,
            _ => false,
        };
        self.incoming_type == other.incoming_type
            && self.local_type == other.local_type
            && self.utm_zone == other.utm_zone
            && self.utm_hemisphere == other.utm_hemisphere
            && self.globe_radius == other.globe_radius
            && self.magnetic_north_offset == other.magnetic_north_offset
            && vec_eq(&self.local_offset, &other.local_offset)
            && (self.flat_earth_origin - other.flat_earth_origin).abs().max() <= EPS
            && (self.convergence - other.convergence).abs() <= EPS
            && self.apply_rotation_conversion == other.apply_rotation_conversion
            && rotation_eq
    }
}

impl CoordinateFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incoming_coordinate_type(&self) -> IncomingCoordinateType {
        self.incoming_type
    }

    pub fn set_incoming_coordinate_type(&mut self, incoming: IncomingCoordinateType) {
        self.incoming_type = incoming;
        self.rotation = RotationCache::Dirty;
    }

    pub fn local_coordinate_type(&self) -> LocalCoordinateType {
        self.local_type
    }

    /// Set the local frame type. [`LocalCoordinateType::Cartesian`] is
    /// obsolete and is stored as [`LocalCoordinateType::CartesianUtm`].
    pub fn set_local_coordinate_type(&mut self, local: LocalCoordinateType) {
        if local == LocalCoordinateType::Cartesian {
            warn!("local coordinate type Cartesian is obsolete, using CartesianUtm");
            self.local_type = LocalCoordinateType::CartesianUtm;
        } else {
            self.local_type = local;
        }
        self.rotation = RotationCache::Dirty;
    }

    pub fn utm_zone(&self) -> u32 {
        self.utm_zone
    }

    /// Set the UTM zone, clamped into [1, 60].
    pub fn set_utm_zone(&mut self, zone: u32) {
        self.utm_zone = zone.clamp(1, 60);
        self.rotation = RotationCache::Dirty;
    }

    pub fn utm_hemisphere(&self) -> Hemisphere {
        self.utm_hemisphere
    }

    pub fn set_utm_hemisphere(&mut self, hemisphere: Hemisphere) {
        self.utm_hemisphere = hemisphere;
    }

    pub fn globe_radius(&self) -> f64 {
        self.globe_radius
    }

    pub fn set_globe_radius(&mut self, radius: f64) {
        self.globe_radius = radius;
    }

    pub fn magnetic_north_offset(&self) -> f64 {
        self.magnetic_north_offset
    }

    pub fn set_magnetic_north_offset(&mut self, offset: f64) {
        self.magnetic_north_offset = offset;
    }

    pub fn local_offset(&self) -> Vector3<f64> {
        self.local_offset
    }

    pub fn set_local_offset(&mut self, offset: Vector3<f64>) {
        self.local_offset = offset;
        self.rotation = RotationCache::Dirty;
    }

    pub fn flat_earth_origin(&self) -> Vector2<f64> {
        self.flat_earth_origin
    }

    /// Set the flat-earth origin (latitude, longitude in degrees). The
    /// east-west convergence factor is derived from the origin latitude.
    pub fn set_flat_earth_origin(&mut self, origin: Vector2<f64>) {
        self.flat_earth_origin = origin;
        self.convergence = convergence_for_latitude(origin.x);
        self.rotation = RotationCache::Dirty;
    }

    pub fn apply_rotation_conversion_matrix(&self) -> bool {
        self.apply_rotation_conversion
    }

    /// When false, incoming orientations are re-expressed without the origin
    /// rotation, leaving only the axis convention change.
    pub fn set_apply_rotation_conversion_matrix(&mut self, apply: bool) {
        self.apply_rotation_conversion = apply;
    }

    /// Configure the UTM zone, hemisphere, and local offset from a geodetic
    /// origin (latitude, longitude in degrees, elevation in metres). The
    /// origin rotation is rebuilt immediately.
    pub fn set_utm_local_offset_as_lat_lon(&mut self, lle: Vector3<f64>) {
        let (zone, band) = utm_zone_for(lle.x, lle.y);
        self.set_utm_zone(zone);
        self.utm_hemisphere = if band >= 'N' {
            Hemisphere::North
        } else {
            Hemisphere::South
        };

        let phi = lle.x.to_radians();
        let lambda = lle.y.to_radians();
        let (easting, northing) = geodetic_to_utm(phi, lambda, self.utm_zone, self.utm_hemisphere);
        self.local_offset = Vector3::new(easting, northing, lle.z);
        self.install_local_rotation(phi, lambda);
    }

    /// Rebuild the origin rotation around a specific remote position rather
    /// than the configured origin, tightening orientation conversion for
    /// entities far from the origin.
    pub fn set_remote_reference_for_origin_rotation(&mut self, translation: Vector3<f64>) {
        match self.incoming_type {
            IncomingCoordinateType::Geocentric | IncomingCoordinateType::Geodetic => {
                let (phi, lambda) = if self.incoming_type == IncomingCoordinateType::Geocentric {
                    let (phi, lambda, _) = geocentric_to_geodetic(&WGS84, translation);
                    (phi, lambda)
                } else {
                    (translation.x.to_radians(), translation.y.to_radians())
                };
                match self.local_type {
                    LocalCoordinateType::CartesianFlatEarth
                    | LocalCoordinateType::CartesianUtm
                    | LocalCoordinateType::Cartesian => self.install_local_rotation(phi, lambda),
                    LocalCoordinateType::Globe => self.install_identity_rotation(),
                }
            }
            IncomingCoordinateType::Utm => self.install_identity_rotation(),
        }
    }

    /// Recompute the origin rotation from the current configuration.
    pub fn reconfigure_rotation_matrix(&mut self) {
        match self.incoming_type {
            IncomingCoordinateType::Geocentric | IncomingCoordinateType::Geodetic => {
                match self.local_type {
                    LocalCoordinateType::CartesianFlatEarth => {
                        self.install_local_rotation(
                            self.flat_earth_origin.x.to_radians(),
                            self.flat_earth_origin.y.to_radians(),
                        );
                    }
                    LocalCoordinateType::CartesianUtm | LocalCoordinateType::Cartesian => {
                        // The configured zone and local offset give the best
                        // available approximation of the origin.
                        let (phi, lambda) = utm_to_geodetic(
                            self.utm_zone,
                            self.utm_hemisphere,
                            self.local_offset.x,
                            self.local_offset.y,
                        );
                        self.install_local_rotation(phi, lambda);
                    }
                    LocalCoordinateType::Globe => self.install_identity_rotation(),
                }
            }
            IncomingCoordinateType::Utm => self.install_identity_rotation(),
        }
    }

    pub fn origin_rotation_matrix(&mut self) -> Matrix4<f64> {
        self.rotation_matrices().0
    }

    pub fn origin_rotation_matrix_inverse(&mut self) -> Matrix4<f64> {
        self.rotation_matrices().1
    }

    fn install_local_rotation(&mut self, phi: f64, lambda: f64) {
        let offset = local_rotation_at(phi, lambda);
        let inverse = offset.try_inverse().unwrap_or_else(|| offset.transpose());
        self.rotation = RotationCache::Clean { offset, inverse };
    }

    fn install_identity_rotation(&mut self) {
        self.rotation = RotationCache::Clean {
            offset: Matrix4::identity(),
            inverse: Matrix4::identity(),
        };
    }

    fn rotation_matrices(&mut self) -> (Matrix4<f64>, Matrix4<f64>) {
        if let RotationCache::Clean { offset, inverse } = self.rotation {
            return (offset, inverse);
        }
        self.reconfigure_rotation_matrix();
        match self.rotation {
            RotationCache::Clean { offset, inverse } => (offset, inverse),
            RotationCache::Dirty => (Matrix4::identity(), Matrix4::identity()),
        }
    }

    /// Convert a remote position to the local frame, zeroing any non-finite
    /// result components. Unsupported combinations log an error and return
    /// zero.
    pub fn convert_to_local_translation(&self, loc: Vector3<f64>) -> Vector3<f64> {
        match self.try_convert_to_local_translation(loc) {
            Ok(v) => sanitize_or_zero(v),
            Err(e) => {
                error!("local translation conversion failed: {e}");
                Vector3::zeros()
            }
        }
    }

    /// Fallible form of [`Self::convert_to_local_translation`]. Non-finite
    /// components are still sanitized by the infallible wrapper, not here.
    pub fn try_convert_to_local_translation(
        &self,
        loc: Vector3<f64>,
    ) -> Result<Vector3<f64>, CoordError> {
        debug!(x = loc.x, y = loc.y, z = loc.z, "converting to local translation");
        let position = match self.local_type {
            LocalCoordinateType::Globe => match self.incoming_type {
                IncomingCoordinateType::Geocentric => loc / WGS84.a * self.globe_radius,
                _ => return Err(self.unsupported()),
            },
            LocalCoordinateType::CartesianUtm | LocalCoordinateType::Cartesian => {
                match self.incoming_type {
                    IncomingCoordinateType::Geocentric => {
                        let (lat, lon, elevation) = geocentric_to_geodetic(&WGS84, loc);
                        let (easting, northing) =
                            geodetic_to_utm(lat, lon, self.utm_zone, self.utm_hemisphere);
                        Vector3::new(easting, northing, elevation) - self.local_offset
                    }
                    IncomingCoordinateType::Geodetic => {
                        let (easting, northing) = geodetic_to_utm(
                            loc.x.to_radians(),
                            loc.y.to_radians(),
                            self.utm_zone,
                            self.utm_hemisphere,
                        );
                        Vector3::new(easting, northing, loc.z) - self.local_offset
                    }
                    IncomingCoordinateType::Utm => loc - self.local_offset,
                }
            }
            LocalCoordinateType::CartesianFlatEarth => {
                let lle = match self.incoming_type {
                    IncomingCoordinateType::Geocentric => {
                        let (lat, lon, elevation) = geocentric_to_geodetic(&WGS84, loc);
                        Vector3::new(lat.to_degrees(), lon.to_degrees(), elevation)
                    }
                    IncomingCoordinateType::Geodetic => loc,
                    IncomingCoordinateType::Utm => {
                        let (lat, lon) = utm_to_geodetic(
                            self.utm_zone,
                            self.utm_hemisphere,
                            loc.x,
                            loc.y,
                        );
                        Vector3::new(lat.to_degrees(), lon.to_degrees(), loc.z)
                    }
                };
                lat_lon_to_flat_earth(lle, self.flat_earth_origin, self.convergence)
                    - self.local_offset
            }
        };
        Ok(position)
    }

    /// Convert a local position back to the remote representation, zeroing
    /// any non-finite result components.
    pub fn convert_to_remote_translation(&self, translation: Vector3<f64>) -> Vector3<f64> {
        match self.try_convert_to_remote_translation(translation) {
            Ok(v) => sanitize_or_zero(v),
            Err(e) => {
                error!("remote translation conversion failed: {e}");
                Vector3::zeros()
            }
        }
    }

    /// Fallible form of [`Self::convert_to_remote_translation`].
    pub fn try_convert_to_remote_translation(
        &self,
        translation: Vector3<f64>,
    ) -> Result<Vector3<f64>, CoordError> {
        debug!(
            x = translation.x,
            y = translation.y,
            z = translation.z,
            "converting to remote translation"
        );
        let remote = match self.local_type {
            LocalCoordinateType::Globe => match self.incoming_type {
                IncomingCoordinateType::Geocentric => {
                    translation / self.globe_radius * WGS84.a
                }
                _ => return Err(self.unsupported()),
            },
            LocalCoordinateType::CartesianUtm | LocalCoordinateType::Cartesian => {
                let offset = translation + self.local_offset;
                match self.incoming_type {
                    IncomingCoordinateType::Geocentric => {
                        let (lat, lon) = utm_to_geodetic(
                            self.utm_zone,
                            self.utm_hemisphere,
                            offset.x,
                            offset.y,
                        );
                        geodetic_to_geocentric(&WGS84, lat, lon, offset.z)
                    }
                    IncomingCoordinateType::Geodetic => {
                        let (lat, lon) = utm_to_geodetic(
                            self.utm_zone,
                            self.utm_hemisphere,
                            offset.x,
                            offset.y,
                        );
                        Vector3::new(lat.to_degrees(), lon.to_degrees(), offset.z)
                    }
                    IncomingCoordinateType::Utm => offset,
                }
            }
            LocalCoordinateType::CartesianFlatEarth => {
                let lle = flat_earth_to_lat_lon(
                    translation + self.local_offset,
                    self.flat_earth_origin,
                    self.convergence,
                );
                match self.incoming_type {
                    IncomingCoordinateType::Geocentric => geodetic_to_geocentric(
                        &WGS84,
                        lle.x.to_radians(),
                        lle.y.to_radians(),
                        lle.z,
                    ),
                    IncomingCoordinateType::Geodetic => lle,
                    IncomingCoordinateType::Utm => {
                        let (easting, northing) = geodetic_to_utm(
                            lle.x.to_radians(),
                            lle.y.to_radians(),
                            self.utm_zone,
                            self.utm_hemisphere,
                        );
                        Vector3::new(easting, northing, lle.z)
                    }
                }
            }
        };
        Ok(remote)
    }

    /// Convert an incoming orientation (DIS Euler angles psi/theta/phi in
    /// radians) to scene heading/pitch/roll in degrees.
    pub fn convert_to_local_rotation(&mut self, psi: f64, theta: f64, phi: f64) -> Vector3<f64> {
        let mut rot = eulers_to_matrix(psi, theta, phi);

        match self.local_type {
            LocalCoordinateType::Globe => {
                if self.incoming_type != IncomingCoordinateType::Geocentric {
                    error!("globe local coordinates only support geocentric orientations");
                }
            }
            LocalCoordinateType::CartesianUtm
            | LocalCoordinateType::Cartesian
            | LocalCoordinateType::CartesianFlatEarth => {
                if self.apply_rotation_conversion {
                    rot = rot.transpose() * self.origin_rotation_matrix();
                }
                if self.incoming_type == IncomingCoordinateType::Geocentric {
                    rot = zflop(&rot);
                }
            }
        }

        sanitize_or_zero(matrix_to_hpr(&rot))
    }

    /// Convert a scene orientation (heading/pitch/roll in degrees) to DIS
    /// Euler angles in radians.
    pub fn convert_to_remote_rotation(&mut self, hpr: Vector3<f64>) -> Vector3<f64> {
        let mut rot = hpr_to_matrix(hpr);

        match self.local_type {
            LocalCoordinateType::Globe => {
                if self.incoming_type != IncomingCoordinateType::Geocentric {
                    error!("globe local coordinates only support geocentric orientations");
                }
            }
            LocalCoordinateType::CartesianUtm
            | LocalCoordinateType::Cartesian
            | LocalCoordinateType::CartesianFlatEarth => {
                if self.incoming_type == IncomingCoordinateType::Geocentric {
                    rot = zflop(&rot);
                }
                rot = (rot * self.origin_rotation_matrix_inverse()).transpose();
            }
        }

        let (psi, theta, phi) = matrix_to_eulers(&rot);
        sanitize_or_zero(Vector3::new(psi, theta, phi))
    }

    /// Convert a local scene position to a 1-metre MGRS string.
    pub fn xyz_to_mgrs(&mut self, pos: Vector3<f64>) -> Result<String, CoordError> {
        let old_type = self.incoming_type;

        self.set_incoming_coordinate_type(IncomingCoordinateType::Geodetic);
        let lle = self.convert_to_remote_translation(pos);
        let (zone, band) = utm_zone_for(lle.x, lle.y);

        self.set_incoming_coordinate_type(IncomingCoordinateType::Utm);
        let en = self.convert_to_remote_translation(pos);
        self.set_incoming_coordinate_type(old_type);

        utm_to_mgrs(en.x, en.y, zone, band, 5)
    }

    /// Convert an MGRS string to a local scene position. The elevation of
    /// the result is whatever z = 0 in the referenced square maps to; ground
    /// clamping is up to the caller.
    pub fn mgrs_to_xyz(&mut self, mgrs: &str) -> Result<Vector3<f64>, CoordError> {
        let (_, easting, northing) = mgrs_to_utm(0, 'A', mgrs)?;

        let old_type = self.incoming_type;
        self.set_incoming_coordinate_type(IncomingCoordinateType::Utm);
        let pos = self.convert_to_local_translation(Vector3::new(easting, northing, 0.0));
        self.set_incoming_coordinate_type(old_type);
        Ok(pos)
    }

    /// Bearing correction toward magnetic north at a geodetic position
    /// (degrees), plus the configured fixed offset.
    pub fn magnetic_north_offset_at(&self, latitude: f64, longitude: f64) -> f64 {
        self.magnetic_north_offset + angles::magnetic_north_offset(latitude, longitude)
    }

    fn unsupported(&self) -> CoordError {
        CoordError::UnsupportedConversion {
            incoming: self.incoming_type,
            local: self.local_type,
        }
    }
}
