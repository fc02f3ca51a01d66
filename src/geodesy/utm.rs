//! UTM zone rules and the UTM projection wrappers.
//!
//! Zone numbering follows the standard 6-degree bands plus the Norway and
//! Svalbard exceptions. The projection itself is the transverse Mercator of
//! the zone's central meridian with the usual UTM constants.

use std::f64::consts::PI;

use super::ellipsoid::{Ellipsoid, WGS84};
use super::transverse_mercator::TransverseMercatorParams;

/// Scale factor on the central meridian of every UTM zone.
pub const CENTRAL_MERIDIAN_SCALE: f64 = 0.9996;

const FALSE_EASTING: f64 = 500_000.0;
const SOUTH_FALSE_NORTHING: f64 = 10_000_000.0;

/// North or south UTM hemisphere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Hemisphere {
    #[default]
    North,
    South,
}

impl Hemisphere {
    /// Parse the single-character designator; anything other than 's'/'S'
    /// reads as north.
    pub fn from_char(c: char) -> Self {
        if c == 's' || c == 'S' {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }

    pub fn letter(self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        }
    }
}

/// Compute the UTM zone number and latitude band letter for a geodetic
/// position given in degrees.
///
/// Latitude is clamped to the UTM domain [-80, 84]. The band letter skips
/// I and O; everything at or above 80 degrees maps to band X.
pub fn utm_zone_for(latitude: f64, longitude: f64) -> (u32, char) {
    let latitude = latitude.clamp(-80.0, 84.0);

    // Whole-degree values truncate toward zero, matching the comparisons in
    // the zone exception table.
    let lat_deg = latitude as i64;
    let lon_deg = longitude as i64;

    let mut zone: u32 = if longitude < 180.0 {
        (31.0 + longitude / 6.0) as u32
    } else {
        (longitude / 6.0 - 29.0) as u32
    };
    if zone > 60 {
        zone = 1;
    }

    // Southern Norway and Svalbard exceptions.
    if lat_deg > 55 && lat_deg < 64 && lon_deg > -1 && lon_deg < 3 {
        zone = 31;
    } else if lat_deg > 55 && lat_deg < 64 && lon_deg > 2 && lon_deg < 12 {
        zone = 32;
    } else if lat_deg > 71 && lon_deg > -1 && lon_deg < 9 {
        zone = 31;
    } else if lat_deg > 71 && lon_deg > 8 && lon_deg < 21 {
        zone = 33;
    } else if lat_deg > 71 && lon_deg > 20 && lon_deg < 33 {
        zone = 35;
    } else if lat_deg > 71 && lon_deg > 32 && lon_deg < 42 {
        zone = 37;
    }

    let band = if latitude < 80.0 {
        let mut c = (b'C' + ((latitude + 80.0) / 8.0).floor() as u8) as char;
        // I and O are not used as band letters.
        if c >= 'I' {
            c = (c as u8 + 1) as char;
        }
        if c >= 'O' {
            c = (c as u8 + 1) as char;
        }
        c
    } else {
        'X'
    };

    (zone, band)
}

/// Central meridian of a UTM zone, in radians.
fn central_meridian(zone: u32) -> f64 {
    if zone >= 31 {
        f64::from(6 * zone as i32 - 183).to_radians()
    } else {
        f64::from(6 * zone as i32 + 177).to_radians()
    }
}

fn zone_params(ellipsoid: &Ellipsoid, zone: u32, hemisphere: Hemisphere) -> TransverseMercatorParams {
    let false_northing = match hemisphere {
        Hemisphere::North => 0.0,
        Hemisphere::South => SOUTH_FALSE_NORTHING,
    };
    TransverseMercatorParams::new(
        ellipsoid,
        0.0,
        central_meridian(zone),
        FALSE_EASTING,
        false_northing,
        CENTRAL_MERIDIAN_SCALE,
    )
}

/// Project geodetic latitude/longitude (radians) into the given UTM zone,
/// returning easting and northing in metres.
pub fn geodetic_to_utm(
    latitude: f64,
    longitude: f64,
    zone: u32,
    hemisphere: Hemisphere,
) -> (f64, f64) {
    let mut longitude = longitude;
    // Keep negative longitudes on the positive side of the zone's central
    // meridian wrap; the small bias avoids landing exactly on the seam.
    if longitude < 0.0 {
        longitude += 2.0 * PI + 1.0e-10;
    }
    zone_params(&WGS84, zone, hemisphere).forward(latitude, longitude)
}

/// Unproject UTM easting/northing (metres) in the given zone back to
/// geodetic latitude/longitude (radians).
pub fn utm_to_geodetic(zone: u32, hemisphere: Hemisphere, easting: f64, northing: f64) -> (f64, f64) {
    zone_params(&WGS84, zone, hemisphere).inverse(easting, northing)
}
