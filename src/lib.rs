//! Coordinate frame conversion for distributed simulation.
//!
//! Converts entity positions and orientations among the coordinate
//! representations used on a simulation network — geocentric (ECEF),
//! geodetic (WGS84 lat/lon/elevation), UTM, and MGRS grid strings — and two
//! local scene frames: a flat-earth tangent plane and a scaled whole-earth
//! globe. Orientation is converted between DIS/RPR-FOM Euler angles and
//! scene heading/pitch/roll, reconciling the differing axis conventions of
//! the geocentric and local tangent-plane frames.
//!
//! The [`frame::CoordinateFrame`] façade holds the active configuration
//! (incoming type, local type, UTM zone, origins, offsets) and dispatches to
//! the pure math in [`geodesy`] and [`mgrs`].

pub mod angles;
pub mod error;
pub mod frame;
pub mod geodesy;
pub mod mgrs;

pub use error::CoordError;
pub use frame::{CoordinateFrame, IncomingCoordinateType, LocalCoordinateType};
pub use geodesy::utm::Hemisphere;
