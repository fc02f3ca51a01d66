//! Ellipsoidal geodesy: geocentric conversion, transverse Mercator
//! projection, and UTM zone rules.
//!
//! Everything in this module is stateless and safe to call from any thread.
//! Angles are radians unless a name says otherwise.

pub mod ellipsoid;
pub mod geocentric;
pub mod transverse_mercator;
pub mod utm;

pub use ellipsoid::{Ellipsoid, WGS84};
