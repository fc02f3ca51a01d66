use thiserror::Error;

use crate::frame::{IncomingCoordinateType, LocalCoordinateType};

#[derive(Error, Debug)]
pub enum CoordError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported conversion: {incoming:?} incoming with {local:?} local coordinates")]
    UnsupportedConversion {
        incoming: IncomingCoordinateType,
        local: LocalCoordinateType,
    },
}
