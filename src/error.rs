use thiserror::Error;




/**
 * Configuration errors. These are detected when a mesh, a stencil, or a
 * configuration is constructed, before any computation runs.
 */
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("the zero vector is required in the stencil definition")]
    MissingStencilOrigin,

    #[error("stencil offset has dimension {found}, expected {expected}")]
    StencilDimension { expected: usize, found: usize },

    #[error("unsupported dimension {0} (must be 1, 2 or 3)")]
    UnsupportedDimension(usize),

    #[error("invalid level bounds: min {min}, max {max} (limit {limit})")]
    InvalidLevels { min: usize, max: usize, limit: usize },

    #[error("prediction of order {order} needs a prediction width of at least {order}, got {width}")]
    PredictionWidth { order: usize, width: usize },

    #[error("prediction order {0} is not in the coefficient table (0..=5)")]
    PredictionOrder(usize),

    #[error("operands have different dimensions ({left} and {right})")]
    DimensionMismatch { left: usize, right: usize },

    #[error("the mesh domain is empty")]
    EmptyDomain,
}




/// Result alias used by the fallible constructors of this crate.
pub type Result<T> = std::result::Result<T, Error>;
