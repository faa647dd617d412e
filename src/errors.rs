use thiserror::Error;

/// Top-level error type for surface configuration and evaluation.
#[derive(Debug, Error)]
pub enum SurfoError {
    /// Malformed numeric input or a parametric value outside its range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Evaluation was attempted before the configuration was complete.
    #[error("precondition not met: {0}")]
    PreconditionNotMet(String),

    /// A degenerate weight was encountered during homogeneous conversion
    /// or rational evaluation.
    #[error("division by zero: {0}")]
    DivisionByZero(String),

    /// A normal was requested too close to the domain boundary.
    #[error("parameter ({u}, {v}) is within delta = {delta} of the domain boundary")]
    DomainError { u: f64, v: f64, delta: f64 },

    /// The tangent vectors are parallel at the requested parameter.
    #[error("degenerate surface normal at ({u}, {v})")]
    DegenerateNormal { u: f64, v: f64 },

    /// A control point file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SurfoError>;

/// Lossy scalar conversion for error payloads.
pub(crate) fn as_f64<T: num_traits::ToPrimitive>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
