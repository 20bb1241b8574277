//! Building blocks shared by the attention walkthroughs.
//!
//! * [`init`] owns the random number generator used to sample parameters so
//!   callers can make every run reproducible by supplying a seed.
//! * [`checks`] provides shape and dtype assertions used at component
//!   boundaries.
//! * [`linear`] implements a bias-free projection `x · Wᵀ` with weights
//!   shaped `(out_dim, in_dim)`.
//! * [`projection`] groups three linear maps into query/key/value projections,
//!   either for a single head or stacked along a leading head axis.

pub mod checks;
pub mod init;
pub mod linear;
pub mod projection;

use thiserror::Error;

pub use init::ParamInit;
pub use linear::{Linear, LinearInit};
pub use projection::{MultiHeadProjection, ProjectionDims, Qkv, QkvProjection};

/// Errors raised while building or running layers.
#[derive(Debug, Error)]
pub enum LayerError {
    /// A tensor does not match the layout expected by the layer.
    #[error("invalid shape for {name}: {details}")]
    InvalidShape { name: &'static str, details: String },
    /// A tensor carries a dtype the layer cannot handle.
    #[error("invalid dtype for {name}: {details}")]
    InvalidDType { name: &'static str, details: String },
    /// Construction parameters are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Failure reported by the tensor backend.
    #[error(transparent)]
    Candle(#[from] candle_core::Error),
}

pub type Result<T> = std::result::Result<T, LayerError>;
