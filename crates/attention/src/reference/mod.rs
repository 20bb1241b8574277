//! Portable, exact implementations of scaled dot-product attention.
//!
//! These paths favour clarity over absolute performance and expose every
//! intermediate tensor for inspection.

pub mod exact;

pub use exact::ExactAttention;
