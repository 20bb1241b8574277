//! Embedding crate
//!
//! The token module maps vocabulary indices to dense vectors.

pub mod token;

pub use token::*;
