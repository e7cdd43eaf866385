//! Domain types for Netfolio

pub mod price_matrix;

pub use price_matrix::{PriceMatrix, PriceMatrixError};

/// Symbol type alias
pub type Symbol = String;
