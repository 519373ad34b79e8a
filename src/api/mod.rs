//! HTTP surface for the directory.

mod types;

pub use types::*;

pub mod axum;
