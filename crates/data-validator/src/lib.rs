//! Detection Record Validation
//!
//! Checks raw provider output before it enters the analysis pipelines.
//! Malformed records are dropped one by one; the rest of the frame survives.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, ValidationResult, Validator};
