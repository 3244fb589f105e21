//! GLP-1 Calculator Shared Library
//!
//! Height parsing, BMI and healthy-range math, peptide rate tables and the
//! weight projection. Used by the CLI and the WASM bindings.

pub mod errors;
pub mod health_metrics;
pub mod projection;
pub mod titration;
pub mod units;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use health_metrics::*;
pub use projection::*;
pub use titration::*;
pub use units::*;
pub use validation::ValidationError;
