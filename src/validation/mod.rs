//! Input validation for snapshot data

pub mod data;

pub use data::{MissingField, SampleValidation, SampleValidator};
