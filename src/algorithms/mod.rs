//! Positioning algorithms

pub mod trilateration;

pub use trilateration::{solve, trilaterate, Solution};
