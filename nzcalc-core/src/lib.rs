//! Core projection and blending engine for ambition-level scenarios.
//!
//! A projection pass runs leaf to root:
//!
//! 1. [`cleaner`] recodes and coerces a raw historical table and estimates growth rates
//! 2. [`shares`] converts absolute values into shares of the row total
//! 3. [`bau`] extends each series over the calculator horizon
//! 4. [`ambition`] turns a selected (possibly fractional) ambition level into a target
//! 5. [`transition`] blends the business-as-usual pathway into that target
//! 6. [`factors`] and [`aggregation`] derive and sum quantities such as emissions

pub mod aggregation;
pub mod ambition;
pub mod bau;
pub mod cleaner;
pub mod errors;
pub mod factors;
pub mod scenario;
pub mod shares;
pub mod timeseries;
pub mod transition;
