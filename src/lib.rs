//! Python extension for the net-zero scenario calculator.
//!
//! The projection engine lives in `nzcalc-core` and the travel modules in
//! `nzcalc-components`; this crate only exposes them to the dashboard as `nzcalc._lib`.

mod python;

pub use nzcalc_components;
pub use nzcalc_core;
