//! Travel and aviation modules built on the `nzcalc-core` projection engine.
//!
//! Each module projects demand and category shares from historical activity and
//! derives emissions from the projected activity:
//!
//! - [`aviation`]: flights by seating class for long-haul, short-haul and domestic travel
//! - [`travel`]: ground travel by mode, split into engine types
//!
//! [`module::run_module`] runs the shared demand-and-shares pipeline and
//! [`overview::EmissionsOverview`] sums module outputs into the dashboard totals.

pub mod aviation;
pub mod ghg;
pub mod module;
pub mod overview;
pub mod parameters;
pub mod population;
pub mod travel;
