//! Background task implementations.
//!
//! - [`CacheFillTask`] - fetches one image and publishes it (cache miss)
//! - [`ReconcileTask`] - deletes entries outside a [`WorkingSet`]
//! - [`TaskSpawner`] - detached, supervised execution with drain on shutdown
//! - [`InFlightFills`] - dedupes concurrent fills of the same entry
//!
//! # Data Flow
//!
//! ```text
//! lookup miss ──► InFlightFills::try_claim ──► TaskSpawner ──► CacheFillTask
//! bulk insert ──► WorkingSet::complete      ──► TaskSpawner ──► ReconcileTask
//! ```

mod cache_fill;
mod in_flight;
mod reconcile;
mod spawner;

pub use cache_fill::{CacheFillTask, FillOutcome};
pub use in_flight::{FillClaim, InFlightFills};
pub use reconcile::{ReconcileReport, ReconcileTask, WorkingSet};
pub use spawner::TaskSpawner;
