#[macro_use] extern crate log;
#[macro_use] extern crate failure;

use failure::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use module_definitions::*;

/// Environment-driven process configuration.
pub mod config;
pub use config::ControllerConfig;

/// Resource Synthesizer: builds the desired object set.
pub mod synth;

/// Diff Engine: classifies desired vs. observed objects.
pub mod diff;

/// Image-pull secret reconciliation.
pub mod secrets_reconcile;

/// Reconciler: drives one converge step per CR event.
pub mod reconciler;

/// Status Tracker: module runtime status, updated from Pod events.
pub mod status_tracker;
pub use status_tracker::StatusTracker;

/// Watch Supervisor: establishes and dispatches the two watches.
pub mod watch;
