//! DataStore ingestion tracking
//!
//! After a file lands on the server, an asynchronous job loads it into the
//! DataStore. [`monitor`] observes that job; [`waiter`] decides how long to keep
//! looking and when to re-trigger it.

pub mod monitor;
pub mod waiter;

pub use monitor::{IngestionMonitor, JobStatusMonitor, MonitorKind, PollStatus, ResourceStatusMonitor};
pub use waiter::{wait_for_ingestion, IngestionWaiter, WaitConfig, WaitOutcome, WaitReport, WaitState};
