//! Scheduler runtime: logger handle, cycle ticker, and the mirror loop.

mod error;
pub mod logging;
mod runtime;
pub mod ticker;

pub use error::DaemonError;
pub use logging::Logger;
pub use runtime::{run_cycle, start_blocking, CycleOutcome, Runner};
pub use ticker::{IntervalTicker, Ticker};
