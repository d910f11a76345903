//! The scheduling broker
//!
//! Each cycle fetches every routine concurrently, folds their requested
//! display settings into one merged configuration, pushes that
//! configuration, then pushes every routine with new data in registration
//! order. The cycle then sleeps for whatever is left of the fastest poll rate
//! among the routines.

mod core;
mod error;
mod state;

pub use self::core::{Broker, CycleReport, DEFAULT_ADMIN_PORT, HTTP_TIMEOUT};
pub use error::BrokerError;
pub use state::{CycleState, UNBOUNDED_INTERVAL};
