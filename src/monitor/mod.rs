//! Progress reporting and cooperative cancellation.

pub mod domain;
pub mod service;

pub use domain::{Progress, TaskMonitor};
pub use service::{CancelToken, MonitorHandle, NullMonitor, StandardMonitor};
