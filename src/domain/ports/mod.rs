//! Port trait definitions (Hexagonal Architecture)
//!
//! - CloudRunSource: enumeration, configuration and log queries against Cloud Run
//! - Clock: the notion of "now" used to place log windows

pub mod clock;
pub mod cloud_run_source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cloud_run_source::CloudRunSource;
