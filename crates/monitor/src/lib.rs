//! Glucose monitoring control loop.
//!
//! - [`MonitoringController`]: start/stop state machine owning the
//!   periodic poll → classify → actuate task, plus the manual check.
//! - [`ConnectionTester`]: one-shot diagnostic that exercises the reading
//!   source and the bulb together and reports a single composite result.
//! - [`MonitoringSession`]: the state the controller guards.

pub mod controller;
pub mod error;
pub mod session;
pub mod tester;

pub use controller::{BulbOutcome, CheckOutcome, IterationOutcome, MonitoringController};
pub use error::MonitorError;
pub use session::{needs_actuation, MonitorState, MonitoringSession, DEBOUNCE_DELTA};
pub use tester::{CompositeResult, ConnectionTestReport, ConnectionTester, TesterConfig};
