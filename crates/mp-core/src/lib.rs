//! mp-core: shared foundation for momentum.
//!
//! Contains:
//! - clock (monotonic time sources, real and manual)
//! - numeric (parameter validation)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod numeric;

pub use clock::{Clock, ManualClock, MonotonicClock, elapsed_millis, elapsed_secs};
pub use error::{CoreError, CoreResult};
pub use numeric::{ensure_finite, ensure_positive};
