//! Observability utilities.
//!
//! The engine logs through `tracing`: one `stage` span per stage invocation
//! (fields `pipeline`, `stage`, `index`) and debug events at pipeline start
//! and finish. [`init_tracing`] installs a subscriber for binaries and tests.

mod logging;

pub use logging::{init_tracing, LogFormat, LoggingConfig};
