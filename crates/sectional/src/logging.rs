//! Logging facilities for Sectional.
//!
//! Sectional instruments itself with the `tracing` crate. Install a
//! subscriber in the host application to see logs:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Adapter facade target.
    pub const ADAPTER: &str = "sectional::adapter";
    /// Update transaction target.
    pub const UPDATER: &str = "sectional::updater";
    /// Working range tracker target.
    pub const WORKING_RANGE: &str = "sectional::working_range";
}
