//! Progress reporting for bulk preview fetches.
//!
//! [`ProgressCallback`] decouples [`crate::prefetch`] from any rendering
//! backend. The CLI supplies an `indicatif` implementation.

/// Receives progress updates from a long-running operation.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// concurrently polled fetches.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advances progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Updates the message shown alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Marks progress as complete with a final message.
    fn finish(&self, msg: String);
}
