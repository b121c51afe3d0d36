//! Mechanism-independent building blocks shared by the deployment backends.
//!
//! - Bridging fire-and-forget native operations into cancellable futures.
//! - Scoped registration of native completion handlers.
//! - Fallback property chains for applications that are not network deployed.
//! - Tracking the last successful update check.
//! - Reading the version metadata a host embeds at build time.

pub mod fallback;
mod last_check;
mod metadata;
pub mod poll;
mod subscription;

/// Monotonic in-memory timestamp of the last successful check.
pub use last_check::LastCheck;
/// Version metadata captured from the host package at compile time.
pub use metadata::EmbeddedVersionInfo;
/// Completion slot, poll options, and the cancellable poll loop.
pub use poll::{CompletionSlot, PollOptions, PollOutcome, run_blocking, run_cancellable};
/// Guard that deregisters a native event handler on drop.
pub use subscription::Subscription;
