//! Adapter over a manifest-reading deployment layer.
//!
//! Unlike the system service, a manifest connection is opened explicitly for
//! one update location and reports all of its completions through a single
//! event stream.

mod backend;
mod connection;
mod provider;

pub use backend::ManifestBackend;
pub use connection::{
    ManifestConnector, ManifestDeployment, ManifestEvent, ManifestEventHandler, SubscriptionId,
};
pub use provider::ManifestProvider;
