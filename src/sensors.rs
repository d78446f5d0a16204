//! Sensor providers: the location and orientation streams feeding the compass.
//!
//! Providers are external collaborators. They push [`SensorEvent`]s into a
//! channel handed to them on subscription and must stop pushing once
//! unsubscribed. A [`Session`] owns both subscriptions and releases them
//! when dropped.

mod replay;
mod session;

use std::time::Duration;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::model::{Coordinates, OrientationSample};

pub use replay::{Feed, FeedError, PermissionGate, ReplayLocation, ReplayOrientation, Step};
pub use session::Session;

/// Something a provider observed.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// A new position fix.
    Location(Coordinates),

    /// A transient location failure (e.g. a fix timeout). The watch stays active.
    LocationError(String),

    /// A raw orientation sample.
    Orientation(OrientationSample),

    /// A condition to show the user verbatim, such as a missing sensor.
    Failure(String),
}

/// Errors a provider can raise while subscribing or asking for permission.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("{0} not supported")]
    Unavailable(&'static str),

    #[error("permission request failed: {0}")]
    PermissionRequest(String),
}

/// Options for a continuous location watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// How long a single fix may take before a location error is reported.
    pub timeout: Duration,
    /// The oldest cached fix the provider may hand out.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::from_millis(1_000),
        }
    }
}

/// Handle for an active location watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Handle for an active orientation listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The orientation event channel a listener is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationChannel {
    /// Orientation referenced to the earth frame.
    Absolute,

    /// Orientation relative to an arbitrary device-dependent frame.
    #[default]
    Relative,
}

/// The answer to an orientation permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    Granted,
    Denied,
}

/// A continuous source of position fixes.
pub trait LocationProvider {
    /// Start watching. Fixes and errors are pushed into `sink` until
    /// [`clear_watch`](Self::clear_watch) is called.
    fn watch(
        &mut self,
        options: &WatchOptions,
        sink: Sender<SensorEvent>,
    ) -> Result<WatchId, SensorError>;

    fn clear_watch(&mut self, id: WatchId);
}

/// A continuous source of device orientation samples.
pub trait OrientationProvider {
    /// Whether the platform offers the earth-referenced channel.
    fn supports_absolute(&self) -> bool;

    /// Whether events are withheld until a permission request is granted.
    fn requires_permission(&self) -> bool;

    /// Ask the user for access. Must be triggered by a user gesture on
    /// platforms that gate it.
    fn request_permission(&mut self) -> Result<Permission, SensorError>;

    fn listen(
        &mut self,
        channel: OrientationChannel,
        sink: Sender<SensorEvent>,
    ) -> Result<ListenerId, SensorError>;

    fn unlisten(&mut self, channel: OrientationChannel, id: ListenerId);

    /// The channel to listen on: absolute when offered, relative otherwise.
    fn preferred_channel(&self) -> OrientationChannel {
        if self.supports_absolute() {
            OrientationChannel::Absolute
        } else {
            OrientationChannel::Relative
        }
    }
}
