//! Scoped sensor subscriptions.

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use super::{
    ListenerId, LocationProvider, OrientationChannel, OrientationProvider, Permission,
    SensorError, SensorEvent, WatchId, WatchOptions,
};

/// Both sensor subscriptions for one consuming context.
///
/// Subscriptions are taken in [`Session::start`] and released in `Drop`,
/// whichever way the session ends. A sensor that cannot be subscribed is
/// reported through the sink as a [`SensorEvent::Failure`]; the session
/// carries on without it.
pub struct Session<L: LocationProvider, O: OrientationProvider> {
    location: L,
    orientation: O,
    sink: Sender<SensorEvent>,
    watch: Option<WatchId>,
    listener: Option<(OrientationChannel, ListenerId)>,
    permission: Option<Permission>,
}

impl<L: LocationProvider, O: OrientationProvider> Session<L, O> {
    /// Subscribe to both providers.
    ///
    /// Orientation is only listened to right away when the platform does
    /// not gate it behind a permission request.
    pub fn start(
        location: L,
        orientation: O,
        options: &WatchOptions,
        sink: Sender<SensorEvent>,
    ) -> Self {
        let mut session = Self {
            location,
            orientation,
            sink,
            watch: None,
            listener: None,
            permission: None,
        };

        match session.location.watch(options, session.sink.clone()) {
            Ok(id) => {
                debug!(?id, "location watch started");
                session.watch = Some(id);
            }
            Err(e) => session.fail("location", &e),
        }

        if !session.orientation.requires_permission() {
            session.listen();
        }

        session
    }

    /// Ask for orientation access and start listening once granted.
    ///
    /// Platforms without a permission gate answer [`Permission::Granted`]
    /// immediately.
    pub fn request_permission(&mut self) -> Result<Permission, SensorError> {
        let permission = if self.orientation.requires_permission() {
            self.orientation.request_permission()?
        } else {
            Permission::Granted
        };

        if permission == Permission::Granted && self.listener.is_none() {
            self.listen();
        }
        self.permission = Some(permission);
        Ok(permission)
    }

    pub fn permission(&self) -> Option<Permission> {
        self.permission
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// The channel orientation samples are arriving on, if any.
    pub fn listening_on(&self) -> Option<OrientationChannel> {
        self.listener.map(|(channel, _)| channel)
    }

    fn listen(&mut self) {
        let channel = self.orientation.preferred_channel();
        match self.orientation.listen(channel, self.sink.clone()) {
            Ok(id) => {
                debug!(?channel, ?id, "orientation listener attached");
                self.listener = Some((channel, id));
            }
            Err(e) => self.fail("orientation", &e),
        }
    }

    fn fail(&self, sensor: &str, error: &SensorError) {
        warn!(sensor, %error, "sensor subscription failed");
        // The receiver only goes away with the consuming context.
        let _ = self
            .sink
            .send(SensorEvent::Failure(capitalize(&error.to_string())));
    }
}

impl<L: LocationProvider, O: OrientationProvider> Drop for Session<L, O> {
    fn drop(&mut self) {
        if let Some(id) = self.watch.take() {
            self.location.clear_watch(id);
            debug!(?id, "location watch cleared");
        }
        if let Some((channel, id)) = self.listener.take() {
            self.orientation.unlisten(channel, id);
            debug!(?channel, ?id, "orientation listener detached");
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
