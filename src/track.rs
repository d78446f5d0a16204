//! Live tracking: sensor events in, compass readings out.
//!
//! The tracker is the only writer of the compass. Providers push events
//! into a channel from wherever they run; [`Tracker::pump`] drains them in
//! arrival order on the consuming thread, so a reader never sees a
//! half-applied {coordinates, heading} pair.

use crossbeam_channel::{Receiver, unbounded};
use tracing::{debug, warn};

use crate::compass::Compass;
use crate::model::Reading;
use crate::sensors::{
    LocationProvider, OrientationProvider, Permission, SensorEvent, Session, WatchOptions,
};

pub struct Tracker<L: LocationProvider, O: OrientationProvider> {
    compass: Compass,
    session: Session<L, O>,
    events: Receiver<SensorEvent>,
}

impl<L: LocationProvider, O: OrientationProvider> Tracker<L, O> {
    /// Subscribe to both providers and start feeding `compass`.
    pub fn start(compass: Compass, location: L, orientation: O, options: &WatchOptions) -> Self {
        let (sink, events) = unbounded();
        let session = Session::start(location, orientation, options, sink);
        Self {
            compass,
            session,
            events,
        }
    }

    pub fn compass(&self) -> &Compass {
        &self.compass
    }

    pub fn compass_mut(&mut self) -> &mut Compass {
        &mut self.compass
    }

    pub fn session(&self) -> &Session<L, O> {
        &self.session
    }

    /// Apply every pending event. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply one event to the compass.
    pub fn apply(&mut self, event: SensorEvent) -> Option<Reading> {
        match event {
            SensorEvent::Location(coords) => Some(self.compass.update_location(coords)),
            SensorEvent::LocationError(message) => {
                Some(self.compass.report_error(format!("GPS Error: {message}")))
            }
            SensorEvent::Orientation(sample) => self.compass.update_orientation(&sample),
            SensorEvent::Failure(message) => Some(self.compass.report_error(message)),
        }
    }

    /// Ask for orientation access.
    ///
    /// Call this from a user gesture. Denials and failed requests are
    /// reported on the compass; the heading stays where it was.
    pub fn request_permission(&mut self) -> Permission {
        match self.session.request_permission() {
            Ok(Permission::Granted) => {
                debug!("compass permission granted");
                Permission::Granted
            }
            Ok(Permission::Denied) => {
                self.compass.report_error("Compass permission denied");
                Permission::Denied
            }
            Err(e) => {
                warn!(error = %e, "compass permission request failed");
                self.compass.report_error("Error requesting compass permission");
                Permission::Denied
            }
        }
    }

    /// Release both subscriptions and hand the compass back.
    pub fn stop(self) -> Compass {
        let Self {
            compass, session, ..
        } = self;
        drop(session);
        compass
    }
}
