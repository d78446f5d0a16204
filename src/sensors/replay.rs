//! Replay of a recorded sensor feed.
//!
//! A feed is JSONL, one sensor event per line, in arrival order:
//!
//! ```text
//! {"kind":"location","latitude":12.30,"longitude":76.64}
//! {"kind":"orientation","channel":"absolute","alpha":270.0}
//! {"kind":"orientation","compass-heading":88.5}
//! {"kind":"location-error","message":"Timeout expired"}
//! {"kind":"target","name":"Kashi","latitude":25.31,"longitude":83.01}
//! ```
//!
//! The feed is split into a location half and an orientation half that
//! implement the provider traits. Stepping the feed delivers the next line
//! to whoever is subscribed at that moment; a line nobody listens for is
//! dropped, the same as a live sensor tick nobody is attached to.
//!
//! `target` lines record the user picking a new destination. They are not
//! sensor events and are handed back to the caller of [`Feed::step`].

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::Sender;
use serde::Deserialize;
use tracing::trace;

use super::{
    ListenerId, LocationProvider, OrientationChannel, OrientationProvider, Permission,
    SensorError, SensorEvent, WatchId, WatchOptions,
};
use crate::model::{Coordinates, LocationTarget, OrientationSample};

/// Errors that can occur while loading a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
enum FeedLine {
    Location {
        latitude: f64,
        longitude: f64,
    },
    LocationError {
        message: String,
    },
    Orientation {
        #[serde(default)]
        channel: OrientationChannel,
        #[serde(default)]
        compass_heading: Option<f64>,
        #[serde(default)]
        alpha: Option<f64>,
    },
    Target {
        name: String,
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        description: Option<String>,
    },
}

/// What happened when the feed advanced one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A sensor line, delivered to this many subscribers.
    Delivered(usize),

    /// The user picked a new target.
    Retarget(LocationTarget),
}

/// How the replayed platform answers orientation permission requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermissionGate {
    /// Events flow without asking.
    #[default]
    NotRequired,
    Grant,
    Deny,
    /// The request itself errors out.
    Fail,
}

#[derive(Default)]
struct Routes {
    next_id: u64,
    location: Vec<(u64, Sender<SensorEvent>)>,
    orientation: Vec<(u64, OrientationChannel, Sender<SensorEvent>)>,
}

impl Routes {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

type SharedRoutes = Arc<Mutex<Routes>>;

fn lock(routes: &SharedRoutes) -> MutexGuard<'_, Routes> {
    routes.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A recorded feed and its playback position.
pub struct Feed {
    lines: Vec<FeedLine>,
    cursor: usize,
    routes: SharedRoutes,
}

impl Feed {
    /// Load a feed from a JSONL file.
    pub fn open(path: &Path) -> Result<Self, FeedError> {
        let file = fs::File::open(path)?;
        Self::parse(io::BufReader::new(file))
    }

    /// Parse a feed. Blank lines are skipped.
    pub fn parse(reader: impl BufRead) -> Result<Self, FeedError> {
        let mut lines = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed = serde_json::from_str(&line).map_err(|source| FeedError::Parse {
                line: index + 1,
                source,
            })?;
            lines.push(parsed);
        }
        Ok(Self {
            lines,
            cursor: 0,
            routes: SharedRoutes::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The location half of this feed.
    pub fn location(&self) -> ReplayLocation {
        ReplayLocation {
            routes: Arc::clone(&self.routes),
        }
    }

    /// The orientation half of this feed, replaying a platform with the
    /// given capabilities.
    pub fn orientation(&self, absolute: bool, gate: PermissionGate) -> ReplayOrientation {
        ReplayOrientation {
            routes: Arc::clone(&self.routes),
            absolute,
            gate,
        }
    }

    /// Advance one line, or return `None` once the feed is exhausted.
    pub fn step(&mut self) -> Option<Step> {
        let line = self.lines.get(self.cursor)?;
        self.cursor += 1;

        let routes = lock(&self.routes);
        let delivered = match line {
            FeedLine::Location {
                latitude,
                longitude,
            } => {
                let event = SensorEvent::Location(Coordinates::new(*latitude, *longitude));
                broadcast(routes.location.iter().map(|(_, sink)| sink), &event)
            }
            FeedLine::LocationError { message } => {
                let event = SensorEvent::LocationError(message.clone());
                broadcast(routes.location.iter().map(|(_, sink)| sink), &event)
            }
            FeedLine::Orientation {
                channel,
                compass_heading,
                alpha,
            } => {
                let sample = OrientationSample::from_fields(*compass_heading, *alpha);
                let event = SensorEvent::Orientation(sample);
                let sinks = routes
                    .orientation
                    .iter()
                    .filter(|(_, c, _)| c == channel)
                    .map(|(_, _, sink)| sink);
                broadcast(sinks, &event)
            }
            FeedLine::Target {
                name,
                latitude,
                longitude,
                description,
            } => {
                return Some(Step::Retarget(LocationTarget {
                    name: name.clone(),
                    coords: Coordinates::new(*latitude, *longitude),
                    description: description.clone(),
                }));
            }
        };

        trace!(line = self.cursor, delivered, "feed step");
        Some(Step::Delivered(delivered))
    }
}

fn broadcast<'a>(
    sinks: impl Iterator<Item = &'a Sender<SensorEvent>>,
    event: &SensorEvent,
) -> usize {
    let mut delivered = 0;
    for sink in sinks {
        if sink.send(event.clone()).is_ok() {
            delivered += 1;
        }
    }
    delivered
}

/// Location provider backed by a [`Feed`].
pub struct ReplayLocation {
    routes: SharedRoutes,
}

impl LocationProvider for ReplayLocation {
    fn watch(
        &mut self,
        options: &WatchOptions,
        sink: Sender<SensorEvent>,
    ) -> Result<WatchId, SensorError> {
        // Recorded fixes already carry whatever accuracy and age they had.
        trace!(
            high_accuracy = options.high_accuracy,
            timeout = ?options.timeout,
            maximum_age = ?options.maximum_age,
            "replaying location watch"
        );
        let mut routes = lock(&self.routes);
        let id = routes.next_id();
        routes.location.push((id, sink));
        Ok(WatchId(id))
    }

    fn clear_watch(&mut self, id: WatchId) {
        lock(&self.routes).location.retain(|(i, _)| *i != id.0);
    }
}

/// Orientation provider backed by a [`Feed`].
pub struct ReplayOrientation {
    routes: SharedRoutes,
    absolute: bool,
    gate: PermissionGate,
}

impl OrientationProvider for ReplayOrientation {
    fn supports_absolute(&self) -> bool {
        self.absolute
    }

    fn requires_permission(&self) -> bool {
        self.gate != PermissionGate::NotRequired
    }

    fn request_permission(&mut self) -> Result<Permission, SensorError> {
        match self.gate {
            PermissionGate::NotRequired | PermissionGate::Grant => Ok(Permission::Granted),
            PermissionGate::Deny => Ok(Permission::Denied),
            PermissionGate::Fail => Err(SensorError::PermissionRequest(
                "the replayed platform rejected the request".to_string(),
            )),
        }
    }

    fn listen(
        &mut self,
        channel: OrientationChannel,
        sink: Sender<SensorEvent>,
    ) -> Result<ListenerId, SensorError> {
        if channel == OrientationChannel::Absolute && !self.absolute {
            return Err(SensorError::Unavailable("absolute orientation"));
        }
        let mut routes = lock(&self.routes);
        let id = routes.next_id();
        routes.orientation.push((id, channel, sink));
        Ok(ListenerId(id))
    }

    fn unlisten(&mut self, _channel: OrientationChannel, id: ListenerId) {
        lock(&self.routes).orientation.retain(|(i, _, _)| *i != id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crossbeam_channel::unbounded;

    const FEED: &str = r#"
{"kind":"orientation","alpha":10.0}
{"kind":"location","latitude":0.0,"longitude":0.0}
{"kind":"orientation","channel":"absolute","alpha":90.0}
{"kind":"orientation","compass-heading":45.0,"alpha":90.0}
{"kind":"location-error","message":"Timeout expired"}
{"kind":"target","name":"Kashi","latitude":25.3109,"longitude":83.0107}
"#;

    fn feed() -> Feed {
        Feed::parse(FEED.as_bytes()).unwrap()
    }

    #[test]
    fn parses_all_lines() {
        let feed = feed();
        assert_eq!(feed.len(), 6);
        assert!(!feed.is_empty());
    }

    #[test]
    fn reports_bad_line_number() {
        let input = r#"{"kind":"location","latitude":1.0,"longitude":2.0}
{"kind":"teleport"}
"#;
        let err = Feed::parse(input.as_bytes()).err().unwrap();
        assert!(matches!(err, FeedError::Parse { line: 2, .. }));
    }

    #[test]
    fn delivers_only_to_matching_subscribers() {
        let mut feed = feed();
        let mut location = feed.location();
        let mut orientation = feed.orientation(false, PermissionGate::NotRequired);
        let (tx, rx) = unbounded();

        location.watch(&WatchOptions::default(), tx.clone()).unwrap();
        orientation.listen(OrientationChannel::Relative, tx).unwrap();

        let steps: Vec<Step> = std::iter::from_fn(|| feed.step()).collect();
        assert_eq!(
            steps[..5],
            [
                Step::Delivered(1),
                Step::Delivered(1),
                Step::Delivered(0),
                Step::Delivered(1),
                Step::Delivered(1),
            ]
        );

        let events: Vec<SensorEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SensorEvent::Orientation(OrientationSample::Rotation { alpha: Some(10.0) }),
                SensorEvent::Location(Coordinates::new(0.0, 0.0)),
                SensorEvent::Orientation(OrientationSample::Compass { heading: 45.0 }),
                SensorEvent::LocationError("Timeout expired".into()),
            ]
        );
    }

    #[test]
    fn cleared_watch_stops_delivery() {
        let mut feed = feed();
        let mut location = feed.location();
        let (tx, rx) = unbounded();

        let id = location.watch(&WatchOptions::default(), tx).unwrap();
        feed.step();
        feed.step();
        location.clear_watch(id);
        while feed.step().is_some() {}

        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn target_lines_are_handed_back() {
        let mut feed = feed();
        let last = std::iter::from_fn(|| feed.step()).last().unwrap();
        match last {
            Step::Retarget(target) => {
                assert_eq!(target.name, "Kashi");
                assert_eq!(target.coords, Coordinates::new(25.3109, 83.0107));
                assert_eq!(target.description, None);
            }
            Step::Delivered(_) => panic!("expected a retarget step"),
        }
    }

    #[test]
    fn absolute_channel_requires_support() {
        let feed = feed();
        let mut orientation = feed.orientation(false, PermissionGate::NotRequired);
        let (tx, _rx) = unbounded();
        assert!(matches!(
            orientation.listen(OrientationChannel::Absolute, tx),
            Err(SensorError::Unavailable(_))
        ));
    }

    #[test]
    fn permission_gate_answers() {
        let feed = feed();
        let cases = [
            (PermissionGate::Grant, Some(Permission::Granted)),
            (PermissionGate::Deny, Some(Permission::Denied)),
            (PermissionGate::Fail, None),
        ];
        for (gate, expected) in cases {
            let mut orientation = feed.orientation(false, gate);
            assert!(orientation.requires_permission());
            assert_eq!(orientation.request_permission().ok(), expected);
        }
        assert!(
            !feed
                .orientation(true, PermissionGate::NotRequired)
                .requires_permission()
        );
    }
}
