//! The compass: a single state holder composing heading and bearing.
//!
//! Inputs arrive one at a time (a location fix, an orientation sample, a new
//! target, an error). Each one is applied and the bearing result is
//! recomputed synchronously from the latest snapshot, then observers are
//! notified with the new [`Reading`].
//!
//! ```text
//! location ──▶ coords ──┐
//!                       ├──▶ BearingCalculator ──▶ Reading ──▶ observers
//! sample ──▶ heading ───┘
//! ```

use jiff::Timestamp;
use tracing::{debug, info};

use crate::geo::BearingCalculator;
use crate::heading;
use crate::model::{
    BearingResult, Coordinates, LocationTarget, OrientationSample, Reading, Transition,
};

type Observer = Box<dyn FnMut(&Reading)>;

pub struct Compass {
    calculator: BearingCalculator,
    target: LocationTarget,
    coords: Option<Coordinates>,
    heading: f64,
    result: BearingResult,
    error: Option<String>,
    observers: Vec<Observer>,
}

impl Compass {
    pub fn new(target: LocationTarget, calculator: BearingCalculator) -> Self {
        Self {
            calculator,
            target,
            coords: None,
            heading: 0.0,
            result: BearingResult::default(),
            error: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer, called after every recomputation in
    /// registration order.
    pub fn observe(&mut self, observer: impl FnMut(&Reading) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn target(&self) -> &LocationTarget {
        &self.target
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Apply a new location fix.
    pub fn update_location(&mut self, coords: Coordinates) -> Reading {
        debug!(%coords, "location update");
        self.coords = Some(coords);
        self.recompute()
    }

    /// Apply an orientation sample.
    ///
    /// Samples with no usable signal keep the previous heading and produce
    /// no reading.
    pub fn update_orientation(&mut self, sample: &OrientationSample) -> Option<Reading> {
        let heading = heading::normalize(sample)?;
        self.heading = heading;
        Some(self.recompute())
    }

    /// Point the compass at a different target.
    pub fn set_target(&mut self, target: LocationTarget) -> Reading {
        info!(name = %target.name, "target changed");
        self.target = target;
        self.recompute()
    }

    /// Record the latest provider error. Computation carries on; the
    /// message stays until replaced.
    pub fn report_error(&mut self, message: impl Into<String>) -> Reading {
        let message = message.into();
        info!(%message, "sensor error");
        self.error = Some(message);
        let reading = self.snapshot(None);
        self.notify(&reading);
        reading
    }

    /// The current snapshot, without recomputing.
    pub fn reading(&self) -> Reading {
        self.snapshot(None)
    }

    fn recompute(&mut self) -> Reading {
        let was_aligned = self.result.is_aligned;

        if let Some(result) =
            self.calculator
                .calculate(self.coords, self.target.coords, self.heading)
        {
            self.result = result;
        }

        let transition = match (was_aligned, self.result.is_aligned) {
            (false, true) => Some(Transition::Entered),
            (true, false) => Some(Transition::Left),
            _ => None,
        };
        if let Some(transition) = transition {
            debug!(?transition, angle_diff = self.result.angle_diff, "alignment changed");
        }

        let reading = self.snapshot(transition);
        self.notify(&reading);
        reading
    }

    fn snapshot(&self, transition: Option<Transition>) -> Reading {
        Reading {
            heading: self.heading,
            coords: self.coords,
            result: self.result,
            guidance: self.result.guidance(),
            error: self.error.clone(),
            transition,
            at: Timestamp::now(),
        }
    }

    fn notify(&mut self, reading: &Reading) {
        for observer in &mut self.observers {
            observer(reading);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::model::Guidance;

    fn target_at(latitude: f64, longitude: f64) -> LocationTarget {
        LocationTarget {
            name: "Test".into(),
            coords: Coordinates::new(latitude, longitude),
            description: None,
        }
    }

    fn compass_toward(latitude: f64, longitude: f64) -> Compass {
        Compass::new(target_at(latitude, longitude), BearingCalculator::default())
    }

    fn alpha(value: f64) -> OrientationSample {
        OrientationSample::Rotation { alpha: Some(value) }
    }

    #[test]
    fn starts_zeroed() {
        let reading = compass_toward(0.0, 90.0).reading();
        assert_eq!(reading.heading, 0.0);
        assert_eq!(reading.coords, None);
        assert_eq!(reading.result, BearingResult::default());
        assert_eq!(reading.error, None);
    }

    #[test]
    fn heading_without_location_keeps_default_result() {
        let mut compass = compass_toward(0.0, 90.0);
        let reading = compass.update_orientation(&alpha(270.0)).unwrap();
        assert_eq!(reading.heading, 90.0);
        assert_eq!(reading.result, BearingResult::default());
    }

    #[test]
    fn location_then_heading_aligns() {
        let mut compass = compass_toward(0.0, 90.0);
        let reading = compass.update_location(Coordinates::new(0.0, 0.0));
        assert!((reading.result.bearing - 90.0).abs() < 1e-9);
        assert_eq!(reading.guidance, Guidance::TurnRight);

        let reading = compass
            .update_orientation(&OrientationSample::Compass { heading: 88.0 })
            .unwrap();
        assert!(reading.result.is_aligned);
        assert_eq!(reading.guidance, Guidance::Aligned);
        assert_eq!(reading.transition, Some(Transition::Entered));
    }

    #[test]
    fn blank_sample_keeps_heading_and_is_silent() {
        let mut compass = compass_toward(0.0, 90.0);
        compass.update_orientation(&alpha(90.0));
        assert_eq!(compass.heading(), 270.0);

        assert!(compass.update_orientation(&OrientationSample::Blank).is_none());
        assert!(
            compass
                .update_orientation(&OrientationSample::Rotation { alpha: None })
                .is_none()
        );
        assert_eq!(compass.heading(), 270.0);
    }

    #[test]
    fn leaving_alignment_is_reported_once() {
        let mut compass = compass_toward(0.0, 90.0);
        compass.update_location(Coordinates::new(0.0, 0.0));
        compass.update_orientation(&OrientationSample::Compass { heading: 90.0 });

        let left = compass
            .update_orientation(&OrientationSample::Compass { heading: 120.0 })
            .unwrap();
        assert_eq!(left.transition, Some(Transition::Left));
        assert_eq!(left.guidance, Guidance::TurnLeft);

        let still_out = compass
            .update_orientation(&OrientationSample::Compass { heading: 130.0 })
            .unwrap();
        assert_eq!(still_out.transition, None);
    }

    #[test]
    fn flickers_at_boundary() {
        let mut compass = compass_toward(0.0, 90.0);
        compass.update_location(Coordinates::new(0.0, 0.0));

        let headings = [80.5, 79.5, 80.5, 79.5];
        let aligned: Vec<bool> = headings
            .iter()
            .map(|&h| {
                compass
                    .update_orientation(&OrientationSample::Compass { heading: h })
                    .unwrap()
                    .result
                    .is_aligned
            })
            .collect();
        assert_eq!(aligned, vec![true, false, true, false]);
    }

    #[test]
    fn changing_target_recomputes() {
        let mut compass = compass_toward(0.0, 90.0);
        compass.update_location(Coordinates::new(0.0, 0.0));
        let reading = compass.set_target(target_at(0.0, -90.0));
        assert!((reading.result.bearing - 270.0).abs() < 1e-9);
        assert_eq!(compass.target().coords, Coordinates::new(0.0, -90.0));
    }

    #[test]
    fn error_is_carried_alongside_output() {
        let mut compass = compass_toward(0.0, 90.0);
        compass.update_location(Coordinates::new(0.0, 0.0));
        let reading = compass.report_error("GPS Error: timeout");
        assert_eq!(reading.error.as_deref(), Some("GPS Error: timeout"));
        assert!((reading.result.bearing - 90.0).abs() < 1e-9);

        let reading = compass.update_location(Coordinates::new(0.0, 1.0));
        assert_eq!(reading.error.as_deref(), Some("GPS Error: timeout"));
        assert!(reading.result.distance_km < 10_007.6);
    }

    #[test]
    fn observers_see_every_recomputation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut compass = compass_toward(0.0, 90.0);

        let sink = Rc::clone(&seen);
        compass.observe(move |reading| sink.borrow_mut().push(reading.heading));

        compass.update_orientation(&alpha(0.0));
        compass.update_orientation(&OrientationSample::Blank);
        compass.update_location(Coordinates::new(0.0, 0.0));
        compass.update_orientation(&alpha(90.0));

        assert_eq!(*seen.borrow(), vec![0.0, 0.0, 270.0]);
    }

    #[test]
    fn same_point_target() {
        let mut compass = compass_toward(12.2958, 76.6394);
        let reading = compass.update_location(Coordinates::new(12.2958, 76.6394));
        assert!(reading.result.distance_km.abs() < 1e-9);
        assert_eq!(reading.result.bearing, 0.0);
        assert!(reading.result.is_aligned);
    }
}
