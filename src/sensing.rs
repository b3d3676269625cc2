//! Boat detection over one or more range sensors.
//!
//! Sensors are polled in configured order and OR'ed: the first reading at
//! or below the threshold wins and the rest of the list is not polled. A
//! missing echo counts as "nothing there". There is no debouncing; a single
//! in-range reading is a detection.
//!
//! ```rust
//! use rs_drawbridge::sensing::BoatDetector;
//! use rs_drawbridge::config::SensorConfig;
//! use rs_drawbridge::hal::MockRangeSensor;
//!
//! let mut sensors = MockRangeSensor::new();
//! sensors.set_distance(0, 50.0);
//! sensors.set_distance(1, 5.0);
//!
//! let detector = BoatDetector::from_config(&SensorConfig::default().with_sensor_ids(&[0, 1]));
//! let hit = detector.poll(&mut sensors).unwrap();
//! assert_eq!(hit.sensor, 1);
//! ```

use crate::config::{SensorConfig, SensorList};
use crate::traits::{Distance, RangeSensor, SensorId};

/// An in-range reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Sensor that saw the boat.
    pub sensor: SensorId,
    /// Measured distance.
    pub distance: Distance,
}

/// Polls the configured sensors against a distance threshold.
#[derive(Clone, Debug)]
pub struct BoatDetector {
    sensor_ids: SensorList,
    threshold: Distance,
}

impl BoatDetector {
    /// Build from configuration.
    pub fn from_config(config: &SensorConfig) -> Self {
        Self {
            sensor_ids: config.sensor_ids.clone(),
            threshold: Distance::from_cm(config.detection_threshold_cm),
        }
    }

    /// Configured sensors, in evaluation order.
    pub fn sensor_ids(&self) -> &[SensorId] {
        &self.sensor_ids
    }

    /// Maximum distance counted as a boat.
    pub fn threshold(&self) -> Distance {
        self.threshold
    }

    /// True when there is at least one sensor to poll.
    pub fn has_sensors(&self) -> bool {
        !self.sensor_ids.is_empty()
    }

    /// Returns true if `reading` is a boat.
    pub fn is_hit(&self, reading: Distance) -> bool {
        reading <= self.threshold
    }

    /// One pass over the sensor list. Stops at the first hit.
    pub fn poll<R: RangeSensor>(&self, sensors: &mut R) -> Option<Detection> {
        for &sensor in self.sensor_ids.iter() {
            match sensors.measure(sensor) {
                Some(distance) if self.is_hit(distance) => {
                    log::debug!("sensor {} hit at {:.1} cm", sensor, distance.cm());
                    return Some(Detection { sensor, distance });
                }
                Some(_) => {}
                None => log::trace!("sensor {} no echo", sensor),
            }
        }
        None
    }
}
