//! Per-segment motion interpolation.
//!
//! A segment is the traversal from one waypoint to the next, split into the
//! destination's `hops` ticks. Position advances by a constant delta per tick
//! so the last tick lands on the destination. Heading, speed and V2X state are
//! constant across the segment and all come from the destination waypoint.

use embassy_time::Duration;

use super::geo::bearing_degrees;
use super::pacing::pacing_interval;
use super::types::{Coordinate, Tick, V2xState, Waypoint};

/// Lazy, finite tick sequence for one segment.
///
/// Yields exactly `to.hops()` ticks. Created fresh per segment and not
/// restartable.
#[derive(Debug, Clone)]
pub struct SegmentTicks {
    origin: Coordinate,
    delta_lat: f64,
    delta_lng: f64,
    hops: u32,
    emitted: u32,
    heading_deg: f64,
    speed_kmh: f64,
    v2x: V2xState,
    interval: Duration,
}

impl SegmentTicks {
    /// `default_frequency_hz` applies when `to` carries no `freq` override.
    pub fn new(from: &Waypoint, to: &Waypoint, default_frequency_hz: u32) -> Self {
        let origin = from.coordinate();
        let destination = to.coordinate();
        let hops = to.hops();
        let (delta_lat, delta_lng) = if hops == 0 {
            (0.0, 0.0)
        } else {
            (
                (destination.lat - origin.lat) / hops as f64,
                (destination.lng - origin.lng) / hops as f64,
            )
        };
        let frequency = to.freq.unwrap_or(default_frequency_hz as f64);

        Self {
            origin,
            delta_lat,
            delta_lng,
            hops,
            emitted: 0,
            heading_deg: bearing_degrees(&origin, &destination),
            speed_kmh: to.v2x.velocity_kmh,
            v2x: to.v2x,
            interval: pacing_interval(frequency),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Iterator for SegmentTicks {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        if self.emitted >= self.hops {
            return None;
        }
        self.emitted += 1;
        let t = self.emitted as f64;

        Some(Tick {
            position: Coordinate::new(self.origin.lat + self.delta_lat * t, self.origin.lng + self.delta_lng * t),
            speed_kmh: self.speed_kmh,
            heading_deg: self.heading_deg,
            v2x: self.v2x,
            interval: self.interval,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.hops - self.emitted) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SegmentTicks {}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(lat: f64, lng: f64, hops: Option<u32>) -> Waypoint {
        Waypoint {
            hops,
            ..Waypoint::at(lat, lng)
        }
    }

    #[test]
    fn yields_exactly_hops_ticks() {
        let from = waypoint(0.0, 0.0, None);
        for hops in [1, 2, 5, 10, 37] {
            let to = waypoint(1.0, 1.0, Some(hops));
            let ticks = SegmentTicks::new(&from, &to, 10);
            assert_eq!(ticks.len(), hops as usize);
            assert_eq!(ticks.count(), hops as usize);
        }
        assert_eq!(SegmentTicks::new(&from, &waypoint(1.0, 1.0, None), 10).count(), 1);
    }

    #[test]
    fn last_tick_lands_on_destination() {
        let from = waypoint(37.7749, -122.4194, None);
        for hops in [1, 3, 7, 10, 99, 1000] {
            let to = waypoint(37.8044, -122.2712, Some(hops));
            let last = SegmentTicks::new(&from, &to, 10).last().expect("at least one tick");
            assert!((last.position.lat - to.lat).abs() < 1e-10, "hops {hops}");
            assert!((last.position.lng - to.lng).abs() < 1e-10, "hops {hops}");
        }
    }

    #[test]
    fn positions_advance_by_constant_delta() {
        let from = waypoint(10.0, 20.0, None);
        let to = waypoint(10.0, 21.0, Some(4));
        let lngs: Vec<f64> = SegmentTicks::new(&from, &to, 10).map(|t| t.position.lng).collect();
        let expected = [20.25, 20.5, 20.75, 21.0];
        for (got, want) in lngs.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn heading_speed_and_flags_come_from_destination() {
        let mut from = waypoint(0.0, 0.0, None);
        from.v2x = V2xState {
            siren: true,
            velocity_kmh: 10.0,
            ..Default::default()
        };
        let mut to = waypoint(0.0, 1.0, Some(3));
        to.v2x = V2xState {
            eebl: true,
            wiper: 2,
            velocity_kmh: 72.0,
            ..Default::default()
        };

        for tick in SegmentTicks::new(&from, &to, 10) {
            assert!((tick.heading_deg - 90.0).abs() < 1e-9);
            assert_eq!(tick.speed_kmh, 72.0);
            assert_eq!(tick.v2x, to.v2x);
            assert!(!tick.v2x.siren);
        }
    }

    #[test]
    fn destination_freq_overrides_default() {
        let from = waypoint(0.0, 0.0, None);
        let to = waypoint(0.0, 1.0, Some(2));
        assert_eq!(SegmentTicks::new(&from, &to, 10).interval(), Duration::from_millis(100));

        let fast = Waypoint { freq: Some(50.0), ..to.clone() };
        assert_eq!(SegmentTicks::new(&from, &fast, 10).interval(), Duration::from_millis(20));

        let slow = Waypoint { freq: Some(3.0), ..to };
        assert_eq!(SegmentTicks::new(&from, &slow, 10).interval(), Duration::from_micros(333_333));
    }
}
