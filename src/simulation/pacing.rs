//! Wall-clock pauses taken by vehicle drivers.
//!
//! Drivers never call the timer directly; they go through a `Pacer` so the
//! run loop can be exercised without an Embassy executor.

use embassy_time::{Duration, Timer};

/// Longest pause a scenario may ask for (one week).
pub const MAX_PAUSE_SECS: f64 = 7.0 * 24.0 * 3600.0;

const MAX_PAUSE_MICROS: f64 = MAX_PAUSE_SECS * 1_000_000.0;

/// Suspends the calling driver for a given duration.
pub trait Pacer {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Real-time pacing on the `embassy-time` driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimerPacer;

impl Pacer for TimerPacer {
    async fn pause(&self, duration: Duration) {
        Timer::after(duration).await;
    }
}

/// Duration of `secs` seconds, clamped to `[0, MAX_PAUSE_SECS]`. NaN maps to zero.
pub fn pause_from_secs(secs: f64) -> Duration {
    pause_from_micros(secs * 1_000_000.0)
}

/// Pause between ticks for a transmission frequency in Hz.
pub fn pacing_interval(frequency_hz: f64) -> Duration {
    pause_from_micros(1_000_000.0 / frequency_hz)
}

fn pause_from_micros(micros: f64) -> Duration {
    if micros.is_nan() {
        return Duration::from_micros(0);
    }
    Duration::from_micros(micros.clamp(0.0, MAX_PAUSE_MICROS).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_round_to_microseconds() {
        assert_eq!(pacing_interval(10.0), Duration::from_millis(100));
        assert_eq!(pacing_interval(3.0), Duration::from_micros(333_333));
        assert_eq!(pause_from_secs(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let longest = Duration::from_secs(MAX_PAUSE_SECS as u64);
        assert_eq!(pause_from_secs(1e14), longest);
        assert_eq!(pause_from_secs(f64::INFINITY), longest);
        assert_eq!(pacing_interval(1e-300), longest);
        assert_eq!(pause_from_secs(-3.0), Duration::from_micros(0));
        assert_eq!(pause_from_secs(f64::NAN), Duration::from_micros(0));
        assert_eq!(pacing_interval(1e300), Duration::from_micros(0));
    }
}
