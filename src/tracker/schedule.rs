//! Polling cadence policy.

use rand::Rng;

/// Ceiling for the idle backoff when no ETA is known.
const MAX_IDLE_INTERVAL: u64 = 120;

/// Polling interval in seconds, from the last known ETA (minutes, -1 for
/// unknown) and the number of consecutive cycles without change.
///
/// Dense polling near delivery catches minute-resolution ETA changes; with
/// no ETA the interval backs off progressively up to two minutes.
pub fn adaptive_interval(eta_minutes: i32, no_change_count: u32) -> u64 {
    if eta_minutes >= 0 {
        return match eta_minutes {
            0..=5 => 15,
            6..=15 => 25,
            _ => 30,
        };
    }
    (30 + 10 * u64::from(no_change_count)).min(MAX_IDLE_INTERVAL)
}

/// Uniform jitter in [0, 20] seconds added to every sleep, decorrelating
/// workers that started at the same moment. Not security-sensitive.
pub fn poll_jitter() -> u64 {
    rand::thread_rng().gen_range(0..=20)
}
