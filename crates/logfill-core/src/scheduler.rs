//! Rate Scheduler
//!
//! Advisory jitter for the emitters: every so often the emission interval
//! and the distance to the next change are redrawn, so downstream volume
//! graphs show irregular humps instead of a flat line.
//!
//! Live fill moves forward through wall-clock time; back-fill moves backward
//! through simulated time, so the reroll boundary is subtracted there.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tracing::debug;

use crate::payload::Dice;

/// Spacing between the discrete interval values.
pub const INTERVAL_STEP: Duration = Duration::from_millis(100);
/// Number of interval values: 100ms..=5000ms.
pub const INTERVAL_STEPS: u64 = 50;
/// Reroll thresholds are drawn from 0..REROLL_SECONDS seconds.
pub const REROLL_SECONDS: u64 = 120;

/// Draw `(reroll_after, interval)`.
pub fn next_durations(dice: &mut impl Dice) -> (Duration, Duration) {
    let interval = INTERVAL_STEP * (1 + dice.roll(INTERVAL_STEPS)) as u32;
    let reroll_after = Duration::from_secs(dice.roll(REROLL_SECONDS));
    debug!(?interval, next_change = ?reroll_after, "Rerolled emission rate");
    (reroll_after, interval)
}

/// Which way the emitter's clock flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Wall-clock time, live fill.
    Forward,
    /// Simulated time stepping into the past, back-fill.
    Backward,
}

/// Per-loop scheduler state. Each emitter owns its own instance.
#[derive(Debug, Clone)]
pub struct RateState {
    direction: Direction,
    current_interval: Duration,
    next_reroll: DateTime<Utc>,
}

impl RateState {
    pub fn start(direction: Direction, origin: DateTime<Utc>, dice: &mut impl Dice) -> Self {
        let (reroll_after, current_interval) = next_durations(dice);
        Self {
            direction,
            current_interval,
            next_reroll: boundary(direction, origin, reroll_after),
        }
    }

    pub fn interval(&self) -> Duration {
        self.current_interval
    }

    pub fn next_reroll(&self) -> DateTime<Utc> {
        self.next_reroll
    }

    /// Check the reroll boundary at `at` and redraw both durations once it
    /// has been crossed. Returns true when a reroll happened.
    pub fn observe(&mut self, at: DateTime<Utc>, dice: &mut impl Dice) -> bool {
        let crossed = match self.direction {
            Direction::Forward => at > self.next_reroll,
            Direction::Backward => at < self.next_reroll,
        };
        if !crossed {
            return false;
        }

        let (reroll_after, interval) = next_durations(dice);
        self.current_interval = interval;
        self.next_reroll = boundary(self.direction, at, reroll_after);
        true
    }
}

fn boundary(direction: Direction, from: DateTime<Utc>, after: Duration) -> DateTime<Utc> {
    let delta = to_delta(after);
    match direction {
        Direction::Forward => from
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
        Direction::Backward => from
            .checked_sub_signed(delta)
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
    }
}

/// Saturates at `TimeDelta::MAX` for durations beyond its range.
pub(crate) fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::tests::ScriptedDice;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_duration_ranges() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut min_seen = Duration::MAX;
        let mut max_seen = Duration::ZERO;

        for _ in 0..50_000 {
            let (reroll_after, interval) = next_durations(&mut rng);
            assert_eq!(interval.as_millis() % 100, 0);
            assert!(interval >= Duration::from_millis(100));
            assert!(interval <= Duration::from_millis(5000));
            assert!(reroll_after <= Duration::from_secs(119));
            assert_eq!(reroll_after.subsec_nanos(), 0);
            min_seen = min_seen.min(interval);
            max_seen = max_seen.max(interval);
        }

        assert_eq!(min_seen, Duration::from_millis(100));
        assert_eq!(max_seen, Duration::from_millis(5000));
    }

    #[test]
    fn test_extreme_draws() {
        let mut dice = ScriptedDice::new(&[0, 0, 49, 119], 0);
        assert_eq!(
            next_durations(&mut dice),
            (Duration::ZERO, Duration::from_millis(100))
        );
        assert_eq!(
            next_durations(&mut dice),
            (Duration::from_secs(119), Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_forward_reroll_after_boundary() {
        // interval 300ms, reroll after 10s
        let mut dice = ScriptedDice::new(&[2, 10, 4, 20], 0);
        let mut state = RateState::start(Direction::Forward, origin(), &mut dice);
        assert_eq!(state.interval(), Duration::from_millis(300));
        assert_eq!(state.next_reroll(), origin() + TimeDelta::seconds(10));

        // At the boundary itself nothing changes.
        assert!(!state.observe(origin() + TimeDelta::seconds(10), &mut dice));
        assert_eq!(state.interval(), Duration::from_millis(300));

        let later = origin() + TimeDelta::seconds(11);
        assert!(state.observe(later, &mut dice));
        assert_eq!(state.interval(), Duration::from_millis(500));
        assert_eq!(state.next_reroll(), later + TimeDelta::seconds(20));
    }

    #[test]
    fn test_backward_reroll_below_boundary() {
        let mut dice = ScriptedDice::new(&[0, 30, 9, 5], 0);
        let mut state = RateState::start(Direction::Backward, origin(), &mut dice);
        assert_eq!(state.next_reroll(), origin() - TimeDelta::seconds(30));

        // Moving forward past the boundary must not trigger a backward reroll.
        assert!(!state.observe(origin() + TimeDelta::hours(1), &mut dice));
        assert!(!state.observe(origin() - TimeDelta::seconds(30), &mut dice));

        let earlier = origin() - TimeDelta::seconds(31);
        assert!(state.observe(earlier, &mut dice));
        assert_eq!(state.interval(), Duration::from_secs(1));
        assert_eq!(state.next_reroll(), earlier - TimeDelta::seconds(5));
    }

    #[test]
    fn test_zero_threshold_rerolls_every_step() {
        // Every draw is 0: 100ms interval, boundary at the current instant.
        let mut dice = ScriptedDice::new(&[], 0);
        let mut state = RateState::start(Direction::Backward, origin(), &mut dice);

        let mut at = origin();
        for _ in 0..10 {
            at -= to_delta(state.interval());
            assert!(state.observe(at, &mut dice));
            assert_eq!(state.next_reroll(), at);
        }
    }

    #[test]
    fn test_to_delta_saturates() {
        assert_eq!(to_delta(Duration::from_millis(1500)), TimeDelta::milliseconds(1500));
        assert_eq!(to_delta(Duration::from_secs(u64::MAX)), TimeDelta::MAX);
    }

    #[test]
    fn test_backward_boundary_clamps_at_earliest_instant() {
        let mut dice = ScriptedDice::new(&[0, 119], 0);
        let rate = RateState::start(Direction::Backward, DateTime::<Utc>::MIN_UTC, &mut dice);
        assert_eq!(rate.next_reroll(), DateTime::<Utc>::MIN_UTC);
    }
}
