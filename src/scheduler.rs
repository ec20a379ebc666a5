//! Deciding when the next chime is due.
//!
//! [`AlertScheduler`] has no timer of its own. The UI polls it with the current
//! [`Instant`] and tells it when a chime actually went out, so all of its state
//! lives on whichever loop owns it.

use std::time::{Duration, Instant};

use crate::config::AlarmConfig;

/// Result of polling the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// a chime should fire now
    pub due: bool,
    /// time until the next chime, zero once it is due
    pub remaining: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disabled,
    Counting,
    Due,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerState {
    /// baseline the countdown runs from
    pub last_fire: Instant,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct AlertScheduler {
    state: SchedulerState,
    interval: Duration,
    duration_secs: f64,
    /// a snoozed deadline, replacing `last_fire + interval` until the next fire
    snoozed_until: Option<Instant>,
}

impl AlertScheduler {
    #[must_use]
    pub fn new(config: &AlarmConfig, now: Instant) -> Self {
        Self {
            state: SchedulerState {
                last_fire: now,
                enabled: config.enabled,
            },
            interval: config.interval(),
            duration_secs: config.duration_secs,
            snoozed_until: None,
        }
    }

    fn deadline(&self) -> Instant {
        self.snoozed_until.unwrap_or(self.state.last_fire + self.interval)
    }

    /// Reports whether a chime is due at `now` and how long until it is.
    ///
    /// Polling never restarts the countdown, see [`Self::acknowledge_fire`].
    /// A disabled scheduler is never due but still reports its countdown.
    #[must_use]
    pub fn tick(&self, now: Instant) -> Tick {
        let deadline = self.deadline();
        Tick {
            due: self.state.enabled && now >= deadline,
            remaining: deadline.saturating_duration_since(now),
        }
    }

    #[must_use]
    pub fn phase(&self, now: Instant) -> Phase {
        if !self.state.enabled {
            Phase::Disabled
        } else if self.tick(now).due {
            Phase::Due
        } else {
            Phase::Counting
        }
    }

    /// Restarts the countdown from `now`. Call once for every chime that was
    /// handed to playback.
    pub fn acknowledge_fire(&mut self, now: Instant) {
        self.state.last_fire = now;
        self.snoozed_until = None;
    }

    /// Takes a new interval, duration and enabled flag and restarts the countdown from `now`.
    pub fn set_config(&mut self, config: &AlarmConfig, now: Instant) {
        self.interval = config.interval();
        self.duration_secs = config.duration_secs;
        self.state = SchedulerState {
            last_fire: now,
            enabled: config.enabled,
        };
        self.snoozed_until = None;
    }

    /// Turns chimes on or off without moving the countdown baseline.
    ///
    /// Time spent disabled still counts, so re-enabling after a full interval
    /// has passed makes the scheduler due straight away.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    /// Moves the next chime to `delay` after `now` without playing anything.
    ///
    /// The baseline stays where it is. The next [`Self::acknowledge_fire`] or
    /// [`Self::set_config`] goes back to counting whole intervals.
    pub fn snooze(&mut self, now: Instant, delay: Duration) {
        self.snoozed_until = Some(now + delay);
    }

    /// fraction of the current interval already elapsed, in `[0, 1]`
    #[must_use]
    pub fn progress(&self, now: Instant) -> f32 {
        if self.interval.is_zero() {
            return 1.0;
        }
        let remaining = self.tick(now).remaining.min(self.interval);
        1.0 - remaining.as_secs_f32() / self.interval.as_secs_f32()
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// how long each chime lasts, in seconds
    #[must_use]
    pub const fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::{QuickCheck, TestResult};

    use super::*;

    fn alarm(enabled: bool, interval_secs: u32) -> AlarmConfig {
        AlarmConfig {
            enabled,
            interval_secs,
            duration_secs: 3.0,
        }
    }

    const fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn counts_down_then_becomes_due() {
        let start = Instant::now();
        let scheduler = AlertScheduler::new(&alarm(true, 30), start);
        for t in 0..30 {
            let tick = scheduler.tick(start + secs(t));
            assert!(!tick.due, "due at {t}");
            assert_eq!(tick.remaining, secs(30 - t));
        }
        for t in [30, 31, 100] {
            let tick = scheduler.tick(start + secs(t));
            assert_eq!(tick, Tick { due: true, remaining: Duration::ZERO });
        }
    }

    #[test]
    fn countdown_property() {
        fn property(interval: u16, offset: u16) -> TestResult {
            if interval == 0 {
                return TestResult::discard();
            }
            let start = Instant::now();
            let scheduler = AlertScheduler::new(&alarm(true, u32::from(interval)), start);
            let tick = scheduler.tick(start + secs(u64::from(offset)));
            let expected = if offset < interval {
                Tick {
                    due: false,
                    remaining: secs(u64::from(interval - offset)),
                }
            } else {
                Tick {
                    due: true,
                    remaining: Duration::ZERO,
                }
            };
            TestResult::from_bool(tick == expected)
        }
        QuickCheck::new()
            .tests(500)
            .quickcheck(property as fn(u16, u16) -> TestResult);
    }

    #[test]
    fn ticking_does_not_reset() {
        let start = Instant::now();
        let scheduler = AlertScheduler::new(&alarm(true, 10), start);
        assert!(scheduler.tick(start + secs(10)).due);
        assert!(scheduler.tick(start + secs(10)).due);
        assert!(scheduler.tick(start + secs(11)).due);
    }

    #[test]
    fn acknowledge_restarts_countdown() {
        let start = Instant::now();
        let mut scheduler = AlertScheduler::new(&alarm(true, 10), start);
        let fired = start + secs(12);
        assert_eq!(scheduler.phase(fired), Phase::Due);
        scheduler.acknowledge_fire(fired);
        assert_eq!(scheduler.tick(fired), Tick { due: false, remaining: secs(10) });
        assert_eq!(scheduler.phase(fired), Phase::Counting);
        assert!(scheduler.tick(fired + secs(10)).due);
    }

    #[test]
    fn starts_disabled_when_configured_off() {
        let start = Instant::now();
        let scheduler = AlertScheduler::new(&alarm(false, 10), start);
        assert_eq!(scheduler.phase(start), Phase::Disabled);
        assert!(!scheduler.tick(start + secs(1000)).due);
        assert!(!scheduler.is_enabled());
    }

    #[test]
    fn toggling_keeps_baseline() {
        let start = Instant::now();
        let reference = AlertScheduler::new(&alarm(true, 20), start);
        let mut toggled = reference.clone();

        toggled.set_enabled(false);
        assert_eq!(toggled.phase(start + secs(25)), Phase::Disabled);
        assert!(!toggled.tick(start + secs(25)).due);
        toggled.set_enabled(true);

        assert_eq!(toggled.state(), reference.state());
        for t in [0, 5, 19, 20, 25] {
            assert_eq!(toggled.tick(start + secs(t)), reference.tick(start + secs(t)));
        }
    }

    #[test]
    fn new_config_restarts_countdown() {
        let start = Instant::now();
        let mut scheduler = AlertScheduler::new(&alarm(true, 60), start);
        let changed = start + secs(50);
        scheduler.set_config(&alarm(true, 30), changed);
        // 50 s already elapsed is more than the new interval, but nothing fires
        assert_eq!(scheduler.tick(changed), Tick { due: false, remaining: secs(30) });
        assert_eq!(scheduler.interval(), secs(30));

        scheduler.set_config(
            &AlarmConfig {
                enabled: false,
                interval_secs: 30,
                duration_secs: 1.5,
            },
            changed,
        );
        assert_eq!(scheduler.phase(changed + secs(40)), Phase::Disabled);
        assert!((scheduler.duration_secs() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn snooze_moves_deadline() {
        let start = Instant::now();
        let mut scheduler = AlertScheduler::new(&alarm(true, 30), start);
        let now = start + secs(31);
        assert!(scheduler.tick(now).due);

        scheduler.snooze(now, secs(120));
        assert_eq!(scheduler.tick(now), Tick { due: false, remaining: secs(120) });
        assert!(scheduler.tick(now + secs(120)).due);

        scheduler.snooze(now + secs(120), secs(10));
        assert_eq!(scheduler.tick(now + secs(120)).remaining, secs(10));

        let fired = now + secs(130);
        scheduler.acknowledge_fire(fired);
        assert_eq!(scheduler.tick(fired).remaining, secs(30));
    }

    #[test]
    fn snooze_right_after_start_with_long_interval() {
        // the deadline must not depend on reaching a full interval back from `now`
        let start = Instant::now();
        let mut scheduler = AlertScheduler::new(&alarm(true, 3600), start);
        scheduler.snooze(start, secs(300));
        assert_eq!(scheduler.tick(start), Tick { due: false, remaining: secs(300) });
        assert!(scheduler.tick(start + secs(300)).due);
        assert_eq!(scheduler.state().last_fire, start);
    }

    #[test]
    fn new_config_cancels_snooze() {
        let start = Instant::now();
        let mut scheduler = AlertScheduler::new(&alarm(true, 30), start);
        scheduler.snooze(start, secs(600));
        scheduler.set_config(&alarm(true, 20), start + secs(5));
        assert_eq!(scheduler.tick(start + secs(5)).remaining, secs(20));
    }

    #[test]
    fn progress_runs_from_zero_to_one() {
        let start = Instant::now();
        let scheduler = AlertScheduler::new(&alarm(true, 40), start);
        assert!(scheduler.progress(start).abs() < f32::EPSILON);
        assert!((scheduler.progress(start + secs(10)) - 0.25).abs() < 1e-6);
        assert!((scheduler.progress(start + secs(400)) - 1.0).abs() < f32::EPSILON);
    }
}
