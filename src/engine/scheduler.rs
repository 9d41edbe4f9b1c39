/*
Lookahead Step Clock
====================

The tick thread wakes up every ~25 ms, which is far too coarse to start notes
on time by itself. Instead each wake-up schedules every step whose start time
falls inside a short window ahead of the audio clock, stamping each note
with its exact start time. The audio side then starts it on the right frame.

  audio now          now + lookahead
      |-------------------|
         ^step 12  ^step 13      (scheduled this tick)
                              ^step 14 (next tick)

This module is only the arithmetic: `StepClock::tick` maps (clock state,
audio now) to (due steps, new clock state). No timers, no device, so it can
be simulated exactly in tests.

Invariants:
  - steps come out in strictly increasing order, each exactly once per loop
  - next_step_time advances by exactly one step duration per emitted step
  - when looping is off, wrapping past the last step ends the session
*/

use crate::STEP_COUNT;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepClock {
    /// Audio-clock time at which `scheduled_step` starts.
    pub next_step_time: f64,
    /// Next step to schedule.
    pub scheduled_step: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockConfig {
    pub lookahead: f64,
    pub step_duration: f64,
    pub looping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DueStep {
    pub step: usize,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub due: Vec<DueStep>,
    pub clock: StepClock,
    /// The loop ended with looping disabled; the transport should stop.
    pub finished: bool,
}

impl StepClock {
    pub fn new(start_step: usize, start_time: f64) -> Self {
        Self {
            next_step_time: start_time,
            scheduled_step: start_step % STEP_COUNT,
        }
    }

    pub fn tick(self, now: f64, config: &ClockConfig) -> Tick {
        let mut clock = self;
        let mut due = Vec::new();
        let mut finished = false;

        // A non-advancing duration would spin forever; transport validates
        // tempo before playback, this keeps the pure function total.
        if !(config.step_duration.is_finite() && config.step_duration > 0.0) {
            return Tick {
                due,
                clock,
                finished: true,
            };
        }

        let horizon = now + config.lookahead;
        while clock.next_step_time < horizon {
            due.push(DueStep {
                step: clock.scheduled_step,
                time: clock.next_step_time,
            });
            clock.next_step_time += config.step_duration;
            clock.scheduled_step += 1;

            if clock.scheduled_step == STEP_COUNT {
                clock.scheduled_step = 0;
                if !config.looping {
                    finished = true;
                    break;
                }
            }
        }

        Tick {
            due,
            clock,
            finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(step_duration: f64, looping: bool) -> ClockConfig {
        ClockConfig {
            lookahead: 0.1,
            step_duration,
            looping,
        }
    }

    /// Drive the clock the way the tick thread does, in fixed wall-clock hops.
    fn simulate(clock: StepClock, config: &ClockConfig, until: f64) -> (Vec<DueStep>, bool) {
        let mut clock = clock;
        let mut steps = Vec::new();
        let mut now = 0.0;
        while now < until {
            let tick = clock.tick(now, config);
            steps.extend(tick.due);
            clock = tick.clock;
            if tick.finished {
                return (steps, true);
            }
            now += 0.025;
        }
        (steps, false)
    }

    #[test]
    fn three_loops_visit_every_step_in_order() {
        let cfg = config(0.125, true);
        let loop_len = STEP_COUNT as f64 * 0.125;
        let start = StepClock::new(0, 0.05);
        let (steps, finished) = simulate(start, &cfg, 3.0 * loop_len - 0.1);

        assert!(!finished);
        let indices: Vec<usize> = steps.iter().map(|s| s.step).collect();
        let expected: Vec<usize> = (0..3).flat_map(|_| 0..STEP_COUNT).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn loop_wrap_time_at_120_bpm() {
        let cfg = config(0.125, true);
        let t0 = 2.0;
        let mut clock = StepClock::new(0, t0);
        let mut emitted = 0;
        let mut now = t0 - 0.1;
        while emitted < STEP_COUNT {
            let tick = clock.tick(now, &cfg);
            emitted += tick.due.len();
            clock = tick.clock;
            now += 0.025;
        }
        // A tick may run a step or two past the wrap; rewind to it.
        let overshoot = emitted - STEP_COUNT;
        let wrap_time = clock.next_step_time - overshoot as f64 * 0.125;
        assert!((wrap_time - (t0 + 12.5)).abs() < 1e-9);
    }

    #[test]
    fn times_advance_by_step_duration() {
        let cfg = config(0.125, true);
        let tick = StepClock::new(0, 0.0).tick(1.0, &cfg);
        // 0.0 through 1.0 fall inside 1.0 + 0.1 lookahead.
        assert_eq!(tick.due.len(), 9);
        assert_eq!(tick.clock.scheduled_step, 9);
        for pair in tick.due.windows(2) {
            assert!((pair[1].time - pair[0].time - 0.125).abs() < 1e-12);
            assert_eq!(pair[1].step, pair[0].step + 1);
        }
    }

    #[test]
    fn non_looping_stops_at_wrap() {
        let cfg = config(0.01, false);
        let (steps, finished) = simulate(StepClock::new(90, 0.0), &cfg, 10.0);
        assert!(finished);
        let indices: Vec<usize> = steps.iter().map(|s| s.step).collect();
        assert_eq!(indices, (90..STEP_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn nothing_due_before_the_window() {
        let cfg = config(0.125, true);
        let tick = StepClock::new(5, 10.0).tick(0.0, &cfg);
        assert!(tick.due.is_empty());
        assert_eq!(tick.clock, StepClock::new(5, 10.0));
        assert!(!tick.finished);
    }

    #[test]
    fn degenerate_duration_never_spins() {
        let tick = StepClock::new(0, 0.0).tick(1.0, &config(0.0, true));
        assert!(tick.finished);
        assert!(tick.due.is_empty());
    }

    #[test]
    fn start_step_wraps_into_range() {
        assert_eq!(StepClock::new(STEP_COUNT + 3, 0.0).scheduled_step, 3);
    }
}
