use std::time::{Duration, Instant};

const FALLBACK_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// How much simulation one rendered frame has earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameBudget {
    pub(crate) raw_frame_dt: Duration,
    pub(crate) ticks: u32,
    pub(crate) dropped_backlog: Duration,
}

/// Fixed-step accumulator plus the optional present cap.
///
/// Long frames are clamped to `max_frame_delta` before they reach the
/// accumulator, and whatever is still owed after `max_ticks_per_frame` ticks
/// is dropped instead of carried, so a stall never turns into a burst of
/// catch-up updates.
#[derive(Debug)]
pub(crate) struct FramePacer {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    render_fps_cap: Option<u32>,
    accumulator: Duration,
    last_frame: Instant,
    last_present: Instant,
}

impl FramePacer {
    pub(crate) fn new(
        target_tps: u32,
        max_frame_delta: Duration,
        max_ticks_per_frame: u32,
        max_render_fps: Option<u32>,
        now: Instant,
    ) -> Self {
        let max_frame_delta = if max_frame_delta.is_zero() {
            FALLBACK_MAX_FRAME_DELTA
        } else {
            max_frame_delta
        };
        Self {
            fixed_dt: per_second(target_tps.max(1)),
            max_frame_delta,
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            render_fps_cap: max_render_fps.filter(|fps| *fps > 0),
            accumulator: Duration::ZERO,
            last_frame: now,
            last_present: now,
        }
    }

    pub(crate) fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub(crate) fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }

    pub(crate) fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    pub(crate) fn render_fps_cap(&self) -> Option<u32> {
        self.render_fps_cap
    }

    pub(crate) fn begin_frame(&mut self, now: Instant) -> FrameBudget {
        let raw_frame_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.accumulator = self
            .accumulator
            .saturating_add(raw_frame_dt.min(self.max_frame_delta));

        let mut ticks = 0;
        while self.accumulator >= self.fixed_dt && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }
        let dropped_backlog = if self.accumulator >= self.fixed_dt {
            std::mem::take(&mut self.accumulator)
        } else {
            Duration::ZERO
        };

        FrameBudget {
            raw_frame_dt,
            ticks,
            dropped_backlog,
        }
    }

    /// Sleep owed before the next present. Zero with the cap off.
    pub(crate) fn present_delay(&self, now: Instant) -> Duration {
        let Some(fps) = self.render_fps_cap else {
            return Duration::ZERO;
        };
        per_second(fps).saturating_sub(now.saturating_duration_since(self.last_present))
    }

    pub(crate) fn mark_presented(&mut self, now: Instant) {
        self.last_present = now;
    }
}

fn per_second(rate: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacer(max_ticks_per_frame: u32, max_render_fps: Option<u32>) -> (FramePacer, Instant) {
        let base = Instant::now();
        let pacer = FramePacer::new(
            50,
            Duration::from_millis(250),
            max_ticks_per_frame,
            max_render_fps,
            base,
        );
        (pacer, base)
    }

    #[test]
    fn leftover_time_carries_into_the_next_frame() {
        let (mut pacer, base) = pacer(5, None);

        let first = pacer.begin_frame(base + Duration::from_millis(50));
        assert_eq!(first.ticks, 2);
        assert_eq!(first.dropped_backlog, Duration::ZERO);

        let second = pacer.begin_frame(base + Duration::from_millis(60));
        assert_eq!(second.raw_frame_dt, Duration::from_millis(10));
        assert_eq!(second.ticks, 1);
    }

    #[test]
    fn long_frame_is_clamped_before_ticking() {
        let (mut pacer, base) = pacer(20, None);

        let budget = pacer.begin_frame(base + Duration::from_millis(600));

        assert_eq!(budget.raw_frame_dt, Duration::from_millis(600));
        assert_eq!(budget.ticks, 12);
        assert_eq!(budget.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn backlog_past_the_tick_cap_is_dropped() {
        let (mut pacer, base) = pacer(5, None);

        let budget = pacer.begin_frame(base + Duration::from_millis(250));
        assert_eq!(budget.ticks, 5);
        assert_eq!(budget.dropped_backlog, Duration::from_millis(150));

        let next = pacer.begin_frame(base + Duration::from_millis(260));
        assert_eq!(next.ticks, 0);
    }

    #[test]
    fn present_delay_honors_the_cap() {
        let (mut pacer, base) = pacer(5, Some(50));
        pacer.mark_presented(base);

        assert_eq!(
            pacer.present_delay(base + Duration::from_millis(5)),
            Duration::from_millis(15)
        );
        assert_eq!(
            pacer.present_delay(base + Duration::from_millis(25)),
            Duration::ZERO
        );
    }

    #[test]
    fn zero_cap_and_zero_limits_fall_back() {
        let base = Instant::now();
        let pacer = FramePacer::new(0, Duration::ZERO, 0, Some(0), base);

        assert_eq!(pacer.render_fps_cap(), None);
        assert_eq!(pacer.present_delay(base), Duration::ZERO);
        assert_eq!(pacer.max_frame_delta(), FALLBACK_MAX_FRAME_DELTA);
        assert_eq!(pacer.max_ticks_per_frame(), 1);
        assert_eq!(pacer.fixed_dt(), Duration::from_secs(1));
    }
}
