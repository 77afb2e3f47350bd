//! Triangle-wave blink of the hovered manipulator.

use std::time::Duration;

use web_time::Instant;

use crate::picking::PickId;

/// Default blink period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);
/// Default gap between highlighted frames after which the blink restarts.
pub const DEFAULT_IDLE_RESTART: Duration = Duration::from_millis(200);

/// Alpha of a triangle wave with the given period, `elapsed` after its
/// start.
///
/// Rises linearly from 0 to 1 over the first half period and falls back to
/// 0 over the second. A zero period yields a constant 1.
#[must_use]
pub fn blink_alpha(elapsed: Duration, period: Duration) -> f32 {
    let period_us = period.as_micros();
    if period_us == 0 {
        return 1.0;
    }
    let phase = (elapsed.as_micros() % period_us) as f64;
    let half = period_us as f64 / 2.0;
    let alpha = if phase < half {
        phase / half
    } else {
        1.0 - (phase - half) / half
    };
    alpha as f32
}

/// Blink timing of the highlight pass.
///
/// Only advanced on frames that draw a highlight, so a gap in highlighted
/// frames (the cursor left every manipulator, or left the viewport) is seen
/// as idle time.
#[derive(Debug, Clone)]
pub struct BlinkState {
    previous: Option<PickId>,
    last_draw: Option<Instant>,
    blink_start: Option<Instant>,
    period: Duration,
    idle_restart: Duration,
}

impl Default for BlinkState {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD, DEFAULT_IDLE_RESTART)
    }
}

impl BlinkState {
    /// Fresh state; the first highlighted frame starts the blink.
    #[must_use]
    pub const fn new(period: Duration, idle_restart: Duration) -> Self {
        Self {
            previous: None,
            last_draw: None,
            blink_start: None,
            period,
            idle_restart,
        }
    }

    /// Record a highlighted frame for `pick` at `now` and return its alpha.
    ///
    /// The blink restarts at `now` when `pick` differs from the previously
    /// highlighted ID or more than the idle threshold has passed since the
    /// last highlighted frame.
    pub fn advance(&mut self, pick: PickId, now: Instant) -> f32 {
        let idle = self.last_draw.is_none_or(|last| {
            now.saturating_duration_since(last) > self.idle_restart
        });
        let start = match self.blink_start {
            Some(start) if !idle && self.previous == Some(pick) => start,
            _ => now,
        };
        self.blink_start = Some(start);
        self.previous = Some(pick);
        self.last_draw = Some(now);
        blink_alpha(now.saturating_duration_since(start), self.period)
    }

    /// Start of the current blink cycle, once a frame was highlighted.
    #[must_use]
    pub const fn blink_start(&self) -> Option<Instant> {
        self.blink_start
    }

    /// ID highlighted on the last highlighted frame.
    #[must_use]
    pub const fn previous(&self) -> Option<PickId> {
        self.previous
    }

    /// Forget the history; the next highlighted frame restarts the blink.
    pub fn reset(&mut self) {
        self.previous = None;
        self.last_draw = None;
        self.blink_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = DEFAULT_PERIOD;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn us(micros: u64) -> Duration {
        Duration::from_micros(micros)
    }

    fn id(raw: u16) -> PickId {
        PickId::new(raw).unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn waveform_endpoints_and_peak() {
        assert_eq!(blink_alpha(Duration::ZERO, PERIOD), 0.0);
        assert_eq!(blink_alpha(ms(500), PERIOD), 1.0);
        assert_eq!(blink_alpha(PERIOD, PERIOD), 0.0);
        assert!(close(blink_alpha(ms(250), PERIOD), 0.5));
        assert!(close(blink_alpha(ms(750), PERIOD), 0.5));
    }

    #[test]
    fn waveform_is_periodic() {
        for t in [0, 123_456, 499_999, 500_000, 777_777] {
            let a = blink_alpha(us(t), PERIOD);
            let b = blink_alpha(us(t) + PERIOD, PERIOD);
            let c = blink_alpha(us(t) + PERIOD * 7, PERIOD);
            assert!(close(a, b) && close(a, c), "t = {t}");
        }
    }

    #[test]
    fn waveform_stays_in_unit_range_and_is_continuous() {
        let mut prev = blink_alpha(Duration::ZERO, PERIOD);
        for step in 1..=2_000_u64 {
            let alpha = blink_alpha(us(step * 1_000), PERIOD);
            assert!((0.0..=1.0).contains(&alpha), "step {step}: {alpha}");
            // 1 ms of a 500 ms ramp moves alpha by 0.002.
            assert!((alpha - prev).abs() <= 0.002 + 1e-6, "step {step}");
            prev = alpha;
        }
    }

    #[test]
    fn zero_period_is_fully_opaque() {
        assert_eq!(blink_alpha(ms(123), Duration::ZERO), 1.0);
    }

    #[test]
    fn steady_hover_follows_the_wave() {
        // 42 stays hovered for 1.3 s of continuous 10 ms frames.
        let mut blink = BlinkState::default();
        let t0 = Instant::now();
        assert_eq!(blink.advance(id(42), t0), 0.0);
        let mut seen = Vec::new();
        for frame in 1..=130_u64 {
            let alpha = blink.advance(id(42), t0 + ms(frame * 10));
            seen.push((frame * 10, alpha));
        }
        assert_eq!(blink.blink_start(), Some(t0));
        let at = |t: u64| seen.iter().find(|&&(ft, _)| ft == t).unwrap().1;
        assert!(close(at(250), 0.5));
        assert!(close(at(500), 1.0));
        assert!(close(at(750), 0.5));
        assert!(close(at(1250), 0.5));
    }

    #[test]
    fn changing_id_restarts_the_blink() {
        let mut blink = BlinkState::default();
        let t0 = Instant::now();
        let _ = blink.advance(id(42), t0);
        let mid = blink.advance(id(42), t0 + ms(16));
        assert!(mid > 0.0);

        let change = t0 + ms(32);
        assert_eq!(blink.advance(id(7), change), 0.0);
        assert_eq!(blink.blink_start(), Some(change));
        assert_eq!(blink.previous(), Some(id(7)));
    }

    #[test]
    fn idle_gap_restarts_the_blink() {
        let mut blink = BlinkState::default();
        let t0 = Instant::now();
        let _ = blink.advance(id(42), t0);
        let _ = blink.advance(id(42), t0 + ms(100));

        // Exactly the threshold is not idle.
        let _ = blink.advance(id(42), t0 + ms(300));
        assert_eq!(blink.blink_start(), Some(t0));

        let resumed = t0 + ms(501);
        assert_eq!(blink.advance(id(42), resumed), 0.0);
        assert_eq!(blink.blink_start(), Some(resumed));
    }

    #[test]
    fn reset_forgets_history() {
        let mut blink = BlinkState::default();
        let t0 = Instant::now();
        let _ = blink.advance(id(1), t0);
        blink.reset();
        assert_eq!(blink.previous(), None);
        let t1 = t0 + ms(10);
        assert_eq!(blink.advance(id(1), t1), 0.0);
        assert_eq!(blink.blink_start(), Some(t1));
    }
}
