//! Score pacing: maps wall-clock elapsed time to revealed points.
//!
//! Each team's final total is a stage boundary. Inside a stage, elapsed time is
//! remapped through `g(d) = 10 * sqrt(d)` on `[0, 100]`, so the reveal decelerates
//! as it approaches the next team's finish line and restarts briskly after it.

use crate::game::score_table::DerivedMetrics;

/// Overshoot past `max_score`, as a fraction of it, before the score animation
/// counts as complete.
pub const POST_FINISH_BUFFER_RATIO: f64 = 0.02;

/// Start timestamp is latched on the first frame the host delivers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationClock {
    start_ms: Option<f64>,
}

impl AnimationClock {
    pub const fn new() -> Self {
        Self { start_ms: None }
    }

    /// Feeds one host timestamp. Returns `None` for the first frame, which only
    /// latches the start; afterwards the time elapsed since that frame.
    pub fn tick(&mut self, timestamp_ms: f64) -> Option<f64> {
        match self.start_ms {
            None => {
                self.start_ms = Some(timestamp_ms);
                None
            }
            Some(start) => Some((timestamp_ms - start).max(0.0)),
        }
    }
}

#[inline(always)]
pub fn linear_transform(x: f64, dlb: f64, dub: f64, ilb: f64, iub: f64) -> f64 {
    ilb + (x - dlb) * (iub - ilb) / (dub - dlb)
}

// g(0) = 0, g(100) = 100, strictly monotone.
#[inline(always)]
fn ease(d: f64) -> f64 {
    10.0 * d.max(0.0).sqrt()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressScheduler {
    boundaries: Vec<f64>,
    total_duration_ms: f64,
    max_score: f64,
}

impl ProgressScheduler {
    pub fn new(metrics: &DerivedMetrics) -> Self {
        Self {
            boundaries: metrics.stage_boundaries.clone(),
            total_duration_ms: metrics.total_duration_ms,
            max_score: metrics.max_score,
        }
    }

    /// Active `[start, end]` stage for `elapsed`: the greatest boundary not after
    /// it and the next one above.
    pub fn stage_window(&self, elapsed: f64) -> (f64, f64) {
        let b = &self.boundaries;
        if b.len() <= 1 {
            return (0.0, self.total_duration_ms);
        }
        match (0..b.len() - 1).rev().find(|&i| elapsed >= b[i]) {
            Some(i) => (b[i], b[i + 1]),
            None => (0.0, b[0]),
        }
    }

    pub fn eased_elapsed(&self, elapsed: f64) -> f64 {
        let elapsed = elapsed.max(0.0);
        let (start, end) = self.stage_window(elapsed);
        if end <= start {
            return elapsed;
        }
        let d = linear_transform(elapsed, start, end, 0.0, 100.0);
        linear_transform(ease(d), 0.0, 100.0, start, end)
    }

    fn raw_points(&self, elapsed: f64) -> f64 {
        if self.max_score <= 0.0 || self.total_duration_ms <= 0.0 {
            return 0.0;
        }
        self.eased_elapsed(elapsed) / self.total_duration_ms * self.max_score
    }

    /// Points revealed at `elapsed`, shared by all teams. Monotone, saturating at
    /// `max_score` plus the post-finish buffer.
    pub fn points(&self, elapsed: f64) -> f64 {
        self.raw_points(elapsed)
            .min(self.max_score + self.finish_buffer())
    }

    #[inline(always)]
    pub fn finish_buffer(&self) -> f64 {
        self.max_score * POST_FINISH_BUFFER_RATIO
    }

    /// Every bar has reached its final height.
    pub fn scoring_done(&self, elapsed: f64) -> bool {
        if self.max_score <= 0.0 {
            return elapsed >= self.total_duration_ms;
        }
        self.raw_points(elapsed) >= self.max_score
    }

    /// The score animation has run past its finish line and buffer.
    pub fn is_complete(&self, elapsed: f64) -> bool {
        if self.max_score <= 0.0 {
            return elapsed >= self.total_duration_ms;
        }
        self.raw_points(elapsed) > self.max_score + self.finish_buffer()
    }
}
