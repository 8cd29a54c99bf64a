use crate::game::fireworks::{FireworksPool, RngSource, UnitSource};
use crate::game::link::ResultsParams;
use crate::game::score_table::{DerivedMetrics, ScoreTable};
use crate::game::timing::ProgressScheduler;
use crate::ui::canvas::Canvas;
use crate::ui::components::{fireworks, score_chart};
use crate::ui::font::FontSizeCache;
use crate::ui::layout::compute_layout;
use log::{info, trace};
use rand::{SeedableRng, rngs::StdRng};

/// Everything one frame needs to be drawn, computed without touching a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub elapsed: f64,
    /// Shared progress, saturating at `max_score` plus the finish buffer.
    pub points: f64,
    /// `points` capped at `max_score`; what the bars show.
    pub bar_points: f64,
    pub scoring_done: bool,
    pub complete: bool,
    pub fireworks_active: bool,
    pub finished: bool,
}

/// One results view: the table, its pacing and the firework pool, alive for as long
/// as the view is shown.
pub struct AnimationSession<S = RngSource<StdRng>> {
    table: ScoreTable,
    metrics: DerivedMetrics,
    scheduler: ProgressScheduler,
    fireworks_enabled: bool,
    pool: FireworksPool,
    rng: S,
    fonts: FontSizeCache,
    finished: bool,
}

impl AnimationSession {
    pub fn new(params: ResultsParams) -> Self {
        Self::with_source(params, RngSource(StdRng::from_os_rng()))
    }
}

impl<S: UnitSource> AnimationSession<S> {
    pub fn with_source(params: ResultsParams, rng: S) -> Self {
        let ResultsParams {
            data,
            duration_ms,
            fireworks,
        } = params;
        let metrics = DerivedMetrics::compute(&data, duration_ms);
        info!(
            "Results session: {} teams, {} categories, max score {:.1}, {duration_ms} ms, fireworks {}",
            data.teams.len(),
            data.categories.len(),
            metrics.max_score,
            if fireworks { "on" } else { "off" },
        );
        if metrics.is_degenerate() {
            info!("Every team scored zero; bars stay flat.");
        }
        Self {
            scheduler: ProgressScheduler::new(&metrics),
            table: data,
            metrics,
            fireworks_enabled: fireworks,
            pool: FireworksPool::new(),
            rng,
            fonts: FontSizeCache::new(),
            finished: false,
        }
    }

    pub const fn metrics(&self) -> &DerivedMetrics {
        &self.metrics
    }

    pub const fn pool(&self) -> &FireworksPool {
        &self.pool
    }

    /// The loop stops requesting frames once this is set.
    pub const fn finished(&self) -> bool {
        self.finished
    }

    /// Steps the session to `elapsed` ms since the first frame. Respawns due
    /// firework slots but never draws.
    pub fn advance(&mut self, elapsed: f64) -> FrameState {
        let elapsed = elapsed.max(0.0);
        let points = self.scheduler.points(elapsed);
        let complete = self.scheduler.is_complete(elapsed);
        let fireworks_active = complete && self.fireworks_enabled;

        if fireworks_active {
            self.pool.update(elapsed, &mut self.rng);
        }
        if complete && !self.fireworks_enabled && !self.finished {
            info!(
                "Score animation finished at {elapsed:.0} ms ({} font searches).",
                self.fonts.searches()
            );
            self.finished = true;
        }

        let frame = FrameState {
            elapsed,
            points,
            bar_points: points.min(self.metrics.max_score),
            scoring_done: self.scheduler.scoring_done(elapsed),
            complete,
            fireworks_active,
            finished: self.finished,
        };
        trace!("{frame:?}");
        frame
    }

    pub fn draw(&mut self, frame: &FrameState, canvas: &mut dyn Canvas) {
        let (w, h) = canvas.size();
        let layout = compute_layout(w, h, self.table.teams.len(), self.table.categories.len());
        score_chart::draw(
            canvas,
            &layout,
            &self.table,
            &self.metrics,
            frame.bar_points,
            &mut self.fonts,
        );
        if frame.fireworks_active {
            fireworks::draw(canvas, self.pool.bursts(), frame.elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AnimationSession;
    use crate::game::fireworks::{POOL_SIZE, RngSource};
    use crate::game::link::ResultsParams;
    use crate::game::score_table::ScoreTable;
    use crate::ui::canvas::Paint;
    use crate::ui::canvas::testing::{DrawOp, RecordingCanvas};
    use rand::{SeedableRng, rngs::StdRng};

    fn params(scores: Vec<Vec<f64>>, fireworks: bool) -> ResultsParams {
        let teams = scores.first().map_or(0, Vec::len);
        ResultsParams {
            data: ScoreTable::new(
                (0..teams).map(|t| format!("Team {t}")).collect(),
                (0..scores.len()).map(|c| format!("Cat {c}")).collect(),
                scores,
            )
            .unwrap(),
            duration_ms: 1_000.0,
            fireworks,
        }
    }

    fn session(scores: Vec<Vec<f64>>, fireworks: bool) -> AnimationSession<RngSource<StdRng>> {
        AnimationSession::with_source(
            params(scores, fireworks),
            RngSource(StdRng::seed_from_u64(11)),
        )
    }

    fn scenario() -> Vec<Vec<f64>> {
        vec![vec![3.0, 1.0], vec![2.0, 4.0]]
    }

    #[test]
    fn advance_is_repeatable_for_the_same_elapsed() {
        let mut a = session(vec![vec![4.0, 9.0, 1.0]], false);
        let mut b = session(vec![vec![4.0, 9.0, 1.0]], false);
        for e in [0.0, 120.0, 450.0, 800.0] {
            assert_eq!(a.advance(e), b.advance(e));
        }
        let first = a.advance(300.0);
        let again = a.advance(300.0);
        assert_eq!(first, again);
    }

    #[test]
    fn points_rise_until_the_scoring_is_complete() {
        let mut s = session(scenario(), false);
        let mut prev = -1.0;
        for step in 0..=100 {
            let frame = s.advance(f64::from(step) * 15.0);
            assert!(frame.points >= prev);
            assert!(frame.bar_points <= 5.0);
            prev = frame.points;
        }
    }

    #[test]
    fn session_finishes_without_fireworks() {
        let mut s = session(scenario(), false);
        let start = s.advance(0.0);
        assert!(!start.finished);
        assert_eq!(start.bar_points, 0.0);

        let end = s.advance(2_000.0);
        assert!(end.scoring_done);
        assert!(end.complete);
        assert!(end.finished);
        assert!(!end.fireworks_active);
        assert_eq!(end.bar_points, 5.0);
        assert!(s.finished());
        assert_eq!(s.pool().bursts().count(), 0);
    }

    #[test]
    fn fireworks_keep_the_session_running() {
        let mut s = session(scenario(), true);
        let frame = s.advance(2_000.0);
        assert!(frame.fireworks_active);
        assert!(!frame.finished);
        assert!(!s.finished());
        assert_eq!(s.pool().bursts().count(), POOL_SIZE);

        let later = s.advance(2_800.0);
        let mut canvas = RecordingCanvas::new(1280.0, 720.0);
        s.draw(&later, &mut canvas);
        let effects = canvas
            .ops
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    DrawOp::Arc { .. }
                        | DrawOp::Line {
                            paint: Paint::LinearGradient { .. },
                            ..
                        }
                )
            })
            .count();
        assert!(effects > 0);
    }

    #[test]
    fn fireworks_wait_for_the_scores_to_finish() {
        let mut s = session(scenario(), true);
        for elapsed in [0.0, 500.0, 1_000.0] {
            let frame = s.advance(elapsed);
            assert!(!frame.complete);
            assert!(!frame.fireworks_active);
            assert!(!frame.finished);
        }
        assert_eq!(s.pool().bursts().count(), 0);

        let frame = s.advance(500.0);
        let mut canvas = RecordingCanvas::new(1280.0, 720.0);
        s.draw(&frame, &mut canvas);
        assert!(!canvas.ops.iter().any(|op| matches!(op, DrawOp::Arc { .. })));
    }

    #[test]
    fn all_zero_table_finishes_at_the_duration() {
        let mut s = session(vec![vec![0.0, 0.0], vec![0.0, 0.0]], false);
        let early = s.advance(999.0);
        assert_eq!(early.points, 0.0);
        assert!(!early.finished);

        let frame = s.advance(1_000.0);
        assert!(frame.finished);
        let mut canvas = RecordingCanvas::new(800.0, 600.0);
        s.draw(&frame, &mut canvas);
        assert!(canvas.texts().any(|(t, ..)| t == "0.0"));
    }

    #[test]
    fn empty_surface_draws_nothing() {
        let mut s = session(scenario(), true);
        let frame = s.advance(5_000.0);
        let mut canvas = RecordingCanvas::new(0.0, 0.0);
        s.draw(&frame, &mut canvas);
        assert!(canvas.ops.is_empty());
    }
}
