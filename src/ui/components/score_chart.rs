use crate::game::score_table::{DerivedMetrics, ScoreTable};
use crate::ui::canvas::{Canvas, Paint, TextAlign};
use crate::ui::color;
use crate::ui::font::{self, FontRole, FontSizeCache};
use crate::ui::layout::LayoutRects;

pub const GRID_SPACING_PTS: f64 = 10.0;
const GRID_LINE_WIDTH: f32 = 1.0;
const MIN_GRID_GAP_PX: f64 = 2.0;

/// One category's slice of a team's stacked bar, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSegment {
    pub category: usize,
    pub from: f64,
    pub to: f64,
}

/// Stacks `team`'s categories in order up to `points`; the category in progress is
/// clipped and later ones are left out.
pub fn bar_segments(table: &ScoreTable, team: usize, points: f64) -> Vec<BarSegment> {
    let mut out = Vec::with_capacity(table.categories.len());
    let mut score = 0.0;
    for category in 0..table.categories.len() {
        let mut next = score + table.score(category, team);
        let last = next >= points;
        if last {
            next = points.max(score);
        }
        out.push(BarSegment {
            category,
            from: score,
            to: next,
        });
        score = next;
        if last {
            break;
        }
    }
    out
}

/// Fraction of `category`'s total, over all teams, that `points` has revealed.
pub fn category_reveal(table: &ScoreTable, category: usize, points: f64) -> f32 {
    let mut revealed = 0.0;
    let mut total = 0.0;
    let mut all_reached = true;
    for team in 0..table.teams.len() {
        let before: f64 = (0..category).map(|c| table.score(c, team)).sum();
        let value = table.score(category, team);
        revealed += (points - before).clamp(0.0, value);
        total += value;
        all_reached &= points >= before;
    }
    if total > 0.0 {
        (revealed / total).clamp(0.0, 1.0) as f32
    } else if all_reached {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub value: u64,
    pub alpha: f32,
}

/// Points between grid lines: the fixed spacing, widened by whole multiples when
/// lines would sit closer than `MIN_GRID_GAP_PX` on a band of `band_px`.
pub fn grid_step(max_score: f64, band_px: f32) -> f64 {
    if !(max_score > 0.0 && band_px > 0.0) {
        return GRID_SPACING_PTS;
    }
    let gap = GRID_SPACING_PTS * f64::from(band_px) / max_score;
    if gap >= MIN_GRID_GAP_PX {
        GRID_SPACING_PTS
    } else {
        GRID_SPACING_PTS * (MIN_GRID_GAP_PX / gap).ceil()
    }
}

/// Every reached multiple of the step, plus the next one fading in while it is
/// still within `max_score`.
pub fn grid_lines(points: f64, max_score: f64, band_px: f32) -> Vec<GridLine> {
    if !points.is_finite() || points < 0.0 {
        return Vec::new();
    }
    let points = points.min(max_score.max(0.0));
    let step = grid_step(max_score, band_px);
    let top = (points / step).floor() as u64;
    let mut out: Vec<GridLine> = (0..=top)
        .map(|k| GridLine {
            value: (k as f64 * step) as u64,
            alpha: 1.0,
        })
        .collect();

    let next = (top + 1) as f64 * step;
    if next <= max_score {
        out.push(GridLine {
            value: next as u64,
            alpha: (1.0 - (next - points) / step).clamp(0.0, 1.0) as f32,
        });
    }
    out
}

/// Draws the chart for `points` (already capped at `max_score`).
pub fn draw(
    canvas: &mut dyn Canvas,
    layout: &LayoutRects,
    table: &ScoreTable,
    metrics: &DerivedMetrics,
    points: f64,
    fonts: &mut FontSizeCache,
) {
    if !layout.is_renderable() {
        return;
    }
    let chart = layout.chart;
    let ppp = f64::from(metrics.pixels_per_point(chart.h));
    let y_for = |pts: f64| (f64::from(chart.bottom()) - pts * ppp) as f32;

    let column_w = layout.team_columns[0].w;
    let row = layout.category_rows[0];
    let swatch = (row.h * 0.5).min(row.w * 0.2);
    let legend_text_w = swatch.mul_add(-1.5, row.w);
    let grid_sample = ((metrics.max_score / GRID_SPACING_PTS).floor() * GRID_SPACING_PTS) as u64;

    let measure = |s: &str, px: f32| canvas.measure_text(s, px);
    let team_px = fonts.size_for(
        FontRole::TeamNames,
        &metrics.longest_team_name,
        column_w,
        measure,
    );
    let score_px = fonts.size_for(FontRole::Scores, font::SCORE_SAMPLE, column_w, measure);
    let grid_px = fonts.size_for(
        FontRole::GridLabels,
        &grid_sample.to_string(),
        layout.legend.w,
        measure,
    );
    let category_px = fonts
        .size_for(
            FontRole::Categories,
            &metrics.longest_category_name,
            legend_text_w,
            measure,
        )
        .min(row.h * 0.8);

    let bg = layout.chart_background;
    canvas.fill_rect(bg.x, bg.y, bg.w, bg.h, Paint::Solid(color::CHART_BACKGROUND_RGBA));

    for line in grid_lines(points, metrics.max_score, chart.h) {
        let y = y_for(line.value as f64);
        let c = color::grid_rgba(line.alpha);
        canvas.stroke_line(
            [chart.x, y],
            [chart.right(), y],
            GRID_LINE_WIDTH,
            Paint::Solid(c),
        );
        canvas.fill_text(
            &line.value.to_string(),
            layout.legend.center_x(),
            y,
            grid_px,
            TextAlign::Center,
            Some(layout.legend.w),
            c,
        );
    }

    let n_categories = table.categories.len();
    for (team, name) in table.teams.iter().enumerate() {
        let column = layout.team_columns[team];
        let bar = layout.bars[team];

        canvas.fill_text(
            name,
            column.center_x(),
            layout.team_name_baseline,
            team_px,
            TextAlign::Center,
            Some(column.w),
            color::LABEL_RGBA,
        );

        let mut score = 0.0;
        for seg in bar_segments(table, team, points) {
            let top = y_for(seg.to);
            let bottom = y_for(seg.from);
            if bottom > top {
                canvas.fill_rect(
                    bar.x,
                    top,
                    bar.w,
                    bottom - top,
                    Paint::Solid(color::category_rgba(seg.category, n_categories)),
                );
            }
            score = seg.to;
        }

        canvas.fill_text(
            &format!("{score:.1}"),
            column.center_x(),
            layout.score_label_height.mul_add(-0.5, y_for(score)),
            score_px,
            TextAlign::Center,
            Some(column.w),
            color::LABEL_RGBA,
        );
    }

    for (category, name) in table.categories.iter().enumerate() {
        let row = layout.category_rows[category];
        let alpha = category_reveal(table, category, points);
        let c = color::with_alpha(color::category_rgba(category, n_categories), alpha);
        canvas.fill_rect(
            row.x,
            swatch.mul_add(-0.5, row.center_y()),
            swatch,
            swatch,
            Paint::Solid(c),
        );
        canvas.fill_text(
            name,
            swatch.mul_add(1.5, row.x),
            row.center_y(),
            category_px,
            TextAlign::Left,
            Some(legend_text_w),
            c,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BarSegment, GRID_SPACING_PTS, bar_segments, category_reveal, draw, grid_lines, grid_step,
    };
    use crate::game::score_table::{DerivedMetrics, ScoreTable};
    use crate::ui::canvas::testing::RecordingCanvas;
    use crate::ui::color;
    use crate::ui::font::FontSizeCache;
    use crate::ui::layout::{LayoutRects, compute_layout};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn table(scores: Vec<Vec<f64>>) -> ScoreTable {
        let teams = scores.first().map_or(0, Vec::len);
        ScoreTable::new(
            (0..teams).map(|t| format!("Team {t}")).collect(),
            (0..scores.len()).map(|c| format!("Cat {c}")).collect(),
            scores,
        )
        .unwrap()
    }

    // Bar rectangles drawn for `team`, as (top, height).
    fn bar_rects(canvas: &RecordingCanvas, layout: &LayoutRects, team: usize) -> Vec<(f32, f32)> {
        let bar = layout.bars[team];
        canvas
            .rects()
            .filter(|(x, _, w, _, _)| (x - bar.x).abs() < 1e-3 && (w - bar.w).abs() < 1e-3)
            .map(|(_, y, _, h, _)| (y, h))
            .collect()
    }

    fn render(t: &ScoreTable, points: f64) -> (RecordingCanvas, LayoutRects, DerivedMetrics) {
        let m = DerivedMetrics::compute(t, 30_000.0);
        let layout = compute_layout(1280.0, 720.0, t.teams.len(), t.categories.len());
        let mut canvas = RecordingCanvas::new(1280.0, 720.0);
        draw(
            &mut canvas,
            &layout,
            t,
            &m,
            points.min(m.max_score),
            &mut FontSizeCache::new(),
        );
        (canvas, layout, m)
    }

    #[test]
    fn segments_stop_at_the_current_points() {
        let t = table(vec![vec![3.0], vec![2.0], vec![4.0]]);
        assert_eq!(
            bar_segments(&t, 0, 4.0),
            vec![
                BarSegment {
                    category: 0,
                    from: 0.0,
                    to: 3.0
                },
                BarSegment {
                    category: 1,
                    from: 3.0,
                    to: 4.0
                },
            ]
        );
        assert_eq!(bar_segments(&t, 0, 0.0).len(), 1);
        let full = bar_segments(&t, 0, 9.0);
        assert_eq!(full.len(), 3);
        assert_eq!(full[2].to, 9.0);
    }

    #[test]
    fn grid_fades_in_the_next_line() {
        let lines = grid_lines(15.0, 40.0, 500.0);
        let values: Vec<u64> = lines.iter().map(|l| l.value).collect();
        assert_eq!(values, vec![0, 10, 20]);
        assert_eq!(lines[1].alpha, 1.0);
        assert!((lines[2].alpha - 0.5).abs() < 1e-6);

        // next line beyond max_score is never drawn
        let lines = grid_lines(21.0, 25.0, 500.0);
        assert_eq!(lines.last().unwrap().value, 20);
    }

    #[test]
    fn huge_tables_thin_the_grid_to_the_band() {
        assert_eq!(grid_step(40.0, 500.0), GRID_SPACING_PTS);
        assert_eq!(grid_step(0.0, 500.0), GRID_SPACING_PTS);

        let step = grid_step(1e8, 720.0);
        assert!(step > GRID_SPACING_PTS);
        assert_eq!(step % GRID_SPACING_PTS, 0.0);
        assert!(step * 720.0 / 1e8 >= 2.0);

        let lines = grid_lines(1e8, 1e8, 720.0);
        assert!(lines.len() <= 362, "{} lines", lines.len());
        assert_eq!(lines[0].value, 0);
        assert!(lines.iter().all(|l| l.value as f64 <= 1e8 && l.value % 10 == 0));

        // points past the finish line still stop at max_score
        assert_eq!(grid_lines(1e12, 1e8, 720.0).len(), lines.len());
    }

    #[test]
    fn equal_totals_fill_both_bars_and_legend() {
        let t = table(vec![vec![3.0, 1.0], vec![2.0, 4.0]]);
        let (canvas, layout, m) = render(&t, 5.0);
        assert_eq!(m.max_score, 5.0);

        for team in 0..2 {
            let rects = bar_rects(&canvas, &layout, team);
            assert_eq!(rects.len(), 2);
            let height: f32 = rects.iter().map(|(_, h)| h).sum();
            assert!((height - layout.chart.h).abs() < 1e-2);
        }
        assert_eq!(category_reveal(&t, 0, 5.0), 1.0);
        assert_eq!(category_reveal(&t, 1, 5.0), 1.0);

        let labels: Vec<&str> = canvas.texts().map(|(s, ..)| s).collect();
        assert_eq!(labels.iter().filter(|s| **s == "5.0").count(), 2);
        assert!(labels.contains(&"Team 0") && labels.contains(&"Cat 1"));
    }

    #[test]
    fn all_zero_scores_draw_flat_bars() {
        let t = table(vec![vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]]);
        let (canvas, layout, _) = render(&t, 0.0);
        for team in 0..3 {
            assert!(bar_rects(&canvas, &layout, team).is_empty());
        }
        for (_, x, y, _) in canvas.texts() {
            assert!(x.is_finite() && y.is_finite());
        }
        assert_eq!(canvas.texts().filter(|(s, ..)| *s == "0.0").count(), 3);
    }

    #[test]
    fn category_alpha_tracks_revealed_share() {
        let t = table(vec![vec![4.0, 2.0], vec![6.0, 6.0]]);
        assert_eq!(category_reveal(&t, 0, 0.0), 0.0);
        assert!((category_reveal(&t, 0, 2.0) - 4.0 / 6.0).abs() < 1e-6);
        assert_eq!(category_reveal(&t, 1, 2.0), 0.0);
        assert!((category_reveal(&t, 1, 5.0) - 4.0 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn zero_total_category_reveals_once_reached() {
        let t = table(vec![vec![2.0, 5.0], vec![0.0, 0.0], vec![1.0, 1.0]]);
        assert_eq!(category_reveal(&t, 1, 3.0), 0.0);
        assert_eq!(category_reveal(&t, 1, 5.0), 1.0);
    }

    #[test]
    fn drawn_bars_never_exceed_the_team_total() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..40 {
            let teams = rng.random_range(1..6);
            let cats = rng.random_range(1..6);
            let scores = (0..cats)
                .map(|_| {
                    (0..teams)
                        .map(|_| f64::from(rng.random_range(0..20u8)))
                        .collect::<Vec<f64>>()
                })
                .collect();
            let t = table(scores);
            let points = rng.random_range(0.0..60.0);
            let (canvas, layout, m) = render(&t, points);
            if m.is_degenerate() {
                continue;
            }
            for team in 0..teams {
                let rects = bar_rects(&canvas, &layout, team);
                assert!(rects.iter().all(|(_, h)| *h >= 0.0));
                let height: f32 = rects.iter().map(|(_, h)| h).sum();
                let bound = (m.team_totals[team] * f64::from(layout.chart.h) / m.max_score) as f32;
                assert!(height <= bound + 1e-2, "team {team}: {height} > {bound}");
            }
        }
    }

    #[test]
    fn grid_lines_use_the_grid_colour() {
        let t = table(vec![vec![30.0, 10.0]]);
        let (canvas, ..) = render(&t, 15.0);
        let grid: Vec<[f32; 4]> = canvas
            .texts()
            .filter(|(s, ..)| ["0", "10", "20"].contains(s))
            .map(|(.., c)| c)
            .collect();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], color::grid_rgba(1.0));
        assert!((grid[2][3] - 0.5).abs() < 1e-6);
    }
}
